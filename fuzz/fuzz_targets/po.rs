#![no_main]

use libfuzzer_sys::fuzz_target;
use mdpo::po::PoFile;
use pretty_assertions::assert_eq;

fuzz_target!(|content: &str| {
    let Ok(po) = PoFile::parse(content) else {
        return;
    };
    let written = po.to_po_string();
    let reparsed = PoFile::parse(&written).unwrap();
    assert_eq!(reparsed.to_po_string(), written);
});
