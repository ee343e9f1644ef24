#![no_main]

use libfuzzer_sys::fuzz_target;
use mdpo::md2po::{markdown_to_pofile, ExtractOptions, Md2PoOptions};
use mdpo::po::PoFile;
use mdpo_fuzz::{create_document, Block};

fuzz_target!(|blocks: Vec<Block>| {
    let content = create_document(blocks);
    let options = Md2PoOptions {
        include_codeblocks: true,
        ..Md2PoOptions::default()
    };
    let Ok(po) = markdown_to_pofile(&content, options, &ExtractOptions::default()) else {
        return; // Err(_) can happen and it's fine.
    };
    // What was written can be read back.
    PoFile::parse(&po.to_po_string()).unwrap();
});
