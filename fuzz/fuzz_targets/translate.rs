#![no_main]

use libfuzzer_sys::fuzz_target;
use mdpo::po2md::{Po2Md, Po2MdOptions};
use mdpo_fuzz::{create_document, create_pofile, Block};

fuzz_target!(|inputs: (Vec<(&str, &str)>, Vec<Block>)| {
    let (translations, blocks) = inputs;
    let pofiles = [create_pofile(translations)];
    let content = create_document(blocks);
    let Ok(mut po2md) = Po2Md::from_pofiles(&pofiles, Po2MdOptions::default()) else {
        return;
    };
    let _ = po2md.translate_content(&content); // Err(_) can happen and it's fine.
});
