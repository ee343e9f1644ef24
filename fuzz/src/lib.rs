use arbitrary::Arbitrary;
use mdpo::po::{PoEntry, PoFile};
use mdpo::text::Wrapwidth;

/// Generate a random PO file for fuzzing.
pub fn create_pofile(translations: Vec<(&str, &str)>) -> PoFile {
    let mut po = PoFile::new(Wrapwidth::Columns(78));
    for (idx, (msgid, msgstr)) in translations.into_iter().enumerate() {
        let mut entry = PoEntry::new(msgid);
        entry.msgstr = String::from(msgstr);
        entry.locations.push(format!("foo.md:block {idx} (paragraph)"));
        po.entries.push(entry);
    }
    po
}

/// Generate a random Markdown document, sprinkled with commands, for
/// fuzzing.
pub fn create_document(blocks: Vec<Block>) -> String {
    blocks
        .iter()
        .map(Block::to_markdown)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Wrapper enum for generating arbitrary Markdown blocks.
#[derive(Arbitrary, Debug)]
pub enum Block {
    Paragraph(String),
    Heading { level: u8, text: String },
    ListItem(String),
    CodeBlock { info: String, code: String },
    Command { name: Command, argument: String },
    Raw(String),
}

/// The commands a document can contain.
#[derive(Arbitrary, Debug, Clone, Copy)]
pub enum Command {
    Disable,
    Enable,
    DisableNextLine,
    EnableNextLine,
    Context,
    Translator,
    Include,
    IncludeCodeblock,
    DisableCodeblocks,
}

impl Command {
    fn name(self) -> &'static str {
        match self {
            Command::Disable => "mdpo-disable",
            Command::Enable => "mdpo-enable",
            Command::DisableNextLine => "mdpo-disable-next-line",
            Command::EnableNextLine => "mdpo-enable-next-line",
            Command::Context => "mdpo-context",
            Command::Translator => "mdpo-translator",
            Command::Include => "mdpo-include",
            Command::IncludeCodeblock => "mdpo-include-codeblock",
            Command::DisableCodeblocks => "mdpo-disable-codeblocks",
        }
    }
}

impl Block {
    fn to_markdown(&self) -> String {
        match self {
            Block::Paragraph(text) | Block::Raw(text) => text.clone(),
            Block::Heading { level, text } => {
                format!("{} {text}", "#".repeat(usize::from(level % 6 + 1)))
            }
            Block::ListItem(text) => format!("- {text}"),
            Block::CodeBlock { info, code } => format!("```{info}\n{code}\n```"),
            Block::Command { name, argument } => {
                format!("<!-- {} {argument} -->", name.name())
            }
        }
    }
}
