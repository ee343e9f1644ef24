// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The traversal shared by extraction and translation.
//!
//! The engine receives the block, span and text callbacks of
//! [`markdown::parse`] and groups the text of each paragraph, heading,
//! list item and table cell into a message. While extracting, messages
//! are added to a [`Catalog`]. While translating, each message is replaced
//! by its translation and the document is written again.

mod output;

use crate::catalog::{Catalog, Message, Translations};
use crate::command::{self, Command, CommandAliases, ParsedCommand};
use crate::error::Result;
use crate::event::{HookEvent, Hooks};
use crate::inline::{InlineRenderer, Markup};
use crate::link_refs::{LinkReference, LinkReferences};
use crate::markdown::{self, Block, Extensions, Handler, Span, TextKind};
use crate::po::PoEntry;
use crate::text::Wrapwidth;
use output::Output;

/// Settings shared by both modes.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub extensions: Extensions,
    pub markup: Markup,
    /// Extract messages without inline markup.
    pub plaintext: bool,
    pub command_aliases: CommandAliases,
    /// Extract code blocks by default.
    pub include_codeblocks: bool,
    /// Translation given to new messages.
    pub msgstr: String,
}

/// State changed by the commands found in a document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Directives {
    pub disabled: bool,
    pub disable_next_block: bool,
    pub enable_next_block: bool,
    pub include_codeblocks: bool,
    pub include_next_codeblock: bool,
    pub disable_next_codeblock: bool,
}

impl Directives {
    fn new(include_codeblocks: bool) -> Self {
        Directives {
            include_codeblocks,
            ..Directives::default()
        }
    }

    /// Is the next message enabled?
    pub fn enabled(&self) -> bool {
        (!self.disabled && !self.disable_next_block) || self.enable_next_block
    }

    /// Is the code block being left extracted?
    pub fn includes_codeblock(&self) -> bool {
        !self.disable_next_codeblock && (self.include_codeblocks || self.include_next_codeblock)
    }

    fn clear_next_block(&mut self) {
        self.disable_next_block = false;
        self.enable_next_block = false;
    }

    fn clear_next_codeblock(&mut self) {
        self.include_next_codeblock = false;
        self.disable_next_codeblock = false;
    }
}

#[derive(Debug)]
struct Extraction<'a> {
    catalog: &'a mut Catalog,
    /// File written in `#:` references.
    location_path: Option<String>,
}

#[derive(Debug)]
struct Application<'a> {
    translations: &'a Translations,
    wrapwidth: Wrapwidth,
    output: Option<Output>,
    rendered: String,
    translated_entries: Vec<PoEntry>,
}

#[derive(Debug)]
enum Mode<'a> {
    Extract(Extraction<'a>),
    Apply(Application<'a>),
}

/// Extracts messages from Markdown documents or translates them.
#[derive(Debug)]
pub struct Engine<'a> {
    mode: Mode<'a>,
    hooks: &'a mut Hooks,
    extensions: Extensions,
    aliases: CommandAliases,
    plaintext: bool,
    include_codeblocks: bool,
    msgstr: String,
    renderer: InlineRenderer,
    source: String,
    link_references: Option<LinkReferences>,
    blocks: Vec<Block>,
    directives: Directives,
    msgctxt: Option<String>,
    tcomment: Option<String>,
    /// Number and kind of the current top level block.
    top_level_block: (usize, Option<&'static str>),
    code: String,
    html: String,
    disabled_entries: Vec<PoEntry>,
}

impl<'a> Engine<'a> {
    fn new(mode: Mode<'a>, hooks: &'a mut Hooks, config: &EngineConfig) -> Self {
        Engine {
            mode,
            hooks,
            extensions: config.extensions,
            aliases: config.command_aliases.clone(),
            plaintext: config.plaintext,
            include_codeblocks: config.include_codeblocks,
            msgstr: config.msgstr.clone(),
            renderer: InlineRenderer::new(config.markup.clone(), config.plaintext),
            source: String::new(),
            link_references: None,
            blocks: Vec::new(),
            directives: Directives::new(config.include_codeblocks),
            msgctxt: None,
            tcomment: None,
            top_level_block: (0, None),
            code: String::new(),
            html: String::new(),
            disabled_entries: Vec::new(),
        }
    }

    /// An engine adding the messages it finds to `catalog`.
    pub fn extractor(catalog: &'a mut Catalog, hooks: &'a mut Hooks, config: &EngineConfig) -> Self {
        let extraction = Extraction {
            catalog,
            location_path: None,
        };
        Engine::new(Mode::Extract(extraction), hooks, config)
    }

    /// An engine writing documents translated with `translations`.
    ///
    /// Apply mode never strips inline markup.
    pub fn translator(
        translations: &'a Translations,
        wrapwidth: Wrapwidth,
        hooks: &'a mut Hooks,
        config: &EngineConfig,
    ) -> Self {
        let application = Application {
            translations,
            wrapwidth,
            output: None,
            rendered: String::new(),
            translated_entries: Vec::new(),
        };
        let config = EngineConfig {
            plaintext: false,
            ..config.clone()
        };
        Engine::new(Mode::Apply(application), hooks, &config)
    }

    /// Sets the file named in the `#:` references of the next document.
    pub fn set_location_path(&mut self, path: Option<String>) {
        if let Mode::Extract(extraction) = &mut self.mode {
            extraction.location_path = path;
        }
    }

    /// Processes a whole document.
    pub fn process(&mut self, source: &str) -> Result<()> {
        self.source = source.to_string();
        let extensions = self.extensions;
        markdown::parse(source, &extensions, self)
    }

    /// The translated document, after [`Engine::process`] in apply mode.
    pub fn output(&self) -> Option<&str> {
        match &self.mode {
            Mode::Apply(application) => Some(&application.rendered),
            Mode::Extract(_) => None,
        }
    }

    /// Messages left out by disabling commands.
    pub fn disabled_entries(&self) -> &[PoEntry] {
        &self.disabled_entries
    }

    /// Messages looked up in the translations, in apply mode.
    pub fn translated_entries(&self) -> &[PoEntry] {
        match &self.mode {
            Mode::Apply(application) => &application.translated_entries,
            Mode::Extract(_) => &[],
        }
    }

    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    fn is_extracting(&self) -> bool {
        matches!(self.mode, Mode::Extract(_))
    }

    fn innermost(&self) -> Block {
        self.blocks.last().cloned().unwrap_or(Block::Document)
    }

    fn output_mut(&mut self) -> Option<&mut Output> {
        match &mut self.mode {
            Mode::Apply(application) => application.output.as_mut(),
            Mode::Extract(_) => None,
        }
    }

    fn ensure_link_references(&mut self) {
        if self.link_references.is_none() {
            self.link_references = Some(LinkReferences::parse(&self.source));
        }
    }

    fn location(&self) -> Option<String> {
        let Mode::Extract(extraction) = &self.mode else {
            return None;
        };
        match (&extraction.location_path, self.top_level_block) {
            (Some(path), (number, Some(kind))) if number > 0 => {
                Some(format!("{path}:block {number} ({kind})"))
            }
            _ => None,
        }
    }

    fn lookup(&mut self, msgid: &str, msgctxt: Option<&str>, tcomment: Option<&str>) -> String {
        let Mode::Apply(application) = &mut self.mode else {
            return msgid.to_string();
        };
        match application.translations.get(msgid, msgctxt) {
            Some(msgstr) => {
                let mut entry = PoEntry::new(msgid);
                entry.msgstr = msgstr.to_string();
                entry.msgctxt = msgctxt.map(String::from);
                entry.translator_comment = tcomment.map(String::from);
                application.translated_entries.push(entry);
                if msgstr.is_empty() {
                    msgid.to_string()
                } else {
                    msgstr.to_string()
                }
            }
            None => msgid.to_string(),
        }
    }

    /// Handles a complete message.
    ///
    /// Returns the text to write in apply mode. `msgstr` overrides the
    /// default translation of new messages.
    fn emit(&mut self, msgid: String, msgstr: Option<String>, fuzzy: bool) -> Result<Option<String>> {
        let mut msgid = msgid;
        let msgctxt = self.msgctxt.take();
        let tcomment = self.tcomment.take();
        let flags = if fuzzy {
            vec![String::from("fuzzy")]
        } else {
            Vec::new()
        };

        let skip = self.hooks.fire(&mut HookEvent::Msgid {
            msgid: &mut msgid,
            msgstr: msgstr.as_deref(),
            msgctxt: msgctxt.as_deref(),
            tcomment: tcomment.as_deref(),
            flags: &flags,
        });
        if skip {
            self.directives.clear_next_block();
            return Ok(None);
        }

        let enabled = self.directives.enabled();
        self.directives.clear_next_block();
        let msgstr = msgstr.unwrap_or_else(|| self.msgstr.clone());

        if !enabled {
            let mut entry = PoEntry::new(msgid.clone());
            entry.msgstr = if self.is_extracting() { msgstr } else { String::new() };
            entry.msgctxt = msgctxt;
            entry.translator_comment = tcomment;
            entry.set_fuzzy(fuzzy);
            self.disabled_entries.push(entry);
            return Ok((!self.is_extracting()).then_some(msgid));
        }

        if self.is_extracting() {
            let location = self.location();
            if let Mode::Extract(extraction) = &mut self.mode {
                extraction.catalog.upsert(Message {
                    msgid,
                    msgstr,
                    msgctxt,
                    translator_comment: tcomment,
                    location,
                    fuzzy,
                });
            }
            Ok(None)
        } else {
            Ok(Some(self.lookup(&msgid, msgctxt.as_deref(), tcomment.as_deref())))
        }
    }

    /// Emits the pending inline text, if any.
    fn flush(&mut self) -> Result<Option<String>> {
        if self.renderer.is_empty() {
            self.renderer.take();
            return Ok(None);
        }
        let msgid = self.renderer.take().trim().to_string();
        self.emit(msgid, None, false)
    }

    /// Flushes the pending text and writes it as a paragraph.
    fn flush_paragraph(&mut self) -> Result<()> {
        if let Some(text) = self.flush()? {
            if let Some(output) = self.output_mut() {
                output.paragraph(&text);
            }
        }
        Ok(())
    }

    fn run_command(&mut self, parsed: ParsedCommand<'_>) -> Result<()> {
        let skip = self.hooks.fire(&mut HookEvent::Command {
            command: parsed.command,
            argument: parsed.argument,
            original: parsed.original,
        });
        if skip {
            return Ok(());
        }

        let extracting = self.is_extracting();
        let directives = &mut self.directives;
        match parsed.command {
            Command::Disable => directives.disabled = true,
            Command::Enable => directives.disabled = false,
            Command::DisableNextBlock | Command::DisableNextLine => {
                directives.disable_next_block = true;
            }
            Command::EnableNextBlock | Command::EnableNextLine => {
                directives.enable_next_block = true;
            }
            Command::IncludeCodeblock => directives.include_next_codeblock = true,
            Command::DisableCodeblock => directives.disable_next_codeblock = true,
            Command::IncludeCodeblocks => directives.include_codeblocks = true,
            Command::DisableCodeblocks => directives.include_codeblocks = false,
            Command::Context | Command::Translator if !extracting => {
                if let Some(argument) = parsed.argument.filter(|arg| !arg.is_empty()) {
                    if parsed.command == Command::Context {
                        self.msgctxt = Some(argument.to_string());
                    } else {
                        self.tcomment = Some(argument.to_string());
                    }
                }
            }
            Command::Context => {
                let argument = parsed.command.require_argument(parsed.argument, parsed.original)?;
                self.msgctxt = Some(argument.to_string());
            }
            Command::Translator => {
                let argument = parsed.command.require_argument(parsed.argument, parsed.original)?;
                self.tcomment = Some(argument.to_string());
            }
            Command::Include if extracting => {
                let argument = parsed.command.require_argument(parsed.argument, parsed.original)?;
                self.emit(argument.to_string(), None, false)?;
            }
            Command::Include => {}
        }
        Ok(())
    }

    fn reset_document(&mut self) {
        self.directives = Directives::new(self.include_codeblocks);
        self.link_references = None;
        self.msgctxt = None;
        self.tcomment = None;
        self.top_level_block = (0, None);
        self.renderer.take();
        self.code.clear();
        self.html.clear();
        if let Mode::Apply(application) = &mut self.mode {
            application.output = Some(Output::new(application.wrapwidth, self.extensions));
            application.rendered.clear();
        }
    }

    /// Extracts every link reference definition as a fuzzy message.
    fn dump_link_references(&mut self) -> Result<()> {
        self.ensure_link_references();
        let references: Vec<LinkReference> = self
            .link_references
            .iter()
            .flat_map(LinkReferences::iter)
            .cloned()
            .collect();
        if references.is_empty() {
            return Ok(());
        }

        self.directives.disabled = false;
        self.directives.disable_next_block = false;
        for reference in references {
            if self.hooks.fire(&mut HookEvent::LinkReference(&reference)) {
                continue;
            }
            let msgid = reference.to_string();
            self.emit(msgid.clone(), Some(msgid), true)?;
        }
        Ok(())
    }

    /// Translates the link reference definitions written at the end of a
    /// translated document.
    fn translated_link_references(&mut self) -> Vec<String> {
        self.ensure_link_references();
        let references: Vec<LinkReference> = self
            .link_references
            .iter()
            .flat_map(LinkReferences::iter)
            .cloned()
            .collect();

        let mut written: Vec<String> = Vec::new();
        let mut lines = Vec::new();
        for reference in references {
            if self.hooks.fire(&mut HookEvent::LinkReference(&reference)) {
                continue;
            }
            let destination = reference.destination();
            if written.contains(&destination) {
                continue;
            }
            lines.push(self.lookup(&reference.to_string(), None, None));
            written.push(destination);
        }
        lines
    }

    fn finish_document(&mut self) -> Result<()> {
        self.flush_paragraph()?;
        if self.is_extracting() {
            self.dump_link_references()?;
        } else {
            let references = self.translated_link_references();
            if let Mode::Apply(application) = &mut self.mode {
                if let Some(output) = application.output.take() {
                    application.rendered = output.finish(references);
                }
            }
        }
        self.directives = Directives::new(self.include_codeblocks);
        Ok(())
    }

    fn enter(&mut self, block: &Block) -> Result<()> {
        if matches!(block, Block::Document) {
            self.reset_document();
            return Ok(());
        }

        if self.blocks.len() == 1 {
            if let Some(kind) = block.location_kind() {
                self.top_level_block = (self.top_level_block.0 + 1, Some(kind));
            }
        }

        // Text of a list item followed by a nested block.
        self.flush_paragraph()?;

        match block {
            Block::Code { .. } => self.code.clear(),
            Block::Html => self.html.clear(),
            _ => {}
        }

        let Some(output) = self.output_mut() else {
            return Ok(());
        };
        match block {
            Block::Quote => output.enter_quote(),
            Block::UnorderedList { .. } | Block::OrderedList { .. } => output.enter_list(block),
            Block::ListItem { task } => output.enter_item(*task),
            Block::Rule => output.rule(),
            Block::Table { alignments } => output.enter_table(alignments),
            Block::TableRow => output.start_row(),
            _ => {}
        }
        Ok(())
    }

    fn leave(&mut self, block: &Block) -> Result<()> {
        match block {
            Block::Document => self.finish_document(),
            Block::Heading { level } => {
                let text = self.flush()?;
                if let Some(output) = self.output_mut() {
                    output.heading(*level, text.as_deref().unwrap_or_default());
                }
                Ok(())
            }
            Block::HeaderCell { .. } | Block::DataCell { .. } => {
                let text = self.flush()?;
                if let Some(output) = self.output_mut() {
                    output.cell(text.as_deref().unwrap_or_default());
                }
                Ok(())
            }
            Block::Code { fence, info } => {
                let content = std::mem::take(&mut self.code);
                let msgid = content.trim_end_matches('\n').to_string();
                if self.is_extracting() {
                    if self.directives.includes_codeblock() && !msgid.trim().is_empty() {
                        self.emit(msgid, None, false)?;
                    }
                    self.directives.clear_next_codeblock();
                    return Ok(());
                }
                self.directives.clear_next_codeblock();
                let text = if msgid.trim().is_empty() {
                    Some(msgid)
                } else {
                    self.emit(msgid, None, false)?
                };
                if let (Some(text), Some(output)) = (text, self.output_mut()) {
                    output.code_block(*fence, info, &text);
                }
                Ok(())
            }
            Block::Html => {
                let html = std::mem::take(&mut self.html);
                if let Some(output) = self.output_mut() {
                    output.html(&html);
                }
                Ok(())
            }
            _ => {
                self.flush_paragraph()?;
                let Some(output) = self.output_mut() else {
                    return Ok(());
                };
                match block {
                    Block::Quote => output.leave_quote(),
                    Block::UnorderedList { .. } | Block::OrderedList { .. } => output.leave_list(),
                    Block::ListItem { .. } => output.leave_item(),
                    Block::Table { .. } => output.leave_table(),
                    _ => {}
                }
                Ok(())
            }
        }
    }
}

impl Handler for Engine<'_> {
    fn enter_block(&mut self, block: &Block) -> Result<()> {
        let skip = self.hooks.fire(&mut HookEvent::EnterBlock(block));
        if !skip {
            self.enter(block)?;
        }
        if !matches!(block, Block::Rule) {
            self.blocks.push(block.clone());
        }
        Ok(())
    }

    fn leave_block(&mut self, block: &Block) -> Result<()> {
        if !matches!(block, Block::Rule) {
            self.blocks.pop();
        }
        if self.hooks.fire(&mut HookEvent::LeaveBlock(block)) {
            return Ok(());
        }
        self.leave(block)
    }

    fn enter_span(&mut self, span: &Span) -> Result<()> {
        if self.hooks.fire(&mut HookEvent::EnterSpan(span)) {
            return Ok(());
        }
        match span {
            Span::Link { title, .. } | Span::Image { title, .. } => {
                self.ensure_link_references();
                if self.plaintext {
                    if let Some(title) = title {
                        let location = self.location();
                        if let Mode::Extract(extraction) = &mut self.mode {
                            extraction.catalog.upsert(Message {
                                location,
                                msgstr: self.msgstr.clone(),
                                ..Message::new(title.clone())
                            });
                        }
                    }
                }
            }
            _ => {}
        }
        self.renderer.enter_span(span);
        Ok(())
    }

    fn leave_span(&mut self, span: &Span) -> Result<()> {
        if self.hooks.fire(&mut HookEvent::LeaveSpan(span)) {
            return Ok(());
        }
        let references = self.link_references.take().unwrap_or_default();
        self.renderer.leave_span(span, &references);
        self.link_references = Some(references);
        Ok(())
    }

    fn text(&mut self, kind: TextKind, text: &str) -> Result<()> {
        let mut text = text.to_string();
        let block = self.innermost();
        let skip = self.hooks.fire(&mut HookEvent::Text {
            block: &block,
            text: &mut text,
        });
        if skip {
            return Ok(());
        }

        match block {
            Block::Html => {
                self.html.push_str(&text);
                if let Some(parsed) = command::parse(&text, &self.aliases) {
                    self.run_command(parsed)?;
                }
            }
            Block::Code { .. } => self.code.push_str(&text),
            _ => {
                let in_item = self
                    .blocks
                    .iter()
                    .any(|block| matches!(block, Block::ListItem { .. }));
                let kind = match kind {
                    TextKind::HardBreak if in_item => TextKind::SoftBreak,
                    kind => kind,
                };
                self.renderer.text(kind, &text)
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::HookTarget;
    use crate::po::PoFile;
    use pretty_assertions::assert_eq;
    use std::ops::ControlFlow;

    fn extract_with(source: &str, config: &EngineConfig, hooks: &mut Hooks) -> Catalog {
        let mut catalog = Catalog::new(PoFile::default());
        let mut engine = Engine::extractor(&mut catalog, hooks, config);
        engine.set_location_path(Some(String::from("doc.md")));
        engine.process(source).unwrap();
        catalog
    }

    fn msgids(catalog: &Catalog) -> Vec<&str> {
        catalog.po().entries.iter().map(|entry| entry.msgid.as_str()).collect()
    }

    #[track_caller]
    fn assert_extracted(source: &str, expected: &[&str]) {
        let catalog = extract_with(source, &EngineConfig::default(), &mut Hooks::new());
        assert_eq!(msgids(&catalog), expected);
    }

    fn translate_with(source: &str, po: &str, wrapwidth: usize) -> String {
        let po = PoFile::parse(po).unwrap();
        let translations = Translations::from_po_files([&po]);
        let mut hooks = Hooks::new();
        let config = EngineConfig::default();
        let mut engine =
            Engine::translator(&translations, Wrapwidth::from(wrapwidth), &mut hooks, &config);
        engine.process(source).unwrap();
        engine.output().unwrap_or_default().to_string()
    }

    #[track_caller]
    fn assert_translated(source: &str, po: &str, expected: &str) {
        assert_eq!(translate_with(source, po, 80), expected);
    }

    #[test]
    fn test_extract_header_and_paragraph() {
        assert_extracted("# Header\n\nSome text here\n", &["Header", "Some text here"]);
    }

    #[test]
    fn test_extract_inline_markup() {
        assert_extracted(
            "Some **bold**, *italic* and `code`\nacross lines.\n",
            &["Some **bold**, *italic* and `code` across lines."],
        );
    }

    #[test]
    fn test_extract_hard_breaks() {
        assert_extracted("Foo  \nbar\n", &["Foo\nbar"]);
        assert_extracted("Foo\\\nbar\n", &["Foo\nbar"]);
        assert_extracted("- Foo  \n  bar\n", &["Foo bar"]);
        assert_extracted(
            "See [a  \nlink](https://example.com).\n",
            &["See [a link](https://example.com)."],
        );
    }

    #[test]
    fn test_extract_lists_and_quotes() {
        assert_extracted(
            "- one\n- two\n  - nested\n\n> quoted\n> text\n\n1. first\n",
            &["one", "two", "nested", "quoted text", "first"],
        );
    }

    #[test]
    fn test_extract_table() {
        assert_extracted(
            "| A | B |\n|---|---|\n| c | d |\n",
            &["A", "B", "c", "d"],
        );
    }

    #[test]
    fn test_extract_locations() {
        let catalog = extract_with(
            "# Title\n\nText\n\n- item\n\nText\n",
            &EngineConfig::default(),
            &mut Hooks::new(),
        );
        let locations: Vec<&[String]> = catalog
            .po()
            .entries
            .iter()
            .map(|entry| entry.locations.as_slice())
            .collect();
        assert_eq!(
            locations,
            vec![
                &[String::from("doc.md:block 1 (header)")][..],
                &[
                    String::from("doc.md:block 2 (paragraph)"),
                    String::from("doc.md:block 4 (paragraph)"),
                ][..],
                &[String::from("doc.md:block 3 (unordered list)")][..],
            ]
        );
    }

    #[test]
    fn test_disable_next_line() {
        assert_extracted(
            "<!-- mdpo-disable-next-line -->\nhate\n\nlove\n",
            &["love"],
        );
    }

    #[test]
    fn test_disable_and_enable() {
        assert_extracted(
            "a\n\n<!-- mdpo-disable -->\n\nb\n\n<!-- mdpo-enable-next-line -->\nc\n\nd\n\n<!-- mdpo-enable -->\n\ne\n",
            &["a", "c", "e"],
        );
    }

    #[test]
    fn test_context_and_translator_comments() {
        let catalog = extract_with(
            "<!-- mdpo-context month -->\nMay\n\n<!-- mdpo-context might -->\nMay\n\n\
             <!-- mdpo-translator Note for translators -->\nHello\n",
            &EngineConfig::default(),
            &mut Hooks::new(),
        );
        let entries = &catalog.po().entries;
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].msgctxt.as_deref(), Some("month"));
        assert_eq!(entries[1].msgctxt.as_deref(), Some("might"));
        assert_eq!(
            entries[2].translator_comment.as_deref(),
            Some("Note for translators")
        );
    }

    #[test]
    fn test_context_without_argument_fails() {
        let mut catalog = Catalog::new(PoFile::default());
        let mut hooks = Hooks::new();
        let mut engine = Engine::extractor(&mut catalog, &mut hooks, &EngineConfig::default());
        let err = engine.process("<!-- mdpo-context -->\nMay\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "You need to specify a string for the context with the command 'mdpo-context'."
        );
    }

    #[test]
    fn test_include_command() {
        assert_extracted(
            "<!-- mdpo-include Hidden message -->\n\nVisible\n",
            &["Hidden message", "Visible"],
        );
    }

    #[test]
    fn test_command_aliases() {
        let config = EngineConfig {
            command_aliases: CommandAliases::from_pairs([("off-next", "disable-next-line")])
                .unwrap(),
            ..EngineConfig::default()
        };
        let catalog = extract_with("<!-- off-next -->\nhate\n\nlove\n", &config, &mut Hooks::new());
        assert_eq!(msgids(&catalog), vec!["love"]);
    }

    #[test]
    fn test_codeblocks() {
        let source = "```rust\nfn main() {}\n```\n\n<!-- mdpo-include-codeblock -->\n```\nincluded\n```\n";
        assert_extracted(source, &["included"]);

        let config = EngineConfig {
            include_codeblocks: true,
            ..EngineConfig::default()
        };
        let catalog = extract_with(source, &config, &mut Hooks::new());
        assert_eq!(msgids(&catalog), vec!["fn main() {}", "included"]);
    }

    #[test]
    fn test_link_references_are_extracted() {
        let catalog = extract_with(
            "See [the docs][docs].\n\n[docs]: https://example.com \"Docs\"\n",
            &EngineConfig::default(),
            &mut Hooks::new(),
        );
        let entries = &catalog.po().entries;
        assert_eq!(entries[0].msgid, "See [the docs][docs].");
        assert_eq!(entries[1].msgid, "[docs]: https://example.com \"Docs\"");
        assert_eq!(entries[1].msgstr, entries[1].msgid);
        assert!(entries[1].is_fuzzy());
    }

    #[test]
    fn test_plaintext_extracts_titles() {
        let config = EngineConfig {
            plaintext: true,
            ..EngineConfig::default()
        };
        let catalog = extract_with(
            "Some **bold** and [a link](/url \"Link title\").\n",
            &config,
            &mut Hooks::new(),
        );
        assert_eq!(
            msgids(&catalog),
            vec!["Link title", "Some bold and a link."]
        );
    }

    #[test]
    fn test_msgid_hook_skips() {
        let mut hooks = Hooks::new();
        hooks.register(HookTarget::Msgid, |event| match event {
            HookEvent::Msgid { msgid, .. } if msgid.as_str() == "skip me" => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        });
        let catalog = extract_with("skip me\n\nkeep me\n", &EngineConfig::default(), &mut hooks);
        assert_eq!(msgids(&catalog), vec!["keep me"]);
    }

    #[test]
    fn test_msgid_hook_skip_consumes_next_block_commands() {
        let mut hooks = Hooks::new();
        hooks.register(HookTarget::Msgid, |event| match event {
            HookEvent::Msgid { msgid, .. } if msgid.as_str() == "skip me" => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        });
        let source = "<!-- mdpo-disable-next-line -->\nskip me\n\n\
                      <!-- mdpo-context month -->\nskip me\n\n\
                      keep me\n";
        let catalog = extract_with(source, &EngineConfig::default(), &mut hooks);
        assert_eq!(msgids(&catalog), vec!["keep me"]);
        assert_eq!(catalog.po().entries[0].msgctxt, None);
    }

    #[test]
    fn test_disabled_entries_are_recorded() {
        let mut catalog = Catalog::new(PoFile::default());
        let mut hooks = Hooks::new();
        let mut engine = Engine::extractor(&mut catalog, &mut hooks, &EngineConfig::default());
        engine
            .process("<!-- mdpo-disable-next-block -->\nhidden\n")
            .unwrap();
        let disabled: Vec<&str> = engine
            .disabled_entries()
            .iter()
            .map(|entry| entry.msgid.as_str())
            .collect();
        assert_eq!(disabled, vec!["hidden"]);
    }

    #[test]
    fn test_translate_heading() {
        assert_translated(
            "# Foo\n\nUntranslated\n",
            "msgid \"Foo\"\nmsgstr \"Bar\"\n",
            "# Bar\n\nUntranslated\n",
        );
    }

    #[test]
    fn test_translate_lists_and_quotes() {
        let po = "msgid \"one\"\nmsgstr \"uno\"\n\n\
                  msgid \"nested\"\nmsgstr \"anidado\"\n\n\
                  msgid \"quoted text\"\nmsgstr \"texto citado\"\n";
        assert_translated(
            "* one\n* two\n  1) nested\n\n> quoted\n> text\n",
            po,
            "* uno\n* two\n  1) anidado\n\n> texto citado\n",
        );
    }

    #[test]
    fn test_translate_with_context() {
        let po = "msgctxt \"month\"\nmsgid \"May\"\nmsgstr \"Mayo\"\n\n\
                  msgid \"May\"\nmsgstr \"Quizás\"\n";
        assert_translated(
            "<!-- mdpo-context month -->\nMay\n\nMay\n",
            po,
            "<!-- mdpo-context month -->\n\nMayo\n\nQuizás\n",
        );
    }

    #[test]
    fn test_translate_disabled_block() {
        assert_translated(
            "<!-- mdpo-disable-next-line -->\nFoo\n\nFoo\n",
            "msgid \"Foo\"\nmsgstr \"Bar\"\n",
            "<!-- mdpo-disable-next-line -->\n\nFoo\n\nBar\n",
        );
    }

    #[test]
    fn test_translate_table_and_code() {
        let po = "msgid \"Name\"\nmsgstr \"Nombre\"\n\n\
                  msgid \"value\"\nmsgstr \"valor\"\n";
        assert_translated(
            "| Name |\n|:----:|\n| value |\n\n```sh\necho value\n```\n",
            po,
            "| Nombre |\n| :-: |\n| valor |\n\n```sh\necho value\n```\n",
        );
    }

    #[test]
    fn test_translate_reference_links() {
        let po = "msgid \"See [the docs][docs].\"\nmsgstr \"Ver [la documentación][docs].\"\n\n\
                  msgid \"[docs]: https://example.com\"\nmsgstr \"[docs]: https://example.es\"\n";
        assert_translated(
            "See [the docs][docs].\n\n[docs]: https://example.com\n",
            po,
            "Ver [la documentación][docs].\n\n[docs]: https://example.es\n",
        );
    }

    #[test]
    fn test_translate_wraps_paragraphs() {
        let po = "msgid \"Short\"\nmsgstr \"A much longer translated paragraph\"\n";
        assert_eq!(
            translate_with("- Short\n", po, 20),
            "- A much longer\n  translated\n  paragraph\n"
        );
    }

    #[test]
    fn test_translate_hard_breaks() {
        let po = "msgid \"Foo\\nbar\"\nmsgstr \"Uno\\ndos\"\n";
        assert_translated("Foo  \nbar\n", po, "Uno\\\ndos\n");
        assert_translated("> Foo\\\n> bar\n", po, "> Uno\\\n> dos\n");
        assert_eq!(translate_with("Foo\\\nbar\n", "", 80), "Foo\\\nbar\n");
    }

    #[test]
    fn test_untranslated_round_trip_is_stable() {
        let source = "# Title\n\nSome *text* with `code` and [a link](https://example.com).\n\n\
                      - [x] done\n- [ ] todo\n\n> A quote\n\n---\n\n1. one\n2. two\n";
        let translated = translate_with(source, "", 80);
        assert_eq!(translated, source);
    }
}
