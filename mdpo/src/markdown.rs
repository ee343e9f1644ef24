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

//! Adapts the `pulldown-cmark` event stream to block, span and text
//! callbacks.
//!
//! Some details needed to write Markdown back are not part of the parser
//! events: the bullet character of a list, the delimiter of an ordered
//! list, the fence of a code block, the tightness of a list and backslash
//! escapes. They are recovered from the source offsets here.

use crate::error::Result;
use pulldown_cmark::{CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

/// Alignment of a table column.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

impl From<pulldown_cmark::Alignment> for Alignment {
    fn from(alignment: pulldown_cmark::Alignment) -> Self {
        match alignment {
            pulldown_cmark::Alignment::None => Alignment::None,
            pulldown_cmark::Alignment::Left => Alignment::Left,
            pulldown_cmark::Alignment::Center => Alignment::Center,
            pulldown_cmark::Alignment::Right => Alignment::Right,
        }
    }
}

/// Parser extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extensions {
    pub tables: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub latex_math_spans: bool,
    pub wikilinks: bool,
    /// Report `_` emphasis as underline.
    pub underline: bool,
    /// Collapse runs of spaces in text.
    pub collapse_whitespace: bool,
}

impl Default for Extensions {
    fn default() -> Self {
        Extensions {
            tables: true,
            strikethrough: true,
            tasklists: true,
            latex_math_spans: true,
            wikilinks: true,
            underline: false,
            collapse_whitespace: true,
        }
    }
}

impl Extensions {
    pub const NAMES: [&'static str; 7] = [
        "tables",
        "strikethrough",
        "tasklists",
        "latex_math_spans",
        "wikilinks",
        "underline",
        "collapse_whitespace",
    ];

    /// No extension enabled.
    pub fn none() -> Self {
        Extensions {
            tables: false,
            strikethrough: false,
            tasklists: false,
            latex_math_spans: false,
            wikilinks: false,
            underline: false,
            collapse_whitespace: false,
        }
    }

    /// Enables the extensions named in `names`.
    ///
    /// Unknown names are ignored with a warning.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extensions = Extensions::none();
        for name in names {
            if !extensions.enable(name.as_ref()) {
                tracing::warn!("Ignoring unknown extension '{}'", name.as_ref());
            }
        }
        extensions
    }

    /// Enables the extension `name`, returning `false` if it is unknown.
    pub fn enable(&mut self, name: &str) -> bool {
        let flag = match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "tables" => &mut self.tables,
            "strikethrough" => &mut self.strikethrough,
            "tasklists" => &mut self.tasklists,
            "latex_math_spans" | "latexmathspans" => &mut self.latex_math_spans,
            "wikilinks" => &mut self.wikilinks,
            "underline" => &mut self.underline,
            "collapse_whitespace" | "collapsewhitespace" => &mut self.collapse_whitespace,
            _ => return false,
        };
        *flag = true;
        true
    }

    /// Names of the enabled extensions.
    pub fn names(&self) -> Vec<&'static str> {
        let flags = [
            self.tables,
            self.strikethrough,
            self.tasklists,
            self.latex_math_spans,
            self.wikilinks,
            self.underline,
            self.collapse_whitespace,
        ];
        Extensions::NAMES
            .into_iter()
            .zip(flags)
            .filter_map(|(name, enabled)| enabled.then_some(name))
            .collect()
    }

    fn options(&self) -> Options {
        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, self.tables);
        options.set(Options::ENABLE_STRIKETHROUGH, self.strikethrough);
        options.set(Options::ENABLE_TASKLISTS, self.tasklists);
        options.set(Options::ENABLE_MATH, self.latex_math_spans);
        options.set(Options::ENABLE_WIKILINKS, self.wikilinks);
        options
    }
}

/// Creates a CommonMark parser with `extensions`.
pub fn new_cmark_parser<'input>(text: &'input str, extensions: &Extensions) -> Parser<'input> {
    Parser::new_ext(text, extensions.options())
}

/// Opening fence of a code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence {
    pub char: char,
    pub len: usize,
}

/// Block level elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Document,
    Quote,
    UnorderedList { mark: char, tight: bool },
    OrderedList { start: u64, delimiter: char, tight: bool },
    ListItem { task: Option<char> },
    Rule,
    Heading { level: u8 },
    /// A fenced code block, or an indented one when `fence` is `None`.
    Code { fence: Option<Fence>, info: String },
    Html,
    Paragraph,
    Table { alignments: Vec<Alignment> },
    TableHead,
    TableBody,
    TableRow,
    HeaderCell { alignment: Alignment },
    DataCell { alignment: Alignment },
}

impl Block {
    pub fn name(&self) -> &'static str {
        match self {
            Block::Document => "DOC",
            Block::Quote => "QUOTE",
            Block::UnorderedList { .. } => "UL",
            Block::OrderedList { .. } => "OL",
            Block::ListItem { .. } => "LI",
            Block::Rule => "HR",
            Block::Heading { .. } => "H",
            Block::Code { .. } => "CODE",
            Block::Html => "HTML",
            Block::Paragraph => "P",
            Block::Table { .. } => "TABLE",
            Block::TableHead => "THEAD",
            Block::TableBody => "TBODY",
            Block::TableRow => "TR",
            Block::HeaderCell { .. } => "TH",
            Block::DataCell { .. } => "TD",
        }
    }

    /// Name used in `#:` references, for blocks which are counted there.
    pub fn location_kind(&self) -> Option<&'static str> {
        match self {
            Block::Quote => Some("quote"),
            Block::UnorderedList { .. } => Some("unordered list"),
            Block::OrderedList { .. } => Some("ordered list"),
            Block::Heading { .. } => Some("header"),
            Block::Code { .. } => Some("code"),
            Block::Html => Some("html"),
            Block::Paragraph => Some("paragraph"),
            Block::Table { .. } => Some("table"),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Block::UnorderedList { .. } | Block::OrderedList { .. })
    }

    pub fn is_cell(&self) -> bool {
        matches!(self, Block::HeaderCell { .. } | Block::DataCell { .. })
    }

    fn details(&self) -> Option<String> {
        match self {
            Block::UnorderedList { mark, tight } => Some(format!("mark='{mark}', tight={tight}")),
            Block::OrderedList {
                start,
                delimiter,
                tight,
            } => Some(format!(
                "start={start}, mark_delimiter='{delimiter}', tight={tight}"
            )),
            Block::ListItem { task: Some(mark) } => Some(format!("task_mark='{mark}'")),
            Block::Heading { level } => Some(format!("level={level}")),
            Block::Code { fence, info } => Some(match fence {
                Some(fence) => format!("fence_char='{}', lang='{info}'", fence.char),
                None => String::from("indented"),
            }),
            Block::Table { alignments } => Some(format!("columns={}", alignments.len())),
            Block::HeaderCell { alignment } | Block::DataCell { alignment } => {
                Some(format!("align={alignment:?}"))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.details() {
            Some(details) => write!(f, "{} - {details}", self.name()),
            None => f.write_str(self.name()),
        }
    }
}

/// Inline elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Emphasis,
    Strong,
    Code,
    Strikethrough,
    Underline,
    Link {
        href: String,
        title: Option<String>,
        /// `<https://example.com>` style.
        autolink: bool,
        /// Label used by a reference style link.
        label: Option<String>,
    },
    Image {
        src: String,
        title: Option<String>,
        label: Option<String>,
    },
    WikiLink {
        target: String,
    },
    LatexMath,
    LatexMathDisplay,
}

impl Span {
    pub fn name(&self) -> &'static str {
        match self {
            Span::Emphasis => "EM",
            Span::Strong => "STRONG",
            Span::Code => "CODE",
            Span::Strikethrough => "DEL",
            Span::Underline => "U",
            Span::Link { .. } => "A",
            Span::Image { .. } => "IMG",
            Span::WikiLink { .. } => "WIKILINK",
            Span::LatexMath => "LATEXMATH",
            Span::LatexMathDisplay => "LATEXMATH_DISPLAY",
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Span::Link { href, title, .. } => {
                write!(f, "A - href='{href}'")?;
                match title {
                    Some(title) => write!(f, ", title='{title}'"),
                    None => Ok(()),
                }
            }
            Span::Image { src, title, .. } => {
                write!(f, "IMG - src='{src}'")?;
                match title {
                    Some(title) => write!(f, ", title='{title}'"),
                    None => Ok(()),
                }
            }
            Span::WikiLink { target } => write!(f, "WIKILINK - target='{target}'"),
            _ => f.write_str(self.name()),
        }
    }
}

/// The kind of a text callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Normal,
    Code,
    Html,
    SoftBreak,
    HardBreak,
    LatexMath,
}

impl TextKind {
    pub fn name(self) -> &'static str {
        match self {
            TextKind::Normal => "NORMAL",
            TextKind::Code => "CODE",
            TextKind::Html => "HTML",
            TextKind::SoftBreak => "SOFTBR",
            TextKind::HardBreak => "BR",
            TextKind::LatexMath => "LATEXMATH",
        }
    }
}

/// Receives the callbacks of [`parse`].
pub trait Handler {
    fn enter_block(&mut self, block: &Block) -> Result<()>;
    fn leave_block(&mut self, block: &Block) -> Result<()>;
    fn enter_span(&mut self, span: &Span) -> Result<()>;
    fn leave_span(&mut self, span: &Span) -> Result<()>;
    fn text(&mut self, kind: TextKind, text: &str) -> Result<()>;
}

/// Facts about the document found by looking ahead in the event stream.
#[derive(Debug, Default)]
struct Layout {
    /// Event indexes of lists holding paragraphs in their items.
    loose_lists: Vec<usize>,
    /// Task marks by the event index of their list item.
    task_marks: HashMap<usize, char>,
}

impl Layout {
    fn scan(events: &[(Event<'_>, Range<usize>)], source: &str) -> Layout {
        let mut layout = Layout::default();
        // Event index of each open tag.
        let mut open: Vec<(usize, &Tag<'_>)> = Vec::new();
        for (idx, (event, range)) in events.iter().enumerate() {
            match event {
                Event::Start(tag) => {
                    if matches!(tag, Tag::Paragraph) && matches!(open.last(), Some((_, Tag::Item))) {
                        let list = open
                            .iter()
                            .rev()
                            .find(|(_, tag)| matches!(tag, Tag::List(_)));
                        if let Some((list_idx, _)) = list {
                            layout.loose_lists.push(*list_idx);
                        }
                    }
                    open.push((idx, tag));
                }
                Event::End(_) => {
                    open.pop();
                }
                Event::TaskListMarker(checked) => {
                    let item = open.iter().rev().find(|(_, tag)| matches!(tag, Tag::Item));
                    if let Some((item_idx, _)) = item {
                        let mark = source
                            .get(range.clone())
                            .and_then(|marker| marker.chars().nth(1))
                            .filter(|mark| matches!(mark, ' ' | 'x' | 'X'))
                            .unwrap_or(if *checked { 'x' } else { ' ' });
                        layout.task_marks.insert(*item_idx, mark);
                    }
                }
                _ => {}
            }
        }
        layout
    }
}

fn title(title: &str) -> Option<String> {
    (!title.is_empty()).then(|| title.to_string())
}

/// The label of a reference style link, if any.
fn reference_label(link_type: LinkType, id: &str) -> Option<String> {
    match link_type {
        LinkType::Reference | LinkType::Collapsed | LinkType::Shortcut if !id.is_empty() => {
            Some(id.to_string())
        }
        _ => None,
    }
}

enum Open {
    Block(Block),
    Span(Span),
    /// A tag without a callback counterpart.
    Ignored,
}

struct Adapter<'s, 'h, H: Handler> {
    source: &'s str,
    extensions: &'s Extensions,
    handler: &'h mut H,
    layout: Layout,
    open: Vec<Open>,
    alignments: Vec<Alignment>,
    cell: usize,
    in_table_head: bool,
    head_row_synthesized: bool,
    table_body_open: bool,
}

impl<H: Handler> Adapter<'_, '_, H> {
    fn first_non_blank(&self, range: &Range<usize>) -> &str {
        self.source
            .get(range.start..)
            .unwrap_or_default()
            .trim_start_matches([' ', '\t'])
    }

    fn bullet(&self, range: &Range<usize>) -> char {
        match self.first_non_blank(range).chars().next() {
            Some(mark @ ('-' | '*' | '+')) => mark,
            _ => '-',
        }
    }

    fn ordered_delimiter(&self, range: &Range<usize>) -> char {
        let rest = self
            .first_non_blank(range)
            .trim_start_matches(|c: char| c.is_ascii_digit());
        match rest.chars().next() {
            Some(')') => ')',
            _ => '.',
        }
    }

    fn fence(&self, range: &Range<usize>) -> Fence {
        let rest = self.first_non_blank(range);
        let char = match rest.chars().next() {
            Some('~') => '~',
            _ => '`',
        };
        let len = rest.chars().take_while(|c| *c == char).count().max(3);
        Fence { char, len }
    }

    fn uses_underscore(&self, range: &Range<usize>) -> bool {
        self.source.get(range.start..).is_some_and(|rest| rest.starts_with('_'))
    }

    /// Text as written in the source when it was escaped or written as an
    /// entity reference.
    fn normal_text<'t>(&self, text: &'t str, range: &Range<usize>) -> Cow<'t, str> {
        let raw = self.source.get(range.clone()).unwrap_or_default();
        let mut response = if raw != text
            && !raw.contains('\n')
            && (raw.starts_with('\\') || raw.starts_with('&'))
        {
            Cow::Owned(raw.to_string())
        } else {
            Cow::Borrowed(text)
        };

        let escaped = self
            .source
            .get(..range.start)
            .is_some_and(|before| before.ends_with('\\'));
        if escaped
            && !response.starts_with('\\')
            && response.starts_with(|c: char| c.is_ascii_punctuation())
        {
            response = Cow::Owned(format!("\\{response}"));
        }

        if self.extensions.collapse_whitespace && response.contains("  ") {
            let mut collapsed = String::with_capacity(response.len());
            for c in response.chars() {
                if !(c == ' ' && collapsed.ends_with(' ')) {
                    collapsed.push(c);
                }
            }
            response = Cow::Owned(collapsed);
        }
        response
    }

    fn enter(&mut self, open: Open) -> Result<()> {
        match &open {
            Open::Block(block) => self.handler.enter_block(block)?,
            Open::Span(span) => self.handler.enter_span(span)?,
            Open::Ignored => {}
        }
        self.open.push(open);
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        match self.open.pop() {
            Some(Open::Block(block)) => self.handler.leave_block(&block),
            Some(Open::Span(span)) => self.handler.leave_span(&span),
            Some(Open::Ignored) | None => Ok(()),
        }
    }

    fn span_with_text(&mut self, span: Span, kind: TextKind, text: &str) -> Result<()> {
        self.handler.enter_span(&span)?;
        self.handler.text(kind, text)?;
        self.handler.leave_span(&span)
    }

    fn start(&mut self, idx: usize, tag: &Tag<'_>, range: &Range<usize>) -> Result<()> {
        let open = match tag {
            Tag::Paragraph => Open::Block(Block::Paragraph),
            Tag::Heading { level, .. } => Open::Block(Block::Heading {
                level: *level as u8,
            }),
            Tag::BlockQuote(_) => Open::Block(Block::Quote),
            Tag::CodeBlock(CodeBlockKind::Fenced(info)) => Open::Block(Block::Code {
                fence: Some(self.fence(range)),
                info: info.to_string(),
            }),
            Tag::CodeBlock(CodeBlockKind::Indented) => Open::Block(Block::Code {
                fence: None,
                info: String::new(),
            }),
            Tag::HtmlBlock => Open::Block(Block::Html),
            Tag::List(None) => Open::Block(Block::UnorderedList {
                mark: self.bullet(range),
                tight: !self.layout.loose_lists.contains(&idx),
            }),
            Tag::List(Some(start)) => Open::Block(Block::OrderedList {
                start: *start,
                delimiter: self.ordered_delimiter(range),
                tight: !self.layout.loose_lists.contains(&idx),
            }),
            Tag::Item => Open::Block(Block::ListItem {
                task: self.layout.task_marks.get(&idx).copied(),
            }),
            Tag::Table(alignments) => {
                self.alignments = alignments.iter().copied().map(Alignment::from).collect();
                self.table_body_open = false;
                Open::Block(Block::Table {
                    alignments: self.alignments.clone(),
                })
            }
            Tag::TableHead => {
                self.enter(Open::Block(Block::TableHead))?;
                self.in_table_head = true;
                self.head_row_synthesized = true;
                self.cell = 0;
                Open::Block(Block::TableRow)
            }
            Tag::TableRow => {
                self.cell = 0;
                if self.in_table_head {
                    if self.head_row_synthesized {
                        Open::Ignored
                    } else {
                        Open::Block(Block::TableRow)
                    }
                } else {
                    if !self.table_body_open {
                        self.table_body_open = true;
                        self.enter(Open::Block(Block::TableBody))?;
                    }
                    Open::Block(Block::TableRow)
                }
            }
            Tag::TableCell => {
                let alignment = self
                    .alignments
                    .get(self.cell)
                    .copied()
                    .unwrap_or(Alignment::None);
                self.cell += 1;
                if self.in_table_head {
                    Open::Block(Block::HeaderCell { alignment })
                } else {
                    Open::Block(Block::DataCell { alignment })
                }
            }
            Tag::Emphasis if self.extensions.underline && self.uses_underscore(range) => {
                Open::Span(Span::Underline)
            }
            Tag::Strong if self.extensions.underline && self.uses_underscore(range) => {
                Open::Span(Span::Underline)
            }
            Tag::Emphasis => Open::Span(Span::Emphasis),
            Tag::Strong => Open::Span(Span::Strong),
            Tag::Strikethrough => Open::Span(Span::Strikethrough),
            Tag::Link {
                link_type: LinkType::WikiLink { .. },
                dest_url,
                ..
            } => Open::Span(Span::WikiLink {
                target: dest_url.to_string(),
            }),
            Tag::Link {
                link_type,
                dest_url,
                title: link_title,
                id,
            } => Open::Span(Span::Link {
                href: dest_url.to_string(),
                title: title(link_title),
                autolink: matches!(link_type, LinkType::Autolink | LinkType::Email),
                label: reference_label(*link_type, id),
            }),
            Tag::Image {
                link_type,
                dest_url,
                title: image_title,
                id,
            } => Open::Span(Span::Image {
                src: dest_url.to_string(),
                title: title(image_title),
                label: reference_label(*link_type, id),
            }),
            _ => Open::Ignored,
        };
        self.enter(open)
    }

    fn end(&mut self, tag: &TagEnd) -> Result<()> {
        match tag {
            TagEnd::TableHead => {
                // The synthesized row, then the head itself.
                self.leave()?;
                self.leave()?;
                self.in_table_head = false;
                self.head_row_synthesized = false;
                Ok(())
            }
            TagEnd::Table => {
                if self.table_body_open {
                    self.leave()?;
                    self.table_body_open = false;
                }
                self.leave()
            }
            _ => self.leave(),
        }
    }

    fn event(&mut self, idx: usize, event: &Event<'_>, range: &Range<usize>) -> Result<()> {
        match event {
            Event::Start(tag) => self.start(idx, tag, range),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                let kind = match self.open.last() {
                    Some(Open::Block(Block::Code { .. })) => TextKind::Code,
                    _ => TextKind::Normal,
                };
                match kind {
                    TextKind::Normal => {
                        let text = self.normal_text(text, range);
                        self.handler.text(kind, &text)
                    }
                    _ => self.handler.text(kind, text),
                }
            }
            Event::Code(code) => self.span_with_text(Span::Code, TextKind::Code, code),
            Event::InlineMath(math) => self.span_with_text(Span::LatexMath, TextKind::LatexMath, math),
            Event::DisplayMath(math) => {
                self.span_with_text(Span::LatexMathDisplay, TextKind::LatexMath, math)
            }
            Event::Html(html) | Event::InlineHtml(html) => self.handler.text(TextKind::Html, html),
            Event::SoftBreak => self.handler.text(TextKind::SoftBreak, "\n"),
            Event::HardBreak => self.handler.text(TextKind::HardBreak, "\n"),
            Event::Rule => {
                self.handler.enter_block(&Block::Rule)?;
                self.handler.leave_block(&Block::Rule)
            }
            Event::FootnoteReference(label) => self.handler.text(TextKind::Normal, &format!("[^{label}]")),
            Event::TaskListMarker(_) => Ok(()),
        }
    }
}

/// Parses `source`, reporting its structure to `handler`.
///
/// The whole document is wrapped in [`Block::Document`]. Code spans and
/// math spans produce a span, a single text callback and the closing span.
pub fn parse<H: Handler>(source: &str, extensions: &Extensions, handler: &mut H) -> Result<()> {
    let events: Vec<(Event<'_>, Range<usize>)> =
        new_cmark_parser(source, extensions).into_offset_iter().collect();
    let mut adapter = Adapter {
        source,
        extensions,
        handler,
        layout: Layout::scan(&events, source),
        open: Vec::new(),
        alignments: Vec::new(),
        cell: 0,
        in_table_head: false,
        head_row_synthesized: false,
        table_body_open: false,
    };

    adapter.handler.enter_block(&Block::Document)?;
    for (idx, (event, range)) in events.iter().enumerate() {
        adapter.event(idx, event, range)?;
    }
    while !adapter.open.is_empty() {
        adapter.leave()?;
    }
    adapter.handler.leave_block(&Block::Document)
}
