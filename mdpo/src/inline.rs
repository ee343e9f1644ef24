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

//! Folding of span events into the compact inline Markdown used as msgid.

use crate::link_refs::LinkReferences;
use crate::markdown::{Extensions, Span, TextKind};
use crate::text::code_span_fence_len;
use std::collections::BTreeMap;

/// Opening and closing strings of a span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub start: String,
    pub end: String,
}

impl Delimiters {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Delimiters {
            start: start.into(),
            end: end.into(),
        }
    }

    fn symmetric(delimiter: &str) -> Self {
        Delimiters::new(delimiter, delimiter)
    }
}

/// The strings written around each kind of span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup {
    pub bold: Delimiters,
    pub italic: Delimiters,
    /// Only the first character of each delimiter is used.
    pub code: Delimiters,
    pub strikethrough: Delimiters,
    pub latexmath: Delimiters,
    pub latexmathdisplay: Delimiters,
    pub wikilink: Delimiters,
    pub underline: Delimiters,
}

impl Default for Markup {
    fn default() -> Self {
        Markup {
            bold: Delimiters::symmetric("**"),
            italic: Delimiters::symmetric("*"),
            code: Delimiters::symmetric("`"),
            strikethrough: Delimiters::symmetric("~~"),
            latexmath: Delimiters::symmetric("$"),
            latexmathdisplay: Delimiters::symmetric("$$"),
            wikilink: Delimiters::new("[[", "]]"),
            underline: Delimiters::symmetric("__"),
        }
    }
}

impl Markup {
    pub fn code_start(&self) -> char {
        self.code.start.chars().next().unwrap_or('`')
    }

    pub fn code_end(&self) -> char {
        self.code.end.chars().next().unwrap_or('`')
    }

    /// The `x-mdpo-*` metadata describing this markup.
    ///
    /// Keys of optional spans are only included when their extension is
    /// enabled.
    pub fn xheaders(&self, extensions: &Extensions) -> BTreeMap<String, String> {
        let mut spans = vec![
            ("bold", &self.bold),
            ("italic", &self.italic),
            ("code", &self.code),
        ];
        if extensions.strikethrough {
            spans.push(("strikethrough", &self.strikethrough));
        }
        if extensions.latex_math_spans {
            spans.push(("latexmath", &self.latexmath));
            spans.push(("latexmathdisplay", &self.latexmathdisplay));
        }
        if extensions.wikilinks {
            spans.push(("wikilink", &self.wikilink));
        }
        if extensions.underline {
            spans.push(("underline", &self.underline));
        }

        let mut headers = BTreeMap::new();
        for (name, delimiters) in spans {
            headers.insert(format!("x-mdpo-{name}-start"), delimiters.start.clone());
            headers.insert(format!("x-mdpo-{name}-end"), delimiters.end.clone());
        }
        headers
    }

    fn delimiters(&self, span: &Span) -> Option<&Delimiters> {
        match span {
            Span::Emphasis => Some(&self.italic),
            Span::Strong => Some(&self.bold),
            Span::Strikethrough => Some(&self.strikethrough),
            Span::Underline => Some(&self.underline),
            Span::LatexMath => Some(&self.latexmath),
            Span::LatexMathDisplay => Some(&self.latexmathdisplay),
            _ => None,
        }
    }
}

/// Escapes a link or image title to be written between double quotes.
pub fn escape_title(title: &str) -> String {
    title.replace('\\', "\\\\").replace('"', "\\\"")
}

fn destination(href: &str) -> String {
    if href.is_empty() || href.contains(|c: char| c.is_whitespace() || c == '<' || c == '>') {
        format!("<{}>", href.replace('<', "\\<").replace('>', "\\>"))
    } else {
        href.to_string()
    }
}

fn inline_destination(href: &str, title: Option<&str>) -> String {
    match title {
        Some(title) => format!("({} \"{}\")", destination(href), escape_title(title)),
        None => format!("({})", destination(href)),
    }
}

#[derive(Debug)]
struct OpenLink {
    href: String,
    title: Option<String>,
    autolink: bool,
    label: Option<String>,
    text: String,
}

#[derive(Debug)]
struct OpenImage {
    src: String,
    title: Option<String>,
    label: Option<String>,
    alt: String,
}

#[derive(Debug)]
struct OpenWikiLink {
    target: String,
    text: String,
}

/// Builds the message of a single block from its spans and text.
#[derive(Debug)]
pub struct InlineRenderer {
    markup: Markup,
    plaintext: bool,
    buffer: String,
    link: Option<OpenLink>,
    image: Option<OpenImage>,
    wikilink: Option<OpenWikiLink>,
    code: Option<String>,
    underline_depth: usize,
}

impl InlineRenderer {
    /// A renderer writing `markup`, or no markup at all in `plaintext`
    /// mode.
    pub fn new(markup: Markup, plaintext: bool) -> Self {
        InlineRenderer {
            markup,
            plaintext,
            buffer: String::new(),
            link: None,
            image: None,
            wikilink: None,
            code: None,
            underline_depth: 0,
        }
    }

    pub fn markup(&self) -> &Markup {
        &self.markup
    }

    /// Is there no text waiting to be flushed?
    pub fn is_empty(&self) -> bool {
        self.buffer.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Replaces the current message.
    pub fn set(&mut self, message: &str) {
        self.buffer = message.to_string();
    }

    /// Returns the message and resets the renderer.
    pub fn take(&mut self) -> String {
        self.link = None;
        self.image = None;
        self.wikilink = None;
        self.code = None;
        self.underline_depth = 0;
        std::mem::take(&mut self.buffer)
    }

    /// The string receiving text: the text of a wikilink, the alt text of an
    /// image, the text of a link or the message.
    fn target(&mut self) -> &mut String {
        if let Some(wikilink) = &mut self.wikilink {
            &mut wikilink.text
        } else if let Some(image) = &mut self.image {
            &mut image.alt
        } else if let Some(link) = &mut self.link {
            &mut link.text
        } else {
            &mut self.buffer
        }
    }

    pub fn enter_span(&mut self, span: &Span) {
        if self.plaintext {
            return;
        }
        match span {
            Span::Code => self.code = Some(String::new()),
            Span::Link {
                href,
                title,
                autolink,
                label,
            } => {
                self.link = Some(OpenLink {
                    href: href.clone(),
                    title: title.clone(),
                    autolink: *autolink,
                    label: label.clone(),
                    text: String::new(),
                });
            }
            Span::Image { src, title, label } => {
                self.image = Some(OpenImage {
                    src: src.clone(),
                    title: title.clone(),
                    label: label.clone(),
                    alt: String::new(),
                });
            }
            Span::WikiLink { target } => {
                self.wikilink = Some(OpenWikiLink {
                    target: target.clone(),
                    text: String::new(),
                });
            }
            Span::Underline => {
                self.underline_depth += 1;
                if self.underline_depth == 1 {
                    let start = self.markup.underline.start.clone();
                    self.target().push_str(&start);
                }
            }
            _ => {
                if let Some(delimiters) = self.markup.delimiters(span) {
                    let start = delimiters.start.clone();
                    self.target().push_str(&start);
                }
            }
        }
    }

    /// Closes `span`, resolving links and images against `references`.
    pub fn leave_span(&mut self, span: &Span, references: &LinkReferences) {
        if self.plaintext {
            return;
        }
        match span {
            Span::Code => {
                let text = self.code.take().unwrap_or_default();
                let rendered = self.code_span(&text);
                self.target().push_str(&rendered);
            }
            Span::Link { .. } => {
                if let Some(link) = self.link.take() {
                    let rendered = render_link(link, references);
                    self.target().push_str(&rendered);
                }
            }
            Span::Image { .. } => {
                if let Some(image) = self.image.take() {
                    let rendered = render_image(image, references);
                    self.target().push_str(&rendered);
                }
            }
            Span::WikiLink { .. } => {
                if let Some(wikilink) = self.wikilink.take() {
                    let Delimiters { start, end } = &self.markup.wikilink;
                    let rendered = if wikilink.text.is_empty() || wikilink.text == wikilink.target
                    {
                        format!("{start}{}{end}", wikilink.target)
                    } else {
                        format!("{start}{}|{}{end}", wikilink.target, wikilink.text)
                    };
                    self.target().push_str(&rendered);
                }
            }
            Span::Underline => {
                self.underline_depth = self.underline_depth.saturating_sub(1);
                if self.underline_depth == 0 {
                    let end = self.markup.underline.end.clone();
                    self.target().push_str(&end);
                }
            }
            _ => {
                if let Some(delimiters) = self.markup.delimiters(span) {
                    let end = delimiters.end.clone();
                    self.target().push_str(&end);
                }
            }
        }
    }

    pub fn text(&mut self, kind: TextKind, text: &str) {
        let in_link = self.link.is_some() || self.image.is_some() || self.wikilink.is_some();
        let text = match kind {
            TextKind::HardBreak if !in_link => "\n",
            TextKind::SoftBreak | TextKind::HardBreak => " ",
            _ => text,
        };
        if self.plaintext {
            self.buffer.push_str(text);
            return;
        }
        if let Some(code) = &mut self.code {
            code.push_str(text);
            return;
        }
        if let Some(wikilink) = &mut self.wikilink {
            wikilink.text.push_str(text);
            return;
        }

        if kind == TextKind::HardBreak {
            self.target().push_str(text);
            return;
        }
        let escaped = self.escape_delimiter(text);
        self.target().push_str(&escaped.replace('\n', " "));
    }

    /// Escapes text consisting only of a one character delimiter.
    fn escape_delimiter(&self, text: &str) -> String {
        let italic = [&self.markup.italic.start, &self.markup.italic.end];
        let code = [self.markup.code_start(), self.markup.code_end()];
        let is_code_delimiter = text.chars().count() == 1 && text.starts_with(code);
        if italic.iter().any(|delimiter| delimiter.as_str() == text) || is_code_delimiter {
            format!("\\{text}")
        } else {
            text.to_string()
        }
    }

    fn code_span(&self, text: &str) -> String {
        let delimiter = self.markup.code_start();
        let fence = delimiter
            .to_string()
            .repeat(code_span_fence_len(delimiter, text));
        let end = self
            .markup
            .code_end()
            .to_string()
            .repeat(code_span_fence_len(delimiter, text));
        let needs_padding = text.starts_with(delimiter)
            || text.ends_with(self.markup.code_end())
            || (text.starts_with(' ') && text.ends_with(' ') && !text.trim().is_empty());
        if needs_padding {
            format!("{fence} {text} {end}")
        } else {
            format!("{fence}{text}{end}")
        }
    }
}

fn render_link(link: OpenLink, references: &LinkReferences) -> String {
    if link.autolink || (link.text == link.href && link.title.is_none()) {
        return format!("<{}>", link.text);
    }
    let label = link
        .label
        .filter(|label| references.contains_label(label))
        .or_else(|| {
            references
                .resolve(&link.href, link.title.as_deref())
                .map(String::from)
        });
    match label {
        Some(label) if label == link.text => format!("[{}]", link.text),
        Some(label) => format!("[{}][{label}]", link.text),
        None => format!(
            "[{}]{}",
            link.text,
            inline_destination(&link.href, link.title.as_deref())
        ),
    }
}

fn render_image(image: OpenImage, references: &LinkReferences) -> String {
    let label = image
        .label
        .filter(|label| references.contains_label(label))
        .or_else(|| {
            references
                .resolve(&image.src, image.title.as_deref())
                .map(String::from)
        });
    match label {
        Some(label) => format!("![{}][{label}]", image.alt),
        None => format!(
            "![{}]{}",
            image.alt,
            inline_destination(&image.src, image.title.as_deref())
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn link(href: &str, title: Option<&str>) -> Span {
        Span::Link {
            href: String::from(href),
            title: title.map(String::from),
            autolink: false,
            label: None,
        }
    }

    fn render(events: &[(&str, Option<&Span>)], references: &LinkReferences) -> String {
        let mut renderer = InlineRenderer::new(Markup::default(), false);
        for (action, span) in events {
            match (*action, span) {
                ("enter", Some(span)) => renderer.enter_span(span),
                ("leave", Some(span)) => renderer.leave_span(span, references),
                (text, None) => renderer.text(TextKind::Normal, text),
                _ => unreachable!(),
            }
        }
        renderer.take()
    }

    #[test]
    fn test_emphasis_and_strong() {
        let events = [
            ("enter", Some(&Span::Strong)),
            ("bold", None),
            ("leave", Some(&Span::Strong)),
            (" and ", None),
            ("enter", Some(&Span::Emphasis)),
            ("italic", None),
            ("leave", Some(&Span::Emphasis)),
        ];
        assert_eq!(
            render(&events, &LinkReferences::default()),
            "**bold** and *italic*"
        );
    }

    #[test]
    fn test_code_span_fences() {
        let mut renderer = InlineRenderer::new(Markup::default(), false);
        renderer.enter_span(&Span::Code);
        renderer.text(TextKind::Code, "a ` b");
        renderer.leave_span(&Span::Code, &LinkReferences::default());
        renderer.text(TextKind::Normal, " ");
        renderer.enter_span(&Span::Code);
        renderer.text(TextKind::Code, "`");
        renderer.leave_span(&Span::Code, &LinkReferences::default());
        assert_eq!(renderer.take(), "```a ` b``` ``` ` ```");
    }

    #[test]
    fn test_lone_delimiters_are_escaped() {
        let events = [("a ", None), ("*", None), (" b ", None), ("`", None)];
        assert_eq!(render(&events, &LinkReferences::default()), "a \\* b \\`");
    }

    #[test]
    fn test_inline_link() {
        let span = link("https://example.com", Some("A \"title\""));
        let events = [("enter", Some(&span)), ("text", None), ("leave", Some(&span))];
        assert_eq!(
            render(&events, &LinkReferences::default()),
            "[text](https://example.com \"A \\\"title\\\"\")"
        );
    }

    #[test]
    fn test_self_referenced_link_is_autolink() {
        let span = link("https://example.com", None);
        let events = [
            ("enter", Some(&span)),
            ("https://example.com", None),
            ("leave", Some(&span)),
        ];
        assert_eq!(
            render(&events, &LinkReferences::default()),
            "<https://example.com>"
        );
    }

    #[test]
    fn test_referenced_link() {
        let references = LinkReferences::parse("[docs]: https://example.com\n");
        let span = link("https://example.com", None);
        let events = [("enter", Some(&span)), ("the docs", None), ("leave", Some(&span))];
        assert_eq!(render(&events, &references), "[the docs][docs]");

        let events = [("enter", Some(&span)), ("docs", None), ("leave", Some(&span))];
        assert_eq!(render(&events, &references), "[docs]");
    }

    #[test]
    fn test_link_with_code_and_spaces_in_destination() {
        let span = link("a b", None);
        let events = [
            ("enter", Some(&span)),
            ("enter", Some(&Span::Code)),
            ("x", None),
            ("leave", Some(&Span::Code)),
            ("leave", Some(&span)),
        ];
        assert_eq!(render(&events, &LinkReferences::default()), "[`x`](<a b>)");
    }

    #[test]
    fn test_image_inside_link() {
        let image = Span::Image {
            src: String::from("badge.svg"),
            title: None,
            label: None,
        };
        let span = link("https://ci", None);
        let events = [
            ("enter", Some(&span)),
            ("enter", Some(&image)),
            ("Build", None),
            ("leave", Some(&image)),
            ("leave", Some(&span)),
        ];
        assert_eq!(
            render(&events, &LinkReferences::default()),
            "[![Build](badge.svg)](https://ci)"
        );
    }

    #[test]
    fn test_referenced_image() {
        let references = LinkReferences::parse("[logo]: logo.png \"Logo\"\n");
        let image = Span::Image {
            src: String::from("logo.png"),
            title: Some(String::from("Logo")),
            label: None,
        };
        let events = [("enter", Some(&image)), ("alt", None), ("leave", Some(&image))];
        assert_eq!(render(&events, &references), "![alt][logo]");
    }

    #[test]
    fn test_wikilinks() {
        let span = Span::WikiLink {
            target: String::from("Page"),
        };
        let events = [("enter", Some(&span)), ("Page", None), ("leave", Some(&span))];
        assert_eq!(render(&events, &LinkReferences::default()), "[[Page]]");
        let events = [("enter", Some(&span)), ("the page", None), ("leave", Some(&span))];
        assert_eq!(
            render(&events, &LinkReferences::default()),
            "[[Page|the page]]"
        );
        let events = [
            ("enter", Some(&span)),
            ("enter", Some(&Span::Emphasis)),
            ("the", None),
            ("leave", Some(&Span::Emphasis)),
            (" page", None),
            ("leave", Some(&span)),
        ];
        assert_eq!(
            render(&events, &LinkReferences::default()),
            "[[Page|*the* page]]"
        );
    }

    #[test]
    fn test_nested_underline_is_written_once() {
        let events = [
            ("enter", Some(&Span::Underline)),
            ("enter", Some(&Span::Underline)),
            ("u", None),
            ("leave", Some(&Span::Underline)),
            ("leave", Some(&Span::Underline)),
        ];
        assert_eq!(render(&events, &LinkReferences::default()), "__u__");
    }

    #[test]
    fn test_plaintext() {
        let mut renderer = InlineRenderer::new(Markup::default(), true);
        renderer.enter_span(&Span::Strong);
        renderer.text(TextKind::Normal, "bold");
        renderer.leave_span(&Span::Strong, &LinkReferences::default());
        renderer.text(TextKind::SoftBreak, "\n");
        renderer.enter_span(&Span::Code);
        renderer.text(TextKind::Code, "code");
        renderer.leave_span(&Span::Code, &LinkReferences::default());
        assert_eq!(renderer.take(), "bold code");
    }

    #[test]
    fn test_custom_markup() {
        let markup = Markup {
            bold: Delimiters::symmetric("<b>"),
            ..Markup::default()
        };
        let mut renderer = InlineRenderer::new(markup, false);
        renderer.enter_span(&Span::Strong);
        renderer.text(TextKind::Normal, "x");
        renderer.leave_span(&Span::Strong, &LinkReferences::default());
        assert_eq!(renderer.take(), "<b>x<b>");
    }

    #[test]
    fn test_xheaders() {
        let headers = Markup::default().xheaders(&Extensions::default());
        assert_eq!(headers["x-mdpo-bold-start"], "**");
        assert_eq!(headers["x-mdpo-wikilink-end"], "]]");
        assert!(!headers.contains_key("x-mdpo-underline-start"));
        assert_eq!(headers.len(), 14);
    }
}
