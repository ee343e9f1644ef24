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

//! Wrapping of inline Markdown without breaking its spans.
//!
//! The text is parsed again to find the parts which must stay on a single
//! line: code spans, math, raw HTML, autolinks, wikilinks and the
//! `](destination "title")` tail of links and images. Words are then
//! filled greedily with `textwrap`'s first fit algorithm.

use crate::markdown::{new_cmark_parser, Extensions};
use crate::text::Wrapwidth;
use pulldown_cmark::{Event, LinkType, Tag};
use std::ops::Range;
use textwrap::core::{display_width, Fragment};
use textwrap::wrap_algorithms::wrap_first_fit;

/// Words of link text are measured with this factor so the destination
/// that follows them has a chance to fit on the same line.
const LINK_MARGIN: f64 = 0.95;

#[derive(Debug)]
struct SpanWord<'a> {
    text: &'a str,
    width: f64,
}

impl Fragment for SpanWord<'_> {
    fn width(&self) -> f64 {
        self.width
    }

    fn whitespace_width(&self) -> f64 {
        1.0
    }

    fn penalty_width(&self) -> f64 {
        0.0
    }
}

/// Byte ranges of `text` which must not be broken, and the ranges of
/// link texts.
fn span_ranges(text: &str, extensions: &Extensions) -> (Vec<Range<usize>>, Vec<Range<usize>>) {
    let mut protected = Vec::new();
    let mut links = Vec::new();
    // Open links and images with the end of their last inner event.
    let mut open: Vec<(Range<usize>, usize)> = Vec::new();

    for (event, range) in new_cmark_parser(text, extensions).into_offset_iter() {
        match &event {
            Event::Start(Tag::Link { link_type, .. })
                if matches!(
                    link_type,
                    LinkType::Autolink | LinkType::Email | LinkType::WikiLink { .. }
                ) =>
            {
                protected.push(range.clone());
                open.push((range, usize::MAX));
            }
            Event::Start(Tag::Link { .. } | Tag::Image { .. }) => {
                open.push((range.clone(), range.start + 1));
            }
            Event::End(pulldown_cmark::TagEnd::Link | pulldown_cmark::TagEnd::Image) => {
                if let Some((link, inner_end)) = open.pop() {
                    if inner_end != usize::MAX {
                        protected.push(inner_end.min(link.end)..link.end);
                        links.push(link.clone());
                    }
                    if let Some((_, outer_end)) = open.last_mut() {
                        if *outer_end != usize::MAX {
                            *outer_end = link.end;
                        }
                    }
                }
            }
            Event::Code(_)
            | Event::InlineMath(_)
            | Event::DisplayMath(_)
            | Event::InlineHtml(_)
            | Event::Html(_) => {
                protected.push(range.clone());
                if let Some((_, inner_end)) = open.last_mut() {
                    if *inner_end != usize::MAX {
                        *inner_end = range.end;
                    }
                }
            }
            Event::Start(_) => {}
            _ => {
                if let Some((_, inner_end)) = open.last_mut() {
                    if *inner_end != usize::MAX {
                        *inner_end = (*inner_end).max(range.end);
                    }
                }
            }
        }
    }
    (protected, links)
}

fn contains(ranges: &[Range<usize>], idx: usize) -> bool {
    ranges.iter().any(|range| range.contains(&idx))
}

/// Can a line starting with `word` be mistaken for the start of a block?
fn starts_block(word: &str) -> bool {
    if matches!(word, "-" | "*" | "+" | ">" | "|") {
        return true;
    }
    if word.starts_with('>') || word.starts_with("```") || word.starts_with("~~~") {
        return true;
    }
    if word.chars().all(|c| c == '#') || word.chars().all(|c| c == '=') {
        return true;
    }
    if word.chars().all(|c| c == '-') || word.chars().all(|c| c == '*') {
        return true;
    }
    let digits = word.chars().take_while(char::is_ascii_digit).count();
    (1..=9).contains(&digits) && matches!(&word[digits..], "." | ")")
}

/// Re-wraps inline Markdown to a width.
#[derive(Debug, Clone)]
pub struct SpanWrapper<'a> {
    pub width: Wrapwidth,
    /// Width of the first line when it differs from `width`.
    pub first_line_width: Option<usize>,
    /// Prefix of every line but the first.
    pub indent: &'a str,
    pub first_line_indent: &'a str,
    pub extensions: &'a Extensions,
}

impl<'a> SpanWrapper<'a> {
    pub fn new(width: Wrapwidth, extensions: &'a Extensions) -> Self {
        SpanWrapper {
            width,
            first_line_width: None,
            indent: "",
            first_line_indent: "",
            extensions,
        }
    }

    /// Splits `text` into lines, without indentation.
    pub fn lines(&self, text: &str) -> Vec<String> {
        let text = text.replace('\n', " ");
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        let Some(width) = self.width.columns() else {
            return vec![text.to_string()];
        };
        let first_width = self.first_line_width.unwrap_or(width).max(1);

        let (protected, links) = span_ranges(text, self.extensions);
        let mut words = Vec::new();
        let mut start = None;
        for (idx, c) in text.char_indices() {
            if c == ' ' && !contains(&protected, idx) {
                if let Some(word_start) = start.take() {
                    words.push(word_start..idx);
                }
            } else if start.is_none() {
                start = Some(idx);
            }
        }
        if let Some(word_start) = start {
            words.push(word_start..text.len());
        }

        let fragments: Vec<SpanWord<'_>> = words
            .into_iter()
            .map(|range| {
                let mut width = display_width(&text[range.clone()]) as f64;
                if contains(&links, range.start) {
                    width /= LINK_MARGIN;
                }
                SpanWord {
                    text: &text[range],
                    width,
                }
            })
            .collect();

        let line_widths = [first_width as f64, width.max(1) as f64];
        let mut lines: Vec<Vec<&str>> = wrap_first_fit(&fragments, &line_widths)
            .into_iter()
            .map(|line| line.iter().map(|word| word.text).collect())
            .collect();

        // A line starting like a block would change the structure.
        let mut idx = 1;
        while idx < lines.len() {
            if lines[idx].first().is_some_and(|word| starts_block(word)) {
                let word = lines[idx].remove(0);
                lines[idx - 1].push(word);
                if lines[idx].is_empty() {
                    lines.remove(idx);
                }
                continue;
            }
            idx += 1;
        }

        lines.into_iter().map(|line| line.join(" ")).collect()
    }

    /// Wraps `text`, prefixing each line with its indentation.
    ///
    /// ```
    /// use mdpo::markdown::Extensions;
    /// use mdpo::text::Wrapwidth;
    /// use mdpo::wrap::SpanWrapper;
    ///
    /// let extensions = Extensions::default();
    /// let wrapper = SpanWrapper {
    ///     indent: "  ",
    ///     ..SpanWrapper::new(Wrapwidth::Columns(12), &extensions)
    /// };
    /// assert_eq!(wrapper.wrap("a `long code` span"), "a\n  `long code`\n  span");
    /// ```
    pub fn wrap(&self, text: &str) -> String {
        self.lines(text)
            .iter()
            .enumerate()
            .map(|(idx, line)| {
                let indent = if idx == 0 {
                    self.first_line_indent
                } else {
                    self.indent
                };
                format!("{indent}{line}")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
