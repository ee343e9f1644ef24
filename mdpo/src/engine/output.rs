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

//! Markdown writer used when applying translations.
//!
//! Blocks are written line by line. Each line is prefixed according to the
//! enclosing quotes and list items: `> ` for a quote, the list marker for
//! the first line of an item and spaces of the same width afterwards.

use crate::markdown::{Alignment, Block, Extensions, Fence};
use crate::text::Wrapwidth;
use crate::wrap::SpanWrapper;

#[derive(Debug)]
enum Container {
    Quote {
        /// A line was written inside the quote.
        started: bool,
    },
    Item {
        marker: String,
        /// The marker has not been written yet.
        pending: bool,
        task: Option<char>,
        tight: bool,
    },
}

impl Container {
    fn width(&self) -> usize {
        match self {
            Container::Quote { .. } => 2,
            Container::Item { marker, .. } => marker.chars().count(),
        }
    }
}

#[derive(Debug)]
enum ListMarker {
    Bullet(char),
    Ordered { next: u64, delimiter: char },
}

#[derive(Debug)]
struct List {
    marker: ListMarker,
    tight: bool,
    /// At least one item was completed.
    started: bool,
}

#[derive(Debug, Default)]
struct Table {
    alignments: Vec<Alignment>,
    rows: Vec<Vec<String>>,
}

/// Escapes `|` characters which are not escaped yet.
fn escape_pipes(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut previous = None;
    for c in text.chars() {
        if c == '|' && previous != Some('\\') {
            escaped.push('\\');
        }
        escaped.push(c);
        previous = Some(c);
    }
    escaped
}

fn separator(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::None => "---",
        Alignment::Left => ":--",
        Alignment::Center => ":-:",
        Alignment::Right => "--:",
    }
}

#[derive(Debug)]
pub(crate) struct Output {
    lines: Vec<String>,
    containers: Vec<Container>,
    lists: Vec<List>,
    /// The next block must be separated by a blank line.
    separate: bool,
    table: Option<Table>,
    wrapwidth: Wrapwidth,
    extensions: Extensions,
}

impl Output {
    pub(crate) fn new(wrapwidth: Wrapwidth, extensions: Extensions) -> Self {
        Output {
            lines: Vec::new(),
            containers: Vec::new(),
            lists: Vec::new(),
            separate: false,
            table: None,
            wrapwidth,
            extensions,
        }
    }

    fn prefix_width(&self) -> usize {
        self.containers.iter().map(Container::width).sum()
    }

    /// Blank lines inside tight list items would make the list loose.
    fn suppress_blank(&self) -> bool {
        match self.containers.last() {
            Some(Container::Item {
                tight: true,
                pending,
                ..
            }) => {
                !pending
                    || self.lists.last().is_some_and(|list| list.started)
                    || matches!(
                        self.containers.iter().rev().nth(1),
                        Some(Container::Item { tight: true, .. })
                    )
            }
            _ => false,
        }
    }

    fn blank_line(&self) -> String {
        let mut prefix = String::new();
        for container in &self.containers {
            match container {
                Container::Item { pending: true, .. } | Container::Quote { started: false } => {
                    break
                }
                Container::Item { marker, .. } => prefix.push_str(&" ".repeat(marker.len())),
                Container::Quote { started: true } => prefix.push_str("> "),
            }
        }
        prefix.trim_end().to_string()
    }

    fn line_prefix(&mut self) -> String {
        let mut prefix = String::new();
        for container in &mut self.containers {
            match container {
                Container::Quote { started } => {
                    prefix.push_str("> ");
                    *started = true;
                }
                Container::Item {
                    marker, pending, ..
                } => {
                    if *pending {
                        prefix.push_str(marker);
                        *pending = false;
                    } else {
                        prefix.push_str(&" ".repeat(marker.chars().count()));
                    }
                }
            }
        }
        prefix
    }

    fn write_lines(&mut self, lines: Vec<String>, force_blank: bool) {
        if lines.is_empty() {
            return;
        }
        if !self.lines.is_empty() && (force_blank || (self.separate && !self.suppress_blank())) {
            let blank = self.blank_line();
            self.lines.push(blank);
        }
        for line in lines {
            let prefix = self.line_prefix();
            if line.is_empty() {
                self.lines.push(prefix.trim_end().to_string());
            } else {
                self.lines.push(format!("{prefix}{line}"));
            }
        }
        self.separate = true;
    }

    fn write(&mut self, lines: Vec<String>) {
        self.write_lines(lines, false);
    }

    /// Takes the task mark of the innermost item if its first line was
    /// not written yet.
    fn take_task(&mut self) -> Option<char> {
        match self.containers.last_mut() {
            Some(Container::Item {
                pending: true,
                task,
                ..
            }) => task.take(),
            _ => None,
        }
    }

    /// Writes inline text as a wrapped paragraph.
    pub(crate) fn paragraph(&mut self, text: &str) {
        let task = self.take_task().map(|mark| format!("[{mark}] "));
        let task_width = task.as_ref().map_or(0, String::len);
        let width = match self.wrapwidth {
            Wrapwidth::Columns(n) => Wrapwidth::Columns(n.saturating_sub(self.prefix_width()).max(1)),
            Wrapwidth::Infinite => Wrapwidth::Infinite,
        };
        let first_line_width = width.columns().map(|n| n.saturating_sub(task_width).max(1));

        // Hard breaks are kept as backslashes ending the broken lines.
        let mut lines: Vec<String> = Vec::new();
        let segments: Vec<&str> = text.trim().split('\n').collect();
        for (idx, segment) in segments.iter().enumerate() {
            let wrapper = SpanWrapper {
                first_line_width: if lines.is_empty() { first_line_width } else { None },
                ..SpanWrapper::new(width, &self.extensions)
            };
            let segment_lines = wrapper.lines(segment);
            if segment_lines.is_empty() {
                continue;
            }
            lines.extend(segment_lines);
            if idx + 1 < segments.len() {
                if let Some(last) = lines.last_mut() {
                    last.push('\\');
                }
            }
        }
        match (&task, lines.first_mut()) {
            (Some(task), Some(first)) => first.insert_str(0, task),
            (Some(task), None) => lines.push(task.trim_end().to_string()),
            (None, _) => {}
        }
        self.write(lines);
    }

    pub(crate) fn heading(&mut self, level: u8, text: &str) {
        let hashes = "#".repeat(usize::from(level.max(1)));
        let line = format!("{hashes} {}", text.replace('\n', " ").trim());
        self.write(vec![line.trim_end().to_string()]);
    }

    pub(crate) fn code_block(&mut self, fence: Option<Fence>, info: &str, content: &str) {
        let content = content.strip_suffix('\n').unwrap_or(content);
        let content_lines: Vec<&str> = if content.is_empty() {
            Vec::new()
        } else {
            content.split('\n').collect()
        };

        match fence {
            Some(fence) => {
                let longest = content_lines
                    .iter()
                    .map(|line| line.trim_start().chars().take_while(|c| *c == fence.char).count())
                    .max()
                    .unwrap_or(0);
                let fence = fence.char.to_string().repeat(fence.len.max(longest + 1).max(3));
                let mut lines = vec![format!("{fence}{info}")];
                lines.extend(content_lines.iter().map(|line| line.to_string()));
                lines.push(fence);
                self.write(lines);
            }
            None => {
                let lines = content_lines
                    .iter()
                    .map(|line| {
                        if line.is_empty() {
                            String::new()
                        } else {
                            format!("    {line}")
                        }
                    })
                    .collect();
                // An indented block cannot interrupt a paragraph.
                self.write_lines(lines, true);
            }
        }
    }

    pub(crate) fn html(&mut self, html: &str) {
        let html = html.trim_end_matches('\n');
        if html.is_empty() {
            return;
        }
        self.write(html.split('\n').map(String::from).collect());
    }

    pub(crate) fn rule(&mut self) {
        let inside_item = self
            .containers
            .iter()
            .any(|container| matches!(container, Container::Item { .. }));
        let rule = if inside_item { "***" } else { "---" };
        self.write(vec![String::from(rule)]);
    }

    pub(crate) fn enter_quote(&mut self) {
        self.containers.push(Container::Quote { started: false });
    }

    pub(crate) fn leave_quote(&mut self) {
        self.containers.pop();
        self.separate = true;
    }

    pub(crate) fn enter_list(&mut self, block: &Block) {
        let (marker, tight) = match block {
            Block::UnorderedList { mark, tight } => (ListMarker::Bullet(*mark), *tight),
            Block::OrderedList {
                start,
                delimiter,
                tight,
            } => (
                ListMarker::Ordered {
                    next: *start,
                    delimiter: *delimiter,
                },
                *tight,
            ),
            _ => return,
        };
        self.lists.push(List {
            marker,
            tight,
            started: false,
        });
    }

    pub(crate) fn leave_list(&mut self) {
        self.lists.pop();
        self.separate = true;
    }

    pub(crate) fn enter_item(&mut self, task: Option<char>) {
        let Some(list) = self.lists.last_mut() else {
            return;
        };
        let marker = match &mut list.marker {
            ListMarker::Bullet(mark) => format!("{mark} "),
            ListMarker::Ordered { next, delimiter } => {
                let marker = format!("{next}{delimiter} ");
                *next += 1;
                marker
            }
        };
        let tight = list.tight;
        self.containers.push(Container::Item {
            marker,
            pending: true,
            task,
            tight,
        });
    }

    pub(crate) fn leave_item(&mut self) {
        if let Some(Container::Item { pending: true, .. }) = self.containers.last() {
            let task = self.take_task().map(|mark| format!("[{mark}]"));
            self.write(vec![task.unwrap_or_default()]);
        }
        if let Some(Container::Item { .. }) = self.containers.last() {
            self.containers.pop();
        }
        if let Some(list) = self.lists.last_mut() {
            list.started = true;
        }
        self.separate = true;
    }

    pub(crate) fn enter_table(&mut self, alignments: &[Alignment]) {
        self.table = Some(Table {
            alignments: alignments.to_vec(),
            rows: Vec::new(),
        });
    }

    pub(crate) fn start_row(&mut self) {
        if let Some(table) = &mut self.table {
            table.rows.push(Vec::new());
        }
    }

    pub(crate) fn cell(&mut self, text: &str) {
        if let Some(row) = self.table.as_mut().and_then(|table| table.rows.last_mut()) {
            row.push(escape_pipes(text.trim()));
        }
    }

    pub(crate) fn leave_table(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };
        let columns = table.alignments.len().max(1);
        let format_row = |cells: &[String]| {
            let mut cells = cells.to_vec();
            while cells.len() < columns {
                cells.push(String::new());
            }
            format!("| {} |", cells.join(" | ")).replace("|  |", "| |")
        };

        let mut rows = table.rows.iter();
        let mut lines = Vec::new();
        if let Some(head) = rows.next() {
            lines.push(format_row(head));
            let separators: Vec<&str> = (0..columns)
                .map(|idx| separator(table.alignments.get(idx).copied().unwrap_or_default()))
                .collect();
            lines.push(format!("| {} |", separators.join(" | ")));
        }
        lines.extend(rows.map(|row| format_row(row)));
        self.write(lines);
    }

    /// Returns the document, followed by the link reference definitions.
    pub(crate) fn finish(self, references: Vec<String>) -> String {
        let mut lines = self.lines;
        if !references.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.extend(references);
        }
        if lines.is_empty() {
            return String::new();
        }
        let mut output = lines.join("\n");
        output.push('\n');
        output
    }
}
