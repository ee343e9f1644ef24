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

//! Reading and writing Gettext PO files.
//!
//! The model keeps everything `mdpo` needs to rewrite a catalog without
//! losing information: obsolete (`#~`) entries, arbitrary metadata keys,
//! previous msgids and user comments. Binary MO files are produced with
//! [`polib`].

use crate::error::{Error, Result};
use crate::text::Wrapwidth;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use textwrap::core::Word;
use textwrap::wrap_algorithms::wrap_first_fit;
use textwrap::{WordSeparator, WordSplitter};

/// Metadata keys written first, in this order. Other keys follow sorted.
const STANDARD_METADATA_KEYS: [&str; 11] = [
    "Project-Id-Version",
    "Report-Msgid-Bugs-To",
    "POT-Creation-Date",
    "PO-Revision-Date",
    "Last-Translator",
    "Language-Team",
    "Language",
    "MIME-Version",
    "Content-Type",
    "Content-Transfer-Encoding",
    "Plural-Forms",
];

/// A single message of a PO file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PoEntry {
    pub msgctxt: Option<String>,
    pub msgid: String,
    pub msgid_plural: Option<String>,
    pub msgstr: String,
    /// Plural translations, indexed by `msgstr[N]`.
    pub msgstr_plural: Vec<String>,
    /// Comment for translators, written as `#.` lines.
    pub translator_comment: Option<String>,
    /// Free comment, written as `#` lines.
    pub user_comment: Option<String>,
    /// References, written as `#:` lines.
    pub locations: Vec<String>,
    pub flags: Vec<String>,
    pub previous_msgctxt: Option<String>,
    pub previous_msgid: Option<String>,
    pub obsolete: bool,
}

impl PoEntry {
    pub fn new(msgid: impl Into<String>) -> Self {
        PoEntry {
            msgid: msgid.into(),
            ..PoEntry::default()
        }
    }

    pub fn is_fuzzy(&self) -> bool {
        self.flags.iter().any(|flag| flag == "fuzzy")
    }

    pub fn set_fuzzy(&mut self, fuzzy: bool) {
        match (fuzzy, self.is_fuzzy()) {
            (true, false) => self.flags.push(String::from("fuzzy")),
            (false, true) => self.flags.retain(|flag| flag != "fuzzy"),
            _ => {}
        }
    }

    pub fn is_translated(&self) -> bool {
        if self.msgid_plural.is_some() {
            !self.msgstr_plural.is_empty() && self.msgstr_plural.iter().all(|s| !s.is_empty())
        } else {
            !self.msgstr.is_empty()
        }
    }

    /// Do both entries have the same `msgctxt` and `msgid`?
    pub fn same_identity(&self, other: &PoEntry) -> bool {
        self.msgid == other.msgid && self.msgctxt == other.msgctxt
    }
}

/// An in-memory PO file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoFile {
    /// Comment lines written before the header entry, without `#`.
    pub header: String,
    pub metadata: BTreeMap<String, String>,
    pub metadata_is_fuzzy: bool,
    pub entries: Vec<PoEntry>,
    pub wrapwidth: Wrapwidth,
}

impl Default for PoFile {
    fn default() -> Self {
        PoFile {
            header: String::new(),
            metadata: BTreeMap::new(),
            metadata_is_fuzzy: false,
            entries: Vec::new(),
            wrapwidth: Wrapwidth::Columns(78),
        }
    }
}

impl PoFile {
    pub fn new(wrapwidth: Wrapwidth) -> Self {
        PoFile {
            wrapwidth,
            ..PoFile::default()
        }
    }

    /// Reads and parses the PO file at `path`.
    pub fn from_path(path: &Path, wrapwidth: Wrapwidth) -> Result<Self> {
        let content = crate::io::read_to_string(path)?;
        let mut po = PoFile::parse_named(&content, path)?;
        po.wrapwidth = wrapwidth;
        Ok(po)
    }

    /// Parses PO content.
    pub fn parse(content: &str) -> Result<Self> {
        PoFile::parse_named(content, Path::new("<string>"))
    }

    fn parse_named(content: &str, path: &Path) -> Result<Self> {
        let entries = Parser::new(content, path).parse()?;
        let mut po = PoFile::default();
        for entry in entries {
            let is_header = entry.msgid.is_empty()
                && entry.msgctxt.is_none()
                && !entry.obsolete
                && po.entries.is_empty()
                && po.metadata.is_empty();
            if is_header {
                po.metadata_is_fuzzy = entry.is_fuzzy();
                po.header = entry.user_comment.unwrap_or_default();
                po.metadata = parse_metadata(&entry.msgstr);
            } else {
                po.entries.push(entry);
            }
        }
        Ok(po)
    }

    /// Finds the live or obsolete entry with this identity.
    pub fn find(&self, msgid: &str, msgctxt: Option<&str>) -> Option<&PoEntry> {
        self.entries
            .iter()
            .find(|entry| entry.msgid == msgid && entry.msgctxt.as_deref() == msgctxt)
    }

    pub fn find_mut(&mut self, msgid: &str, msgctxt: Option<&str>) -> Option<&mut PoEntry> {
        self.entries
            .iter_mut()
            .find(|entry| entry.msgid == msgid && entry.msgctxt.as_deref() == msgctxt)
    }

    pub fn live_entries(&self) -> impl Iterator<Item = &PoEntry> {
        self.entries.iter().filter(|entry| !entry.obsolete)
    }

    pub fn obsolete_entries(&self) -> impl Iterator<Item = &PoEntry> {
        self.entries.iter().filter(|entry| entry.obsolete)
    }

    /// Metadata in the order it is written.
    pub fn ordered_metadata(&self) -> Vec<(&str, &str)> {
        let mut ordered: Vec<(&str, &str)> = STANDARD_METADATA_KEYS
            .iter()
            .filter_map(|key| self.metadata.get_key_value(*key))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        ordered.extend(
            self.metadata
                .iter()
                .filter(|(key, _)| !STANDARD_METADATA_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.as_str(), value.as_str())),
        );
        ordered
    }

    fn metadata_entry(&self) -> PoEntry {
        let mut entry = PoEntry::new("");
        let metadata = self.ordered_metadata();
        if !metadata.is_empty() {
            entry.msgstr = metadata
                .iter()
                .map(|(key, value)| format!("{key}: {value}\n"))
                .collect();
        }
        entry.set_fuzzy(self.metadata_is_fuzzy);
        entry
    }

    /// Serializes the file.
    ///
    /// The header comes first, then the live entries and finally the
    /// obsolete ones, each group in insertion order.
    pub fn to_po_string(&self) -> String {
        let mut output = String::new();
        for line in self.header.split('\n') {
            if line.is_empty() {
                output.push_str("#\n");
            } else if line.starts_with([',', ':']) {
                output.push_str(&format!("#{line}\n"));
            } else {
                output.push_str(&format!("# {line}\n"));
            }
        }

        let header = self.metadata_entry();
        let blocks: Vec<String> = std::iter::once(&header)
            .chain(self.live_entries())
            .chain(self.obsolete_entries())
            .map(|entry| write_entry(entry, self.wrapwidth))
            .collect();
        output.push_str(&blocks.join("\n"));
        output
    }

    /// Writes the translated live entries to a binary MO file.
    ///
    /// Fuzzy and untranslated entries are left out, as `msgfmt` does.
    pub fn save_as_mo(&self, path: &Path) -> Result<()> {
        use polib::catalog::Catalog;
        use polib::message::Message;
        use polib::metadata::CatalogMetadata;

        let mut metadata = CatalogMetadata::new();
        let get = |key: &str| self.metadata.get(key).cloned().unwrap_or_default();
        metadata.project_id_version = get("Project-Id-Version");
        metadata.pot_creation_date = get("POT-Creation-Date");
        metadata.po_revision_date = get("PO-Revision-Date");
        metadata.last_translator = get("Last-Translator");
        metadata.language_team = get("Language-Team");
        metadata.mime_version = get("MIME-Version");
        metadata.content_type = get("Content-Type");
        metadata.content_transfer_encoding = get("Content-Transfer-Encoding");
        metadata.language = get("Language");

        let mut catalog = Catalog::new(metadata);
        for entry in self.live_entries() {
            if entry.is_fuzzy() || !entry.is_translated() {
                continue;
            }
            let mut builder = match &entry.msgid_plural {
                Some(plural) => {
                    let mut builder = Message::build_plural();
                    builder
                        .with_msgid_plural(plural.clone())
                        .with_msgstr_plural(entry.msgstr_plural.clone());
                    builder
                }
                None => {
                    let mut builder = Message::build_singular();
                    builder.with_msgstr(entry.msgstr.clone());
                    builder
                }
            };
            builder.with_msgid(entry.msgid.clone());
            if let Some(msgctxt) = &entry.msgctxt {
                builder.with_msgctxt(msgctxt.clone());
            }
            catalog.append_or_update(builder.done());
        }

        polib::mo_file::write(&catalog, path).map_err(|err| Error::MoExport {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }
}

/// Parses the `Key: value` lines of a header msgstr.
fn parse_metadata(msgstr: &str) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    let mut last_key: Option<String> = None;
    for line in msgstr.lines() {
        match line.split_once(':') {
            Some((key, value)) => {
                let key = key.trim().to_string();
                metadata.insert(key.clone(), value.trim().to_string());
                last_key = Some(key);
            }
            None if !line.trim().is_empty() => {
                if let Some(value) = last_key.as_ref().and_then(|key| metadata.get_mut(key)) {
                    value.push('\n');
                    value.push_str(line.trim());
                }
            }
            None => {}
        }
    }
    metadata
}

/// Escapes a string for use between double quotes.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Reverses [`escape`]. Unknown escapes keep the escaped character.
pub fn unescape(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => unescaped.push('\n'),
            Some('t') => unescaped.push('\t'),
            Some('r') => unescaped.push('\r'),
            Some('0') => unescaped.push('\0'),
            Some(other) => unescaped.push(other),
            None => unescaped.push('\\'),
        }
    }
    unescaped
}

/// Problems reported by the checks of a serialized PO file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Problem {
    Obsolete,
    Fuzzy,
    EmptyMsgstr,
}

impl Problem {
    pub fn describe(self, plural: bool) -> &'static str {
        match (self, plural) {
            (Problem::Obsolete, false) => "obsolete entry",
            (Problem::Obsolete, true) => "obsolete entries",
            (Problem::Fuzzy, false) => "fuzzy entry",
            (Problem::Fuzzy, true) => "fuzzy entries",
            (Problem::EmptyMsgstr, false) => "empty msgstr",
            (Problem::EmptyMsgstr, true) => "empty msgstrs",
        }
    }

    /// One based line numbers of the problems found in `content`.
    ///
    /// ```
    /// use mdpo::po::Problem;
    ///
    /// let content = "#, fuzzy\nmsgid \"a\"\nmsgstr \"\"\n\n#~ msgid \"b\"\n#~ msgstr \"c\"\n";
    /// assert_eq!(Problem::Fuzzy.find_lines(content), [1]);
    /// assert_eq!(Problem::EmptyMsgstr.find_lines(content), [3]);
    /// assert_eq!(Problem::Obsolete.find_lines(content), [5]);
    /// ```
    pub fn find_lines(self, content: &str) -> Vec<usize> {
        let lines: Vec<&str> = content.lines().collect();
        let mut found = Vec::new();
        match self {
            Problem::Obsolete => {
                let mut inside = false;
                for (idx, line) in lines.iter().enumerate() {
                    let obsolete = line.starts_with("#~ ");
                    if obsolete && !inside {
                        found.push(idx + 1);
                    }
                    inside = obsolete;
                }
            }
            Problem::Fuzzy => {
                for (idx, line) in lines.iter().enumerate() {
                    if line.starts_with("#,") && line.contains("fuzzy") {
                        found.push(idx + 1);
                    }
                }
            }
            Problem::EmptyMsgstr => {
                for (idx, line) in lines.iter().enumerate() {
                    let empty = *line == "msgstr \"\"" || *line == "#~ msgstr \"\"";
                    let header = idx > 0 && lines[idx - 1].starts_with("msgid \"\"");
                    let continued = lines
                        .get(idx + 1)
                        .is_some_and(|next| !next.trim().is_empty());
                    if empty && !header && !continued {
                        found.push(idx + 1);
                    }
                }
            }
        }
        found
    }
}

/// Wraps `text` at spaces into lines no wider than `width`, keeping the
/// spaces at the end of each line.
fn wrap_keeping_whitespace(text: &str, width: usize) -> Vec<String> {
    let words: Vec<Word> = WordSeparator::AsciiSpace.find_words(text).collect();
    wrap_first_fit(&words, &[width as f64])
        .into_iter()
        .map(|line| {
            line.iter()
                .flat_map(|word| [word.word, word.whitespace])
                .collect()
        })
        .collect()
}

/// Wraps a comment like `xgettext` does, dropping whitespace at breaks
/// and never splitting words.
fn wrap_comment(text: &str, prefix: &str, wrapwidth: Wrapwidth) -> Vec<String> {
    match wrapwidth.columns() {
        Some(width) if text.chars().count() + prefix.len() > width => {
            let options = textwrap::Options::new(width)
                .initial_indent(prefix)
                .subsequent_indent(prefix)
                .break_words(false)
                .word_separator(WordSeparator::AsciiSpace)
                .word_splitter(WordSplitter::NoHyphenation);
            textwrap::wrap(text, options)
                .into_iter()
                .map(|line| line.into_owned())
                .collect()
        }
        _ if text.is_empty() => vec![prefix.trim_end().to_string()],
        _ => vec![format!("{prefix}{text}")],
    }
}

/// Writes `#:` lines, never splitting a single reference.
fn wrap_locations(locations: &[String], wrapwidth: Wrapwidth) -> Vec<String> {
    let padded: Vec<String> = locations.iter().map(|location| format!("{location} ")).collect();
    let words: Vec<Word> = padded.iter().map(|location| Word::from(location)).collect();
    let width = wrapwidth.columns().map_or(f64::INFINITY, |width| width.saturating_sub(3) as f64);
    wrap_first_fit(&words, &[width])
        .into_iter()
        .map(|line| {
            let references: Vec<&str> = line.iter().map(|word| word.word).collect();
            format!("#: {}", references.join(" "))
        })
        .collect()
}

/// Writes `keyword "value"` lines, splitting long or multi-line values.
fn write_field(
    lines: &mut Vec<String>,
    prefix: &str,
    keyword: &str,
    value: &str,
    wrapwidth: Wrapwidth,
) {
    let mut parts: Vec<String> = value.split_inclusive('\n').map(escape).collect();
    if parts.len() > 1 {
        parts.insert(0, String::new());
    } else {
        let escaped = escape(value);
        let keyword_width = keyword.chars().count() + 3;
        parts = match wrapwidth.columns() {
            Some(width) if escaped.chars().count() + keyword_width > width => {
                let mut wrapped = wrap_keeping_whitespace(&escaped, width.saturating_sub(2).max(1));
                wrapped.insert(0, String::new());
                wrapped
            }
            _ => vec![escaped],
        };
    }

    let mut parts = parts.into_iter();
    let first = parts.next().unwrap_or_default();
    lines.push(format!("{prefix}{keyword} \"{first}\""));
    lines.extend(parts.map(|part| format!("{prefix}\"{part}\"")));
}

fn write_entry(entry: &PoEntry, wrapwidth: Wrapwidth) -> String {
    let mut lines = Vec::new();
    if !entry.obsolete {
        if let Some(comment) = &entry.translator_comment {
            for line in comment.split('\n') {
                lines.extend(wrap_comment(line, "#. ", wrapwidth));
            }
        }
    }
    if let Some(comment) = &entry.user_comment {
        for line in comment.split('\n') {
            lines.extend(wrap_comment(line, "# ", wrapwidth));
        }
    }
    if !entry.obsolete && !entry.locations.is_empty() {
        lines.extend(wrap_locations(&entry.locations, wrapwidth));
    }
    if !entry.flags.is_empty() {
        lines.push(format!("#, {}", entry.flags.join(", ")));
    }

    let (previous_prefix, prefix) = if entry.obsolete {
        ("#~| ", "#~ ")
    } else {
        ("#| ", "")
    };
    if let Some(previous) = &entry.previous_msgctxt {
        write_field(&mut lines, previous_prefix, "msgctxt", previous, wrapwidth);
    }
    if let Some(previous) = &entry.previous_msgid {
        write_field(&mut lines, previous_prefix, "msgid", previous, wrapwidth);
    }

    if let Some(msgctxt) = &entry.msgctxt {
        write_field(&mut lines, prefix, "msgctxt", msgctxt, wrapwidth);
    }
    write_field(&mut lines, prefix, "msgid", &entry.msgid, wrapwidth);
    if let Some(plural) = &entry.msgid_plural {
        write_field(&mut lines, prefix, "msgid_plural", plural, wrapwidth);
        for (idx, msgstr) in entry.msgstr_plural.iter().enumerate() {
            write_field(&mut lines, prefix, &format!("msgstr[{idx}]"), msgstr, wrapwidth);
        }
    } else {
        write_field(&mut lines, prefix, "msgstr", &entry.msgstr, wrapwidth);
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Splits the content of `#:` lines into references.
///
/// References written by `mdpo` contain spaces, as in
/// `README.md:block 3 (unordered list)`, so they are matched as a whole.
fn split_locations(text: &str) -> impl Iterator<Item = String> + '_ {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        let pattern = r"(?x)
              \S+:block\s\d+\s\([^)]*\)   # a block reference
              | \S+                       # any other reference
        ";
        Regex::new(pattern).expect("well-formed regex")
    });
    re.find_iter(text).map(|m| m.as_str().to_string())
}

fn append_line(target: &mut Option<String>, text: &str) {
    match target {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(text);
        }
        None => *target = Some(text.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Msgctxt,
    Msgid,
    MsgidPlural,
    Msgstr,
    MsgstrPlural(usize),
    PreviousMsgctxt,
    PreviousMsgid,
}

/// Line oriented PO parser.
struct Parser<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    path: PathBuf,
    entries: Vec<PoEntry>,
    current: PoEntry,
    /// Content of the `#:` lines of the current entry.
    locations: String,
    field: Option<Field>,
    seen_msgstr: bool,
    started: bool,
}

impl<'a> Parser<'a> {
    fn new(content: &'a str, path: &Path) -> Self {
        Parser {
            lines: content.lines().enumerate(),
            path: path.to_path_buf(),
            entries: Vec::new(),
            current: PoEntry::default(),
            locations: String::new(),
            field: None,
            seen_msgstr: false,
            started: false,
        }
    }

    fn error(&self, line: usize, message: impl Into<String>) -> Error {
        Error::PoSyntax {
            path: self.path.clone(),
            line: line + 1,
            message: message.into(),
        }
    }

    /// Closes the current entry if its msgstr has already been read.
    fn finish_if_complete(&mut self) {
        if self.seen_msgstr {
            self.finish();
        }
    }

    fn finish(&mut self) {
        if self.started {
            let mut entry = std::mem::take(&mut self.current);
            entry.locations = split_locations(&std::mem::take(&mut self.locations)).collect();
            self.entries.push(entry);
        }
        self.field = None;
        self.seen_msgstr = false;
        self.started = false;
    }

    fn parse(mut self) -> Result<Vec<PoEntry>> {
        while let Some((lineno, line)) = self.lines.next() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix("#~") {
                let rest = rest.trim_start();
                if let Some(previous) = rest.strip_prefix('|') {
                    self.parse_previous(lineno, previous.trim_start(), true)?;
                } else if !rest.is_empty() {
                    self.parse_keyword(lineno, rest, true)?;
                }
            } else if let Some(rest) = line.strip_prefix("#|") {
                self.parse_previous(lineno, rest.trim_start(), false)?;
            } else if let Some(rest) = line.strip_prefix('#') {
                self.parse_comment(rest);
            } else {
                self.parse_keyword(lineno, line, false)?;
            }
        }
        self.finish();
        Ok(self.entries)
    }

    fn parse_comment(&mut self, rest: &str) {
        self.finish_if_complete();
        self.started = true;
        if let Some(comment) = rest.strip_prefix('.') {
            append_line(&mut self.current.translator_comment, comment.trim());
        } else if let Some(references) = rest.strip_prefix(':') {
            self.locations.push(' ');
            self.locations.push_str(references);
        } else if let Some(flags) = rest.strip_prefix(',') {
            self.current.flags.extend(
                flags
                    .split(',')
                    .map(str::trim)
                    .filter(|flag| !flag.is_empty())
                    .map(String::from),
            );
        } else {
            append_line(
                &mut self.current.user_comment,
                rest.strip_prefix(' ').unwrap_or(rest),
            );
        }
    }

    fn parse_previous(&mut self, lineno: usize, rest: &str, obsolete: bool) -> Result<()> {
        if rest.starts_with('"') {
            let value = self.parse_quoted(lineno, rest)?;
            return self.append_to_field(lineno, &value);
        }
        self.finish_if_complete();
        self.current.obsolete |= obsolete;
        self.started = true;
        let (keyword, value) = self.split_keyword(lineno, rest)?;
        let field = match keyword {
            "msgctxt" => Field::PreviousMsgctxt,
            "msgid" => Field::PreviousMsgid,
            // Previous plural msgids are not kept.
            "msgid_plural" => {
                self.field = None;
                return Ok(());
            }
            _ => return Err(self.error(lineno, format!("unknown keyword '{keyword}'"))),
        };
        self.field = Some(field);
        self.append_to_field(lineno, &value)
    }

    /// Parses a keyword line, or a string continuing the current field.
    ///
    /// `obsolete` lines mark the entry they belong to, once the previous
    /// entry has been closed.
    fn parse_keyword(&mut self, lineno: usize, line: &str, obsolete: bool) -> Result<()> {
        if line.starts_with('"') {
            let value = self.parse_quoted(lineno, line)?;
            return self.append_to_field(lineno, &value);
        }

        let (keyword, value) = self.split_keyword(lineno, line)?;
        let field = match keyword {
            "msgctxt" => {
                self.finish_if_complete();
                self.current.msgctxt = Some(String::new());
                Field::Msgctxt
            }
            "msgid" => {
                self.finish_if_complete();
                Field::Msgid
            }
            "msgid_plural" => {
                self.current.msgid_plural = Some(String::new());
                Field::MsgidPlural
            }
            "msgstr" => {
                self.seen_msgstr = true;
                Field::Msgstr
            }
            _ => {
                let index = keyword
                    .strip_prefix("msgstr[")
                    .and_then(|rest| rest.strip_suffix(']'))
                    .and_then(|index| index.parse::<usize>().ok())
                    .ok_or_else(|| self.error(lineno, format!("unknown keyword '{keyword}'")))?;
                self.seen_msgstr = true;
                if self.current.msgstr_plural.len() <= index {
                    self.current.msgstr_plural.resize(index + 1, String::new());
                }
                Field::MsgstrPlural(index)
            }
        };
        self.current.obsolete |= obsolete;
        self.started = true;
        self.field = Some(field);
        self.append_to_field(lineno, &value)
    }

    fn split_keyword<'l>(&self, lineno: usize, line: &'l str) -> Result<(&'l str, String)> {
        let (keyword, rest) = line
            .split_once(|c: char| c.is_whitespace())
            .ok_or_else(|| self.error(lineno, format!("expected a quoted string in '{line}'")))?;
        let value = self.parse_quoted(lineno, rest.trim())?;
        Ok((keyword, value))
    }

    fn parse_quoted(&self, lineno: usize, text: &str) -> Result<String> {
        let inner = text
            .strip_prefix('"')
            .and_then(|text| text.strip_suffix('"'))
            .ok_or_else(|| self.error(lineno, format!("invalid quoted string {text}")))?;
        Ok(unescape(inner))
    }

    fn append_to_field(&mut self, lineno: usize, value: &str) -> Result<()> {
        let entry = &mut self.current;
        let target = match self.field {
            Some(Field::Msgctxt) => entry.msgctxt.get_or_insert_with(String::new),
            Some(Field::Msgid) => &mut entry.msgid,
            Some(Field::MsgidPlural) => entry.msgid_plural.get_or_insert_with(String::new),
            Some(Field::Msgstr) => &mut entry.msgstr,
            Some(Field::MsgstrPlural(index)) => &mut entry.msgstr_plural[index],
            Some(Field::PreviousMsgctxt) => entry.previous_msgctxt.get_or_insert_with(String::new),
            Some(Field::PreviousMsgid) => entry.previous_msgid.get_or_insert_with(String::new),
            None => return Err(self.error(lineno, "string without a keyword")),
        };
        target.push_str(value);
        Ok(())
    }
}
