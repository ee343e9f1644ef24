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

//! Link reference definitions like `[label]: https://example.com "Title"`.
//!
//! The CommonMark parser consumes the definitions without reporting them,
//! so they are recovered from the source with a line based scan.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

fn definition_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = r#"(?x)
              ^\s{0,3}
              \[(?<label>[^\]]+)\]:   # the label
              \s+
              <?(?<href>[^\s>]+)>?    # the destination, maybe inside <>
              \s*
              ["'(]?
              (?<title>[^"')]+)?      # an optional title
        "#;
        Regex::new(pattern).expect("well-formed regex")
    })
}

/// A single `[label]: href "title"` definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReference {
    pub label: String,
    pub href: String,
    pub title: Option<String>,
}

impl LinkReference {
    /// Parses a definition, ignoring up to three spaces of indentation.
    pub fn parse(line: &str) -> Option<LinkReference> {
        let captures = definition_regex().captures(line)?;
        Some(LinkReference {
            label: captures["label"].to_string(),
            href: captures["href"].to_string(),
            title: captures
                .name("title")
                .map(|title| title.as_str().trim_end().to_string())
                .filter(|title| !title.is_empty()),
        })
    }

    /// The ` href "title"` part written after the label.
    pub fn destination(&self) -> String {
        match &self.title {
            Some(title) => format!(" {} \"{title}\"", self.href),
            None => format!(" {}", self.href),
        }
    }
}

impl fmt::Display for LinkReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]:{}", self.label, self.destination())
    }
}

/// All definitions of a document, in source order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkReferences {
    references: Vec<LinkReference>,
}

impl LinkReferences {
    /// Scans `content` for definitions.
    ///
    /// # Examples
    ///
    /// ```
    /// use mdpo::link_refs::LinkReferences;
    ///
    /// let refs = LinkReferences::parse("[docs]: https://example.com \"Docs\"\n");
    /// assert_eq!(refs.resolve("https://example.com", Some("Docs")), Some("docs"));
    /// assert_eq!(refs.resolve("https://example.com", None), Some("docs"));
    /// assert_eq!(refs.resolve("https://example.com", Some("Other")), None);
    /// ```
    pub fn parse(content: &str) -> LinkReferences {
        let references = content
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with('['))
            .filter_map(LinkReference::parse)
            .collect();
        LinkReferences { references }
    }

    /// Finds the label of the definition pointing to `href`.
    ///
    /// When `title` is given, the definition must carry the same title.
    pub fn resolve(&self, href: &str, title: Option<&str>) -> Option<&str> {
        let title = title.filter(|title| !title.is_empty());
        self.references
            .iter()
            .find(|reference| {
                reference.href == href
                    && title.map_or(true, |title| reference.title.as_deref() == Some(title))
            })
            .map(|reference| reference.label.as_str())
    }

    /// Is there a definition for `label`? Labels match case-insensitively.
    pub fn contains_label(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.references
            .iter()
            .any(|reference| reference.label.to_lowercase() == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkReference> {
        self.references.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }
}

fn referenced_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\]]+)\]\[([^\]\s]+)\]").expect("well-formed regex"))
}

/// Replaces `[text][label]` by `[text](href "title")` using `definitions`.
fn inline_references(message: &str, definitions: &[LinkReference]) -> Option<String> {
    let mut changed = false;
    let replaced = referenced_link_regex().replace_all(message, |captures: &regex::Captures| {
        let text = &captures[1];
        let label = &captures[2];
        match definitions.iter().find(|reference| reference.label == label) {
            Some(reference) => {
                changed = true;
                match &reference.title {
                    Some(title) => format!("[{text}]({} \"{title}\")", reference.href),
                    None => format!("[{text}]({})", reference.href),
                }
            }
            None => captures[0].to_string(),
        }
    });
    changed.then(|| replaced.into_owned())
}

/// Resolves reference links across a set of translations.
///
/// The translations must hold both the definition messages
/// (`[label]: href "title"`, in the form produced by the extractor) and
/// the messages using `[text][label]`. For each message using a known
/// label, the returned map holds the message and its translation with the
/// references replaced by inline links. Definitions are looked up in the
/// msgids for the msgid and in the msgstrs for the msgstr.
///
/// ```
/// use mdpo::link_refs::solve_link_reference_targets;
/// use std::collections::BTreeMap;
///
/// let translations = BTreeMap::from([
///     (String::from("[home]: https://example.com"), String::from("[home]: https://example.es")),
///     (String::from("Go [home][home]"), String::from("Ir a [casa][home]")),
/// ]);
/// let solved = solve_link_reference_targets(&translations);
/// assert_eq!(
///     solved.get("Go [home](https://example.com)").map(String::as_str),
///     Some("Ir a [casa](https://example.es)")
/// );
/// ```
pub fn solve_link_reference_targets(
    translations: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut msgid_definitions = Vec::new();
    let mut msgstr_definitions = Vec::new();
    for (msgid, msgstr) in translations {
        if !msgid.starts_with('[') {
            continue;
        }
        if let (Some(source), Some(target)) = (
            LinkReference::parse(msgid.trim_start_matches(' ')),
            LinkReference::parse(msgstr.trim_start_matches(' ')),
        ) {
            msgid_definitions.push(source);
            msgstr_definitions.push(target);
        }
    }

    let mut solutions = BTreeMap::new();
    for (msgid, msgstr) in translations {
        if !referenced_link_regex().is_match(msgid) || !referenced_link_regex().is_match(msgstr) {
            continue;
        }
        let new_msgid = inline_references(msgid, &msgid_definitions);
        let new_msgstr = inline_references(msgstr, &msgstr_definitions);
        if new_msgid.is_some() || new_msgstr.is_some() {
            solutions.insert(
                new_msgid.unwrap_or_else(|| msgid.clone()),
                new_msgstr.unwrap_or_else(|| msgstr.clone()),
            );
        }
    }
    solutions
}
