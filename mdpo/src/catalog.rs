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

//! Merging freshly extracted messages into an existing catalog, and
//! looking up translations in a set of catalogs.

use crate::error::Result;
use crate::po::{PoEntry, PoFile};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// What happens to entries of the previous catalog which were not
/// extracted again.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum NotFound {
    /// Keep them as obsolete (`#~`) entries.
    #[default]
    MarkObsolete,
    /// Keep them untouched.
    Preserve,
    /// Delete them.
    Remove,
}

/// A message produced by the extractor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Message {
    pub msgid: String,
    pub msgstr: String,
    pub msgctxt: Option<String>,
    pub translator_comment: Option<String>,
    /// Reference like `README.md:block 2 (paragraph)`.
    pub location: Option<String>,
    pub fuzzy: bool,
}

impl Message {
    pub fn new(msgid: impl Into<String>) -> Self {
        Message {
            msgid: msgid.into(),
            ..Message::default()
        }
    }

    pub fn to_entry(&self) -> PoEntry {
        let mut entry = PoEntry::new(self.msgid.clone());
        entry.msgstr = self.msgstr.clone();
        entry.msgctxt = self.msgctxt.clone();
        entry.translator_comment = self.translator_comment.clone();
        entry.locations.extend(self.location.clone());
        entry.set_fuzzy(self.fuzzy);
        entry
    }
}

type Identity = (String, Option<String>);

fn identity(msgid: &str, msgctxt: Option<&str>) -> Identity {
    (msgid.to_string(), msgctxt.map(String::from))
}

/// A PO file being updated by an extraction run.
#[derive(Debug, Clone)]
pub struct Catalog {
    po: PoFile,
    found: HashSet<Identity>,
    /// Identities in the order they were first found.
    found_order: Vec<Identity>,
    ignore_msgids: HashSet<String>,
}

impl Catalog {
    /// Starts a run on top of `po`.
    ///
    /// When `po` holds both a live and an obsolete entry for the same
    /// message, the obsolete one is dropped.
    pub fn new(mut po: PoFile) -> Self {
        let live: HashSet<Identity> = po
            .live_entries()
            .map(|entry| identity(&entry.msgid, entry.msgctxt.as_deref()))
            .collect();
        po.entries.retain(|entry| {
            !entry.obsolete || !live.contains(&identity(&entry.msgid, entry.msgctxt.as_deref()))
        });
        Catalog {
            po,
            found: HashSet::new(),
            found_order: Vec::new(),
            ignore_msgids: HashSet::new(),
        }
    }

    /// Messages which are never stored.
    pub fn set_ignore_msgids<I: IntoIterator<Item = String>>(&mut self, msgids: I) {
        self.ignore_msgids = msgids.into_iter().collect();
    }

    /// Inserts `message` or updates the entry with the same identity.
    ///
    /// Existing translations are kept. The first time an existing entry
    /// is seen in a run, its locations and translator comment are
    /// replaced by the new ones; later sightings append their location.
    /// Returns `false` when the message is ignored.
    pub fn upsert(&mut self, message: Message) -> bool {
        if self.ignore_msgids.contains(&message.msgid) {
            return false;
        }

        let key = identity(&message.msgid, message.msgctxt.as_deref());
        let first_sighting = self.found.insert(key.clone());
        if first_sighting {
            self.found_order.push(key);
        }

        match self.po.find_mut(&message.msgid, message.msgctxt.as_deref()) {
            Some(existing) => {
                if first_sighting {
                    existing.obsolete = false;
                    existing.locations.clear();
                    existing.translator_comment = message.translator_comment;
                    if existing.msgstr.is_empty() && !message.msgstr.is_empty() {
                        existing.msgstr = message.msgstr;
                        existing.set_fuzzy(message.fuzzy);
                    }
                }
                if let Some(location) = message.location {
                    if !existing.locations.contains(&location) {
                        existing.locations.push(location);
                    }
                }
            }
            None => self.po.entries.push(message.to_entry()),
        }
        true
    }

    /// Was this identity extracted during the current run?
    pub fn was_found(&self, msgid: &str, msgctxt: Option<&str>) -> bool {
        self.found.contains(&identity(msgid, msgctxt))
    }

    /// Entries found in the current run, in the order they were found.
    pub fn found_entries(&self) -> impl Iterator<Item = &PoEntry> {
        self.found_order
            .iter()
            .filter_map(|(msgid, msgctxt)| self.po.find(msgid, msgctxt.as_deref()))
    }

    /// Applies `policy` to the entries not found in the current run and
    /// revives the found ones.
    pub fn reconcile(&mut self, policy: NotFound) {
        let found = &self.found;
        let is_found =
            |entry: &PoEntry| found.contains(&identity(&entry.msgid, entry.msgctxt.as_deref()));
        match policy {
            NotFound::MarkObsolete => {
                for entry in &mut self.po.entries {
                    entry.obsolete = !is_found(entry);
                }
            }
            NotFound::Remove => self.po.entries.retain(is_found),
            NotFound::Preserve => {}
        }
    }

    /// Merges `metadata` into the header, overwriting existing keys.
    pub fn update_metadata(&mut self, metadata: &BTreeMap<String, String>) {
        self.po
            .metadata
            .extend(metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    pub fn po(&self) -> &PoFile {
        &self.po
    }

    pub fn po_mut(&mut self) -> &mut PoFile {
        &mut self.po
    }

    pub fn into_po(self) -> PoFile {
        self.po
    }

    /// Writes the catalog to `path` if its content differs.
    pub fn save_if_changed(&self, path: &Path) -> Result<bool> {
        crate::io::save_if_changed(path, &self.po.to_po_string())
    }
}

/// Translations of one or more catalogs, by context and msgid.
///
/// When several catalogs translate the same message, the last one wins.
/// Obsolete entries are ignored.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Translations {
    plain: HashMap<String, String>,
    with_context: HashMap<String, HashMap<String, String>>,
}

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the translations of `pofiles`.
    ///
    /// ```
    /// use mdpo::catalog::Translations;
    /// use mdpo::po::PoFile;
    ///
    /// let po = PoFile::parse("msgid \"Foo\"\nmsgstr \"Bar\"\n")?;
    /// let translations = Translations::from_po_files([&po]);
    /// assert_eq!(translations.get("Foo", None), Some("Bar"));
    /// assert_eq!(translations.get("Foo", Some("ctx")), None);
    /// # Ok::<(), mdpo::Error>(())
    /// ```
    pub fn from_po_files<'p, I>(pofiles: I) -> Self
    where
        I: IntoIterator<Item = &'p PoFile>,
    {
        let mut translations = Translations::new();
        for po in pofiles {
            for entry in po.live_entries() {
                translations.insert(&entry.msgid, entry.msgctxt.as_deref(), &entry.msgstr);
            }
        }
        translations
    }

    pub fn insert(&mut self, msgid: &str, msgctxt: Option<&str>, msgstr: &str) {
        let table = match msgctxt {
            Some(msgctxt) => self.with_context.entry(msgctxt.to_string()).or_default(),
            None => &mut self.plain,
        };
        table.insert(msgid.to_string(), msgstr.to_string());
    }

    /// The msgstr of a message, which may be empty.
    pub fn get(&self, msgid: &str, msgctxt: Option<&str>) -> Option<&str> {
        let table = match msgctxt {
            Some(msgctxt) => self.with_context.get(msgctxt)?,
            None => &self.plain,
        };
        table.get(msgid).map(String::as_str)
    }

    /// All messages without context and their translations.
    pub fn without_context(&self) -> BTreeMap<String, String> {
        self.plain
            .iter()
            .map(|(msgid, msgstr)| (msgid.clone(), msgstr.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.plain.is_empty() && self.with_context.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn message(msgid: &str, location: &str) -> Message {
        Message {
            location: Some(String::from(location)),
            ..Message::new(msgid)
        }
    }

    fn msgids(catalog: &Catalog) -> Vec<(&str, bool)> {
        catalog
            .po()
            .entries
            .iter()
            .map(|entry| (entry.msgid.as_str(), entry.obsolete))
            .collect()
    }

    #[test]
    fn test_upsert_new_messages_in_order() {
        let mut catalog = Catalog::new(PoFile::default());
        catalog.upsert(message("Header", "a.md:block 1 (header)"));
        catalog.upsert(message("Text", "a.md:block 2 (paragraph)"));
        assert_eq!(msgids(&catalog), vec![("Header", false), ("Text", false)]);
    }

    #[test]
    fn test_upsert_appends_locations() {
        let mut catalog = Catalog::new(PoFile::default());
        catalog.upsert(message("Foo", "a.md:block 1 (paragraph)"));
        catalog.upsert(message("Foo", "a.md:block 3 (paragraph)"));
        catalog.upsert(message("Foo", "a.md:block 1 (paragraph)"));
        assert_eq!(
            catalog.po().entries[0].locations,
            vec![
                String::from("a.md:block 1 (paragraph)"),
                String::from("a.md:block 3 (paragraph)"),
            ]
        );
    }

    #[test]
    fn test_upsert_keeps_translation() {
        let mut po = PoFile::default();
        let mut entry = PoEntry::new("Foo");
        entry.msgstr = String::from("Bar");
        entry.locations.push(String::from("old.md:block 9 (paragraph)"));
        po.entries.push(entry);

        let mut catalog = Catalog::new(po);
        catalog.upsert(Message {
            msgstr: String::from("Default"),
            ..message("Foo", "a.md:block 1 (paragraph)")
        });
        let entry = &catalog.po().entries[0];
        assert_eq!(entry.msgstr, "Bar");
        assert_eq!(entry.locations, vec![String::from("a.md:block 1 (paragraph)")]);
    }

    #[test]
    fn test_contexts_are_distinct_identities() {
        let mut catalog = Catalog::new(PoFile::default());
        catalog.upsert(Message {
            msgctxt: Some(String::from("month")),
            ..Message::new("May")
        });
        catalog.upsert(Message {
            msgctxt: Some(String::from("might")),
            ..Message::new("May")
        });
        assert_eq!(catalog.po().entries.len(), 2);
    }

    #[test]
    fn test_ignore_msgids() {
        let mut catalog = Catalog::new(PoFile::default());
        catalog.set_ignore_msgids([String::from("Foo")]);
        assert!(!catalog.upsert(Message::new("Foo")));
        assert!(catalog.upsert(Message::new("Bar")));
        assert_eq!(msgids(&catalog), vec![("Bar", false)]);
    }

    #[test]
    fn test_reconcile_marks_obsolete() {
        let mut po = PoFile::default();
        po.entries.push(PoEntry::new("Old"));
        let mut revived = PoEntry::new("Revived");
        revived.obsolete = true;
        revived.msgstr = String::from("Revivido");
        po.entries.push(revived);

        let mut catalog = Catalog::new(po);
        catalog.upsert(Message::new("Revived"));
        catalog.upsert(Message::new("New"));
        catalog.reconcile(NotFound::MarkObsolete);
        assert_eq!(
            msgids(&catalog),
            vec![("Old", true), ("Revived", false), ("New", false)]
        );
        assert_eq!(catalog.po().entries[1].msgstr, "Revivido");
    }

    #[test]
    fn test_reconcile_removes_not_found() {
        let mut po = PoFile::default();
        po.entries.push(PoEntry::new("Old"));
        let mut catalog = Catalog::new(po);
        catalog.upsert(Message::new("New"));
        catalog.reconcile(NotFound::Remove);
        assert_eq!(msgids(&catalog), vec![("New", false)]);
    }

    #[test]
    fn test_reconcile_preserves_not_found() {
        let mut po = PoFile::default();
        po.entries.push(PoEntry::new("Old"));
        let mut catalog = Catalog::new(po);
        catalog.upsert(Message::new("New"));
        catalog.reconcile(NotFound::Preserve);
        assert_eq!(msgids(&catalog), vec![("Old", false), ("New", false)]);
    }

    #[test]
    fn test_new_drops_obsolete_duplicates() {
        let mut po = PoFile::default();
        let mut obsolete = PoEntry::new("Foo");
        obsolete.obsolete = true;
        po.entries.push(obsolete);
        po.entries.push(PoEntry::new("Foo"));
        let catalog = Catalog::new(po);
        assert_eq!(msgids(&catalog), vec![("Foo", false)]);
    }

    #[test]
    fn test_found_entries() {
        let mut catalog = Catalog::new(PoFile::default());
        catalog.upsert(Message::new("B"));
        catalog.upsert(Message::new("A"));
        catalog.upsert(Message::new("B"));
        let found: Vec<&str> = catalog.found_entries().map(|e| e.msgid.as_str()).collect();
        assert_eq!(found, vec!["B", "A"]);
        assert!(catalog.was_found("A", None));
        assert!(!catalog.was_found("A", Some("ctx")));
    }

    #[test]
    fn test_save_if_changed_is_stable() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("messages.po");
        let mut catalog = Catalog::new(PoFile::default());
        catalog.upsert(message("Foo", "a.md:block 1 (paragraph)"));
        assert!(catalog.save_if_changed(&path)?);

        let po = PoFile::from_path(&path, crate::text::Wrapwidth::Columns(78))?;
        let mut catalog = Catalog::new(po);
        catalog.upsert(message("Foo", "a.md:block 1 (paragraph)"));
        catalog.reconcile(NotFound::MarkObsolete);
        assert!(!catalog.save_if_changed(&path)?);
        Ok(())
    }

    #[test]
    fn test_translations_last_catalog_wins() -> anyhow::Result<()> {
        let first = PoFile::parse(
            "msgid \"A\"\nmsgstr \"1\"\n\n\
             msgctxt \"c\"\nmsgid \"A\"\nmsgstr \"2\"\n\n\
             #~ msgid \"Old\"\n#~ msgstr \"Viejo\"\n",
        )?;
        let second = PoFile::parse("msgid \"A\"\nmsgstr \"3\"\n")?;
        let translations = Translations::from_po_files([&first, &second]);
        assert_eq!(translations.get("A", None), Some("3"));
        assert_eq!(translations.get("A", Some("c")), Some("2"));
        assert_eq!(translations.get("Old", None), None);
        assert_eq!(
            translations.without_context(),
            BTreeMap::from([(String::from("A"), String::from("3"))])
        );
        Ok(())
    }
}
