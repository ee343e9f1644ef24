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

//! Extraction of messages from Markdown files into a PO file.

use crate::catalog::{Catalog, NotFound};
use crate::command::CommandAliases;
use crate::engine::{Engine, EngineConfig};
use crate::error::{Error, Result};
use crate::event::Hooks;
use crate::inline::Markup;
use crate::io::{self, FilesOrContent};
use crate::markdown::Extensions;
use crate::po::{PoEntry, PoFile};
use crate::text::{check_encoding, Wrapwidth};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Options of the extractor.
#[derive(Debug, Clone)]
pub struct Md2PoOptions {
    /// Paths, file names or directory names to skip.
    pub ignore: Vec<String>,
    /// Translation of new messages.
    pub msgstr: String,
    pub plaintext: bool,
    pub markup: Markup,
    /// Write the markup strings in the PO header.
    pub xheaders: bool,
    pub include_codeblocks: bool,
    pub ignore_msgids: Vec<String>,
    pub command_aliases: CommandAliases,
    pub metadata: BTreeMap<String, String>,
    /// Write `#:` references.
    pub location: bool,
    pub mark_not_found_as_obsolete: bool,
    pub preserve_not_found: bool,
    pub extensions: Extensions,
    /// `(event, hook)` pairs, see [`Hooks::from_names`].
    pub events: Vec<(String, String)>,
    pub debug: bool,
    /// Track whether saving changed any file.
    pub check_saved_files_changed: bool,
}

impl Default for Md2PoOptions {
    fn default() -> Self {
        Md2PoOptions {
            ignore: Vec::new(),
            msgstr: String::new(),
            plaintext: false,
            markup: Markup::default(),
            xheaders: false,
            include_codeblocks: false,
            ignore_msgids: Vec::new(),
            command_aliases: CommandAliases::new(),
            metadata: BTreeMap::new(),
            location: true,
            mark_not_found_as_obsolete: true,
            preserve_not_found: true,
            extensions: Extensions::default(),
            events: Vec::new(),
            debug: false,
            check_saved_files_changed: false,
        }
    }
}

impl Md2PoOptions {
    fn not_found(&self) -> NotFound {
        if !self.preserve_not_found {
            NotFound::Remove
        } else if self.mark_not_found_as_obsolete {
            NotFound::MarkObsolete
        } else {
            NotFound::Preserve
        }
    }
}

/// Where and how the extracted catalog is written.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Previous catalog to update, if it exists.
    pub po_filepath: Option<PathBuf>,
    /// Write the catalog to `po_filepath`.
    pub save: bool,
    pub mo_filepath: Option<PathBuf>,
    pub po_encoding: Option<String>,
    pub md_encoding: String,
    pub wrapwidth: Wrapwidth,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            po_filepath: None,
            save: false,
            mo_filepath: None,
            po_encoding: None,
            md_encoding: String::from("utf-8"),
            wrapwidth: Wrapwidth::Columns(78),
        }
    }
}

/// Extracts the messages of Markdown files or content.
#[derive(Debug)]
pub struct Md2Po {
    input: FilesOrContent,
    options: Md2PoOptions,
    hooks: Hooks,
    found_entries: Vec<PoEntry>,
    disabled_entries: Vec<PoEntry>,
    saved_files_changed: Option<bool>,
}

impl Md2Po {
    pub fn new(input: FilesOrContent, options: Md2PoOptions) -> Result<Self> {
        let mut hooks = Hooks::from_names(options.events.iter().cloned(), "md2po")?;
        if options.debug {
            hooks.add_debug_hooks("md2po");
        }
        let saved_files_changed = options.check_saved_files_changed.then_some(false);
        Ok(Md2Po {
            input,
            options,
            hooks,
            found_entries: Vec::new(),
            disabled_entries: Vec::new(),
            saved_files_changed,
        })
    }

    /// Reads `files_or_content` as a glob when it matches files and as
    /// Markdown content otherwise.
    pub fn detect(files_or_content: &str, options: Md2PoOptions) -> Result<Self> {
        let input = FilesOrContent::detect(files_or_content, &options.ignore);
        Md2Po::new(input, options)
    }

    /// Hooks run while extracting.
    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    /// Entries extracted by the last call to [`Md2Po::extract`].
    pub fn found_entries(&self) -> &[PoEntry] {
        &self.found_entries
    }

    /// Messages skipped because extraction was disabled.
    pub fn disabled_entries(&self) -> &[PoEntry] {
        &self.disabled_entries
    }

    /// Whether saving changed the PO file, when checking was requested.
    pub fn saved_files_changed(&self) -> Option<bool> {
        self.saved_files_changed
    }

    fn metadata(&self) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        if self.options.xheaders {
            metadata.extend(self.options.markup.xheaders(&self.options.extensions));
            metadata.insert(
                String::from("X-Generator"),
                format!("mdpo v{}", crate::VERSION),
            );
        }
        metadata.extend(
            self.options
                .metadata
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        metadata
    }

    fn previous_catalog(path: Option<&Path>, wrapwidth: Wrapwidth) -> Result<PoFile> {
        match path {
            Some(path) if path.exists() => {
                let mut po = PoFile::from_path(path, wrapwidth)?;
                po.wrapwidth = wrapwidth;
                Ok(po)
            }
            _ => Ok(PoFile::new(wrapwidth)),
        }
    }

    /// Extracts the messages, updating the catalog at `po_filepath` if
    /// it exists.
    pub fn extract(&mut self, extract: &ExtractOptions) -> Result<PoFile> {
        check_encoding(&extract.md_encoding)?;
        if let Some(encoding) = &extract.po_encoding {
            check_encoding(encoding)?;
        }
        let po_filepath = extract.po_filepath.as_deref();
        if extract.save && po_filepath.is_none() {
            return Err(Error::SaveWithoutPoFilepath);
        }

        let mut catalog = Catalog::new(Md2Po::previous_catalog(po_filepath, extract.wrapwidth)?);
        catalog.set_ignore_msgids(self.options.ignore_msgids.iter().cloned());

        let config = EngineConfig {
            extensions: self.options.extensions,
            markup: self.options.markup.clone(),
            plaintext: self.options.plaintext,
            command_aliases: self.options.command_aliases.clone(),
            include_codeblocks: self.options.include_codeblocks,
            msgstr: self.options.msgstr.clone(),
        };
        let disabled_entries = {
            let mut engine = Engine::extractor(&mut catalog, &mut self.hooks, &config);
            match &self.input {
                FilesOrContent::Content(content) => engine.process(content)?,
                FilesOrContent::Files(paths) => {
                    for path in paths {
                        let content = io::read_to_string(path)?;
                        let location = self
                            .options
                            .location
                            .then(|| path.to_string_lossy().into_owned());
                        engine.set_location_path(location);
                        engine.process(&content)?;
                    }
                }
            }
            engine.disabled_entries().to_vec()
        };
        self.disabled_entries = disabled_entries;
        self.found_entries = catalog.found_entries().cloned().collect();

        catalog.reconcile(self.options.not_found());
        let metadata = self.metadata();
        if !metadata.is_empty() {
            catalog.update_metadata(&metadata);
        }

        if let (true, Some(path)) = (extract.save, po_filepath) {
            let changed = catalog.save_if_changed(path)?;
            if let Some(saved_files_changed) = &mut self.saved_files_changed {
                *saved_files_changed |= changed;
            }
        }
        let po = catalog.into_po();
        if let Some(mo_filepath) = &extract.mo_filepath {
            po.save_as_mo(mo_filepath)?;
        }
        Ok(po)
    }
}

/// Extracts the messages of `files_or_content` into a PO file.
///
/// `files_or_content` is a glob when it matches files and Markdown content
/// otherwise.
///
/// ```
/// use mdpo::md2po::{markdown_to_pofile, ExtractOptions, Md2PoOptions};
///
/// let po = markdown_to_pofile(
///     "# Header\n\nSome text here\n",
///     Md2PoOptions::default(),
///     &ExtractOptions::default(),
/// )?;
/// let msgids: Vec<&str> = po.entries.iter().map(|e| e.msgid.as_str()).collect();
/// assert_eq!(msgids, ["Header", "Some text here"]);
/// # Ok::<(), mdpo::Error>(())
/// ```
pub fn markdown_to_pofile(
    files_or_content: &str,
    options: Md2PoOptions,
    extract: &ExtractOptions,
) -> Result<PoFile> {
    Md2Po::detect(files_or_content, options)?.extract(extract)
}
