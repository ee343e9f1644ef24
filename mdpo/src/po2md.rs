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

//! Translation of Markdown files using PO files.

use crate::catalog::Translations;
use crate::command::CommandAliases;
use crate::engine::{Engine, EngineConfig};
use crate::error::Result;
use crate::event::Hooks;
use crate::inline::Markup;
use crate::io;
use crate::markdown::Extensions;
use crate::po::{PoEntry, PoFile};
use crate::text::{check_encoding, Wrapwidth};
use std::path::Path;

/// Options of the translator.
#[derive(Debug, Clone)]
pub struct Po2MdOptions {
    /// Paths, file names or directory names of PO files to skip.
    pub ignore: Vec<String>,
    pub command_aliases: CommandAliases,
    /// Width of the written paragraphs. Zero means no wrapping.
    pub wrapwidth: Wrapwidth,
    pub extensions: Extensions,
    /// `(event, hook)` pairs, see [`Hooks::from_names`].
    pub events: Vec<(String, String)>,
    pub debug: bool,
    pub markup: Markup,
    pub po_encoding: Option<String>,
    pub md_encoding: String,
    /// Track whether saving changed any file.
    pub check_saved_files_changed: bool,
}

impl Default for Po2MdOptions {
    fn default() -> Self {
        Po2MdOptions {
            ignore: Vec::new(),
            command_aliases: CommandAliases::new(),
            wrapwidth: Wrapwidth::Columns(80),
            extensions: Extensions::default(),
            events: Vec::new(),
            debug: false,
            markup: Markup::default(),
            po_encoding: None,
            md_encoding: String::from("utf-8"),
            check_saved_files_changed: false,
        }
    }
}

/// Translates Markdown content with the messages of PO files.
#[derive(Debug)]
pub struct Po2Md {
    translations: Translations,
    options: Po2MdOptions,
    hooks: Hooks,
    translated_entries: Vec<PoEntry>,
    disabled_entries: Vec<PoEntry>,
    saved_files_changed: Option<bool>,
}

impl Po2Md {
    /// Reads the PO files matched by the globs `pofiles`.
    pub fn new<P: AsRef<str>>(pofiles: &[P], options: Po2MdOptions) -> Result<Self> {
        if let Some(encoding) = &options.po_encoding {
            check_encoding(encoding)?;
        }
        let pofiles = io::expand_globs(pofiles, &options.ignore)?
            .iter()
            .map(|path| PoFile::from_path(path, Wrapwidth::Columns(78)))
            .collect::<Result<Vec<_>>>()?;
        Po2Md::from_pofiles(&pofiles, options)
    }

    /// Uses already parsed PO files.
    pub fn from_pofiles(pofiles: &[PoFile], options: Po2MdOptions) -> Result<Self> {
        let mut hooks = Hooks::from_names(options.events.iter().cloned(), "po2md")?;
        if options.debug {
            hooks.add_debug_hooks("po2md");
        }
        let saved_files_changed = options.check_saved_files_changed.then_some(false);
        Ok(Po2Md {
            translations: Translations::from_po_files(pofiles),
            options,
            hooks,
            translated_entries: Vec::new(),
            disabled_entries: Vec::new(),
            saved_files_changed,
        })
    }

    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    /// Entries used by the translations made so far.
    pub fn translated_entries(&self) -> &[PoEntry] {
        &self.translated_entries
    }

    /// Messages left untranslated by disabling commands.
    pub fn disabled_entries(&self) -> &[PoEntry] {
        &self.disabled_entries
    }

    /// Whether saving changed any file, when checking was requested.
    pub fn saved_files_changed(&self) -> Option<bool> {
        self.saved_files_changed
    }

    /// Translates Markdown content.
    pub fn translate_content(&mut self, content: &str) -> Result<String> {
        let config = EngineConfig {
            extensions: self.options.extensions,
            markup: self.options.markup.clone(),
            command_aliases: self.options.command_aliases.clone(),
            ..EngineConfig::default()
        };
        let mut engine = Engine::translator(
            &self.translations,
            self.options.wrapwidth,
            &mut self.hooks,
            &config,
        );
        engine.process(content)?;
        let output = engine.output().unwrap_or_default().to_string();
        self.translated_entries
            .extend(engine.translated_entries().iter().cloned());
        self.disabled_entries
            .extend(engine.disabled_entries().iter().cloned());
        Ok(output)
    }

    /// Translates a Markdown file, or Markdown content when
    /// `filepath_or_content` is not an existing file, and writes the result
    /// to `save` if given.
    pub fn translate(&mut self, filepath_or_content: &str, save: Option<&Path>) -> Result<String> {
        let path = Path::new(filepath_or_content);
        if !filepath_or_content.contains('\n') && path.is_file() {
            return self.translate_file(path, save);
        }
        check_encoding(&self.options.md_encoding)?;
        let output = self.translate_content(filepath_or_content)?;
        self.save(&output, save)?;
        Ok(output)
    }

    /// Translates the Markdown file at `path`.
    pub fn translate_file(&mut self, path: &Path, save: Option<&Path>) -> Result<String> {
        check_encoding(&self.options.md_encoding)?;
        let content = io::read_to_string(path)?;
        let output = self.translate_content(&content)?;
        self.save(&output, save)?;
        Ok(output)
    }

    fn save(&mut self, output: &str, save: Option<&Path>) -> Result<()> {
        if let Some(save) = save {
            let changed = io::save_if_changed(save, output)?;
            if let Some(saved_files_changed) = &mut self.saved_files_changed {
                *saved_files_changed |= changed;
            }
        }
        Ok(())
    }
}

/// Translates `filepath_or_content` with the PO files matched by the globs
/// `pofiles`.
///
/// ```no_run
/// use mdpo::po2md::{pofile_to_markdown, Po2MdOptions};
///
/// let output = pofile_to_markdown("README.md", &["locale/es/*.po"], None, Po2MdOptions::default())?;
/// # Ok::<(), mdpo::Error>(())
/// ```
pub fn pofile_to_markdown<P: AsRef<str>>(
    filepath_or_content: &str,
    pofiles: &[P],
    save: Option<&Path>,
    options: Po2MdOptions,
) -> Result<String> {
    Po2Md::new(pofiles, options)?.translate(filepath_or_content, save)
}
