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

//! Extraction and translation of a set of Markdown files, one PO file and
//! one translated file per language.

use crate::command::CommandAliases;
use crate::error::{Error, Result};
use crate::io::{self, FilesOrContent};
use crate::markdown::Extensions;
use crate::md2po::{ExtractOptions, Md2Po, Md2PoOptions};
use crate::po2md::{Po2Md, Po2MdOptions};
use crate::text::Wrapwidth;
use std::path::{Path, PathBuf};

/// Options of [`markdown_to_pofile_to_markdown`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub langs: Vec<String>,
    /// Glob of the Markdown files to translate.
    pub input_paths_glob: String,
    /// Output paths with the placeholders `{lang}` (required),
    /// `{basename}` and `{ext}`.
    pub output_paths_schema: String,
    pub ignore: Vec<String>,
    pub extensions: Extensions,
    pub command_aliases: CommandAliases,
    pub location: bool,
    /// Extract the content of code blocks.
    pub include_codeblocks: bool,
    pub po_wrapwidth: Wrapwidth,
    pub md_wrapwidth: Wrapwidth,
    pub po_encoding: Option<String>,
    pub md_encoding: String,
    pub debug: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            langs: Vec::new(),
            input_paths_glob: String::new(),
            output_paths_schema: String::new(),
            ignore: Vec::new(),
            extensions: Extensions::default(),
            command_aliases: CommandAliases::new(),
            location: true,
            include_codeblocks: false,
            po_wrapwidth: Wrapwidth::Columns(78),
            md_wrapwidth: Wrapwidth::Columns(80),
            po_encoding: None,
            md_encoding: String::from("utf-8"),
            debug: false,
        }
    }
}

/// The PO file and the translated file of a source file in a language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub po: PathBuf,
    pub md: PathBuf,
}

/// Fills the placeholders of `schema` for `source` in `lang`.
///
/// A resulting path without extension names a directory, which receives a
/// file named after the source.
///
/// ```
/// use mdpo::md2po2md::output_paths;
/// use std::path::{Path, PathBuf};
///
/// let paths = output_paths("locale/{lang}/{basename}.{ext}", Path::new("docs/README.md"), "es")?;
/// assert_eq!(paths.po, PathBuf::from("locale/es/README.po"));
/// assert_eq!(paths.md, PathBuf::from("locale/es/README.md"));
/// # Ok::<(), mdpo::Error>(())
/// ```
pub fn output_paths(schema: &str, source: &Path, lang: &str) -> Result<OutputPaths> {
    if !schema.contains("{lang}") {
        return Err(Error::SchemaWithoutLang(String::from("output_paths_schema")));
    }
    let basename = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let md_ext = source
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default();
    let fill = |ext: &str| {
        schema
            .replace("{lang}", lang)
            .replace("{basename}", &basename)
            .replace("{ext}", ext)
    };

    let in_directory = |path: String, file_name: String| {
        let path = PathBuf::from(path);
        if path.extension().is_some() && !path.is_dir() {
            path
        } else {
            path.join(file_name)
        }
    };
    let md_file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(OutputPaths {
        po: in_directory(fill("po"), format!("{basename}.po")),
        md: in_directory(fill(&md_ext), md_file_name),
    })
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))
        }
        _ => Ok(()),
    }
}

/// Extracts the messages of every file matched by the input glob into one
/// PO file per language, then writes the files translated with them.
///
/// Returns `true` when any PO or Markdown file was created or changed.
pub fn markdown_to_pofile_to_markdown(options: &PipelineOptions) -> Result<bool> {
    if !options.output_paths_schema.contains("{lang}") {
        return Err(Error::SchemaWithoutLang(String::from("output_paths_schema")));
    }
    let sources = io::expand_globs(&[&options.input_paths_glob], &options.ignore)?;

    let mut changed = false;
    for source in &sources {
        for lang in &options.langs {
            let paths = output_paths(&options.output_paths_schema, source, lang)?;
            create_parent(&paths.po)?;
            create_parent(&paths.md)?;
            tracing::debug!(
                "Translating {} to {} and {}",
                source.display(),
                paths.po.display(),
                paths.md.display()
            );

            let md2po_options = Md2PoOptions {
                extensions: options.extensions,
                command_aliases: options.command_aliases.clone(),
                location: options.location,
                include_codeblocks: options.include_codeblocks,
                debug: options.debug,
                check_saved_files_changed: true,
                ..Md2PoOptions::default()
            };
            let mut md2po = Md2Po::new(FilesOrContent::Files(vec![source.clone()]), md2po_options)?;
            md2po.extract(&ExtractOptions {
                po_filepath: Some(paths.po.clone()),
                save: true,
                po_encoding: options.po_encoding.clone(),
                md_encoding: options.md_encoding.clone(),
                wrapwidth: options.po_wrapwidth,
                ..ExtractOptions::default()
            })?;
            changed |= md2po.saved_files_changed().unwrap_or_default();

            let po2md_options = Po2MdOptions {
                extensions: options.extensions,
                command_aliases: options.command_aliases.clone(),
                wrapwidth: options.md_wrapwidth,
                debug: options.debug,
                po_encoding: options.po_encoding.clone(),
                md_encoding: options.md_encoding.clone(),
                check_saved_files_changed: true,
                ..Po2MdOptions::default()
            };
            let po_pattern = glob::Pattern::escape(&paths.po.to_string_lossy());
            let mut po2md = Po2Md::new(&[po_pattern], po2md_options)?;
            po2md.translate_file(source, Some(&paths.md))?;
            changed |= po2md.saved_files_changed().unwrap_or_default();
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_output_paths_in_directory() -> anyhow::Result<()> {
        let paths = output_paths("locale/{lang}", Path::new("README.md"), "fr")?;
        assert_eq!(paths.po, PathBuf::from("locale/fr/README.po"));
        assert_eq!(paths.md, PathBuf::from("locale/fr/README.md"));
        Ok(())
    }

    #[test]
    fn test_schema_without_lang() {
        let err = output_paths("locale/{basename}.{ext}", Path::new("README.md"), "fr").unwrap_err();
        assert_eq!(
            err.to_string(),
            "You must pass the replacer '{lang}' inside the argument 'output_paths_schema'."
        );
    }

    #[test]
    fn test_pipeline() -> anyhow::Result<()> {
        let tmp_dir = tempfile::tempdir()?;
        let source = tmp_dir.path().join("README.md");
        fs::write(&source, "# Title\n\nSome text\n")?;

        let options = PipelineOptions {
            langs: vec![String::from("es"), String::from("fr")],
            input_paths_glob: source.to_string_lossy().into_owned(),
            output_paths_schema: format!(
                "{}/locale/{{lang}}/{{basename}}.{{ext}}",
                tmp_dir.path().display()
            ),
            ..PipelineOptions::default()
        };
        assert!(markdown_to_pofile_to_markdown(&options)?);

        for lang in ["es", "fr"] {
            let dir = tmp_dir.path().join("locale").join(lang);
            let po = fs::read_to_string(dir.join("README.po"))?;
            assert!(po.contains("msgid \"Some text\""));
            assert_eq!(fs::read_to_string(dir.join("README.md"))?, "# Title\n\nSome text\n");
        }

        // Nothing changes on a second run.
        assert!(!markdown_to_pofile_to_markdown(&options)?);
        Ok(())
    }

    #[test]
    fn test_pipeline_with_codeblocks() -> anyhow::Result<()> {
        let tmp_dir = tempfile::tempdir()?;
        let source = tmp_dir.path().join("README.md");
        fs::write(&source, "Run:\n\n```sh\necho hello\n```\n")?;

        let mut options = PipelineOptions {
            langs: vec![String::from("es")],
            input_paths_glob: source.to_string_lossy().into_owned(),
            output_paths_schema: format!("{}/{{lang}}", tmp_dir.path().display()),
            ..PipelineOptions::default()
        };
        let po_path = tmp_dir.path().join("es").join("README.po");

        markdown_to_pofile_to_markdown(&options)?;
        assert!(!fs::read_to_string(&po_path)?.contains("echo hello"));

        options.include_codeblocks = true;
        markdown_to_pofile_to_markdown(&options)?;
        assert!(fs::read_to_string(&po_path)?.contains("msgid \"echo hello\""));
        assert_eq!(
            fs::read_to_string(tmp_dir.path().join("es").join("README.md"))?,
            "Run:\n\n```sh\necho hello\n```\n"
        );
        Ok(())
    }
}
