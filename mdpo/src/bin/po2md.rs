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

//! `po2md`: translates a Markdown file with the messages of PO files.

use anyhow::{bail, Context};
use clap::Parser;
use mdpo::cli::{self, CheckArgs, EncodingArgs, ParserArgs};
use mdpo::io::expand_globs;
use mdpo::po2md::{Po2Md, Po2MdOptions};
use mdpo::text::Wrapwidth;
use std::path::PathBuf;
use std::process::ExitCode;

/// Translate a Markdown file using PO files.
#[derive(Debug, Parser)]
#[command(name = "po2md", version)]
struct Args {
    /// Markdown file path or content to translate. The standard input is
    /// read when it is missing.
    filepath_or_content: Option<String>,

    /// Glob matching PO files with the translations. Can be passed multiple
    /// times.
    #[arg(
        short = 'p',
        long = "pofiles",
        visible_alias = "po-files",
        value_name = "GLOB",
        required = true,
        num_args = 1..
    )]
    pofiles: Vec<String>,

    /// File name, directory name or path of PO files to ignore. Can be
    /// passed multiple times.
    #[arg(short, long = "ignore", value_name = "PATH")]
    ignore: Vec<String>,

    /// Write the translated document to this file.
    #[arg(short, long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// Maximum width of the translated paragraphs. `0` or `inf` disable
    /// wrapping.
    #[arg(short, long, value_parser = cli::parse_wrapwidth, default_value = "80")]
    wrapwidth: Wrapwidth,

    /// Do not print the translated document.
    #[arg(short, long)]
    quiet: bool,

    #[command(flatten)]
    parser: ParserArgs,

    #[command(flatten)]
    encodings: EncodingArgs,

    #[command(flatten)]
    checks: CheckArgs,
}

impl Args {
    fn options(&self) -> anyhow::Result<Po2MdOptions> {
        Ok(Po2MdOptions {
            ignore: self.ignore.clone(),
            command_aliases: self.parser.command_aliases()?,
            wrapwidth: self.wrapwidth,
            extensions: self.parser.extensions(),
            events: self.parser.events()?,
            debug: self.parser.debug,
            po_encoding: self.encodings.po_encoding.clone(),
            md_encoding: self.encodings.md_encoding.clone(),
            check_saved_files_changed: self.checks.check,
            ..Po2MdOptions::default()
        })
    }
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn run(args: &Args) -> anyhow::Result<bool> {
    let filepath_or_content = match &args.filepath_or_content {
        Some(value) => value.clone(),
        None => match cli::read_piped_stdin()? {
            Some(content) => content,
            None => bail!("File or content to translate not specified"),
        },
    };

    let mut po2md = Po2Md::new(&args.pofiles, args.options()?)?;
    let output = po2md
        .translate(&filepath_or_content, args.save.as_deref())
        .context("Translating document")?;
    if !args.quiet {
        println!("{output}");
    }

    let mut passed = true;
    if po2md.saved_files_changed() == Some(true) {
        passed = false;
    }
    let report = args
        .checks
        .report(&expand_globs(&args.pofiles, &args.ignore)?)?;
    for line in &report {
        eprintln!("{line}");
    }
    if !report.is_empty() {
        passed = false;
    }
    Ok(passed)
}

#[allow(clippy::print_stderr)]
fn main() -> ExitCode {
    let args = Args::parse();
    cli::init(args.parser.debug);
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_command() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_pofiles_are_required() {
        assert!(Args::try_parse_from(["po2md", "README.md"]).is_err());
    }

    #[test]
    fn test_parse_flags() -> anyhow::Result<()> {
        let args = Args::try_parse_from([
            "po2md",
            "README.md",
            "-p",
            "locale/es/*.po",
            "-p",
            "locale/es/extra.po",
            "-s",
            "README.es.md",
            "-w",
            "0",
        ])?;
        assert_eq!(args.pofiles, vec!["locale/es/*.po", "locale/es/extra.po"]);
        assert_eq!(args.save, Some(PathBuf::from("README.es.md")));
        assert_eq!(args.options()?.wrapwidth, Wrapwidth::Infinite);
        Ok(())
    }

    #[test]
    fn test_translate_and_check_empty_msgstr() -> anyhow::Result<()> {
        let tmp_dir = tempfile::tempdir()?;
        let po_path = tmp_dir.path().join("es.po");
        fs::write(
            &po_path,
            "msgid \"Foo\"\nmsgstr \"Bar\"\n\nmsgid \"Baz\"\nmsgstr \"\"\n",
        )?;
        let target = tmp_dir.path().join("README.es.md");
        let po_arg = po_path.to_string_lossy().into_owned();
        let target_arg = target.to_string_lossy().into_owned();

        let args = Args::try_parse_from([
            "po2md",
            "# Foo\n\nBaz\n",
            "-p",
            po_arg.as_str(),
            "-s",
            target_arg.as_str(),
            "-q",
            "--no-empty-msgstr",
        ])?;
        assert!(!run(&args)?);
        assert_eq!(fs::read_to_string(&target)?, "# Bar\n\nBaz\n");
        Ok(())
    }
}
