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

//! `md2po`: extracts the messages of Markdown files into a PO file.
//!
//! The input is a list of globs or paths, literal Markdown content, or the
//! standard input when nothing else is given. The PO file is printed on
//! the standard output unless `--quiet` is passed.

use anyhow::{bail, Context};
use clap::Parser;
use mdpo::cli::{self, CheckArgs, EncodingArgs, ParserArgs};
use mdpo::io::{expand_globs, FilesOrContent};
use mdpo::md2po::{ExtractOptions, Md2Po, Md2PoOptions};
use mdpo::text::Wrapwidth;
use std::path::PathBuf;
use std::process::ExitCode;

/// Extract the translatable messages of Markdown files into a PO file.
#[derive(Debug, Parser)]
#[command(name = "md2po", version)]
struct Args {
    /// Globs to Markdown files, paths to files or Markdown content. The
    /// standard input is read when nothing is given.
    files_or_content: Vec<String>,

    /// File name, directory name or path to ignore. Can be passed multiple
    /// times.
    #[arg(short, long = "ignore", value_name = "PATH")]
    ignore: Vec<String>,

    /// PO file to update with the extracted messages.
    #[arg(short = 'p', long = "po-filepath", visible_alias = "pofilepath")]
    po_filepath: Option<PathBuf>,

    /// Save the catalog to the file passed with `--po-filepath`.
    #[arg(short, long)]
    save: bool,

    /// Compile the catalog into this MO file.
    #[arg(long = "mo-filepath", visible_alias = "mofilepath")]
    mo_filepath: Option<PathBuf>,

    /// Do not include Markdown markup in the msgids.
    #[arg(long)]
    plaintext: bool,

    /// Maximum width of the PO file lines. `0` or `inf` disable wrapping.
    #[arg(short, long, value_parser = cli::parse_wrapwidth, default_value = "78")]
    wrapwidth: Wrapwidth,

    /// Keep the messages of the PO file which are not found anymore, without
    /// marking them as obsolete.
    #[arg(short = 'm', long = "merge-pofiles", visible_alias = "merge-po-files")]
    merge_pofiles: bool,

    /// Remove the messages of the PO file which are not found anymore.
    #[arg(short = 'r', long)]
    remove_not_found: bool,

    /// Do not write `#: file:block n (kind)` references.
    #[arg(long)]
    no_location: bool,

    /// Write the markup strings in the PO header.
    #[arg(short = 'a', long = "xheader", visible_alias = "xheaders")]
    xheader: bool,

    /// Extract the content of code blocks.
    #[arg(short = 'c', long)]
    include_codeblocks: bool,

    /// File with one msgid to ignore per line.
    #[arg(long, value_name = "PATH")]
    ignore_msgids: Option<PathBuf>,

    /// Header metadata as `KEY:VALUE`. Can be passed multiple times.
    #[arg(short = 'd', long, value_name = "KEY:VALUE")]
    metadata: Vec<String>,

    /// Do not print the PO file.
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
    fn input(&self) -> anyhow::Result<FilesOrContent> {
        match self.files_or_content.as_slice() {
            [] => match cli::read_piped_stdin()? {
                Some(content) => Ok(FilesOrContent::detect(&content, &self.ignore)),
                None => bail!("Files or content to extract not specified"),
            },
            [value] => Ok(FilesOrContent::detect(value, &self.ignore)),
            values => Ok(FilesOrContent::Files(expand_globs(values, &self.ignore)?)),
        }
    }

    fn options(&self) -> anyhow::Result<Md2PoOptions> {
        let ignore_msgids = match &self.ignore_msgids {
            Some(path) => cli::read_ignore_msgids(path)?,
            None => Vec::new(),
        };
        Ok(Md2PoOptions {
            ignore: self.ignore.clone(),
            plaintext: self.plaintext,
            xheaders: self.xheader,
            include_codeblocks: self.include_codeblocks,
            ignore_msgids,
            command_aliases: self.parser.command_aliases()?,
            metadata: cli::parse_metadata(&self.metadata)?,
            location: !self.no_location,
            mark_not_found_as_obsolete: !self.merge_pofiles,
            preserve_not_found: !self.remove_not_found,
            extensions: self.parser.extensions(),
            events: self.parser.events()?,
            debug: self.parser.debug,
            check_saved_files_changed: self.checks.check,
            ..Md2PoOptions::default()
        })
    }
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn run(args: &Args) -> anyhow::Result<bool> {
    if args.save && args.po_filepath.is_none() {
        bail!(
            "The argument '-s/--save' does not make sense without passing the argument \
             '-p/--po-filepath'."
        );
    }

    let mut md2po = Md2Po::new(args.input()?, args.options()?)?;
    let po = md2po
        .extract(&ExtractOptions {
            po_filepath: args.po_filepath.clone(),
            save: args.save,
            mo_filepath: args.mo_filepath.clone(),
            po_encoding: args.encodings.po_encoding.clone(),
            md_encoding: args.encodings.md_encoding.clone(),
            wrapwidth: args.wrapwidth,
        })
        .context("Extracting messages")?;
    if !args.quiet {
        println!("{}", po.to_po_string());
    }

    let mut passed = true;
    if md2po.saved_files_changed() == Some(true) {
        passed = false;
    }
    if let (true, Some(path)) = (args.save, &args.po_filepath) {
        let report = args.checks.report(std::slice::from_ref(path))?;
        for line in &report {
            eprintln!("{line}");
        }
        if !report.is_empty() {
            passed = false;
        }
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

    #[test]
    fn test_command() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() -> anyhow::Result<()> {
        let args = Args::try_parse_from([
            "md2po",
            "README.md",
            "-p",
            "messages.po",
            "-s",
            "-w",
            "inf",
            "-x",
            "tables",
            "--command-alias",
            "on:enable",
            "-d",
            "Language:es",
            "--no-location",
        ])?;
        assert_eq!(args.files_or_content, vec!["README.md"]);
        assert_eq!(args.po_filepath, Some(PathBuf::from("messages.po")));
        assert!(args.save);
        assert_eq!(args.wrapwidth, Wrapwidth::Infinite);

        let options = args.options()?;
        assert!(!options.location);
        assert!(options.extensions.tables && !options.extensions.wikilinks);
        assert_eq!(options.metadata.get("Language").map(String::as_str), Some("es"));
        Ok(())
    }

    #[test]
    fn test_invalid_wrapwidth() {
        assert!(Args::try_parse_from(["md2po", "README.md", "-w", "wide"]).is_err());
    }

    #[test]
    fn test_save_without_po_filepath() {
        let args = Args::try_parse_from(["md2po", "# Title", "-s"]).unwrap();
        let err = run(&args).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The argument '-s/--save' does not make sense without passing the argument \
             '-p/--po-filepath'."
        );
    }

    #[test]
    fn test_not_found_policies() -> anyhow::Result<()> {
        let args = Args::try_parse_from(["md2po", "# Title", "-m", "-r"])?;
        let options = args.options()?;
        assert!(!options.mark_not_found_as_obsolete);
        assert!(!options.preserve_not_found);
        Ok(())
    }

    #[test]
    fn test_save_and_check() -> anyhow::Result<()> {
        let tmp_dir = tempfile::tempdir()?;
        let po_path = tmp_dir.path().join("messages.po");
        let po_arg = po_path.to_string_lossy().into_owned();
        let argv = ["md2po", "# Title", "-p", po_arg.as_str(), "-s", "-q", "--check"];

        let args = Args::try_parse_from(argv)?;
        assert!(!run(&args)?);
        assert!(std::fs::read_to_string(&po_path)?.contains("msgid \"Title\""));

        let args = Args::try_parse_from(argv)?;
        assert!(run(&args)?);
        Ok(())
    }
}
