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

//! `md2po2md`: extracts and translates Markdown files for several
//! languages at once.

use anyhow::bail;
use clap::Parser;
use mdpo::cli::{self, CheckArgs, EncodingArgs, ParserArgs};
use mdpo::io::expand_globs;
use mdpo::md2po2md::{markdown_to_pofile_to_markdown, output_paths, PipelineOptions};
use mdpo::text::Wrapwidth;
use std::process::ExitCode;

/// Translate Markdown files into several languages, keeping one PO file per
/// file and language.
#[derive(Debug, Parser)]
#[command(name = "md2po2md", version)]
struct Args {
    /// Glob matching the Markdown files to translate. The standard input is
    /// read when it is missing.
    input_paths_glob: Option<String>,

    /// Language to translate into. Can be passed multiple times.
    #[arg(short, long = "lang", value_name = "LANG", required = true, num_args = 1..)]
    langs: Vec<String>,

    /// Schema of the output paths, with the placeholders `{lang}`,
    /// `{basename}` and `{ext}`. A path without extension is a directory.
    #[arg(short, long = "output", value_name = "SCHEMA", required = true)]
    output_paths_schema: String,

    /// File name, directory name or path to ignore. Can be passed multiple
    /// times.
    #[arg(short, long = "ignore", value_name = "PATH")]
    ignore: Vec<String>,

    /// Do not write `#: file:block n (kind)` references.
    #[arg(long)]
    no_location: bool,

    /// Extract the content of code blocks.
    #[arg(short = 'c', long)]
    include_codeblocks: bool,

    /// Maximum width of the PO file lines.
    #[arg(long, value_parser = cli::parse_wrapwidth, default_value = "78")]
    po_wrapwidth: Wrapwidth,

    /// Maximum width of the translated paragraphs.
    #[arg(long, value_parser = cli::parse_wrapwidth, default_value = "80")]
    md_wrapwidth: Wrapwidth,

    #[command(flatten)]
    parser: ParserArgs,

    #[command(flatten)]
    encodings: EncodingArgs,

    #[command(flatten)]
    checks: CheckArgs,
}

impl Args {
    fn options(&self, input_paths_glob: String) -> anyhow::Result<PipelineOptions> {
        let mut langs: Vec<String> = Vec::new();
        for lang in &self.langs {
            if !langs.contains(lang) {
                langs.push(lang.clone());
            }
        }
        Ok(PipelineOptions {
            langs,
            input_paths_glob,
            output_paths_schema: self.output_paths_schema.clone(),
            ignore: self.ignore.clone(),
            extensions: self.parser.extensions(),
            command_aliases: self.parser.command_aliases()?,
            location: !self.no_location,
            include_codeblocks: self.include_codeblocks,
            po_wrapwidth: self.po_wrapwidth,
            md_wrapwidth: self.md_wrapwidth,
            po_encoding: self.encodings.po_encoding.clone(),
            md_encoding: self.encodings.md_encoding.clone(),
            debug: self.parser.debug,
        })
    }
}

#[allow(clippy::print_stderr)]
fn run(args: &Args) -> anyhow::Result<bool> {
    let input_paths_glob = match &args.input_paths_glob {
        Some(glob) => glob.clone(),
        None => match cli::read_piped_stdin()? {
            Some(glob) => glob,
            None => bail!("Input paths glob not specified"),
        },
    };
    let options = args.options(input_paths_glob)?;
    let changed = markdown_to_pofile_to_markdown(&options)?;

    let mut passed = true;
    if args.checks.check && changed {
        passed = false;
    }
    let mut pofiles = Vec::new();
    for source in expand_globs(&[&options.input_paths_glob], &options.ignore)? {
        for lang in &options.langs {
            pofiles.push(output_paths(&options.output_paths_schema, &source, lang)?.po);
        }
    }
    let report = args.checks.report(&pofiles)?;
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
    fn test_langs_are_deduplicated() -> anyhow::Result<()> {
        let args = Args::try_parse_from([
            "md2po2md", "README.md", "-l", "es", "-l", "fr", "-l", "es", "-o", "locale/{lang}",
        ])?;
        let options = args.options(String::from("README.md"))?;
        assert_eq!(options.langs, vec!["es", "fr"]);
        assert!(options.location);
        assert!(!options.include_codeblocks);

        let args = Args::try_parse_from(["md2po2md", "README.md", "-l", "es", "-o", "{lang}", "-c"])?;
        assert!(args.options(String::from("README.md"))?.include_codeblocks);
        Ok(())
    }

    #[test]
    fn test_output_is_required() {
        assert!(Args::try_parse_from(["md2po2md", "README.md", "-l", "es"]).is_err());
    }

    #[test]
    fn test_schema_without_lang() -> anyhow::Result<()> {
        let tmp_dir = tempfile::tempdir()?;
        let source = tmp_dir.path().join("README.md");
        fs::write(&source, "# Title\n")?;
        let source_arg = source.to_string_lossy().into_owned();
        let args =
            Args::try_parse_from(["md2po2md", source_arg.as_str(), "-l", "es", "-o", "locale"])?;
        assert_eq!(
            run(&args).unwrap_err().to_string(),
            "You must pass the replacer '{lang}' inside the argument 'output_paths_schema'."
        );
        Ok(())
    }

    #[test]
    fn test_check_and_untranslated() -> anyhow::Result<()> {
        let tmp_dir = tempfile::tempdir()?;
        let source = tmp_dir.path().join("README.md");
        fs::write(&source, "# Title\n")?;
        let source_arg = source.to_string_lossy().into_owned();
        let schema = format!("{}/{{lang}}", tmp_dir.path().display());
        let argv = [
            "md2po2md",
            source_arg.as_str(),
            "-l",
            "es",
            "-o",
            schema.as_str(),
            "--check",
        ];

        assert!(!run(&Args::try_parse_from(argv)?)?);
        assert!(tmp_dir.path().join("es").join("README.po").is_file());
        assert!(run(&Args::try_parse_from(argv)?)?);

        let mut argv = argv.to_vec();
        argv.push("--no-empty-msgstr");
        assert!(!run(&Args::try_parse_from(argv)?)?);
        Ok(())
    }
}
