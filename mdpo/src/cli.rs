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

//! Arguments and helpers shared by the `md2po`, `po2md` and `md2po2md`
//! programs.

use crate::command::CommandAliases;
use crate::error::{Error, Result};
use crate::markdown::Extensions;
use crate::po::Problem;
use crate::text::{parse_escaped_pair, parse_escaped_pairs, Wrapwidth};
use std::collections::BTreeMap;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable set while a program runs.
pub const RUNNING_ENV: &str = "_MDPO_RUNNING";

/// Markdown parsing and hooks.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ParserArgs {
    /// Markdown parser extension to enable. Can be passed multiple times.
    /// Without this argument every extension but `underline` is enabled.
    #[arg(short = 'x', long = "extension", value_name = "NAME")]
    pub extensions: Vec<String>,

    /// Use a custom name for a command, e.g. `--command-alias on:enable`.
    /// Can be passed multiple times.
    #[arg(long = "command-alias", value_name = "ALIAS:COMMAND")]
    pub command_aliases: Vec<String>,

    /// Run a built-in hook (`mdpo::debug` or `mdpo::skip`) on an event,
    /// e.g. `--event link_reference:mdpo::skip`. Can be passed multiple
    /// times.
    #[arg(short = 'e', long = "event", value_name = "EVENT:HOOK")]
    pub events: Vec<String>,

    /// Print every parsed element.
    #[arg(short = 'D', long)]
    pub debug: bool,
}

impl ParserArgs {
    pub fn extensions(&self) -> Extensions {
        if self.extensions.is_empty() {
            Extensions::default()
        } else {
            Extensions::from_names(&self.extensions)
        }
    }

    pub fn command_aliases(&self) -> Result<CommandAliases> {
        let pairs = parse_escaped_pairs(
            &self.command_aliases,
            "--command-alias",
            "<alias:command>",
        )?;
        CommandAliases::from_pairs(pairs)
    }

    /// The `(event, hook)` pairs, in the order given.
    pub fn events(&self) -> Result<Vec<(String, String)>> {
        self.events
            .iter()
            .map(|event| {
                parse_escaped_pair(event).ok_or_else(|| Error::MalformedPair {
                    value: event.clone(),
                    argument: String::from("-e/--event"),
                    expected: String::from("<event:hook>"),
                })
            })
            .collect()
    }
}

/// Encodings of the files read and written.
#[derive(Debug, Clone, clap::Args)]
pub struct EncodingArgs {
    /// Markdown files encoding.
    #[arg(long = "md-encoding", value_name = "ENCODING", default_value = "utf-8")]
    pub md_encoding: String,

    /// PO files encoding.
    #[arg(long = "po-encoding", value_name = "ENCODING")]
    pub po_encoding: Option<String>,
}

/// Checks of the written PO files.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CheckArgs {
    /// Exit with code 1 when a file has been changed or did not exist.
    #[arg(long = "check", visible_alias = "pre-commit")]
    pub check: bool,

    /// Exit with code 1 when obsolete entries are found.
    #[arg(long)]
    pub no_obsolete: bool,

    /// Exit with code 1 when fuzzy entries are found.
    #[arg(long)]
    pub no_fuzzy: bool,

    /// Exit with code 1 when untranslated entries are found.
    #[arg(long)]
    pub no_empty_msgstr: bool,
}

impl CheckArgs {
    fn problems(&self) -> Vec<Problem> {
        [
            (self.no_obsolete, Problem::Obsolete),
            (self.no_fuzzy, Problem::Fuzzy),
            (self.no_empty_msgstr, Problem::EmptyMsgstr),
        ]
        .into_iter()
        .filter_map(|(enabled, problem)| enabled.then_some(problem))
        .collect()
    }

    /// Returns the report lines of the requested checks over `pofiles`.
    pub fn report(&self, pofiles: &[PathBuf]) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        for problem in self.problems() {
            let mut locations = Vec::new();
            for path in pofiles {
                let content = crate::io::read_to_string(path)?;
                locations.extend(
                    problem
                        .find_lines(&content)
                        .into_iter()
                        .map(|line| format!("{}:{line}", path.display())),
                );
            }
            lines.extend(report_lines(problem, &locations));
        }
        Ok(lines)
    }
}

fn report_lines(problem: Problem, locations: &[String]) -> Vec<String> {
    if locations.len() > 2 {
        let mut lines = vec![format!(
            "Found {} {}:",
            locations.len(),
            problem.describe(true)
        )];
        lines.extend(locations.iter().cloned());
        lines
    } else {
        locations
            .iter()
            .map(|location| format!("Found {} at {location}", problem.describe(false)))
            .collect()
    }
}

/// Parses the `-w/--wrapwidth` argument.
pub fn parse_wrapwidth(value: &str) -> Result<Wrapwidth> {
    Wrapwidth::parse(value, "-w/--wrapwidth")
}

/// Parses repeated `-d/--metadata KEY:VALUE` arguments.
pub fn parse_metadata(values: &[String]) -> Result<BTreeMap<String, String>> {
    parse_escaped_pairs(values, "-d/--metadata", "<key:value>")
}

/// Reads the msgids to ignore, one per line.
pub fn read_ignore_msgids(path: &Path) -> Result<Vec<String>> {
    Ok(crate::io::read_to_string(path)?
        .lines()
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Reads the standard input, unless it is a terminal.
pub fn read_piped_stdin() -> Result<Option<String>> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut buffer = String::new();
    stdin
        .read_to_string(&mut buffer)
        .map_err(|err| Error::io("<stdin>", err))?;
    let buffer = buffer.trim_matches('\n');
    Ok((!buffer.is_empty()).then(|| buffer.to_string()))
}

/// Installs the log subscriber and marks the process as running.
///
/// Logs go to stderr. `RUST_LOG` selects the level, `warn` by default and
/// `debug` with `debug`.
pub fn init(debug: bool) {
    std::env::set_var(RUNNING_ENV, "true");
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}
