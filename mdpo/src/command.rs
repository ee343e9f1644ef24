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

//! Commands embedded in Markdown as HTML comments.
//!
//! A command looks like `<!-- mdpo-disable-next-line -->` or
//! `<!-- mdpo-context month -->`. The `mdpo-` prefix is part of the
//! canonical name, but user defined aliases may resolve to a name with or
//! without it.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// The commands understood by the extractor and the translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Context,
    Disable,
    DisableNextBlock,
    DisableNextLine,
    Enable,
    EnableNextBlock,
    EnableNextLine,
    Include,
    IncludeCodeblock,
    IncludeCodeblocks,
    DisableCodeblock,
    DisableCodeblocks,
    Translator,
}

impl Command {
    pub const ALL: [Command; 13] = [
        Command::Context,
        Command::Disable,
        Command::DisableNextBlock,
        Command::DisableNextLine,
        Command::Enable,
        Command::EnableNextBlock,
        Command::EnableNextLine,
        Command::Include,
        Command::IncludeCodeblock,
        Command::IncludeCodeblocks,
        Command::DisableCodeblock,
        Command::DisableCodeblocks,
        Command::Translator,
    ];

    /// Name without the `mdpo-` prefix.
    pub fn short_name(self) -> &'static str {
        match self {
            Command::Context => "context",
            Command::Disable => "disable",
            Command::DisableNextBlock => "disable-next-block",
            Command::DisableNextLine => "disable-next-line",
            Command::Enable => "enable",
            Command::EnableNextBlock => "enable-next-block",
            Command::EnableNextLine => "enable-next-line",
            Command::Include => "include",
            Command::IncludeCodeblock => "include-codeblock",
            Command::IncludeCodeblocks => "include-codeblocks",
            Command::DisableCodeblock => "disable-codeblock",
            Command::DisableCodeblocks => "disable-codeblocks",
            Command::Translator => "translator",
        }
    }

    /// Commands that need an argument, and the noun used when it is
    /// missing.
    pub fn required_argument(self) -> Option<&'static str> {
        match self {
            Command::Context => Some("a string for the context"),
            Command::Translator => Some("a string for the extracted comment"),
            Command::Include => Some("a message for the comment to include"),
            _ => None,
        }
    }

    /// Returns `argument` or the error for a command used without it.
    pub fn require_argument<'a>(
        self,
        argument: Option<&'a str>,
        original: &str,
    ) -> Result<&'a str> {
        match (argument.filter(|arg| !arg.is_empty()), self.required_argument()) {
            (Some(arg), _) => Ok(arg),
            (None, what) => Err(Error::MissingCommandArgument {
                what: what.unwrap_or("an argument"),
                command: original.to_string(),
            }),
        }
    }

    /// Resolves a command name with or without the `mdpo-` prefix.
    pub fn from_name(name: &str) -> Option<Command> {
        let short = name.strip_prefix("mdpo-").unwrap_or(name);
        Command::ALL.into_iter().find(|cmd| cmd.short_name() == short)
    }

    fn valid_names() -> String {
        Command::ALL
            .iter()
            .flat_map(|cmd| [format!("'mdpo-{}'", cmd.short_name()), format!("'{}'", cmd.short_name())])
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mdpo-{}", self.short_name())
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        Command::from_name(name).ok_or_else(|| Error::InvalidCommandResolution {
            command: name.to_string(),
            valid: Command::valid_names(),
        })
    }
}

/// A command found in an HTML comment, before alias resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommand<'a> {
    /// Name as written in the document.
    pub name: &'a str,
    /// Optional argument, with trailing spaces removed.
    pub argument: Option<&'a str>,
}

/// Finds a command inside the HTML `html`.
pub fn find(html: &str) -> Option<RawCommand<'_>> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        let pattern = r"(?x)
              <!--\s*               # the opening of the comment
              (?<name>\S+)          # the command name
              \s*
              (?<argument>[\w\s]+)? # an optional argument
              -->                   # the closing of the comment
        ";
        Regex::new(pattern).expect("well-formed regex")
    });

    let captures = re.captures(html)?;
    let name = captures.name("name")?.as_str();
    let argument = captures
        .name("argument")
        .map(|arg| arg.as_str().trim_end_matches(' '))
        .filter(|arg| !arg.is_empty());
    Some(RawCommand { name, argument })
}

/// User defined command names, mapped to the commands they stand for.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandAliases {
    aliases: BTreeMap<String, Command>,
}

impl CommandAliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table from `(alias, command)` pairs.
    ///
    /// The command may be written with or without the `mdpo-` prefix. An
    /// alias given twice or an unknown command is an error.
    pub fn from_pairs<I, A, C>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (A, C)>,
        A: Into<String>,
        C: AsRef<str>,
    {
        let mut aliases = CommandAliases::new();
        for (alias, command) in pairs {
            aliases.insert(alias.into(), command.as_ref())?;
        }
        Ok(aliases)
    }

    pub fn insert(&mut self, alias: String, command: &str) -> Result<()> {
        let command = command.parse::<Command>()?;
        if self.aliases.contains_key(&alias) {
            return Err(Error::DuplicateAlias(alias));
        }
        self.aliases.insert(alias, command);
        Ok(())
    }

    /// Resolves a name written in a document.
    ///
    /// Aliases win over canonical names. Unknown names yield `None`.
    pub fn resolve(&self, name: &str) -> Option<Command> {
        match self.aliases.get(name) {
            Some(command) => Some(*command),
            None => name.strip_prefix("mdpo-").and_then(Command::from_name),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// A command ready to be dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub command: Command,
    pub argument: Option<&'a str>,
    /// The name as written in the document, before alias resolution.
    pub original: &'a str,
}

/// Finds and resolves the command in `html`, if any.
///
/// Comments which are not mdpo commands are ignored.
pub fn parse<'a>(html: &'a str, aliases: &CommandAliases) -> Option<ParsedCommand<'a>> {
    let raw = find(html)?;
    let command = aliases.resolve(raw.name)?;
    Some(ParsedCommand {
        command,
        argument: raw.argument,
        original: raw.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[track_caller]
    fn assert_parsed(html: &str, command: Command, argument: Option<&str>) {
        let parsed = parse(html, &CommandAliases::new()).expect("command");
        assert_eq!(parsed.command, command);
        assert_eq!(parsed.argument, argument);
    }

    #[test]
    fn test_find_simple() {
        assert_eq!(
            find("<!-- mdpo-disable -->"),
            Some(RawCommand {
                name: "mdpo-disable",
                argument: None
            })
        );
    }

    #[test]
    fn test_find_with_argument() {
        assert_eq!(
            find("<!-- mdpo-context month -->"),
            Some(RawCommand {
                name: "mdpo-context",
                argument: Some("month")
            })
        );
    }

    #[test]
    fn test_find_tolerates_missing_spaces() {
        assert_eq!(
            find("<!--mdpo-enable-->"),
            Some(RawCommand {
                name: "mdpo-enable",
                argument: None
            })
        );
        assert_parsed("<!--   mdpo-context   month  -->", Command::Context, Some("month"));
    }

    #[test]
    fn test_find_needs_a_comment() {
        assert_eq!(find("<div>mdpo-disable</div>"), None);
    }

    #[test]
    fn test_parse_canonical_names() {
        assert_parsed("<!-- mdpo-disable-next-line -->", Command::DisableNextLine, None);
        assert_parsed("<!-- mdpo-enable-next-block -->", Command::EnableNextBlock, None);
        assert_parsed(
            "<!-- mdpo-translator Some comment -->",
            Command::Translator,
            Some("Some comment"),
        );
        assert_parsed(
            "<!-- mdpo-include-codeblocks -->",
            Command::IncludeCodeblocks,
            None,
        );
    }

    #[test]
    fn test_parse_ignores_unknown_commands() {
        assert_eq!(parse("<!-- mdpo-foo -->", &CommandAliases::new()), None);
        assert_eq!(parse("<!-- prettier-ignore -->", &CommandAliases::new()), None);
        assert_eq!(parse("<!-- disable -->", &CommandAliases::new()), None);
    }

    #[test]
    fn test_alias_resolution_with_and_without_prefix() {
        let aliases =
            CommandAliases::from_pairs([("on", "enable"), ("mdpo-off", "mdpo-disable")]).unwrap();
        let on = parse("<!-- on -->", &aliases).unwrap();
        assert_eq!(on.command, Command::Enable);
        assert_eq!(on.original, "on");
        let off = parse("<!-- mdpo-off -->", &aliases).unwrap();
        assert_eq!(off.command, Command::Disable);
        assert_eq!(off.original, "mdpo-off");
    }

    #[test]
    fn test_alias_does_not_hide_canonical_name() {
        let aliases = CommandAliases::from_pairs([("on", "enable")]).unwrap();
        assert_parsed("<!-- mdpo-enable -->", Command::Enable, None);
        assert_eq!(
            parse("<!-- mdpo-enable -->", &aliases).unwrap().command,
            Command::Enable
        );
    }

    #[test]
    fn test_alias_invalid_resolution() {
        let err = CommandAliases::from_pairs([("on", "foo")]).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with(
            "Invalid mdpo command resolution 'foo'. Valid values are: 'mdpo-context', 'context',"
        ));
        assert!(message.ends_with("'mdpo-translator', 'translator'"));
    }

    #[test]
    fn test_alias_duplicated() {
        let err = CommandAliases::from_pairs([("on", "enable"), ("on", "disable")]).unwrap_err();
        assert!(matches!(err, Error::DuplicateAlias(alias) if alias == "on"));
    }

    #[test]
    fn test_require_argument() {
        let err = Command::Context
            .require_argument(None, "mdpo-context")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "You need to specify a string for the context with the command 'mdpo-context'."
        );
        assert_eq!(
            Command::Include.require_argument(Some("foo"), "mdpo-include").unwrap(),
            "foo"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::DisableNextLine.to_string(), "mdpo-disable-next-line");
    }
}
