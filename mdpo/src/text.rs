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

//! Small string helpers shared by the extractor, the translator and the
//! command line interfaces.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Number of `delimiter` characters needed to fence `text` as a code span.
///
/// This is the smallest odd count that differs from the length of every
/// run of `delimiter` found in `text`, so that no run inside the span can
/// close it early.
pub fn code_span_fence_len(delimiter: char, text: &str) -> usize {
    let mut runs = Vec::new();
    let mut current = 0;
    for c in text.chars() {
        if c == delimiter {
            current += 1;
        } else if current > 0 {
            runs.push(current);
            current = 0;
        }
    }
    if current > 0 {
        runs.push(current);
    }

    (1..).step_by(2).find(|n| !runs.contains(n)).unwrap_or(1)
}

/// Splits `value` at the first `:` not escaped with a backslash.
///
/// Escaped separators in the key are unescaped and the value is stripped
/// of leading whitespace. Returns `None` when there is no separator or
/// when the key would be empty.
pub fn parse_escaped_pair(value: &str) -> Option<(String, String)> {
    let value = value.trim_start_matches('\\');
    let mut key = String::new();
    let mut chars = value.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some((_, ':'))) => {
                key.push(':');
                chars.next();
            }
            ':' if !key.is_empty() => {
                let rest = &value[idx + 1..];
                return Some((key, rest.trim_start().to_string()));
            }
            _ => key.push(c),
        }
    }
    None
}

/// Parses several `key:value` pairs into a map, rejecting duplicate keys.
///
/// `argument` and `expected` only feed the error messages, e.g.
/// `"--metadata"` and `"<key:value>"`.
pub fn parse_escaped_pairs<I, S>(
    pairs: I,
    argument: &str,
    expected: &str,
) -> Result<BTreeMap<String, String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut response = BTreeMap::new();
    for pair in pairs {
        let pair = pair.as_ref();
        let (key, value) = parse_escaped_pair(pair).ok_or_else(|| Error::MalformedPair {
            value: pair.to_string(),
            argument: argument.to_string(),
            expected: expected.to_string(),
        })?;
        if response.contains_key(&key) {
            return Err(Error::DuplicateKey {
                key,
                argument: argument.to_string(),
            });
        }
        response.insert(key, value);
    }
    Ok(response)
}

/// Maximum line width used when writing PO or Markdown files.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Wrapwidth {
    /// Lines are never wrapped.
    #[default]
    Infinite,
    Columns(usize),
}

impl Wrapwidth {
    /// The width in columns, or `None` when wrapping is disabled.
    pub fn columns(self) -> Option<usize> {
        match self {
            Wrapwidth::Infinite => None,
            Wrapwidth::Columns(n) => Some(n),
        }
    }

    /// Parses `value`, naming `argument` in the error message.
    ///
    /// `0`, negative numbers and `inf` all disable wrapping.
    pub fn parse(value: &str, argument: &str) -> Result<Wrapwidth> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("inf") || trimmed.eq_ignore_ascii_case("math.inf") {
            return Ok(Wrapwidth::Infinite);
        }
        match trimmed.parse::<i64>() {
            Ok(n) if n > 0 => Ok(Wrapwidth::Columns(n as usize)),
            Ok(_) => Ok(Wrapwidth::Infinite),
            Err(_) => Err(Error::InvalidWrapwidth {
                value: value.to_string(),
                argument: argument.to_string(),
            }),
        }
    }
}

impl From<usize> for Wrapwidth {
    fn from(n: usize) -> Self {
        if n == 0 {
            Wrapwidth::Infinite
        } else {
            Wrapwidth::Columns(n)
        }
    }
}

impl FromStr for Wrapwidth {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Wrapwidth::parse(value, "wrapwidth")
    }
}

impl fmt::Display for Wrapwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wrapwidth::Infinite => f.write_str("inf"),
            Wrapwidth::Columns(n) => write!(f, "{n}"),
        }
    }
}

/// Checks that `encoding` names UTF-8, the only supported encoding.
pub fn check_encoding(encoding: &str) -> Result<()> {
    let normalized = encoding.trim().to_ascii_lowercase().replace('_', "-");
    if normalized == "utf-8" || normalized == "utf8" {
        Ok(())
    } else {
        Err(Error::UnsupportedEncoding(encoding.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_code_span_fence_len_without_backticks() {
        assert_eq!(code_span_fence_len('`', "foo"), 1);
        assert_eq!(code_span_fence_len('`', ""), 1);
    }

    #[test]
    fn test_code_span_fence_len_skips_used_runs() {
        assert_eq!(code_span_fence_len('`', "a ` b"), 3);
        assert_eq!(code_span_fence_len('`', "a `` b"), 1);
        assert_eq!(code_span_fence_len('`', "a ` b ``` c"), 5);
        assert_eq!(code_span_fence_len('`', "```"), 1);
        assert_eq!(code_span_fence_len('`', "`"), 3);
    }

    #[test]
    fn test_code_span_fence_len_other_delimiter() {
        assert_eq!(code_span_fence_len('~', "~ `"), 3);
    }

    #[test]
    fn test_parse_escaped_pair() {
        assert_eq!(
            parse_escaped_pair("Language: es"),
            Some((String::from("Language"), String::from("es")))
        );
        assert_eq!(
            parse_escaped_pair("Content-Type: text/plain; charset=utf-8"),
            Some((
                String::from("Content-Type"),
                String::from("text/plain; charset=utf-8")
            ))
        );
    }

    #[test]
    fn test_parse_escaped_pair_escaped_separator() {
        assert_eq!(
            parse_escaped_pair(r"a\:b:c:d"),
            Some((String::from("a:b"), String::from("c:d")))
        );
    }

    #[test]
    fn test_parse_escaped_pair_without_separator() {
        assert_eq!(parse_escaped_pair("foo"), None);
        assert_eq!(parse_escaped_pair(":foo"), None);
        assert_eq!(parse_escaped_pair(r"foo\:bar"), None);
    }

    #[test]
    fn test_parse_escaped_pairs_duplicated_key() {
        let err = parse_escaped_pairs(["a:b", "a:c"], "--metadata", "<key:value>").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Repeated key 'a' passed to --metadata arguments."
        );
    }

    #[test]
    fn test_parse_escaped_pairs_malformed() {
        let err = parse_escaped_pairs(["ab"], "--metadata", "<key:value>").unwrap_err();
        assert_eq!(
            err.to_string(),
            "The value 'ab' passed to argument --metadata can't be parsed. \
             Please, separate the pair '<key:value>' with a ':' character."
        );
    }

    #[test]
    fn test_wrapwidth_parse() {
        assert_eq!(Wrapwidth::parse("78", "w").unwrap(), Wrapwidth::Columns(78));
        assert_eq!(Wrapwidth::parse("0", "w").unwrap(), Wrapwidth::Infinite);
        assert_eq!(Wrapwidth::parse("-3", "w").unwrap(), Wrapwidth::Infinite);
        assert_eq!(Wrapwidth::parse("inf", "w").unwrap(), Wrapwidth::Infinite);
        assert_eq!(Wrapwidth::parse("INF", "w").unwrap(), Wrapwidth::Infinite);
    }

    #[test]
    fn test_wrapwidth_parse_invalid() {
        let err = Wrapwidth::parse("foo", "-w/--wrapwidth").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value 'foo' for -w/--wrapwidth argument."
        );
    }

    #[test]
    fn test_check_encoding() {
        assert!(check_encoding("utf-8").is_ok());
        assert!(check_encoding("UTF8").is_ok());
        assert!(check_encoding("utf_8").is_ok());
        assert!(check_encoding("latin-1").is_err());
    }
}
