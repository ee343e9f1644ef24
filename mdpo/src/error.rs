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

//! Error type shared by the library.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not read or write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {message}", path.display())]
    PoSyntax {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Invalid mdpo command resolution '{command}'. Valid values are: {valid}")]
    InvalidCommandResolution { command: String, valid: String },

    #[error("Multiple resolutions for '{0}' alias passed to command aliases.")]
    DuplicateAlias(String),

    #[error(
        "The value '{value}' passed to argument {argument} can't be parsed. \
         Please, separate the pair '{expected}' with a ':' character."
    )]
    MalformedPair {
        value: String,
        argument: String,
        expected: String,
    },

    #[error("Repeated key '{key}' passed to {argument} arguments.")]
    DuplicateKey { key: String, argument: String },

    #[error("Invalid value '{value}' for {argument} argument.")]
    InvalidWrapwidth { value: String, argument: String },

    #[error("You need to specify {what} with the command '{command}'.")]
    MissingCommandArgument { what: &'static str, command: String },

    #[error("You must pass the replacer '{{lang}}' inside the argument '{0}'.")]
    SchemaWithoutLang(String),

    #[error("The glob '{0}' does not match any file.")]
    GlobWithoutMatches(String),

    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Unknown event '{0}'. Valid events are: {1}")]
    UnknownEvent(String, String),

    #[error("Could not resolve the event hook '{0}': {1}")]
    UnresolvedHook(String, String),

    #[error("The argument 'save' does not make sense without passing the argument 'po_filepath'.")]
    SaveWithoutPoFilepath,

    #[error("Unsupported encoding '{0}', only UTF-8 is supported.")]
    UnsupportedEncoding(String),

    #[error("Could not write the MO file {}: {message}", path.display())]
    MoExport { path: PathBuf, message: String },
}

impl Error {
    /// Builds an [`Error::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

