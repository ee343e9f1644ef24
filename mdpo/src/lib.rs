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

//! Translation of Markdown documents through Gettext PO files.
//!
//! The messages of a document (paragraphs, headings, list items, table
//! cells and optionally code blocks) are extracted into a PO file with
//! [`md2po`]. Once translated, [`po2md`] writes the document again with
//! every message replaced by its translation. [`md2po2md`] runs both steps
//! for a set of files and languages.
//!
//! Documents can steer the process with HTML comments such as
//! `<!-- mdpo-disable-next-line -->` or `<!-- mdpo-context month -->`, see
//! [`command::Command`].
//!
//! ```
//! use mdpo::md2po::{markdown_to_pofile, ExtractOptions, Md2PoOptions};
//! use mdpo::po2md::{Po2Md, Po2MdOptions};
//!
//! let mut po = markdown_to_pofile(
//!     "# Foo\n\nSome text\n",
//!     Md2PoOptions::default(),
//!     &ExtractOptions::default(),
//! )?;
//! po.entries[0].msgstr = String::from("Bar");
//!
//! let mut po2md = Po2Md::from_pofiles(&[po], Po2MdOptions::default())?;
//! assert_eq!(po2md.translate_content("# Foo\n\nSome text\n")?, "# Bar\n\nSome text\n");
//! # Ok::<(), mdpo::Error>(())
//! ```

pub mod catalog;
pub mod cli;
pub mod command;
pub mod engine;
pub mod error;
pub mod event;
pub mod inline;
pub mod io;
pub mod link_refs;
pub mod markdown;
pub mod md2po;
pub mod md2po2md;
pub mod po;
pub mod po2md;
pub mod text;
pub mod wrap;

pub use error::{Error, Result};

/// Version written in the `X-Generator` header.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
