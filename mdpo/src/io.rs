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

//! File system helpers: glob expansion, path filtering and saving files
//! only when their content changes.

use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Removes the paths matched by `ignore` and sorts the rest.
///
/// An ignore entry matches a path when it equals the path itself, its
/// file name, the name of its parent directory or the parent directory
/// path.
pub fn filter_paths<S: AsRef<str>>(paths: Vec<PathBuf>, ignore: &[S]) -> Vec<PathBuf> {
    let ignored = |candidate: Option<&Path>| {
        candidate.is_some_and(|candidate| {
            ignore
                .iter()
                .any(|ignored| Path::new(ignored.as_ref()) == candidate)
        })
    };

    let mut response: Vec<PathBuf> = paths
        .into_iter()
        .filter(|path| {
            let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
            !(ignored(path.file_name().map(Path::new))
                || ignored(parent.and_then(Path::file_name).map(Path::new))
                || ignored(Some(path))
                || ignored(parent))
        })
        .collect();
    response.sort();
    response
}

/// Expands `pattern`, returning every existing file it matches.
pub fn glob_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|source| Error::InvalidGlob {
        pattern: pattern.to_string(),
        source,
    })?;
    Ok(paths
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect())
}

/// Expands several globs, filters them with `ignore` and removes
/// duplicates. A glob without any match is an error.
pub fn expand_globs<P, S>(patterns: &[P], ignore: &[S]) -> Result<Vec<PathBuf>>
where
    P: AsRef<str>,
    S: AsRef<str>,
{
    let mut response = Vec::new();
    for pattern in patterns {
        let matches = glob_files(pattern.as_ref())?;
        if matches.is_empty() {
            return Err(Error::GlobWithoutMatches(pattern.as_ref().to_string()));
        }
        for path in filter_paths(matches, ignore) {
            if !response.contains(&path) {
                response.push(path);
            }
        }
    }
    Ok(response)
}

/// Markdown input given either as files or as literal content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilesOrContent {
    Files(Vec<PathBuf>),
    Content(String),
}

impl FilesOrContent {
    /// Treats `value` as a glob when it matches at least one file and as
    /// Markdown content otherwise.
    pub fn detect(value: &str, ignore: &[String]) -> FilesOrContent {
        match glob_files(value) {
            Ok(paths) if !paths.is_empty() => FilesOrContent::Files(filter_paths(paths, ignore)),
            _ => FilesOrContent::Content(value.to_string()),
        }
    }
}

pub fn read_to_string(path: &Path) -> Result<String> {
    tracing::debug!("Reading {}", path.display());
    std::fs::read_to_string(path).map_err(|err| Error::io(path, err))
}

/// Writes `content` to `path` unless the file already holds it.
///
/// The content is written to a temporary file in the same directory which
/// then replaces `path`, so an interrupted write never truncates the
/// previous file. Returns `true` when the file was created or changed.
pub fn save_if_changed(path: &Path, content: &str) -> Result<bool> {
    match std::fs::read(path) {
        Ok(previous) if previous == content.as_bytes() => {
            tracing::debug!("{} is up to date", path.display());
            return Ok(false);
        }
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(Error::io(path, err)),
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|err| Error::io(dir, err))?;
    file.write_all(content.as_bytes())
        .map_err(|err| Error::io(file.path(), err))?;
    file.persist(path)
        .map_err(|err| Error::io(path, err.error))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paths(values: &[&str]) -> Vec<PathBuf> {
        values.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_filter_paths_sorts() {
        assert_eq!(
            filter_paths(paths(&["b.md", "a.md"]), &[] as &[&str]),
            paths(&["a.md", "b.md"])
        );
    }

    #[test]
    fn test_filter_paths_by_file_name() {
        assert_eq!(
            filter_paths(paths(&["docs/a.md", "docs/b.md"]), &["b.md"]),
            paths(&["docs/a.md"])
        );
    }

    #[test]
    fn test_filter_paths_by_dir_name() {
        assert_eq!(
            filter_paths(paths(&["docs/foo/a.md", "docs/bar/b.md"]), &["foo"]),
            paths(&["docs/bar/b.md"])
        );
    }

    #[test]
    fn test_filter_paths_by_full_path() {
        assert_eq!(
            filter_paths(paths(&["docs/a.md", "docs/b.md"]), &["docs/a.md"]),
            paths(&["docs/b.md"])
        );
    }

    #[test]
    fn test_filter_paths_by_dir_path() {
        assert_eq!(
            filter_paths(paths(&["docs/foo/a.md", "src/foo/b.md"]), &["docs/foo"]),
            paths(&["src/foo/b.md"])
        );
    }

    #[test]
    fn test_expand_globs_without_matches() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let pattern = tmpdir.path().join("*.md");
        let pattern = pattern.to_string_lossy();
        let err = expand_globs(&[pattern.as_ref()], &[] as &[&str]).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("The glob '{pattern}' does not match any file.")
        );
        Ok(())
    }

    #[test]
    fn test_expand_globs_deduplicates() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        std::fs::write(tmpdir.path().join("a.md"), "A")?;
        std::fs::write(tmpdir.path().join("b.md"), "B")?;
        let all = tmpdir.path().join("*.md").to_string_lossy().into_owned();
        let one = tmpdir.path().join("a.md").to_string_lossy().into_owned();
        let found = expand_globs(&[one, all], &[] as &[&str])?;
        assert_eq!(
            found,
            vec![tmpdir.path().join("a.md"), tmpdir.path().join("b.md")]
        );
        Ok(())
    }

    #[test]
    fn test_files_or_content() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("README.md");
        std::fs::write(&path, "# Foo")?;
        assert_eq!(
            FilesOrContent::detect(&path.to_string_lossy(), &[]),
            FilesOrContent::Files(vec![path])
        );
        assert_eq!(
            FilesOrContent::detect("# Some content", &[]),
            FilesOrContent::Content(String::from("# Some content"))
        );
        assert_eq!(
            FilesOrContent::detect("[s-m]", &[]),
            FilesOrContent::Content(String::from("[s-m]"))
        );
        Ok(())
    }

    #[test]
    fn test_save_if_changed() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("foo.po");
        assert!(save_if_changed(&path, "foo")?);
        assert!(!save_if_changed(&path, "foo")?);
        assert!(save_if_changed(&path, "bar")?);
        assert_eq!(std::fs::read_to_string(&path)?, "bar");
        Ok(())
    }
}
