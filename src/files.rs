//! Glob based selection of local files to upload and remote files to download.

use anyhow::{Context, Result};
use glob::Pattern;
use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// Comma separated list of glob patterns matched against file names.
#[derive(Debug, Clone)]
pub struct GlobFilter {
    patterns: Vec<Pattern>,
}

impl GlobFilter {
    /// Parses `a,b,c`. A missing or blank list matches everything.
    pub fn parse(globs: Option<&str>) -> Result<Self> {
        let globs = globs.map(str::trim).filter(|g| !g.is_empty()).unwrap_or("*");
        Self::from_patterns(&globs.split(',').collect::<Vec<_>>())
    }

    pub fn from_patterns(globs: &[&str]) -> Result<Self> {
        let patterns = globs
            .iter()
            .map(|g| g.trim())
            .filter(|g| !g.is_empty())
            .map(|g| Pattern::new(g).with_context(|| format!("Invalid glob pattern: {}", g)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Matches the last path component of `filename`.
    pub fn matches(&self, filename: &str) -> bool {
        let name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(filename);
        self.patterns.iter().any(|p| p.matches(name))
    }
}

/// Files directly under `dir` matching the filter, sorted and de-duplicated.
#[tracing::instrument(skip(runtime, filter))]
pub fn select_files<R: Runtime + ?Sized>(
    runtime: &R,
    dir: &Path,
    filter: &GlobFilter,
) -> Result<Vec<PathBuf>> {
    let mut selected: Vec<PathBuf> = runtime
        .read_dir(dir)?
        .into_iter()
        .filter(|path| runtime.is_file(path))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| filter.matches(n))
        })
        .collect();

    selected.sort();
    selected.dedup();
    debug!("Selected {} file(s) in {:?}", selected.len(), dir);
    Ok(selected)
}

/// File name of a path as a string, empty if it has none.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use tempfile::tempdir;

    fn new_files(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), "hello").unwrap();
        }
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths.iter().map(|p| file_name(p)).collect()
    }

    #[test]
    fn test_select_files_matching_glob() {
        let dir = tempdir().unwrap();
        new_files(dir.path(), &["test1.txt", "test2.txt", "test.bin"]);

        let filter = GlobFilter::parse(Some("*.txt")).unwrap();
        let selected = select_files(&RealRuntime, dir.path(), &filter).unwrap();
        assert_eq!(names(&selected), vec!["test1.txt", "test2.txt"]);

        new_files(
            dir.path(),
            &[
                "erlang-23.2.7-2.el7.x86_64.rpm",
                "erlang-debuginfo-23.2.7-2.el7.x86_64.rpm",
            ],
        );
        let filter = GlobFilter::parse(Some("erlang-23*.el7.x86_64.rpm")).unwrap();
        let selected = select_files(&RealRuntime, dir.path(), &filter).unwrap();
        assert_eq!(names(&selected), vec!["erlang-23.2.7-2.el7.x86_64.rpm"]);

        let filter = GlobFilter::parse(Some("erlang*-23*.el7.x86_64.rpm")).unwrap();
        let selected = select_files(&RealRuntime, dir.path(), &filter).unwrap();
        assert_eq!(
            names(&selected),
            vec![
                "erlang-23.2.7-2.el7.x86_64.rpm",
                "erlang-debuginfo-23.2.7-2.el7.x86_64.rpm"
            ]
        );
    }

    #[test]
    fn test_select_files_matching_several_globs() {
        let dir = tempdir().unwrap();
        new_files(dir.path(), &["test1.txt", "test2.txt", "test.bin", "data.dat"]);
        std::fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let filter = GlobFilter::parse(Some("*.txt, *.dat,*.txt")).unwrap();
        let selected = select_files(&RealRuntime, dir.path(), &filter).unwrap();
        assert_eq!(names(&selected), vec!["data.dat", "test1.txt", "test2.txt"]);
        assert!(selected.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn test_select_files_with_mock_runtime() {
        let mut runtime = MockRuntime::new();
        runtime.expect_read_dir().returning(|_| {
            Ok(vec![
                PathBuf::from("/in/b.deb"),
                PathBuf::from("/in/a.deb"),
                PathBuf::from("/in/notes.md"),
            ])
        });
        runtime.expect_is_file().returning(|_| true);

        let filter = GlobFilter::parse(None).unwrap();
        let selected = select_files(&runtime, Path::new("/in"), &filter).unwrap();
        assert_eq!(names(&selected), vec!["a.deb", "b.deb", "notes.md"]);
    }

    #[test]
    fn test_glob_filter_on_store_filenames() {
        let filter = GlobFilter::parse(Some("*.txt,*.dat")).unwrap();
        assert!(filter.matches("data.txt"));
        assert!(!filter.matches("data.foo"));
        assert!(filter.matches("data.dat"));
        assert!(!filter.matches("data.bar"));

        let filter = GlobFilter::parse(Some("*.txt")).unwrap();
        assert!(filter.matches("data.txt"));
        assert!(!filter.matches("data.dat"));
    }

    #[test]
    fn test_glob_filter_defaults_to_everything() {
        assert!(GlobFilter::parse(None).unwrap().matches("anything.deb"));
        assert!(GlobFilter::parse(Some("  ")).unwrap().matches("anything.deb"));
    }

    #[test]
    fn test_glob_filter_invalid_pattern() {
        let err = GlobFilter::parse(Some("[")).unwrap_err();
        assert!(err.to_string().contains("Invalid glob pattern"));
    }
}
