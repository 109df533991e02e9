//! Snapshots stored as files in a local directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::traits::{SnapshotSource, SourceError};

/// A `SnapshotSource` over the files in one directory that carry a given
/// extension. Names are file names, listed in ascending order.
#[derive(Debug, Clone)]
pub struct DirectorySnapshotSource {
    path: PathBuf,
    extension: String,
}

impl DirectorySnapshotSource {
    /// Creates a source over `path`, listing files ending in `.{extension}`.
    pub fn new(path: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let extension = extension.into().trim_start_matches('.').to_string();
        Self { path: path.into(), extension }
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }
}

#[async_trait]
impl SnapshotSource for DirectorySnapshotSource {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()), level = "debug")]
    async fn list_names(&self) -> Result<Vec<String>, SourceError> {
        let unavailable = |e: std::io::Error| {
            SourceError::SourceUnavailable(format!("{}: {e}", self.path.display()))
        };

        let mut entries = tokio::fs::read_dir(&self.path).await.map_err(unavailable)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(unavailable)? {
            let path = entry.path();
            if !self.has_extension(&path) {
                continue;
            }
            if !entry.file_type().await.map_err(unavailable)?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => tracing::warn!(?name, "Skipping snapshot with non UTF-8 name."),
            }
        }
        names.sort();
        Ok(names)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn fetch(&self, name: &str) -> Result<String, SourceError> {
        if Path::new(name).file_name().and_then(|n| n.to_str()) != Some(name) {
            return Err(SourceError::fetch_failed(name, "name is not a plain file name"));
        }
        tokio::fs::read_to_string(self.path.join(name))
            .await
            .map_err(|e| SourceError::fetch_failed(name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir_with(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_lists_matching_files_sorted() {
        let dir = dir_with(&[("b.csv", ""), ("a.csv", ""), ("notes.txt", ""), ("C.CSV", "")]);
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let source = DirectorySnapshotSource::new(dir.path(), "csv");

        assert_eq!(source.list_names().await.unwrap(), vec!["C.CSV", "a.csv", "b.csv"]);
    }

    #[tokio::test]
    async fn test_extension_may_carry_a_dot() {
        let dir = dir_with(&[("a.tsv", ""), ("b.csv", "")]);
        let source = DirectorySnapshotSource::new(dir.path(), ".tsv");

        assert_eq!(source.list_names().await.unwrap(), vec!["a.tsv"]);
    }

    #[tokio::test]
    async fn test_missing_directory_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySnapshotSource::new(dir.path().join("absent"), "csv");

        assert!(matches!(source.list_names().await, Err(SourceError::SourceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_fetch_reads_file() {
        let dir = dir_with(&[("a.csv", "min,request_count\n00:00,1\n")]);
        let source = DirectorySnapshotSource::new(dir.path(), "csv");

        assert_eq!(source.fetch("a.csv").await.unwrap(), "min,request_count\n00:00,1\n");
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_fetch_failed() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySnapshotSource::new(dir.path(), "csv");

        assert!(matches!(
            source.fetch("gone.csv").await,
            Err(SourceError::FetchFailed { ref name, .. }) if name == "gone.csv"
        ));
    }

    #[tokio::test]
    async fn test_fetch_rejects_paths() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySnapshotSource::new(dir.path(), "csv");

        assert!(source.fetch("../secret.csv").await.is_err());
        assert!(source.fetch("sub/a.csv").await.is_err());
    }
}
