//! Recipient list file: one address per line, blank lines ignored

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Ordered recipient addresses, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientList {
    addresses: Vec<String>,
}

impl RecipientList {
    /// Parse file contents
    pub fn parse(contents: &str) -> Self {
        let addresses = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Self { addresses }
    }

    /// Read the whole file. Called once per cycle so edits take effect.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Io(format!("Failed to read recipients file {}: {}", path.display(), e)))?;
        Ok(Self::parse(&contents))
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Where the FileList strategy reads recipients from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientSource {
    pub path: PathBuf,
}

impl RecipientSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<RecipientList> {
        RecipientList::load(&self.path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_skips_blank_lines_and_keeps_order() {
        let list = RecipientList::parse("cosmos1b\n\n  \r\ncosmos1a\r\ncosmos1c\n");
        assert_eq!(list.addresses(), &["cosmos1b", "cosmos1a", "cosmos1c"]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_parse_empty() {
        assert!(RecipientList::parse("").is_empty());
        assert!(RecipientList::parse("\n\n").is_empty());
    }

    #[tokio::test]
    async fn test_load_rereads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recipients.txt");
        std::fs::write(&path, "cosmos1a\n").unwrap();

        let source = RecipientSource::new(&path);
        assert_eq!(source.load().await.unwrap().len(), 1);

        std::fs::write(&path, "cosmos1a\ncosmos1b\n").unwrap();
        assert_eq!(source.load().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = RecipientList::load(&dir.path().join("missing.txt")).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
