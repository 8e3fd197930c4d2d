//! Stored-document capabilities: whole-file reads, plus section lookup for
//! stores that keep their own index.

use super::sections::{SectionIndex, SectionInfo, index_sections};
use crate::types::CodemarkResult;
use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

/// Asynchronous "read whole file as text by path".
pub trait FileReader {
    fn read_text(&self, path: &Path) -> impl Future<Output = CodemarkResult<String>> + Send;
}

/// Documents on the local filesystem.
///
/// Paths are resolved against `root` unless they are absolute.
#[derive(Debug, Clone, Default)]
pub struct FsVault {
    root: Option<PathBuf>,
}

impl FsVault {
    /// A vault resolving relative paths against the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// A vault resolving relative paths against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl FileReader for FsVault {
    async fn read_text(&self, path: &Path) -> CodemarkResult<String> {
        Ok(tokio::fs::read_to_string(self.resolve(path)).await?)
    }
}

/// Documents held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryVault {
    documents: HashMap<PathBuf, String>,
}

impl MemoryVault {
    /// Creates an empty vault.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores (or replaces) a document.
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.documents.insert(path.into(), text.into());
    }
}

impl FileReader for MemoryVault {
    async fn read_text(&self, path: &Path) -> CodemarkResult<String> {
        self.documents.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not in the vault", path.display()),
            )
            .into()
        })
    }
}

impl SectionIndex for MemoryVault {
    fn sections(&self, path: &Path) -> Vec<SectionInfo> {
        self.documents
            .get(path)
            .map(|text| index_sections(text))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_memory_vault_read() {
        let mut vault = MemoryVault::new();
        vault.insert("notes/a.md", "```rs\nx\n```\n");
        let text = vault.read_text(Path::new("notes/a.md")).await.unwrap();
        assert!(text.starts_with("```rs"));
        assert!(vault.read_text(Path::new("missing.md")).await.is_err());
    }

    #[test]
    fn test_memory_vault_sections() {
        let mut vault = MemoryVault::new();
        vault.insert("a.md", "intro\n\n```rs\nx\n```\n");
        assert_eq!(vault.sections(Path::new("a.md")).len(), 2);
        assert_eq!(
            vault.code_sections(Path::new("a.md")),
            vec![SectionInfo::code(2, 4)]
        );
        assert!(vault.sections(Path::new("b.md")).is_empty());
    }

    #[tokio::test]
    async fn test_fs_vault_with_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("doc.md")).unwrap();
        write!(file, "# Doc\n\n```py\nprint(1)\n```\n").unwrap();

        let vault = FsVault::with_root(dir.path());
        let text = vault.read_text(Path::new("doc.md")).await.unwrap();
        assert!(text.contains("print(1)"));
        assert!(FsVault::new().read_text(Path::new("/definitely/not/here.md")).await.is_err());
    }
}
