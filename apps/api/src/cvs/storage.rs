use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};
use uuid::Uuid;

/// Stores uploaded CV files on local disk.
#[derive(Debug, Clone)]
pub struct CvStorage {
    root: PathBuf,
}

impl CvStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the file under a unique name and returns its path.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("create CV storage dir {}", self.root.display()))?;

        let stored_name = format!("{}-{}", Uuid::new_v4().simple(), sanitize_filename(original_name));
        let path = self.root.join(stored_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("write CV file {}", path.display()))?;

        info!("Saved CV file to {}", path.display());
        Ok(path)
    }

    /// Removes a stored file. Runs after the owning row is already gone, so a
    /// failure only leaves an orphaned file behind and is logged.
    pub async fn remove(&self, path: &str) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => info!("Removed CV file {path}"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete local file {path}: {e}"),
        }
    }
}

/// Replaces every character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Min CV (2024).pdf"), "Min_CV__2024_.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("søknad.pdf"), "s_knad.pdf");
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CvStorage::new(dir.path().join("cvs"));

        let path = storage.save("cv.pdf", b"%PDF-1.4").await.unwrap();
        assert!(path.starts_with(storage.root()));
        assert!(path.file_name().unwrap().to_string_lossy().ends_with("-cv.pdf"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF-1.4");

        storage.remove(path.to_str().unwrap()).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CvStorage::new(dir.path());
        storage
            .remove(dir.path().join("gone.pdf").to_str().unwrap())
            .await;
    }

    #[tokio::test]
    async fn test_same_name_saved_twice_gets_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CvStorage::new(dir.path());
        let a = storage.save("cv.pdf", b"a").await.unwrap();
        let b = storage.save("cv.pdf", b"b").await.unwrap();
        assert_ne!(a, b);
    }
}
