//! File storage seam for uploaded documents.
//!
//! The document service depends on the trait, not on a filesystem layout, so
//! the local-disk implementation can be swapped for object storage.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

/// Result of storing a file: the reference recorded on the document row plus
/// the byte count.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub reference: String,
    pub size: i64,
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Persist `bytes` and return a reference that can later be deleted.
    async fn save(&self, original_name: &str, bytes: &[u8]) -> io::Result<StoredFile>;

    /// Remove a previously stored file. Deleting a missing file is not an
    /// error.
    async fn delete(&self, reference: &str) -> io::Result<()>;
}

/// Stores files under a single root directory, served statically at
/// `/uploads`.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Timestamp plus a random suffix keeps concurrent uploads from
    /// colliding; the original extension is kept for content-type sniffing.
    fn generate_name(original_name: &str) -> String {
        let stamp = chrono::Utc::now().timestamp_millis();
        let suffix = &Uuid::new_v4().simple().to_string()[..8];
        match Path::new(original_name).extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stamp}-{suffix}.{ext}"),
            None => format!("{stamp}-{suffix}"),
        }
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn save(&self, original_name: &str, bytes: &[u8]) -> io::Result<StoredFile> {
        tokio::fs::create_dir_all(&self.root).await?;

        let name = Self::generate_name(original_name);
        let path = self.root.join(&name);
        tokio::fs::write(&path, bytes).await?;

        info!("stored upload {} ({} bytes)", path.display(), bytes.len());
        Ok(StoredFile {
            reference: name,
            size: bytes.len() as i64,
        })
    }

    async fn delete(&self, reference: &str) -> io::Result<()> {
        let path = self.root.join(reference);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("deleted upload {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let stored = storage.save("scan.pdf", b"%PDF-1.4").await.unwrap();
        assert_eq!(stored.size, 8);
        assert!(stored.reference.ends_with(".pdf"));
        assert!(dir.path().join(&stored.reference).exists());

        storage.delete(&stored.reference).await.unwrap();
        assert!(!dir.path().join(&stored.reference).exists());

        // Second delete is a no-op.
        storage.delete(&stored.reference).await.unwrap();
    }

    #[test]
    fn generated_names_differ() {
        let a = LocalStorage::generate_name("photo.jpg");
        let b = LocalStorage::generate_name("photo.jpg");
        assert_ne!(a, b);
        assert!(a.ends_with(".jpg"));
    }
}
