//! Image file storage with a pluggable backend.
//!
//! Each product image owns exactly one stored file; files are never shared
//! between images, so deleting an image row frees its bytes unconditionally.
//!
//! ## Example
//!
//! ```rust,ignore
//! use catalog_db::file_storage::{FilesystemBackend, ImageStorage};
//!
//! let storage = ImageStorage::new(FilesystemBackend::new("/var/lib/catalog/files"), "/media");
//! let stored = storage.store(image_id, &validated).await?;
//! let bytes = storage.read(&stored.storage_path).await?;
//! ```

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use catalog_core::{Error, Result, StoredFile, ValidatedImage};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Where image bytes live. Paths are backend-relative and `/`-separated.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store `data` under a new `path`. An existing file there is an error.
    async fn put(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Bytes stored at `path`.
    async fn get(&self, path: &str) -> Result<Vec<u8>>;

    /// Remove the file at `path`, returning whether there was one.
    async fn remove(&self, path: &str) -> Result<bool>;

    /// Store, read back and remove a marker file.
    async fn check(&self) -> Result<()> {
        let marker = format!("images/.check-{}", Uuid::now_v7().simple());
        self.put(&marker, marker.as_bytes()).await?;
        let read_back = self.get(&marker).await;
        self.remove(&marker).await?;
        if read_back? != marker.as_bytes() {
            return Err(Error::Storage(format!("read-back mismatch for {}", marker)));
        }
        Ok(())
    }
}

/// Local directory backend.
///
/// Layout: `{root}/images/{first-2-hex}/{next-2-hex}/{uuid}.{ext}`
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a backend-relative path, refusing anything that could escape
    /// the root.
    fn full_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(Error::Storage(format!("Invalid storage path: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

/// Write a new file and flush it to disk. Files are served, never executed.
async fn write_new_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o644);

    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn put(&self, path: &str, data: &[u8]) -> Result<()> {
        let target = self.full_path(path)?;
        let dir = target
            .parent()
            .ok_or_else(|| Error::Storage(format!("No directory for {}", path)))?;
        fs::create_dir_all(dir).await?;

        if fs::try_exists(&target).await? {
            return Err(Error::Storage(format!("File already stored at {}", path)));
        }

        // Staged in the same directory so the rename never crosses filesystems
        let staging = dir.join(format!(".{}.part", Uuid::now_v7().simple()));
        let written = match write_new_file(&staging, data).await {
            Ok(()) => fs::rename(&staging, &target).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&staging).await;
            warn!(
                subsystem = "storage",
                component = "filesystem",
                op = "put",
                storage_path = %path,
                error = %e,
                "Image file write failed"
            );
            return Err(e.into());
        }

        debug!(
            subsystem = "storage",
            component = "filesystem",
            op = "put",
            storage_path = %path,
            size_bytes = data.len(),
            "Wrote image file"
        );
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.full_path(path)?).await?)
    }

    async fn remove(&self, path: &str) -> Result<bool> {
        match fs::remove_file(self.full_path(path)?).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Compute BLAKE3 hash of data with "blake3:" prefix.
///
/// Returns a string in the format: `blake3:{64-char-hex}`
pub fn compute_content_hash(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    format!("blake3:{}", hash.to_hex())
}

/// Generate the storage path of an image.
///
/// Path format: `images/{first-2-hex}/{next-2-hex}/{uuid}.{ext}`
///
/// Example: `images/01/94/01948f7e-8b2a-7c3d-9e4f-5a6b7c8d9e0f.png`
pub fn generate_storage_path(uuid: &Uuid, extension: &str) -> String {
    let hex = uuid.simple().to_string();
    format!(
        "images/{}/{}/{}.{}",
        &hex[0..2],
        &hex[2..4],
        uuid.as_hyphenated(),
        extension
    )
}

/// Image storage: a backend plus the URL prefix under which files are served.
#[derive(Clone)]
pub struct ImageStorage {
    backend: Arc<dyn StorageBackend>,
    public_base_url: String,
}

impl ImageStorage {
    pub fn new(backend: impl StorageBackend + 'static, public_base_url: &str) -> Self {
        Self {
            backend: Arc::new(backend),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Public URL of a stored file.
    pub fn public_url(&self, storage_path: &str) -> String {
        format!("{}/{}", self.public_base_url, storage_path)
    }

    /// Store a validated image under a path derived from `image_id`.
    pub async fn store(&self, image_id: Uuid, image: &ValidatedImage) -> Result<StoredFile> {
        let storage_path = generate_storage_path(&image_id, image.extension());
        self.backend.put(&storage_path, image.data()).await?;

        Ok(StoredFile {
            public_url: self.public_url(&storage_path),
            content_hash: compute_content_hash(image.data()),
            storage_path,
        })
    }

    pub async fn read(&self, storage_path: &str) -> Result<Vec<u8>> {
        self.backend.get(storage_path).await
    }

    /// Startup check that the backend can store, read and remove files.
    pub async fn check(&self) -> Result<()> {
        self.backend.check().await
    }

    /// Remove several files, logging failures instead of returning them.
    /// Returns how many files were actually removed.
    ///
    /// Used once the rows are gone or were never committed, when a leftover
    /// file can no longer be referenced.
    pub async fn delete_all_best_effort(&self, storage_paths: &[String]) -> usize {
        let mut removed = 0;
        for path in storage_paths {
            match self.backend.remove(path).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => warn!(
                    subsystem = "storage",
                    component = "file_storage",
                    op = "delete",
                    storage_path = %path,
                    error = %e,
                    "Failed to delete image file; leaving orphan on disk"
                ),
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_content_hash() {
        let hash = compute_content_hash(b"hello world");
        assert!(hash.starts_with("blake3:"));
        assert_eq!(hash.len(), 7 + 64);
        assert_eq!(hash, compute_content_hash(b"hello world"));
        assert_ne!(hash, compute_content_hash(b"hello world!"));
    }

    #[test]
    fn test_generate_storage_path() {
        let uuid = Uuid::parse_str("01948f7e-8b2a-7c3d-9e4f-5a6b7c8d9e0f").unwrap();
        assert_eq!(
            generate_storage_path(&uuid, "png"),
            "images/01/94/01948f7e-8b2a-7c3d-9e4f-5a6b7c8d9e0f.png"
        );
    }

    #[test]
    fn test_full_path_rejects_traversal() {
        let backend = FilesystemBackend::new("/srv/files");
        assert!(backend.full_path("images/ab/cd/x.png").is_ok());
        assert!(backend.full_path("../etc/passwd").is_err());
        assert!(backend.full_path("/etc/passwd").is_err());
        assert!(backend.full_path("images/../../x").is_err());
        assert!(backend.full_path("").is_err());
    }

    #[test]
    fn test_public_url_joins_prefix() {
        let storage = ImageStorage::new(FilesystemBackend::new("/tmp"), "/media/");
        assert_eq!(
            storage.public_url("images/ab/cd/x.png"),
            "/media/images/ab/cd/x.png"
        );

        let cdn = ImageStorage::new(FilesystemBackend::new("/tmp"), "https://cdn.example.com");
        assert_eq!(
            cdn.public_url("images/x.png"),
            "https://cdn.example.com/images/x.png"
        );
    }
}
