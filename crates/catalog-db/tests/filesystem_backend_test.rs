//! Filesystem storage backend behavior against a real temporary directory.

use catalog_core::fixtures::sample_png;
use catalog_core::{validate_image, ImageUpload};
use catalog_db::{FilesystemBackend, ImageStorage, StorageBackend};
use tempfile::TempDir;
use uuid::Uuid;

#[tokio::test]
async fn test_put_get_remove_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let backend = FilesystemBackend::new(temp_dir.path());
    let on_disk = temp_dir.path().join("images/ab/cd/file.png");

    backend
        .put("images/ab/cd/file.png", b"bytes")
        .await
        .expect("put");
    assert!(on_disk.is_file());
    assert_eq!(backend.get("images/ab/cd/file.png").await.unwrap(), b"bytes");

    assert!(backend.remove("images/ab/cd/file.png").await.unwrap());
    assert!(!on_disk.exists());
}

#[tokio::test]
async fn test_remove_missing_file_reports_false() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let backend = FilesystemBackend::new(temp_dir.path());
    assert!(!backend.remove("images/none.png").await.unwrap());
}

#[tokio::test]
async fn test_put_refuses_to_overwrite() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let backend = FilesystemBackend::new(temp_dir.path());
    backend.put("images/x/y.png", b"first").await.unwrap();

    assert!(backend.put("images/x/y.png", b"second").await.is_err());
    assert_eq!(backend.get("images/x/y.png").await.unwrap(), b"first");
}

#[tokio::test]
async fn test_put_leaves_no_staging_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let backend = FilesystemBackend::new(temp_dir.path());
    backend.put("images/x/y.png", b"data").await.unwrap();

    let entries: Vec<_> = std::fs::read_dir(temp_dir.path().join("images/x"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(entries, vec!["y.png".to_string()]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_stored_files_are_not_executable() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let backend = FilesystemBackend::new(temp_dir.path());
    backend.put("images/x/y.png", b"data").await.unwrap();

    let mode = std::fs::metadata(temp_dir.path().join("images/x/y.png"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o111, 0);
}

#[tokio::test]
async fn test_traversal_is_refused() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let backend = FilesystemBackend::new(temp_dir.path().join("root"));
    assert!(backend.put("../escape.png", b"x").await.is_err());
    assert!(!temp_dir.path().join("escape.png").exists());
    assert!(backend.get("/etc/hostname").await.is_err());
}

#[tokio::test]
async fn test_check_leaves_nothing_behind() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = ImageStorage::new(FilesystemBackend::new(temp_dir.path()), "/media");
    storage.check().await.expect("storage should be usable");

    let leftovers = std::fs::read_dir(temp_dir.path().join("images"))
        .unwrap()
        .count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_check_fails_on_unwritable_root() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    // A regular file where the root directory should be
    let root = temp_dir.path().join("not-a-dir");
    std::fs::write(&root, b"x").unwrap();

    let storage = ImageStorage::new(FilesystemBackend::new(&root), "/media");
    assert!(storage.check().await.is_err());
}

#[tokio::test]
async fn test_image_storage_store_and_free() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = ImageStorage::new(FilesystemBackend::new(temp_dir.path()), "/media");

    let image = validate_image(
        ImageUpload::new("cover.png", "image/png", sample_png(3, 3)),
        1024 * 1024,
    )
    .unwrap();
    let id = Uuid::now_v7();
    let stored = storage.store(id, &image).await.unwrap();

    assert!(stored.storage_path.starts_with("images/"));
    assert!(stored.storage_path.ends_with(&format!("{}.png", id)));
    assert_eq!(stored.public_url, format!("/media/{}", stored.storage_path));
    assert!(stored.content_hash.starts_with("blake3:"));
    assert_eq!(storage.read(&stored.storage_path).await.unwrap(), image.data());

    let paths = [stored.storage_path.clone()];
    assert_eq!(storage.delete_all_best_effort(&paths).await, 1);
    assert!(!temp_dir.path().join(&stored.storage_path).exists());
    // Already gone: nothing more to free
    assert_eq!(storage.delete_all_best_effort(&paths).await, 0);
}
