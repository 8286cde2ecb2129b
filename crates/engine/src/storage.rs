//! Binary object storage for attachments.
//!
//! The engine only needs three operations: put bytes at a path, delete a
//! path and compute the public URL of a path. Image variants (thumbnail,
//! preview, webp) are pure string transforms of the public URL.

use std::{
    collections::HashMap,
    fmt,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Bucket every attachment lives in.
pub const BUCKET: &str = "expense-attachments";

pub const THUMBNAIL_SIZE: u32 = 200;
pub const PREVIEW_WIDTH: u32 = 800;
pub const WEBP_WIDTH: u32 = 400;

const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("object already exists: {0}")]
    AlreadyExists(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("invalid object path: {0}")]
    InvalidPath(String),
    #[error("object store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Path-addressed blob storage.
#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Stores `bytes` at `path`. Fails with [`ObjectStoreError::AlreadyExists`]
    /// when the path is taken and `upsert` is false.
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), ObjectStoreError>;

    async fn delete(&self, path: &str) -> Result<(), ObjectStoreError>;

    fn public_url(&self, path: &str) -> String;
}

fn public_object_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{BUCKET}/{path}",
        base_url.trim_end_matches('/')
    )
}

fn render_url(public_url: &str) -> String {
    public_url.replacen("/object/", "/render/image/", 1)
}

/// Square, cropped thumbnail for grids and lists.
pub fn thumbnail_url(public_url: &str, size: u32) -> String {
    format!(
        "{}?width={size}&height={size}&resize=cover&quality=80",
        render_url(public_url)
    )
}

/// Medium-size image for a lightbox.
pub fn preview_url(public_url: &str, max_width: u32) -> String {
    format!("{}?width={max_width}&quality=85", render_url(public_url))
}

pub fn webp_url(public_url: &str, width: u32) -> String {
    format!(
        "{}?width={width}&format=webp&quality=80",
        render_url(public_url)
    )
}

pub fn is_image_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Object store backed by a directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, ObjectStoreError> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(ObjectStoreError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(BUCKET).join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
        upsert: bool,
    ) -> Result<(), ObjectStoreError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true);
        if upsert {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = options.open(&full).await.map_err(|err| match err.kind() {
            ErrorKind::AlreadyExists => ObjectStoreError::AlreadyExists(path.to_string()),
            _ => ObjectStoreError::Io(err),
        })?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), ObjectStoreError> {
        let full = self.resolve(path)?;
        tokio::fs::remove_file(&full)
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => ObjectStoreError::NotFound(path.to_string()),
                _ => ObjectStoreError::Io(err),
            })
    }

    fn public_url(&self, path: &str) -> String {
        public_object_url(&self.public_base_url, path)
    }
}

#[derive(Clone, Debug)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Process-local object store, for development setups and tests.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    public_base_url: String,
}

impl MemoryObjectStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(path).cloned())
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }
}

fn poisoned<T>(_: T) -> ObjectStoreError {
    ObjectStoreError::Unavailable("memory store lock poisoned".to_string())
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), ObjectStoreError> {
        let mut objects = self.objects.lock().map_err(poisoned)?;
        if !upsert && objects.contains_key(path) {
            return Err(ObjectStoreError::AlreadyExists(path.to_string()));
        }
        objects.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), ObjectStoreError> {
        let mut objects = self.objects.lock().map_err(poisoned)?;
        objects
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| ObjectStoreError::NotFound(path.to_string()))
    }

    fn public_url(&self, path: &str) -> String {
        public_object_url(&self.public_base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str =
        "http://files.local/storage/v1/object/public/expense-attachments/slip/2024/05/x/1-a.png";

    #[test]
    fn image_variants_use_render_endpoint() {
        assert_eq!(
            thumbnail_url(URL, THUMBNAIL_SIZE),
            "http://files.local/storage/v1/render/image/public/expense-attachments/slip/2024/05/x/1-a.png?width=200&height=200&resize=cover&quality=80"
        );
        assert_eq!(
            preview_url(URL, PREVIEW_WIDTH),
            "http://files.local/storage/v1/render/image/public/expense-attachments/slip/2024/05/x/1-a.png?width=800&quality=85"
        );
        assert_eq!(
            webp_url(URL, WEBP_WIDTH),
            "http://files.local/storage/v1/render/image/public/expense-attachments/slip/2024/05/x/1-a.png?width=400&format=webp&quality=80"
        );
    }

    #[test]
    fn detects_image_paths_case_insensitively() {
        assert!(is_image_path("receipt/2024/01/id/1-scan.JPG"));
        assert!(is_image_path("a.webp"));
        assert!(!is_image_path("invoice/2024/01/id/1-bill.pdf"));
    }

    #[test]
    fn public_url_trims_trailing_slash() {
        let store = MemoryObjectStore::new("http://files.local/");
        assert_eq!(
            store.public_url("a/b.pdf"),
            "http://files.local/storage/v1/object/public/expense-attachments/a/b.pdf"
        );
    }

    #[tokio::test]
    async fn memory_store_refuses_silent_overwrite() {
        let store = MemoryObjectStore::new("http://files.local");
        store.put("a/b.pdf", vec![1], "application/pdf", false).await.unwrap();

        let err = store
            .put("a/b.pdf", vec![2], "application/pdf", false)
            .await
            .unwrap_err();
        assert!(matches!(err, ObjectStoreError::AlreadyExists(_)));

        store.put("a/b.pdf", vec![3], "application/pdf", true).await.unwrap();
        assert_eq!(store.get("a/b.pdf").unwrap().bytes, vec![3]);

        store.delete("a/b.pdf").await.unwrap();
        assert!(matches!(
            store.delete("a/b.pdf").await.unwrap_err(),
            ObjectStoreError::NotFound(_)
        ));
    }

    #[test]
    fn local_store_rejects_escaping_paths() {
        let store = LocalObjectStore::new("/tmp/expensa", "http://files.local");
        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("/etc/passwd").is_err());
        assert!(store.resolve("").is_err());
        assert!(store.resolve("slip/2024/01/id/1-a.png").is_ok());
    }
}
