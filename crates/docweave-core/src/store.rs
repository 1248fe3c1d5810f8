use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("invalid blob name: {0}")]
    InvalidName(String),
    #[error("invalid blob URI: {0}")]
    InvalidUri(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub const JSON_CONTENT_TYPE: &str = "application/json";
const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMeta {
    pub name: String,
    pub content_type: String,
}

/// Byte-level access to named blobs under a flat, `/`-separated namespace.
/// Injected into orchestration code instead of living behind a process-wide
/// client.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn list(&self, prefix: &str) -> StoreResult<Vec<BlobMeta>>;

    async fn download(&self, name: &str) -> StoreResult<Vec<u8>>;

    async fn upload(&self, name: &str, data: Vec<u8>, content_type: &str) -> StoreResult<()>;
}

/// A `scheme://bucket/prefix` address, as reported by the extraction service
/// for its output destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobUri {
    pub bucket: String,
    pub prefix: String,
}

impl BlobUri {
    pub fn parse(uri: &str) -> StoreResult<Self> {
        let parsed = Url::parse(uri).map_err(|_| StoreError::InvalidUri(uri.to_string()))?;
        let bucket = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| StoreError::InvalidUri(uri.to_string()))?
            .to_string();
        let prefix = parsed.path().trim_start_matches('/').to_string();

        Ok(Self { bucket, prefix })
    }

    /// The store key this URI addresses: `bucket/prefix`.
    #[must_use]
    pub fn key(&self) -> String {
        if self.prefix.is_empty() {
            self.bucket.clone()
        } else {
            format!("{}/{}", self.bucket, self.prefix)
        }
    }

    /// Where repaired documents land: the addressed prefix with a
    /// `_cleaned/` suffix.
    #[must_use]
    pub fn cleaned_prefix(&self) -> String {
        format!("{}_cleaned/", self.key().trim_end_matches('/'))
    }
}

fn content_type_for(name: &str) -> &'static str {
    if name.ends_with(".json") {
        JSON_CONTENT_TYPE
    } else {
        BINARY_CONTENT_TYPE
    }
}

/// In-process store used by tests and dry runs.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list(&self, prefix: &str) -> StoreResult<Vec<BlobMeta>> {
        let blobs = self.blobs.read().await;
        let mut metas: Vec<BlobMeta> = blobs
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, (content_type, _))| BlobMeta {
                name: name.clone(),
                content_type: content_type.clone(),
            })
            .collect();
        metas.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(metas)
    }

    async fn download(&self, name: &str) -> StoreResult<Vec<u8>> {
        let blobs = self.blobs.read().await;
        blobs
            .get(name)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn upload(&self, name: &str, data: Vec<u8>, content_type: &str) -> StoreResult<()> {
        let mut blobs = self.blobs.write().await;
        blobs.insert(name.to_string(), (content_type.to_string(), data));
        Ok(())
    }
}

/// Directory-backed store: blob names map to paths under a root directory.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn blob_path(&self, name: &str) -> StoreResult<PathBuf> {
        let relative = Path::new(name);
        let traversal = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
        if name.is_empty() || traversal {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn list(&self, prefix: &str) -> StoreResult<Vec<BlobMeta>> {
        let mut metas = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => continue,
                Err(error) => return Err(error.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                if let Ok(relative) = path.strip_prefix(&self.root) {
                    let name = relative.to_string_lossy().to_string();
                    if name.starts_with(prefix) {
                        metas.push(BlobMeta {
                            content_type: content_type_for(&name).to_string(),
                            name,
                        });
                    }
                }
            }
        }

        metas.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(metas)
    }

    async fn download(&self, name: &str) -> StoreResult<Vec<u8>> {
        let path = self.blob_path(name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn upload(&self, name: &str, data: Vec<u8>, _content_type: &str) -> StoreResult<()> {
        let path = self.blob_path(name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        Ok(())
    }
}
