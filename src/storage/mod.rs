use std::path::{Component, Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use axum::body::Bytes;
use futures::{Stream, StreamExt};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::now_millis;

/// Public path prefix under which stored uploads are served.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Chunks of an incoming upload, in order.
pub type ByteStream<'a> = Pin<Box<dyn Stream<Item = Result<Bytes, AppError>> + Send + 'a>>;

/// Where an accepted upload ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Generated name inside the upload directory.
    pub file_name: String,
    /// Path a client can GET to retrieve the bytes.
    pub url: String,
}

/// An open handle on a stored upload.
#[derive(Debug)]
pub struct UploadReader {
    pub file: File,
    pub len: u64,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    fn max_upload_bytes(&self) -> usize;

    /// Writes `chunks` to disk as they arrive. Nothing is left behind when
    /// the stream fails or exceeds the size limit.
    async fn save_upload(
        &self,
        chunks: ByteStream<'_>,
        original_name: &str,
    ) -> Result<StoredUpload, AppError>;

    async fn resolve_upload(&self, file_name: &str) -> Result<Option<UploadReader>, AppError>;
}

pub struct LocalFileStore {
    root: PathBuf,
    max_bytes: usize,
}

impl LocalFileStore {
    /// Creates the upload directory if needed.
    pub async fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Result<Self, AppError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        info!("upload directory ready at {}", root.display());
        Ok(Self { root, max_bytes })
    }

    async fn copy_limited(
        &self,
        file: &mut File,
        mut chunks: ByteStream<'_>,
    ) -> Result<usize, AppError> {
        let mut written = 0usize;
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            written = written.saturating_add(chunk.len());
            if written > self.max_bytes {
                return Err(AppError::PayloadTooLarge);
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    fn max_upload_bytes(&self) -> usize {
        self.max_bytes
    }

    async fn save_upload(
        &self,
        chunks: ByteStream<'_>,
        original_name: &str,
    ) -> Result<StoredUpload, AppError> {
        let file_name = unique_name(original_name);
        let path = self.root.join(&file_name);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        let result = self.copy_limited(&mut file, chunks).await;
        drop(file);

        let written = match result {
            Ok(written) => written,
            Err(e) => {
                if let Err(io) = tokio::fs::remove_file(&path).await {
                    warn!("failed to remove partial upload {}: {}", path.display(), io);
                }
                return Err(e);
            }
        };

        debug!("stored {} bytes as {}", written, path.display());

        Ok(StoredUpload {
            url: format!("{}/{}", UPLOADS_ROUTE, file_name),
            file_name,
        })
    }

    async fn resolve_upload(&self, file_name: &str) -> Result<Option<UploadReader>, AppError> {
        if !is_plain_file_name(file_name) {
            return Ok(None);
        }

        let file = match File::open(self.root.join(file_name)).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Ok(None);
        }

        Ok(Some(UploadReader {
            file,
            len: meta.len(),
        }))
    }
}

/// `<millis>-<9 random digits><.ext>`, keeping the original extension.
fn unique_name(original_name: &str) -> String {
    let suffix = Uuid::new_v4().as_u128() % 1_000_000_000;
    format!("{}-{}{}", now_millis(), suffix, extension_of(original_name))
}

fn extension_of(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

// Exactly one normal path component: no separators, no `.` or `..`.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
impl LocalFileStore {
    fn root(&self) -> &Path {
        &self.root
    }
}
