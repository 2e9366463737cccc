//! Avatar file storage
//!
//! Avatars are written below a root directory as
//! `uploads/user/avatar/{user_id}/{uuid}.{ext}` and the relative path is
//! stored on the user row. Remote avatars (from a federated login) are
//! downloaded first and stored the same way.
//!
//! The store does not judge extensions; the user model validates the
//! stored path when a user updates their avatar.

use bytes::{Bytes, BytesMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default upload size limit (5 MiB)
pub const DEFAULT_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Errors raised while storing avatars
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Upload is larger than the configured limit
    #[error("Avatar is too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    /// Upload was empty
    #[error("Avatar file is empty")]
    Empty,

    /// Remote avatar could not be fetched
    #[error("Failed to download avatar: {0}")]
    Download(#[from] reqwest::Error),

    /// Remote server answered with a non-success status
    #[error("Avatar download returned status {0}")]
    RemoteStatus(u16),

    /// Filesystem error
    #[error("Avatar I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Avatar storage configuration
#[derive(Debug, Clone)]
pub struct AvatarStoreConfig {
    /// Directory that receives the `uploads/` tree
    pub root: PathBuf,

    /// Public URL prefix the `uploads/` tree is served under
    pub base_url: String,

    /// Largest accepted file, in bytes
    pub max_bytes: usize,

    /// Timeout for remote avatar downloads (seconds)
    pub download_timeout_seconds: u64,
}

impl Default for AvatarStoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("public"),
            base_url: "/".to_string(),
            max_bytes: DEFAULT_MAX_BYTES,
            download_timeout_seconds: 10,
        }
    }
}

/// Writes avatar files and resolves their public URLs
#[derive(Debug, Clone)]
pub struct AvatarStore {
    config: Arc<AvatarStoreConfig>,
    http: reqwest::Client,
}

impl AvatarStore {
    /// Creates a store from configuration
    pub fn new(config: AvatarStoreConfig) -> Result<Self, StorageError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_seconds))
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    /// Relative path a new upload for `user_id` named `filename` will get
    ///
    /// The original extension is kept (reduced to ASCII alphanumerics); the
    /// stem is replaced by a random UUID.
    pub fn plan_path(&self, user_id: i64, filename: &str) -> String {
        let dir = user_dir(user_id);
        match extension_of(filename) {
            Some(ext) => format!("{}/{}.{}", dir, Uuid::new_v4(), ext),
            None => format!("{}/{}", dir, Uuid::new_v4()),
        }
    }

    /// Writes `bytes` to a relative path produced by [`AvatarStore::plan_path`]
    pub async fn write(&self, relative_path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        if bytes.len() > self.config.max_bytes {
            return Err(StorageError::TooLarge {
                size: bytes.len(),
                limit: self.config.max_bytes,
            });
        }

        let absolute = self.config.root.join(relative_path);
        if let Some(parent) = absolute.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&absolute, bytes).await?;

        debug!(path = %relative_path, size = bytes.len(), "Stored avatar");
        Ok(())
    }

    /// Stores an uploaded file and returns its relative path
    pub async fn store_upload(
        &self,
        user_id: i64,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let path = self.plan_path(user_id, filename);
        self.write(&path, bytes).await?;
        Ok(path)
    }

    /// Downloads a remote image and stores it, returning the relative path
    ///
    /// The extension comes from the URL path, falling back to the response
    /// `Content-Type`.
    pub async fn store_remote(&self, user_id: i64, url: &str) -> Result<String, StorageError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Remote avatar download failed");
            return Err(StorageError::RemoteStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = self.read_limited(response).await?;

        let filename = remote_filename(url, content_type.as_deref());
        let path = self.plan_path(user_id, &filename);
        self.write(&path, &body).await?;

        info!(user_id, path = %path, "Stored remote avatar");
        Ok(path)
    }

    /// Reads a response body, giving up once it exceeds `max_bytes`
    ///
    /// A declared `Content-Length` over the limit is rejected before any of
    /// the body is read.
    async fn read_limited(&self, mut response: reqwest::Response) -> Result<Bytes, StorageError> {
        let limit = self.config.max_bytes;

        if let Some(declared) = response.content_length() {
            let size = usize::try_from(declared).unwrap_or(usize::MAX);
            if size > limit {
                return Err(StorageError::TooLarge { size, limit });
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            let size = body.len() + chunk.len();
            if size > limit {
                return Err(StorageError::TooLarge { size, limit });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body.freeze())
    }

    /// Deletes every avatar stored for a user
    pub async fn remove_all(&self, user_id: i64) -> Result<(), StorageError> {
        let dir = self.config.root.join(user_dir(user_id));
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!(user_id, "Removed stored avatars");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes a single stored file, ignoring files that are already gone
    pub async fn remove(&self, relative_path: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.config.root.join(relative_path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Public URL for a stored relative path
    pub fn url_for(&self, relative_path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            relative_path.trim_start_matches('/')
        )
    }

    /// Storage root directory
    pub fn root(&self) -> &Path {
        &self.config.root
    }
}

fn user_dir(user_id: i64) -> String {
    format!("uploads/user/avatar/{}", user_id)
}

fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    let ext: String = ext.chars().filter(char::is_ascii_alphanumeric).collect();
    if stem.is_empty() || ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

fn remote_filename(url: &str, content_type: Option<&str>) -> String {
    let from_path = url::Url::parse(url).ok().and_then(|u| {
        u.path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
            .filter(|name| extension_of(name).is_some())
    });

    if let Some(name) = from_path {
        return name;
    }

    let ext = match content_type.map(|c| c.split(';').next().unwrap_or("").trim()) {
        Some("image/png") => "png",
        Some("image/gif") => "gif",
        Some("image/jpeg") | Some("image/jpg") => "jpg",
        _ => "jpg",
    };
    format!("avatar.{}", ext)
}
