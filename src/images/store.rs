//! Content-addressed image cache on disk
//!
//! Images are stored under the SHA-256 of their URI, so:
//! - each URI is downloaded at most once
//! - names never collide across sources
//! - a cached file is found again without any index

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

/// Local copies of creature images
#[derive(Debug, Clone)]
pub struct ImageCache {
    dir: PathBuf,
    client: Client,
}

impl ImageCache {
    /// Create a cache rooted at `dir`, created on first download
    pub fn new(dir: impl Into<PathBuf>, timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            dir: dir.into(),
            client,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Compute SHA-256 hash of a URI
    fn compute_hash(uri: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(uri.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// File the URI is cached under, whether or not it exists yet
    pub fn cached_path(&self, uri: &str) -> PathBuf {
        let file_name = uri
            .rsplit('/')
            .next()
            .and_then(|last| last.split(['?', '#']).next())
            .and_then(|last| last.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| format!("{}.{}", Self::compute_hash(uri), ext))
            .unwrap_or_else(|| Self::compute_hash(uri));
        self.dir.join(file_name)
    }

    /// Local path for an image URI, downloading it if needed
    ///
    /// Any failure is logged and yields None.
    pub async fn local_path(&self, uri: &str) -> Option<PathBuf> {
        let path = self.cached_path(uri);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!("Image cache hit for {}", uri);
            return Some(path);
        }

        match self.download(uri, &path).await {
            Ok(bytes) => {
                info!("Cached image {} ({} bytes) at {}", uri, bytes, path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Could not cache image {}: {}", uri, e);
                None
            }
        }
    }

    async fn download(&self, uri: &str, path: &Path) -> Result<usize, String> {
        debug!("Downloading image from: {}", uri);

        let response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(|e| format!("Failed to fetch image: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP error: {}", response.status()));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| format!("Failed to read image bytes: {}", e))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| format!("Failed to create {}: {}", self.dir.display(), e))?;

        // Write then rename so a partial download is never taken for a hit
        let partial = path.with_extension("part");
        tokio::fs::write(&partial, &data)
            .await
            .map_err(|e| format!("Failed to write image: {}", e))?;
        tokio::fs::rename(&partial, path)
            .await
            .map_err(|e| format!("Failed to store image: {}", e))?;

        Ok(data.len())
    }
}
