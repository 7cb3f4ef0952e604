use async_trait::async_trait;
use chrono::Utc;
use std::error::Error;
use std::path::{Path, PathBuf};
use storefront::storage::MediaStorage;
use tracing::{debug, info};
use uuid::Uuid;

/// Filesystem-backed object storage for product images. Files are written
/// under a media root and served by URL from a configured public base.
pub struct FsMediaStorage {
    root: PathBuf,
    public_base_url: String,
}

impl FsMediaStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn object_name(filename: &str) -> String {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()));
        let stem = format!("{}-{}", Utc::now().timestamp_millis(), Uuid::new_v4().simple());
        match extension {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem,
        }
    }
}

#[async_trait]
impl MediaStorage for FsMediaStorage {
    async fn upload(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        tokio::fs::create_dir_all(&self.root).await?;
        let name = Self::object_name(filename);
        tokio::fs::write(self.root.join(&name), bytes).await?;
        info!("Stored media object {} ({} bytes)", name, bytes.len());
        Ok(format!("{}/{}", self.public_base_url, name))
    }

    async fn delete(&self, url: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let prefix = format!("{}/", self.public_base_url);
        let Some(name) = url.strip_prefix(&prefix) else {
            debug!("Ignoring delete for foreign URL {}", url);
            return Ok(());
        };
        // Generated names never contain path separators.
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return Ok(());
        }
        match tokio::fs::remove_file(self.root.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
