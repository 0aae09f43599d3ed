use std::io;
use std::path::Path;

use crate::models::UploadedAsset;

/// Removes a transient upload. Returns `Ok(false)` when the file was already gone.
pub fn remove_transient(path: &Path) -> io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Owns an [`UploadedAsset`] for the lifetime of one request and deletes the file when released or dropped.
#[derive(Debug)]
pub struct TransientAsset {
    asset: UploadedAsset,
    released: bool,
}

impl TransientAsset {
    pub fn new(asset: UploadedAsset) -> Self {
        Self {
            asset,
            released: false,
        }
    }

    pub fn asset(&self) -> &UploadedAsset {
        &self.asset
    }

    pub fn path(&self) -> &Path {
        &self.asset.path
    }

    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.path()).await
    }

    /// Deletes the file now. Failures are logged, never returned.
    pub async fn release(mut self) {
        match tokio::fs::remove_file(&self.asset.path).await {
            Ok(()) => log::debug!("🧹 Removed transient upload {}", self.asset.id),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("Transient upload {} was already removed", self.asset.id)
            }
            Err(e) => log::warn!(
                "⚠️  Failed to remove transient upload {}: {}",
                self.asset.path.display(),
                e
            ),
        }
        self.released = true;
    }
}

impl Drop for TransientAsset {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        // Only reached on early return or cancellation. The file must be gone once the
        // guard is, so the single unlink runs inline even on a runtime worker.
        match remove_transient(&self.asset.path) {
            Ok(true) => log::debug!("🧹 Removed abandoned upload {}", self.asset.id),
            Ok(false) => {}
            Err(e) => log::warn!(
                "⚠️  Failed to remove abandoned upload {}: {}",
                self.asset.path.display(),
                e
            ),
        }
    }
}
