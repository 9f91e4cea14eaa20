// Local filesystem adapter - File system operations on the host file system

use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use crate::domain::errors::*;
use crate::ports::*;

/// Host filesystem adapter
#[derive(Debug, Default)]
pub struct FsLocalAdapter;

impl FsLocalAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FsPort for FsLocalAdapter {
    async fn file_exists(&self, path: &Path) -> Result<bool, DomainError> {
        match fs::metadata(path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DomainError::FsFail(format!(
                "Failed to stat {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn file_size(&self, path: &Path) -> Result<u64, DomainError> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|e| DomainError::FsFail(format!("Failed to get file size: {}", e)))?;
        Ok(metadata.len())
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), DomainError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| DomainError::FsFail(format!("Failed to create directory: {}", e)))
    }

    async fn ensure_writable(&self, path: &Path) -> Result<(), DomainError> {
        let dir = path.to_path_buf();
        // Probe with a real file; permission bits alone miss read-only mounts
        tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(".splitx-probe")
                .tempfile_in(&dir)
                .map(drop)
        })
        .await
        .map_err(|e| DomainError::FsFail(format!("Write check did not complete: {}", e)))?
        .map_err(|e| DomainError::FsFail(format!("Directory is not writable: {}", e)))
    }
}
