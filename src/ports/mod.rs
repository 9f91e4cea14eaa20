// Ports - Interface definitions (contracts)

use std::path::Path;

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::command::EncodeCommand;

/// Port for reading video frame size and duration
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe the first video stream of a file
    async fn probe_video(&self, path: &Path) -> Result<VideoMeta, DomainError>;
}

/// Port for launching the external encoder
#[async_trait]
pub trait EncodePort: Send + Sync {
    /// Start one encoder process. Failure to start is reported here,
    /// not through the returned process.
    async fn launch(&self, command: &EncodeCommand) -> Result<Box<dyn EncodeProcess>, DomainError>;
}

/// A running encoder process
#[async_trait]
pub trait EncodeProcess: Send {
    /// Next line of merged stdout/stderr, `None` once both streams are closed
    async fn next_line(&mut self) -> Option<String>;

    /// Wait for exit and return the exit code (-1 when killed by a signal)
    async fn wait(&mut self) -> Result<i32, DomainError>;

    /// Terminate the process
    async fn kill(&mut self) -> Result<(), DomainError>;
}

/// Port for file system operations
#[async_trait]
pub trait FsPort: Send + Sync {
    /// Check if a file exists
    async fn file_exists(&self, path: &Path) -> Result<bool, DomainError>;

    /// Get file size in bytes
    async fn file_size(&self, path: &Path) -> Result<u64, DomainError>;

    /// Create a directory including parents
    async fn create_dir_all(&self, path: &Path) -> Result<(), DomainError>;

    /// Check that new files can be created inside a directory
    async fn ensure_writable(&self, path: &Path) -> Result<(), DomainError>;
}
