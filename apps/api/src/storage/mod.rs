//! Resume file storage: a flat upload directory addressed by generated
//! filenames, plus PDF text extraction.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

pub mod extract;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),
}

/// Where uploaded resumes live. Carried in `AppState` as
/// `Arc<dyn ResumeStorage>`.
#[async_trait]
pub trait ResumeStorage: Send + Sync {
    /// Stores `data` under a freshly generated name and returns that name.
    async fn save(&self, data: Bytes, extension: &str) -> Result<String, StorageError>;

    /// Reads a stored file. `Ok(None)` means the file does not exist.
    async fn read(&self, filename: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Removes a stored file. Removing a missing file is not an error.
    async fn delete(&self, filename: &str) -> Result<(), StorageError>;
}

/// Stores resumes as plain files in one directory.
#[derive(Debug, Clone)]
pub struct LocalResumeStorage {
    dir: PathBuf,
}

impl LocalResumeStorage {
    /// Creates the upload directory if it does not exist yet.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        info!("Resume uploads stored in {}", dir.display());
        Ok(Self { dir })
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf, StorageError> {
        let valid = !filename.is_empty()
            && Path::new(filename).file_name().and_then(|n| n.to_str()) == Some(filename)
            && filename != ".."
            && filename != ".";
        if !valid {
            return Err(StorageError::InvalidName(filename.to_string()));
        }
        Ok(self.dir.join(filename))
    }
}

#[async_trait]
impl ResumeStorage for LocalResumeStorage {
    async fn save(&self, data: Bytes, extension: &str) -> Result<String, StorageError> {
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StorageError::InvalidName(format!("extension '{extension}'")));
        }
        let filename = format!("{}.{}", Uuid::new_v4(), extension.to_lowercase());
        tokio::fs::write(self.path_for(&filename)?, &data).await?;
        debug!("Stored {} bytes as {filename}", data.len());
        Ok(filename)
    }

    async fn read(&self, filename: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match tokio::fs::read(self.path_for(filename)?).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, filename: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(filename)?).await {
            Ok(()) => {
                debug!("Deleted {filename}");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
