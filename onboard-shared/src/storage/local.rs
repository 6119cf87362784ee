/// Local filesystem implementation of [`FileStore`]

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{resolve_mime_type, sanitize_file_name, FileStore, StorageError, StoredFile};

/// Stores files as `{root}/{company_id}_{file_name}`
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    /// Creates a store rooted at `root`; the directory is created on first save
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a given company's upload would be stored at
    pub fn path_for(&self, company_id: Uuid, original_name: &str) -> Result<PathBuf, StorageError> {
        let base = sanitize_file_name(original_name)?;
        Ok(self.root.join(format!("{}_{}", company_id, base)))
    }
}

async fn write_file(path: &Path, reader: &mut (dyn AsyncRead + Unpin + Send)) -> std::io::Result<u64> {
    let mut file = fs::File::create(path).await?;
    let size = tokio::io::copy(reader, &mut file).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(size)
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(
        &self,
        company_id: Uuid,
        original_name: &str,
        content_type: Option<&str>,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<StoredFile, StorageError> {
        let path = self.path_for(company_id, original_name)?;
        fs::create_dir_all(&self.root).await?;

        let size = match write_file(&path, reader).await {
            Ok(size) => size,
            Err(e) => {
                if let Err(remove_err) = fs::remove_file(&path).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %path.display(), error = %remove_err, "Failed to remove partial upload");
                    }
                }
                return Err(e.into());
            }
        };

        let mime_type = resolve_mime_type(original_name, content_type);

        debug!(
            company_id = %company_id,
            path = %path.display(),
            size,
            mime_type = %mime_type,
            "Stored document"
        );

        Ok(StoredFile {
            path: path.to_string_lossy().into_owned(),
            size,
            mime_type,
        })
    }

    async fn remove(&self, path: &str) -> Result<(), StorageError> {
        fs::remove_file(path).await?;
        debug!(path, "Removed document");
        Ok(())
    }
}
