/// Durable storage for uploaded registration documents
///
/// The registration workflow writes through the [`FileStore`] trait so tests
/// can substitute a store that fails on demand. [`LocalFileStore`] keeps files
/// on the local filesystem.
///
/// # Example
///
/// ```no_run
/// use onboard_shared::storage::{FileStore, LocalFileStore};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = LocalFileStore::new("uploads");
/// let mut body: &[u8] = b"%PDF-1.7";
///
/// let stored = store.save(Uuid::new_v4(), "license.pdf", None, &mut body).await?;
/// assert_eq!(stored.size, 8);
/// assert_eq!(stored.mime_type, "application/pdf");
/// # Ok(())
/// # }
/// ```

pub mod local;

pub use local::LocalFileStore;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;
use uuid::Uuid;

/// Longest final name component accepted, in bytes
///
/// Stored names gain a 37-byte `{company_id}_` prefix and must stay under the
/// usual 255-byte filesystem limit.
pub const MAX_FILE_NAME_BYTES: usize = 200;

/// MIME type used when neither the upload nor the extension says otherwise
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// File store errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading the upload or writing the file failed
    #[error("File storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The uploaded file name has no usable final component or is too long
    #[error("Invalid file name: {0:?}")]
    InvalidName(String),
}

/// Where and how a file was stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Path of the stored file, as recorded on the document row
    pub path: String,

    /// Number of bytes written
    pub size: u64,

    pub mime_type: String,
}

/// Storage backend for registration documents
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Streams `reader` into a file named after the company and the upload
    ///
    /// A file with the same company and name is overwritten. On error no
    /// partial file is left behind.
    async fn save(
        &self,
        company_id: Uuid,
        original_name: &str,
        content_type: Option<&str>,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<StoredFile, StorageError>;

    /// Deletes a previously saved file
    async fn remove(&self, path: &str) -> Result<(), StorageError>;
}

/// Reduces an uploaded file name to its final path component
///
/// Both `/` and `\` count as separators. Empty names, `.`, `..` and names
/// longer than [`MAX_FILE_NAME_BYTES`] are rejected.
pub fn sanitize_file_name(original_name: &str) -> Result<String, StorageError> {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base == "." || base == ".." || base.len() > MAX_FILE_NAME_BYTES {
        return Err(StorageError::InvalidName(original_name.to_string()));
    }

    Ok(base.to_string())
}

/// Picks the MIME type for an upload
///
/// The declared content type wins; otherwise it's guessed from the extension.
pub fn resolve_mime_type(file_name: &str, content_type: Option<&str>) -> String {
    match content_type.map(str::trim).filter(|ct| !ct.is_empty()) {
        Some(ct) => ct.to_string(),
        None => mime_guess::from_path(file_name)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
    }
}
