//! Input resolution: read a user-supplied path into memory.
//!
//! The rasterizer works on bytes, so the whole file is read up front. Path
//! problems (missing, unreadable) are reported against the path here; content
//! problems are left to the rasterizer so they surface as a
//! [`crate::error::DocumentError`] and return the run to `Idle`.

use crate::error::Pdf2PptxError;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Read the file at `path`.
pub async fn read_input(path: &Path) -> Result<Vec<u8>, Pdf2PptxError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes)
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(Pdf2PptxError::PermissionDenied {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(Pdf2PptxError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(Pdf2PptxError::Internal(format!(
            "Failed to read '{}': {e}",
            path.display()
        ))),
    }
}

/// Default output path for `input`: the fixed deck name next to the input.
pub fn default_output_path(input: &Path, file_name: &str) -> std::path::PathBuf {
    input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.join(file_name))
        .unwrap_or_else(|| std::path::PathBuf::from(file_name))
}
