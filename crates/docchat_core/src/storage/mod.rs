use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Flat on-disk store for uploaded files, keyed by sanitized filename.
/// Re-uploading the same filename overwrites the previous bytes silently.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn ensure_dirs(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.root.as_path()).map_err(|e| {
            AppError::new("UPLOAD_STORE_FAILED", "Failed to create uploads directory")
                .with_details(format!("path={}; err={}", self.root.display(), e))
        })
    }

    pub fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
        self.ensure_dirs()?;
        let name = sanitize_filename(filename)?;
        let dest = self.root.join(&name);
        let tmp = dest.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(|e| {
            AppError::new("UPLOAD_STORE_FAILED", "Failed to write uploaded file")
                .with_details(format!("path={}; err={}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &dest).map_err(|e| {
            AppError::new("UPLOAD_STORE_FAILED", "Failed to finalize uploaded file write")
                .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), dest.display(), e))
        })?;
        Ok(dest)
    }

    pub fn read(&self, filename: &str) -> Result<Vec<u8>, AppError> {
        let name = sanitize_filename(filename)?;
        let path = self.root.join(&name);
        fs::read(&path).map_err(|e| {
            AppError::new("UPLOAD_NOT_FOUND", "Uploaded file not found")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }
}

/// Reduce a client-supplied filename to its final path component and reject
/// names that would escape the uploads directory.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        return Err(AppError::new("UPLOAD_INVALID", "Filename is required"));
    }

    // Strip any directory components, whichever separator the client used.
    let last = trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim()
        .to_string();

    if last.is_empty() || last == "." || last == ".." {
        return Err(
            AppError::new("UPLOAD_INVALID", "Filename must not be a directory reference")
                .with_details(format!("filename={filename}")),
        );
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directory_components() {
        assert_eq!(sanitize_filename("report.pdf").unwrap(), "report.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_filename("a\\b\\notes.pdf").unwrap(), "notes.pdf");
        assert_eq!(sanitize_filename("  padded.pdf  ").unwrap(), "padded.pdf");
    }

    #[test]
    fn sanitize_rejects_empty_and_dot_names() {
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("   ").is_err());
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("uploads/").is_err());
    }
}
