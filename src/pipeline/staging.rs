use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::PipelineError;

/// An upload written to the staging directory for the length of one request.
///
/// The file is deleted when the guard is dropped, whichever way the request
/// ends.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    name: String,
}

impl StagedUpload {
    /// Write `bytes` under a request-unique name in `dir`.
    pub fn create(dir: &Path, name: &str, bytes: &[u8]) -> Result<Self, PipelineError> {
        let path = dir.join(format!("{}_{}", Uuid::new_v4().simple(), name));
        if let Err(e) = std::fs::write(&path, bytes) {
            // a partial write may have left a file behind
            let _ = std::fs::remove_file(&path);
            return Err(PipelineError::io(path, e));
        }
        debug!("Staged {} at {}", name, path.display());
        Ok(StagedUpload {
            path,
            name: name.to_string(),
        })
    }

    /// The sanitized name the upload arrived with.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn read(&self) -> Result<Vec<u8>, PipelineError> {
        std::fs::read(&self.path).map_err(|e| PipelineError::io(&self.path, e))
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed staged upload {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove staged upload {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
