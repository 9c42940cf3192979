use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Settings handed to the [`Orchestrator`](crate::pipeline::Orchestrator) when it is built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where uploads are staged while a request runs
    pub upload_dir: PathBuf,
    /// Where finished documents are written
    pub output_dir: PathBuf,
    /// Enforced by the upload layer, before the core sees the bytes
    pub max_upload_bytes: u64,
    /// Accepted file extension, compared case-insensitively
    pub allowed_extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("downloads"),
            max_upload_bytes: 50 * 1024 * 1024,
            allowed_extension: "pdf".to_string(),
        }
    }
}

impl Config {
    /// Load from a TOML file. Missing keys keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether `file_name` carries the allowed extension.
    pub fn accepts(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.allowed_extension))
    }
}
