use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Errors from turning page-spec text into a [`PageSpec`](crate::page_range::PageSpec).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Token is neither `N` nor `A-B`
    #[error("invalid page number or range: '{0}'")]
    MalformedToken(String),

    /// Range whose start is past its end, e.g. `5-2`
    #[error("invalid page range '{token}': start {start} is greater than end {end}")]
    InvalidRange { token: String, start: u64, end: u64 },

    /// Nothing left after bounds filtering, or the spec was blank
    #[error("no pages selected")]
    NoPagesSelected,
}

/// Errors raised by the lopdf-backed document codec.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("failed to open PDF: {0}")]
    Open(String),

    /// The input bytes never arrived, e.g. a merge path that doesn't exist
    #[error("failed to read PDF: {0}")]
    Read(String),

    #[error("failed to write PDF: {0}")]
    Write(String),

    #[error("refusing to write a PDF with no pages")]
    EmptyDocument,
}

/// An input the merger could not use, kept for caller-visible reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedInput {
    pub name: String,
    pub reason: String,
}

/// Errors from the page extractor and the document merger.
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// Zero pages ended up in the output document
    #[error("no pages to write")]
    EmptyResult { skipped: Vec<SkippedInput> },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Failures of one extract or merge request, as reported by the orchestrator.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Missing file, empty file name or disallowed extension
    #[error("invalid file: {0}")]
    InvalidFile(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("no pages to write{}", format_skipped(skipped))]
    EmptyResult { skipped: Vec<SkippedInput> },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A fault nothing else classified, caught at the orchestrator boundary
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the request itself was at fault, as opposed to the system.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFile(_) | Self::Parse(_) | Self::EmptyResult { .. }
        )
    }
}

impl From<AssemblyError> for PipelineError {
    fn from(err: AssemblyError) -> Self {
        match err {
            AssemblyError::EmptyResult { skipped } => Self::EmptyResult { skipped },
            AssemblyError::Codec(e) => Self::Codec(e),
        }
    }
}

fn format_skipped(skipped: &[SkippedInput]) -> String {
    if skipped.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = skipped.iter().map(|s| s.name.as_str()).collect();
    format!(" (skipped unreadable input(s): {})", names.join(", "))
}

/// Errors reading a local file into an [`Upload`](crate::upload::Upload).
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is {size} bytes, larger than the {limit} byte upload limit", path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
