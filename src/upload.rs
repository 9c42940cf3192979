use std::path::Path;

use tracing::warn;

use crate::error::{SkippedInput, UploadError};

/// One received file, as handed from a front end to the orchestrator.
///
/// `file_name` must already be sanitized (see [`sanitize_file_name`]).
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Read a local file as an upload, enforcing the upload size limit.
    pub fn from_path<P: AsRef<Path>>(path: P, max_bytes: u64) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let read_error = |source| UploadError::Read {
            path: path.to_path_buf(),
            source,
        };

        let size = std::fs::metadata(path).map_err(read_error)?.len();
        if size > max_bytes {
            return Err(UploadError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: max_bytes,
            });
        }

        let bytes = std::fs::read(path).map_err(read_error)?;
        Ok(Upload {
            file_name: file_name_of(path),
            bytes,
        })
    }
}

/// Read the files of a merge batch, in order.
///
/// A file that can't be read is passed on as a [`SkippedInput`] so the merge
/// can go ahead without it. A file over the size limit rejects the batch.
pub fn read_merge_batch<P: AsRef<Path>>(
    paths: &[P],
    max_bytes: u64,
) -> Result<Vec<Result<Upload, SkippedInput>>, UploadError> {
    let mut batch = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        match Upload::from_path(path, max_bytes) {
            Ok(upload) => batch.push(Ok(upload)),
            Err(UploadError::Read { source, .. }) => {
                warn!("Cannot read {}: {}", path.display(), source);
                batch.push(Err(SkippedInput {
                    name: file_name_of(path),
                    reason: source.to_string(),
                }));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(batch)
}

fn file_name_of(path: &Path) -> String {
    let raw_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    sanitize_file_name(&raw_name)
}

/// Reduce an untrusted file name to a safe single path component.
///
/// Keeps ASCII letters, digits, `.`, `-` and `_`; whitespace becomes `_`.
/// An empty input stays empty so callers can reject it; a name whose stem
/// vanishes entirely (e.g. non-ASCII) becomes `upload.<ext>`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if base.is_empty() {
        return String::new();
    }

    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (base, None),
    };

    let mut stem = clean_component(stem);
    if stem.is_empty() {
        stem = "upload".to_string();
    }
    match ext.map(clean_component).filter(|e| !e.is_empty()) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

fn clean_component(s: &str) -> String {
    let joined = s.split_whitespace().collect::<Vec<_>>().join("_");
    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}
