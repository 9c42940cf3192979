//! Request lifecycle for extract and merge.
//!
//! The orchestrator is the only part of the crate that touches the
//! filesystem. Each request stages its uploads under unique names, runs the
//! range parser, extractor or merger, writes the result under a unique output
//! name, and releases every staged upload on the way out, whether the request
//! succeeded, failed, or panicked inside the codec.

mod staging;

pub use staging::StagedUpload;

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{CodecError, ParseError, PipelineError, SkippedInput};
use crate::page_range::PageSpec;
use crate::pdf::{extract_pages, merge_documents, MergeInput, SourceDocument};
use crate::upload::Upload;

#[derive(Debug, Clone, Serialize)]
pub struct ExtractReport {
    pub output_name: String,
    pub output_path: PathBuf,
    pub page_count: usize,
}

impl ExtractReport {
    pub fn message(&self) -> String {
        format!(
            "Extracted {} page(s) to {}",
            self.page_count,
            self.output_path.display()
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub output_name: String,
    pub output_path: PathBuf,
    pub total_pages: usize,
    pub merged: Vec<String>,
    pub skipped: Vec<SkippedInput>,
}

impl MergeReport {
    pub fn message(&self) -> String {
        let mut message = format!(
            "Merged {} file(s) ({} pages) into {}",
            self.merged.len(),
            self.total_pages,
            self.output_path.display()
        );
        if !self.skipped.is_empty() {
            let skipped: Vec<String> = self
                .skipped
                .iter()
                .map(|s| format!("{} ({})", s.name, s.reason))
                .collect();
            message.push_str(&format!("; skipped {}", skipped.join(", ")));
        }
        message
    }
}

#[derive(Debug)]
pub struct Orchestrator {
    config: Config,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        Orchestrator { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extract the pages selected by `pages` from `upload` into a new PDF.
    pub fn extract(
        &self,
        upload: Option<Upload>,
        pages: &str,
    ) -> Result<ExtractReport, PipelineError> {
        let name = upload
            .as_ref()
            .map(|u| u.file_name.clone())
            .unwrap_or_default();
        let result = catch_faults(|| self.run_extract(upload, pages));
        match &result {
            Ok(report) => info!("{}", report.message()),
            Err(e) => log_failure("extract", &name, e),
        }
        result
    }

    /// Concatenate every page of `uploads`, in order, into one PDF.
    ///
    /// Uploads with an empty name are ignored. Entries the front end could not
    /// read, and uploads that aren't readable PDFs, are skipped and listed in
    /// the report.
    pub fn merge(
        &self,
        uploads: Vec<Result<Upload, SkippedInput>>,
    ) -> Result<MergeReport, PipelineError> {
        let names: Vec<String> = uploads
            .iter()
            .map(|u| entry_name(u).to_string())
            .collect();
        let result = catch_faults(|| self.run_merge(uploads));
        match &result {
            Ok(report) => info!("{}", report.message()),
            Err(e) => log_failure("merge", &names.join(", "), e),
        }
        result
    }

    fn run_extract(
        &self,
        upload: Option<Upload>,
        pages: &str,
    ) -> Result<ExtractReport, PipelineError> {
        let upload = upload.ok_or_else(|| PipelineError::InvalidFile("no file selected".into()))?;
        self.validate_name(&upload.file_name)?;
        if pages.trim().is_empty() {
            return Err(ParseError::NoPagesSelected.into());
        }

        let staged =
            StagedUpload::create(&self.config.upload_dir, &upload.file_name, &upload.bytes)?;
        drop(upload);

        let source = SourceDocument::open(&staged.read()?)?;
        let spec = PageSpec::parse(pages, source.page_count())?;
        let output = extract_pages(&source, &spec)?;
        let page_count = output.page_count();
        let bytes = output.finalize()?;

        let output_name = format!(
            "extracted_{}_{}.pdf",
            file_stem(staged.name()),
            Uuid::new_v4().simple()
        );
        drop(source);
        drop(staged);

        let output_path = self.write_output(&output_name, &bytes)?;
        Ok(ExtractReport {
            output_name,
            output_path,
            page_count,
        })
    }

    fn run_merge(
        &self,
        uploads: Vec<Result<Upload, SkippedInput>>,
    ) -> Result<MergeReport, PipelineError> {
        if uploads.iter().all(|u| entry_name(u).is_empty()) {
            return Err(PipelineError::InvalidFile("no file selected".into()));
        }

        // any early return drops (and deletes) everything staged so far
        let mut staged = Vec::with_capacity(uploads.len());
        for entry in uploads {
            if entry_name(&entry).is_empty() {
                continue;
            }
            self.validate_name(entry_name(&entry))?;
            staged.push(match entry {
                Ok(upload) => Ok(StagedUpload::create(
                    &self.config.upload_dir,
                    &upload.file_name,
                    &upload.bytes,
                )?),
                Err(unread) => Err(unread),
            });
        }

        let mut inputs = Vec::with_capacity(staged.len());
        for entry in &staged {
            inputs.push(match entry {
                Ok(upload) => MergeInput {
                    name: upload.name().to_string(),
                    document: SourceDocument::open(&upload.read()?),
                },
                Err(unread) => MergeInput {
                    name: unread.name.clone(),
                    document: Err(CodecError::Read(unread.reason.clone())),
                },
            });
        }

        let outcome = merge_documents(inputs)?;
        let bytes = outcome.document.finalize()?;
        drop(staged);

        let output_name = format!("merged_{}.pdf", Uuid::new_v4().simple());
        let output_path = self.write_output(&output_name, &bytes)?;
        Ok(MergeReport {
            output_name,
            output_path,
            total_pages: outcome.total_pages,
            merged: outcome.merged,
            skipped: outcome.skipped,
        })
    }

    fn validate_name(&self, file_name: &str) -> Result<(), PipelineError> {
        if file_name.is_empty() {
            return Err(PipelineError::InvalidFile("no file selected".into()));
        }
        if !self.config.accepts(file_name) {
            return Err(PipelineError::InvalidFile(format!(
                "{}: only .{} files are accepted",
                file_name, self.config.allowed_extension
            )));
        }
        Ok(())
    }

    fn write_output(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, PipelineError> {
        let path = self.config.output_dir.join(name);
        if let Err(e) = std::fs::write(&path, bytes) {
            let _ = std::fs::remove_file(&path);
            return Err(PipelineError::io(path, e));
        }
        Ok(path)
    }
}

fn entry_name(entry: &Result<Upload, SkippedInput>) -> &str {
    match entry {
        Ok(upload) => &upload.file_name,
        Err(unread) => &unread.name,
    }
}

fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
}

/// Run one request, turning a panic into [`PipelineError::Unexpected`].
///
/// Staged uploads are guards, so unwinding out of `f` still deletes them.
fn catch_faults<T>(f: impl FnOnce() -> Result<T, PipelineError>) -> Result<T, PipelineError> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic with no message".to_string());
        Err(PipelineError::Unexpected(message))
    })
}

fn log_failure(operation: &str, input: &str, err: &PipelineError) {
    if err.is_user_error() {
        warn!("{} {} rejected: {}", operation, input, err);
    } else {
        error!("{} {} failed: {}", operation, input, err);
    }
}
