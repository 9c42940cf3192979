use tracing::{debug, warn};

use crate::error::{AssemblyError, CodecError, SkippedInput};
use crate::pdf::{OutputDocument, SourceDocument};

/// One input of a merge: a document, or the reason it could not be opened.
pub struct MergeInput {
    pub name: String,
    pub document: Result<SourceDocument, CodecError>,
}

pub struct MergeOutcome {
    pub document: OutputDocument,
    pub total_pages: usize,
    /// Names of the inputs whose pages made it into `document`
    pub merged: Vec<String>,
    pub skipped: Vec<SkippedInput>,
}

/// Concatenate every page of every input, in input order.
///
/// Inputs that failed to open are skipped and reported in
/// [`MergeOutcome::skipped`]; the merge only fails when no page at all could
/// be copied.
pub fn merge_documents(inputs: Vec<MergeInput>) -> Result<MergeOutcome, AssemblyError> {
    let mut document = OutputDocument::new();
    let mut merged = Vec::new();
    let mut skipped = Vec::new();

    for input in inputs {
        let source = match input.document {
            Ok(source) => source,
            Err(e) => {
                warn!("Skipping {}: {}", input.name, e);
                skipped.push(SkippedInput {
                    name: input.name,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let pages = source.pages();
        for page in &pages {
            document.append(page)?;
        }
        debug!("Merged {} page(s) from {}", pages.len(), input.name);
        merged.push(input.name);
    }

    let total_pages = document.page_count();
    if total_pages == 0 {
        return Err(AssemblyError::EmptyResult { skipped });
    }

    Ok(MergeOutcome {
        document,
        total_pages,
        merged,
        skipped,
    })
}
