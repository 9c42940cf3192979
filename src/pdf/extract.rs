use tracing::debug;

use crate::error::AssemblyError;
use crate::page_range::PageSpec;
use crate::pdf::{OutputDocument, SourceDocument};

/// Build a new document holding the pages of `spec`, in ascending order.
///
/// Pages that don't exist in `doc` are skipped, like the parser does.
pub fn extract_pages(
    doc: &SourceDocument,
    spec: &PageSpec,
) -> Result<OutputDocument, AssemblyError> {
    let mut output = OutputDocument::new();

    for &number in spec.pages() {
        match doc.page(number) {
            Some(page) => output.append(&page)?,
            None => debug!(
                "Skipping page {} (document has {} pages)",
                number,
                doc.page_count()
            ),
        }
    }

    if output.page_count() == 0 {
        return Err(AssemblyError::EmptyResult { skipped: vec![] });
    }
    Ok(output)
}
