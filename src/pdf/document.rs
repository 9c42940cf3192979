use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::error::CodecError;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

static NEXT_SOURCE_KEY: AtomicU64 = AtomicU64::new(1);

/// An opened input PDF. Dropping it frees the parsed object graph.
pub struct SourceDocument {
    doc: Document,
    key: u64,
}

impl SourceDocument {
    pub fn open(bytes: &[u8]) -> Result<Self, CodecError> {
        let doc = Document::load_mem(bytes).map_err(|e| CodecError::Open(e.to_string()))?;
        Ok(SourceDocument {
            doc,
            key: NEXT_SOURCE_KEY.fetch_add(1, Ordering::Relaxed),
        })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// All pages in document order.
    pub fn pages(&self) -> Vec<PageHandle<'_>> {
        // get_pages is keyed by 1-based page number, so it iterates in order
        self.doc
            .get_pages()
            .into_iter()
            .map(|(number, id)| PageHandle {
                source: self,
                id,
                number,
            })
            .collect()
    }

    /// The page with the given 1-based number, if it exists.
    pub fn page(&self, number: u32) -> Option<PageHandle<'_>> {
        self.doc
            .get_pages()
            .get(&number)
            .map(|&id| PageHandle {
                source: self,
                id,
                number,
            })
    }

    fn is_page_tree_node(&self, id: ObjectId) -> bool {
        self.doc
            .get_dictionary(id)
            .ok()
            .and_then(|dict| dict.get(b"Type").ok())
            .and_then(|ty| ty.as_name().ok())
            .is_some_and(|name| name == b"Pages" || name == b"Page")
    }

    /// The page dictionary with inherited attributes copied down onto it.
    fn flattened_page(&self, id: ObjectId) -> Result<Dictionary, CodecError> {
        let mut page = self
            .doc
            .get_dictionary(id)
            .map_err(|e| CodecError::Open(format!("page object {id:?}: {e}")))?
            .clone();

        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        let mut depth = 0;
        while let Some(parent_id) = parent {
            // malformed trees can loop
            depth += 1;
            if depth > 64 {
                break;
            }
            let Ok(node) = self.doc.get_dictionary(parent_id) else {
                break;
            };
            for key in INHERITABLE_KEYS {
                if !page.has(key) {
                    if let Ok(value) = node.get(key) {
                        page.set(key, value.clone());
                    }
                }
            }
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        }

        page.remove(b"Parent");
        Ok(page)
    }
}

/// A page of a [`SourceDocument`]; it cannot outlive the document it came from.
#[derive(Clone, Copy)]
pub struct PageHandle<'a> {
    source: &'a SourceDocument,
    id: ObjectId,
    number: u32,
}

impl PageHandle<'_> {
    /// 1-based page number within the source document.
    pub fn number(&self) -> u32 {
        self.number
    }
}

/// A PDF under construction. Pages are only ever appended.
pub struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    /// (source key, source object id) -> object id in `doc`
    imported: HashMap<(u64, ObjectId), ObjectId>,
}

impl OutputDocument {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        OutputDocument {
            doc,
            pages_id,
            kids: Vec::new(),
            imported: HashMap::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Copy a page and every object it depends on into this document.
    ///
    /// Objects are duplicated, never shared with the source. Objects that
    /// several pages of one source have in common (fonts, images) are copied
    /// only once per output document.
    pub fn append(&mut self, page: &PageHandle<'_>) -> Result<(), CodecError> {
        let source = page.source;
        let mut page_dict = source.flattened_page(page.id)?;
        page_dict.set("Parent", Object::Reference(self.pages_id));

        let new_page_id = self.doc.new_object_id();
        self.imported.insert((source.key, page.id), new_page_id);

        let mut pending = Vec::new();
        let mut root = Object::Dictionary(page_dict);
        self.remap_references(source, &mut root, &mut pending);
        self.doc.objects.insert(new_page_id, root);

        let mut copied = 1;
        while let Some((old_id, new_id)) = pending.pop() {
            let mut object = source.doc.get_object(old_id).cloned().unwrap_or(Object::Null);
            self.remap_references(source, &mut object, &mut pending);
            self.doc.objects.insert(new_id, object);
            copied += 1;
        }

        debug!(
            "Copied page {} with {} object(s) as output page {}",
            page.number(),
            copied,
            self.kids.len() + 1
        );
        self.kids.push(new_page_id);
        Ok(())
    }

    /// Rewrite every reference inside `object` into this document's id space,
    /// queueing objects seen for the first time on `pending`.
    fn remap_references(
        &mut self,
        source: &SourceDocument,
        object: &mut Object,
        pending: &mut Vec<(ObjectId, ObjectId)>,
    ) {
        match object {
            Object::Reference(id) => {
                let old_id = *id;
                let key = (source.key, old_id);
                *object = if let Some(&new_id) = self.imported.get(&key) {
                    Object::Reference(new_id)
                } else if source.is_page_tree_node(old_id) {
                    // a page that isn't (yet) in this output, or a Pages node
                    Object::Null
                } else {
                    let new_id = self.doc.new_object_id();
                    self.imported.insert(key, new_id);
                    pending.push((old_id, new_id));
                    Object::Reference(new_id)
                };
            }
            Object::Array(items) => {
                for item in items {
                    self.remap_references(source, item, pending);
                }
            }
            Object::Dictionary(dict) => {
                for (_, value) in dict.iter_mut() {
                    self.remap_references(source, value, pending);
                }
            }
            Object::Stream(stream) => {
                for (_, value) in stream.dict.iter_mut() {
                    self.remap_references(source, value, pending);
                }
            }
            _ => {}
        }
    }

    /// Serialize to PDF bytes. A document without pages is never written.
    pub fn finalize(mut self) -> Result<Vec<u8>, CodecError> {
        if self.kids.is_empty() {
            return Err(CodecError::EmptyDocument);
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(self.kids.len() as i64)),
            (
                "Kids",
                Object::Array(self.kids.iter().map(|&id| Object::Reference(id)).collect()),
            ),
        ]);
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]);
        let catalog_id = self.doc.add_object(catalog);
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| CodecError::Write(e.to_string()))?;
        Ok(buffer)
    }
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{build_pdf, page_text, FixturePage};

    #[test]
    fn test_open_rejects_garbage() {
        assert!(matches!(
            SourceDocument::open(b"definitely not a pdf"),
            Err(CodecError::Open(_))
        ));
    }

    #[test]
    fn test_page_count_and_order() {
        let bytes = build_pdf(&FixturePage::numbered(4));
        let doc = SourceDocument::open(&bytes).unwrap();
        assert_eq!(doc.page_count(), 4);
        let numbers: Vec<u32> = doc.pages().iter().map(PageHandle::number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert!(doc.page(5).is_none());
        assert!(doc.page(0).is_none());
    }

    #[test]
    fn test_finalize_empty_document() {
        assert!(matches!(
            OutputDocument::new().finalize(),
            Err(CodecError::EmptyDocument)
        ));
    }

    #[test]
    fn test_append_copies_content() {
        let bytes = build_pdf(&FixturePage::numbered(3));
        let doc = SourceDocument::open(&bytes).unwrap();

        let mut output = OutputDocument::new();
        output.append(&doc.page(3).unwrap()).unwrap();
        output.append(&doc.page(1).unwrap()).unwrap();
        assert_eq!(output.page_count(), 2);

        let written = Document::load_mem(&output.finalize().unwrap()).unwrap();
        assert_eq!(written.get_pages().len(), 2);
        assert_eq!(page_text(&written, 1), "Page 3");
        assert_eq!(page_text(&written, 2), "Page 1");
    }

    #[test]
    fn test_inherited_attributes_are_flattened() {
        let bytes = build_pdf(&FixturePage::numbered(2));
        let doc = SourceDocument::open(&bytes).unwrap();

        let mut output = OutputDocument::new();
        output.append(&doc.page(2).unwrap()).unwrap();
        let written = Document::load_mem(&output.finalize().unwrap()).unwrap();

        let page_id = written.get_pages()[&1];
        let page = written.get_dictionary(page_id).unwrap();
        // the fixture only sets these on the Pages node
        assert!(page.has(b"MediaBox"));
        let resources = page.get(b"Resources").unwrap();
        let resources = match resources {
            Object::Reference(id) => written.get_dictionary(*id).unwrap(),
            other => other.as_dict().unwrap(),
        };
        assert!(resources.has(b"Font"));
    }

    #[test]
    fn test_shared_objects_copied_once() {
        let bytes = build_pdf(&FixturePage::numbered(3));
        let doc = SourceDocument::open(&bytes).unwrap();

        let mut one_page = OutputDocument::new();
        one_page.append(&doc.page(1).unwrap()).unwrap();
        let single = one_page.doc.objects.len();

        let mut output = OutputDocument::new();
        for page in doc.pages() {
            output.append(&page).unwrap();
        }
        // each extra page adds only its page dict and content stream
        assert_eq!(output.doc.objects.len(), single + 2 * 2);
    }

    #[test]
    fn test_parent_tree_not_dragged_along() {
        let bytes = build_pdf(&FixturePage::numbered(5));
        let doc = SourceDocument::open(&bytes).unwrap();

        let mut output = OutputDocument::new();
        output.append(&doc.page(4).unwrap()).unwrap();
        let written = Document::load_mem(&output.finalize().unwrap()).unwrap();

        assert_eq!(written.get_pages().len(), 1);
        let page_objects = written
            .objects
            .values()
            .filter(|o| {
                o.as_dict()
                    .and_then(|d| d.get(b"Type"))
                    .and_then(|t| t.as_name())
                    .is_ok_and(|n| n == b"Page")
            })
            .count();
        assert_eq!(page_objects, 1);
    }
}
