//! PDF introspection: first-page width and height in points.
//!
//! This is the only thing the pipeline needs from the input PDF — the
//! overlay document is typeset at exactly the original page size so the
//! included pages are never scaled. `lopdf` parses the document structure
//! without rendering anything, which is all that is required here.
//!
//! MediaBox is an inheritable page attribute: a page that does not carry
//! one defers to its ancestors in the page tree, so the reader walks the
//! `Parent` chain. Coordinates may be integers, reals, or indirect
//! references; all three occur in the wild.

use crate::error::BibstampError;
use lopdf::{Document, Object, ObjectId};
use std::path::Path;
use tracing::debug;

/// First-page dimensions of the input PDF, in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
}

/// Read the first page's geometry from a PDF file.
pub fn read_geometry(path: &Path) -> Result<PageGeometry, BibstampError> {
    let fail = |detail: String| BibstampError::Introspection {
        path: path.to_path_buf(),
        detail,
    };

    let document = Document::load(path).map_err(|e| fail(e.to_string()))?;
    let pages = document.get_pages();
    debug!(pages = pages.len(), "PDF loaded");

    let (_, &first) = pages
        .iter()
        .next()
        .ok_or_else(|| fail("document has no pages".into()))?;

    let rect = media_box(&document, first)
        .ok_or_else(|| fail("first page has no readable MediaBox".into()))?;

    let width = (rect[2] - rect[0]).abs();
    let height = (rect[3] - rect[1]).abs();
    if width == 0.0 || height == 0.0 {
        return Err(fail(format!("degenerate MediaBox {rect:?}")));
    }

    debug!(width, height, "First-page geometry read");
    Ok(PageGeometry { width, height })
}

/// Find the MediaBox for a page, walking up the page tree when inherited.
///
/// The depth bound guards against cyclic `Parent` chains in broken files.
fn media_box(doc: &Document, page: ObjectId) -> Option<[f64; 4]> {
    let mut dict = doc.get_dictionary(page).ok()?;
    for _ in 0..32 {
        if let Ok(obj) = dict.get(b"MediaBox") {
            return rect_values(doc, obj);
        }
        let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
        dict = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Decode a rectangle array, resolving an indirect reference if needed.
fn rect_values(doc: &Document, obj: &Object) -> Option<[f64; 4]> {
    let resolved = match obj {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let array = resolved.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }

    let mut rect = [0.0f64; 4];
    for (slot, value) in rect.iter_mut().zip(array) {
        *slot = number(doc, value)?;
    }
    Some(rect)
}

fn number(doc: &Document, obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        Object::Reference(id) => number(doc, doc.get_object(*id).ok()?),
        _ => None,
    }
}
