//! Diagram extraction.
//!
//! A draw.io document (`<mxfile>`) holds one `<diagram>` element per page.
//! Only the count and identity of the pages are extracted here; the engine
//! receives the whole document and selects a page by index itself.

use log::{debug, trace};
use roxmltree::{Document, ParsingOptions};

use crate::DrawBatchError;

/// Element name of a diagram page.
const DIAGRAM_TAG: &str = "diagram";

/// One diagram page of a document, addressed by its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramDescriptor {
    index: usize,
    id: Option<String>,
    name: Option<String>,
}

impl DiagramDescriptor {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            id: None,
            name: None,
        }
    }

    /// Zero-based position in document order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The page's `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The page's `name` attribute, as shown on the editor's page tabs.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Lists the diagram pages of `source` in document order.
///
/// # Errors
///
/// Returns [`DrawBatchError::MalformedDocument`] if `source` is not
/// well-formed XML.
pub fn extract(source: &str) -> Result<Vec<DiagramDescriptor>, DrawBatchError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = Document::parse_with_options(source, options)
        .map_err(|err| DrawBatchError::new_malformed_document(err, source))?;

    let diagrams: Vec<DiagramDescriptor> = document
        .descendants()
        .filter(|node| node.is_element() && node.has_tag_name(DIAGRAM_TAG))
        .enumerate()
        .map(|(index, node)| DiagramDescriptor {
            index,
            id: node.attribute("id").map(str::to_string),
            name: node.attribute("name").map(str::to_string),
        })
        .collect();

    debug!(count = diagrams.len(); "Extracted diagrams");
    trace!(diagrams:?; "Diagram descriptors");

    Ok(diagrams)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_multi_page_document() {
        let source = r#"<mxfile host="app.diagrams.net">
            <diagram id="a1" name="Overview"><mxGraphModel/></diagram>
            <diagram id="b2" name="Details">7VbbbtswDP0aPw7wJXGSxzZp2g</diagram>
            <diagram id="c3"><mxGraphModel/></diagram>
        </mxfile>"#;

        let diagrams = extract(source).unwrap();

        assert_eq!(diagrams.len(), 3);
        let indices: Vec<usize> = diagrams.iter().map(DiagramDescriptor::index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(diagrams[0].name(), Some("Overview"));
        assert_eq!(diagrams[1].id(), Some("b2"));
        assert_eq!(diagrams[2].name(), None);
    }

    #[test]
    fn test_extract_nested_diagrams_in_document_order() {
        let source = r#"<root><group><diagram name="first"/></group><diagram name="second"/></root>"#;

        let diagrams = extract(source).unwrap();

        assert_eq!(diagrams.len(), 2);
        assert_eq!(diagrams[0].name(), Some("first"));
        assert_eq!(diagrams[1].name(), Some("second"));
    }

    #[test]
    fn test_extract_document_without_diagrams() {
        let diagrams = extract("<mxGraphModel><root/></mxGraphModel>").unwrap();
        assert!(diagrams.is_empty());
    }

    #[test]
    fn test_extract_tolerates_doctype() {
        let source = r#"<?xml version="1.0"?>
<!DOCTYPE mxfile>
<mxfile><diagram name="only"/></mxfile>"#;

        assert_eq!(extract(source).unwrap().len(), 1);
    }

    #[test]
    fn test_extract_malformed_document() {
        let source = "<mxfile><diagram></mxfile>";

        let err = extract(source).unwrap_err();

        match err {
            DrawBatchError::MalformedDocument { src, .. } => assert_eq!(src, source),
            other => panic!("Expected MalformedDocument, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_non_xml_text() {
        assert!(matches!(
            extract("this is not a diagram"),
            Err(DrawBatchError::MalformedDocument { .. })
        ));
    }
}
