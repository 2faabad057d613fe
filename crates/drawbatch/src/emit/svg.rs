//! Standalone SVG output.
//!
//! The engine renders into an `<svg>` element embedded in an HTML page.
//! Lifted out of the page, that markup is missing what a standalone file
//! needs: the browser does not always serialize the root namespaces or an
//! explicit size, and HTML text blocks inside `<foreignObject>` inherit
//! their text flow from the host page. [`standalone_document`] repairs
//! both and prefixes the XML declaration.
//!
//! Text blocks are the `div`s in the XHTML namespace. The page serializer
//! writes that namespace on every HTML `div`, so a `div` with no `xmlns`
//! at all is treated the same way.

use std::{fmt, io::Cursor};

use log::debug;
use quick_xml::{
    Reader, Writer,
    events::{BytesStart, Event},
};

use super::{FormatEmitter, Frame};
use crate::{
    DrawBatchError,
    engine::{RenderEngine, RenderedSvg},
};

/// Declaration every SVG output starts with.
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" standalone=\"no\"?>\r\n";

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Freezes host-relative text flow of embedded HTML text blocks.
const TEXT_BLOCK_STYLE: &str = "white-space: nowrap; overflow: visible;";

/// Reads back the rendered `<svg>` and turns it into a standalone document.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgEmitter;

impl FormatEmitter for SvgEmitter {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn emit(&self, engine: &mut dyn RenderEngine, frame: &Frame) -> Result<Vec<u8>, DrawBatchError> {
        let svg = engine
            .rendered_svg()?
            .ok_or_else(|| DrawBatchError::Capture("page contains no rendered <svg>".to_string()))?;

        debug!(
            markup_len = svg.markup().len(),
            width = svg.width(),
            height = svg.height(),
            viewport:% = frame.viewport();
            "Read rendered SVG"
        );
        standalone_document(&svg).map(String::into_bytes)
    }
}

/// Turns rendered `<svg>` markup into a well-formed standalone document.
///
/// - the root gets `xmlns`, `xmlns:xlink`, `width` and `height` if missing;
///   size falls back to the element's used size in the page
/// - every text block gets the XHTML namespace and a style that disables
///   wrapping and clipping, once
///
/// # Errors
///
/// Returns [`DrawBatchError::Capture`] if the markup is not well-formed or
/// its root element is not `<svg>`.
pub fn standalone_document(svg: &RenderedSvg) -> Result<String, DrawBatchError> {
    let mut reader = Reader::from_str(svg.markup());
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut root_seen = false;

    loop {
        let event = reader.read_event().map_err(markup_error)?;
        match event {
            Event::Start(start) => {
                let start = rewrite_element(start, &mut root_seen, svg)?;
                writer.write_event(Event::Start(start)).map_err(markup_error)?;
            }
            Event::Empty(start) => {
                let start = rewrite_element(start, &mut root_seen, svg)?;
                writer.write_event(Event::Empty(start)).map_err(markup_error)?;
            }
            // Replaced by our own declaration.
            Event::Decl(_) | Event::DocType(_) => {}
            Event::Eof => break,
            other => writer.write_event(other).map_err(markup_error)?,
        }
    }

    if !root_seen {
        return Err(DrawBatchError::Capture(
            "rendered markup contains no elements".to_string(),
        ));
    }

    let body = String::from_utf8(writer.into_inner().into_inner()).map_err(markup_error)?;
    Ok(format!("{XML_DECLARATION}{body}"))
}

fn rewrite_element(
    start: BytesStart<'_>,
    root_seen: &mut bool,
    svg: &RenderedSvg,
) -> Result<BytesStart<'static>, DrawBatchError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = read_attributes(&start)?;

    if !*root_seen {
        *root_seen = true;
        if local_name(&name) != "svg" {
            return Err(DrawBatchError::Capture(format!(
                "expected <svg> root element, found <{name}>"
            )));
        }
        set_if_missing(&mut attributes, "xmlns", SVG_NAMESPACE);
        set_if_missing(&mut attributes, "xmlns:xlink", XLINK_NAMESPACE);
        set_if_missing(&mut attributes, "width", &svg.width().to_string());
        set_if_missing(&mut attributes, "height", &svg.height().to_string());
    } else if is_text_block(&name, &attributes) {
        set_if_missing(&mut attributes, "xmlns", XHTML_NAMESPACE);
        let style = find(&attributes, "style").unwrap_or_default();
        if !style.contains(TEXT_BLOCK_STYLE) {
            let style = append_style(style, TEXT_BLOCK_STYLE);
            set(&mut attributes, "style", &style);
        }
    } else {
        return Ok(start.into_owned());
    }

    let mut rewritten = BytesStart::new(name);
    for (key, value) in &attributes {
        rewritten.push_attribute((key.as_str(), value.as_str()));
    }
    Ok(rewritten)
}

fn read_attributes(start: &BytesStart<'_>) -> Result<Vec<(String, String)>, DrawBatchError> {
    start
        .attributes()
        .map(|attr| {
            let attr = attr.map_err(markup_error)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(markup_error)?.into_owned();
            Ok((key, value))
        })
        .collect()
}

fn is_text_block(name: &str, attributes: &[(String, String)]) -> bool {
    name == "div" && find(attributes, "xmlns").is_none_or(|ns| ns == XHTML_NAMESPACE)
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn find<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn set(attributes: &mut Vec<(String, String)>, key: &str, value: &str) {
    match attributes.iter_mut().find(|(k, _)| k == key) {
        Some((_, existing)) => *existing = value.to_string(),
        None => attributes.push((key.to_string(), value.to_string())),
    }
}

fn set_if_missing(attributes: &mut Vec<(String, String)>, key: &str, value: &str) {
    if find(attributes, key).is_none_or(str::is_empty) {
        set(attributes, key, value);
    }
}

fn append_style(style: &str, extra: &str) -> String {
    let style = style.trim();
    if style.is_empty() {
        extra.to_string()
    } else if style.ends_with(';') {
        format!("{style} {extra}")
    } else {
        format!("{style}; {extra}")
    }
}

fn markup_error(err: impl fmt::Display) -> DrawBatchError {
    DrawBatchError::Capture(format!("invalid SVG markup: {err}"))
}

#[cfg(test)]
mod tests {
    use roxmltree::Document;

    use super::*;

    const BARE_SVG: &str = concat!(
        r#"<svg viewBox="0 0 111 55"><g>"#,
        r#"<rect x="10" y="5" width="100" height="50"/>"#,
        r#"<foreignObject><div style="display: flex">A &amp; B</div></foreignObject>"#,
        r#"</g></svg>"#
    );

    /// Markup as the page serializer produces it.
    const SERIALIZED_SVG: &str = concat!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#,
        r#"<foreignObject><div xmlns="http://www.w3.org/1999/xhtml" style="display: flex;">"#,
        r#"<div xmlns="http://www.w3.org/1999/xhtml">Label</div>"#,
        r#"</div></foreignObject></svg>"#
    );

    fn standalone(markup: &str, width: f64, height: f64) -> Result<String, DrawBatchError> {
        standalone_document(&RenderedSvg::new(markup, width, height))
    }

    fn div_styles(output: &str) -> Vec<Option<String>> {
        let body = output.trim_start_matches(XML_DECLARATION);
        let document = Document::parse(body).unwrap();
        document
            .descendants()
            .filter(|node| node.has_tag_name((XHTML_NAMESPACE, "div")))
            .map(|div| div.attribute("style").map(str::to_string))
            .collect()
    }

    #[test]
    fn test_adds_missing_root_attributes() {
        let output = standalone(BARE_SVG, 111.0, 55.0).unwrap();

        assert!(output.starts_with("<?xml "));
        assert!(output.starts_with(XML_DECLARATION));

        let body = output.trim_start_matches(XML_DECLARATION);
        let document = Document::parse(body).unwrap();
        let root = document.root_element();
        assert_eq!(root.tag_name().namespace(), Some(SVG_NAMESPACE));
        assert_eq!(root.lookup_namespace_uri(Some("xlink")), Some(XLINK_NAMESPACE));
        assert_eq!(root.attribute("width"), Some("111"));
        assert_eq!(root.attribute("height"), Some("55"));
        assert!(body.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
        assert!(body.contains(r#"xmlns:xlink="http://www.w3.org/1999/xlink""#));
    }

    #[test]
    fn test_missing_size_uses_element_size() {
        let output = standalone("<svg><g/></svg>", 120.5, 80.0).unwrap();

        assert!(output.contains(r#"width="120.5""#));
        assert!(output.contains(r#"height="80""#));
    }

    #[test]
    fn test_keeps_existing_root_attributes() {
        let markup = r#"<svg xmlns="http://www.w3.org/2000/svg" width="50px" height="20px"><g/></svg>"#;

        let output = standalone(markup, 111.0, 55.0).unwrap();

        assert!(output.contains(r#"width="50px""#));
        assert!(output.contains(r#"height="20px""#));
        assert!(!output.contains(r#"width="111""#));
        assert_eq!(output.matches("xmlns=").count(), 1);
    }

    #[test]
    fn test_marks_text_blocks() {
        let output = standalone(BARE_SVG, 111.0, 55.0).unwrap();
        let body = output.trim_start_matches(XML_DECLARATION);

        let document = Document::parse(body).unwrap();
        let div = document
            .descendants()
            .find(|node| node.has_tag_name("div"))
            .unwrap();

        assert_eq!(div.tag_name().namespace(), Some(XHTML_NAMESPACE));
        assert_eq!(
            div.attribute("style"),
            Some("display: flex; white-space: nowrap; overflow: visible;")
        );
        assert_eq!(div.text(), Some("A & B"));
    }

    #[test]
    fn test_marks_serialized_xhtml_text_blocks() {
        let output = standalone(SERIALIZED_SVG, 121.0, 80.0).unwrap();

        assert_eq!(
            div_styles(&output),
            vec![
                Some("display: flex; white-space: nowrap; overflow: visible;".to_string()),
                Some("white-space: nowrap; overflow: visible;".to_string()),
            ]
        );
        assert_eq!(output.matches(XHTML_NAMESPACE).count(), 2);
    }

    #[test]
    fn test_text_block_style_is_added_once() {
        let markup = concat!(
            r#"<svg><div xmlns="http://www.w3.org/1999/xhtml" "#,
            r#"style="color: red; white-space: nowrap; overflow: visible;">x</div></svg>"#
        );

        let output = standalone(markup, 1.0, 1.0).unwrap();

        assert_eq!(output.matches("white-space").count(), 1);
        assert!(output.contains("color: red;"));
    }

    #[test]
    fn test_leaves_foreign_namespace_divs_alone() {
        let markup = r#"<svg><div xmlns="urn:example:widgets" style="color: red">x</div></svg>"#;

        let output = standalone(markup, 1.0, 1.0).unwrap();

        assert!(output.contains(r#"style="color: red""#));
        assert!(!output.contains("white-space"));
    }

    #[test]
    fn test_text_block_without_style() {
        let markup = "<svg><foreignObject><div>plain</div></foreignObject></svg>";

        let output = standalone(markup, 1.0, 1.0).unwrap();

        assert!(output.contains(r#"style="white-space: nowrap; overflow: visible;""#));
    }

    #[test]
    fn test_replaces_existing_declaration() {
        let markup = r#"<?xml version="1.0" encoding="UTF-8"?><svg><g/></svg>"#;

        let output = standalone(markup, 1.0, 1.0).unwrap();

        assert_eq!(output.matches("<?xml").count(), 1);
        assert!(output.starts_with(XML_DECLARATION));
    }

    #[test]
    fn test_rejects_non_svg_root() {
        let result = standalone("<html><body/></html>", 1.0, 1.0);
        assert!(matches!(result, Err(DrawBatchError::Capture(_))));
    }

    #[test]
    fn test_rejects_malformed_markup() {
        let result = standalone("<svg><g></svg>", 1.0, 1.0);
        assert!(matches!(result, Err(DrawBatchError::Capture(_))));
    }

    #[test]
    fn test_rejects_empty_markup() {
        let result = standalone("", 1.0, 1.0);
        assert!(matches!(result, Err(DrawBatchError::Capture(_))));
    }
}
