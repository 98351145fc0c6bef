//! Section extraction and merge over serialized filing HTML
//!
//! A part document holds registered sub-elements
//! `.<section-type>[data-section="<name>"]`. Viewing a sub-section shows it
//! in a standalone document; saving splices the edited element back into
//! the part verbatim.

use shared_types::SectionType;
use span_anchor::markup::{section_selector, standalone_document, with_doctype};
use span_anchor::AnchorError;
use wasm_bindgen::prelude::*;
use web_sys::{Document, DomParser, Element, SupportedType};

fn parse_html(html: &str) -> Result<Document, AnchorError> {
    let parser = DomParser::new()
        .map_err(|e| AnchorError::NoDocument(format!("DOMParser unavailable: {:?}", e)))?;
    parser
        .parse_from_string(html, SupportedType::TextHtml)
        .map_err(|e| AnchorError::NoDocument(format!("Failed to parse HTML: {:?}", e)))
}

fn find_section(
    document: &Document,
    section_type: SectionType,
    name: &str,
) -> Result<Element, AnchorError> {
    let not_found = || AnchorError::SectionNotFound {
        section_type: section_type.class_name().to_string(),
        name: name.to_string(),
    };
    document
        .query_selector(&section_selector(section_type, name))
        .map_err(|_| not_found())?
        .ok_or_else(not_found)
}

fn parse_section_type(value: &str) -> Result<SectionType, AnchorError> {
    SectionType::parse(value)
        .ok_or_else(|| AnchorError::Config(format!("Unknown section type: {}", value)))
}

/// HTML to display for a section. Parts are shown as-is; sub-sections are
/// lifted into a standalone document that keeps the original head.
/// Returns `None` when the section is not present.
pub fn extract_section_html(
    html: &str,
    section_type: SectionType,
    name: &str,
) -> Result<Option<String>, AnchorError> {
    if section_type == SectionType::Part {
        return Ok(Some(html.to_string()));
    }
    let document = parse_html(html)?;
    let section = match find_section(&document, section_type, name) {
        Ok(section) => section,
        Err(AnchorError::SectionNotFound { .. }) => return Ok(None),
        Err(e) => return Err(e),
    };
    let head = document.head().map(|h| h.outer_html()).unwrap_or_default();
    Ok(Some(standalone_document(&head, &section.outer_html())))
}

/// Serialized part HTML after saving `edited_html` for a section. For a
/// sub-section, the matching element of `edited_html` replaces the one in
/// `part_html`; everything else passes through unchanged.
pub fn merge_section_html(
    part_html: &str,
    section_type: SectionType,
    name: &str,
    edited_html: &str,
) -> Result<String, AnchorError> {
    if section_type == SectionType::Part {
        return Ok(with_doctype(edited_html));
    }

    let edited = parse_html(edited_html)?;
    let replacement = find_section(&edited, section_type, name)?;

    let original = parse_html(part_html)?;
    let target = find_section(&original, section_type, name)?;
    target.set_outer_html(&replacement.outer_html());

    let root = original
        .document_element()
        .ok_or_else(|| AnchorError::NoDocument("parsed document has no root".to_string()))?;
    tracing::info!(section = %name, "merged edited section into part");
    Ok(with_doctype(&root.outer_html()))
}

/// Whitespace-collapsed text of an HTML string, as sent to the validator
pub fn plain_text_of_html(html: &str) -> Result<String, AnchorError> {
    let document = parse_html(html)?;
    let text = document
        .body()
        .and_then(|b| b.text_content())
        .or_else(|| document.document_element().and_then(|e| e.text_content()))
        .unwrap_or_default();
    Ok(span_anchor::collapse_whitespace(&text))
}

/// Extract a section for display; `null` when it is missing
#[wasm_bindgen(js_name = extractSection)]
pub fn extract_section(html: &str, section_type: &str, name: &str) -> Result<Option<String>, JsValue> {
    let section_type = parse_section_type(section_type).map_err(|e| JsValue::from_str(&e.to_string()))?;
    extract_section_html(html, section_type, name).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Merge an edited section back into its part
#[wasm_bindgen(js_name = mergeSection)]
pub fn merge_section(
    part_html: &str,
    section_type: &str,
    name: &str,
    edited_html: &str,
) -> Result<String, JsValue> {
    let section_type = parse_section_type(section_type).map_err(|e| JsValue::from_str(&e.to_string()))?;
    merge_section_html(part_html, section_type, name, edited_html)
        .map_err(|e| JsValue::from_str(&format!("Section update failed: {}", e)))
}

#[wasm_bindgen(js_name = plainTextOfHtml)]
pub fn plain_text_of_html_js(html: &str) -> Result<String, JsValue> {
    plain_text_of_html(html).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_section_type() {
        assert_eq!(parse_section_type("section-2").unwrap(), SectionType::Section2);
        assert!(matches!(parse_section_type("chapter"), Err(AnchorError::Config(_))));
    }
}
