//! String-level helpers for section extraction and merging
//!
//! Parsing happens in the browser; these build the selectors and document
//! shells around the parsed pieces.

use shared_types::SectionType;

pub const DOCTYPE: &str = "<!DOCTYPE html>";

/// Wrapper class of an extracted section's body
pub const CONTENT_WRAPPER_CLASS: &str = "document-content";

/// Body outline while the surface is editable
pub const EDIT_OUTLINE: &str = "2px dashed #3b82f6";
pub const EDIT_OUTLINE_OFFSET: &str = "4px";

/// Selector for a registered sub-element: `.<type>[data-section="<name>"]`
pub fn section_selector(section_type: SectionType, name: &str) -> String {
    format!(
        ".{}[data-section=\"{}\"]",
        section_type.class_name(),
        escape_attribute_value(name)
    )
}

/// Escape a value for use inside a double-quoted CSS attribute selector
pub fn escape_attribute_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push_str("\\a "),
            _ => out.push(ch),
        }
    }
    out
}

/// Standalone document showing one extracted section with the original
/// document's head
pub fn standalone_document(head_html: &str, section_html: &str) -> String {
    format!(
        "{DOCTYPE}\n<html lang=\"ko\">\n{head_html}\n<body>\n<div class=\"{CONTENT_WRAPPER_CLASS}\">\n{section_html}\n</div>\n</body>\n</html>\n"
    )
}

/// Serialized document: doctype line followed by the root element's markup
pub fn with_doctype(document_element_html: &str) -> String {
    format!("{DOCTYPE}\n{document_element_html}")
}

/// Whether a stylesheet was injected by the editor to style the editable
/// surface
pub fn is_editor_style(css: &str) -> bool {
    css.contains("contenteditable")
}
