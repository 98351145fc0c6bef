//! `TextTree` over a live browser document
//!
//! The engine works in byte offsets of Rust strings; `Text.splitText`
//! takes UTF-16 code units, so offsets are converted here.

use span_anchor::tree::{MarkerSpec, TextTree};
use span_anchor::AnchorError;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, HtmlElement, HtmlIFrameElement, Node, ScrollBehavior,
    ScrollIntoViewOptions, ScrollLogicalPosition, Text,
};

/// `NodeFilter.SHOW_TEXT`
const SHOW_TEXT: u32 = 0x4;

fn js_error(context: &str, err: JsValue) -> AnchorError {
    AnchorError::Mutation(format!("{}: {:?}", context, err))
}

/// UTF-16 length of the first `byte_offset` bytes of `text`
pub fn utf16_offset(text: &str, byte_offset: usize) -> Result<u32, AnchorError> {
    if byte_offset > text.len() || !text.is_char_boundary(byte_offset) {
        return Err(AnchorError::OffsetOutOfBounds {
            offset: byte_offset,
            len: text.len(),
        });
    }
    Ok(text[..byte_offset].encode_utf16().count() as u32)
}

#[derive(Debug, Clone)]
pub struct DomTree {
    document: Document,
}

impl DomTree {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Bind the document currently loaded in an iframe
    pub fn from_iframe(iframe: &HtmlIFrameElement) -> Result<Self, AnchorError> {
        let document = iframe
            .content_document()
            .or_else(|| iframe.content_window().and_then(|w| w.document()))
            .ok_or_else(|| AnchorError::NoDocument("iframe has no loaded document".to_string()))?;
        Ok(Self::new(document))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn body(&self) -> Result<HtmlElement, AnchorError> {
        self.document
            .body()
            .ok_or_else(|| AnchorError::NoDocument("document has no body".to_string()))
    }

    fn element<'a>(&self, node: &'a Node) -> Result<&'a Element, AnchorError> {
        node.dyn_ref::<Element>().ok_or(AnchorError::NotElement)
    }

    /// Make the body editable (with a dashed outline) or read-only. Going
    /// read-only also drops editor-injected `contenteditable` styles.
    pub fn set_editable(&self, editable: bool) -> Result<(), AnchorError> {
        let body = self.body()?;
        let style = body.style();
        let apply = |name: &str, value: &str| {
            style
                .set_property(name, value)
                .map_err(|e| js_error("failed to set body style", e))
        };

        if editable {
            body.set_content_editable("true");
            apply("outline", span_anchor::markup::EDIT_OUTLINE)?;
            apply("outline-offset", span_anchor::markup::EDIT_OUTLINE_OFFSET)?;
            if let Err(e) = body.focus() {
                tracing::debug!(error = ?e, "could not focus editable body");
            }
            return Ok(());
        }

        body.set_content_editable("false");
        if let Err(e) = body.remove_attribute("contenteditable") {
            tracing::debug!(error = ?e, "could not remove contenteditable");
        }
        apply("outline", "none")?;
        apply("outline-offset", "0")?;

        let styles = self
            .document
            .query_selector_all("style")
            .map_err(|e| js_error("failed to query styles", e))?;
        for i in 0..styles.length() {
            let Some(style) = styles.get(i) else { continue };
            let css = style.text_content().unwrap_or_default();
            if span_anchor::markup::is_editor_style(&css) {
                if let Some(element) = style.dyn_ref::<Element>() {
                    element.remove();
                }
            }
        }
        Ok(())
    }

    pub fn is_editable(&self) -> bool {
        self.body().map(|b| b.is_content_editable()).unwrap_or(false)
    }

    /// Serialized document: doctype plus the root element's markup
    pub fn to_html(&self) -> Result<String, AnchorError> {
        let root = self
            .document
            .document_element()
            .ok_or_else(|| AnchorError::NoDocument("document has no root element".to_string()))?;
        Ok(span_anchor::markup::with_doctype(&root.outer_html()))
    }
}

impl TextTree for DomTree {
    type Node = Node;

    fn plain_text(&self) -> String {
        self.document
            .body()
            .and_then(|b| b.text_content())
            .unwrap_or_default()
    }

    fn text_nodes(&self) -> Vec<Node> {
        let Ok(body) = self.body() else {
            return Vec::new();
        };
        let walker = match self
            .document
            .create_tree_walker_with_what_to_show(&body, SHOW_TEXT)
        {
            Ok(walker) => walker,
            Err(e) => {
                tracing::warn!(error = ?e, "failed to create tree walker");
                return Vec::new();
            }
        };
        let mut nodes = Vec::new();
        while let Ok(Some(node)) = walker.next_node() {
            nodes.push(node);
        }
        nodes
    }

    fn text_content(&self, node: &Node) -> String {
        node.text_content().unwrap_or_default()
    }

    fn split_text(&mut self, node: &Node, offset: usize) -> Result<Node, AnchorError> {
        let text = node.dyn_ref::<Text>().ok_or(AnchorError::NotText)?;
        if node.parent_node().is_none() {
            return Err(AnchorError::Detached);
        }
        let content = text.data();
        let units = utf16_offset(&content, offset)?;
        text.split_text(units)
            .map(Node::from)
            .map_err(|e| js_error("splitText failed", e))
    }

    fn wrap_in_marker(&mut self, node: &Node, marker: &MarkerSpec) -> Result<Node, AnchorError> {
        let parent = node.parent_node().ok_or(AnchorError::Detached)?;
        let wrapper = self
            .document
            .create_element("span")
            .map_err(|e| js_error("failed to create marker", e))?;
        wrapper.set_class_name(&marker.class_attribute());
        for (name, value) in marker.attributes() {
            wrapper
                .set_attribute(name, &value)
                .map_err(|e| js_error("failed to set marker attribute", e))?;
        }
        parent
            .replace_child(&wrapper, node)
            .map_err(|e| js_error("failed to insert marker", e))?;
        wrapper
            .append_child(node)
            .map_err(|e| js_error("failed to move text into marker", e))?;
        Ok(wrapper.into())
    }

    fn unwrap_element(&mut self, element: &Node) -> Result<Node, AnchorError> {
        self.element(element)?;
        let parent = element.parent_node().ok_or(AnchorError::Detached)?;
        while let Some(child) = element.first_child() {
            parent
                .insert_before(&child, Some(element))
                .map_err(|e| js_error("failed to move marker content", e))?;
        }
        parent
            .remove_child(element)
            .map_err(|e| js_error("failed to remove marker", e))?;
        Ok(parent)
    }

    fn normalize(&mut self, node: &Node) {
        node.normalize();
    }

    fn elements_with_class(&self, class: &str) -> Vec<Node> {
        // live collection; snapshot before callers mutate the tree
        let list = self.document.get_elements_by_class_name(class);
        (0..list.length())
            .filter_map(|i| list.item(i))
            .map(Node::from)
            .collect()
    }

    fn attribute(&self, element: &Node, name: &str) -> Option<String> {
        element.dyn_ref::<Element>()?.get_attribute(name)
    }

    fn has_class(&self, element: &Node, class: &str) -> bool {
        element
            .dyn_ref::<Element>()
            .map(|e| e.class_list().contains(class))
            .unwrap_or(false)
    }

    fn add_class(&mut self, element: &Node, class: &str) -> Result<(), AnchorError> {
        self.element(element)?
            .class_list()
            .add_1(class)
            .map_err(|e| js_error("classList.add failed", e))
    }

    fn remove_class(&mut self, element: &Node, class: &str) -> Result<(), AnchorError> {
        self.element(element)?
            .class_list()
            .remove_1(class)
            .map_err(|e| js_error("classList.remove failed", e))
    }

    fn parent_element(&self, node: &Node) -> Option<Node> {
        node.parent_element().map(Node::from)
    }

    fn ensure_stylesheet(&mut self, id: &str, css: &str) -> Result<bool, AnchorError> {
        if self.document.get_element_by_id(id).is_some() {
            return Ok(false);
        }
        let head = self
            .document
            .head()
            .ok_or_else(|| AnchorError::NoDocument("document has no head".to_string()))?;
        let style = self
            .document
            .create_element("style")
            .map_err(|e| js_error("failed to create stylesheet", e))?;
        style.set_id(id);
        style.set_text_content(Some(css));
        head.append_child(&style)
            .map_err(|e| js_error("failed to insert stylesheet", e))?;
        Ok(true)
    }

    fn scroll_into_view(&mut self, element: &Node) {
        let Some(element) = element.dyn_ref::<Element>() else {
            return;
        };
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Center);
        options.set_inline(ScrollLogicalPosition::Nearest);
        element.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn is_rendered(&self, node: &Node) -> bool {
        let Ok(range) = self.document.create_range() else {
            return true;
        };
        if range.select_node(node).is_err() {
            return false;
        }
        range.get_bounding_client_rect().height() > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_offset() {
        assert_eq!(utf16_offset("abc", 2).unwrap(), 2);
        // Hangul syllables are 3 bytes in UTF-8, 1 unit in UTF-16
        assert_eq!(utf16_offset("가나다", 6).unwrap(), 2);
        // astral characters are 4 bytes, 2 units
        assert_eq!(utf16_offset("😀x", 4).unwrap(), 2);
        assert!(utf16_offset("가나", 1).is_err());
        assert!(utf16_offset("ab", 3).is_err());
    }
}
