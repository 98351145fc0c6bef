//! Arena-backed document tree
//!
//! A browser-free [`TextTree`] with DOM-like semantics: nodes keep their
//! identity across splits and wraps, removed nodes become detached, and
//! `normalize` coalesces adjacent text. Used by the engine's tests and by
//! hosts that pre-compute highlights outside a browser.

use crate::error::AnchorError;
use crate::tree::{MarkerSpec, TextTree, ATTR_ISSUE_INDEX};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        classes: Vec<String>,
        attributes: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeEntry {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct MemoryTree {
    nodes: Vec<NodeEntry>,
    body: NodeId,
    stylesheets: Vec<(String, String)>,
    scrolled: Vec<NodeId>,
    hidden: HashSet<NodeId>,
    locked: HashSet<NodeId>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    /// An empty document consisting of a `<body>`
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeEntry {
                data: NodeData::Element {
                    tag: "body".to_string(),
                    classes: Vec::new(),
                    attributes: BTreeMap::new(),
                },
                parent: None,
                children: Vec::new(),
            }],
            body: NodeId(0),
            stylesheets: Vec::new(),
            scrolled: Vec::new(),
            hidden: HashSet::new(),
            locked: HashSet::new(),
        }
    }

    /// A body with one `<p>` per entry, each holding a single text node
    pub fn from_paragraphs(paragraphs: &[&str]) -> Self {
        let mut tree = Self::new();
        let body = tree.body();
        for text in paragraphs {
            let p = tree.append_element(body, "p");
            tree.append_text(p, text);
        }
        tree
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.push_child(
            parent,
            NodeData::Element {
                tag: tag.to_string(),
                classes: Vec::new(),
                attributes: BTreeMap::new(),
            },
        )
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push_child(parent, NodeData::Text(text.to_string()))
    }

    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) {
        if let Some(NodeEntry {
            data: NodeData::Element { attributes, .. },
            ..
        }) = self.nodes.get_mut(element.0)
        {
            attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|entry| entry.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element { tag, .. } => Some(tag),
            NodeData::Text(_) => None,
        }
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(
            self.nodes.get(node.0).map(|entry| &entry.data),
            Some(NodeData::Text(_))
        )
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.body {
                return true;
            }
            current = self.nodes.get(id.0).and_then(|entry| entry.parent);
        }
        false
    }

    /// Mark a subtree as not rendered (zero-height)
    pub fn hide(&mut self, node: NodeId) {
        self.hidden.insert(node);
    }

    /// Make structural edits inside `node`'s subtree fail, as they would on
    /// a node owned by a foreign or read-only document
    pub fn lock(&mut self, node: NodeId) {
        self.locked.insert(node);
    }

    pub fn stylesheets(&self) -> &[(String, String)] {
        &self.stylesheets
    }

    /// Elements scrolled into view, oldest first
    pub fn scroll_log(&self) -> &[NodeId] {
        &self.scrolled
    }

    /// Compact markup of the body's content. Only `class` and
    /// `data-issue-index` are rendered.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for &child in self.children(self.body) {
            self.render_into(child, &mut out);
        }
        out
    }

    fn render_into(&self, node: NodeId, out: &mut String) {
        let Some(entry) = self.nodes.get(node.0) else {
            return;
        };
        match &entry.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element {
                tag,
                classes,
                attributes,
            } => {
                out.push('<');
                out.push_str(tag);
                if !classes.is_empty() {
                    out.push_str(&format!(" class=\"{}\"", classes.join(" ")));
                }
                if let Some(index) = attributes.get(ATTR_ISSUE_INDEX) {
                    out.push_str(&format!(" {}=\"{}\"", ATTR_ISSUE_INDEX, index));
                }
                out.push('>');
                for &child in &entry.children {
                    self.render_into(child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }

    fn push_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(entry) = self.nodes.get_mut(parent.0) {
            entry.children.push(id);
        }
        id
    }

    fn new_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn entry(&self, node: NodeId) -> Result<&NodeEntry, AnchorError> {
        self.nodes.get(node.0).ok_or(AnchorError::Detached)
    }

    fn is_locked(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.locked.contains(&id) {
                return true;
            }
            current = self.nodes.get(id.0).and_then(|entry| entry.parent);
        }
        false
    }

    /// Parent and index of an attached, editable node
    fn editable_slot(&self, node: NodeId) -> Result<(NodeId, usize), AnchorError> {
        if !self.is_attached(node) {
            return Err(AnchorError::Detached);
        }
        if self.is_locked(node) {
            return Err(AnchorError::Mutation(format!(
                "node {} is inside a locked subtree",
                node.0
            )));
        }
        let parent = self.entry(node)?.parent.ok_or(AnchorError::Detached)?;
        let index = self
            .entry(parent)?
            .children
            .iter()
            .position(|&child| child == node)
            .ok_or(AnchorError::Detached)?;
        Ok((parent, index))
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(entry) = self.nodes.get(node.0) else {
            return;
        };
        match &entry.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element { .. } => {
                for &child in &entry.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    fn preorder(&self, node: NodeId, out: &mut Vec<NodeId>) {
        out.push(node);
        for &child in self.children(node) {
            self.preorder(child, out);
        }
    }

    fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.preorder(self.body, &mut out);
        out
    }

    fn classes_mut(&mut self, element: NodeId) -> Result<&mut Vec<String>, AnchorError> {
        match self.nodes.get_mut(element.0).map(|entry| &mut entry.data) {
            Some(NodeData::Element { classes, .. }) => Ok(classes),
            Some(NodeData::Text(_)) => Err(AnchorError::NotElement),
            None => Err(AnchorError::Detached),
        }
    }
}

impl TextTree for MemoryTree {
    type Node = NodeId;

    fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(self.body, &mut out);
        out
    }

    fn text_nodes(&self) -> Vec<NodeId> {
        self.descendants()
            .into_iter()
            .filter(|&id| self.is_text(id))
            .collect()
    }

    fn text_content(&self, node: &NodeId) -> String {
        let mut out = String::new();
        self.collect_text(*node, &mut out);
        out
    }

    fn split_text(&mut self, node: &NodeId, offset: usize) -> Result<NodeId, AnchorError> {
        let (parent, index) = self.editable_slot(*node)?;
        let tail = match &self.entry(*node)?.data {
            NodeData::Text(text) => {
                if offset > text.len() || !text.is_char_boundary(offset) {
                    return Err(AnchorError::OffsetOutOfBounds {
                        offset,
                        len: text.len(),
                    });
                }
                text[offset..].to_string()
            }
            NodeData::Element { .. } => return Err(AnchorError::NotText),
        };

        if let Some(NodeData::Text(text)) = self.nodes.get_mut(node.0).map(|e| &mut e.data) {
            text.truncate(offset);
        }
        let tail_id = self.new_node(NodeData::Text(tail));
        self.nodes[tail_id.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index + 1, tail_id);
        Ok(tail_id)
    }

    fn wrap_in_marker(&mut self, node: &NodeId, marker: &MarkerSpec) -> Result<NodeId, AnchorError> {
        let (parent, index) = self.editable_slot(*node)?;
        let attributes = marker
            .attributes()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        let wrapper = self.new_node(NodeData::Element {
            tag: "span".to_string(),
            classes: marker.classes(),
            attributes,
        });
        self.nodes[wrapper.0].parent = Some(parent);
        self.nodes[wrapper.0].children.push(*node);
        self.nodes[parent.0].children[index] = wrapper;
        self.nodes[node.0].parent = Some(wrapper);
        Ok(wrapper)
    }

    fn unwrap_element(&mut self, element: &NodeId) -> Result<NodeId, AnchorError> {
        if self.is_text(*element) {
            return Err(AnchorError::NotElement);
        }
        let (parent, index) = self.editable_slot(*element)?;
        let children = std::mem::take(&mut self.nodes[element.0].children);
        for &child in &children {
            self.nodes[child.0].parent = Some(parent);
        }
        let siblings = &mut self.nodes[parent.0].children;
        siblings.remove(index);
        for (offset, child) in children.into_iter().enumerate() {
            siblings.insert(index + offset, child);
        }
        self.nodes[element.0].parent = None;
        Ok(parent)
    }

    fn normalize(&mut self, node: &NodeId) {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
        for child in children {
            let child_text = match &self.nodes[child.0].data {
                NodeData::Text(text) => Some(text.clone()),
                NodeData::Element { .. } => None,
            };
            match child_text {
                Some(text) if text.is_empty() => {
                    self.nodes[child.0].parent = None;
                }
                Some(text) => {
                    let previous = kept.last().copied().filter(|&prev| self.is_text(prev));
                    if let Some(prev) = previous {
                        if let NodeData::Text(prev_text) = &mut self.nodes[prev.0].data {
                            prev_text.push_str(&text);
                        }
                        self.nodes[child.0].parent = None;
                    } else {
                        kept.push(child);
                    }
                }
                None => {
                    self.normalize(&child);
                    kept.push(child);
                }
            }
        }
        self.nodes[node.0].children = kept;
    }

    fn elements_with_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants()
            .into_iter()
            .filter(|id| self.has_class(id, class))
            .collect()
    }

    fn attribute(&self, element: &NodeId, name: &str) -> Option<String> {
        match &self.nodes.get(element.0)?.data {
            NodeData::Element { classes, .. } if name == "class" => Some(classes.join(" ")),
            NodeData::Element { attributes, .. } => attributes.get(name).cloned(),
            NodeData::Text(_) => None,
        }
    }

    fn has_class(&self, element: &NodeId, class: &str) -> bool {
        match self.nodes.get(element.0).map(|entry| &entry.data) {
            Some(NodeData::Element { classes, .. }) => classes.iter().any(|c| c == class),
            _ => false,
        }
    }

    fn add_class(&mut self, element: &NodeId, class: &str) -> Result<(), AnchorError> {
        let classes = self.classes_mut(*element)?;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
        Ok(())
    }

    fn remove_class(&mut self, element: &NodeId, class: &str) -> Result<(), AnchorError> {
        self.classes_mut(*element)?.retain(|c| c != class);
        Ok(())
    }

    fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    fn ensure_stylesheet(&mut self, id: &str, css: &str) -> Result<bool, AnchorError> {
        if self.stylesheets.iter().any(|(existing, _)| existing == id) {
            return Ok(false);
        }
        self.stylesheets.push((id.to_string(), css.to_string()));
        Ok(true)
    }

    fn scroll_into_view(&mut self, element: &NodeId) {
        self.scrolled.push(*element);
    }

    fn is_rendered(&self, node: &NodeId) -> bool {
        let mut current = Some(*node);
        while let Some(id) = current {
            if self.hidden.contains(&id) {
                return false;
            }
            current = self.nodes.get(id.0).and_then(|entry| entry.parent);
        }
        true
    }
}
