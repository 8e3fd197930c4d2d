//! In-memory DOM model for the reading view.
//!
//! The reading view works on a rendered fragment: elements with classes,
//! attributes and inline styles, text nodes, and raw HTML passed through from
//! the markdown renderer. Nodes live in an arena and are addressed by
//! [`NodeId`]. Ids carry a generation, so a handle to a removed node (for
//! example a row of an overlay that has since been rebuilt) resolves to
//! nothing instead of aliasing a newer node.
//!
//! ## Examples
//!
//! ```
//! use codemark_lib::dom::Document;
//!
//! let mut doc = Document::new();
//! let pre = doc.create_element("pre");
//! let code = doc.create_element_with_class("code", "language-rust");
//! doc.append_child(pre, code);
//! doc.set_text(code, "fn main() {}\n");
//!
//! assert_eq!(doc.code_blocks(pre), vec![(pre, code)]);
//! assert_eq!(
//!     doc.to_html(pre),
//!     "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"
//! );
//! ```

use html_escape::{encode_double_quoted_attribute, encode_text};

/// Handle to a node of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

/// Behaviour attached to an element's click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Adds the named attribute when absent, removes it when present.
    ToggleAttribute(String),
}

#[derive(Debug, Clone)]
enum NodeData {
    Element(Element),
    Text(String),
    Raw(String),
}

#[derive(Debug, Clone, Default)]
struct Element {
    tag: String,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    style: Vec<StyleDecl>,
    on_click: Option<ClickAction>,
}

#[derive(Debug, Clone)]
struct StyleDecl {
    property: String,
    value: String,
    important: bool,
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// An arena of DOM nodes.
#[derive(Debug, Clone, Default)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert(NodeData::Element(Element {
            tag: tag.to_string(),
            ..Default::default()
        }))
    }

    /// Creates a detached element carrying one class.
    pub fn create_element_with_class(&mut self, tag: &str, class: &str) -> NodeId {
        let id = self.create_element(tag);
        self.add_class(id, class);
        id
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.insert(NodeData::Text(text.to_string()))
    }

    /// Creates a detached node whose content is serialized verbatim.
    pub fn create_raw(&mut self, html: &str) -> NodeId {
        self.insert(NodeData::Raw(html.to_string()))
    }

    fn insert(&mut self, data: NodeData) -> NodeId {
        let node = Node {
            data,
            parent: None,
            children: Vec::new(),
        };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        match self.node(id).map(|node| &node.data) {
            Some(NodeData::Element(element)) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.node_mut(id).map(|node| &mut node.data) {
            Some(NodeData::Element(element)) => Some(element),
            _ => None,
        }
    }

    /// Whether `id` still refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether the document holds no live nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ─────────────────────────────────────────────────────────────
    // Tree structure
    // ─────────────────────────────────────────────────────────────

    /// Parent of a node, if attached.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    /// Children of a node (empty for a stale id).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    /// Appends `child` as the last child of `parent`, detaching it first.
    ///
    /// Returns `false` (and changes nothing) if either node is stale or the
    /// move would create a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.attach(parent, child, usize::MAX)
    }

    /// Inserts `child` as the first child of `parent`, detaching it first.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.attach(parent, child, 0)
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, position: usize) -> bool {
        if !self.contains(parent) || !self.contains(child) || self.is_ancestor(child, parent) {
            return false;
        }
        self.detach(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            let position = position.min(node.children.len());
            node.children.insert(position, child);
        }
        true
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Detaches a node from its parent, keeping it (and its subtree) alive.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|child| *child != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    /// Detaches a node and frees it together with its whole subtree.
    pub fn remove(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        self.detach(id);
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.node(current) {
                pending.extend(node.children.iter().copied());
            }
            let slot = &mut self.slots[current.index];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index);
        }
    }

    /// Removes every child of a node.
    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.children(id).to_vec() {
            self.remove(child);
        }
    }

    /// Descendants of `root` in document order (pre-order), excluding `root`.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            found.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        found
    }

    /// Descendants of `root` carrying `class`, in document order.
    pub fn find_by_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| self.has_class(*id, class))
            .collect()
    }

    /// Direct children of `parent` carrying `class`.
    pub fn children_with_class(&self, parent: NodeId, class: &str) -> Vec<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|id| self.has_class(*id, class))
            .collect()
    }

    /// Every `pre > code` pair under `root` (including `root` itself), in
    /// document order.
    pub fn code_blocks(&self, root: NodeId) -> Vec<(NodeId, NodeId)> {
        std::iter::once(root)
            .chain(self.descendants(root))
            .filter(|id| self.tag(*id) == Some("pre"))
            .filter_map(|pre| {
                self.children(pre)
                    .iter()
                    .copied()
                    .find(|child| self.tag(*child) == Some("code"))
                    .map(|code| (pre, code))
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────
    // Element properties
    // ─────────────────────────────────────────────────────────────

    /// Tag name of an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag.as_str())
    }

    /// Class list of an element.
    pub fn classes(&self, id: NodeId) -> &[String] {
        self.element(id)
            .map(|element| element.classes.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(element) = self.element_mut(id) {
            if !element.classes.iter().any(|c| c == class) {
                element.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(element) = self.element_mut(id) {
            element.classes.retain(|c| c != class);
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|element| {
            element
                .attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        })
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(id) {
            match element.attributes.iter_mut().find(|(key, _)| key == name) {
                Some((_, existing)) => *existing = value.to_string(),
                None => element
                    .attributes
                    .push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(element) = self.element_mut(id) {
            element.attributes.retain(|(key, _)| key != name);
        }
    }

    /// Inline style value of a property.
    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.element(id).and_then(|element| {
            element
                .style
                .iter()
                .find(|decl| decl.property == property)
                .map(|decl| decl.value.as_str())
        })
    }

    /// Sets an inline style property.
    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) {
        self.put_style(id, property, value, false);
    }

    /// Sets an inline style property with `!important` priority.
    pub fn set_style_important(&mut self, id: NodeId, property: &str, value: &str) {
        self.put_style(id, property, value, true);
    }

    /// Drops an inline style property.
    pub fn remove_style(&mut self, id: NodeId, property: &str) {
        if let Some(element) = self.element_mut(id) {
            element.style.retain(|decl| decl.property != property);
        }
    }

    fn put_style(&mut self, id: NodeId, property: &str, value: &str, important: bool) {
        if let Some(element) = self.element_mut(id) {
            match element.style.iter_mut().find(|decl| decl.property == property) {
                Some(decl) => {
                    decl.value = value.to_string();
                    decl.important = important;
                }
                None => element.style.push(StyleDecl {
                    property: property.to_string(),
                    value: value.to_string(),
                    important,
                }),
            }
        }
    }

    /// Copies classes and inline style of `source` onto `target`.
    pub fn copy_presentation(&mut self, source: NodeId, target: NodeId) {
        let Some(source) = self.element(source).cloned() else {
            return;
        };
        if let Some(element) = self.element_mut(target) {
            element.classes = source.classes;
            element.style = source.style;
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Text and events
    // ─────────────────────────────────────────────────────────────

    /// Replaces the content of a node with `text`.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        match self.node(id).map(|node| &node.data) {
            Some(NodeData::Element(_)) => {
                self.clear_children(id);
                let text = self.create_text(text);
                self.append_child(id, text);
            }
            Some(NodeData::Text(_) | NodeData::Raw(_)) => {
                if let Some(node) = self.node_mut(id) {
                    node.data = NodeData::Text(text.to_string());
                }
            }
            None => {}
        }
    }

    /// Appends a text node to an element.
    pub fn append_text(&mut self, id: NodeId, text: &str) {
        let text = self.create_text(text);
        if !self.append_child(id, text) {
            self.remove(text);
        }
    }

    /// Concatenated text of a node and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.node(id).map(|node| &node.data) {
            Some(NodeData::Text(text)) => text.clone(),
            Some(NodeData::Element(_)) => self
                .children(id)
                .iter()
                .map(|child| self.text_content(*child))
                .collect(),
            Some(NodeData::Raw(_)) | None => String::new(),
        }
    }

    pub fn set_on_click(&mut self, id: NodeId, action: ClickAction) {
        if let Some(element) = self.element_mut(id) {
            element.on_click = Some(action);
        }
    }

    /// Dispatches a click on `id`. Returns whether a handler ran.
    pub fn click(&mut self, id: NodeId) -> bool {
        let Some(action) = self.element(id).and_then(|element| element.on_click.clone()) else {
            return false;
        };
        match action {
            ClickAction::ToggleAttribute(name) => {
                if self.has_attribute(id, &name) {
                    self.remove_attribute(id, &name);
                } else {
                    self.set_attribute(id, &name, "");
                }
            }
        }
        true
    }

    // ─────────────────────────────────────────────────────────────
    // Serialization
    // ─────────────────────────────────────────────────────────────

    /// Serializes a node and its subtree to HTML.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut output = String::new();
        self.write_html(id, &mut output);
        output
    }

    fn write_html(&self, id: NodeId, output: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) => output.push_str(&encode_text(text)),
            NodeData::Raw(html) => output.push_str(html),
            NodeData::Element(element) => {
                output.push('<');
                output.push_str(&element.tag);
                if !element.classes.is_empty() {
                    output.push_str(&format!(
                        r#" class="{}""#,
                        encode_double_quoted_attribute(&element.classes.join(" "))
                    ));
                }
                for (name, value) in &element.attributes {
                    if value.is_empty() {
                        output.push_str(&format!(" {}", name));
                    } else {
                        output.push_str(&format!(
                            r#" {}="{}""#,
                            name,
                            encode_double_quoted_attribute(value)
                        ));
                    }
                }
                if !element.style.is_empty() {
                    let style = element
                        .style
                        .iter()
                        .map(|decl| {
                            if decl.important {
                                format!("{}: {} !important", decl.property, decl.value)
                            } else {
                                format!("{}: {}", decl.property, decl.value)
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("; ");
                    output.push_str(&format!(
                        r#" style="{}""#,
                        encode_double_quoted_attribute(&style)
                    ));
                }
                output.push('>');
                for child in &node.children {
                    self.write_html(*child, output);
                }
                output.push_str(&format!("</{}>", element.tag));
            }
        }
    }
}
