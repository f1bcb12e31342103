//! Arena-backed labeled tree holding a parsed SVD document.
//!
//! Nodes live in a single `Vec` and are addressed by [`NodeId`]. Each node
//! records its parent and an ordered list of child ids, so the resolver can
//! append children to one node while holding ids of its siblings.

use std::collections::HashMap;
use std::fmt::Write as _;

/// Stable index of a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Payload of a single element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// Element (tag) name.
    pub name: String,
    /// Attributes in no particular order.
    pub attributes: HashMap<String, String>,
    /// Trimmed character data. Non-empty only for leaf elements.
    pub text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(name: String, attributes: HashMap<String, String>, parent: Option<NodeId>) -> Self {
        Self {
            name,
            attributes,
            text: String::new(),
            parent,
            children: Vec::new(),
        }
    }

    /// True when the element carries character data next to attributes or
    /// child elements.
    pub fn is_mixed(&self) -> bool {
        !self.text.is_empty() && !(self.attributes.is_empty() && self.children.is_empty())
    }
}

/// Ordered labeled tree with a single root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Tree {
    /// Create a tree holding only a root element.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![NodeData::new(root_name.into(), HashMap::new(), None)],
            root: NodeId(0),
        }
    }

    pub(crate) fn from_parts(nodes: Vec<NodeData>, root: NodeId) -> Self {
        Self { nodes, root }
    }

    pub(crate) fn new_node(
        nodes: &mut Vec<NodeData>,
        name: String,
        attributes: HashMap<String, String>,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(nodes.len());
        nodes.push(NodeData::new(name, attributes, parent));
        if let Some(parent) = parent {
            nodes[parent.0].children.push(id);
        }
        id
    }

    /// The document's top-level element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes allocated in the arena, including unreachable copies.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty. A built tree always has a root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Access the payload of `id`.
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    /// Mutable access to the payload of `id`.
    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    /// Element name of `id`.
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    /// Character data of `id`, empty for structured elements.
    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id.0].text
    }

    /// Value of the attribute `key` on `id`.
    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        self.nodes[id.0].attributes.get(key).map(String::as_str)
    }

    /// Enclosing element, `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Ordered child ids of `id`.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// First child of `id` named `name`.
    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.name(child) == name)
    }

    /// All direct children of `id` named `name`, in document order.
    pub fn children_named<'a>(
        &'a self,
        id: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&child| self.name(child) == name)
    }

    /// Whether `id` has at least one child named `name`.
    pub fn has_child(&self, id: NodeId, name: &str) -> bool {
        self.child(id, name).is_some()
    }

    /// Text of the `name` child, used as the element's label in SVD.
    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.child(id, "name").map(|name| self.text(name))
    }

    /// Append a new leaf element with character data under `parent`.
    pub fn append_leaf(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> NodeId {
        let id = Self::new_node(&mut self.nodes, name.into(), HashMap::new(), Some(parent));
        self.nodes[id.0].text = text.into();
        id
    }

    /// Append a new empty element under `parent`.
    pub fn append_element(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        Self::new_node(&mut self.nodes, name.into(), HashMap::new(), Some(parent))
    }

    /// Deep-copy the subtree rooted at `source` and append the copy as the
    /// last child of `parent`. Returns the id of the copy.
    pub fn copy_subtree(&mut self, source: NodeId, parent: NodeId) -> NodeId {
        let copy = self.copy_node(source, parent);
        // children are pushed in reverse so each copy is appended in order
        let mut pending: Vec<(NodeId, NodeId)> = self.nodes[source.0]
            .children
            .iter()
            .rev()
            .map(|&child| (child, copy))
            .collect();
        while let Some((source, parent)) = pending.pop() {
            let copy = self.copy_node(source, parent);
            pending.extend(
                self.nodes[source.0]
                    .children
                    .iter()
                    .rev()
                    .map(|&child| (child, copy)),
            );
        }
        copy
    }

    /// Append a childless copy of `source` under `parent`.
    fn copy_node(&mut self, source: NodeId, parent: NodeId) -> NodeId {
        let data = &self.nodes[source.0];
        let (name, attributes, text) = (data.name.clone(), data.attributes.clone(), data.text.clone());
        let copy = Self::new_node(&mut self.nodes, name, attributes, Some(parent));
        self.nodes[copy.0].text = text;
        copy
    }

    /// Slash separated path from the root to `id`. Elements with a `name`
    /// child are qualified with it, e.g. `device/peripherals/peripheral[UART0]`.
    pub fn path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let name = self.name(node);
            let segment = match self.label(node) {
                Some(label) if !label.is_empty() => format!("{name}[{label}]"),
                _ => name.to_string(),
            };
            segments.push(segment);
            current = self.parent(node);
        }
        segments.reverse();
        segments.join("/")
    }

    /// Indented markup-like rendering of the subtree at `id`, for debugging.
    pub fn render(&self, id: NodeId) -> String {
        enum Step {
            Open(NodeId, usize),
            Close(NodeId, usize),
        }

        let mut out = String::new();
        let mut pending = vec![Step::Open(id, 0)];
        while let Some(step) = pending.pop() {
            match step {
                Step::Open(id, depth) => {
                    let node = self.node(id);
                    let indent = "    ".repeat(depth);
                    let mut keys: Vec<_> = node.attributes.keys().collect();
                    keys.sort();
                    let mut attrs = String::new();
                    for key in keys {
                        let _ = write!(attrs, " {key}=\"{}\"", node.attributes[key]);
                    }
                    if node.children.is_empty() {
                        let _ = writeln!(out, "{indent}<{0}{attrs}>{1}</{0}>", node.name, node.text);
                        continue;
                    }
                    let _ = writeln!(out, "{indent}<{}{attrs}>", node.name);
                    pending.push(Step::Close(id, depth));
                    pending.extend(
                        node.children
                            .iter()
                            .rev()
                            .map(|&child| Step::Open(child, depth + 1)),
                    );
                }
                Step::Close(id, depth) => {
                    let _ = writeln!(out, "{}</{}>", "    ".repeat(depth), self.name(id));
                }
            }
        }
        out
    }
}
