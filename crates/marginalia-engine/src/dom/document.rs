use std::collections::HashMap;

use crate::dom::node::{Node, NodeData, NodeId};

/// An in-memory DOM instance the engine anchors into and mutates.
///
/// Nodes live in an arena indexed by [`NodeId`]; the tree structure is held
/// as parent links plus ordered child lists. Wrapping and unwrapping reparent
/// nodes without ever copying or discarding text, which is what keeps the
/// character-preservation invariant of highlighting cheap to uphold.
///
/// All text offsets taken or returned by this type count Unicode scalar
/// values, not bytes.
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    id_index: HashMap<String, NodeId>,
}

impl Document {
    /// Create a document whose root is a single empty element.
    pub fn new(root_tag: &str) -> Self {
        let mut doc = Document {
            nodes: Vec::new(),
            root: NodeId(0),
            id_index: HashMap::new(),
        };
        doc.root = doc.alloc(Node::element(root_tag));
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    // ---- construction ----

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::element(tag))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(Node::text(text))
    }

    /// Set an attribute, replacing any existing value. Setting `id` keeps the
    /// document-wide id lookup in sync.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &mut self.node_mut(id).data {
            if let Some(attr) = attrs.iter_mut().find(|(n, _)| n == name) {
                attr.1 = value.to_string();
            } else {
                attrs.push((name.to_string(), value.to_string()));
            }
        }
        if name == "id" && !value.is_empty() {
            self.id_index.insert(value.to_string(), id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.node(child).parent.is_none());
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        debug_assert!(self.node(child).parent.is_none());
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Remove a node from its parent. The node keeps its id but is no longer
    /// reachable from the root.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| c != id);
            self.node_mut(id).parent = None;
        }
    }

    // ---- queries ----

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Text(_))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Element { .. })
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element { tag, .. } => Some(tag),
            NodeData::Text(_) => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            NodeData::Text(_) => None,
        }
    }

    /// The stable id attribute of an element, if it carries a non-empty one.
    pub fn stable_id(&self, id: NodeId) -> Option<&str> {
        self.attr(id, "id").filter(|v| !v.is_empty())
    }

    /// Look up an element by its id attribute in the current document.
    pub fn element_by_id(&self, stable_id: &str) -> Option<NodeId> {
        self.id_index.get(stable_id).copied()
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Text(text) => Some(text),
            NodeData::Element { .. } => None,
        }
    }

    /// Rendered text length of a node in chars: a text node contributes its
    /// character count, an element the summed length of its descendants.
    pub fn text_len(&self, id: NodeId) -> usize {
        match &self.node(id).data {
            NodeData::Text(text) => text.chars().count(),
            NodeData::Element { .. } => self
                .node(id)
                .children
                .iter()
                .map(|&c| self.text_len(c))
                .sum(),
        }
    }

    /// Concatenated text of a subtree in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.node(id).data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element { .. } => {
                for &child in &self.node(id).children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.node(id).parent?;
        self.node(parent).children.iter().position(|&c| c == id)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id).parent?;
        let idx = self.child_index(id)?;
        if idx == 0 {
            None
        } else {
            Some(self.node(parent).children[idx - 1])
        }
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id).parent?;
        let idx = self.child_index(id)?;
        self.node(parent).children.get(idx + 1).copied()
    }

    /// Whether `node` is reachable from the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut cur = node;
        loop {
            if cur == self.root {
                return true;
            }
            match self.node(cur).parent {
                Some(parent) => cur = parent,
                None => return false,
            }
        }
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = node;
        loop {
            if cur == ancestor {
                return true;
            }
            match self.node(cur).parent {
                Some(parent) => cur = parent,
                None => return false,
            }
        }
    }

    /// All text nodes under `subtree` in document order.
    pub fn text_nodes_under(&self, subtree: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_text_nodes(subtree, &mut out);
        out
    }

    fn collect_text_nodes(&self, id: NodeId, out: &mut Vec<NodeId>) {
        match &self.node(id).data {
            NodeData::Text(_) => out.push(id),
            NodeData::Element { .. } => {
                for &child in &self.node(id).children {
                    self.collect_text_nodes(child, out);
                }
            }
        }
    }

    pub fn first_text_node(&self, subtree: NodeId) -> Option<NodeId> {
        match &self.node(subtree).data {
            NodeData::Text(_) => Some(subtree),
            NodeData::Element { .. } => self
                .node(subtree)
                .children
                .iter()
                .find_map(|&c| self.first_text_node(c)),
        }
    }

    pub fn last_text_node(&self, subtree: NodeId) -> Option<NodeId> {
        match &self.node(subtree).data {
            NodeData::Text(_) => Some(subtree),
            NodeData::Element { .. } => self
                .node(subtree)
                .children
                .iter()
                .rev()
                .find_map(|&c| self.last_text_node(c)),
        }
    }

    // ---- mutation used by highlighting ----

    /// Split a text node at a char offset, leaving `[0, offset)` in place and
    /// moving `[offset, len)` into a new text node inserted immediately after.
    /// Returns the new tail node.
    ///
    /// The offset must be strictly inside the node; splitting at 0 or at the
    /// full length is a caller bug (nothing would be isolated by it).
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> NodeId {
        let (head, tail) = {
            let text = self
                .text(id)
                .expect("split_text called on a non-text node");
            let byte = text
                .char_indices()
                .nth(offset)
                .map(|(b, _)| b)
                .unwrap_or(text.len());
            assert!(
                byte != 0 && byte != text.len(),
                "split offset must fall strictly inside the text node"
            );
            (text[..byte].to_string(), text[byte..].to_string())
        };
        let parent = self.node(id).parent.expect("split_text on detached node");
        let index = self.child_index(id).expect("split_text on detached node");

        if let NodeData::Text(text) = &mut self.node_mut(id).data {
            *text = head;
        }
        let tail_id = self.alloc(Node::text(&tail));
        self.insert_child(parent, index + 1, tail_id);
        tail_id
    }

    /// Put `wrapper` in `target`'s place and move `target` inside it.
    ///
    /// `wrapper` must be freshly created: detached and childless.
    pub fn wrap(&mut self, target: NodeId, wrapper: NodeId) {
        debug_assert!(self.node(wrapper).parent.is_none());
        debug_assert!(self.node(wrapper).children.is_empty());
        let parent = self.node(target).parent.expect("cannot wrap a root node");
        let index = self.child_index(target).expect("cannot wrap a root node");

        self.node_mut(parent).children[index] = wrapper;
        self.node_mut(wrapper).parent = Some(parent);
        self.node_mut(target).parent = None;
        self.append_child(wrapper, target);
    }

    /// Move `wrapper`'s children back into its parent at its own position and
    /// detach the now-empty wrapper. A detached wrapper is left untouched.
    pub fn unwrap(&mut self, wrapper: NodeId) {
        let Some(parent) = self.node(wrapper).parent else {
            return;
        };
        let index = match self.child_index(wrapper) {
            Some(index) => index,
            None => return,
        };
        let children = std::mem::take(&mut self.node_mut(wrapper).children);
        for &child in &children {
            self.node_mut(child).parent = Some(parent);
        }
        let siblings = &mut self.node_mut(parent).children;
        siblings.splice(index..=index, children);
        self.node_mut(wrapper).parent = None;
    }
}
