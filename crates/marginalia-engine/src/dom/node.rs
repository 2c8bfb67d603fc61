/// Handle to a node in a [`Document`](super::Document) arena.
///
/// Node ids are stable for the lifetime of the document: detaching a node
/// from the tree does not invalidate its id, it only removes it from the
/// reachable tree. Ids from one document must never be used with another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Payload of a DOM node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// An element with a tag name and its attributes in source order.
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    /// A text run. Offsets into it are measured in Unicode scalar values.
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) data: NodeData,
}

impl Node {
    pub(crate) fn element(tag: &str) -> Self {
        Node {
            parent: None,
            children: Vec::new(),
            data: NodeData::Element {
                tag: tag.to_string(),
                attrs: Vec::new(),
            },
        }
    }

    pub(crate) fn text(text: &str) -> Self {
        Node {
            parent: None,
            children: Vec::new(),
            data: NodeData::Text(text.to_string()),
        }
    }
}
