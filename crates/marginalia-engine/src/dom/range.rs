use crate::dom::Document;
use crate::dom::node::NodeId;

/// One end of a live range: a node plus a char offset inside it.
///
/// A boundary is *normalized* when its node is a text node; boundaries
/// produced straight from a selection may instead reference an element with a
/// child index, which [`LiveRange::normalized`] resolves down to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeBoundary {
    pub node: NodeId,
    pub offset: usize,
}

/// An ephemeral range over the current document's nodes.
///
/// Live ranges are never persisted; any mutation of the nodes they reference
/// invalidates them. The durable form is
/// [`RawRange`](crate::anchor::RawRange).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveRange {
    pub start: RangeBoundary,
    pub end: RangeBoundary,
}

impl LiveRange {
    pub fn new(start_node: NodeId, start_offset: usize, end_node: NodeId, end_offset: usize) -> Self {
        LiveRange {
            start: RangeBoundary {
                node: start_node,
                offset: start_offset,
            },
            end: RangeBoundary {
                node: end_node,
                offset: end_offset,
            },
        }
    }

    pub fn collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Whether both boundaries still reference attached text nodes with
    /// in-bounds offsets. A range that fails this has been invalidated by a
    /// DOM replacement and must not be used for geometry or highlighting.
    pub fn is_live(&self, doc: &Document) -> bool {
        for boundary in [&self.start, &self.end] {
            if !doc.is_text(boundary.node)
                || !doc.is_attached(boundary.node)
                || boundary.offset > doc.text_len(boundary.node)
            {
                return false;
            }
        }
        true
    }

    /// Resolve both boundaries down to text nodes, following the drilling
    /// rule: an element boundary at the child-count offset lands at the end
    /// of the previous child's text, any other element boundary lands at the
    /// start of the next child's text. Returns `None` when a boundary has no
    /// text to land on (an element with no text content at all).
    pub fn normalized(&self, doc: &Document) -> Option<LiveRange> {
        Some(LiveRange {
            start: drill_to_text(doc, self.start)?,
            end: drill_to_text(doc, self.end)?,
        })
    }

    /// The characters this range spans, concatenated in document order.
    /// Returns an empty string for collapsed or non-normalizable ranges.
    pub fn text(&self, doc: &Document) -> String {
        let Some(range) = self.normalized(doc) else {
            return String::new();
        };
        if range.start.node == range.end.node {
            let text = doc.text(range.start.node).unwrap_or_default();
            return char_slice(text, range.start.offset, range.end.offset);
        }

        let order = doc.text_nodes_under(doc.root());
        let Some(si) = order.iter().position(|&n| n == range.start.node) else {
            return String::new();
        };
        let Some(ei) = order.iter().position(|&n| n == range.end.node) else {
            return String::new();
        };
        if si > ei {
            return String::new();
        }

        let mut out = String::new();
        let start_text = doc.text(range.start.node).unwrap_or_default();
        out.push_str(&char_slice(
            start_text,
            range.start.offset,
            doc.text_len(range.start.node),
        ));
        for &node in &order[si + 1..ei] {
            out.push_str(doc.text(node).unwrap_or_default());
        }
        let end_text = doc.text(range.end.node).unwrap_or_default();
        out.push_str(&char_slice(end_text, 0, range.end.offset));
        out
    }
}

fn drill_to_text(doc: &Document, boundary: RangeBoundary) -> Option<RangeBoundary> {
    if doc.is_text(boundary.node) {
        return Some(boundary);
    }
    let children = doc.children(boundary.node);
    if boundary.offset >= children.len() {
        // Boundary sits past the last child: land at the previous text end.
        let node = children
            .iter()
            .rev()
            .find_map(|&c| doc.last_text_node(c))?;
        return Some(RangeBoundary {
            offset: doc.text_len(node),
            node,
        });
    }
    // Land at the start of the next text run at or after the indexed child,
    // falling back to the previous text end when nothing follows.
    if let Some(node) = children[boundary.offset..]
        .iter()
        .find_map(|&c| doc.first_text_node(c))
    {
        return Some(RangeBoundary { node, offset: 0 });
    }
    let node = children[..boundary.offset]
        .iter()
        .rev()
        .find_map(|&c| doc.last_text_node(c))?;
    Some(RangeBoundary {
        offset: doc.text_len(node),
        node,
    })
}

fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end.saturating_sub(start)).collect()
}
