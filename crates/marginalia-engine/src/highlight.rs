//! Highlight engine: wraps the text of a live range in inert marker elements
//! and hands back a reversible handle.
//!
//! Applying a highlight splits the boundary text nodes so that exactly the
//! in-range characters sit in their own nodes, then wraps each spanned text
//! node in a `<span>` carrying the requested class. Total character count and
//! order are never altered, only the tree shape around the text.
//!
//! Retraction moves every wrapped text node back into its original position
//! and drops the wrapper. Text nodes created by boundary splitting are *not*
//! re-merged afterwards; the rendered text is unaffected, only the node
//! granularity differs from the pre-highlight tree.

use crate::dom::{Document, LiveRange, NodeId};

/// Owner of the wrapper elements created for one applied highlight.
///
/// Ownership is exclusive: no two handles may wrap the same text node, which
/// the [`registry`](crate::registry) enforces by retracting superseded
/// handles before new ones are installed.
#[derive(Debug)]
pub struct HighlightHandle {
    wrappers: Vec<NodeId>,
    range: Option<LiveRange>,
    retracted: bool,
}

impl HighlightHandle {
    fn noop() -> Self {
        HighlightHandle {
            wrappers: Vec::new(),
            range: None,
            retracted: false,
        }
    }

    /// The wrapper elements, in document order. Empty for a no-op handle.
    pub fn wrappers(&self) -> &[NodeId] {
        &self.wrappers
    }

    /// The range as adjusted after wrapping reparented its text nodes, usable
    /// for immediate geometry queries. `None` for a no-op handle.
    pub fn range(&self) -> Option<LiveRange> {
        self.range
    }

    pub fn is_noop(&self) -> bool {
        self.wrappers.is_empty()
    }

    pub fn is_retracted(&self) -> bool {
        self.retracted
    }

    /// Unwrap every wrapper, restoring the text to its parent. Idempotent:
    /// retracting twice, or retracting a no-op handle, does nothing.
    pub fn retract(&mut self, doc: &mut Document) {
        if self.retracted {
            return;
        }
        for &wrapper in &self.wrappers {
            doc.unwrap(wrapper);
        }
        self.retracted = true;
    }

    /// Swap the visual class of every wrapper in place without retracting.
    /// Used to toggle a highlight between dim and active states.
    pub fn relabel(&mut self, doc: &mut Document, class: &str) {
        if self.retracted {
            return;
        }
        for &wrapper in &self.wrappers {
            doc.set_attr(wrapper, "class", class);
        }
    }
}

/// Highlight a live range with the given class.
pub fn highlight_range(doc: &mut Document, range: &LiveRange, class: &str) -> HighlightHandle {
    highlight_range_with(doc, range, class, |_| {})
}

/// Highlight a live range, invoking `on_wrapper` for each wrapper element as
/// it is created so the caller can wire up click handling or other behavior.
///
/// Collapsed, reversed, or non-normalizable ranges produce a no-op handle.
pub fn highlight_range_with(
    doc: &mut Document,
    range: &LiveRange,
    class: &str,
    mut on_wrapper: impl FnMut(NodeId),
) -> HighlightHandle {
    let Some(normalized) = range.normalized(doc) else {
        return HighlightHandle::noop();
    };
    if normalized.collapsed() {
        return HighlightHandle::noop();
    }

    let order = doc.text_nodes_under(doc.root());
    let Some(mut si) = order.iter().position(|&n| n == normalized.start.node) else {
        return HighlightHandle::noop();
    };
    let Some(mut ei) = order.iter().position(|&n| n == normalized.end.node) else {
        return HighlightHandle::noop();
    };
    let mut start_off = normalized.start.offset;
    let mut end_off = normalized.end.offset;
    if si > ei {
        return HighlightHandle::noop();
    }

    // A start boundary at the very end of its node holds no in-range chars;
    // step forward. Likewise an end boundary at offset zero excludes its node.
    while si < ei && start_off >= doc.text_len(order[si]) {
        si += 1;
        start_off = 0;
    }
    while ei > si && end_off == 0 {
        ei -= 1;
        end_off = doc.text_len(order[ei]);
    }
    if si == ei && start_off >= end_off {
        return HighlightHandle::noop();
    }

    // Isolate exactly the in-range characters into their own text nodes.
    let mut targets: Vec<NodeId> = Vec::new();
    if si == ei {
        let mut node = order[si];
        if start_off > 0 {
            node = doc.split_text(node, start_off);
            end_off -= start_off;
        }
        if end_off < doc.text_len(node) {
            doc.split_text(node, end_off);
        }
        targets.push(node);
    } else {
        let mut start_node = order[si];
        if start_off > 0 {
            start_node = doc.split_text(start_node, start_off);
        }
        targets.push(start_node);
        targets.extend(
            order[si + 1..ei]
                .iter()
                .copied()
                .filter(|&n| doc.text_len(n) > 0),
        );
        let end_node = order[ei];
        if end_off < doc.text_len(end_node) {
            doc.split_text(end_node, end_off);
        }
        targets.push(end_node);
    }

    let mut wrappers = Vec::with_capacity(targets.len());
    for node in targets {
        let wrapper = doc.create_element("span");
        doc.set_attr(wrapper, "class", class);
        doc.wrap(node, wrapper);
        on_wrapper(wrapper);
        wrappers.push(wrapper);
    }

    // Wrapping reparented the boundary nodes; report equivalent positions.
    let first_text = doc.children(wrappers[0])[0];
    let last_text = doc.children(wrappers[wrappers.len() - 1])[0];
    let adjusted = LiveRange::new(first_text, 0, last_text, doc.text_len(last_text));

    HighlightHandle {
        wrappers,
        range: Some(adjusted),
        retracted: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn simple_doc() -> Document {
        Document::parse_xhtml(r#"<article id="article"><p id="text0">Hello, world.</p></article>"#)
            .unwrap()
    }

    fn nested_doc() -> Document {
        Document::parse_xhtml(
            r#"<article id="article"><p id="p-0">alpha <em>beta</em> gamma</p></article>"#,
        )
        .unwrap()
    }

    #[test]
    fn wraps_exactly_the_selected_chars() {
        let mut doc = simple_doc();
        let text = doc.first_text_node(doc.root()).unwrap();
        let range = LiveRange::new(text, 7, text, 12);

        let handle = highlight_range(&mut doc, &range, "highlight");
        assert_eq!(handle.wrappers().len(), 1);
        let wrapper = handle.wrappers()[0];
        assert_eq!(doc.attr(wrapper, "class"), Some("highlight"));
        assert_eq!(doc.text_content(wrapper), "world");
        assert_eq!(doc.text_content(doc.root()), "Hello, world.");
    }

    #[test]
    fn apply_then_retract_preserves_characters() {
        let mut doc = nested_doc();
        let before = doc.text_content(doc.root());
        let texts = doc.text_nodes_under(doc.root());
        let range = LiveRange::new(texts[0], 2, texts[2], 4);

        let mut handle = highlight_range(&mut doc, &range, "highlight");
        assert_eq!(doc.text_content(doc.root()), before);

        handle.retract(&mut doc);
        assert_eq!(doc.text_content(doc.root()), before);
        for &wrapper in handle.wrappers() {
            assert!(!doc.is_attached(wrapper));
        }
    }

    #[test]
    fn spans_are_created_per_text_node() {
        let mut doc = nested_doc();
        let texts = doc.text_nodes_under(doc.root());
        // "pha beta gam": partial start node, whole middle node, partial end.
        let range = LiveRange::new(texts[0], 2, texts[2], 4);
        let handle = highlight_range(&mut doc, &range, "highlight");
        assert_eq!(handle.wrappers().len(), 3);

        let highlighted: String = handle
            .wrappers()
            .iter()
            .map(|&w| doc.text_content(w))
            .collect();
        assert_eq!(highlighted, "pha beta gam");
    }

    #[test]
    fn adjusted_range_reports_the_wrapped_span() {
        let mut doc = simple_doc();
        let text = doc.first_text_node(doc.root()).unwrap();
        let range = LiveRange::new(text, 7, text, 12);
        let handle = highlight_range(&mut doc, &range, "highlight");

        let adjusted = handle.range().unwrap();
        assert!(adjusted.is_live(&doc));
        assert_eq!(adjusted.text(&doc), "world");
    }

    #[test]
    fn collapsed_range_is_a_noop() {
        let mut doc = simple_doc();
        let before = doc.to_html();
        let text = doc.first_text_node(doc.root()).unwrap();
        let range = LiveRange::new(text, 4, text, 4);

        let mut handle = highlight_range(&mut doc, &range, "highlight");
        assert!(handle.is_noop());
        assert_eq!(doc.to_html(), before);
        handle.retract(&mut doc);
        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn retract_is_idempotent() {
        let mut doc = simple_doc();
        let text = doc.first_text_node(doc.root()).unwrap();
        let range = LiveRange::new(text, 0, text, 5);

        let mut handle = highlight_range(&mut doc, &range, "highlight");
        handle.retract(&mut doc);
        let after_first = doc.to_html();
        handle.retract(&mut doc);
        assert_eq!(doc.to_html(), after_first);
        assert!(handle.is_retracted());
    }

    #[test]
    fn relabel_swaps_class_without_retracting() {
        let mut doc = simple_doc();
        let text = doc.first_text_node(doc.root()).unwrap();
        let range = LiveRange::new(text, 7, text, 12);

        let mut handle = highlight_range(&mut doc, &range, "commented");
        handle.relabel(&mut doc, "commented-clicked");
        for &wrapper in handle.wrappers() {
            assert_eq!(doc.attr(wrapper, "class"), Some("commented-clicked"));
            assert!(doc.is_attached(wrapper));
        }
    }

    #[test]
    fn on_wrapper_fires_for_each_wrapper() {
        let mut doc = nested_doc();
        let texts = doc.text_nodes_under(doc.root());
        let range = LiveRange::new(texts[0], 0, texts[2], 6);

        let mut seen = Vec::new();
        let handle = highlight_range_with(&mut doc, &range, "commented", |w| seen.push(w));
        assert_eq!(seen, handle.wrappers());
    }

    #[test]
    fn start_boundary_at_node_end_excludes_that_node() {
        let mut doc = nested_doc();
        let texts = doc.text_nodes_under(doc.root());
        // Start at the very end of "alpha ": no char of it is in range.
        let range = LiveRange::new(texts[0], 6, texts[1], 4);
        let handle = highlight_range(&mut doc, &range, "highlight");

        let highlighted: String = handle
            .wrappers()
            .iter()
            .map(|&w| doc.text_content(w))
            .collect();
        assert_eq!(highlighted, "beta");
        assert_eq!(doc.text_content(doc.root()), "alpha beta gamma");
    }

    #[test]
    fn end_boundary_at_zero_excludes_that_node() {
        let mut doc = nested_doc();
        let texts = doc.text_nodes_under(doc.root());
        let range = LiveRange::new(texts[0], 2, texts[1], 0);
        let handle = highlight_range(&mut doc, &range, "highlight");

        let highlighted: String = handle
            .wrappers()
            .iter()
            .map(|&w| doc.text_content(w))
            .collect();
        assert_eq!(highlighted, "pha ");
    }

    #[test]
    fn retraction_leaves_split_nodes_unmerged() {
        // Documented limitation: the text is identical but the node that was
        // split stays split.
        let mut doc = simple_doc();
        let para = doc.element_by_id("text0").unwrap();
        let text = doc.first_text_node(doc.root()).unwrap();
        let range = LiveRange::new(text, 7, text, 12);

        let mut handle = highlight_range(&mut doc, &range, "highlight");
        handle.retract(&mut doc);

        assert_eq!(doc.text_content(para), "Hello, world.");
        assert_eq!(doc.children(para).len(), 3);
    }
}
