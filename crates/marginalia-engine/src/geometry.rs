//! Geometry seam between the headless engine and whatever renders it.
//!
//! The engine owns no layout: bounding rectangles and scroll offsets come
//! from a host-provided [`GeometrySource`]. A monospace grid implementation
//! is included for tests and the CLI, where a real renderer is absent.

use crate::dom::{Document, LiveRange};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// An axis-aligned rectangle in page coordinates (viewport-relative, the way
/// selection geometry is reported; add the scroll offset for absolute
/// placement).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// A selection object with no visible extent (caret only) reports a rect
    /// with zero width and zero height.
    pub fn is_zero_extent(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect {
            left,
            top,
            width: right - left,
            height: bottom - top,
        }
    }
}

/// Where the engine asks for layout-derived data.
pub trait GeometrySource {
    /// Bounding rectangle of a live range, or `None` when the range no
    /// longer maps to laid-out content.
    fn range_rect(&self, doc: &Document, range: &LiveRange) -> Option<Rect>;

    /// Current page scroll offset.
    fn scroll_offset(&self) -> Point;
}

/// Monospace layout model: the document's text flows into a grid of
/// fixed-size character cells, `cols` per line. Good enough to exercise
/// geometry-dependent behavior without a renderer.
#[derive(Debug, Clone)]
pub struct CharGridGeometry {
    pub cols: usize,
    pub char_width: f64,
    pub line_height: f64,
    pub scroll: Point,
}

impl CharGridGeometry {
    pub fn new(cols: usize) -> Self {
        CharGridGeometry {
            cols,
            char_width: 8.0,
            line_height: 16.0,
            scroll: Point::default(),
        }
    }

    /// Global char offset of a normalized boundary within the document text.
    fn global_offset(&self, doc: &Document, node: crate::dom::NodeId, offset: usize) -> Option<usize> {
        if !doc.is_text(node) || !doc.is_attached(node) {
            return None;
        }
        let mut total = 0;
        for text_node in doc.text_nodes_under(doc.root()) {
            if text_node == node {
                return Some(total + offset.min(doc.text_len(node)));
            }
            total += doc.text_len(text_node);
        }
        None
    }
}

impl GeometrySource for CharGridGeometry {
    fn range_rect(&self, doc: &Document, range: &LiveRange) -> Option<Rect> {
        let normalized = range.normalized(doc)?;
        let start = self.global_offset(doc, normalized.start.node, normalized.start.offset)?;
        let end = self.global_offset(doc, normalized.end.node, normalized.end.offset)?;
        if end < start {
            return None;
        }

        let start_row = start / self.cols;
        let start_col = start % self.cols;
        if end == start {
            return Some(Rect {
                left: start_col as f64 * self.char_width,
                top: start_row as f64 * self.line_height,
                width: 0.0,
                height: 0.0,
            });
        }

        let end_row = (end - 1) / self.cols;
        let end_col = (end - 1) % self.cols;
        if start_row == end_row {
            Some(Rect {
                left: start_col as f64 * self.char_width,
                top: start_row as f64 * self.line_height,
                width: (end_col + 1 - start_col) as f64 * self.char_width,
                height: self.line_height,
            })
        } else {
            // Multi-line selections occupy the full column width.
            Some(Rect {
                left: 0.0,
                top: start_row as f64 * self.line_height,
                width: self.cols as f64 * self.char_width,
                height: (end_row - start_row + 1) as f64 * self.line_height,
            })
        }
    }

    fn scroll_offset(&self) -> Point {
        self.scroll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::LiveRange;
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        Document::parse_xhtml(r#"<article id="article"><p id="text0">Hello, world.</p></article>"#)
            .unwrap()
    }

    #[test]
    fn single_line_selection_rect() {
        let doc = doc();
        let geometry = CharGridGeometry::new(80);
        let text = doc.first_text_node(doc.root()).unwrap();
        let rect = geometry
            .range_rect(&doc, &LiveRange::new(text, 7, text, 12))
            .unwrap();

        assert_eq!(rect.left, 7.0 * 8.0);
        assert_eq!(rect.top, 0.0);
        assert_eq!(rect.width, 5.0 * 8.0);
        assert_eq!(rect.height, 16.0);
        assert!(!rect.is_zero_extent());
    }

    #[test]
    fn collapsed_selection_has_zero_extent() {
        let doc = doc();
        let geometry = CharGridGeometry::new(80);
        let text = doc.first_text_node(doc.root()).unwrap();
        let rect = geometry
            .range_rect(&doc, &LiveRange::new(text, 3, text, 3))
            .unwrap();
        assert!(rect.is_zero_extent());
    }

    #[test]
    fn multi_line_selection_spans_full_width() {
        let doc = doc();
        let geometry = CharGridGeometry::new(5);
        let text = doc.first_text_node(doc.root()).unwrap();
        let rect = geometry
            .range_rect(&doc, &LiveRange::new(text, 0, text, 13))
            .unwrap();

        assert_eq!(rect.left, 0.0);
        assert_eq!(rect.width, 5.0 * 8.0);
        assert_eq!(rect.height, 3.0 * 16.0);
    }

    #[test]
    fn detached_range_has_no_rect() {
        let mut doc = doc();
        let geometry = CharGridGeometry::new(80);
        let para = doc.element_by_id("text0").unwrap();
        let text = doc.first_text_node(doc.root()).unwrap();
        let range = LiveRange::new(text, 0, text, 5);

        doc.detach(para);
        assert_eq!(geometry.range_rect(&doc, &range), None);
    }

    #[test]
    fn union_covers_both_rects() {
        let a = Rect {
            left: 0.0,
            top: 0.0,
            width: 10.0,
            height: 10.0,
        };
        let b = Rect {
            left: 20.0,
            top: 5.0,
            width: 10.0,
            height: 10.0,
        };
        let u = a.union(&b);
        assert_eq!(u.left, 0.0);
        assert_eq!(u.right(), 30.0);
        assert_eq!(u.bottom(), 15.0);
    }
}
