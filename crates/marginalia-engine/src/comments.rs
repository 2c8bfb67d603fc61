//! Persisted comment layer: re-materializes saved comment anchors as
//! highlights and tracks their callout geometry and click state.
//!
//! Comments arrive as `SavedComment` records from whatever persistence layer
//! the host uses. Each one is decoded through the anchor codec and highlighted
//! with the dim comment class; clicking a comment's wrapper toggles it to the
//! active class. Anchors that no longer resolve (the document changed since
//! the comment was saved) are skipped with a warning and do not disturb the
//! rest.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::anchor::{self, RawRange};
use crate::dom::{Document, NodeId};
use crate::geometry::{GeometrySource, Point, Rect};
use crate::highlight::{HighlightHandle, highlight_range_with};

/// Class for an at-rest comment highlight.
pub const COMMENT_CLASS: &str = "commented";
/// Class for a clicked (active) comment highlight.
pub const COMMENT_ACTIVE_CLASS: &str = "commented-clicked";
/// Horizontal gap between a highlight's right edge and its callout.
pub const CALLOUT_GUTTER: f64 = 12.0;

/// One persisted comment: identity, body text, and the durable anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedComment {
    pub id: Uuid,
    pub content: String,
    pub range: RawRange,
}

/// A comment that resolved against the current document.
#[derive(Debug)]
pub struct CommentEntry {
    comment: SavedComment,
    handle: HighlightHandle,
    rect: Rect,
    active: bool,
}

impl CommentEntry {
    pub fn comment(&self) -> &SavedComment {
        &self.comment
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn wrappers(&self) -> &[NodeId] {
        self.handle.wrappers()
    }
}

#[derive(Debug, Default)]
pub struct CommentLayer {
    entries: Vec<CommentEntry>,
    scroll: Point,
}

impl CommentLayer {
    /// Decode and highlight every saved comment. Unresolvable anchors are
    /// logged and skipped; the remaining comments still materialize.
    pub fn materialize(
        doc: &mut Document,
        comments: Vec<SavedComment>,
        geometry: &dyn GeometrySource,
    ) -> CommentLayer {
        let mut entries = Vec::with_capacity(comments.len());
        for comment in comments {
            let live = match anchor::decode(doc, &comment.range) {
                Ok(live) => live,
                Err(err) => {
                    log::warn!("comment {} no longer resolves: {err}", comment.id);
                    continue;
                }
            };
            let handle = highlight_range_with(doc, &live, COMMENT_CLASS, |_| {});
            if handle.is_noop() {
                log::warn!("comment {} anchors an empty range", comment.id);
                continue;
            }
            let rect = handle
                .range()
                .and_then(|range| geometry.range_rect(doc, &range))
                .unwrap_or_default();
            entries.push(CommentEntry {
                comment,
                handle,
                rect,
                active: false,
            });
        }
        CommentLayer {
            entries,
            scroll: geometry.scroll_offset(),
        }
    }

    pub fn entries(&self) -> &[CommentEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Which comment owns this wrapper element, if any. Used to dispatch
    /// clicks on highlighted text back to the comment UI.
    pub fn comment_at_wrapper(&self, node: NodeId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.handle.wrappers().contains(&node))
    }

    /// Toggle a comment between its dim and clicked states. Returns the new
    /// active state.
    pub fn toggle(&mut self, doc: &mut Document, index: usize) -> bool {
        let entry = &mut self.entries[index];
        entry.active = !entry.active;
        let class = if entry.active {
            COMMENT_ACTIVE_CLASS
        } else {
            COMMENT_CLASS
        };
        entry.handle.relabel(doc, class);
        entry.active
    }

    /// Page position for a comment's callout: just past the highlight's
    /// right edge, aligned with its top.
    pub fn callout_position(&self, index: usize) -> Option<Point> {
        let entry = self.entries.get(index)?;
        Some(Point {
            x: entry.rect.left + self.scroll.x + entry.rect.width + CALLOUT_GUTTER,
            y: entry.rect.top + self.scroll.y,
        })
    }

    /// Re-measure after a layout change. The first entry's horizontal
    /// position is the dirty check: when it is unchanged the layout did not
    /// move the text and the rest are left alone. Returns whether geometry
    /// was refreshed.
    pub fn refresh_geometry(&mut self, doc: &Document, geometry: &dyn GeometrySource) -> bool {
        let Some(first) = self.entries.first() else {
            return false;
        };
        let probe = first
            .handle
            .range()
            .and_then(|range| geometry.range_rect(doc, &range));
        if probe.is_some_and(|rect| rect.left == first.rect.left) {
            return false;
        }
        for entry in &mut self.entries {
            if let Some(rect) = entry
                .handle
                .range()
                .and_then(|range| geometry.range_rect(doc, &range))
            {
                entry.rect = rect;
            }
        }
        self.scroll = geometry.scroll_offset();
        true
    }

    /// Retract every comment highlight and drop the entries.
    pub fn teardown(&mut self, doc: &mut Document) {
        for entry in &mut self.entries {
            entry.handle.retract(doc);
        }
        self.entries.clear();
    }
}
