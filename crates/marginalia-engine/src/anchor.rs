//! Anchor codec: converts live selection ranges to durable, DOM-independent
//! addresses and back.
//!
//! A [`RawRange`] survives page reloads and re-renders because it addresses
//! text relative to the nearest ancestor carrying a stable `id` (assigned by
//! the external pre-processing pass), not by node identity. Encoding walks up
//! from the selection boundary to that ancestor, accumulating preceding text
//! at every level on the way; decoding descends the ancestor's subtree by the
//! same accounting. Offsets are accumulated through every intermediate parent,
//! so anchors inside nested inline markup round-trip exactly.
//!
//! Decoding an offset that exceeds the ancestor's current text length clamps
//! to the end of its text instead of failing: after minor content drift a
//! slightly-off highlight is more useful than a dropped annotation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dom::{Document, LiveRange, RangeBoundary};

/// One endpoint of an anchor: a stable element id plus a char offset from the
/// start of that element's concatenated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pointer {
    pub id: String,
    pub text_offset: usize,
}

/// A durable address for a text span. The persistence layer stores this as
/// plain JSON; the engine neither stores nor transmits it.
///
/// `start` is expected to precede or equal `end` in document order; the codec
/// does not reorder swapped input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRange {
    pub start: Pointer,
    pub end: Pointer,
}

/// The document state prevented resolving an anchor. Legitimate and
/// recoverable: the selection may have left the annotatable region, or the
/// paragraph an anchor pointed into may have been removed since it was saved.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnchorResolutionError {
    #[error("selection boundary has no ancestor carrying a stable id")]
    MissingStableId,
    #[error("no element with id `{0}` in the current document")]
    UnknownId(String),
    #[error("range boundary does not touch any text content")]
    NoTextAtBoundary,
}

/// Serialize a live range into a durable [`RawRange`].
///
/// Boundaries are normalized into text nodes first; encoding a collapsed
/// range is valid (cursor-position bookmarks need it). No DOM mutation.
pub fn encode(doc: &Document, range: &LiveRange) -> Result<RawRange, AnchorResolutionError> {
    let normalized = range
        .normalized(doc)
        .ok_or(AnchorResolutionError::NoTextAtBoundary)?;
    Ok(RawRange {
        start: encode_boundary(doc, normalized.start)?,
        end: encode_boundary(doc, normalized.end)?,
    })
}

fn encode_boundary(
    doc: &Document,
    boundary: RangeBoundary,
) -> Result<Pointer, AnchorResolutionError> {
    // Find the nearest ancestor with a non-empty stable id.
    let mut cursor = doc.parent(boundary.node);
    let (anchor, id) = loop {
        match cursor {
            Some(element) => {
                if let Some(id) = doc.stable_id(element) {
                    break (element, id.to_string());
                }
                cursor = doc.parent(element);
            }
            None => return Err(AnchorResolutionError::MissingStableId),
        }
    };

    // Accumulate preceding-sibling text at every level up to the anchor.
    let mut text_offset = boundary.offset;
    let mut node = boundary.node;
    while node != anchor {
        let mut sibling = doc.prev_sibling(node);
        while let Some(prev) = sibling {
            text_offset += doc.text_len(prev);
            sibling = doc.prev_sibling(prev);
        }
        node = match doc.parent(node) {
            Some(parent) => parent,
            None => return Err(AnchorResolutionError::MissingStableId),
        };
    }

    Ok(Pointer { id, text_offset })
}

/// Reconstruct a live range from a durable address against the current
/// document.
pub fn decode(doc: &Document, raw: &RawRange) -> Result<LiveRange, AnchorResolutionError> {
    Ok(LiveRange {
        start: decode_pointer(doc, &raw.start)?,
        end: decode_pointer(doc, &raw.end)?,
    })
}

fn decode_pointer(
    doc: &Document,
    pointer: &Pointer,
) -> Result<RangeBoundary, AnchorResolutionError> {
    let element = doc
        .element_by_id(&pointer.id)
        .ok_or_else(|| AnchorResolutionError::UnknownId(pointer.id.clone()))?;
    resolve_offset(doc, element, pointer.text_offset)
}

/// Descend from an anchor element to the text node holding `target`, walking
/// children in document order and recursing into the child where the running
/// total reaches the target. Overflowing offsets clamp to the end of the last
/// text-bearing child at each level.
fn resolve_offset(
    doc: &Document,
    element: crate::dom::NodeId,
    target: usize,
) -> Result<RangeBoundary, AnchorResolutionError> {
    let mut node = element;
    let mut remaining = target;
    loop {
        if doc.is_text(node) {
            let len = doc.text_len(node);
            return Ok(RangeBoundary {
                node,
                offset: remaining.min(len),
            });
        }

        let mut seen = 0;
        let mut landed = None;
        let mut last_text_bearing = None;
        for &child in doc.children(node) {
            let len = doc.text_len(child);
            if len == 0 {
                continue;
            }
            if remaining <= seen + len {
                landed = Some((child, remaining - seen));
                break;
            }
            seen += len;
            last_text_bearing = Some(child);
        }

        match landed {
            Some((child, rest)) => {
                node = child;
                remaining = rest;
            }
            None => match last_text_bearing {
                Some(child) => {
                    // Content shrank since the anchor was saved; show the
                    // nearest position rather than dropping the annotation.
                    remaining = doc.text_len(child);
                    node = child;
                }
                None => return Err(AnchorResolutionError::NoTextAtBoundary),
            },
        }
    }
}
