//! Active-highlight registry: sole owner of the currently-applied highlight
//! handles.
//!
//! Handles are only installed through [`HighlightRegistry::replace_all`],
//! which retracts everything it currently tracks before storing the new set.
//! That replace-then-install discipline is what guarantees no two wrap-sets
//! ever coexist over the same text.

use crate::dom::Document;
use crate::highlight::HighlightHandle;

#[derive(Debug, Default)]
pub struct HighlightRegistry {
    handles: Vec<HighlightHandle>,
}

impl HighlightRegistry {
    pub fn new() -> Self {
        HighlightRegistry::default()
    }

    pub fn handles(&self) -> &[HighlightHandle] {
        &self.handles
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Retract every tracked handle, then take ownership of `new_handles`.
    /// This is the only way highlights are installed.
    pub fn replace_all(&mut self, doc: &mut Document, new_handles: Vec<HighlightHandle>) {
        self.retract_all(doc);
        self.handles = new_handles;
    }

    /// Retract everything and empty the collection. Must be called on
    /// teardown so no wrapper elements are leaked into the document.
    pub fn clear(&mut self, doc: &mut Document) {
        self.retract_all(doc);
        self.handles.clear();
    }

    fn retract_all(&mut self, doc: &mut Document) {
        for handle in &mut self.handles {
            handle.retract(doc);
        }
    }
}
