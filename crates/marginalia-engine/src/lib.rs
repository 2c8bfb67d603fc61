pub mod anchor;
pub mod comments;
pub mod dom;
pub mod geometry;
pub mod highlight;
pub mod observer;
pub mod overlay;
pub mod registry;
pub mod timer;

// Re-export key types for easier usage
pub use anchor::{AnchorResolutionError, Pointer, RawRange, decode, encode};
pub use comments::{CommentLayer, SavedComment};
pub use dom::{Document, DomError, LiveRange, NodeId, RangeBoundary};
pub use geometry::{CharGridGeometry, GeometrySource, Point, Rect};
pub use highlight::{HighlightHandle, highlight_range, highlight_range_with};
pub use observer::{ObserverConfig, SelectedRegion, Selection, SelectionObserver, SelectionOutcome};
pub use overlay::{OverlayConfig, OverlayCoordinator, OverlayPhase};
pub use registry::HighlightRegistry;
pub use timer::{Millis, TimerQueue, TimerToken};
