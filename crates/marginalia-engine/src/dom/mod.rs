//! Mutable DOM substrate the engine anchors into.
//!
//! The rendered document arrives as XHTML produced by the external conversion
//! pipeline, with stable `id` attributes already assigned to anchorable
//! elements. This module loads that markup into an arena of nodes
//! ([`Document`]), gives the rest of the engine the traversal and mutation
//! primitives it needs (text splitting, wrapping, unwrapping), and serializes
//! the mutated tree back to markup.

pub mod document;
pub mod node;
pub mod parse;
pub mod range;
pub mod serialize;

pub use document::Document;
pub use node::{NodeData, NodeId};
pub use parse::DomError;
pub use range::{LiveRange, RangeBoundary};
