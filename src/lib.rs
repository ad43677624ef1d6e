//! EPUB CFI
//!
//! Parses EPUB Canonical Fragment Identifiers and resolves them against
//! document trees:
//! - `cfi`: parsing and resolution
//! - `document`: the read-only tree interface resolution works over
//! - `config`: environment configuration for the command-line tool
//!
//! Resolution is a pure function of the parsed CFI and the document it is
//! given. Nothing is cached or mutated, so a parsed [`Cfi`] can be shared
//! between threads freely.

pub mod cfi;
pub mod config;
pub mod document;
pub mod error;

// Re-export common types
pub use cfi::{
    Cfi, NodeTarget, Part, RelativeToNode, ResolveOptions, ResolvedLocation, SideBias,
    SpatialRange, Step, TextLocationAssertion,
};
pub use document::{DocumentTree, MemoryDocument, NodeId, NodeKind};
pub use error::{CfiError, Result};
