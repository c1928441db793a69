//! tessera-core: the document core of the Tessera view engine.
//!
//! Authored JSON documents (screens, actions, components) decode into a
//! single canonical [`TaggedValue`] tree. Everything else in this crate
//! operates on that tree:
//!
//! - [`value`] -- the tagged value type, its JSON codec and lossy coercions
//! - [`context`] -- parent-chained data contexts and `$.path` resolution
//! - [`transform`] -- the `| name:param` post-processing pipeline
//! - [`condition`] -- the visibility expression language
//! - [`document`] -- typed views (ViewNode, ActionDefinition, ...) derived
//!   on demand from tagged values
//!
//! Nothing in here performs I/O or fails on author mistakes: unresolvable
//! bindings, unknown transforms and undecodable props all degrade to absent
//! values.

pub mod condition;
pub mod context;
pub mod document;
pub mod error;
pub mod transform;
pub mod value;

// ── Convenience re-exports ───────────────────────────────────────────

pub use condition::{evaluate, is_empty, is_truthy};
pub use context::DataContext;
pub use document::{ActionDefinition, ComponentDefinition, TabDefinition, ViewNode};
pub use error::CodecError;
pub use transform::apply_transform;
pub use value::{decode, encode, TaggedValue, ValueMap};
