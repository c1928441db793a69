//! tessera-runtime: everything around the document core that touches time,
//! the network or the file system.
//!
//! - [`dispatch`] -- the action interpreter (`navigate`, `api`, `sequence`, ...)
//! - [`endpoint`] -- the collaborator `api` actions call through
//! - [`source`] -- named document loading
//! - [`component`], [`theme`] -- registries loaded from documents
//! - [`expand`] -- headless expansion of a view tree against a context
//! - [`live`] -- per-screen cache of `onLoad` results
//! - [`config`] -- TOML runtime configuration
//!
//! Registries and caches are plain values owned by the host; nothing here is
//! a process-wide singleton.

pub mod component;
pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod expand;
pub mod live;
pub mod source;
pub mod theme;

// ── Convenience re-exports ───────────────────────────────────────────

pub use component::ComponentRegistry;
pub use config::RuntimeConfig;
pub use dispatch::{normalize_result, ActionDispatcher, DispatchTiming};
pub use endpoint::{Endpoint, HttpEndpoint, StaticEndpoint};
pub use error::{ConfigError, DocumentError, EndpointError};
pub use expand::{ExpandedNode, TreeExpander};
pub use live::{FetchOutcome, LiveDataCache};
pub use source::{load_screen, DirectorySource, DocumentSource, MemorySource};
pub use theme::{Appearance, ThemeEngine};
