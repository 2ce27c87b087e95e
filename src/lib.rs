//! Graph Spotlight - an embeddable fuzzy-search palette core for a
//! node-graph editor.
//!
//! The host editor owns the canvas, the DOM, and the event loop; this
//! crate owns the query-to-ranked-results pipeline and the palette's
//! interactive state machine:
//!
//! - keyword and `name:value` filter parsing ([`query`])
//! - pluggable keyword/default handlers, filters, info providers, and
//!   selection commands ([`registry`], [`builtins`])
//! - candidate assembly from a live graph snapshot ([`candidates`])
//! - fuzzy ranking with brace-expansion union ([`matcher`], [`search`])
//! - highlight mapping back onto structured display fields ([`document`],
//!   [`render`])
//! - the modal open/preview/select state machine ([`session`])
//!
//! The host injects a [`graph::GraphSource`] and a [`graph::Navigation`]
//! capability and drives a [`session::SpotlightSession`] from its input
//! events.

pub mod builtins;
pub mod candidates;
pub mod config;
pub mod document;
pub mod error;
pub mod graph;
pub mod items;
pub mod logging;
pub mod matcher;
pub mod query;
pub mod registry;
pub mod render;
pub mod search;
pub mod session;

pub use config::SpotlightConfig;
pub use error::{Result, SpotlightError};
pub use items::{Item, MatchResult};
pub use registry::SpotlightRegistry;
pub use render::RenderedRow;
pub use session::{CloseReason, SpotlightSession};
