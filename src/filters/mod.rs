//! Inspection filters: catalog, slot chain and filtergraph composition.

pub mod catalog;
pub mod chain;
pub mod graph;
pub mod tokens;

pub use catalog::{FilterDef, SlotCapability, CATALOG};
pub use chain::{ChainError, FilterChain, FilterSlot, SlotId, MAX_SLOTS};
pub use graph::{compose, GraphOptions, LayoutMode};
pub use tokens::{FontResource, TokenContext};
