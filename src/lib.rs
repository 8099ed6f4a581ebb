//! QCPLAY - frame-accurate QC player core
//!
//! Re-exports all modules for use by binary targets.

// Core engine (transport sync, reconciliation, events, player)
pub mod core;

// Filter graph composition
pub mod filters;

// App modules
pub mod cli;
pub mod config;
pub mod media;
pub mod settings;
pub mod timecode;

// Re-export commonly used types from core
pub use core::event_bus::{BoxedEvent, EventBus, downcast_event};
pub use core::player::Player;
pub use core::sync::TransportSync;
pub use core::transport::Transport;

pub use filters::{FilterChain, LayoutMode};
pub use media::MediaInfo;
