//! Core engine modules - transport sync, reconciliation, events, player
//!
//! These modules form the playback engine, independent of any frontend.

pub mod debounced_apply;
pub mod event_bus;
pub mod frame_model;
pub mod mapper;
pub mod output_scale;
pub mod player;
pub mod player_events;
pub mod reconciler;
pub mod sim_transport;
pub mod sync;
pub mod transport;

// Re-exports for convenience
pub use debounced_apply::DebouncedApply;
pub use event_bus::EventBus;
pub use frame_model::{FrameModel, StatsTimeline};
pub use mapper::FrameTimeMapper;
pub use output_scale::{OutputScale, ScaleMode};
pub use player::{Player, PlayerError, PlayerOptions};
pub use reconciler::{PositionReconciler, ReconcileState, SyncDirection};
pub use sim_transport::SimTransport;
pub use sync::{SyncConfig, SyncError, TransportSync};
pub use transport::{PlaybackState, StepDirection, Transport, TransportError, TransportEvent};
