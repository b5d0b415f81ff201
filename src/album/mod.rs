//! Album pipeline
//!
//! Inbound media is appended to the session queue, a per-session debounce
//! timer waits for the burst to end, then the queue is split into media
//! group pages and posted in order.

/// Per-session debounce timers
pub mod debounce;
/// Sequential page dispatch with failure containment
pub mod dispatch;
/// Balanced, order-preserving queue pagination
pub mod paginate;
/// Session media queue operations
pub mod queue;
/// Entry points used by the bot handlers
pub mod service;
/// Outbound messaging seam
pub mod transport;

pub use debounce::Debouncer;
pub use dispatch::{AlbumDispatcher, AlbumOutcome, ChatContext};
pub use paginate::{paginate, AlbumError};
pub use service::AlbumService;
pub use transport::{MediaTransport, TransportError};
