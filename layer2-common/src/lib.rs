//! Layer 2 capture sessions.
//!
//! Wraps a capture source in a [`Session`] that hands decoded, encoded frame
//! records to the host in batches sized to the host's buffer.

pub mod config;
mod dispatch;
pub mod error;
pub mod events;
pub mod host;
pub mod session;

// Re-exports for convenience
pub use config::{SessionConfig, SharedConfig, shared_config};
pub use error::{Error, Result};
pub use events::SessionEvent;
pub use host::CaptureHandle;
pub use layer2_core::{CaptureConfig, FrameRecord, LinkType, Pdu};
pub use session::Session;
