//! Capture sources
//!
//! A [`CaptureSource`] is pulled one frame at a time. `Ok(None)` means no
//! frame is available right now (end of a stored capture, or a live read
//! timeout); it never means the source is broken. Dropping a source releases
//! the underlying handle.
//!
//! ## Usage
//!
//! ```ignore
//! use layer2_core::capture::{CaptureSource, FileSource};
//! use layer2_core::CaptureConfig;
//!
//! let mut source = FileSource::open("beacons.pcap", &CaptureConfig::default())?;
//! while let Some(frame) = source.next_frame()? {
//!     println!("{} bytes", frame.data.len());
//! }
//! ```

mod file;
mod filter;
#[cfg(feature = "live")]
mod live;
mod memory;

use std::sync::Arc;
use std::time::Duration;

use crate::LinkType;

pub use file::FileSource;
#[cfg(feature = "live")]
pub use live::LiveSource;
pub use memory::{Injector, MemorySource};

/// Capture metadata of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureMeta {
	/// Time since the epoch.
	pub timestamp: Duration,
	/// Length on the wire, which may exceed the captured bytes.
	pub orig_len: u32,
}

/// One frame as pulled from a source, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
	pub link_type: LinkType,
	pub data: Vec<u8>,
	pub meta: CaptureMeta,
}

impl RawFrame {
	/// A frame captured in full.
	pub fn new(link_type: LinkType, data: Vec<u8>, timestamp: Duration) -> Self {
		let orig_len = data.len() as u32;
		Self {
			link_type,
			data,
			meta: CaptureMeta {
				timestamp,
				orig_len,
			},
		}
	}

	/// Cuts the captured bytes down to `snaplen`.
	pub(crate) fn truncate(&mut self, snaplen: u32) {
		self.data.truncate(snaplen as usize);
	}
}

/// Counters reported by a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
	pub received: u32,
	pub dropped: u32,
	pub if_dropped: u32,
}

/// Wakes a source blocked in [`CaptureSource::next_frame`] from another thread.
pub trait SourceBreaker: Send + Sync {
	fn break_loop(&self);

	/// Forgets a request that was honoured without waking the source, so it
	/// cannot cut a later pull short.
	fn reset(&self) {}
}

/// A pull-based producer of raw frames.
pub trait CaptureSource: Send {
	fn link_type(&self) -> LinkType;

	fn snaplen(&self) -> u32;

	/// Pulls the next frame, or `None` when nothing is available right now.
	fn next_frame(&mut self) -> crate::Result<Option<RawFrame>>;

	/// Handle that interrupts a blocked pull, if the source can block.
	fn breaker(&self) -> Option<Arc<dyn SourceBreaker>> { None }

	fn stats(&mut self) -> crate::Result<CaptureStats>;
}

impl<S: CaptureSource + ?Sized> CaptureSource for Box<S> {
	fn link_type(&self) -> LinkType { (**self).link_type() }

	fn snaplen(&self) -> u32 { (**self).snaplen() }

	fn next_frame(&mut self) -> crate::Result<Option<RawFrame>> { (**self).next_frame() }

	fn breaker(&self) -> Option<Arc<dyn SourceBreaker>> { (**self).breaker() }

	fn stats(&mut self) -> crate::Result<CaptureStats> { (**self).stats() }
}
