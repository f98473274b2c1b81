//! Configuration types for capture sources.

use snafu::ensure;

use crate::constants::{DEFAULT_READ_TIMEOUT_MS, DEFAULT_SNAPLEN};
use crate::{Result, error};

/// Options applied when a capture source is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
	/// Maximum number of bytes kept per frame.
	pub snaplen: u32,
	/// Put the interface in promiscuous mode.
	pub promiscuous: bool,
	/// Put the interface in monitor (rfmon) mode.
	pub monitor: bool,
	/// Live read timeout; a pull that times out yields no frame.
	pub read_timeout_ms: u32,
	/// Kernel buffer size, `None` keeps the engine default.
	pub buffer_size: Option<u32>,
	/// BPF filter expression.
	pub filter: Option<String>,
}

impl Default for CaptureConfig {
	fn default() -> Self {
		Self {
			snaplen: DEFAULT_SNAPLEN,
			promiscuous: false,
			monitor: false,
			read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
			buffer_size: None,
			filter: None,
		}
	}
}

impl CaptureConfig {
	/// Create a new config with default values.
	#[must_use]
	pub fn new() -> Self { Self::default() }

	/// Set the snapshot length.
	#[must_use]
	pub fn with_snaplen(mut self, snaplen: u32) -> Self {
		self.snaplen = snaplen;
		self
	}

	/// Enable or disable promiscuous mode.
	#[must_use]
	pub fn with_promiscuous(mut self, promiscuous: bool) -> Self {
		self.promiscuous = promiscuous;
		self
	}

	/// Enable or disable monitor mode.
	#[must_use]
	pub fn with_monitor(mut self, monitor: bool) -> Self {
		self.monitor = monitor;
		self
	}

	/// Set the read timeout in milliseconds.
	#[must_use]
	pub fn with_read_timeout_ms(mut self, timeout: u32) -> Self {
		self.read_timeout_ms = timeout;
		self
	}

	/// Set the kernel buffer size.
	#[must_use]
	pub fn with_buffer_size(mut self, size: u32) -> Self {
		self.buffer_size = Some(size);
		self
	}

	/// Set the capture filter.
	#[must_use]
	pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
		self.filter = Some(filter.into());
		self
	}

	/// Reject option combinations no source can honour.
	pub fn validate(&self) -> Result<()> {
		ensure!(
			self.snaplen > 0,
			error::InvalidConfigSnafu {
				reason: "snaplen must be positive"
			}
		);
		if let Some(filter) = &self.filter {
			ensure!(
				!filter.trim().is_empty(),
				error::InvalidConfigSnafu {
					reason: "filter must not be empty"
				}
			);
		}
		Ok(())
	}
}
