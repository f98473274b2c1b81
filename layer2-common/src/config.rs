//! Configuration types for capture sessions.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use layer2_core::constants::DEFAULT_LOAD_FACTOR;
use layer2_core::{CaptureConfig, error as core_error};
use snafu::ensure;

/// Runtime configuration for a capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
	/// Options used when the capture source is opened.
	pub capture: CaptureConfig,
	/// Fraction of the output buffer after which a dispatch stops pulling.
	pub load_factor: f32,
	/// Wall-clock budget of one dispatch call, zero for none.
	pub dispatch_timeout: Duration,
	/// Every pulled frame is also written here when set.
	pub savefile: Option<PathBuf>,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			capture: CaptureConfig::default(),
			load_factor: DEFAULT_LOAD_FACTOR,
			dispatch_timeout: Duration::ZERO,
			savefile: None,
		}
	}
}

impl SessionConfig {
	/// Create a new config with default values.
	#[must_use]
	pub fn new() -> Self { Self::default() }

	/// Set the capture source options.
	#[must_use]
	pub fn with_capture(mut self, capture: CaptureConfig) -> Self {
		self.capture = capture;
		self
	}

	/// Set the high-watermark fraction.
	#[must_use]
	pub fn with_load_factor(mut self, load_factor: f32) -> Self {
		self.load_factor = load_factor;
		self
	}

	/// Set the per-call time budget.
	#[must_use]
	pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
		self.dispatch_timeout = timeout;
		self
	}

	/// Tee pulled frames into a pcap savefile.
	#[must_use]
	pub fn with_savefile(mut self, path: impl Into<PathBuf>) -> Self {
		self.savefile = Some(path.into());
		self
	}

	pub fn validate(&self) -> layer2_core::Result<()> {
		ensure!(
			self.load_factor > 0.0 && self.load_factor <= 1.0,
			core_error::InvalidConfigSnafu {
				reason: format!("load factor {} is outside (0, 1]", self.load_factor)
			}
		);
		self.capture.validate()
	}
}

/// Shared configuration handle; dispatch reads it at the start of each call.
pub type SharedConfig = Arc<parking_lot::RwLock<SessionConfig>>;

/// Create a new shared configuration.
#[must_use]
pub fn shared_config(config: SessionConfig) -> SharedConfig {
	Arc::new(parking_lot::RwLock::new(config))
}
