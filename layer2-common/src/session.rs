//! Capture sessions.
//!
//! A [`Session`] owns one capture source for its whole life. Frames leave it
//! only through [`Session::dispatch`], at most one call at a time.
//!
//! ## Usage
//!
//! ```ignore
//! use layer2_common::{Session, SessionConfig};
//!
//! let session = Session::from_file("beacons.pcap", SessionConfig::default())?;
//! let mut buffer = vec![0u8; 64 * 1024];
//! let frames = session.dispatch(&mut buffer)?;
//! session.close();
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use layer2_core::capture::{CaptureStats, FileSource};
use layer2_core::savefile::SavefileWriter;
use layer2_core::{BincodeEncoder, CaptureSource, LinkType, RecordEncoder};
use parking_lot::Mutex;
use snafu::ResultExt;
use tracing::debug;

use crate::config::{SessionConfig, SharedConfig, shared_config};
use crate::dispatch::{Interrupt, Limits, Pipeline};
use crate::events::SessionEvent;
use crate::{Error, Result, error};

enum State {
	Ready(Box<Pipeline>),
	Closed,
}

/// Clears the in-flight flag on every exit path.
struct DispatchGuard<'a>(&'a AtomicBool);

impl<'a> DispatchGuard<'a> {
	fn acquire(flag: &'a AtomicBool) -> Result<Self> {
		flag
			.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
			.map_err(|_| Error::AlreadyDispatching)?;
		Ok(Self(flag))
	}
}

impl Drop for DispatchGuard<'_> {
	fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

/// A capture source plus the state carried between dispatch calls.
///
/// Closing a session while a dispatch is in flight is not supported;
/// [`Session::close`] requests a break and then waits for that call to
/// return before releasing the source.
pub struct Session {
	config: SharedConfig,
	state: Mutex<State>,
	dispatching: AtomicBool,
	interrupt: Interrupt,
	link_type: LinkType,
	snaplen: u32,
	event_tx: Option<kanal::Sender<SessionEvent>>,
}

impl Session {
	/// Opens a live interface.
	///
	/// # Errors
	///
	/// Returns [`Error::Config`] if the options are invalid or the interface
	/// cannot be activated
	#[cfg(feature = "live")]
	pub fn from_interface(interface: &str, config: SessionConfig) -> Result<Self> {
		config.validate().context(error::ConfigSnafu)?;
		let source = layer2_core::capture::LiveSource::open(interface, &config.capture)
			.context(error::ConfigSnafu)?;
		Self::from_source(source, config)
	}

	/// Opens a stored pcap capture.
	///
	/// # Errors
	///
	/// Returns [`Error::Config`] if the options are invalid or the file is not
	/// a readable savefile
	pub fn from_file(path: impl AsRef<Path>, config: SessionConfig) -> Result<Self> {
		config.validate().context(error::ConfigSnafu)?;
		let source = FileSource::open(path, &config.capture).context(error::ConfigSnafu)?;
		Self::from_source(source, config)
	}

	/// Wraps any capture source.
	pub fn from_source(source: impl CaptureSource + 'static, config: SessionConfig) -> Result<Self> {
		config.validate().context(error::ConfigSnafu)?;
		let link_type = source.link_type();
		let snaplen = source.snaplen();
		let savefile = config
			.savefile
			.as_ref()
			.map(|path| SavefileWriter::create(path, link_type, snaplen))
			.transpose()
			.context(error::SavefileSnafu)?;
		let interrupt = Interrupt::new(source.breaker());
		debug!(link_type = %link_type, snaplen, "session ready");

		Ok(Self {
			config: shared_config(config),
			state: Mutex::new(State::Ready(Box::new(Pipeline {
				source: Box::new(source),
				encoder: Box::new(BincodeEncoder),
				backlog: None,
				deferred: None,
				savefile,
			}))),
			dispatching: AtomicBool::new(false),
			interrupt,
			link_type,
			snaplen,
			event_tx: None,
		})
	}

	/// Replace the record encoder.
	#[must_use]
	pub fn with_encoder(mut self, encoder: impl RecordEncoder + 'static) -> Self {
		if let State::Ready(pipeline) = self.state.get_mut() {
			pipeline.encoder = Box::new(encoder);
		}
		self
	}

	/// Report session events on `tx`; events are dropped when it is full.
	#[must_use]
	pub fn with_event_sender(mut self, tx: kanal::Sender<SessionEvent>) -> Self {
		self.event_tx = Some(tx);
		self.notify(SessionEvent::Opened {
			link_type: self.link_type,
		});
		self
	}

	/// Fills `buffer` with encoded records and returns how many were written.
	///
	/// # Errors
	///
	/// - [`Error::AlreadyDispatching`] if another call is in flight
	/// - [`Error::InactiveSession`] after [`Session::close`]
	/// - [`Error::BufferTooSmall`] if the backlog record cannot fit `buffer`
	/// - [`Error::Source`] if the capture source failed
	pub fn dispatch(&self, buffer: &mut [u8]) -> Result<usize> {
		let _guard = DispatchGuard::acquire(&self.dispatching)?;
		let mut state = self.state.lock();
		let State::Ready(pipeline) = &mut *state else {
			return error::InactiveSessionSnafu.fail();
		};
		let limits = {
			let config = self.config.read();
			Limits {
				load_factor: config.load_factor,
				timeout: config.dispatch_timeout,
			}
		};

		let result = pipeline.run(buffer, &limits, &self.interrupt);
		match &result {
			Ok(frames) => {
				debug!(frames, backlog = pipeline.backlog.is_some(), "dispatch complete");
				self.notify(SessionEvent::Dispatched {
					frames: *frames,
					backlog: pipeline.backlog.is_some(),
				});
			}
			Err(Error::BufferTooSmall { capacity }) => {
				self.notify(SessionEvent::BufferTooSmall { capacity: *capacity });
			}
			Err(e) => self.notify(SessionEvent::SourceError(e.to_string())),
		}
		result
	}

	/// Interrupts the in-flight dispatch at its next pull boundary, waking a
	/// blocked pull. Does nothing when no dispatch is in flight.
	pub fn break_loop(&self) {
		if self.is_dispatching() {
			self.interrupt.request();
		}
	}

	/// Releases the capture source. Later dispatch calls fail with
	/// [`Error::InactiveSession`].
	pub fn close(&self) {
		if self.is_dispatching() {
			self.interrupt.request();
		}
		let previous = std::mem::replace(&mut *self.state.lock(), State::Closed);
		if let State::Ready(pipeline) = previous {
			pipeline.finish();
			debug!("session closed");
			self.notify(SessionEvent::Closed);
		}
	}

	pub fn is_closed(&self) -> bool { matches!(*self.state.lock(), State::Closed) }

	pub fn is_dispatching(&self) -> bool { self.dispatching.load(Ordering::Acquire) }

	/// Whether a record is waiting to lead the next dispatch.
	pub fn has_backlog(&self) -> bool {
		matches!(&*self.state.lock(), State::Ready(pipeline) if pipeline.backlog.is_some())
	}

	pub fn link_type(&self) -> LinkType { self.link_type }

	pub fn snaplen(&self) -> u32 { self.snaplen }

	/// Source counters; waits for an in-flight dispatch.
	pub fn stats(&self) -> Result<CaptureStats> {
		match &mut *self.state.lock() {
			State::Ready(pipeline) => pipeline.source.stats().context(error::SourceSnafu),
			State::Closed => error::InactiveSessionSnafu.fail(),
		}
	}

	/// Handle to the session config; changes apply from the next dispatch.
	pub fn config(&self) -> SharedConfig { self.config.clone() }

	fn notify(&self, event: SessionEvent) {
		if let Some(tx) = &self.event_tx {
			// Non-blocking send, if channel full drop it
			let _ = tx.try_send(event);
		}
	}
}

impl Drop for Session {
	fn drop(&mut self) {
		if let State::Ready(_) = self.state.get_mut() {
			self.close();
		}
	}
}
