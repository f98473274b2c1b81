//! Batch dispatch loop.
//!
//! One call fills a caller buffer with as many encoded records as fit below
//! the high watermark. A record that overflows the buffer is kept, decoded,
//! in the backlog slot and goes out first on the next call, so frames are
//! never dropped and never reordered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use layer2_core::capture::{RawFrame, SourceBreaker};
use layer2_core::savefile::SavefileWriter;
use layer2_core::{CaptureSource, ChunkedOutput, FrameRecord, RecordEncoder, StreamState, decode_frame};
use snafu::ResultExt;
use tracing::{trace, warn};

use crate::{Error, Result, error};

/// Everything a dispatch call mutates, owned by the session.
pub(crate) struct Pipeline {
	pub(crate) source: Box<dyn CaptureSource>,
	pub(crate) encoder: Box<dyn RecordEncoder>,
	pub(crate) backlog: Option<FrameRecord>,
	/// A failure that happened after frames were already written.
	pub(crate) deferred: Option<Error>,
	pub(crate) savefile: Option<SavefileWriter>,
}

/// Break request checked at every pull boundary.
///
/// The source is only woken while a pull is in progress, and a request is
/// cleared when the dispatch call it was made during returns.
pub(crate) struct Interrupt {
	requested: AtomicBool,
	pulling: AtomicBool,
	breaker: Option<Arc<dyn SourceBreaker>>,
}

impl Interrupt {
	pub(crate) fn new(breaker: Option<Arc<dyn SourceBreaker>>) -> Self {
		Self {
			requested: AtomicBool::new(false),
			pulling: AtomicBool::new(false),
			breaker,
		}
	}

	pub(crate) fn request(&self) {
		self.requested.store(true, Ordering::SeqCst);
		if self.pulling.load(Ordering::SeqCst)
			&& let Some(breaker) = &self.breaker
		{
			breaker.break_loop();
		}
	}

	/// Pulls one frame unless a break is pending; `None` means interrupted.
	fn pull(&self, source: &mut dyn CaptureSource) -> Option<layer2_core::Result<Option<RawFrame>>> {
		self.pulling.store(true, Ordering::SeqCst);
		let pulled = if self.take() { None } else { Some(source.next_frame()) };
		self.pulling.store(false, Ordering::SeqCst);
		pulled
	}

	/// Consumes a pending request.
	fn take(&self) -> bool {
		let requested = self.requested.swap(false, Ordering::SeqCst);
		if requested && let Some(breaker) = &self.breaker {
			breaker.reset();
		}
		requested
	}
}

/// Per-call limits, read from the session config when the call starts.
pub(crate) struct Limits {
	pub(crate) load_factor: f32,
	pub(crate) timeout: Duration,
}

impl Pipeline {
	pub(crate) fn run(&mut self, buffer: &mut [u8], limits: &Limits, interrupt: &Interrupt) -> Result<usize> {
		let result = self.fill(buffer, limits, interrupt);
		// a break belongs to the call it interrupted
		interrupt.take();
		result
	}

	fn fill(&mut self, buffer: &mut [u8], limits: &Limits, interrupt: &Interrupt) -> Result<usize> {
		if let Some(err) = self.deferred.take() {
			return Err(err);
		}
		let started = Instant::now();
		let capacity = buffer.len();
		let mut out = ChunkedOutput::new(buffer, limits.load_factor);
		let mut written = 0;

		if let Some(record) = self.backlog.take() {
			if let Err(source) = self.encoder.encode(&record, &mut out) {
				self.backlog = Some(record);
				return Err(Error::Encode { source });
			}
			match out.state() {
				StreamState::Overflowed => {
					self.backlog = Some(record);
					return error::BufferTooSmallSnafu { capacity }.fail();
				}
				StreamState::AtWatermark => return Ok(1),
				StreamState::BelowWatermark => written = 1,
			}
		}

		loop {
			let frame = match interrupt.pull(self.source.as_mut()) {
				None => {
					trace!(written, "dispatch interrupted");
					break;
				}
				Some(Ok(Some(frame))) => frame,
				Some(Ok(None)) => break,
				Some(Err(source)) => return self.fail(written, Error::Source { source }),
			};
			self.tee(&frame);

			let record = decode_frame(&frame);
			if let Err(source) = self.encoder.encode(&record, &mut out) {
				self.backlog = Some(record);
				return self.fail(written, Error::Encode { source });
			}
			written += 1;

			match out.state() {
				StreamState::Overflowed => {
					self.backlog = Some(record);
					written -= 1;
					break;
				}
				StreamState::AtWatermark => break,
				StreamState::BelowWatermark => {
					if !limits.timeout.is_zero() && started.elapsed() > limits.timeout {
						break;
					}
				}
			}
		}
		Ok(written)
	}

	/// Reports `err` now, or after the frames already in the buffer.
	fn fail(&mut self, written: usize, err: Error) -> Result<usize> {
		if written == 0 {
			return Err(err);
		}
		warn!(written, error = %err, "deferring error until the next dispatch");
		self.deferred = Some(err);
		Ok(written)
	}

	fn tee(&mut self, frame: &RawFrame) {
		let Some(savefile) = self.savefile.as_mut() else {
			return;
		};
		if let Err(e) = savefile.write_frame(frame) {
			warn!(error = %e, "savefile write failed, no longer writing frames");
			self.savefile = None;
		}
	}

	/// Flushes the savefile, if any.
	pub(crate) fn finish(self) {
		if let Some(savefile) = self.savefile {
			let frames = savefile.frames_written();
			match savefile.finish().context(error::SavefileSnafu) {
				Ok(_) => trace!(frames, "savefile closed"),
				Err(e) => warn!(error = %e, "failed to flush savefile"),
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use layer2_core::capture::MemorySource;
	use layer2_core::codec::{encoded_len, read_records};
	use layer2_core::{BincodeEncoder, LinkType};

	fn frame(seq: u8) -> RawFrame {
		let mut data = vec![seq; 64];
		data[12..14].copy_from_slice(&[0x08, 0x00]);
		RawFrame::new(LinkType::ETHERNET, data, Duration::from_millis(u64::from(seq)))
	}

	fn pipeline(frames: impl IntoIterator<Item = RawFrame>) -> Pipeline {
		Pipeline {
			source: Box::new(MemorySource::new(LinkType::ETHERNET, frames)),
			encoder: Box::new(BincodeEncoder),
			backlog: None,
			deferred: None,
			savefile: None,
		}
	}

	fn limits(load_factor: f32) -> Limits {
		Limits {
			load_factor,
			timeout: Duration::ZERO,
		}
	}

	fn record_len() -> usize { encoded_len(&decode_frame(&frame(0))).unwrap() }

	#[test]
	fn test_stops_at_watermark() {
		let len = record_len();
		let mut pipeline = pipeline((1..=5).map(frame));
		let mut buffer = vec![0u8; 3 * len];
		let interrupt = Interrupt::new(None);

		assert_eq!(pipeline.run(&mut buffer, &limits(0.9), &interrupt).unwrap(), 3);
		assert!(pipeline.backlog.is_none());
		assert_eq!(pipeline.run(&mut buffer, &limits(0.9), &interrupt).unwrap(), 2);
		let records = read_records(&buffer, 2).unwrap();
		assert_eq!(records[0].timestamp_ms, 4);
		assert_eq!(records[1].timestamp_ms, 5);
		assert_eq!(pipeline.run(&mut buffer, &limits(0.9), &interrupt).unwrap(), 0);
	}

	#[test]
	fn test_overflowing_record_leads_next_call() {
		let len = record_len();
		let mut pipeline = pipeline((1..=5).map(frame));
		let mut buffer = vec![0u8; 2 * len + len / 2];
		let interrupt = Interrupt::new(None);

		assert_eq!(pipeline.run(&mut buffer, &limits(1.0), &interrupt).unwrap(), 2);
		assert_eq!(pipeline.backlog.as_ref().map(|r| r.timestamp_ms), Some(3));

		let mut seen = Vec::new();
		loop {
			let count = pipeline.run(&mut buffer, &limits(1.0), &interrupt).unwrap();
			if count == 0 {
				break;
			}
			seen.extend(read_records(&buffer, count).unwrap().into_iter().map(|r| r.timestamp_ms));
		}
		assert_eq!(seen, vec![3, 4, 5]);
	}

	#[test]
	fn test_backlog_too_big_is_kept() {
		let len = record_len();
		let mut pipeline = pipeline((1..=2).map(frame));
		let mut small = vec![0u8; len / 2];
		let interrupt = Interrupt::new(None);

		assert_eq!(pipeline.run(&mut small, &limits(0.9), &interrupt).unwrap(), 0);
		assert!(pipeline.backlog.is_some());
		let err = pipeline.run(&mut small, &limits(0.9), &interrupt).unwrap_err();
		assert!(matches!(err, Error::BufferTooSmall { capacity } if capacity == len / 2));
		assert!(pipeline.backlog.is_some());

		let mut large = vec![0u8; 4 * len];
		assert_eq!(pipeline.run(&mut large, &limits(0.9), &interrupt).unwrap(), 2);
		let records = read_records(&large, 2).unwrap();
		assert_eq!(records[0].timestamp_ms, 1);
	}

	#[test]
	fn test_interrupt_stops_before_pulling() {
		let mut pipeline = pipeline((1..=3).map(frame));
		let mut buffer = vec![0u8; 4096];
		let interrupt = Interrupt::new(None);
		interrupt.request();
		assert_eq!(pipeline.run(&mut buffer, &limits(0.9), &interrupt).unwrap(), 0);
		assert_eq!(pipeline.run(&mut buffer, &limits(0.9), &interrupt).unwrap(), 3);
	}

	/// Fails the first `failures` encodes, then behaves like [`BincodeEncoder`].
	struct FlakyEncoder {
		failures: usize,
	}

	impl RecordEncoder for FlakyEncoder {
		fn encode(&mut self, record: &FrameRecord, out: &mut ChunkedOutput<'_>) -> layer2_core::Result<()> {
			if self.failures > 0 {
				self.failures -= 1;
				return layer2_core::error::SourceFailureSnafu { message: "encoder" }.fail();
			}
			BincodeEncoder.encode(record, out)
		}
	}

	#[test]
	fn test_encode_failure_keeps_the_record() {
		let mut pipeline = pipeline((1..=2).map(frame));
		pipeline.encoder = Box::new(FlakyEncoder { failures: 1 });
		let mut buffer = vec![0u8; 4096];
		let interrupt = Interrupt::new(None);

		assert!(matches!(
			pipeline.run(&mut buffer, &limits(0.9), &interrupt),
			Err(Error::Encode { .. })
		));
		assert_eq!(pipeline.backlog.as_ref().map(|r| r.timestamp_ms), Some(1));
		assert_eq!(pipeline.run(&mut buffer, &limits(0.9), &interrupt).unwrap(), 2);
		let records = read_records(&buffer, 2).unwrap();
		assert_eq!(records[0].timestamp_ms, 1);
		assert_eq!(records[1].timestamp_ms, 2);
	}

	#[test]
	fn test_request_is_cleared_when_the_call_returns() {
		let mut pipeline = pipeline((1..=2).map(frame));
		let mut buffer = vec![0u8; 4096];
		let interrupt = Interrupt::new(None);
		interrupt.request();
		assert_eq!(pipeline.run(&mut buffer, &limits(0.9), &interrupt).unwrap(), 0);
		assert!(!interrupt.take());
	}

	#[test]
	fn test_source_error_after_frames_is_deferred() {
		let (source, injector) = MemorySource::channel(LinkType::ETHERNET, Duration::ZERO);
		let mut pipeline = pipeline([]);
		pipeline.source = Box::new(source);
		injector.inject_frame(frame(1));
		injector.fail("gone");
		let mut buffer = vec![0u8; 4096];
		let interrupt = Interrupt::new(None);

		assert_eq!(pipeline.run(&mut buffer, &limits(0.9), &interrupt).unwrap(), 1);
		assert!(matches!(
			pipeline.run(&mut buffer, &limits(0.9), &interrupt),
			Err(Error::Source { .. })
		));
		assert_eq!(pipeline.run(&mut buffer, &limits(0.9), &interrupt).unwrap(), 0);
	}

	#[test]
	fn test_time_budget_bounds_a_call() {
		let (source, injector) = MemorySource::channel(LinkType::ETHERNET, Duration::from_millis(5));
		let mut pipeline = pipeline([]);
		pipeline.source = Box::new(source);
		for seq in 0..50 {
			injector.inject_frame(frame(seq));
		}
		let mut buffer = vec![0u8; 1 << 16];
		let interrupt = Interrupt::new(None);
		let budget = Limits {
			load_factor: 0.9,
			timeout: Duration::from_nanos(1),
		};
		let count = pipeline.run(&mut buffer, &budget, &interrupt).unwrap();
		assert!((1..50).contains(&count));
	}
}
