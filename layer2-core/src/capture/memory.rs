use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::{CaptureSource, CaptureStats, RawFrame, SourceBreaker};
use crate::constants::DEFAULT_SNAPLEN;
use crate::{LinkType, error};

enum Message {
	Frame(RawFrame),
	Fail(String),
	Wake,
}

enum Feed {
	Replay(VecDeque<RawFrame>),
	Channel {
		rx: kanal::Receiver<Message>,
		breaker: Arc<ChannelBreaker>,
		read_timeout: Duration,
	},
}

/// Frames handed in by the embedder rather than read from a device.
///
/// [`MemorySource::new`] replays a fixed list. [`MemorySource::channel`] is fed
/// through an [`Injector`] and waits up to `read_timeout` per pull, like a
/// live device would.
pub struct MemorySource {
	link_type: LinkType,
	snaplen: u32,
	feed: Feed,
	stats: CaptureStats,
}

impl MemorySource {
	pub fn new(link_type: LinkType, frames: impl IntoIterator<Item = RawFrame>) -> Self {
		Self {
			link_type,
			snaplen: DEFAULT_SNAPLEN,
			feed: Feed::Replay(frames.into_iter().collect()),
			stats: CaptureStats::default(),
		}
	}

	pub fn channel(link_type: LinkType, read_timeout: Duration) -> (Self, Injector) {
		let (tx, rx) = kanal::unbounded();
		let source = Self {
			link_type,
			snaplen: DEFAULT_SNAPLEN,
			feed: Feed::Channel {
				rx,
				breaker: Arc::new(ChannelBreaker {
					tx: tx.clone(),
					armed: AtomicBool::new(false),
				}),
				read_timeout,
			},
			stats: CaptureStats::default(),
		};
		(source, Injector { tx, link_type })
	}

	#[must_use]
	pub fn with_snaplen(mut self, snaplen: u32) -> Self {
		self.snaplen = snaplen;
		self
	}
}

impl CaptureSource for MemorySource {
	fn link_type(&self) -> LinkType { self.link_type }

	fn snaplen(&self) -> u32 { self.snaplen }

	fn next_frame(&mut self) -> crate::Result<Option<RawFrame>> {
		let message = match &mut self.feed {
			Feed::Replay(frames) => frames.pop_front().map(Message::Frame),
			Feed::Channel {
				rx,
				breaker,
				read_timeout,
			} => {
				let deadline = Instant::now() + *read_timeout;
				loop {
					let message = if read_timeout.is_zero() {
						rx.try_recv().ok().flatten()
					} else {
						rx.recv_timeout(deadline.saturating_duration_since(Instant::now())).ok()
					};
					// a wake-up nobody is waiting for any more
					if matches!(message, Some(Message::Wake)) && !breaker.armed.swap(false, Ordering::AcqRel) {
						continue;
					}
					break message;
				}
			}
		};
		match message {
			Some(Message::Frame(mut frame)) => {
				self.stats.received = self.stats.received.saturating_add(1);
				frame.truncate(self.snaplen);
				Ok(Some(frame))
			}
			Some(Message::Fail(message)) => error::SourceFailureSnafu { message }.fail(),
			Some(Message::Wake) | None => Ok(None),
		}
	}

	fn breaker(&self) -> Option<Arc<dyn SourceBreaker>> {
		match &self.feed {
			Feed::Replay(_) => None,
			Feed::Channel { breaker, .. } => Some(breaker.clone()),
		}
	}

	fn stats(&mut self) -> crate::Result<CaptureStats> { Ok(self.stats) }
}

struct ChannelBreaker {
	tx: kanal::Sender<Message>,
	armed: AtomicBool,
}

impl SourceBreaker for ChannelBreaker {
	fn break_loop(&self) {
		self.armed.store(true, Ordering::Release);
		let _ = self.tx.try_send(Message::Wake);
	}

	fn reset(&self) { self.armed.store(false, Ordering::Release); }
}

/// Feeds a channel-backed [`MemorySource`]. Cheap to clone.
#[derive(Clone)]
pub struct Injector {
	tx: kanal::Sender<Message>,
	link_type: LinkType,
}

impl Injector {
	/// Queues a frame captured now. Returns `false` once the source is gone.
	pub fn inject(&self, data: Vec<u8>, timestamp: Duration) -> bool {
		self.inject_frame(RawFrame::new(self.link_type, data, timestamp))
	}

	pub fn inject_frame(&self, frame: RawFrame) -> bool { self.tx.send(Message::Frame(frame)).is_ok() }

	/// Makes the next pull fail with a source error.
	pub fn fail(&self, message: impl Into<String>) -> bool {
		self.tx.send(Message::Fail(message.into())).is_ok()
	}
}
