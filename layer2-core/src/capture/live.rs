use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::{CaptureMeta, CaptureSource, CaptureStats, RawFrame, SourceBreaker};
use crate::{CaptureConfig, Error, LinkType};

fn live_error(operation: &'static str) -> impl FnOnce(pcap::Error) -> Error {
	move |e| Error::Live {
		source: Box::new(e),
		operation,
	}
}

/// Frames read from a network interface through libpcap.
///
/// A pull blocks for at most the configured read timeout; a break request
/// ends it early through `pcap_breakloop`.
pub struct LiveSource {
	capture: pcap::Capture<pcap::Active>,
	breaker: Arc<LiveBreaker>,
	link_type: LinkType,
	snaplen: u32,
}

struct LiveBreaker(pcap::BreakLoop);

impl SourceBreaker for LiveBreaker {
	fn break_loop(&self) { self.0.breakloop(); }
}

impl LiveSource {
	/// Opens and activates `interface`.
	///
	/// # Errors
	///
	/// Returns an error if the interface cannot be opened or activated, or if
	/// the filter does not compile
	pub fn open(interface: &str, config: &CaptureConfig) -> crate::Result<Self> {
		config.validate()?;
		let mut inactive = pcap::Capture::from_device(interface)
			.map_err(live_error("open device"))?
			.snaplen(config.snaplen.min(i32::MAX as u32) as i32)
			.promisc(config.promiscuous)
			.rfmon(config.monitor)
			.timeout(config.read_timeout_ms.min(i32::MAX as u32) as i32);
		if let Some(size) = config.buffer_size {
			inactive = inactive.buffer_size(size.min(i32::MAX as u32) as i32);
		}
		let mut capture = inactive.open().map_err(live_error("activate"))?;
		if let Some(filter) = &config.filter {
			capture
				.filter(filter, true)
				.map_err(live_error("compile filter"))?;
		}
		let link_type = LinkType(capture.get_datalink().0 as u32);
		let breaker = Arc::new(LiveBreaker(capture.breakloop_handle()));
		debug!(interface, link_type = %link_type, "opened live capture");

		Ok(Self {
			capture,
			breaker,
			link_type,
			snaplen: config.snaplen,
		})
	}
}

impl CaptureSource for LiveSource {
	fn link_type(&self) -> LinkType { self.link_type }

	fn snaplen(&self) -> u32 { self.snaplen }

	fn next_frame(&mut self) -> crate::Result<Option<RawFrame>> {
		match self.capture.next_packet() {
			Ok(packet) => {
				let ts = packet.header.ts;
				let timestamp =
					Duration::from_secs(ts.tv_sec as u64) + Duration::from_micros(ts.tv_usec as u64);
				Ok(Some(RawFrame {
					link_type: self.link_type,
					data: packet.data.to_vec(),
					meta: CaptureMeta {
						timestamp,
						orig_len: packet.header.len,
					},
				}))
			}
			Err(pcap::Error::TimeoutExpired | pcap::Error::NoMorePackets) => Ok(None),
			Err(e) => Err(live_error("read")(e)),
		}
	}

	fn breaker(&self) -> Option<Arc<dyn SourceBreaker>> { Some(self.breaker.clone()) }

	fn stats(&mut self) -> crate::Result<CaptureStats> {
		let stat = self.capture.stats().map_err(live_error("stats"))?;
		Ok(CaptureStats {
			received: stat.received,
			dropped: stat.dropped,
			if_dropped: stat.if_dropped,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_breaker_is_shareable_across_threads() {
		let mut capture = pcap::Capture::dead(pcap::Linktype::ETHERNET).unwrap();
		let breaker: Arc<dyn SourceBreaker> = Arc::new(LiveBreaker(capture.breakloop_handle()));
		let remote = Arc::clone(&breaker);
		std::thread::spawn(move || remote.break_loop()).join().unwrap();
		breaker.reset();
	}
}
