//! Capture filters for sources that cannot filter in the kernel.

use crate::LinkType;
#[cfg(not(feature = "live"))]
use crate::error;

/// A compiled BPF program run against each stored frame.
pub(crate) struct FrameFilter {
	#[cfg(feature = "live")]
	program: pcap::BpfProgram,
}

// SAFETY: the program is an owned, immutable instruction array; libpcap only
// reads it during `pcap_offline_filter`.
#[cfg(feature = "live")]
unsafe impl Send for FrameFilter {}

impl FrameFilter {
	/// Compiles `expr` for `link_type` with an unknown netmask.
	#[cfg(feature = "live")]
	pub(crate) fn compile(expr: &str, link_type: LinkType) -> crate::Result<Self> {
		let dead = pcap::Capture::dead(pcap::Linktype(link_type.0 as i32)).map_err(|e| {
			crate::Error::Live {
				source: Box::new(e),
				operation: "open filter handle",
			}
		})?;
		let program = dead.compile(expr, true).map_err(|e| crate::Error::Live {
			source: Box::new(e),
			operation: "compile filter",
		})?;
		Ok(Self { program })
	}

	#[cfg(not(feature = "live"))]
	pub(crate) fn compile(expr: &str, _link_type: LinkType) -> crate::Result<Self> {
		error::FilterUnsupportedSnafu { filter: expr }.fail()
	}

	pub(crate) fn matches(&self, data: &[u8]) -> bool {
		#[cfg(feature = "live")]
		{
			self.program.filter(data)
		}
		#[cfg(not(feature = "live"))]
		{
			let _ = data;
			true
		}
	}
}
