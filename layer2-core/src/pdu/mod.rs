//! Decoded frame records.
//!
//! A [`Pdu`] is a closed tagged union over the link layers the decoder knows.
//! Anything else is kept verbatim as [`Unsupported`]. A [`FrameRecord`] wraps
//! a `Pdu` with its capture timestamp and captured length; it is the unit
//! written to an output buffer.

pub mod dot11;
pub mod macaddr;
pub mod radiotap;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use dot11::{
	BlockAckInfo, Capability, ControlBody, ControlFrame, DataBody, DataFrame, DataHeader, Dot11,
	Dot11Header, ManagementBody, ManagementFrame, MgmtHeader,
};
pub use macaddr::MacAddr;
pub use radiotap::{ChannelType, Radiotap, RadiotapChannel, RadiotapFlag, RadiotapPayload};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ethernet2 {
	pub src_addr: MacAddr,
	pub dst_addr: MacAddr,
	pub payload_type: u16,
	/// Everything after the 14-byte header.
	pub payload: Vec<u8>,
}

/// A frame kept as its type name and original bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unsupported {
	pub type_name: String,
	pub raw: Vec<u8>,
}

impl Unsupported {
	pub fn new(type_name: impl Into<String>, raw: &[u8]) -> Self {
		Self {
			type_name: type_name.into(),
			raw: raw.to_vec(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pdu {
	Ethernet2(Ethernet2),
	Radiotap(Radiotap),
	Dot11(Dot11),
	Unsupported(Unsupported),
}

impl Pdu {
	/// Short name of the outermost layer.
	pub fn type_name(&self) -> &str {
		match self {
			Pdu::Ethernet2(_) => "ETHERNET_II",
			Pdu::Radiotap(_) => "RADIOTAP",
			Pdu::Dot11(frame) => frame.type_name(),
			Pdu::Unsupported(unsupported) => &unsupported.type_name,
		}
	}
}

/// A decoded frame plus its capture envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRecord {
	/// Capture time in milliseconds since the epoch.
	pub timestamp_ms: u64,
	/// Captured length in bytes.
	pub size: u32,
	pub pdu: Pdu,
}

impl FrameRecord {
	pub fn new(timestamp: Duration, size: u32, pdu: Pdu) -> Self {
		let timestamp_ms = timestamp.as_secs() * 1000 + u64::from(timestamp.subsec_micros() / 1000);
		Self {
			timestamp_ms,
			size,
			pdu,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_record_timestamp_truncates_to_millis() {
		let record = FrameRecord::new(
			Duration::new(1_700_000_000, 123_987_000),
			60,
			Pdu::Unsupported(Unsupported::default()),
		);
		assert_eq!(record.timestamp_ms, 1_700_000_000_123);
		assert_eq!(record.size, 60);
		assert_eq!(record.pdu.type_name(), "");
	}
}
