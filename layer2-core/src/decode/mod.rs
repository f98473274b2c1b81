//! Frame decoder
//!
//! Turns raw link-layer bytes into a [`Pdu`]. Decoding is total: truncated
//! frames, unknown link types and 802.11 subtypes without a mapping all come
//! back as [`Pdu::Unsupported`] carrying the original bytes.
//!
//! ## Usage
//!
//! ```
//! use layer2_core::{decode, LinkType, Pdu};
//!
//! let pdu = decode(LinkType::ETHERNET, &[0u8; 4]);
//! assert!(matches!(pdu, Pdu::Unsupported(ref u) if u.type_name == "RAW"));
//! ```

mod dot11;
mod radiotap;

use bytes::Buf;
use etherparse::Ethernet2Header;
use tracing::trace;

use crate::LinkType;
use crate::capture::RawFrame;
use crate::pdu::{Ethernet2, FrameRecord, MacAddr, Pdu, Unsupported};

/// Type name given to frames that could not be parsed.
pub const MALFORMED: &str = "RAW";

/// Decodes one frame of the given link type.
pub fn decode(link_type: LinkType, bytes: &[u8]) -> Pdu {
	let pdu = match link_type {
		LinkType::ETHERNET => ethernet(bytes),
		LinkType::IEEE802_11_RADIOTAP => radiotap::decode(bytes),
		LinkType::IEEE802_11 => match dot11::decode(bytes) {
			Ok(frame) => Pdu::Dot11(frame),
			Err(unsupported) => Pdu::Unsupported(unsupported),
		},
		other => Pdu::Unsupported(Unsupported::new(other.to_string(), bytes)),
	};
	if let Pdu::Unsupported(unsupported) = &pdu {
		trace!(
			link_type = %link_type,
			type_name = %unsupported.type_name,
			len = bytes.len(),
			"frame kept as unsupported"
		);
	}
	pdu
}

/// Decodes a pulled frame into a record stamped with its capture metadata.
pub fn decode_frame(frame: &RawFrame) -> FrameRecord {
	FrameRecord::new(
		frame.meta.timestamp,
		frame.data.len() as u32,
		decode(frame.link_type, &frame.data),
	)
}

fn ethernet(bytes: &[u8]) -> Pdu {
	match Ethernet2Header::from_slice(bytes) {
		Ok((header, payload)) => Pdu::Ethernet2(Ethernet2 {
			src_addr: MacAddr(header.source),
			dst_addr: MacAddr(header.destination),
			payload_type: header.ether_type.0,
			payload: payload.to_vec(),
		}),
		Err(_) => Pdu::Unsupported(Unsupported::new(MALFORMED, bytes)),
	}
}

fn read_u8(buf: &mut &[u8]) -> Option<u8> { buf.has_remaining().then(|| buf.get_u8()) }

fn read_u16(buf: &mut &[u8]) -> Option<u16> { (buf.remaining() >= 2).then(|| buf.get_u16_le()) }

fn read_u64(buf: &mut &[u8]) -> Option<u64> { (buf.remaining() >= 8).then(|| buf.get_u64_le()) }

fn read_mac(buf: &mut &[u8]) -> Option<MacAddr> {
	let mac = MacAddr::from_slice(buf)?;
	buf.advance(6);
	Some(mac)
}
