use bytes::Buf;

use super::{MALFORMED, dot11, read_u8, read_u16, read_u64};
use crate::constants::FCS_LEN;
use crate::pdu::{
	ChannelType, Pdu, Radiotap, RadiotapChannel, RadiotapFlag, RadiotapPayload, Unsupported,
};

const PRESENT_TSFT: u32 = 1 << 0;
const PRESENT_FLAGS: u32 = 1 << 1;
const PRESENT_RATE: u32 = 1 << 2;
const PRESENT_CHANNEL: u32 = 1 << 3;
const PRESENT_EXT: u32 = 1 << 31;

/// Version, pad, length and the first present word.
const FIXED_LEN: usize = 8;

pub(super) fn decode(bytes: &[u8]) -> Pdu {
	match parse(bytes) {
		Some(radiotap) => Pdu::Radiotap(radiotap),
		None => Pdu::Unsupported(Unsupported::new(MALFORMED, bytes)),
	}
}

/// Walks the header with natural alignment relative to its first byte.
struct Fields<'a> {
	header: &'a [u8],
	offset: usize,
}

impl<'a> Fields<'a> {
	fn take(&mut self, align: usize, size: usize) -> Option<&'a [u8]> {
		let start = self.offset.next_multiple_of(align);
		let field = self.header.get(start..start + size)?;
		self.offset = start + size;
		Some(field)
	}
}

fn parse(bytes: &[u8]) -> Option<Radiotap> {
	let mut buf = bytes;
	if buf.remaining() < FIXED_LEN || read_u8(&mut buf)? != 0 {
		return None;
	}
	buf.advance(1);
	let len = usize::from(read_u16(&mut buf)?);
	if len < FIXED_LEN || len > bytes.len() {
		return None;
	}
	let header = &bytes[..len];

	let mut present = header[4..].chunks_exact(4).map(|word| {
		u32::from_le_bytes([word[0], word[1], word[2], word[3]])
	});
	let first = present.next()?;
	let mut words = 1;
	let mut last = first;
	while last & PRESENT_EXT != 0 {
		last = present.next()?;
		words += 1;
	}

	let mut fields = Fields {
		header,
		offset: 4 + 4 * words,
	};

	let tsft = if first & PRESENT_TSFT != 0 {
		Some(read_u64(&mut fields.take(8, 8)?)?)
	} else {
		None
	};
	let flag_bits = if first & PRESENT_FLAGS != 0 {
		fields.take(1, 1)?[0]
	} else {
		0
	};
	let rate = if first & PRESENT_RATE != 0 {
		Some(u32::from(fields.take(1, 1)?[0]))
	} else {
		None
	};
	let channel = if first & PRESENT_CHANNEL != 0 {
		let mut field = fields.take(2, 4)?;
		let freq = read_u16(&mut field)?;
		Some(RadiotapChannel {
			freq: i32::from(freq),
			kind: ChannelType::from_flags(read_u16(&mut field)?),
		})
	} else {
		None
	};

	let mut inner = &bytes[len..];
	if flag_bits & RadiotapFlag::FCS != 0 && inner.len() >= FCS_LEN {
		inner = &inner[..inner.len() - FCS_LEN];
	}
	let inner = if inner.is_empty() {
		RadiotapPayload::Unsupported(Unsupported::default())
	} else {
		match dot11::decode(inner) {
			Ok(frame) => RadiotapPayload::Dot11(frame),
			Err(unsupported) => RadiotapPayload::Unsupported(unsupported),
		}
	};

	Some(Radiotap {
		tsft,
		flags: RadiotapFlag::from_bits(flag_bits),
		rate,
		channel,
		inner,
	})
}
