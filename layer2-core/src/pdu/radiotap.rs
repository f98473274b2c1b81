//! Radiotap capture metadata.

use serde::{Deserialize, Serialize};

use super::{Unsupported, dot11::Dot11};

/// Per-frame radiotap flags, in bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RadiotapFlag {
	Cfp,
	Preamble,
	Wep,
	Fragmentation,
	Fcs,
	Padding,
	FailedFcs,
	ShortGi,
}

impl RadiotapFlag {
	pub const CFP: u8 = 0x01;
	pub const PREAMBLE: u8 = 0x02;
	pub const WEP: u8 = 0x04;
	pub const FRAGMENTATION: u8 = 0x08;
	pub const FCS: u8 = 0x10;
	pub const PADDING: u8 = 0x20;
	pub const FAILED_FCS: u8 = 0x40;
	pub const SHORT_GI: u8 = 0x80;

	const ORDERED: [(u8, Self); 8] = [
		(Self::CFP, Self::Cfp),
		(Self::PREAMBLE, Self::Preamble),
		(Self::WEP, Self::Wep),
		(Self::FRAGMENTATION, Self::Fragmentation),
		(Self::FCS, Self::Fcs),
		(Self::PADDING, Self::Padding),
		(Self::FAILED_FCS, Self::FailedFcs),
		(Self::SHORT_GI, Self::ShortGi),
	];

	/// Expands a flags byte into the set flags, lowest bit first.
	pub fn from_bits(bits: u8) -> Vec<Self> {
		Self::ORDERED
			.iter()
			.filter(|(mask, _)| bits & mask != 0)
			.map(|(_, flag)| *flag)
			.collect()
	}
}

/// Channel modulation/band, taken from the first recognised channel flag.
///
/// A flags word with no recognised bit maps to the default, [`ChannelType::Turbo`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
	#[default]
	Turbo,
	Cck,
	Ofdm,
	TwoGhz,
	FiveGhz,
	Passive,
	DynCckOfdm,
	Gfsk,
}

impl ChannelType {
	const ORDERED: [(u16, Self); 8] = [
		(0x0010, Self::Turbo),
		(0x0020, Self::Cck),
		(0x0040, Self::Ofdm),
		(0x0080, Self::TwoGhz),
		(0x0100, Self::FiveGhz),
		(0x0200, Self::Passive),
		(0x0400, Self::DynCckOfdm),
		(0x0800, Self::Gfsk),
	];

	pub fn from_flags(flags: u16) -> Self {
		Self::ORDERED
			.iter()
			.find(|(mask, _)| flags & mask != 0)
			.map_or_else(Self::default, |(_, kind)| *kind)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadiotapChannel {
	/// Centre frequency in MHz.
	pub freq: i32,
	pub kind: ChannelType,
}

/// What a radiotap header may wrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadiotapPayload {
	Dot11(Dot11),
	Unsupported(Unsupported),
}

/// A radiotap header and the frame it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Radiotap {
	pub tsft: Option<u64>,
	pub flags: Vec<RadiotapFlag>,
	pub rate: Option<u32>,
	pub channel: Option<RadiotapChannel>,
	pub inner: RadiotapPayload,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_flags_keep_bit_order() {
		let flags = RadiotapFlag::from_bits(RadiotapFlag::SHORT_GI | RadiotapFlag::FCS | RadiotapFlag::CFP);
		assert_eq!(
			flags,
			vec![RadiotapFlag::Cfp, RadiotapFlag::Fcs, RadiotapFlag::ShortGi]
		);
		assert!(RadiotapFlag::from_bits(0).is_empty());
	}

	#[test]
	fn test_channel_type_takes_first_recognised_bit() {
		// 2.4 GHz CCK, as most b/g adapters report it
		assert_eq!(ChannelType::from_flags(0x00a0), ChannelType::Cck);
		assert_eq!(ChannelType::from_flags(0x0140), ChannelType::Ofdm);
		assert_eq!(ChannelType::from_flags(0x0800), ChannelType::Gfsk);
		assert_eq!(ChannelType::from_flags(0x000f), ChannelType::Turbo);
	}
}
