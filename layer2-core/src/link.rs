//! Link-layer type identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use snafu::OptionExt;

use crate::{Result, error};

/// A pcap `LINKTYPE_*` value describing how raw frame bytes are framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkType(pub u32);

impl LinkType {
	pub const NULL: Self = Self(0);
	pub const ETHERNET: Self = Self(1);
	pub const RAW: Self = Self(101);
	pub const IEEE802_11: Self = Self(105);
	pub const LOOP: Self = Self(108);
	pub const LINUX_SLL: Self = Self(113);
	pub const IEEE802_11_RADIOTAP: Self = Self(127);
	pub const PPI: Self = Self(192);

	const NAMED: [(Self, &'static str); 8] = [
		(Self::NULL, "NULL"),
		(Self::ETHERNET, "EN10MB"),
		(Self::RAW, "RAW"),
		(Self::IEEE802_11, "IEEE802_11"),
		(Self::LOOP, "LOOP"),
		(Self::LINUX_SLL, "LINUX_SLL"),
		(Self::IEEE802_11_RADIOTAP, "IEEE802_11_RADIO"),
		(Self::PPI, "PPI"),
	];

	/// Canonical name, or `None` for values without one.
	pub fn name(self) -> Option<&'static str> {
		Self::NAMED
			.iter()
			.find(|(link, _)| *link == self)
			.map(|(_, name)| *name)
	}

	/// Resolves a canonical name (case-insensitive) or a `LINKTYPE_<n>` form.
	pub fn from_name(name: &str) -> Result<Self> {
		let upper = name.trim().to_ascii_uppercase();
		if let Some((link, _)) = Self::NAMED.iter().find(|(_, n)| *n == upper) {
			return Ok(*link);
		}
		upper
			.strip_prefix("LINKTYPE_")
			.and_then(|n| n.parse().ok())
			.map(Self)
			.context(error::UnknownLinkTypeSnafu { name })
	}
}

impl fmt::Display for LinkType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.name() {
			Some(name) => f.write_str(name),
			None => write!(f, "LINKTYPE_{}", self.0),
		}
	}
}

impl From<u32> for LinkType {
	fn from(value: u32) -> Self { Self(value) }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display_names() {
		assert_eq!(LinkType::ETHERNET.to_string(), "EN10MB");
		assert_eq!(LinkType::IEEE802_11_RADIOTAP.to_string(), "IEEE802_11_RADIO");
		assert_eq!(LinkType(147).to_string(), "LINKTYPE_147");
	}

	#[test]
	fn test_from_name() {
		assert_eq!(LinkType::from_name("en10mb").unwrap(), LinkType::ETHERNET);
		assert_eq!(LinkType::from_name("LINKTYPE_147").unwrap(), LinkType(147));
		assert!(matches!(
			LinkType::from_name("token-ring"),
			Err(crate::Error::UnknownLinkType { .. })
		));
	}
}
