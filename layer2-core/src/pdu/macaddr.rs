//! Six-byte hardware addresses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A MAC address, always exactly six bytes.
#[derive(PartialEq, Eq, Clone, Copy, Default, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
	/// The all-zero address, used when a frame carries no address in a slot.
	pub const ZERO: MacAddr = MacAddr([0; 6]);

	pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);

	#[must_use]
	pub fn octets(&self) -> [u8; 6] { self.0 }

	#[must_use]
	pub fn is_broadcast(&self) -> bool { *self == Self::BROADCAST }

	#[must_use]
	pub fn is_zero(&self) -> bool { *self == Self::ZERO }

	/// Reads an address from the first six bytes of `bytes`.
	pub(crate) fn from_slice(bytes: &[u8]) -> Option<Self> {
		let octets: [u8; 6] = bytes.get(..6)?.try_into().ok()?;
		Some(Self(octets))
	}
}

impl From<[u8; 6]> for MacAddr {
	fn from(octets: [u8; 6]) -> Self { Self(octets) }
}

impl fmt::Display for MacAddr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let [a, b, c, d, e, g] = self.0;
		write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
	}
}

impl fmt::Debug for MacAddr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(self, f) }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display_is_lowercase_colon_separated() {
		let mac = MacAddr([0x00, 0x1b, 0x2C, 0xff, 0x0a, 0x01]);
		assert_eq!(mac.to_string(), "00:1b:2c:ff:0a:01");
	}

	#[test]
	fn test_from_slice_requires_six_bytes() {
		assert_eq!(MacAddr::from_slice(&[1, 2, 3, 4, 5]), None);
		assert_eq!(
			MacAddr::from_slice(&[1, 2, 3, 4, 5, 6, 7]),
			Some(MacAddr([1, 2, 3, 4, 5, 6]))
		);
		assert!(MacAddr::BROADCAST.is_broadcast());
		assert!(MacAddr::default().is_zero());
	}
}
