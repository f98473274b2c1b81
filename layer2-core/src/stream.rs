//! Chunked output stream over a fixed buffer
//!
//! [`ChunkedOutput`] hands out writable regions of a caller-owned buffer. Below
//! the high watermark every region stops exactly at the watermark; past it the
//! region reaches the end of the buffer; once the buffer is exhausted a
//! detached scratch region is returned and the stream is marked overflowed.
//! Encoders that over-reserve give bytes back with [`ChunkedOutput::backup`].
//!
//! ## Usage
//!
//! ```
//! use std::io::Write;
//! use layer2_core::stream::{ChunkedOutput, RegionWriter, StreamState};
//!
//! let mut buffer = [0u8; 100];
//! let mut out = ChunkedOutput::new(&mut buffer, 0.9);
//! let mut writer = RegionWriter::new(&mut out);
//! writer.write_all(&[1; 40]).unwrap();
//! writer.finish();
//! assert_eq!(out.byte_count(), 40);
//! assert_eq!(out.state(), StreamState::BelowWatermark);
//! ```

use std::io;

use crate::constants::SCRATCH_SIZE;

/// Observable fill level of a [`ChunkedOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
	BelowWatermark,
	AtWatermark,
	/// Scratch space was handed out; the last record did not fit.
	Overflowed,
}

#[derive(Debug, Clone, Copy)]
enum Region {
	None,
	/// Committed bytes `[end - len, end)` of the real buffer.
	Buffer { len: usize },
	Scratch { len: usize },
}

/// A pull-style byte sink over one fixed buffer.
pub struct ChunkedOutput<'a> {
	buf: &'a mut [u8],
	hwm: usize,
	pos: usize,
	last: Region,
	overflowed: bool,
	scratch: Box<[u8]>,
}

impl<'a> ChunkedOutput<'a> {
	/// Wraps `buf`; the high watermark is `floor(len * load_factor)`.
	pub fn new(buf: &'a mut [u8], load_factor: f32) -> Self {
		let load_factor = load_factor.clamp(0.0, 1.0);
		let hwm = ((buf.len() as f64) * f64::from(load_factor)).floor() as usize;
		Self {
			hwm: hwm.min(buf.len()),
			buf,
			pos: 0,
			last: Region::None,
			overflowed: false,
			scratch: Box::default(),
		}
	}

	/// Returns the next writable region and commits all of it.
	pub fn next_region(&mut self) -> &mut [u8] {
		let len = self.buf.len();
		if self.pos < self.hwm {
			let start = self.pos;
			self.pos = self.hwm;
			self.last = Region::Buffer {
				len: self.hwm - start,
			};
			&mut self.buf[start..self.hwm]
		} else if self.pos < len {
			let start = self.pos;
			self.pos = len;
			self.last = Region::Buffer { len: len - start };
			&mut self.buf[start..]
		} else {
			self.overflowed = true;
			self.last = Region::Scratch { len: SCRATCH_SIZE };
			if self.scratch.is_empty() {
				self.scratch = vec![0; SCRATCH_SIZE].into_boxed_slice();
			}
			&mut self.scratch[..]
		}
	}

	/// Un-commits the last `n` bytes of the most recent region.
	///
	/// `n` is clamped to what is left of that region. Backing up scratch
	/// space never clears the overflow mark.
	pub fn backup(&mut self, n: usize) {
		match &mut self.last {
			Region::Buffer { len } => {
				let n = n.min(*len);
				*len -= n;
				self.pos -= n;
			}
			Region::Scratch { len } => *len -= n.min(*len),
			Region::None => {}
		}
	}

	pub fn state(&self) -> StreamState {
		if self.overflowed {
			StreamState::Overflowed
		} else if self.pos >= self.hwm {
			StreamState::AtWatermark
		} else {
			StreamState::BelowWatermark
		}
	}

	/// Bytes committed to the real buffer.
	pub fn byte_count(&self) -> usize { self.pos }

	pub fn capacity(&self) -> usize { self.buf.len() }

	pub fn high_watermark(&self) -> usize { self.hwm }

	/// The last `n` committed bytes of the most recent region.
	fn tail_mut(&mut self, n: usize) -> &mut [u8] {
		match self.last {
			Region::Buffer { .. } => &mut self.buf[self.pos - n..self.pos],
			Region::Scratch { len } => &mut self.scratch[len - n..len],
			Region::None => &mut [],
		}
	}
}

/// [`io::Write`] over a [`ChunkedOutput`].
///
/// Pulls a new region whenever the current one is used up. Call
/// [`RegionWriter::finish`] to give the unused tail of the last region back.
pub struct RegionWriter<'s, 'a> {
	out: &'s mut ChunkedOutput<'a>,
	remaining: usize,
}

impl<'s, 'a> RegionWriter<'s, 'a> {
	pub fn new(out: &'s mut ChunkedOutput<'a>) -> Self { Self { out, remaining: 0 } }

	pub fn finish(self) { self.out.backup(self.remaining); }
}

impl io::Write for RegionWriter<'_, '_> {
	fn write(&mut self, data: &[u8]) -> io::Result<usize> {
		if data.is_empty() {
			return Ok(0);
		}
		if self.remaining == 0 {
			self.remaining = self.out.next_region().len();
		}
		let n = data.len().min(self.remaining);
		let tail = self.out.tail_mut(self.remaining);
		tail[..n].copy_from_slice(&data[..n]);
		self.remaining -= n;
		Ok(n)
	}

	fn flush(&mut self) -> io::Result<()> { Ok(()) }
}
