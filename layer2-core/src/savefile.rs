//! Writing pulled frames back out as a pcap savefile.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use pcap_file::pcap::{PcapHeader, PcapPacket, PcapWriter};
use pcap_file::{DataLink, Endianness, TsResolution};
use snafu::ResultExt;
use tracing::debug;

use crate::capture::RawFrame;
use crate::{LinkType, error};

/// Appends raw frames to a pcap savefile, keeping their capture metadata.
pub struct SavefileWriter<W: Write = BufWriter<File>> {
	writer: PcapWriter<W>,
	written: u64,
}

impl SavefileWriter {
	/// Creates (or truncates) `path` and writes the global header.
	///
	/// # Errors
	///
	/// Returns an error if the file cannot be created or the header written
	pub fn create(path: impl AsRef<Path>, link_type: LinkType, snaplen: u32) -> crate::Result<Self> {
		let path = path.as_ref();
		let file = File::create(path).context(error::CreateSavefileSnafu { path })?;
		let writer = Self::from_writer(BufWriter::new(file), link_type, snaplen)?;
		debug!(path = %path.display(), link_type = %link_type, "created savefile");
		Ok(writer)
	}
}

impl<W: Write> SavefileWriter<W> {
	pub fn from_writer(writer: W, link_type: LinkType, snaplen: u32) -> crate::Result<Self> {
		let writer = PcapWriter::with_header(
			writer,
			PcapHeader {
				version_major: 2,
				version_minor: 4,
				ts_correction: 0,
				ts_accuracy: 0,
				snaplen,
				datalink: DataLink::from(link_type.0),
				ts_resolution: TsResolution::MicroSecond,
				endianness: Endianness::native(),
			},
		)
		.context(error::WriteSavefileSnafu)?;
		Ok(Self { writer, written: 0 })
	}

	pub fn write_frame(&mut self, frame: &RawFrame) -> crate::Result<()> {
		let packet = PcapPacket::new(frame.meta.timestamp, frame.meta.orig_len, &frame.data);
		self.writer.write_packet(&packet).context(error::WriteSavefileSnafu)?;
		self.written += 1;
		Ok(())
	}

	/// Number of frames written so far.
	pub fn frames_written(&self) -> u64 { self.written }

	/// Flushes and returns the underlying writer.
	pub fn finish(self) -> crate::Result<W> {
		let mut writer = self.writer.into_writer();
		writer.flush().context(error::FlushSavefileSnafu)?;
		Ok(writer)
	}
}
