use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use pcap_file::pcap::PcapReader;
use snafu::ResultExt;
use tracing::debug;

use super::filter::FrameFilter;
use super::{CaptureMeta, CaptureSource, CaptureStats, RawFrame};
use crate::{CaptureConfig, LinkType, error};

/// Frames replayed from a pcap savefile.
pub struct FileSource<R: Read = BufReader<File>> {
	reader: PcapReader<R>,
	link_type: LinkType,
	snaplen: u32,
	filter: Option<FrameFilter>,
	stats: CaptureStats,
}

impl FileSource {
	/// Opens a savefile; the link type comes from its global header.
	///
	/// # Errors
	///
	/// Returns an error if the file cannot be opened, is not a pcap savefile,
	/// or the configured filter cannot be compiled
	pub fn open(path: impl AsRef<Path>, config: &CaptureConfig) -> crate::Result<Self> {
		let path = path.as_ref();
		let file = File::open(path).context(error::OpenSavefileSnafu { path })?;
		let source = Self::from_reader(BufReader::new(file), config)?;
		debug!(path = %path.display(), link_type = %source.link_type, "opened savefile");
		Ok(source)
	}
}

impl<R: Read> FileSource<R> {
	pub fn from_reader(reader: R, config: &CaptureConfig) -> crate::Result<Self> {
		config.validate()?;
		let reader = PcapReader::new(reader).context(error::SavefileHeaderSnafu)?;
		let header = reader.header();
		let link_type = LinkType(u32::from(header.datalink));
		let snaplen = match header.snaplen {
			0 => config.snaplen,
			stored => stored.min(config.snaplen),
		};
		let filter = config
			.filter
			.as_deref()
			.map(|expr| FrameFilter::compile(expr, link_type))
			.transpose()?;

		Ok(Self {
			reader,
			link_type,
			snaplen,
			filter,
			stats: CaptureStats::default(),
		})
	}
}

impl<R: Read + Send> CaptureSource for FileSource<R> {
	fn link_type(&self) -> LinkType { self.link_type }

	fn snaplen(&self) -> u32 { self.snaplen }

	fn next_frame(&mut self) -> crate::Result<Option<RawFrame>> {
		loop {
			let Some(packet) = self.reader.next_packet() else {
				return Ok(None);
			};
			let packet = packet.context(error::ReadSavefileSnafu)?;
			let mut frame = RawFrame {
				link_type: self.link_type,
				meta: CaptureMeta {
					timestamp: packet.timestamp,
					orig_len: packet.orig_len,
				},
				data: packet.data.into_owned(),
			};
			self.stats.received = self.stats.received.saturating_add(1);
			if let Some(filter) = &self.filter
				&& !filter.matches(&frame.data)
			{
				continue;
			}
			frame.truncate(self.snaplen);
			return Ok(Some(frame));
		}
	}

	fn stats(&mut self) -> crate::Result<CaptureStats> { Ok(self.stats) }
}
