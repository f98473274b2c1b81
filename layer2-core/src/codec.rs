//! Record encoding through a [`ChunkedOutput`].
//!
//! Records are written with `bincode`, which is self-delimiting, so a batch
//! written by one dispatch call reads back with [`read_records`].

use snafu::ResultExt;

use crate::error;
use crate::pdu::FrameRecord;
use crate::stream::{ChunkedOutput, RegionWriter};

/// Serializes one record into an output stream.
///
/// Implementations must leave unused region bytes backed up, so that the
/// stream state after `encode` reflects exactly what the record took.
pub trait RecordEncoder: Send {
	fn encode(&mut self, record: &FrameRecord, out: &mut ChunkedOutput<'_>) -> crate::Result<()>;
}

/// The default encoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeEncoder;

impl RecordEncoder for BincodeEncoder {
	fn encode(&mut self, record: &FrameRecord, out: &mut ChunkedOutput<'_>) -> crate::Result<()> {
		let mut writer = RegionWriter::new(out);
		bincode::serialize_into(&mut writer, record).context(error::EncodeSnafu)?;
		writer.finish();
		Ok(())
	}
}

/// Encoded size of a record, in bytes.
pub fn encoded_len(record: &FrameRecord) -> crate::Result<usize> {
	let len = bincode::serialized_size(record).context(error::EncodeSnafu)?;
	Ok(len as usize)
}

/// Reads `count` records back from the front of `bytes`.
pub fn read_records(mut bytes: &[u8], count: usize) -> crate::Result<Vec<FrameRecord>> {
	(0..count)
		.map(|index| bincode::deserialize_from(&mut bytes).context(error::DecodeSnafu { index }))
		.collect()
}
