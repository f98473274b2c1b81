//! Error types for layer2 core
//!
//! All fallible operations use `snafu` for structured error handling.
//! Frame decoding never fails, so nothing here describes a malformed frame.

use std::path::PathBuf;

use snafu::prelude::*;

/// Result type alias for operations using snafu error handling
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Core error type for capture, encoding and savefile operations
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
	/// A capture or session option is out of range
	#[snafu(display("Invalid configuration: {reason}"))]
	InvalidConfig { reason: String },

	/// A link type name did not resolve
	#[snafu(display("Unknown link type: {name}"))]
	UnknownLinkType { name: String },

	/// Failed to open a stored capture
	#[snafu(display("Failed to open savefile {}: {source}", path.display()))]
	OpenSavefile {
		source: std::io::Error,
		path: PathBuf,
	},

	/// Failed to read the global header of a stored capture
	#[snafu(display("Invalid savefile header: {source}"))]
	SavefileHeader { source: pcap_file::PcapError },

	/// Failed to read a record from a stored capture
	#[snafu(display("Failed to read savefile record: {source}"))]
	ReadSavefile { source: pcap_file::PcapError },

	/// Failed to create a savefile for writing
	#[snafu(display("Failed to create savefile {}: {source}", path.display()))]
	CreateSavefile {
		source: std::io::Error,
		path: PathBuf,
	},

	/// Failed to write the savefile header or a record
	#[snafu(display("Failed to write savefile: {source}"))]
	WriteSavefile { source: pcap_file::PcapError },

	/// Failed to flush a savefile
	#[snafu(display("Failed to flush savefile: {source}"))]
	FlushSavefile { source: std::io::Error },

	/// A capture filter was requested but no filter compiler is built in
	#[snafu(display("Capture filter '{filter}' requires the `live` feature"))]
	FilterUnsupported { filter: String },

	/// The live capture engine reported a failure
	#[snafu(display("Live capture failed during {operation}: {source}"))]
	Live {
		source: Box<dyn std::error::Error + Send + Sync>,
		operation: &'static str,
	},

	/// Failed to encode a record into the output stream
	#[snafu(display("Failed to encode record: {source}"))]
	Encode { source: bincode::Error },

	/// Failed to read back an encoded record
	#[snafu(display("Failed to decode record #{index}: {source}"))]
	Decode {
		source: bincode::Error,
		index: usize,
	},

	/// A capture source reported a failure of its own
	#[snafu(display("Capture source failed: {message}"))]
	SourceFailure { message: String },
}
