//! Error types for capture sessions.

use snafu::prelude::*;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
	/// Another dispatch call is still in flight on this session
	#[snafu(display("A dispatch is already in progress on this session"))]
	AlreadyDispatching,

	/// The pending backlog record does not fit even an empty buffer
	#[snafu(display("A single record does not fit a {capacity}-byte buffer"))]
	BufferTooSmall { capacity: usize },

	/// The session was closed
	#[snafu(display("Session is closed"))]
	InactiveSession,

	/// Invalid options or a source that could not be opened
	#[snafu(display("Failed to set up capture session: {source}"))]
	Config { source: layer2_core::Error },

	/// The savefile requested for this session could not be created
	#[snafu(display("Failed to set up savefile: {source}"))]
	Savefile { source: layer2_core::Error },

	/// The capture source failed while pulling frames
	#[snafu(display("Capture source error: {source}"))]
	Source { source: layer2_core::Error },

	/// A record could not be encoded into the output buffer
	#[snafu(display("Failed to encode record: {source}"))]
	Encode { source: layer2_core::Error },

	/// The blocking worker running a dispatch did not complete
	#[snafu(display("Dispatch worker failed: {source}"))]
	WorkerPanicked { source: tokio::task::JoinError },
}
