//! # layer2 core library
//!
//! Decoding and buffering for link-layer capture sessions.
//!
//! ## Modules
//!
//! - `decode` - Raw bytes to [`Pdu`] records, never failing
//! - `pdu` - Decoded record types
//! - `stream` - Fixed buffer output with high-watermark backpressure
//! - `codec` - Record encoding through the output stream
//! - `capture` - Stored, live and in-memory frame sources
//! - `savefile` - Writing frames back out as pcap
//! - `error` - Error types and handling
//! - `constants` - Shared constants
//!
//! Errors are defined in `error.rs` with snafu; fallible operations return
//! [`Result`] and never unwrap.

pub mod capture;
pub mod codec;
pub mod config;
pub mod constants;
pub mod decode;
pub mod error;
pub mod link;
pub mod pdu;
pub mod savefile;
pub mod stream;

pub use capture::{CaptureSource, RawFrame};
pub use codec::{BincodeEncoder, RecordEncoder};
pub use config::CaptureConfig;
pub use decode::{decode, decode_frame};
pub use error::{Error, Result};
pub use link::LinkType;
pub use pdu::{FrameRecord, Pdu};
pub use stream::{ChunkedOutput, StreamState};
