//! Shared constants for layer2
//!
//! Centralized defaults used by capture sources, the output stream and sessions.

/// Fraction of the output buffer below which regions stop at the high watermark
pub const DEFAULT_LOAD_FACTOR: f32 = 0.9;

/// Size of the detached region handed out once the output buffer is exhausted
pub const SCRATCH_SIZE: usize = 1024;

/// Default number of bytes captured per frame
pub const DEFAULT_SNAPLEN: u32 = 65535;

/// Default live read timeout in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u32 = 1000;

/// Trailing frame check sequence length on 802.11 frames
pub const FCS_LEN: usize = 4;
