//! Error types for RFB wire decoding.

use thiserror::Error;

/// Result type alias for wire decoding.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding server-sent RFB data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
	/// The version banner did not match `RFB xxx.yyy\n`.
	#[error("malformed protocol version banner: {0:?}")]
	MalformedVersion(String),

	/// The server speaks a version older than 3.3.
	#[error("unsupported RFB version {major}.{minor}")]
	UnsupportedVersion { major: u16, minor: u16 },

	/// A fixed-size structure arrived with the wrong length.
	#[error("truncated {what}: expected {expected} bytes, got {actual}")]
	Truncated {
		what: &'static str,
		expected: usize,
		actual: usize,
	},

	/// A length-prefixed field exceeds what a sane server would send.
	#[error("{what} of {len} bytes exceeds limit of {limit}")]
	Oversized { what: &'static str, len: u32, limit: u32 },
}
