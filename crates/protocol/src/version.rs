//! Protocol version banner (`RFB 003.008\n`).

use std::fmt;

use crate::error::{ProtocolError, Result};

/// Length of the version banner exchanged by both sides.
pub const PROTOCOL_VERSION_LEN: usize = 12;

/// RFB protocol version as `major.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProtocolVersion {
	pub major: u16,
	pub minor: u16,
}

impl ProtocolVersion {
	pub const V3_3: Self = Self { major: 3, minor: 3 };
	pub const V3_7: Self = Self { major: 3, minor: 7 };
	pub const V3_8: Self = Self { major: 3, minor: 8 };

	/// Parses a 12-byte banner such as `RFB 003.008\n`.
	pub fn parse(banner: &[u8]) -> Result<Self> {
		let malformed = || ProtocolError::MalformedVersion(String::from_utf8_lossy(banner).into_owned());

		if banner.len() != PROTOCOL_VERSION_LEN || &banner[..4] != b"RFB " || banner[7] != b'.' || banner[11] != b'\n' {
			return Err(malformed());
		}

		let field = |bytes: &[u8]| -> Option<u16> {
			if !bytes.iter().all(u8::is_ascii_digit) {
				return None;
			}
			std::str::from_utf8(bytes).ok()?.parse().ok()
		};

		let major = field(&banner[4..7]).ok_or_else(malformed)?;
		let minor = field(&banner[8..11]).ok_or_else(malformed)?;
		Ok(Self { major, minor })
	}

	/// Encodes the version as the 12-byte banner sent on the wire.
	pub fn encode(&self) -> [u8; PROTOCOL_VERSION_LEN] {
		let text = format!("RFB {:03}.{:03}\n", self.major, self.minor);
		let mut out = [0u8; PROTOCOL_VERSION_LEN];
		out.copy_from_slice(&text.as_bytes()[..PROTOCOL_VERSION_LEN]);
		out
	}

	/// Picks the version the client answers with for a given server banner.
	///
	/// Only 3.3, 3.7 and 3.8 are defined. Anything newer than 3.8 is answered
	/// with 3.8, unknown minors between 3 and 7 fall back to 3.3.
	pub fn negotiate(server: Self) -> Result<Self> {
		match (server.major, server.minor) {
			(major, _) if major > 3 => Ok(Self::V3_8),
			(3, minor) if minor >= 8 => Ok(Self::V3_8),
			(3, 7) => Ok(Self::V3_7),
			(3, minor) if minor >= 3 => Ok(Self::V3_3),
			(major, minor) => Err(ProtocolError::UnsupportedVersion { major, minor }),
		}
	}

	/// Whether the server lists security types (3.7+) rather than dictating one.
	pub fn has_security_list(&self) -> bool {
		*self >= Self::V3_7
	}

	/// Whether the server sends a security result after `None` authentication.
	pub fn has_result_for_none(&self) -> bool {
		*self >= Self::V3_8
	}

	/// Whether a failed security result is followed by a reason string.
	pub fn has_failure_reason(&self) -> bool {
		*self >= Self::V3_8
	}
}

impl fmt::Display for ProtocolVersion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}", self.major, self.minor)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_standard_banner() {
		let version = ProtocolVersion::parse(b"RFB 003.008\n").unwrap();
		assert_eq!(version, ProtocolVersion::V3_8);
		assert_eq!(version.encode(), *b"RFB 003.008\n");
	}

	#[test]
	fn rejects_garbage_banner() {
		assert!(matches!(ProtocolVersion::parse(b"SSH-2.0-x\r\n\n"), Err(ProtocolError::MalformedVersion(_))));
		assert!(ProtocolVersion::parse(b"RFB 003.008").is_err());
		assert!(ProtocolVersion::parse(b"RFB 0x3.008\n").is_err());
	}

	#[test]
	fn negotiates_down_to_known_versions() {
		let v = |major, minor| ProtocolVersion { major, minor };
		assert_eq!(ProtocolVersion::negotiate(v(3, 889)).unwrap(), ProtocolVersion::V3_8);
		assert_eq!(ProtocolVersion::negotiate(v(4, 1)).unwrap(), ProtocolVersion::V3_8);
		assert_eq!(ProtocolVersion::negotiate(v(3, 7)).unwrap(), ProtocolVersion::V3_7);
		assert_eq!(ProtocolVersion::negotiate(v(3, 5)).unwrap(), ProtocolVersion::V3_3);
		assert_eq!(
			ProtocolVersion::negotiate(v(3, 2)),
			Err(ProtocolError::UnsupportedVersion { major: 3, minor: 2 })
		);
	}

	#[test]
	fn version_capabilities() {
		assert!(!ProtocolVersion::V3_3.has_security_list());
		assert!(ProtocolVersion::V3_7.has_security_list());
		assert!(!ProtocolVersion::V3_7.has_result_for_none());
		assert!(ProtocolVersion::V3_8.has_result_for_none());
		assert!(ProtocolVersion::V3_8.has_failure_reason());
	}
}
