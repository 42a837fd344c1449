//! Security type negotiation.

use std::fmt;

/// Security result word sent by the server after authentication succeeded.
pub const SECURITY_RESULT_OK: u32 = 0;
/// Security result word sent by the server after authentication failed.
pub const SECURITY_RESULT_FAILED: u32 = 1;

/// Security types defined by RFC 6143 that this client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityType {
	/// Connection failed; a reason string follows.
	Invalid,
	/// No authentication.
	None,
	/// DES challenge/response password authentication.
	VncAuth,
	/// Any other type (Tight, VeNCrypt, ...), never selected.
	Other(u8),
}

impl SecurityType {
	pub fn from_u8(value: u8) -> Self {
		match value {
			0 => Self::Invalid,
			1 => Self::None,
			2 => Self::VncAuth,
			other => Self::Other(other),
		}
	}

	/// RFB 3.3 servers dictate the type as a 32-bit word.
	pub fn from_u32(value: u32) -> Self {
		u8::try_from(value).map_or(Self::Other(u8::MAX), Self::from_u8)
	}

	pub fn to_u8(self) -> u8 {
		match self {
			Self::Invalid => 0,
			Self::None => 1,
			Self::VncAuth => 2,
			Self::Other(value) => value,
		}
	}

	/// The type the client wants: password auth when a password is configured.
	pub fn preferred(has_password: bool) -> Self {
		if has_password { Self::VncAuth } else { Self::None }
	}
}

impl fmt::Display for SecurityType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Invalid => f.write_str("invalid"),
			Self::None => f.write_str("none"),
			Self::VncAuth => f.write_str("vnc-auth"),
			Self::Other(value) => write!(f, "type {value}"),
		}
	}
}
