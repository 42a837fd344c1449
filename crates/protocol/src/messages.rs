//! Initialisation messages, client-to-server KeyEvents, and server message
//! types.

use crate::error::{ProtocolError, Result};

/// Length of the fixed part of `ServerInit` (before the desktop name).
pub const SERVER_INIT_HEADER_LEN: usize = 24;

/// Message type byte of a client KeyEvent.
pub const KEY_EVENT_MESSAGE_TYPE: u8 = 4;

/// First client message after authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientInit {
	/// Whether other clients may stay connected to the same desktop.
	pub shared: bool,
}

impl ClientInit {
	/// Requests exclusive access: the server disconnects other clients.
	pub fn exclusive() -> Self {
		Self { shared: false }
	}

	pub fn encode(&self) -> [u8; 1] {
		[u8::from(self.shared)]
	}
}

/// Server pixel format, decoded for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelFormat {
	pub bits_per_pixel: u8,
	pub depth: u8,
	pub big_endian: bool,
	pub true_colour: bool,
	pub red_max: u16,
	pub green_max: u16,
	pub blue_max: u16,
	pub red_shift: u8,
	pub green_shift: u8,
	pub blue_shift: u8,
}

impl PixelFormat {
	fn decode(bytes: &[u8; 16]) -> Self {
		Self {
			bits_per_pixel: bytes[0],
			depth: bytes[1],
			big_endian: bytes[2] != 0,
			true_colour: bytes[3] != 0,
			red_max: u16::from_be_bytes([bytes[4], bytes[5]]),
			green_max: u16::from_be_bytes([bytes[6], bytes[7]]),
			blue_max: u16::from_be_bytes([bytes[8], bytes[9]]),
			red_shift: bytes[10],
			green_shift: bytes[11],
			blue_shift: bytes[12],
		}
	}
}

/// Fixed-size prefix of `ServerInit`; tells the reader how long the name is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerInitHeader {
	pub width: u16,
	pub height: u16,
	pub pixel_format: PixelFormat,
	pub name_len: u32,
}

impl ServerInitHeader {
	pub fn decode(bytes: &[u8]) -> Result<Self> {
		let bytes: &[u8; SERVER_INIT_HEADER_LEN] = bytes.try_into().map_err(|_| ProtocolError::Truncated {
			what: "ServerInit",
			expected: SERVER_INIT_HEADER_LEN,
			actual: bytes.len(),
		})?;

		let mut pixel_format = [0u8; 16];
		pixel_format.copy_from_slice(&bytes[4..20]);

		Ok(Self {
			width: u16::from_be_bytes([bytes[0], bytes[1]]),
			height: u16::from_be_bytes([bytes[2], bytes[3]]),
			pixel_format: PixelFormat::decode(&pixel_format),
			name_len: u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]),
		})
	}
}

/// Desktop description sent by the server after `ClientInit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInit {
	pub width: u16,
	pub height: u16,
	pub pixel_format: PixelFormat,
	pub name: String,
}

impl ServerInit {
	pub fn from_parts(header: ServerInitHeader, name: &[u8]) -> Self {
		Self {
			width: header.width,
			height: header.height,
			pixel_format: header.pixel_format,
			name: String::from_utf8_lossy(name).into_owned(),
		}
	}
}

/// Server-to-client message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMessage {
	FramebufferUpdate,
	SetColourMapEntries,
	Bell,
	ServerCutText,
}

impl ServerMessage {
	pub fn from_u8(value: u8) -> Option<Self> {
		match value {
			0 => Some(Self::FramebufferUpdate),
			1 => Some(Self::SetColourMapEntries),
			2 => Some(Self::Bell),
			3 => Some(Self::ServerCutText),
			_ => None,
		}
	}

	pub fn to_u8(self) -> u8 {
		match self {
			Self::FramebufferUpdate => 0,
			Self::SetColourMapEntries => 1,
			Self::Bell => 2,
			Self::ServerCutText => 3,
		}
	}
}

/// Key press or release, identified by an X11 keysym.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
	pub keysym: u32,
	pub down: bool,
}

impl KeyEvent {
	pub fn press(keysym: u32) -> Self {
		Self { keysym, down: true }
	}

	pub fn release(keysym: u32) -> Self {
		Self { keysym, down: false }
	}

	pub fn encode(&self) -> [u8; 8] {
		let sym = self.keysym.to_be_bytes();
		[KEY_EVENT_MESSAGE_TYPE, u8::from(self.down), 0, 0, sym[0], sym[1], sym[2], sym[3]]
	}

	/// Decodes a KeyEvent; used by in-memory servers in tests.
	pub fn decode(bytes: &[u8]) -> Option<Self> {
		match bytes {
			[KEY_EVENT_MESSAGE_TYPE, down, _, _, a, b, c, d] => Some(Self {
				keysym: u32::from_be_bytes([*a, *b, *c, *d]),
				down: *down != 0,
			}),
			_ => None,
		}
	}
}
