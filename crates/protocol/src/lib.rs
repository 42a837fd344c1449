//! Wire types for the subset of the RFB (VNC) protocol used by vncboot.
//!
//! This crate is pure: it encodes and decodes byte layouts and never performs
//! I/O. The async client that drives a handshake over a socket lives in
//! `vncboot-runtime`.
//!
//! # Handshake order
//!
//! 1. Server sends its [`ProtocolVersion`] banner, client answers with the
//!    negotiated version ([`ProtocolVersion::negotiate`])
//! 2. Server offers [`SecurityType`]s, client picks one
//! 3. For [`SecurityType::VncAuth`], client answers the 16-byte challenge with
//!    [`auth::challenge_response`]
//! 4. Server sends a security result ([`SECURITY_RESULT_OK`] on success)
//! 5. Client sends [`ClientInit`], server answers with [`ServerInit`]
//! 6. Client sends [`KeyEvent`] messages; the server may send
//!    [`ServerMessage`]s at any time

pub mod auth;
pub mod error;
pub mod keysym;
pub mod messages;
pub mod security;
pub mod version;

pub use error::{ProtocolError, Result};
pub use messages::{
	ClientInit, KeyEvent, PixelFormat, SERVER_INIT_HEADER_LEN, ServerInit, ServerInitHeader, ServerMessage,
};
pub use security::{SECURITY_RESULT_FAILED, SECURITY_RESULT_OK, SecurityType};
pub use version::{PROTOCOL_VERSION_LEN, ProtocolVersion};
