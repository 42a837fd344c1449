//! Error types for the RFB runtime.

use thiserror::Error;
use vncboot_protocol::{ProtocolError, SecurityType};

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while dialing, handshaking, or talking to an RFB server.
#[derive(Debug, Error)]
pub enum Error {
	/// TCP connect failed (refused, unresolvable host, unreachable).
	#[error("failed to dial {addr}")]
	Dial {
		addr: String,
		#[source]
		source: std::io::Error,
	},

	/// Read or write on an established transport failed.
	#[error("transport I/O failed")]
	Io(#[from] std::io::Error),

	/// The server sent bytes that are not valid RFB.
	#[error("invalid RFB data")]
	Protocol(#[from] ProtocolError),

	/// The server refused the connection before authentication.
	#[error("server refused connection: {0}")]
	Refused(String),

	/// The server does not offer the security type the client needs.
	#[error("server does not offer {wanted} authentication (offered: {offered})")]
	UnsupportedSecurity { wanted: SecurityType, offered: String },

	/// The server rejected the credentials.
	#[error("authentication failed: {0}")]
	AuthFailed(String),

	/// The session was closed while an operation was in flight.
	#[error("connection closed")]
	Closed,
}

impl Error {
	/// Returns true if the handshake or authentication was rejected, as
	/// opposed to the network failing underneath it.
	pub fn is_auth(&self) -> bool {
		matches!(
			self,
			Error::Protocol(_) | Error::Refused(_) | Error::UnsupportedSecurity { .. } | Error::AuthFailed(_)
		)
	}

	/// Returns true if the transport failed or was closed.
	pub fn is_transport(&self) -> bool {
		!self.is_auth()
	}
}
