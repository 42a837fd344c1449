//! Error types for vncboot runs.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::bootcommand::ParseError;
use crate::provisioner::RunState;

/// Result type alias for vncboot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that end a provisioning run.
///
/// Messages name the phase; the underlying cause is available through
/// [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum Error {
	/// Malformed or conflicting configuration.
	#[error("invalid configuration: {0}")]
	Config(String),

	/// A script file could not be opened.
	#[error("failed to open script '{}'", path.display())]
	ScriptOpen {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// A script could not be read to the end.
	#[error("failed to read script '{name}'")]
	ScriptRead {
		name: String,
		#[source]
		source: std::io::Error,
	},

	/// Boot-command syntax error.
	#[error(transparent)]
	Parse(#[from] ParseError),

	/// Dial, read, or write failure, including writes on a closed session.
	#[error("transport failure")]
	Transport(#[source] vncboot_runtime::Error),

	/// The server rejected the handshake or the credentials.
	#[error("authentication rejected")]
	Auth(#[source] vncboot_runtime::Error),

	/// Every connection attempt failed until the deadline passed.
	#[error("could not connect to {addr} within {}", crate::duration::format(*timeout))]
	Connect {
		addr: String,
		timeout: Duration,
		#[source]
		last: Box<Error>,
	},

	/// A key operation was attempted without an authenticated session.
	#[error("session is not connected")]
	NotConnected,

	/// The run's cancellation token fired.
	#[error("run cancelled while {phase}")]
	Cancelled { phase: RunState },

	/// A script failed part way; the console may hold partial input.
	#[error("script {}/{total} ('{name}') failed", index + 1)]
	Script {
		index: usize,
		total: usize,
		name: String,
		#[source]
		source: Box<Error>,
	},
}

impl Error {
	/// Returns true if this error (or the script failure it wraps) is a cancellation.
	pub fn is_cancelled(&self) -> bool {
		match self {
			Error::Cancelled { .. } => true,
			Error::Script { source, .. } => source.is_cancelled(),
			_ => false,
		}
	}

	/// Returns true if the server rejected authentication, directly or as
	/// the last error before a connect deadline.
	pub fn is_auth(&self) -> bool {
		match self {
			Error::Auth(_) => true,
			Error::Connect { last, .. } => last.is_auth(),
			_ => false,
		}
	}
}

impl From<vncboot_runtime::Error> for Error {
	fn from(err: vncboot_runtime::Error) -> Self {
		if err.is_auth() { Error::Auth(err) } else { Error::Transport(err) }
	}
}
