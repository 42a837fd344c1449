//! One live connection to a VNC server.
//!
//! A [`Session`] owns the transport and, once the handshake succeeds, the
//! authenticated RFB client running on it. The client is only ever present
//! on an open, authenticated transport, so the three states are kept in one
//! enum rather than two optional handles.
//!
//! Closing can be requested from another task through a [`SessionCloser`].
//! The closer never touches protocol data: it fires the session's close token,
//! which makes any in-flight or later key event fail, and the owner releases
//! the handles with [`Session::close`].

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use vncboot_protocol::{KeyEvent, ServerInit};
use vncboot_runtime::{BoxedStream, ClientConfig, RfbClient, transport};

use crate::error::{Error, Result};

enum State {
	Empty,
	Dialed(BoxedStream),
	Ready(RfbClient<BoxedStream>),
}

/// Transport plus authenticated protocol client for one connection.
pub struct Session {
	host: String,
	port: u16,
	state: State,
	closed: CancellationToken,
}

/// Detached handle that closes a [`Session`] from another task.
#[derive(Debug, Clone)]
pub struct SessionCloser {
	closed: CancellationToken,
}

impl SessionCloser {
	/// Marks the session closed. In-flight key events are abandoned and fail
	/// with a transport error.
	pub fn close(&self) {
		self.closed.cancel();
	}

	pub fn is_closed(&self) -> bool {
		self.closed.is_cancelled()
	}
}

impl Session {
	/// Creates an empty session for `host:port`.
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self {
			host: host.into(),
			port,
			state: State::Empty,
			closed: CancellationToken::new(),
		}
	}

	/// Creates a session around an open, not yet authenticated transport.
	pub fn dialed(host: impl Into<String>, port: u16, stream: BoxedStream) -> Self {
		let mut session = Self::new(host, port);
		session.state = State::Dialed(stream);
		session
	}

	/// Runs the RFB handshake on the dialed transport.
	///
	/// On failure the transport is dropped and the session is left empty.
	pub async fn authenticate(&mut self, config: &ClientConfig) -> Result<()> {
		let stream = match std::mem::replace(&mut self.state, State::Empty) {
			State::Dialed(stream) => stream,
			other => {
				self.state = other;
				return Err(Error::NotConnected);
			}
		};
		let client = RfbClient::handshake(stream, config).await?;
		self.state = State::Ready(client);
		Ok(())
	}

	pub fn host(&self) -> &str {
		&self.host
	}

	pub fn port(&self) -> u16 {
		self.port
	}

	/// Returns true once authentication has succeeded and until close.
	pub fn is_ready(&self) -> bool {
		matches!(self.state, State::Ready(_))
	}

	/// Desktop description sent by the server, when authenticated.
	pub fn desktop(&self) -> Option<&ServerInit> {
		match &self.state {
			State::Ready(client) => Some(client.server_init()),
			_ => None,
		}
	}

	/// Returns a handle that can close this session from another task.
	pub fn closer(&self) -> SessionCloser {
		SessionCloser {
			closed: self.closed.clone(),
		}
	}

	/// Sends one KeyEvent, racing the close token.
	pub async fn key_event(&mut self, event: KeyEvent) -> Result<()> {
		if self.closed.is_cancelled() {
			return Err(Error::Transport(vncboot_runtime::Error::Closed));
		}
		let State::Ready(client) = &mut self.state else {
			return Err(Error::NotConnected);
		};

		tokio::select! {
			biased;
			_ = self.closed.cancelled() => Err(Error::Transport(vncboot_runtime::Error::Closed)),
			result = client.key_event(event) => result.map_err(Error::from),
		}
	}

	/// Releases the protocol client, then the transport.
	///
	/// The client stops its server reader before shutting the transport down.
	/// Absent handles are skipped, and closing twice is a no-op.
	pub async fn close(&mut self) -> Result<()> {
		self.closed.cancel();
		match std::mem::replace(&mut self.state, State::Empty) {
			State::Empty => Ok(()),
			State::Dialed(stream) => {
				debug!(target = "vncboot", host = %self.host, port = self.port, "closing unauthenticated transport");
				transport::shutdown(stream).await.map_err(Error::from)
			}
			State::Ready(client) => {
				debug!(target = "vncboot", host = %self.host, port = self.port, "closing session");
				client.close().await.map_err(Error::from)
			}
		}
	}
}

impl fmt::Debug for Session {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = match self.state {
			State::Empty => "empty",
			State::Dialed(_) => "dialed",
			State::Ready(_) => "ready",
		};
		f.debug_struct("Session")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("state", &state)
			.field("closed", &self.closed.is_cancelled())
			.finish()
	}
}

#[cfg(test)]
mod tests;
