//! In-memory RFB server for tests.
//!
//! Serves the server side of the handshake over a [`tokio::io::duplex`] pipe
//! and records every KeyEvent the client sends. It can also send unsolicited
//! server messages before reading any KeyEvent.
//!
//! # Example
//!
//! ```ignore
//! let (stream, server) = FakeServer::new().with_password("secret").spawn();
//! let mut client = RfbClient::handshake(stream, &ClientConfig::new("secret", true)).await?;
//! client.key_event(KeyEvent::press(0x61)).await?;
//! client.close().await?;
//! assert_eq!(server.join().await.events, vec![KeyEvent::press(0x61)]);
//! ```

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;
use vncboot_protocol::auth::{CHALLENGE_LEN, challenge_response};
use vncboot_protocol::{
	KeyEvent, ProtocolVersion, SECURITY_RESULT_FAILED, SECURITY_RESULT_OK, SecurityType, ServerMessage,
};

const CHALLENGE: [u8; CHALLENGE_LEN] = *b"vncboot-fake-rfb";

/// Size of each clipboard message sent by [`FakeServer::with_chatter`].
const CHATTER_TEXT_LEN: usize = 1024;

/// How the fake server authenticates clients.
#[derive(Debug, Clone)]
pub enum FakeSecurity {
	/// Offer only no-credential auth.
	None,
	/// Offer only VNC auth and accept this password.
	Password(String),
	/// Refuse every client with this reason.
	Refuse(String),
}

/// What the server observed once the client went away.
#[derive(Debug, Clone, Default)]
pub struct FakeSession {
	/// Whether the handshake reached `ClientInit`.
	pub initialised: bool,
	/// Shared flag from `ClientInit`.
	pub shared: Option<bool>,
	/// Every KeyEvent received, in order.
	pub events: Vec<KeyEvent>,
}

/// Builder for an in-memory RFB server.
#[derive(Debug, Clone)]
pub struct FakeServer {
	banner: [u8; 12],
	security: FakeSecurity,
	desktop: String,
	chatter: usize,
}

impl Default for FakeServer {
	fn default() -> Self {
		Self::new()
	}
}

impl FakeServer {
	/// RFB 3.8 server without authentication.
	pub fn new() -> Self {
		Self {
			banner: *b"RFB 003.008\n",
			security: FakeSecurity::None,
			desktop: "fake-desktop".to_string(),
			chatter: 0,
		}
	}

	/// Overrides the version banner the server announces.
	pub fn with_banner(mut self, banner: &[u8; 12]) -> Self {
		self.banner = *banner;
		self
	}

	/// Requires VNC authentication with `password`.
	pub fn with_password(mut self, password: &str) -> Self {
		self.security = FakeSecurity::Password(password.to_string());
		self
	}

	/// Refuses every connection with `reason`.
	pub fn refusing(mut self, reason: &str) -> Self {
		self.security = FakeSecurity::Refuse(reason.to_string());
		self
	}

	/// After `ServerInit`, sends `count` 1 KiB ServerCutText messages, a
	/// colour map update, and a Bell before reading any KeyEvent.
	pub fn with_chatter(mut self, count: usize) -> Self {
		self.chatter = count;
		self
	}

	/// Spawns the server and returns the client end of the pipe.
	pub fn spawn(self) -> (DuplexStream, FakeServerHandle) {
		let (client, server) = tokio::io::duplex(4096);
		let events = Arc::new(Mutex::new(Vec::new()));
		let task = tokio::spawn(serve(self, server, Arc::clone(&events)));
		(client, FakeServerHandle { events, task })
	}
}

/// Handle to a running fake server.
pub struct FakeServerHandle {
	events: Arc<Mutex<Vec<KeyEvent>>>,
	task: JoinHandle<FakeSession>,
}

impl FakeServerHandle {
	/// KeyEvents received so far.
	pub fn events(&self) -> Vec<KeyEvent> {
		self.events.lock().map(|events| events.clone()).unwrap_or_default()
	}

	/// Waits for the client to disconnect and returns what the server saw.
	pub async fn join(self) -> FakeSession {
		self.task.await.unwrap_or_default()
	}
}

async fn serve(config: FakeServer, mut stream: DuplexStream, events: Arc<Mutex<Vec<KeyEvent>>>) -> FakeSession {
	let mut session = FakeSession::default();
	// Any I/O error means the client hung up; report what we have.
	let _ = serve_inner(&config, &mut stream, &events, &mut session).await;
	session.events = events.lock().map(|events| events.clone()).unwrap_or_default();
	session
}

async fn serve_inner(
	config: &FakeServer,
	stream: &mut DuplexStream,
	events: &Mutex<Vec<KeyEvent>>,
	session: &mut FakeSession,
) -> std::io::Result<()> {
	stream.write_all(&config.banner).await?;
	let mut reply = [0u8; 12];
	stream.read_exact(&mut reply).await?;
	let version = ProtocolVersion::parse(&reply).map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;

	let offered = match &config.security {
		FakeSecurity::None => SecurityType::None,
		FakeSecurity::Password(_) => SecurityType::VncAuth,
		FakeSecurity::Refuse(reason) => {
			if version.has_security_list() {
				stream.write_u8(0).await?;
			} else {
				stream.write_u32(0).await?;
			}
			write_string(stream, reason).await?;
			return Ok(());
		}
	};

	if version.has_security_list() {
		stream.write_all(&[1, offered.to_u8()]).await?;
		let chosen = stream.read_u8().await?;
		if chosen != offered.to_u8() {
			return Ok(());
		}
	} else {
		stream.write_u32(u32::from(offered.to_u8())).await?;
	}

	if let FakeSecurity::Password(password) = &config.security {
		stream.write_all(&CHALLENGE).await?;
		let mut response = [0u8; CHALLENGE_LEN];
		stream.read_exact(&mut response).await?;
		if response != challenge_response(password, &CHALLENGE) {
			stream.write_u32(SECURITY_RESULT_FAILED).await?;
			if version.has_failure_reason() {
				write_string(stream, "bad password").await?;
			}
			return Ok(());
		}
		stream.write_u32(SECURITY_RESULT_OK).await?;
	} else if version.has_result_for_none() {
		stream.write_u32(SECURITY_RESULT_OK).await?;
	}

	session.shared = Some(stream.read_u8().await? != 0);
	session.initialised = true;

	let mut init = Vec::with_capacity(24 + config.desktop.len());
	init.extend_from_slice(&1024u16.to_be_bytes());
	init.extend_from_slice(&768u16.to_be_bytes());
	init.extend_from_slice(&[32, 24, 0, 1, 0, 255, 0, 255, 0, 255, 16, 8, 0, 0, 0, 0]);
	init.extend_from_slice(&(config.desktop.len() as u32).to_be_bytes());
	init.extend_from_slice(config.desktop.as_bytes());
	stream.write_all(&init).await?;

	if config.chatter > 0 {
		send_chatter(stream, config.chatter).await?;
	}

	let mut message = [0u8; 8];
	loop {
		stream.read_exact(&mut message).await?;
		if let Some(event) = KeyEvent::decode(&message) {
			if let Ok(mut events) = events.lock() {
				events.push(event);
			}
		}
	}
}

async fn send_chatter(stream: &mut DuplexStream, count: usize) -> std::io::Result<()> {
	let text = "x".repeat(CHATTER_TEXT_LEN);
	for _ in 0..count {
		stream.write_all(&[ServerMessage::ServerCutText.to_u8(), 0, 0, 0]).await?;
		write_string(stream, &text).await?;
	}
	// One entry starting at colour 0.
	stream.write_all(&[ServerMessage::SetColourMapEntries.to_u8(), 0, 0, 0, 0, 1]).await?;
	stream.write_all(&[0xff, 0xff, 0, 0, 0, 0]).await?;
	stream.write_u8(ServerMessage::Bell.to_u8()).await
}

async fn write_string(stream: &mut DuplexStream, value: &str) -> std::io::Result<()> {
	stream.write_u32(value.len() as u32).await?;
	stream.write_all(value.as_bytes()).await
}
