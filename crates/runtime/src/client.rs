//! RFB client: handshake, authentication, and key event delivery.
//!
//! The client is generic over its [`Stream`] so the same code runs over TCP
//! and over in-memory pipes in tests. It never requests framebuffer updates.
//! After initialisation the stream is split: KeyEvents go out on the write
//! half, and a background task reads and drops whatever the server sends.
//!
//! # Handshake
//!
//! ```text
//! server                         client
//!   RFB 003.008\n        ──▶
//!                        ◀──     RFB 003.008\n      (negotiated)
//!   [n, types...]        ──▶                        (3.7+; 3.3 sends one u32)
//!                        ◀──     chosen type        (3.7+ only)
//!   challenge[16]        ──▶                        (VNC auth only)
//!                        ◀──     response[16]
//!   result u32           ──▶                        (VNC auth, or None on 3.8)
//!                        ◀──     ClientInit
//!   ServerInit           ──▶
//! ```

use tokio::io::{AsyncReadExt, AsyncWriteExt, WriteHalf};
use tracing::debug;
use vncboot_protocol::auth::{CHALLENGE_LEN, challenge_response};
use vncboot_protocol::{
	ClientInit, KeyEvent, PROTOCOL_VERSION_LEN, ProtocolError, ProtocolVersion, SECURITY_RESULT_OK, SERVER_INIT_HEADER_LEN,
	SecurityType, ServerInit, ServerInitHeader,
};

use crate::drain::DrainTask;
use crate::error::{Error, Result};
use crate::transport::{self, Stream};

/// Upper bound for server-sent strings (desktop name, failure reasons).
const MAX_STRING_LEN: u32 = 64 * 1024;

/// Authentication and sharing options for one handshake.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
	/// Password for VNC authentication; `None` selects no-credential auth.
	pub password: Option<String>,
	/// Ask the server to disconnect other clients.
	pub exclusive: bool,
}

impl ClientConfig {
	/// Builds a config from a possibly empty password.
	pub fn new(password: &str, exclusive: bool) -> Self {
		Self {
			password: (!password.is_empty()).then(|| password.to_string()),
			exclusive,
		}
	}
}

/// Authenticated RFB connection.
pub struct RfbClient<S> {
	writer: WriteHalf<S>,
	reader: DrainTask,
	version: ProtocolVersion,
	server: ServerInit,
}

impl<S: Stream> RfbClient<S> {
	/// Runs the full client handshake over an already open transport.
	pub async fn handshake(mut stream: S, config: &ClientConfig) -> Result<Self> {
		let mut banner = [0u8; PROTOCOL_VERSION_LEN];
		stream.read_exact(&mut banner).await?;
		let server_version = ProtocolVersion::parse(&banner)?;
		let version = ProtocolVersion::negotiate(server_version)?;
		stream.write_all(&version.encode()).await?;
		stream.flush().await?;
		debug!(target = "vncboot.rfb", server = %server_version, negotiated = %version, "version agreed");

		let wanted = SecurityType::preferred(config.password.is_some());
		if version.has_security_list() {
			select_security(&mut stream, wanted).await?;
		} else {
			accept_security(&mut stream, wanted).await?;
		}
		debug!(target = "vncboot.rfb", security = %wanted, "security type selected");

		if let (SecurityType::VncAuth, Some(password)) = (wanted, config.password.as_deref()) {
			let mut challenge = [0u8; CHALLENGE_LEN];
			stream.read_exact(&mut challenge).await?;
			stream.write_all(&challenge_response(password, &challenge)).await?;
			stream.flush().await?;
		}

		if wanted == SecurityType::VncAuth || version.has_result_for_none() {
			let result = stream.read_u32().await?;
			if result != SECURITY_RESULT_OK {
				let reason = if version.has_failure_reason() {
					read_string(&mut stream, "failure reason").await?
				} else {
					"server rejected credentials".to_string()
				};
				return Err(Error::AuthFailed(reason));
			}
		}

		let init = ClientInit { shared: !config.exclusive };
		stream.write_all(&init.encode()).await?;
		stream.flush().await?;

		let mut header = [0u8; SERVER_INIT_HEADER_LEN];
		stream.read_exact(&mut header).await?;
		let header = ServerInitHeader::decode(&header)?;
		check_len("desktop name", header.name_len)?;
		let mut name = vec![0u8; header.name_len as usize];
		stream.read_exact(&mut name).await?;
		let server = ServerInit::from_parts(header, &name);

		debug!(
			target = "vncboot.rfb",
			desktop = %server.name,
			width = server.width,
			height = server.height,
			"handshake complete"
		);

		let (reader, writer) = tokio::io::split(stream);
		Ok(Self {
			writer,
			reader: DrainTask::spawn(reader),
			version,
			server,
		})
	}

	/// Negotiated protocol version.
	pub fn version(&self) -> ProtocolVersion {
		self.version
	}

	/// Desktop description from `ServerInit`.
	pub fn server_init(&self) -> &ServerInit {
		&self.server
	}

	/// Sends one KeyEvent and flushes it to the transport.
	pub async fn key_event(&mut self, event: KeyEvent) -> Result<()> {
		self.writer.write_all(&event.encode()).await?;
		self.writer.flush().await?;
		Ok(())
	}

	/// Stops reading server messages, then shuts the transport down so the
	/// server sees EOF.
	pub async fn close(self) -> Result<()> {
		let Self { writer, reader, .. } = self;
		drop(reader);
		transport::shutdown(writer).await
	}
}

async fn select_security<S: Stream>(stream: &mut S, wanted: SecurityType) -> Result<()> {
	let count = stream.read_u8().await?;
	if count == 0 {
		return Err(Error::Refused(read_string(stream, "failure reason").await?));
	}

	let mut offered = vec![0u8; usize::from(count)];
	stream.read_exact(&mut offered).await?;
	let offered: Vec<SecurityType> = offered.into_iter().map(SecurityType::from_u8).collect();

	if !offered.contains(&wanted) {
		return Err(Error::UnsupportedSecurity {
			wanted,
			offered: offered.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
		});
	}

	stream.write_all(&[wanted.to_u8()]).await?;
	stream.flush().await?;
	Ok(())
}

async fn accept_security<S: Stream>(stream: &mut S, wanted: SecurityType) -> Result<()> {
	match SecurityType::from_u32(stream.read_u32().await?) {
		SecurityType::Invalid => Err(Error::Refused(read_string(stream, "failure reason").await?)),
		dictated if dictated == wanted => Ok(()),
		dictated => Err(Error::UnsupportedSecurity {
			wanted,
			offered: dictated.to_string(),
		}),
	}
}

async fn read_string<S: Stream>(stream: &mut S, what: &'static str) -> Result<String> {
	let len = stream.read_u32().await?;
	check_len(what, len)?;
	let mut buf = vec![0u8; len as usize];
	stream.read_exact(&mut buf).await?;
	Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn check_len(what: &'static str, len: u32) -> Result<()> {
	if len > MAX_STRING_LEN {
		return Err(ProtocolError::Oversized {
			what,
			len,
			limit: MAX_STRING_LEN,
		}
		.into());
	}
	Ok(())
}
