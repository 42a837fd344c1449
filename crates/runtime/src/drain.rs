//! Background reader for server-to-client traffic.
//!
//! The client never requests framebuffer updates, but a server may still send
//! bells, clipboard text, or colour map changes at any point after
//! `ServerInit`. Those messages are read and dropped so they never pile up in
//! the socket's receive buffer.

use std::io::{self, ErrorKind};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, trace};
use vncboot_protocol::ServerMessage;

/// Size of one colour map entry: red, green, and blue as u16.
const COLOUR_MAP_ENTRY_LEN: u64 = 6;

/// Reader task that is aborted when dropped.
#[derive(Debug)]
pub(crate) struct DrainTask(JoinHandle<()>);

impl DrainTask {
	pub(crate) fn spawn<R>(reader: R) -> Self
	where
		R: AsyncRead + Unpin + Send + 'static,
	{
		Self(tokio::spawn(drain(reader)))
	}
}

impl Drop for DrainTask {
	fn drop(&mut self) {
		self.0.abort();
	}
}

async fn drain<R: AsyncRead + Unpin>(mut reader: R) {
	match drain_messages(&mut reader).await {
		Ok(messages) => debug!(target = "vncboot.rfb", messages, "server closed the connection"),
		Err(err) => debug!(target = "vncboot.rfb", error = %err, "server reader stopped"),
	}
}

/// Reads server messages until EOF and returns how many were framed.
///
/// Messages that cannot be framed without a negotiated encoding switch the
/// reader to discarding raw bytes until EOF.
async fn drain_messages<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<usize> {
	let mut messages = 0;
	loop {
		let kind = match reader.read_u8().await {
			Ok(kind) => kind,
			Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Ok(messages),
			Err(err) => return Err(err),
		};

		match ServerMessage::from_u8(kind) {
			Some(ServerMessage::Bell) => trace!(target = "vncboot.rfb", "bell"),
			Some(ServerMessage::ServerCutText) => {
				let mut padding = [0u8; 3];
				reader.read_exact(&mut padding).await?;
				let len = reader.read_u32().await?;
				skip(reader, u64::from(len)).await?;
				trace!(target = "vncboot.rfb", len, "server cut text");
			}
			Some(ServerMessage::SetColourMapEntries) => {
				let mut header = [0u8; 5];
				reader.read_exact(&mut header).await?;
				let count = u16::from_be_bytes([header[3], header[4]]);
				skip(reader, u64::from(count) * COLOUR_MAP_ENTRY_LEN).await?;
				trace!(target = "vncboot.rfb", count, "colour map entries");
			}
			Some(ServerMessage::FramebufferUpdate) | None => {
				debug!(target = "vncboot.rfb", message_type = kind, "unframed server message, discarding input");
				tokio::io::copy(reader, &mut tokio::io::sink()).await?;
				return Ok(messages);
			}
		}
		messages += 1;
	}
}

async fn skip<R: AsyncRead + Unpin>(reader: &mut R, len: u64) -> io::Result<()> {
	let mut limited = (&mut *reader).take(len);
	let skipped = tokio::io::copy(&mut limited, &mut tokio::io::sink()).await?;
	if skipped < len {
		return Err(ErrorKind::UnexpectedEof.into());
	}
	Ok(())
}
