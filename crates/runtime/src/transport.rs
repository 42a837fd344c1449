//! Byte-stream transports the RFB client runs on.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{Error, Result};

/// Anything the client can speak RFB over: a TCP socket in production, an
/// in-memory duplex pipe in tests.
pub trait Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> Stream for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// Type-erased transport handle.
pub type BoxedStream = Box<dyn Stream>;

/// Opens a TCP connection to `host:port`.
///
/// Nagle is disabled: key events are tiny and latency-sensitive.
pub async fn dial_tcp(host: &str, port: u16) -> Result<TcpStream> {
	let addr = format!("{host}:{port}");
	debug!(target = "vncboot.rfb", %addr, "dialing");

	let stream = TcpStream::connect((host, port))
		.await
		.map_err(|source| Error::Dial { addr: addr.clone(), source })?;
	stream.set_nodelay(true)?;

	debug!(target = "vncboot.rfb", %addr, "transport open");
	Ok(stream)
}

/// Shuts the write side down so the peer sees EOF, then drops the stream.
pub async fn shutdown<W: AsyncWrite + Unpin>(mut stream: W) -> Result<()> {
	let result = stream.shutdown().await;
	drop(stream);
	match result {
		Ok(()) => Ok(()),
		// Peer already gone; the socket is released either way.
		Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
		Err(err) => Err(err.into()),
	}
}

#[cfg(test)]
mod tests {
	use tokio::io::AsyncReadExt;

	use super::*;

	#[tokio::test]
	async fn dial_refused_reports_address() {
		// Bind then drop to get a port nothing listens on.
		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		let port = listener.local_addr().unwrap().port();
		drop(listener);

		let err = dial_tcp("127.0.0.1", port).await.unwrap_err();
		match err {
			Error::Dial { addr, .. } => assert_eq!(addr, format!("127.0.0.1:{port}")),
			other => panic!("expected Dial error, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn shutdown_signals_eof_to_peer() {
		let (local, mut remote) = tokio::io::duplex(64);
		shutdown(Box::new(local)).await.unwrap();

		let mut buf = Vec::new();
		let n = remote.read_to_end(&mut buf).await.unwrap();
		assert_eq!(n, 0);
	}
}
