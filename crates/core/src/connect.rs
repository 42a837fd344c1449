//! Connection manager: dial, authenticate, retry under a deadline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vncboot_runtime::{BoxedStream, ClientConfig, dial_tcp};

use crate::duration;
use crate::error::{Error, Result};
use crate::output::{NullOutput, SharedOutput};
use crate::provisioner::RunState;
use crate::session::Session;

/// Budget for the whole connect phase unless configured otherwise.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Opens transports to VNC servers.
#[async_trait]
pub trait Dialer: Send + Sync {
	async fn dial(&self, host: &str, port: u16) -> vncboot_runtime::Result<BoxedStream>;
}

/// Plain TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

#[async_trait]
impl Dialer for TcpDialer {
	async fn dial(&self, host: &str, port: u16) -> vncboot_runtime::Result<BoxedStream> {
		let stream = dial_tcp(host, port).await?;
		Ok(Box::new(stream))
	}
}

/// Exponential backoff between connect attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	pub initial: Duration,
	pub max: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			initial: Duration::from_secs(1),
			max: Duration::from_secs(10),
		}
	}
}

impl RetryPolicy {
	/// Delay that follows `current`: doubled, capped at `max`.
	pub fn next(&self, current: Duration) -> Duration {
		current.saturating_mul(2).min(self.max)
	}
}

/// Produces authenticated [`Session`]s, retrying failed attempts until the
/// connect timeout runs out.
pub struct ConnectionManager<D = TcpDialer> {
	host: String,
	port: u16,
	password: String,
	timeout: Duration,
	retry: RetryPolicy,
	dialer: D,
	output: SharedOutput,
}

impl ConnectionManager<TcpDialer> {
	/// Manager dialing TCP. An empty `password` selects no-credential auth.
	pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>) -> Self {
		Self {
			host: host.into(),
			port,
			password: password.into(),
			timeout: DEFAULT_CONNECT_TIMEOUT,
			retry: RetryPolicy::default(),
			dialer: TcpDialer,
			output: Arc::new(NullOutput),
		}
	}
}

impl<D: Dialer> ConnectionManager<D> {
	/// Replaces the dialer, keeping every other setting.
	pub fn with_dialer<E: Dialer>(self, dialer: E) -> ConnectionManager<E> {
		ConnectionManager {
			host: self.host,
			port: self.port,
			password: self.password,
			timeout: self.timeout,
			retry: self.retry,
			dialer,
			output: self.output,
		}
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;
		self
	}

	pub fn with_output(mut self, output: SharedOutput) -> Self {
		self.output = output;
		self
	}

	/// `host:port` of the server.
	pub fn address(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Connects and authenticates, retrying until the timeout.
	///
	/// The deadline covers the whole loop, so an attempt still in flight when
	/// it passes is abandoned. The last failure is carried by
	/// [`Error::Connect`].
	pub async fn connect(&self, cancel: &CancellationToken) -> Result<Session> {
		let addr = self.address();
		let deadline = Instant::now() + self.timeout;
		let mut delay = self.retry.initial;
		let mut attempt = 1u32;

		let last = loop {
			debug!(target = "vncboot", %addr, attempt, "connect attempt");
			self.output.output(&format!("Connecting to VNC server {addr}..."));

			let result = tokio::select! {
				biased;
				_ = cancel.cancelled() => return Err(Error::Cancelled { phase: RunState::Connecting }),
				result = tokio::time::timeout_at(deadline, self.connect_once()) => result,
			};

			let err = match result {
				Ok(Ok(session)) => {
					self.report_connected(&session, attempt);
					return Ok(session);
				}
				Ok(Err(err)) => err,
				Err(_) => break attempt_timed_out(),
			};

			info!(target = "vncboot", %addr, attempt, error = %err, "connect attempt failed");
			if Instant::now() + delay >= deadline {
				break err;
			}
			self.output.output(&format!(
				"Connection failed ({}), retrying in {}",
				describe(&err),
				duration::format(delay)
			));

			tokio::select! {
				biased;
				_ = cancel.cancelled() => return Err(Error::Cancelled { phase: RunState::Connecting }),
				_ = tokio::time::sleep(delay) => {}
			}
			delay = self.retry.next(delay);
			attempt += 1;
		};

		Err(Error::Connect {
			addr,
			timeout: self.timeout,
			last: Box::new(last),
		})
	}

	async fn connect_once(&self) -> Result<Session> {
		let stream = self.dialer.dial(&self.host, self.port).await.map_err(Error::Transport)?;
		let mut session = Session::dialed(self.host.clone(), self.port, stream);
		session.authenticate(&ClientConfig::new(&self.password, true)).await?;
		Ok(session)
	}

	fn report_connected(&self, session: &Session, attempt: u32) {
		let Some(desktop) = session.desktop() else {
			return;
		};
		info!(
			target = "vncboot",
			addr = %self.address(),
			attempt,
			desktop = %desktop.name,
			width = desktop.width,
			height = desktop.height,
			"connected"
		);
		self.output.output(&format!(
			"Connected to VNC desktop '{}' ({}x{})",
			desktop.name, desktop.width, desktop.height
		));
	}
}

fn attempt_timed_out() -> Error {
	Error::Transport(std::io::Error::from(std::io::ErrorKind::TimedOut).into())
}

/// Error text followed by every underlying cause.
fn describe(err: &Error) -> String {
	let mut text = err.to_string();
	let mut source = std::error::Error::source(err);
	while let Some(cause) = source {
		text.push_str(": ");
		text.push_str(&cause.to_string());
		source = cause.source();
	}
	text
}
