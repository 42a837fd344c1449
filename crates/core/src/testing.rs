//! Test doubles for the engine's seams.
//!
//! - [`RecordingDriver`] stands in for a VNC session behind [`KeyDriver`]
//! - [`RecordingOutput`] captures progress lines
//! - [`FakeDialer`] hands out in-memory RFB servers, failing or hanging on
//!   request, so connect and run logic can be tested without sockets

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use vncboot_runtime::BoxedStream;
use vncboot_runtime::testing::{FakeServer, FakeServerHandle};

use crate::bootcommand::{Action, Key};
use crate::connect::Dialer;
use crate::driver::KeyDriver;
use crate::error::{Error, Result};
use crate::output::Output;

/// Records every call; waits really sleep, so cancellation can be tested
/// against them with a paused clock.
#[derive(Debug, Default)]
pub struct RecordingDriver {
	pub calls: Vec<Action>,
	fail_at: Option<usize>,
}

impl RecordingDriver {
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes call number `index` (zero-based) fail with a closed-transport
	/// error after being recorded.
	pub fn failing_at(mut self, index: usize) -> Self {
		self.fail_at = Some(index);
		self
	}

	fn record(&mut self, action: Action) -> Result<()> {
		let index = self.calls.len();
		self.calls.push(action);
		if self.fail_at == Some(index) {
			return Err(Error::Transport(vncboot_runtime::Error::Closed));
		}
		Ok(())
	}
}

#[async_trait]
impl KeyDriver for RecordingDriver {
	async fn press_key(&mut self, key: Key) -> Result<()> {
		self.record(Action::Press(key))
	}

	async fn release_key(&mut self, key: Key) -> Result<()> {
		self.record(Action::Release(key))
	}

	async fn type_rune(&mut self, ch: char) -> Result<()> {
		self.record(Action::Type(ch))
	}

	async fn wait(&mut self, duration: Duration) -> Result<()> {
		self.record(Action::Wait(duration))?;
		tokio::time::sleep(duration).await;
		Ok(())
	}
}

/// Collects output lines.
#[derive(Debug, Default)]
pub struct RecordingOutput {
	lines: Mutex<Vec<String>>,
}

impl RecordingOutput {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn lines(&self) -> Vec<String> {
		self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
	}

	/// Returns true if any line contains `needle`.
	pub fn contains(&self, needle: &str) -> bool {
		self.lines().iter().any(|line| line.contains(needle))
	}
}

impl Output for RecordingOutput {
	fn output(&self, message: &str) {
		if let Ok(mut lines) = self.lines.lock() {
			lines.push(message.to_string());
		}
	}
}

#[derive(Debug, Clone, Copy)]
enum DialMode {
	Serve,
	Refuse,
	Hang,
}

/// [`Dialer`] backed by [`FakeServer`]s.
///
/// Clones share state, so a test can keep one clone and inspect attempts and
/// servers after handing the other to a connection manager.
#[derive(Clone)]
pub struct FakeDialer {
	server: FakeServer,
	mode: DialMode,
	failures_left: Arc<AtomicUsize>,
	attempts: Arc<AtomicUsize>,
	servers: Arc<Mutex<Vec<FakeServerHandle>>>,
}

impl FakeDialer {
	/// Serves `server` on every dial.
	pub fn new(server: FakeServer) -> Self {
		Self {
			server,
			mode: DialMode::Serve,
			failures_left: Arc::new(AtomicUsize::new(0)),
			attempts: Arc::new(AtomicUsize::new(0)),
			servers: Arc::new(Mutex::new(Vec::new())),
		}
	}

	/// Every dial is refused.
	pub fn refusing() -> Self {
		Self {
			mode: DialMode::Refuse,
			..Self::new(FakeServer::new())
		}
	}

	/// Every dial hangs forever.
	pub fn hanging() -> Self {
		Self {
			mode: DialMode::Hang,
			..Self::new(FakeServer::new())
		}
	}

	/// Refuses the first `count` dials before serving.
	pub fn failing_first(self, count: usize) -> Self {
		self.failures_left.store(count, Ordering::SeqCst);
		self
	}

	/// Dials attempted so far.
	pub fn attempts(&self) -> usize {
		self.attempts.load(Ordering::SeqCst)
	}

	/// Takes the handles of every server spawned so far.
	pub fn take_servers(&self) -> Vec<FakeServerHandle> {
		self.servers.lock().map(|mut servers| std::mem::take(&mut *servers)).unwrap_or_default()
	}
}

fn refused(host: &str, port: u16) -> vncboot_runtime::Error {
	vncboot_runtime::Error::Dial {
		addr: format!("{host}:{port}"),
		source: std::io::ErrorKind::ConnectionRefused.into(),
	}
}

#[async_trait]
impl Dialer for FakeDialer {
	async fn dial(&self, host: &str, port: u16) -> vncboot_runtime::Result<BoxedStream> {
		self.attempts.fetch_add(1, Ordering::SeqCst);
		match self.mode {
			DialMode::Refuse => return Err(refused(host, port)),
			DialMode::Hang => std::future::pending::<()>().await,
			DialMode::Serve => {}
		}

		let failing = self
			.failures_left
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
			.is_ok();
		if failing {
			return Err(refused(host, port));
		}

		let (stream, handle) = self.server.clone().spawn();
		if let Ok(mut servers) = self.servers.lock() {
			servers.push(handle);
		}
		Ok(Box::new(stream))
	}
}
