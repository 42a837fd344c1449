//! Script orchestrator: connect, wait for boot, run every script.
//!
//! ```text
//! Idle ─▶ Connecting ─▶ BootWaiting ─▶ Executing(0) ─▶ … ─▶ Done
//!              │              │               │
//!              └──────────────┴───────────────┴──────────▶ Failed
//! ```
//!
//! Only connecting is retried; any later failure ends the run. While scripts
//! run, a watcher task holds a [`SessionCloser`] and closes the session as
//! soon as the run's cancellation token fires.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ProvisionerConfig;
use crate::connect::{ConnectionManager, Dialer, TcpDialer};
use crate::driver::{DEFAULT_KEY_INTERVAL, VncDriver};
use crate::duration;
use crate::error::{Error, Result};
use crate::interpreter::{Interpreter, Outcome};
use crate::output::{NullOutput, SharedOutput};
use crate::script::Script;
use crate::session::{Session, SessionCloser};

/// Where a run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
	Idle,
	Connecting,
	BootWaiting,
	/// Running the script at this zero-based index.
	Executing(usize),
	Done,
	Failed,
}

impl fmt::Display for RunState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RunState::Idle => f.write_str("idle"),
			RunState::Connecting => f.write_str("connecting"),
			RunState::BootWaiting => f.write_str("waiting for boot"),
			RunState::Executing(index) => write!(f, "executing script {}", index + 1),
			RunState::Done => f.write_str("done"),
			RunState::Failed => f.write_str("failed"),
		}
	}
}

/// What a successful run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
	pub scripts: usize,
	pub actions: usize,
	pub elapsed: Duration,
}

/// Runs scripts against one VNC server.
pub struct Provisioner<D = TcpDialer> {
	manager: ConnectionManager<D>,
	interpreter: Interpreter,
	boot_wait: Duration,
	key_interval: Duration,
	output: SharedOutput,
}

impl Provisioner<TcpDialer> {
	/// Builds a TCP provisioner from validated configuration.
	pub fn from_config(config: &ProvisionerConfig, output: SharedOutput) -> Self {
		let manager = ConnectionManager::new(config.host.clone(), config.port, config.password.clone())
			.with_timeout(config.timeout);
		Provisioner::new(manager)
			.with_boot_wait(config.boot_wait)
			.with_key_interval(config.key_interval)
			.with_output(output)
	}
}

impl<D: Dialer> Provisioner<D> {
	pub fn new(manager: ConnectionManager<D>) -> Self {
		Self {
			manager,
			interpreter: Interpreter::new(),
			boot_wait: Duration::ZERO,
			key_interval: DEFAULT_KEY_INTERVAL,
			output: Arc::new(NullOutput),
		}
	}

	pub fn with_boot_wait(mut self, boot_wait: Duration) -> Self {
		self.boot_wait = boot_wait;
		self
	}

	pub fn with_key_interval(mut self, key_interval: Duration) -> Self {
		self.key_interval = key_interval;
		self
	}

	/// Sends progress lines to `output`, including the connection manager's.
	pub fn with_output(mut self, output: SharedOutput) -> Self {
		self.manager = self.manager.with_output(Arc::clone(&output));
		self.output = output;
		self
	}

	/// Connects, waits out the boot delay, and runs `scripts` in order.
	///
	/// The session is closed before returning on every path that opened one.
	/// Cancellation at any point yields [`Error::Cancelled`].
	pub async fn run(&self, cancel: CancellationToken, scripts: Vec<Script>) -> Result<RunSummary> {
		let started = Instant::now();
		let mut state = RunState::Idle;

		transition(&mut state, RunState::Connecting);
		let mut session = match self.manager.connect(&cancel).await {
			Ok(session) => session,
			Err(err) => {
				transition(&mut state, RunState::Failed);
				return Err(err);
			}
		};

		let done = CancellationToken::new();
		let watcher = spawn_watcher(cancel.clone(), done.clone(), session.closer());

		let result = self.drive(&cancel, &mut session, scripts, &mut state).await;

		done.cancel();
		if let Err(err) = watcher.await {
			warn!(target = "vncboot", error = %err, "session watcher panicked");
		}
		let closed = session.close().await;

		let result = match (result, closed) {
			(Ok((scripts, actions)), Ok(())) => Ok(RunSummary {
				scripts,
				actions,
				elapsed: started.elapsed(),
			}),
			(Ok(_), Err(err)) => Err(err),
			(Err(err), closed) => {
				if let Err(close_err) = closed {
					debug!(target = "vncboot", error = %close_err, "close after failure also failed");
				}
				Err(err)
			}
		};

		match &result {
			Ok(summary) => {
				transition(&mut state, RunState::Done);
				info!(
					target = "vncboot",
					scripts = summary.scripts,
					actions = summary.actions,
					elapsed = %duration::format(summary.elapsed),
					"run complete"
				);
			}
			Err(_) => transition(&mut state, RunState::Failed),
		}
		result
	}

	/// Boot wait plus every script. Returns scripts run and actions sent.
	async fn drive(
		&self,
		cancel: &CancellationToken,
		session: &mut Session,
		scripts: Vec<Script>,
		state: &mut RunState,
	) -> Result<(usize, usize)> {
		transition(state, RunState::BootWaiting);
		if !self.boot_wait.is_zero() {
			self.output
				.output(&format!("Waiting {} for boot", duration::format(self.boot_wait)));
			tokio::select! {
				biased;
				_ = cancel.cancelled() => return Err(Error::Cancelled { phase: RunState::BootWaiting }),
				_ = tokio::time::sleep(self.boot_wait) => {}
			}
		}

		let total = scripts.len();
		let mut actions = 0;
		for (index, mut script) in scripts.into_iter().enumerate() {
			let phase = RunState::Executing(index);
			if cancel.is_cancelled() {
				return Err(Error::Cancelled { phase });
			}
			transition(state, phase);
			self.output.output(&format!(
				"Typing boot command script {}/{total}: {}",
				index + 1,
				script.name()
			));

			let outcome = match self.run_script(cancel, session, &mut script).await {
				Ok(outcome) => outcome,
				Err(_) if cancel.is_cancelled() => return Err(Error::Cancelled { phase }),
				Err(source) => {
					return Err(Error::Script {
						index,
						total,
						name: script.name().to_string(),
						source: Box::new(source),
					});
				}
			};

			match outcome {
				Outcome::Completed { actions: count } => actions += count,
				Outcome::Cancelled { .. } => return Err(Error::Cancelled { phase }),
			}
		}

		Ok((total, actions))
	}

	async fn run_script(&self, cancel: &CancellationToken, session: &mut Session, script: &mut Script) -> Result<Outcome> {
		let text = script.read_to_string().await?;
		let mut driver = VncDriver::new(session, self.key_interval);
		self.interpreter.execute(cancel, &text, &mut driver).await
	}
}

fn transition(state: &mut RunState, next: RunState) {
	debug!(target = "vncboot", from = %state, to = %next, "run state");
	*state = next;
}

/// Closes the session when `cancel` fires; exits quietly once `done` fires.
fn spawn_watcher(cancel: CancellationToken, done: CancellationToken, closer: SessionCloser) -> JoinHandle<()> {
	tokio::spawn(async move {
		tokio::select! {
			biased;
			_ = done.cancelled() => {}
			_ = cancel.cancelled() => {
				debug!(target = "vncboot", "cancellation requested, closing session");
				closer.close();
			}
		}
	})
}

#[cfg(test)]
mod tests;
