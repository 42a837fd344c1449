//! Executes boot-command scripts against a [`KeyDriver`].

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::bootcommand;
use crate::driver::{KeyDriver, perform};
use crate::error::Result;

/// How an execution ended when nothing went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	/// Every action ran.
	Completed { actions: usize },
	/// The token fired after `completed` actions; the rest were not sent.
	Cancelled { completed: usize },
}

impl Outcome {
	/// Actions that actually ran.
	pub fn actions(&self) -> usize {
		match *self {
			Outcome::Completed { actions } => actions,
			Outcome::Cancelled { completed } => completed,
		}
	}
}

/// Parses and runs boot commands in strict order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter;

impl Interpreter {
	pub fn new() -> Self {
		Self
	}

	/// Parses `script` in full, then runs each action against `driver`.
	///
	/// A parse error is returned before the driver sees a single call.
	/// Cancellation is checked before every action and raced against the one
	/// in flight.
	pub async fn execute(&self, cancel: &CancellationToken, script: &str, driver: &mut dyn KeyDriver) -> Result<Outcome> {
		let actions = bootcommand::parse(script)?;
		debug!(target = "vncboot", actions = actions.len(), "boot command parsed");

		for (completed, &action) in actions.iter().enumerate() {
			if cancel.is_cancelled() {
				return Ok(Outcome::Cancelled { completed });
			}
			trace!(target = "vncboot", %action, "running action");

			tokio::select! {
				biased;
				_ = cancel.cancelled() => return Ok(Outcome::Cancelled { completed }),
				result = perform(driver, action) => result?,
			}
		}

		Ok(Outcome::Completed { actions: actions.len() })
	}
}
