//! vncboot: type boot commands into a remote console over VNC.
//!
//! The engine connects to an RFB server, waits for the guest to boot, and
//! types one or more boot-command scripts, keeping key order and timing strict.
//!
//! # Components
//!
//! - [`ConnectionManager`]: dial and authenticate, retrying under a deadline
//! - [`Session`]: the authenticated connection, closable from another task
//! - [`bootcommand`]: the notation parser (`<enter>`, `<wait10>`, ...)
//! - [`Interpreter`]: runs parsed actions against a [`KeyDriver`]
//! - [`Provisioner`]: sequences connect, boot wait, and scripts
//!
//! # Example
//!
//! ```ignore
//! use tokio_util::sync::CancellationToken;
//! use vncboot::{Provisioner, RawConfig};
//!
//! let config = RawConfig::load("vncboot.json".as_ref()).await?.validate()?;
//! let scripts = match &config.source {
//!     Some(source) => source.open_all().await?,
//!     None => Vec::new(),
//! };
//! let summary = Provisioner::from_config(&config, std::sync::Arc::new(vncboot::NullOutput))
//!     .run(CancellationToken::new(), scripts)
//!     .await?;
//! ```

pub mod bootcommand;
pub mod config;
pub mod connect;
pub mod driver;
pub mod duration;
pub mod error;
pub mod interpreter;
pub mod output;
pub mod provisioner;
pub mod script;
pub mod session;
pub mod testing;

pub use bootcommand::{Action, Key, ParseError, SpecialKey};
pub use config::{ProvisionerConfig, RawConfig};
pub use connect::{ConnectionManager, Dialer, RetryPolicy, TcpDialer};
pub use driver::{KeyDriver, VncDriver};
pub use error::{Error, Result};
pub use interpreter::{Interpreter, Outcome};
pub use output::{NullOutput, Output, SharedOutput};
pub use provisioner::{Provisioner, RunState, RunSummary};
pub use script::{Script, ScriptSource};
pub use session::{Session, SessionCloser};
