//! Run configuration: the raw, partially filled form read from JSON or
//! flags, and the validated form the engine runs on.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::connect::DEFAULT_CONNECT_TIMEOUT;
use crate::driver::DEFAULT_KEY_INTERVAL;
use crate::duration;
use crate::error::{Error, Result};
use crate::script::ScriptSource;

/// Configuration as written by the user. Every field is optional here;
/// [`RawConfig::validate`] decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
	pub host: Option<String>,
	pub port: Option<u16>,
	pub password: Option<String>,
	/// Connect-and-retry budget, e.g. `"5m"`.
	pub timeout: Option<String>,
	/// Pause before the first script.
	pub boot_wait: Option<String>,
	/// Pause after each key event.
	pub key_interval: Option<String>,
	/// Inline scripts; a single string counts as one line.
	#[serde(default, deserialize_with = "one_or_many")]
	pub inline: Option<Vec<String>>,
	pub script: Option<PathBuf>,
	pub scripts: Option<Vec<PathBuf>>,
}

/// Validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerConfig {
	pub host: String,
	pub port: u16,
	/// Empty means no-credential authentication.
	pub password: String,
	pub timeout: Duration,
	pub boot_wait: Duration,
	pub key_interval: Duration,
	/// `None` when no scripts were configured.
	pub source: Option<ScriptSource>,
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum OneOrMany {
		One(String),
		Many(Vec<String>),
	}

	Ok(Option::<OneOrMany>::deserialize(deserializer)?.map(|value| match value {
		OneOrMany::One(line) => vec![line],
		OneOrMany::Many(lines) => lines,
	}))
}

impl RawConfig {
	/// Parses a JSON document.
	pub fn from_json(text: &str) -> Result<Self> {
		serde_json::from_str(text).map_err(|err| Error::Config(err.to_string()))
	}

	/// Reads and parses a JSON config file.
	pub async fn load(path: &Path) -> Result<Self> {
		let text = tokio::fs::read_to_string(path)
			.await
			.map_err(|err| Error::Config(format!("cannot read {}: {err}", path.display())))?;
		serde_json::from_str(&text).map_err(|err| Error::Config(format!("{}: {err}", path.display())))
	}

	/// Overlays `overrides` on top of `self`.
	///
	/// The script options are replaced as a group: setting any of them in
	/// `overrides` discards all three from `self`.
	pub fn merge(self, overrides: RawConfig) -> RawConfig {
		let scripts_overridden = overrides.inline.is_some() || overrides.script.is_some() || overrides.scripts.is_some();
		let (inline, script, scripts) = if scripts_overridden {
			(overrides.inline, overrides.script, overrides.scripts)
		} else {
			(self.inline, self.script, self.scripts)
		};

		RawConfig {
			host: overrides.host.or(self.host),
			port: overrides.port.or(self.port),
			password: overrides.password.or(self.password),
			timeout: overrides.timeout.or(self.timeout),
			boot_wait: overrides.boot_wait.or(self.boot_wait),
			key_interval: overrides.key_interval.or(self.key_interval),
			inline,
			script,
			scripts,
		}
	}

	/// Checks required fields and resolves defaults.
	///
	/// Unparseable durations fall back to their defaults with a warning.
	pub fn validate(self) -> Result<ProvisionerConfig> {
		let host = self
			.host
			.filter(|host| !host.trim().is_empty())
			.ok_or_else(|| Error::Config("host is required".into()))?;
		let port = match self.port {
			Some(0) => return Err(Error::Config("port must be between 1 and 65535".into())),
			Some(port) => port,
			None => return Err(Error::Config("port is required".into())),
		};
		let password = self
			.password
			.ok_or_else(|| Error::Config("password is required (use \"\" for none)".into()))?;

		let source = match (self.inline, self.script, self.scripts) {
			(None, None, None) => None,
			(Some(lines), None, None) => Some(ScriptSource::Inline(lines)),
			(None, Some(path), None) => Some(ScriptSource::File(path)),
			(None, None, Some(paths)) => Some(ScriptSource::Files(paths)),
			_ => {
				return Err(Error::Config(
					"only one of inline, script, and scripts may be specified".into(),
				));
			}
		};

		Ok(ProvisionerConfig {
			host,
			port,
			password,
			timeout: duration::parse_or("timeout", self.timeout.as_deref(), DEFAULT_CONNECT_TIMEOUT),
			boot_wait: duration::parse_or("boot_wait", self.boot_wait.as_deref(), Duration::ZERO),
			key_interval: duration::parse_or("key_interval", self.key_interval.as_deref(), DEFAULT_KEY_INTERVAL),
			source,
		})
	}
}
