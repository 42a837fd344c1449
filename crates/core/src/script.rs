//! Script sources and their resolution into readable scripts.

use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::error::{Error, Result};

/// Where a run's boot commands come from. Exactly one form per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
	/// Each line is one script.
	Inline(Vec<String>),
	/// A single file.
	File(PathBuf),
	/// Several files, run in order.
	Files(Vec<PathBuf>),
}

impl ScriptSource {
	/// Opens every script in order.
	///
	/// If any file fails to open, the ones already opened are dropped and
	/// the error is returned before anything connects.
	pub async fn open_all(&self) -> Result<Vec<Script>> {
		match self {
			ScriptSource::Inline(lines) => Ok(lines
				.iter()
				.enumerate()
				.map(|(i, line)| Script::inline(format!("inline[{}]", i + 1), line.clone()))
				.collect()),
			ScriptSource::File(path) => Ok(vec![Script::open(path.clone()).await?]),
			ScriptSource::Files(paths) => {
				let mut scripts = Vec::with_capacity(paths.len());
				for path in paths {
					scripts.push(Script::open(path.clone()).await?);
				}
				Ok(scripts)
			}
		}
	}
}

/// A named boot-command source, read once.
pub struct Script {
	name: String,
	reader: Box<dyn AsyncRead + Send + Unpin>,
}

impl Script {
	/// Wraps any reader.
	pub fn new(name: impl Into<String>, reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
		Self {
			name: name.into(),
			reader: Box::new(reader),
		}
	}

	/// Script held in memory.
	pub fn inline(name: impl Into<String>, text: impl Into<String>) -> Self {
		Self::new(name, Cursor::new(text.into().into_bytes()))
	}

	/// Opens a script file; the path doubles as its name.
	pub async fn open(path: PathBuf) -> Result<Self> {
		let file = tokio::fs::File::open(&path)
			.await
			.map_err(|source| Error::ScriptOpen { path: path.clone(), source })?;
		debug!(target = "vncboot", path = %path.display(), "script opened");
		Ok(Self::new(path.display().to_string(), file))
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Reads the whole script. Content must be UTF-8.
	pub async fn read_to_string(&mut self) -> Result<String> {
		let mut text = String::new();
		self.reader
			.read_to_string(&mut text)
			.await
			.map_err(|source| Error::ScriptRead {
				name: self.name.clone(),
				source,
			})?;
		Ok(text)
	}
}

impl fmt::Debug for Script {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Script").field("name", &self.name).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_inline_lines_become_scripts() {
		let source = ScriptSource::Inline(vec!["root<enter>".into(), "<wait>reboot<enter>".into()]);
		let mut scripts = source.open_all().await.unwrap();

		assert_eq!(scripts.len(), 2);
		assert_eq!(scripts[0].name(), "inline[1]");
		assert_eq!(scripts[1].read_to_string().await.unwrap(), "<wait>reboot<enter>");
	}

	#[tokio::test]
	async fn test_files_open_in_order() {
		let dir = tempfile::tempdir().unwrap();
		let first = dir.path().join("first.txt");
		let second = dir.path().join("second.txt");
		std::fs::write(&first, "one").unwrap();
		std::fs::write(&second, "two<enter>").unwrap();

		let mut scripts = ScriptSource::Files(vec![first.clone(), second]).open_all().await.unwrap();
		assert_eq!(scripts[0].name(), first.display().to_string());
		assert_eq!(scripts[0].read_to_string().await.unwrap(), "one");
		assert_eq!(scripts[1].read_to_string().await.unwrap(), "two<enter>");
	}

	#[tokio::test]
	async fn test_missing_file_aborts_resolution() {
		let dir = tempfile::tempdir().unwrap();
		let present = dir.path().join("present.txt");
		std::fs::write(&present, "ok").unwrap();
		let missing = dir.path().join("missing.txt");

		let err = ScriptSource::Files(vec![present, missing.clone()]).open_all().await.unwrap_err();
		match err {
			Error::ScriptOpen { path, source } => {
				assert_eq!(path, missing);
				assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
			}
			other => panic!("expected ScriptOpen, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_non_utf8_script_is_a_read_error() {
		let mut script = Script::new("binary", Cursor::new(vec![0xff, 0xfe, 0x00]));
		let err = script.read_to_string().await.unwrap_err();
		assert!(matches!(err, Error::ScriptRead { ref name, .. } if name == "binary"));
	}
}
