use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vncboot::{Provisioner, RawConfig, duration};

use crate::cli::RunArgs;
use crate::output::{TerminalOutput, print_success};

pub async fn execute(args: RunArgs) -> Result<()> {
	let file = match &args.config {
		Some(path) => RawConfig::load(path).await?,
		None => RawConfig::default(),
	};
	let config = file.merge(args.overrides()).validate()?;
	debug!(target = "vncboot", host = %config.host, port = config.port, "configuration loaded");

	// Missing script files fail here, before anything connects.
	let scripts = match &config.source {
		Some(source) => source.open_all().await?,
		None => Vec::new(),
	};

	let cancel = CancellationToken::new();
	let signal = cancel.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			info!(target = "vncboot", "received Ctrl+C, cancelling");
			signal.cancel();
		}
	});

	let provisioner = Provisioner::from_config(&config, Arc::new(TerminalOutput));
	let summary = provisioner
		.run(cancel, scripts)
		.await
		.with_context(|| format!("boot command run against {}:{} failed", config.host, config.port))?;

	print_success(&format!(
		"{} script(s), {} action(s) in {}",
		summary.scripts,
		summary.actions,
		duration::format(summary.elapsed)
	));
	Ok(())
}
