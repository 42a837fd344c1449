mod cli;
mod commands;
mod logging;
mod output;

use clap::Parser;
use tracing::error;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::dispatch(cli).await {
		error!(target = "vncboot", error = %format!("{err:#}"), "command failed");
		std::process::exit(1);
	}
}
