mod parse;
mod run;

use anyhow::Result;

use crate::cli::{Cli, Commands};

pub async fn dispatch(cli: Cli) -> Result<()> {
	match cli.command {
		Commands::Run(args) => run::execute(args).await,
		Commands::Parse(args) => parse::execute(args).await,
	}
}
