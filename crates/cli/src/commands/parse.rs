use anyhow::{Context, Result};

use crate::cli::ParseArgs;

/// Prints one action per line, or fails on a malformed boot command.
pub async fn execute(args: ParseArgs) -> Result<()> {
	let text = match (&args.text, &args.file) {
		(_, Some(path)) => tokio::fs::read_to_string(path)
			.await
			.with_context(|| format!("failed to read {}", path.display()))?,
		(Some(text), None) => text.clone(),
		(None, None) => String::new(),
	};

	let actions = vncboot::bootcommand::parse(&text)?;
	for action in &actions {
		println!("{action}");
	}
	Ok(())
}
