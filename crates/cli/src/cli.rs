use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Args, Parser, Subcommand};
use vncboot::RawConfig;

/// Help colours in cargo's style.
fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
}

#[derive(Parser, Debug)]
#[command(name = "vncboot")]
#[command(about = "Type boot commands into a remote console over VNC")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Connect to a VNC server and type boot command scripts
	Run(RunArgs),

	/// Parse a boot command and print the actions it performs
	Parse(ParseArgs),
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
	/// JSON config file; flags override its values
	#[arg(short, long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// VNC server host
	#[arg(long)]
	pub host: Option<String>,

	/// VNC server port
	#[arg(long)]
	pub port: Option<u16>,

	/// VNC password ("" for no authentication)
	#[arg(long, env = "VNCBOOT_PASSWORD", hide_env_values = true)]
	pub password: Option<String>,

	/// Budget for connecting, retries included (e.g. 5m)
	#[arg(long, value_name = "DURATION")]
	pub timeout: Option<String>,

	/// Pause before the first script (e.g. 30s)
	#[arg(long, value_name = "DURATION")]
	pub boot_wait: Option<String>,

	/// Pause after each key event (e.g. 100ms)
	#[arg(long, value_name = "DURATION")]
	pub key_interval: Option<String>,

	/// Inline script; repeat for several scripts
	#[arg(long, value_name = "LINE", conflicts_with_all = ["script", "scripts"])]
	pub inline: Vec<String>,

	/// Script file
	#[arg(long, value_name = "FILE", conflicts_with = "scripts")]
	pub script: Option<PathBuf>,

	/// Script files, run in order
	#[arg(long, value_name = "FILE", num_args = 1..)]
	pub scripts: Vec<PathBuf>,
}

impl RunArgs {
	/// Flags as a partial config, to merge over the config file.
	pub fn overrides(&self) -> RawConfig {
		RawConfig {
			host: self.host.clone(),
			port: self.port,
			password: self.password.clone(),
			timeout: self.timeout.clone(),
			boot_wait: self.boot_wait.clone(),
			key_interval: self.key_interval.clone(),
			inline: (!self.inline.is_empty()).then(|| self.inline.clone()),
			script: self.script.clone(),
			scripts: (!self.scripts.is_empty()).then(|| self.scripts.clone()),
		}
	}
}

#[derive(Args, Debug)]
pub struct ParseArgs {
	/// Boot command text
	#[arg(required_unless_present = "file", conflicts_with = "file")]
	pub text: Option<String>,

	/// Read the boot command from a file
	#[arg(short, long, value_name = "FILE")]
	pub file: Option<PathBuf>,
}
