use colored::Colorize;
use vncboot::Output;

/// Prints progress lines to stdout with a coloured prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalOutput;

impl Output for TerminalOutput {
	fn output(&self, message: &str) {
		println!("{} {message}", "==>".green().bold());
	}
}

/// Final status line after a run.
pub fn print_success(message: &str) {
	println!("{} {message}", "done".green().bold());
}
