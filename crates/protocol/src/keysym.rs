//! X11 keysym values carried in KeyEvent messages.

pub const BACKSPACE: u32 = 0xff08;
pub const TAB: u32 = 0xff09;
pub const RETURN: u32 = 0xff0d;
pub const ESCAPE: u32 = 0xff1b;
pub const HOME: u32 = 0xff50;
pub const LEFT: u32 = 0xff51;
pub const UP: u32 = 0xff52;
pub const RIGHT: u32 = 0xff53;
pub const DOWN: u32 = 0xff54;
pub const PAGE_UP: u32 = 0xff55;
pub const PAGE_DOWN: u32 = 0xff56;
pub const END: u32 = 0xff57;
pub const INSERT: u32 = 0xff63;
pub const MENU: u32 = 0xff67;
pub const F1: u32 = 0xffbe;
pub const SHIFT_L: u32 = 0xffe1;
pub const SHIFT_R: u32 = 0xffe2;
pub const CONTROL_L: u32 = 0xffe3;
pub const CONTROL_R: u32 = 0xffe4;
pub const ALT_L: u32 = 0xffe9;
pub const ALT_R: u32 = 0xffea;
pub const SUPER_L: u32 = 0xffeb;
pub const SUPER_R: u32 = 0xffec;
pub const DELETE: u32 = 0xffff;
pub const SPACE: u32 = 0x0020;

/// Keysym for function key `F{n}`, `n` in `1..=12`.
pub fn function_key(n: u8) -> u32 {
	debug_assert!((1..=12).contains(&n));
	F1 + u32::from(n - 1)
}

/// Keysym for a character.
///
/// Latin-1 characters map to themselves, a few control characters to their
/// editing keys, and everything else to the Unicode keysym range.
pub fn from_char(ch: char) -> u32 {
	match ch {
		'\n' | '\r' => RETURN,
		'\t' => TAB,
		'\u{8}' => BACKSPACE,
		'\u{1b}' => ESCAPE,
		'\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => u32::from(ch),
		other => 0x0100_0000 | u32::from(other),
	}
}
