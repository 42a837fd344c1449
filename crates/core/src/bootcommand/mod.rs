//! Boot-command notation: literal text, special keys, and waits.
//!
//! A script such as `linux ks=http://10.0.0.1/ks.cfg<enter><wait10>` parses
//! into an ordered list of [`Action`]s. Parsing is pure and happens before any
//! key is sent, so a malformed script never produces partial typing.
//!
//! # Notation
//!
//! - plain characters are typed one by one
//! - `<enter>`, `<f5>`, `<leftCtrl>`: press and release a special key
//! - `<leftShiftOn>` / `<leftShiftOff>`: hold / release a special key
//! - `<aOn>` / `<aOff>`: hold / release a single character key
//! - `<wait>`, `<wait10>`, `<wait1m30s>`: pause 1s, 10s, or a duration
//!
//! Tokens may use `<...>` or `[...]`; names are case-insensitive. Anything
//! between delimiters that is not a known token is typed literally.

use std::fmt;
use std::time::Duration;

use vncboot_protocol::keysym;

mod parser;

pub use parser::{ParseError, ParseErrorKind, parse};

/// Named non-character keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
	Backspace,
	Delete,
	Enter,
	Return,
	Escape,
	Tab,
	Spacebar,
	Insert,
	Home,
	End,
	PageUp,
	PageDown,
	Up,
	Down,
	Left,
	Right,
	Menu,
	/// `F1` through `F12`.
	Function(u8),
	LeftAlt,
	LeftCtrl,
	LeftShift,
	LeftSuper,
	RightAlt,
	RightCtrl,
	RightShift,
	RightSuper,
}

const NAMED_KEYS: &[(&str, SpecialKey)] = &[
	("bs", SpecialKey::Backspace),
	("del", SpecialKey::Delete),
	("enter", SpecialKey::Enter),
	("return", SpecialKey::Return),
	("esc", SpecialKey::Escape),
	("tab", SpecialKey::Tab),
	("spacebar", SpecialKey::Spacebar),
	("insert", SpecialKey::Insert),
	("home", SpecialKey::Home),
	("end", SpecialKey::End),
	("pageUp", SpecialKey::PageUp),
	("pageDown", SpecialKey::PageDown),
	("up", SpecialKey::Up),
	("down", SpecialKey::Down),
	("left", SpecialKey::Left),
	("right", SpecialKey::Right),
	("menu", SpecialKey::Menu),
	("leftAlt", SpecialKey::LeftAlt),
	("leftCtrl", SpecialKey::LeftCtrl),
	("leftShift", SpecialKey::LeftShift),
	("leftSuper", SpecialKey::LeftSuper),
	("rightAlt", SpecialKey::RightAlt),
	("rightCtrl", SpecialKey::RightCtrl),
	("rightShift", SpecialKey::RightShift),
	("rightSuper", SpecialKey::RightSuper),
];

impl SpecialKey {
	/// Looks a key up by its notation name, ignoring case.
	pub fn from_name(name: &str) -> Option<Self> {
		if let Some(number) = name.strip_prefix(|c: char| c.eq_ignore_ascii_case(&'f')) {
			let digits = !number.is_empty() && !number.starts_with('0') && number.bytes().all(|b| b.is_ascii_digit());
			if let (true, Ok(n @ 1..=12)) = (digits, number.parse::<u8>()) {
				return Some(Self::Function(n));
			}
		}
		NAMED_KEYS
			.iter()
			.find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
			.map(|(_, key)| *key)
	}

	/// X11 keysym sent for this key.
	pub fn keysym(self) -> u32 {
		match self {
			Self::Backspace => keysym::BACKSPACE,
			Self::Delete => keysym::DELETE,
			Self::Enter | Self::Return => keysym::RETURN,
			Self::Escape => keysym::ESCAPE,
			Self::Tab => keysym::TAB,
			Self::Spacebar => keysym::SPACE,
			Self::Insert => keysym::INSERT,
			Self::Home => keysym::HOME,
			Self::End => keysym::END,
			Self::PageUp => keysym::PAGE_UP,
			Self::PageDown => keysym::PAGE_DOWN,
			Self::Up => keysym::UP,
			Self::Down => keysym::DOWN,
			Self::Left => keysym::LEFT,
			Self::Right => keysym::RIGHT,
			Self::Menu => keysym::MENU,
			Self::Function(n) => keysym::function_key(n),
			Self::LeftAlt => keysym::ALT_L,
			Self::LeftCtrl => keysym::CONTROL_L,
			Self::LeftShift => keysym::SHIFT_L,
			Self::LeftSuper => keysym::SUPER_L,
			Self::RightAlt => keysym::ALT_R,
			Self::RightCtrl => keysym::CONTROL_R,
			Self::RightShift => keysym::SHIFT_R,
			Self::RightSuper => keysym::SUPER_R,
		}
	}
}

impl fmt::Display for SpecialKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if let Self::Function(n) = self {
			return write!(f, "f{n}");
		}
		let name = NAMED_KEYS
			.iter()
			.find(|(_, key)| key == self)
			.map(|(name, _)| *name)
			.unwrap_or("?");
		f.write_str(name)
	}
}

/// A key that can be pressed or released on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
	Special(SpecialKey),
	Char(char),
}

impl Key {
	pub fn keysym(self) -> u32 {
		match self {
			Key::Special(key) => key.keysym(),
			Key::Char(ch) => keysym::from_char(ch),
		}
	}
}

impl fmt::Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Key::Special(key) => fmt::Display::fmt(key, f),
			Key::Char(ch) => write!(f, "{ch:?}"),
		}
	}
}

/// One step of a parsed boot command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
	/// Key goes down and stays down.
	Press(Key),
	/// Key comes back up.
	Release(Key),
	/// Type a single character (press and release, with shift if needed).
	Type(char),
	/// Pause before the next action.
	Wait(Duration),
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Action::Press(key) => write!(f, "press {key}"),
			Action::Release(key) => write!(f, "release {key}"),
			Action::Type(ch) => write!(f, "type {ch:?}"),
			Action::Wait(duration) => write!(f, "wait {}", crate::duration::format(*duration)),
		}
	}
}

#[cfg(test)]
mod tests;
