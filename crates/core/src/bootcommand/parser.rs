use std::time::Duration;

use thiserror::Error;

use super::{Action, Key, SpecialKey};
use crate::duration::{self, DurationError};

/// A boot command that cannot be executed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed boot command at character {offset}: {kind}")]
pub struct ParseError {
	/// Character index (not byte index) of the offending token.
	pub offset: usize,
	pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
	#[error("bad wait token: {0}")]
	InvalidWait(DurationError),

	#[error("{0} released but never held")]
	UnmatchedOff(Key),

	#[error("{0} held twice")]
	AlreadyHeld(Key),

	#[error("{0} still held at end of script")]
	StillHeld(Key),

	#[error("control character {0:?} cannot be typed")]
	ControlCharacter(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
	Literal(char),
	Special(SpecialKey),
	Toggle(Key, bool),
	Wait(Duration),
}

/// Parses a boot-command script into the ordered actions it performs.
///
/// The whole script is validated before anything is returned: unmatched
/// `On`/`Off` toggles and bad `wait` durations fail the parse.
pub fn parse(script: &str) -> Result<Vec<Action>, ParseError> {
	let tokens = tokenize(script)?;
	validate_toggles(&tokens)?;

	let mut actions = Vec::with_capacity(tokens.len());
	for (_, token) in tokens {
		match token {
			Token::Literal(ch) => actions.push(Action::Type(ch)),
			Token::Special(key) => {
				actions.push(Action::Press(Key::Special(key)));
				actions.push(Action::Release(Key::Special(key)));
			}
			Token::Toggle(key, true) => actions.push(Action::Press(key)),
			Token::Toggle(key, false) => actions.push(Action::Release(key)),
			Token::Wait(duration) => actions.push(Action::Wait(duration)),
		}
	}
	Ok(actions)
}

fn tokenize(script: &str) -> Result<Vec<(usize, Token)>, ParseError> {
	let chars: Vec<char> = script.chars().collect();
	let mut tokens = Vec::new();
	let mut i = 0;

	while i < chars.len() {
		let ch = chars[i];

		if let Some(close) = closing_delimiter(ch) {
			if let Some(len) = chars[i + 1..].iter().position(|&c| c == close) {
				let inner: String = chars[i + 1..i + 1 + len].iter().collect();
				let token = classify(&inner).map_err(|kind| ParseError { offset: i, kind })?;
				if let Some(token) = token {
					tokens.push((i, token));
					i += len + 2;
					continue;
				}
			}
		}

		check_typeable(ch).map_err(|kind| ParseError { offset: i, kind })?;
		tokens.push((i, Token::Literal(ch)));
		i += 1;
	}

	Ok(tokens)
}

fn closing_delimiter(ch: char) -> Option<char> {
	match ch {
		'<' => Some('>'),
		'[' => Some(']'),
		_ => None,
	}
}

/// Recognises the content between delimiters. `Ok(None)` means "not a token,
/// type it literally".
fn classify(inner: &str) -> Result<Option<Token>, ParseErrorKind> {
	let lower = inner.to_ascii_lowercase();

	if let Some(rest) = lower.strip_prefix("wait") {
		return parse_wait(rest).map(|d| Some(Token::Wait(d)));
	}

	if let Some(key) = SpecialKey::from_name(&lower) {
		return Ok(Some(Token::Special(key)));
	}

	for (suffix, on) in [("on", true), ("off", false)] {
		let Some(base) = lower.strip_suffix(suffix) else {
			continue;
		};
		if let Some(key) = SpecialKey::from_name(base) {
			return Ok(Some(Token::Toggle(Key::Special(key), on)));
		}

		// ASCII lowercasing preserves byte length, so the original-case base
		// is the same prefix of `inner`.
		let original = &inner[..base.len()];
		let mut chars = original.chars();
		if let (Some(ch), None) = (chars.next(), chars.next()) {
			check_typeable(ch)?;
			return Ok(Some(Token::Toggle(Key::Char(ch), on)));
		}
	}

	Ok(None)
}

fn parse_wait(rest: &str) -> Result<Duration, ParseErrorKind> {
	if rest.is_empty() {
		return Ok(Duration::from_secs(1));
	}
	if rest.bytes().all(|b| b.is_ascii_digit()) {
		return rest.parse::<u64>().map(Duration::from_secs).map_err(|_| {
			ParseErrorKind::InvalidWait(DurationError {
				input: rest.to_string(),
				reason: "number too large",
			})
		});
	}
	duration::parse(rest).map_err(ParseErrorKind::InvalidWait)
}

fn check_typeable(ch: char) -> Result<(), ParseErrorKind> {
	if ch.is_control() && !matches!(ch, '\n' | '\r' | '\t') {
		return Err(ParseErrorKind::ControlCharacter(ch));
	}
	Ok(())
}

fn validate_toggles(tokens: &[(usize, Token)]) -> Result<(), ParseError> {
	let mut held: Vec<(Key, usize)> = Vec::new();

	for &(offset, token) in tokens {
		let Token::Toggle(key, on) = token else {
			continue;
		};
		let position = held.iter().position(|(k, _)| *k == key);
		match (on, position) {
			(true, None) => held.push((key, offset)),
			(true, Some(_)) => {
				return Err(ParseError {
					offset,
					kind: ParseErrorKind::AlreadyHeld(key),
				});
			}
			(false, Some(index)) => {
				held.remove(index);
			}
			(false, None) => {
				return Err(ParseError {
					offset,
					kind: ParseErrorKind::UnmatchedOff(key),
				});
			}
		}
	}

	match held.first() {
		Some(&(key, offset)) => Err(ParseError {
			offset,
			kind: ParseErrorKind::StillHeld(key),
		}),
		None => Ok(()),
	}
}
