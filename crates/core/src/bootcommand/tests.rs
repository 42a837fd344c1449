use std::time::Duration;

use super::*;

fn typed(text: &str) -> Vec<Action> {
	text.chars().map(Action::Type).collect()
}

fn tap(key: SpecialKey) -> [Action; 2] {
	[Action::Press(Key::Special(key)), Action::Release(Key::Special(key))]
}

#[test]
fn test_text_then_bracketed_enter() {
	let actions = parse("hello[enter]").unwrap();

	let mut expected = typed("hello");
	expected.extend(tap(SpecialKey::Enter));
	assert_eq!(actions, expected);
}

#[test]
fn test_angle_brackets_and_case_insensitivity() {
	assert_eq!(parse("<ENTER>").unwrap(), tap(SpecialKey::Enter));
	assert_eq!(parse("<Esc><pageup>").unwrap(), [tap(SpecialKey::Escape), tap(SpecialKey::PageUp)].concat());
	assert_eq!(parse("<f1><F12>").unwrap(), [tap(SpecialKey::Function(1)), tap(SpecialKey::Function(12))].concat());
}

#[test]
fn test_waits() {
	assert_eq!(parse("<wait>").unwrap(), vec![Action::Wait(Duration::from_secs(1))]);
	assert_eq!(parse("<wait10>").unwrap(), vec![Action::Wait(Duration::from_secs(10))]);
	assert_eq!(parse("<wait1m30s>").unwrap(), vec![Action::Wait(Duration::from_secs(90))]);
	assert_eq!(parse("[wait500ms]").unwrap(), vec![Action::Wait(Duration::from_millis(500))]);
}

#[test]
fn test_modifier_combination() {
	let actions = parse("<leftCtrlOn><leftAltOn><del><leftAltOff><leftCtrlOff>").unwrap();
	assert_eq!(
		actions,
		vec![
			Action::Press(Key::Special(SpecialKey::LeftCtrl)),
			Action::Press(Key::Special(SpecialKey::LeftAlt)),
			Action::Press(Key::Special(SpecialKey::Delete)),
			Action::Release(Key::Special(SpecialKey::Delete)),
			Action::Release(Key::Special(SpecialKey::LeftAlt)),
			Action::Release(Key::Special(SpecialKey::LeftCtrl)),
		]
	);
}

#[test]
fn test_character_toggle_keeps_case() {
	let actions = parse("<leftCtrlOn><cOn><cOff><leftCtrlOff>").unwrap();
	assert_eq!(actions[1], Action::Press(Key::Char('c')));
	assert_eq!(actions[2], Action::Release(Key::Char('c')));

	let actions = parse("<XOn><XOff>").unwrap();
	assert_eq!(actions, vec![Action::Press(Key::Char('X')), Action::Release(Key::Char('X'))]);
}

#[test]
fn test_unknown_tokens_are_literal() {
	assert_eq!(parse("<foo>").unwrap(), typed("<foo>"));
	assert_eq!(parse("a < b").unwrap(), typed("a < b"));
	assert_eq!(parse("[x]").unwrap(), typed("[x]"));
	// Mismatched delimiters do not form a token.
	assert_eq!(parse("<enter]").unwrap(), typed("<enter]"));
}

#[test]
fn test_literal_before_nested_token() {
	let mut expected = typed("<");
	expected.extend(tap(SpecialKey::Enter));
	assert_eq!(parse("<<enter>").unwrap(), expected);
}

#[test]
fn test_realistic_installer_line() {
	let actions = parse("<esc><wait>linux ks=http://10.0.0.1/ks.cfg<enter>").unwrap();
	assert_eq!(actions.len(), 2 + 1 + "linux ks=http://10.0.0.1/ks.cfg".len() + 2);
	assert_eq!(actions[2], Action::Wait(Duration::from_secs(1)));
	assert_eq!(actions[3], Action::Type('l'));
}

#[test]
fn test_parse_is_deterministic() {
	let script = "root<tab>pa55<leftShiftOn>w<leftShiftOff><enter><wait2s>";
	assert_eq!(parse(script).unwrap(), parse(script).unwrap());
}

#[test]
fn test_empty_script() {
	assert!(parse("").unwrap().is_empty());
}

#[test]
fn test_bad_wait_duration() {
	let err = parse("abc<wait5x>").unwrap_err();
	assert_eq!(err.offset, 3);
	assert!(matches!(err.kind, ParseErrorKind::InvalidWait(_)));
}

#[test]
fn test_unbalanced_toggles() {
	let err = parse("<leftShiftOn>abc").unwrap_err();
	assert_eq!(err.offset, 0);
	assert_eq!(err.kind, ParseErrorKind::StillHeld(Key::Special(SpecialKey::LeftShift)));

	let err = parse("abc<leftShiftOff>").unwrap_err();
	assert_eq!(err.offset, 3);
	assert_eq!(err.kind, ParseErrorKind::UnmatchedOff(Key::Special(SpecialKey::LeftShift)));

	let err = parse("<aOn><aOn><aOff>").unwrap_err();
	assert_eq!(err.offset, 5);
	assert_eq!(err.kind, ParseErrorKind::AlreadyHeld(Key::Char('a')));
}

#[test]
fn test_control_characters_rejected() {
	let err = parse("ok\u{7}").unwrap_err();
	assert_eq!(err.offset, 2);
	assert_eq!(err.kind, ParseErrorKind::ControlCharacter('\u{7}'));

	// Newlines and tabs are ordinary keys.
	assert_eq!(parse("a\tb\n").unwrap(), typed("a\tb\n"));
}

#[test]
fn test_offsets_count_characters() {
	let err = parse("éé<wait?>").unwrap_err();
	assert_eq!(err.offset, 2);
	assert!(err.to_string().contains("character 2"));
}

#[test]
fn test_action_display() {
	assert_eq!(Action::Type('a').to_string(), "type 'a'");
	assert_eq!(Action::Press(Key::Special(SpecialKey::LeftShift)).to_string(), "press leftShift");
	assert_eq!(Action::Release(Key::Special(SpecialKey::Function(5))).to_string(), "release f5");
	assert_eq!(Action::Wait(Duration::from_secs(90)).to_string(), "wait 1m30s");
}

#[test]
fn test_special_key_keysyms() {
	assert_eq!(SpecialKey::Enter.keysym(), 0xff0d);
	assert_eq!(SpecialKey::Return.keysym(), 0xff0d);
	assert_eq!(SpecialKey::Function(10).keysym(), 0xffc7);
	assert_eq!(SpecialKey::Spacebar.keysym(), 0x20);
	assert_eq!(Key::Char('a').keysym(), 0x61);
	assert_eq!(SpecialKey::from_name("f13"), None);
	assert_eq!(SpecialKey::from_name("f0"), None);
}

#[test]
fn test_function_key_number_must_be_plain_digits() {
	assert_eq!(SpecialKey::from_name("F12"), Some(SpecialKey::Function(12)));
	assert_eq!(SpecialKey::from_name("f+1"), None);
	assert_eq!(SpecialKey::from_name("f01"), None);
	assert_eq!(SpecialKey::from_name("f"), None);
	assert_eq!(parse("<f+1>").unwrap(), typed("<f+1>"));
	assert_eq!(parse("[f+1On]").unwrap(), typed("[f+1On]"));
}
