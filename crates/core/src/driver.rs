//! Key-event drivers: abstract key actions in, RFB KeyEvents out.

use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;
use vncboot_protocol::{KeyEvent, keysym};

use crate::bootcommand::{Action, Key};
use crate::error::Result;
use crate::session::Session;

/// Characters that need shift held on a US keyboard.
const SHIFTED: &str = "~!@#$%^&*()_+{}|:\"<>?";

/// Pause after each key event unless configured otherwise.
pub const DEFAULT_KEY_INTERVAL: Duration = Duration::from_millis(100);

/// Something that can press keys and wait.
#[async_trait]
pub trait KeyDriver: Send {
	/// Puts `key` down and leaves it down.
	async fn press_key(&mut self, key: Key) -> Result<()>;

	/// Lets `key` back up.
	async fn release_key(&mut self, key: Key) -> Result<()>;

	/// Types one character, adding shift where the character needs it.
	async fn type_rune(&mut self, ch: char) -> Result<()>;

	/// Pauses without sending anything.
	async fn wait(&mut self, duration: Duration) -> Result<()>;
}

/// Runs one parsed action against `driver`.
pub async fn perform(driver: &mut dyn KeyDriver, action: Action) -> Result<()> {
	match action {
		Action::Press(key) => driver.press_key(key).await,
		Action::Release(key) => driver.release_key(key).await,
		Action::Type(ch) => driver.type_rune(ch).await,
		Action::Wait(duration) => driver.wait(duration).await,
	}
}

/// Returns true if typing `ch` needs the shift key.
pub fn needs_shift(ch: char) -> bool {
	ch.is_uppercase() || SHIFTED.contains(ch)
}

fn key_needs_shift(key: Key) -> bool {
	matches!(key, Key::Char(ch) if needs_shift(ch))
}

/// Drives an authenticated [`Session`].
///
/// Keys put down with [`KeyDriver::press_key`] are tracked until released.
/// While either shift key is held, shifted characters are sent without an
/// extra shift press of their own.
#[derive(Debug)]
pub struct VncDriver<'a> {
	session: &'a mut Session,
	interval: Duration,
	sent: usize,
	held: Vec<u32>,
	/// Held character whose press also put shift down.
	implied_shift: Option<u32>,
}

impl<'a> VncDriver<'a> {
	pub fn new(session: &'a mut Session, interval: Duration) -> Self {
		Self {
			session,
			interval,
			sent: 0,
			held: Vec::new(),
			implied_shift: None,
		}
	}

	/// Number of KeyEvents sent so far.
	pub fn events_sent(&self) -> usize {
		self.sent
	}

	fn shift_held(&self) -> bool {
		self.held.iter().any(|&sym| sym == keysym::SHIFT_L || sym == keysym::SHIFT_R)
	}

	fn forget(&mut self, sym: u32) {
		if let Some(index) = self.held.iter().position(|&held| held == sym) {
			self.held.remove(index);
		}
	}

	async fn send(&mut self, keysym: u32, down: bool) -> Result<()> {
		trace!(target = "vncboot", keysym = format_args!("{keysym:#06x}"), down, "key event");
		self.session.key_event(KeyEvent { keysym, down }).await?;
		self.sent += 1;
		if !self.interval.is_zero() {
			tokio::time::sleep(self.interval).await;
		}
		Ok(())
	}
}

#[async_trait]
impl KeyDriver for VncDriver<'_> {
	async fn press_key(&mut self, key: Key) -> Result<()> {
		let sym = key.keysym();
		if key_needs_shift(key) && !self.shift_held() {
			self.send(keysym::SHIFT_L, true).await?;
			self.held.push(keysym::SHIFT_L);
			self.implied_shift = Some(sym);
		}
		self.send(sym, true).await?;
		self.held.push(sym);
		Ok(())
	}

	async fn release_key(&mut self, key: Key) -> Result<()> {
		let sym = key.keysym();
		self.send(sym, false).await?;
		self.forget(sym);
		if self.implied_shift == Some(sym) {
			self.implied_shift = None;
			self.send(keysym::SHIFT_L, false).await?;
			self.forget(keysym::SHIFT_L);
		}
		Ok(())
	}

	async fn type_rune(&mut self, ch: char) -> Result<()> {
		let sym = keysym::from_char(ch);
		let shift = needs_shift(ch) && !self.shift_held();

		if shift {
			self.send(keysym::SHIFT_L, true).await?;
		}
		self.send(sym, true).await?;
		self.send(sym, false).await?;
		if shift {
			self.send(keysym::SHIFT_L, false).await?;
		}
		Ok(())
	}

	async fn wait(&mut self, duration: Duration) -> Result<()> {
		tokio::time::sleep(duration).await;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use tokio::time::Instant;
	use vncboot_runtime::ClientConfig;
	use vncboot_runtime::testing::FakeServer;

	use tokio_util::sync::CancellationToken;

	use super::*;
	use crate::bootcommand::SpecialKey;
	use crate::interpreter::{Interpreter, Outcome};

	#[test]
	fn test_needs_shift() {
		assert!(needs_shift('A'));
		assert!(needs_shift('?'));
		assert!(needs_shift('"'));
		assert!(!needs_shift('a'));
		assert!(!needs_shift('/'));
		assert!(!needs_shift('1'));
	}

	#[tokio::test(start_paused = true)]
	async fn test_type_wraps_shifted_characters() {
		let (stream, server) = FakeServer::new().spawn();
		let mut session = Session::dialed("vnc.test", 5900, Box::new(stream));
		session.authenticate(&ClientConfig::default()).await.unwrap();

		let mut driver = VncDriver::new(&mut session, DEFAULT_KEY_INTERVAL);
		driver.type_rune('a').await.unwrap();
		driver.type_rune('A').await.unwrap();
		driver.type_rune('!').await.unwrap();
		assert_eq!(driver.events_sent(), 10);
		session.close().await.unwrap();

		let shift = keysym::SHIFT_L;
		assert_eq!(
			server.join().await.events,
			vec![
				KeyEvent::press(0x61),
				KeyEvent::release(0x61),
				KeyEvent::press(shift),
				KeyEvent::press(0x41),
				KeyEvent::release(0x41),
				KeyEvent::release(shift),
				KeyEvent::press(shift),
				KeyEvent::press(0x21),
				KeyEvent::release(0x21),
				KeyEvent::release(shift),
			]
		);
	}

	async fn ready_session(server: FakeServer) -> (Session, vncboot_runtime::testing::FakeServerHandle) {
		let (stream, handle) = server.spawn();
		let mut session = Session::dialed("vnc.test", 5900, Box::new(stream));
		session.authenticate(&ClientConfig::default()).await.unwrap();
		(session, handle)
	}

	#[tokio::test(start_paused = true)]
	async fn test_held_shift_is_not_released_by_typing() {
		let (mut session, server) = ready_session(FakeServer::new()).await;

		let mut driver = VncDriver::new(&mut session, DEFAULT_KEY_INTERVAL);
		let outcome = Interpreter::new()
			.execute(&CancellationToken::new(), "<leftShiftOn>Ab<leftShiftOff>", &mut driver)
			.await
			.unwrap();
		assert_eq!(outcome, Outcome::Completed { actions: 4 });
		session.close().await.unwrap();

		let shift = keysym::SHIFT_L;
		assert_eq!(
			server.join().await.events,
			vec![
				KeyEvent::press(shift),
				KeyEvent::press(0x41),
				KeyEvent::release(0x41),
				KeyEvent::press(0x62),
				KeyEvent::release(0x62),
				KeyEvent::release(shift),
			]
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_right_shift_also_suppresses_wrap() {
		let (mut session, server) = ready_session(FakeServer::new()).await;

		let mut driver = VncDriver::new(&mut session, Duration::ZERO);
		driver.press_key(Key::Special(SpecialKey::RightShift)).await.unwrap();
		driver.type_rune('?').await.unwrap();
		driver.release_key(Key::Special(SpecialKey::RightShift)).await.unwrap();
		driver.type_rune('?').await.unwrap();
		session.close().await.unwrap();

		assert_eq!(
			server.join().await.events,
			vec![
				KeyEvent::press(keysym::SHIFT_R),
				KeyEvent::press(0x3f),
				KeyEvent::release(0x3f),
				KeyEvent::release(keysym::SHIFT_R),
				KeyEvent::press(keysym::SHIFT_L),
				KeyEvent::press(0x3f),
				KeyEvent::release(0x3f),
				KeyEvent::release(keysym::SHIFT_L),
			]
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_held_shifted_character_holds_shift() {
		let (mut session, server) = ready_session(FakeServer::new()).await;

		let mut driver = VncDriver::new(&mut session, Duration::ZERO);
		Interpreter::new()
			.execute(&CancellationToken::new(), "<AOn><AOff>a", &mut driver)
			.await
			.unwrap();
		session.close().await.unwrap();

		let shift = keysym::SHIFT_L;
		assert_eq!(
			server.join().await.events,
			vec![
				KeyEvent::press(shift),
				KeyEvent::press(0x41),
				KeyEvent::release(0x41),
				KeyEvent::release(shift),
				KeyEvent::press(0x61),
				KeyEvent::release(0x61),
			]
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_key_interval_paces_events() {
		let (stream, _server) = FakeServer::new().spawn();
		let mut session = Session::dialed("vnc.test", 5900, Box::new(stream));
		session.authenticate(&ClientConfig::default()).await.unwrap();

		let start = Instant::now();
		let mut driver = VncDriver::new(&mut session, Duration::from_millis(250));
		driver.press_key(Key::Special(SpecialKey::Enter)).await.unwrap();
		driver.release_key(Key::Special(SpecialKey::Enter)).await.unwrap();
		assert!(start.elapsed() >= Duration::from_millis(500));
	}

	#[tokio::test(start_paused = true)]
	async fn test_wait_sends_nothing() {
		let (stream, server) = FakeServer::new().spawn();
		let mut session = Session::dialed("vnc.test", 5900, Box::new(stream));
		session.authenticate(&ClientConfig::default()).await.unwrap();

		let start = Instant::now();
		let mut driver = VncDriver::new(&mut session, DEFAULT_KEY_INTERVAL);
		driver.wait(Duration::from_secs(30)).await.unwrap();
		assert!(start.elapsed() >= Duration::from_secs(30));
		assert_eq!(driver.events_sent(), 0);

		session.close().await.unwrap();
		assert!(server.join().await.events.is_empty());
	}

	#[tokio::test]
	async fn test_closed_session_fails_as_transport() {
		let (stream, _server) = FakeServer::new().spawn();
		let mut session = Session::dialed("vnc.test", 5900, Box::new(stream));
		session.authenticate(&ClientConfig::default()).await.unwrap();
		session.closer().close();

		let mut driver = VncDriver::new(&mut session, Duration::ZERO);
		let err = driver.type_rune('x').await.unwrap_err();
		assert!(matches!(err, crate::Error::Transport(_)));
	}
}
