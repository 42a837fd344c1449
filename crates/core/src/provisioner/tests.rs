use vncboot_protocol::{KeyEvent, keysym};
use vncboot_runtime::testing::FakeServer;

use super::*;
use crate::bootcommand::ParseErrorKind;
use crate::testing::{FakeDialer, RecordingOutput};

fn provisioner(dialer: FakeDialer) -> Provisioner<FakeDialer> {
	let manager = ConnectionManager::new("vnc.test", 5900, "secret")
		.with_dialer(dialer)
		.with_timeout(Duration::from_secs(30));
	Provisioner::new(manager)
}

fn inline(lines: &[&str]) -> Vec<Script> {
	lines
		.iter()
		.enumerate()
		.map(|(i, line)| Script::inline(format!("inline[{}]", i + 1), *line))
		.collect()
}

fn tapped(sym: u32) -> [KeyEvent; 2] {
	[KeyEvent::press(sym), KeyEvent::release(sym)]
}

async fn server_events(dialer: &FakeDialer) -> Vec<KeyEvent> {
	let mut events = Vec::new();
	for server in dialer.take_servers() {
		events.extend(server.join().await.events);
	}
	events
}

#[tokio::test(start_paused = true)]
async fn test_runs_scripts_in_order() {
	let dialer = FakeDialer::new(FakeServer::new().with_password("secret"));
	let output = RecordingOutput::new();
	let provisioner = provisioner(dialer.clone()).with_output(output.clone());

	let summary = provisioner
		.run(CancellationToken::new(), inline(&["ab", "<enter>"]))
		.await
		.unwrap();

	assert_eq!(summary.scripts, 2);
	assert_eq!(summary.actions, 4);
	assert!(output.contains("Typing boot command script 1/2: inline[1]"));
	assert!(output.contains("Typing boot command script 2/2: inline[2]"));

	let expected = [tapped(0x61), tapped(0x62), tapped(keysym::RETURN)].concat();
	assert_eq!(server_events(&dialer).await, expected);
}

#[tokio::test(start_paused = true)]
async fn test_boot_wait_precedes_first_script() {
	let dialer = FakeDialer::new(FakeServer::new().with_password("secret"));
	let output = RecordingOutput::new();
	let provisioner = provisioner(dialer.clone())
		.with_boot_wait(Duration::from_secs(10))
		.with_output(output.clone());

	let summary = provisioner.run(CancellationToken::new(), inline(&["x"])).await.unwrap();

	assert!(summary.elapsed >= Duration::from_secs(10));
	let lines = output.lines();
	let waited = lines.iter().position(|line| line.starts_with("Waiting 10s")).unwrap();
	let typed = lines.iter().position(|line| line.starts_with("Typing")).unwrap();
	assert!(waited < typed);
}

#[tokio::test(start_paused = true)]
async fn test_no_scripts_connects_and_closes() {
	let dialer = FakeDialer::new(FakeServer::new().with_password("secret"));
	let summary = provisioner(dialer.clone()).run(CancellationToken::new(), Vec::new()).await.unwrap();

	assert_eq!((summary.scripts, summary.actions), (0, 0));
	let servers = dialer.take_servers();
	assert_eq!(servers.len(), 1);
	for server in servers {
		let seen = server.join().await;
		assert!(seen.initialised);
		assert!(seen.events.is_empty());
	}
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_script_skips_the_rest() {
	let dialer = FakeDialer::new(FakeServer::new().with_password("secret"));
	let cancel = CancellationToken::new();
	let trigger = cancel.clone();
	tokio::spawn(async move {
		tokio::time::sleep(Duration::from_secs(5)).await;
		trigger.cancel();
	});

	let err = provisioner(dialer.clone())
		.run(cancel, inline(&["a<wait10>b", "c"]))
		.await
		.unwrap_err();

	assert!(matches!(err, Error::Cancelled { phase: RunState::Executing(0) }), "got {err:?}");
	assert_eq!(err.to_string(), "run cancelled while executing script 1");
	// The session was closed, so the server saw EOF after the first key only.
	assert_eq!(server_events(&dialer).await, tapped(0x61).to_vec());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_boot_wait() {
	let dialer = FakeDialer::new(FakeServer::new().with_password("secret"));
	let cancel = CancellationToken::new();
	let trigger = cancel.clone();
	tokio::spawn(async move {
		tokio::time::sleep(Duration::from_secs(1)).await;
		trigger.cancel();
	});

	let err = provisioner(dialer.clone())
		.with_boot_wait(Duration::from_secs(60))
		.run(cancel, inline(&["a"]))
		.await
		.unwrap_err();

	assert!(matches!(err, Error::Cancelled { phase: RunState::BootWaiting }));
	assert!(server_events(&dialer).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_malformed_script_aborts_run() {
	let dialer = FakeDialer::new(FakeServer::new().with_password("secret"));
	let err = provisioner(dialer.clone())
		.run(CancellationToken::new(), inline(&["a", "<leftShiftOn>b", "c"]))
		.await
		.unwrap_err();

	match &err {
		Error::Script { index, total, name, source } => {
			assert_eq!((*index, *total), (1, 3));
			assert_eq!(name, "inline[2]");
			assert!(matches!(&**source, Error::Parse(parse) if matches!(parse.kind, ParseErrorKind::StillHeld(_))));
		}
		other => panic!("expected Script error, got {other:?}"),
	}
	assert_eq!(err.to_string(), "script 2/3 ('inline[2]') failed");
	assert_eq!(server_events(&dialer).await, tapped(0x61).to_vec());
}

#[tokio::test(start_paused = true)]
async fn test_connect_failure_runs_nothing() {
	let dialer = FakeDialer::refusing();
	let manager = ConnectionManager::new("vnc.test", 5900, "")
		.with_dialer(dialer.clone())
		.with_timeout(Duration::from_secs(2));

	let err = Provisioner::new(manager)
		.run(CancellationToken::new(), inline(&["a"]))
		.await
		.unwrap_err();

	assert!(matches!(err, Error::Connect { .. }));
	assert!(dialer.take_servers().is_empty());
}

#[test]
fn test_run_state_display() {
	assert_eq!(RunState::Connecting.to_string(), "connecting");
	assert_eq!(RunState::BootWaiting.to_string(), "waiting for boot");
	assert_eq!(RunState::Executing(2).to_string(), "executing script 3");
}
