use tokio::io::AsyncReadExt;
use vncboot_runtime::testing::FakeServer;

use super::*;

#[tokio::test]
async fn test_close_empty_session_is_noop() {
	let mut session = Session::new("localhost", 5900);
	session.close().await.unwrap();
	session.close().await.unwrap();
	assert!(!session.is_ready());
}

#[tokio::test]
async fn test_close_dialed_session_skips_client() {
	let (local, mut remote) = tokio::io::duplex(64);
	let mut session = Session::dialed("localhost", 5900, Box::new(local));
	assert!(!session.is_ready());

	session.close().await.unwrap();

	let mut buf = Vec::new();
	assert_eq!(remote.read_to_end(&mut buf).await.unwrap(), 0);
	// Second close finds nothing left to release.
	session.close().await.unwrap();
}

#[tokio::test]
async fn test_key_event_requires_authentication() {
	let mut session = Session::new("localhost", 5900);
	let err = session.key_event(KeyEvent::press(0x61)).await.unwrap_err();
	assert!(matches!(err, Error::NotConnected));
}

#[tokio::test]
async fn test_authenticate_then_send_and_close() {
	let (stream, server) = FakeServer::new().with_password("secret").spawn();
	let mut session = Session::dialed("vnc.test", 5901, Box::new(stream));

	session.authenticate(&ClientConfig::new("secret", true)).await.unwrap();
	assert!(session.is_ready());
	let desktop = session.desktop().unwrap();
	assert_eq!(desktop.name, "fake-desktop");
	assert_eq!((desktop.width, desktop.height), (1024, 768));

	session.key_event(KeyEvent::press(0x61)).await.unwrap();
	session.key_event(KeyEvent::release(0x61)).await.unwrap();
	session.close().await.unwrap();

	let seen = server.join().await;
	assert_eq!(seen.shared, Some(false));
	assert_eq!(seen.events, vec![KeyEvent::press(0x61), KeyEvent::release(0x61)]);
}

#[tokio::test]
async fn test_unsolicited_server_messages_do_not_block_typing() {
	let (stream, server) = FakeServer::new().with_chatter(32).spawn();
	let mut session = Session::dialed("vnc.test", 5900, Box::new(stream));
	session.authenticate(&ClientConfig::default()).await.unwrap();

	for keysym in [0x61, 0x62, 0x63] {
		session.key_event(KeyEvent::press(keysym)).await.unwrap();
	}
	// The server reads KeyEvents only after all of its own messages were taken.
	tokio::time::timeout(std::time::Duration::from_secs(5), async {
		while server.events().len() < 3 {
			tokio::time::sleep(std::time::Duration::from_millis(10)).await;
		}
	})
	.await
	.expect("server stalled");
	session.close().await.unwrap();

	let seen = server.join().await;
	assert_eq!(
		seen.events,
		vec![KeyEvent::press(0x61), KeyEvent::press(0x62), KeyEvent::press(0x63)]
	);
}

#[tokio::test]
async fn test_failed_authentication_leaves_session_empty() {
	let (stream, _server) = FakeServer::new().with_password("secret").spawn();
	let mut session = Session::dialed("vnc.test", 5901, Box::new(stream));

	let err = session.authenticate(&ClientConfig::new("wrong", true)).await.unwrap_err();
	assert!(err.is_auth(), "expected auth error, got {err:?}");
	assert!(!session.is_ready());
	session.close().await.unwrap();
}

#[tokio::test]
async fn test_closer_fails_later_key_events() {
	let (stream, server) = FakeServer::new().spawn();
	let mut session = Session::dialed("vnc.test", 5900, Box::new(stream));
	session.authenticate(&ClientConfig::default()).await.unwrap();

	let closer = session.closer();
	closer.close();
	assert!(closer.is_closed());

	let err = session.key_event(KeyEvent::press(0x61)).await.unwrap_err();
	assert!(matches!(err, Error::Transport(vncboot_runtime::Error::Closed)));

	session.close().await.unwrap();
	assert!(server.join().await.events.is_empty());
}

#[tokio::test]
async fn test_authenticate_twice_is_rejected() {
	let (stream, _server) = FakeServer::new().spawn();
	let mut session = Session::dialed("vnc.test", 5900, Box::new(stream));
	session.authenticate(&ClientConfig::default()).await.unwrap();

	let err = session.authenticate(&ClientConfig::default()).await.unwrap_err();
	assert!(matches!(err, Error::NotConnected));
	assert!(session.is_ready());
	session.close().await.unwrap();
}
