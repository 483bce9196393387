// Integration tests for `ConnectionManager` against a local WebSocket server.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use dmxnode_api::{
    ConnectionManager, ConnectionState, InboundMessage, OutboundMessage, ReconnectPolicy,
    TlsMode,
};

// ── Helpers ─────────────────────────────────────────────────────────

const WAIT: Duration = Duration::from_secs(5);

async fn listener() -> (TcpListener, Url) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let origin = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
    (listener, origin)
}

fn fast_policy() -> ReconnectPolicy {
    ReconnectPolicy {
        max_attempts: 5,
        delay: Duration::from_millis(20),
    }
}

fn connect(
    origin: &Url,
    policy: ReconnectPolicy,
    cancel: CancellationToken,
) -> Result<ConnectionManager, dmxnode_api::Error> {
    ConnectionManager::connect(origin, policy, TlsMode::System, cancel)
}

async fn wait_for_state(conn: &ConnectionManager, wanted: ConnectionState) {
    let mut rx = conn.state_changes();
    tokio::time::timeout(WAIT, rx.wait_for(|s| *s == wanted))
        .await
        .unwrap()
        .unwrap();
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_frames_are_decoded_and_malformed_ones_skipped() {
    let (listener, origin) = listener().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::text("garbage{")).await.unwrap();
        ws.send(Message::text(r#"{"type":"status","uptime":42}"#))
            .await
            .unwrap();
        ws.send(Message::text(r#"{"type":"config","dhcpEnabled":true}"#))
            .await
            .unwrap();
        // Keep the socket open until the client is done.
        let _ = ws.next().await;
    });

    let cancel = CancellationToken::new();
    let conn = connect(&origin, fast_policy(), cancel.clone()).unwrap();
    let mut rx = conn.subscribe();

    let first = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(first.kind(), "status");
    let second = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert!(matches!(*second, InboundMessage::Config(_)));

    // The garbage frame did not knock the channel over.
    assert_eq!(conn.state(), ConnectionState::Connected);

    conn.shutdown();
    server.await.unwrap();
}

#[tokio::test]
async fn test_send_reaches_device_when_connected() {
    let (listener, origin) = listener().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text.as_str().to_owned(),
                Some(Ok(_)) => {}
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    });

    let conn =
        connect(&origin, fast_policy(), CancellationToken::new()).unwrap();
    wait_for_state(&conn, ConnectionState::Connected).await;

    conn.send(&OutboundMessage::PixelTest { mode: 4 });

    let received = tokio::time::timeout(WAIT, server).await.unwrap().unwrap();
    assert_eq!(received, r#"{"type":"pixel-test","mode":4}"#);
    conn.shutdown();
}

#[tokio::test]
async fn test_reconnects_after_server_close() {
    let (listener, origin) = listener().await;

    let server = tokio::spawn(async move {
        // First session: close immediately.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.close(None).await.unwrap();
        drop(ws);

        // Second session: announce ourselves and hold.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::text(r#"{"type":"pixel_test","success":true}"#))
            .await
            .unwrap();
        let _ = ws.next().await;
    });

    let conn =
        connect(&origin, fast_policy(), CancellationToken::new()).unwrap();
    let mut rx = conn.subscribe();

    let msg = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(msg.kind(), "pixel_test");
    assert_eq!(conn.state(), ConnectionState::Connected);

    conn.shutdown();
    server.await.unwrap();
}

#[tokio::test]
async fn test_send_without_device_is_dropped() {
    // Nothing listens on this port once the listener is dropped.
    let (listener, origin) = listener().await;
    drop(listener);

    let conn =
        connect(&origin, fast_policy(), CancellationToken::new()).unwrap();
    conn.send(&OutboundMessage::PixelTest { mode: 1 });

    conn.shutdown();
    wait_for_state(&conn, ConnectionState::Disconnected).await;
}

/// Serve one real session, closed when `close` fires, then drop every later
/// connection before the handshake. Returns the accept counter.
fn one_session_then_refuse(listener: TcpListener, close: oneshot::Receiver<()>) -> Arc<AtomicUsize> {
    let accepts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepts);

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        counter.fetch_add(1, Ordering::SeqCst);
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _ = close.await;
        let _ = ws.close(None).await;
        drop(ws);

        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            drop(stream);
        }
    });

    accepts
}

async fn wait_for_accepts(accepts: &AtomicUsize, wanted: usize) {
    tokio::time::timeout(WAIT, async {
        while accepts.load(Ordering::SeqCst) < wanted {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_retries_stop_at_budget_until_restart() {
    let (listener, origin) = listener().await;
    let (close_tx, close_rx) = oneshot::channel();
    let accepts = one_session_then_refuse(listener, close_rx);

    let policy = ReconnectPolicy {
        max_attempts: 1,
        delay: Duration::from_millis(20),
    };
    let conn = connect(&origin, policy, CancellationToken::new()).unwrap();
    wait_for_state(&conn, ConnectionState::Connected).await;

    // A restart while connected must not carry over to a later exhaustion.
    conn.restart();
    close_tx.send(()).unwrap();

    // Initial session plus the single retry, then nothing.
    wait_for_accepts(&accepts, 2).await;
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(accepts.load(Ordering::SeqCst), 2);
    assert_eq!(conn.state(), ConnectionState::Disconnected);

    // An explicit restart after exhaustion grants a fresh budget.
    conn.restart();
    wait_for_accepts(&accepts, 4).await;
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(accepts.load(Ordering::SeqCst), 4);
    assert_eq!(conn.state(), ConnectionState::Disconnected);

    conn.shutdown();
}

#[tokio::test]
async fn test_https_origin_takes_tls_mode() {
    let origin = Url::parse("https://127.0.0.1:9/").unwrap();
    let cancel = CancellationToken::new();

    for tls in [TlsMode::System, TlsMode::DangerAcceptInvalid] {
        let conn = ConnectionManager::connect(&origin, fast_policy(), tls, cancel.child_token())
            .unwrap();
        conn.shutdown();
        wait_for_state(&conn, ConnectionState::Disconnected).await;
    }
}
