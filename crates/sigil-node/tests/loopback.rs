//! End-to-end over TCP loopback: a client node sends, the server node's
//! handler receives the plaintext.
//!
//! Every test here runs a real Ed448 handshake with keys that travel as
//! bytes through the configuration, the same path `listen`/`send` take.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use sigil_core::error::CoreError;
use sigil_core::{SigningKeyPair, SigningPublicKey};
use sigil_node::handlers::ReceivedMessage;
use sigil_node::{
    Client, ForwardingHandler, MessageHandler, NodeConfig, NodeError, Server, SessionContext,
};

fn config(peer_key: SigningPublicKey, peer_addr: &str, seed: Option<&str>) -> NodeConfig {
    let seed_line = seed.map(|s| format!("seed = \"{s}\"")).unwrap_or_default();
    NodeConfig::from_str(&format!(
        r#"
        [network]
        listen_addr = "127.0.0.1:0"
        peer_addr = "{peer_addr}"

        [peer]
        signing_key = "{}"

        [session]
        associated_data = "loopback"
        handshake_timeout_secs = 5
        {seed_line}
        "#,
        peer_key.to_hex()
    ))
    .unwrap()
}

struct Running {
    server: Arc<Server>,
    task: tokio::task::JoinHandle<sigil_node::Result<()>>,
    addr: String,
    rx: mpsc::UnboundedReceiver<ReceivedMessage>,
}

impl Running {
    async fn stop(self) {
        self.server.shutdown();
        self.task.await.unwrap().unwrap();
    }
}

/// Rejects payloads starting with `reject` with a local I/O error and
/// forwards the rest.
struct PickyHandler {
    inner: ForwardingHandler,
}

#[async_trait]
impl MessageHandler for PickyHandler {
    async fn on_message(&self, ctx: &SessionContext, plaintext: &[u8]) -> sigil_node::Result<()> {
        if plaintext.starts_with(b"reject") {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into());
        }
        self.inner.on_message(ctx, plaintext).await
    }
}

async fn start_server(
    server_id: SigningKeyPair,
    client_key: SigningPublicKey,
    seed: Option<&str>,
) -> Running {
    start_server_with(server_id, client_key, seed, |tx| -> Arc<dyn MessageHandler> {
        Arc::new(ForwardingHandler::new(tx))
    })
    .await
}

async fn start_server_with(
    server_id: SigningKeyPair,
    client_key: SigningPublicKey,
    seed: Option<&str>,
    handler: impl FnOnce(mpsc::UnboundedSender<ReceivedMessage>) -> Arc<dyn MessageHandler>,
) -> Running {
    let (tx, rx) = mpsc::unbounded_channel();
    let server = Arc::new(
        Server::new(config(client_key, "127.0.0.1:1", seed), server_id, handler(tx)).unwrap(),
    );

    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().to_string();
    let task = tokio::spawn({
        let server = Arc::clone(&server);
        async move { server.serve(listener).await }
    });

    Running {
        server,
        task,
        addr,
        rx,
    }
}

async fn next_message(rx: &mut mpsc::UnboundedReceiver<ReceivedMessage>) -> Option<ReceivedMessage> {
    tokio::time::timeout(Duration::from_millis(1500), rx.recv())
        .await
        .ok()
        .flatten()
}

#[tokio::test]
async fn test_client_message_reaches_server_handler() {
    let server_id = SigningKeyPair::generate();
    let client_id = SigningKeyPair::generate();
    let server_key = server_id.public_key();
    let client_key = client_id.public_key();

    let mut running = start_server(server_id, client_key, None).await;

    let client = Client::new(config(server_key, &running.addr, None), client_id).unwrap();
    let sent = client.send(&["hello", "second message"]).await.unwrap();
    assert_eq!(sent, 2);

    let first = next_message(&mut running.rx).await.unwrap();
    assert_eq!(first.plaintext, b"hello");
    assert_eq!(first.peer_key, client_key);

    let second = next_message(&mut running.rx).await.unwrap();
    assert_eq!(second.plaintext, b"second message");
    assert_eq!(second.session_id, first.session_id);

    running.stop().await;
}

#[tokio::test]
async fn test_shared_seed_and_multiple_connections() {
    let server_id = SigningKeyPair::generate();
    let client_id = Arc::new(SigningKeyPair::generate());
    let server_key = server_id.public_key();

    let mut running = start_server(server_id, client_id.public_key(), Some("s33d")).await;

    for round in 0..3u8 {
        let identity = SigningKeyPair::from_seed(&client_id.seed_bytes()[..]).unwrap();
        let client = Client::new(config(server_key, &running.addr, Some("s33d")), identity).unwrap();
        client.send(&[[round; 4]]).await.unwrap();

        let msg = next_message(&mut running.rx).await.unwrap();
        assert_eq!(msg.plaintext, vec![round; 4]);
    }

    running.stop().await;
}

#[tokio::test]
async fn test_unpinned_server_key_is_rejected() {
    let server_id = SigningKeyPair::generate();
    let client_id = SigningKeyPair::generate();
    let someone_else = SigningKeyPair::generate().public_key();

    let mut running = start_server(server_id, client_id.public_key(), None).await;

    let client = Client::new(config(someone_else, &running.addr, None), client_id).unwrap();
    let result = client.send(&["should not arrive"]).await;
    assert!(matches!(
        result,
        Err(NodeError::Core(CoreError::InvalidSignature))
    ));

    assert!(next_message(&mut running.rx).await.is_none());
    running.stop().await;
}

#[tokio::test]
async fn test_seed_mismatch_never_delivers() {
    let server_id = SigningKeyPair::generate();
    let client_id = SigningKeyPair::generate();
    let server_key = server_id.public_key();

    let mut running = start_server(server_id, client_id.public_key(), Some("server")).await;

    let client = Client::new(config(server_key, &running.addr, Some("client")), client_id).unwrap();
    // The handshake succeeds; the data message fails authentication.
    client.send(&["hello"]).await.unwrap();

    assert!(next_message(&mut running.rx).await.is_none());
    running.stop().await;
}

#[tokio::test]
async fn test_handler_error_keeps_connection_open() {
    let server_id = SigningKeyPair::generate();
    let client_id = SigningKeyPair::generate();
    let server_key = server_id.public_key();

    let mut running = start_server_with(server_id, client_id.public_key(), None, |tx| -> Arc<dyn MessageHandler> {
        Arc::new(PickyHandler {
            inner: ForwardingHandler::new(tx),
        })
    })
    .await;

    let client = Client::new(config(server_key, &running.addr, None), client_id).unwrap();
    client.send(&["reject this", "after the rejection"]).await.unwrap();

    let msg = next_message(&mut running.rx).await.unwrap();
    assert_eq!(msg.plaintext, b"after the rejection");
    assert!(next_message(&mut running.rx).await.is_none());

    running.stop().await;
}
