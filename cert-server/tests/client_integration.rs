//! End-to-end tests: an editor session talking to a live server through
//! [`HttpRepository`].

use std::net::SocketAddr;

use cert_core::{
    CanvasSize, DocumentRepository, EditorError, EditorSession, ElementPatch, ElementType,
    NEW_DOCUMENT_NAME,
};
use cert_server::{build_router, AppState, HttpRepository, MemoryRepository};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A server on a random local port.
struct TestServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let port = portpicker::pick_unused_port().expect("no available port");
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let app = build_router(AppState::new(MemoryRepository::new()));

        let listener = TcpListener::bind(addr).await.expect("failed to bind");
        let addr = listener.local_addr().expect("failed to get local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn client(&self) -> HttpRepository {
        HttpRepository::new(self.url()).expect("client")
    }

    async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(tokio::time::Duration::from_secs(5), self.handle).await;
    }
}

#[tokio::test]
async fn test_session_opens_on_default_template() {
    let server = TestServer::start().await;
    let session = EditorSession::open(server.client(), CanvasSize::default()).await;

    let doc = session.store().document();
    assert_eq!(doc.name, NEW_DOCUMENT_NAME);
    assert!(doc.id.is_none());
    assert_eq!(doc.elements.len(), 5);
    assert_eq!(session.documents().len(), 1);
    assert!(session.last_error().is_none());

    server.shutdown().await;
}

#[tokio::test]
async fn test_save_then_load_round_trip() {
    let server = TestServer::start().await;
    let mut session = EditorSession::open(server.client(), CanvasSize::default()).await;

    let id = session.store_mut().create_element(ElementType::Text);
    session
        .store_mut()
        .update_element(&id, &ElementPatch::content("Jane Doe"))
        .expect("edit");
    session.save("Jane's certificate").await.expect("save");

    let saved_id = session.store().document().id.clone().expect("persisted id");
    assert_eq!(session.documents().len(), 2);
    assert!(session.documents().iter().any(|d| d.id == saved_id));

    // A second session sees the saved document.
    let mut other = EditorSession::open(server.client(), CanvasSize::default()).await;
    other.load(&saved_id).await.expect("load");
    let loaded = other.store().document();
    assert_eq!(loaded.name, "Jane's certificate");
    assert!(loaded.elements.iter().any(|e| e.content() == "Jane Doe"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_load_unknown_keeps_current_document() {
    let server = TestServer::start().await;
    let mut session = EditorSession::open(server.client(), CanvasSize::default()).await;
    let before = session.store().snapshot();

    let err = session.load("missing").await.expect_err("unknown id");
    assert!(matches!(err, EditorError::NotFound(_)));
    assert_eq!(session.store().snapshot(), before);
    assert!(session.last_error().is_some());

    server.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_server_falls_back_to_empty_document() {
    let port = portpicker::pick_unused_port().expect("no available port");
    let client = HttpRepository::new(format!("http://127.0.0.1:{port}")).expect("client");

    assert!(matches!(
        client.list().await,
        Err(EditorError::Persistence(_))
    ));

    let session = EditorSession::open(client, CanvasSize::default()).await;
    assert!(session.store().document().elements.is_empty());
    assert!(session.last_error().is_some());
}
