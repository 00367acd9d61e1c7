//! Editing session: store, interaction controller and persistence wired
//! together.
//!
//! Persistence failures never corrupt the session. A failed save leaves the
//! store untouched, a failed load keeps the previous document, and a failed
//! open falls back to an empty document. Each failure is also kept as a
//! user-visible message in [`EditorSession::last_error`].

use async_trait::async_trait;

use crate::compositor::TextMetrics;
use crate::document::{Document, DocumentSummary, NEW_DOCUMENT_NAME};
use crate::event::InputEvent;
use crate::export::{Artifact, ExportPipeline, PageEncoder, Rasterizer};
use crate::geometry::CanvasSize;
use crate::interaction::InteractionController;
use crate::store::{current_timestamp_ms, DocumentStore};
use crate::{EditorError, EditorResult};

/// Remote document storage.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Summaries of all saved documents, newest first.
    async fn list(&self) -> EditorResult<Vec<DocumentSummary>>;

    /// The built-in starting template.
    async fn load_default(&self) -> EditorResult<Document>;

    /// A saved document.
    ///
    /// Fails with [`EditorError::NotFound`] for unknown ids.
    async fn load(&self, id: &str) -> EditorResult<Document>;

    /// Persist a document, assigning an id on first save.
    async fn save(&self, document: Document) -> EditorResult<Document>;
}

/// One user's editing session.
pub struct EditorSession<R> {
    repository: R,
    store: DocumentStore,
    controller: InteractionController,
    documents: Vec<DocumentSummary>,
    last_error: Option<String>,
}

impl<R: DocumentRepository> EditorSession<R> {
    /// Open a session on the default template, renamed for a new document.
    ///
    /// Never fails: if the repository is unreachable the session starts from
    /// an empty document and records the error.
    pub async fn open(repository: R, canvas: CanvasSize) -> Self {
        let mut session = Self {
            repository,
            store: DocumentStore::with_canvas(canvas),
            controller: InteractionController::new(),
            documents: Vec::new(),
            last_error: None,
        };

        // A failed listing is recorded and the template still loads.
        let _ = session.refresh_list().await;

        match session.repository.load_default().await {
            Ok(mut template) => {
                template.id = None;
                template.name = NEW_DOCUMENT_NAME.to_string();
                let now = current_timestamp_ms();
                template.created_at = now;
                template.updated_at = now;
                session.controller.hydrate(&mut session.store, template);
            }
            Err(err) => {
                tracing::warn!("Failed to load default certificate: {err}");
                session.record(&err);
                session
                    .controller
                    .hydrate(&mut session.store, Document::new(NEW_DOCUMENT_NAME, current_timestamp_ms()));
            }
        }
        session
    }

    /// The document store.
    #[must_use]
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// The document store, for direct edits from panels.
    pub fn store_mut(&mut self) -> &mut DocumentStore {
        &mut self.store
    }

    /// The interaction controller.
    #[must_use]
    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    /// The interaction controller, for UI flag toggles.
    pub fn controller_mut(&mut self) -> &mut InteractionController {
        &mut self.controller
    }

    /// Last listing fetched from the repository.
    #[must_use]
    pub fn documents(&self) -> &[DocumentSummary] {
        &self.documents
    }

    /// Most recent user-visible error, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Dismiss the last error.
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Route an input event to the interaction controller.
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        self.controller.handle(&mut self.store, event)
    }

    /// Re-fetch the document listing.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Persistence`] if the repository fails; the
    /// previous listing is kept.
    pub async fn refresh_list(&mut self) -> EditorResult<()> {
        match self.repository.list().await {
            Ok(documents) => {
                self.documents = documents;
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Failed to list certificates: {err}");
                let err = into_persistence(err);
                self.record(&err);
                Err(err)
            }
        }
    }

    /// Save the current document under `name`.
    ///
    /// On success the stored document (with its persisted id) replaces the
    /// local one and the listing is refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Validation`] for a blank name and
    /// [`EditorError::Persistence`] if the repository fails. The store is left
    /// untouched in both cases.
    pub async fn save(&mut self, name: &str) -> EditorResult<()> {
        let name = name.trim();
        if name.is_empty() {
            let err = EditorError::Validation("certificate name is required".to_string());
            self.record(&err);
            return Err(err);
        }

        let mut snapshot = self.store.snapshot();
        snapshot.name = name.to_string();

        let saved = match self.repository.save(snapshot).await {
            Ok(saved) => saved,
            Err(err) => {
                tracing::warn!("Failed to save certificate {name:?}: {err}");
                let err = into_persistence(err);
                self.record(&err);
                return Err(err);
            }
        };

        tracing::debug!("Saved certificate {:?} as {:?}", saved.name, saved.id);
        let selection = self.store.selection().cloned();
        self.controller.hydrate(&mut self.store, saved);
        self.store.select(selection);
        self.controller.flags_mut().show_save_dialog = false;
        self.last_error = None;

        // The save itself succeeded; a stale listing is only recorded.
        let _ = self.refresh_list().await;
        Ok(())
    }

    /// Replace the current document with a saved one.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NotFound`] for unknown ids and
    /// [`EditorError::Persistence`] for other failures. The previous document
    /// stays loaded.
    pub async fn load(&mut self, id: &str) -> EditorResult<()> {
        match self.repository.load(id).await {
            Ok(document) => {
                self.controller.hydrate(&mut self.store, document);
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Failed to load certificate {id}: {err}");
                let err = match err {
                    EditorError::NotFound(_) => err,
                    other => into_persistence(other),
                };
                self.record(&err);
                Err(err)
            }
        }
    }

    /// Export a snapshot of the current document.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Export`] if rendering fails; the document is
    /// unaffected.
    pub fn export<Ra, E, M>(&mut self, pipeline: &ExportPipeline<Ra, E, M>) -> EditorResult<Artifact>
    where
        Ra: Rasterizer,
        E: PageEncoder,
        M: TextMetrics,
    {
        let snapshot = self.store.snapshot();
        pipeline.export(&snapshot).inspect_err(|err| self.record(err))
    }

    fn record(&mut self, err: &EditorError) {
        self.last_error = Some(err.to_string());
    }
}

fn into_persistence(err: EditorError) -> EditorError {
    match err {
        EditorError::Persistence(_) => err,
        other => EditorError::Persistence(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementPatch, ElementType};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRepository {
        docs: Mutex<HashMap<String, Document>>,
        offline: AtomicBool,
    }

    impl FakeRepository {
        fn check(&self) -> EditorResult<()> {
            if self.offline.load(Ordering::SeqCst) {
                Err(EditorError::Persistence("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl DocumentRepository for FakeRepository {
        async fn list(&self) -> EditorResult<Vec<DocumentSummary>> {
            self.check()?;
            let docs = self.docs.lock().expect("lock");
            Ok(docs.values().map(Document::summary).collect())
        }

        async fn load_default(&self) -> EditorResult<Document> {
            self.check()?;
            let mut doc = Document::new("Default Certificate", 1);
            doc.id = Some("default".to_string());
            doc.elements.push(crate::element::Element::text(
                "title".into(),
                crate::geometry::Point::new(400.0, 100.0),
                1,
            ));
            Ok(doc)
        }

        async fn load(&self, id: &str) -> EditorResult<Document> {
            self.check()?;
            self.docs
                .lock()
                .expect("lock")
                .get(id)
                .cloned()
                .ok_or_else(|| EditorError::NotFound(format!("certificate {id}")))
        }

        async fn save(&self, mut document: Document) -> EditorResult<Document> {
            self.check()?;
            let mut docs = self.docs.lock().expect("lock");
            let id = document
                .id
                .clone()
                .unwrap_or_else(|| format!("cert-{}", docs.len() + 1));
            document.id = Some(id.clone());
            docs.insert(id, document.clone());
            Ok(document)
        }
    }

    #[tokio::test]
    async fn test_open_renames_default_template() {
        let session = EditorSession::open(FakeRepository::default(), CanvasSize::default()).await;
        let doc = session.store().document();
        assert_eq!(doc.name, NEW_DOCUMENT_NAME);
        assert!(doc.id.is_none());
        assert_eq!(doc.elements.len(), 1);
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn test_open_offline_falls_back_to_empty() {
        let repo = FakeRepository::default();
        repo.offline.store(true, Ordering::SeqCst);
        let session = EditorSession::open(repo, CanvasSize::default()).await;

        assert!(session.store().document().elements.is_empty());
        assert!(session.last_error().is_some());
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_refreshes_list() {
        let mut session = EditorSession::open(FakeRepository::default(), CanvasSize::default()).await;
        let id = session.store_mut().create_element(ElementType::Image);

        session.save("Award").await.expect("save");
        let doc = session.store().document();
        assert_eq!(doc.id.as_deref(), Some("cert-1"));
        assert_eq!(doc.name, "Award");
        assert_eq!(session.documents().len(), 1);
        assert_eq!(session.store().selection(), Some(&id));

        // Re-saving keeps the id.
        session.save("Award 2").await.expect("save");
        assert_eq!(session.store().document().id.as_deref(), Some("cert-1"));
        assert_eq!(session.documents().len(), 1);
    }

    #[tokio::test]
    async fn test_save_requires_name() {
        let mut session = EditorSession::open(FakeRepository::default(), CanvasSize::default()).await;
        let result = session.save("   ").await;
        assert!(matches!(result, Err(EditorError::Validation(_))));
        assert!(session.documents().is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_leaves_store_unchanged() {
        let mut session = EditorSession::open(FakeRepository::default(), CanvasSize::default()).await;
        session.store_mut().create_element(ElementType::Text);
        let before = session.store().snapshot();

        session.repository.offline.store(true, Ordering::SeqCst);
        let result = session.save("Award").await;

        assert!(matches!(result, Err(EditorError::Persistence(_))));
        assert_eq!(session.store().snapshot(), before);
        assert!(session.last_error().is_some());
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_document() {
        let mut session = EditorSession::open(FakeRepository::default(), CanvasSize::default()).await;
        let id = session.store_mut().create_element(ElementType::Text);
        session
            .store_mut()
            .update_element(&id, &ElementPatch::content("kept"))
            .expect("update");
        let before = session.store().snapshot();

        let result = session.load("missing").await;
        assert!(matches!(result, Err(EditorError::NotFound(_))));
        assert_eq!(session.store().snapshot(), before);
    }

    #[tokio::test]
    async fn test_load_replaces_document() {
        let mut session = EditorSession::open(FakeRepository::default(), CanvasSize::default()).await;
        session.save("First").await.expect("save");
        session.store_mut().create_element(ElementType::Image);

        session.load("cert-1").await.expect("load");
        assert_eq!(session.store().document().name, "First");
        assert_eq!(session.store().document().elements.len(), 1);
        assert!(session.store().selection().is_none());
    }
}
