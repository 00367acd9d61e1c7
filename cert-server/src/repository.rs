//! Server-side certificate storage.
//!
//! Two implementations share one in-memory index:
//! - [`MemoryRepository`]: documents live only as long as the process
//! - [`FileRepository`]: each document is also written to
//!   `<data_dir>/<encoded id>.json` and reloaded on startup
//!
//! Both seed the default certificate when they start out empty.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use cert_core::{
    current_timestamp_ms, Border, Document, DocumentSummary, Element, ElementId, ElementKind,
    TextAlign,
};

/// Name of the seeded template.
pub const DEFAULT_CERTIFICATE_NAME: &str = "Default Certificate";

/// Errors raised by repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The document was rejected before storing.
    #[error("Invalid document: {0}")]
    Invalid(String),
    /// No document has this id.
    #[error("Certificate not found: {0}")]
    NotFound(String),
    /// Reading or writing the data directory failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A stored file could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage backing the HTTP API.
pub trait CertificateRepository: Send + Sync {
    /// Summaries of stored documents, newest `updated_at` first.
    ///
    /// `name` filters by case-insensitive substring.
    ///
    /// # Errors
    ///
    /// Implementations may fail if the backing storage is unreadable.
    fn list(&self, name: Option<&str>) -> RepositoryResult<Vec<DocumentSummary>>;

    /// A stored document.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] for unknown ids.
    fn get(&self, id: &str) -> RepositoryResult<Document>;

    /// Store a document and return it as stored.
    ///
    /// A document without an id gets a fresh UUID and `created_at`.
    /// `updated_at` is always refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Invalid`] for a blank name, or a storage
    /// error if the document cannot be written.
    fn save(&self, document: Document) -> RepositoryResult<Document>;

    /// Number of stored documents.
    fn len(&self) -> usize;

    /// Whether nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The built-in certificate template.
///
/// The date line uses today's local date.
#[must_use]
pub fn default_certificate(now: u64) -> Document {
    let today = chrono::Local::now().format("%d/%m/%Y");
    let lines = [
        ("title", "CERTIFICATE OF ACHIEVEMENT".to_string(), 100.0, 36.0, true),
        (
            "recipient",
            "This certificate is awarded to [Recipient Name]".to_string(),
            200.0,
            20.0,
            false,
        ),
        (
            "description",
            "For outstanding performance and dedication".to_string(),
            250.0,
            20.0,
            false,
        ),
        ("date", format!("Date: {today}"), 350.0, 18.0, false),
        ("signature", "Authorized Signature".to_string(), 450.0, 18.0, false),
    ];

    let mut document = Document::new(DEFAULT_CERTIFICATE_NAME, now);
    for (z_index, (id, content, y, font_size, bold)) in (1..).zip(lines) {
        document.elements.push(Element {
            id: ElementId::new(id),
            x: 400.0,
            y,
            z_index,
            text_align: TextAlign::Center,
            border: Border::default(),
            kind: ElementKind::Text {
                content,
                font_size,
                color: Some("#2c3e50".to_string()),
                font_family: Some("Times New Roman".to_string()),
                font_weight: bold.then(|| "bold".to_string()),
            },
        });
    }
    document
}

/// In-memory repository.
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    documents: Arc<RwLock<HashMap<String, Document>>>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    /// Create a repository holding only the default certificate.
    #[must_use]
    pub fn new() -> Self {
        let repo = Self::empty();
        repo.insert(stamp(default_certificate(current_timestamp_ms()), None));
        repo
    }

    /// Create a repository with nothing in it.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn insert(&self, document: Document) {
        let Some(id) = document.id.clone() else {
            return;
        };
        self.documents
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(id, document);
    }

    fn existing(&self, id: &str) -> Option<Document> {
        self.documents
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Validate, clamp and stamp `document` without storing it.
    fn prepare(&self, mut document: Document) -> RepositoryResult<Document> {
        if document.name.trim().is_empty() {
            return Err(RepositoryError::Invalid(
                "Certificate name is required".to_string(),
            ));
        }
        if let Some(id) = document.duplicate_element_id() {
            return Err(RepositoryError::Invalid(format!(
                "Duplicate element id: {id}"
            )));
        }
        document.normalize();
        let previous = document
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .and_then(|id| self.existing(id));
        Ok(stamp(document, previous.as_ref()))
    }
}

impl CertificateRepository for MemoryRepository {
    fn list(&self, name: Option<&str>) -> RepositoryResult<Vec<DocumentSummary>> {
        let needle = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_lowercase);
        let documents = self
            .documents
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut summaries: Vec<DocumentSummary> = documents
            .values()
            .filter(|doc| {
                needle
                    .as_deref()
                    .is_none_or(|n| doc.name.to_lowercase().contains(n))
            })
            .map(Document::summary)
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }

    fn get(&self, id: &str) -> RepositoryResult<Document> {
        self.existing(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    fn save(&self, document: Document) -> RepositoryResult<Document> {
        let stored = self.prepare(document)?;
        tracing::debug!("Saving certificate {:?} ({})", stored.id, stored.name);
        self.insert(stored.clone());
        Ok(stored)
    }

    fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

/// Repository persisting each document as a JSON file.
#[derive(Debug, Clone)]
pub struct FileRepository {
    cache: MemoryRepository,
    data_dir: PathBuf,
}

impl FileRepository {
    /// Open `data_dir`, creating it if needed, and load every stored
    /// document. Seeds the default certificate if the directory is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or read, or the
    /// seed cannot be written.
    pub fn open(data_dir: impl Into<PathBuf>) -> RepositoryResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        let repo = Self {
            cache: MemoryRepository::empty(),
            data_dir,
        };

        let loaded = repo.load_all()?;
        tracing::info!(
            "Loaded {loaded} certificates from {}",
            repo.data_dir.display()
        );
        if loaded == 0 {
            let seed = stamp(default_certificate(current_timestamp_ms()), None);
            repo.persist(&seed)?;
            repo.cache.insert(seed);
        }
        Ok(repo)
    }

    /// Directory holding the JSON files.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Read every `*.json` file into the cache. Unreadable files are
    /// skipped with a warning.
    fn load_all(&self) -> RepositoryResult<usize> {
        let mut loaded = 0;
        for entry in std::fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let parsed = std::fs::read_to_string(&path)
                .map_err(RepositoryError::from)
                .and_then(|json| Ok(serde_json::from_str::<Document>(&json)?));
            match parsed {
                Ok(document) if document.id.is_some() => {
                    self.cache.insert(document);
                    loaded += 1;
                }
                Ok(_) => tracing::warn!("Skipping {}: document has no id", path.display()),
                Err(e) => tracing::warn!("Skipping {}: {e}", path.display()),
            }
        }
        Ok(loaded)
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", encode_filename(id)))
    }

    fn persist(&self, document: &Document) -> RepositoryResult<()> {
        let id = document.id.as_deref().unwrap_or_default();
        let json = serde_json::to_string_pretty(document)?;
        let path = self.path_for(id);
        std::fs::write(&path, json).map_err(|e| {
            tracing::warn!("Failed to persist certificate {id} to {}: {e}", path.display());
            RepositoryError::Io(e)
        })
    }
}

impl CertificateRepository for FileRepository {
    fn list(&self, name: Option<&str>) -> RepositoryResult<Vec<DocumentSummary>> {
        self.cache.list(name)
    }

    fn get(&self, id: &str) -> RepositoryResult<Document> {
        self.cache.get(id)
    }

    fn save(&self, document: Document) -> RepositoryResult<Document> {
        let stored = self.cache.prepare(document)?;
        // Write first so a failed write leaves the cache unchanged.
        self.persist(&stored)?;
        self.cache.insert(stored.clone());
        Ok(stored)
    }

    fn len(&self) -> usize {
        self.cache.len()
    }
}

/// Assign an id and timestamps for storage.
///
/// `previous` is the stored version of the same document, if any; its
/// `created_at` survives the update and `updated_at` only moves forward.
fn stamp(mut document: Document, previous: Option<&Document>) -> Document {
    let now = current_timestamp_ms();
    match previous {
        Some(prev) => {
            document.created_at = prev.created_at;
            document.updated_at = now.max(prev.updated_at.saturating_add(1));
        }
        None => {
            if document.id.as_deref().is_none_or(str::is_empty) {
                document.id = Some(uuid::Uuid::new_v4().to_string());
            }
            document.created_at = now;
            document.updated_at = now;
        }
    }
    document
}

/// Encode a document id as a filename stem.
///
/// Lowercase ASCII letters, digits and `-` are kept; every other byte
/// becomes `_xx` (lowercase hex). `_` only ever starts an escape, so distinct
/// ids never share a file, and the result has no path separators or case
/// differences for the filesystem to fold.
fn encode_filename(id: &str) -> String {
    let mut encoded = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-' {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("_{byte:02x}"));
        }
    }
    encoded
}
