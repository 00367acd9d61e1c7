//! # Certificate Studio Core
//!
//! Editing engine for single-page certificate documents: a typed element
//! model, the document store, stacking order, pointer and keyboard
//! interaction, and the export layout handed to rasterizers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 cert-core                   │
//! ├─────────────────────────────────────────────┤
//! │  Document Store   │  Interaction Controller │
//! │  - Elements       │  - Select / drag        │
//! │  - Selection      │  - Keyboard nudges      │
//! │  - Z-order        │  - Text edit mode       │
//! ├─────────────────────────────────────────────┤
//! │  Compositor       │  Editor Session         │
//! │  - Draw layout    │  - Load / save          │
//! │  - Export pipeline│  - Error reporting      │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod compositor;
pub mod document;
pub mod element;
pub mod error;
pub mod event;
pub mod export;
pub mod geometry;
pub mod interaction;
pub mod session;
pub mod store;
pub mod upload;
pub mod zorder;

pub use compositor::{compose, ApproximateMetrics, DrawInstruction, Layout, Paint, TextMetrics};
pub use document::{Document, DocumentSummary, NEW_DOCUMENT_NAME};
pub use element::{
    Border, BorderStyle, Element, ElementId, ElementKind, ElementPatch, ElementType, PageBorder,
    TextAlign,
};
pub use error::{EditorError, EditorResult};
pub use event::{Hit, HitRegion, InputEvent, Key, KeyInput, KeyModifiers};
pub use export::{
    file_stem, Artifact, Bitmap, ExportFormat, ExportPipeline, PageEncoder, PageSize, Rasterizer,
};
pub use geometry::{CanvasSize, Point, Rect};
pub use interaction::{
    complete_image_upload, hit_test, DragSession, InteractionController, InteractionState,
    PointerMailbox, UiFlags,
};
pub use session::{DocumentRepository, EditorSession};
pub use store::{current_timestamp_ms, DocumentStore};
pub use upload::{DecodedImage, ImageDecoder, UploadTicket, MAX_UPLOAD_EXTENT};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
