//! Pointer and keyboard interaction.
//!
//! ```text
//!           pointer down              pointer down (container, not editing)
//!   Idle ─────────────────► Selecting ─────────────────────► Dragging
//!    ▲                          │                                │
//!    └──────── pointer up ──────┴────── pointer up / leave ──────┘
//! ```
//!
//! Pointer moves during a drag are coalesced through a single-slot
//! [`PointerMailbox`]: a move only posts its position, and the next rendering
//! tick ([`InteractionController::flush_frame`]) applies at most one update.

use serde::{Deserialize, Serialize};

use crate::compositor::{compose, TextMetrics};
use crate::document::Document;
use crate::element::{Element, ElementId, ElementKind, ElementPatch};
use crate::event::{Hit, HitRegion, InputEvent, Key, KeyInput};
use crate::geometry::{clamp_axis, drag_position, CanvasSize, Point};
use crate::store::DocumentStore;
use crate::upload::{DecodedImage, UploadTicket};

/// Nudge distance for a plain arrow key.
pub const NUDGE_STEP: f32 = 1.0;

/// Nudge distance for an arrow key with shift held.
pub const NUDGE_STEP_LARGE: f32 = 10.0;

/// A drag in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragSession {
    /// Element being dragged.
    pub element: ElementId,
    /// Pointer offset within the element's bounding box at press time.
    pub offset: Point,
    /// Element position at press time.
    pub start: Point,
}

/// Pointer state machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum InteractionState {
    /// Nothing pressed.
    #[default]
    Idle,
    /// Pressed on an element without dragging it.
    Selecting {
        /// Pressed element.
        element: ElementId,
    },
    /// Dragging an element.
    Dragging(DragSession),
}

/// Per-session UI state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct UiFlags {
    /// Element tools panel visible.
    pub show_element_panel: bool,
    /// Page border panel visible.
    pub show_border_panel: bool,
    /// Background panel visible.
    pub show_background_panel: bool,
    /// Save dialog open.
    pub show_save_dialog: bool,
    /// Text element currently edited in place.
    pub editing_text: Option<ElementId>,
}

/// Single-slot pending pointer position. Newer posts overwrite older ones.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerMailbox {
    pending: Option<Point>,
}

impl PointerMailbox {
    /// Post a position, replacing any pending one.
    ///
    /// Returns `true` if a pending position was overwritten.
    pub fn post(&mut self, position: Point) -> bool {
        self.pending.replace(position).is_some()
    }

    /// Take the pending position, leaving the slot empty.
    pub fn take(&mut self) -> Option<Point> {
        self.pending.take()
    }

    /// Whether a position is waiting.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any pending position.
    pub fn clear(&mut self) {
        self.pending = None;
    }
}

/// Translates input events into document store mutations.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: InteractionState,
    flags: UiFlags,
    canvas_origin: Point,
    mailbox: PointerMailbox,
}

impl InteractionController {
    /// Create an idle controller with the canvas at the viewport origin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pointer state.
    #[must_use]
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// UI flags.
    #[must_use]
    pub fn flags(&self) -> &UiFlags {
        &self.flags
    }

    /// Mutable UI flags, for panel toggles.
    pub fn flags_mut(&mut self) -> &mut UiFlags {
        &mut self.flags
    }

    /// Whether a text element is being edited in place.
    #[must_use]
    pub fn is_editing_text(&self) -> bool {
        self.flags.editing_text.is_some()
    }

    /// Canvas origin in viewport coordinates.
    #[must_use]
    pub fn canvas_origin(&self) -> Point {
        self.canvas_origin
    }

    /// Record where the canvas sits in the viewport (after layout or scroll).
    pub fn set_canvas_origin(&mut self, origin: Point) {
        self.canvas_origin = origin;
    }

    /// Convert a viewport position to canvas coordinates.
    #[must_use]
    pub fn to_canvas(&self, pointer: Point) -> Point {
        pointer.sub(self.canvas_origin)
    }

    /// Hit-test a viewport position, marking presses on the element being
    /// edited as [`HitRegion::EditableText`].
    #[must_use]
    pub fn locate(&self, store: &DocumentStore, pointer: Point, metrics: &dyn TextMetrics) -> Option<Hit> {
        let mut hit = hit_test(store.document(), store.canvas(), self.to_canvas(pointer), metrics)?;
        if self.flags.editing_text.as_ref() == Some(&hit.element) {
            hit.region = HitRegion::EditableText;
        }
        Some(hit)
    }

    /// Press on an element: select it, and start a drag when the press hit
    /// the container and no text edit is active.
    pub fn pointer_down(&mut self, store: &mut DocumentStore, pointer: Point, hit: Hit) {
        let Some(start) = store.element(&hit.element).map(Element::position) else {
            tracing::debug!("Ignoring press on missing element {}", hit.element);
            return;
        };
        store.select(Some(hit.element.clone()));
        self.mailbox.clear();

        if hit.region == HitRegion::Container && !self.is_editing_text() {
            let offset = self.to_canvas(pointer).sub(hit.bounds.origin());
            tracing::debug!("Drag start on {} with offset {offset:?}", hit.element);
            self.state = InteractionState::Dragging(DragSession {
                element: hit.element,
                offset,
                start,
            });
        } else {
            self.state = InteractionState::Selecting {
                element: hit.element,
            };
        }
    }

    /// Post a pointer move. Only drags react; the update lands on the next
    /// [`flush_frame`](Self::flush_frame).
    ///
    /// Returns whether the move was accepted.
    pub fn pointer_move(&mut self, pointer: Point) -> bool {
        if matches!(self.state, InteractionState::Dragging(_)) {
            self.mailbox.post(pointer);
            true
        } else {
            false
        }
    }

    /// Apply the pending drag position, if any.
    ///
    /// Returns whether the store was updated.
    pub fn flush_frame(&mut self, store: &mut DocumentStore) -> bool {
        let Some(pointer) = self.mailbox.take() else {
            return false;
        };
        let InteractionState::Dragging(drag) = &self.state else {
            return false;
        };

        let position = drag_position(pointer, self.canvas_origin, drag.offset, store.canvas());
        if store
            .update_element(&drag.element, &ElementPatch::position(position))
            .is_err()
        {
            tracing::debug!("Dragged element {} disappeared, ending drag", drag.element);
            self.state = InteractionState::Idle;
            return false;
        }
        true
    }

    /// Release the pointer. A pending move is applied first so the last
    /// position stands.
    pub fn pointer_up(&mut self, store: &mut DocumentStore) {
        self.end_press(store);
    }

    /// Pointer left the canvas; same as a release.
    pub fn pointer_leave(&mut self, store: &mut DocumentStore) {
        self.end_press(store);
    }

    /// Click on the canvas background: clear the selection unless a text
    /// edit is active.
    ///
    /// Returns whether the selection was cleared.
    pub fn background_click(&mut self, store: &mut DocumentStore) -> bool {
        if self.is_editing_text() {
            return false;
        }
        store.select(None);
        self.state = InteractionState::Idle;
        true
    }

    /// Keyboard shortcut on the selection. Keys go to the text field while
    /// an element is edited in place.
    ///
    /// Returns whether the document changed.
    pub fn key_down(&mut self, store: &mut DocumentStore, input: &KeyInput) -> bool {
        if input.text_input_focused || self.is_editing_text() {
            return false;
        }
        let Some(element) = store.selected_element() else {
            return false;
        };
        let id = element.id.clone();

        match &input.key {
            Key::Delete => store.delete_element(&id),
            key => {
                let Some(direction) = key.direction() else {
                    return false;
                };
                let step = if input.modifiers.shift {
                    NUDGE_STEP_LARGE
                } else {
                    NUDGE_STEP
                };
                let canvas = store.canvas();
                let mut patch = ElementPatch::default();
                if direction.x.abs() > f32::EPSILON {
                    patch.x = Some(clamp_axis(element.x + direction.x * step, canvas.width));
                }
                if direction.y.abs() > f32::EPSILON {
                    patch.y = Some(clamp_axis(element.y + direction.y * step, canvas.height));
                }
                store.update_element(&id, &patch).is_ok()
            }
        }
    }

    /// Enter in-place editing for a text element.
    ///
    /// Returns `false` if the element is missing or not text.
    pub fn begin_text_edit(&mut self, store: &mut DocumentStore, id: &ElementId) -> bool {
        if !matches!(store.element(id).map(|e| &e.kind), Some(ElementKind::Text { .. })) {
            return false;
        }
        store.select(Some(id.clone()));
        self.mailbox.clear();
        self.state = InteractionState::Selecting { element: id.clone() };
        self.flags.editing_text = Some(id.clone());
        true
    }

    /// Commit edited text and leave edit mode. A commit for an element other
    /// than the one being edited is ignored.
    ///
    /// Returns whether the text was stored.
    pub fn commit_text_edit(&mut self, store: &mut DocumentStore, id: &ElementId, text: &str) -> bool {
        if self.flags.editing_text.as_ref() != Some(id) {
            tracing::debug!("Ignoring text commit for {id}, not in edit mode");
            return false;
        }
        self.flags.editing_text = None;
        match store.update_element(id, &ElementPatch::content(text)) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!("Dropping text edit: {err}");
                false
            }
        }
    }

    /// Replace the document (after a load) and reset all pointer state.
    pub fn hydrate(&mut self, store: &mut DocumentStore, document: Document) {
        store.hydrate(document);
        self.state = InteractionState::Idle;
        self.mailbox.clear();
        self.flags.editing_text = None;
    }

    /// Dispatch an input event.
    ///
    /// Returns whether the event was consumed.
    pub fn handle(&mut self, store: &mut DocumentStore, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { position, hit } => {
                self.pointer_down(store, *position, hit.clone());
                true
            }
            InputEvent::PointerMove { position } => self.pointer_move(*position),
            InputEvent::PointerUp => {
                self.pointer_up(store);
                true
            }
            InputEvent::PointerLeave => {
                self.pointer_leave(store);
                true
            }
            InputEvent::BackgroundClick => self.background_click(store),
            InputEvent::DoubleClick { element } => self.begin_text_edit(store, element),
            InputEvent::Blur { element, text } => self.commit_text_edit(store, element, text),
            InputEvent::Key(input) => self.key_down(store, input),
            InputEvent::Frame => self.flush_frame(store),
        }
    }

    fn end_press(&mut self, store: &mut DocumentStore) {
        self.flush_frame(store);
        self.mailbox.clear();
        if let InteractionState::Dragging(drag) = &self.state {
            tracing::debug!("Drag end on {}", drag.element);
        }
        self.state = InteractionState::Idle;
    }
}

/// Topmost element under `point` (canvas coordinates), using the same
/// geometry as the compositor.
#[must_use]
pub fn hit_test(document: &Document, canvas: CanvasSize, point: Point, metrics: &dyn TextMetrics) -> Option<Hit> {
    compose(document, canvas, metrics).hit_test(point)
}

/// Apply a finished upload as one patch.
///
/// Returns `false` and discards the image if the element was deleted or is no
/// longer an image, or if another document was loaded in the meantime.
pub fn complete_image_upload(store: &mut DocumentStore, ticket: &UploadTicket, image: DecodedImage) -> bool {
    let id = ticket.element();
    if !ticket.matches_document(store) {
        tracing::warn!("Discarding upload for {id}: document was replaced");
        return false;
    }
    if !matches!(store.element(id).map(|e| &e.kind), Some(ElementKind::Image { .. })) {
        tracing::warn!("Discarding upload for missing image element {id}");
        return false;
    }
    let (width, height) = image.capped_size();
    let patch = ElementPatch {
        content: Some(image.reference),
        width: Some(width),
        height: Some(height),
        ..ElementPatch::default()
    };
    store.update_element(id, &patch).is_ok()
}
