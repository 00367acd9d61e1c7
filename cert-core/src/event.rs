//! Input events for canvas interaction.
//!
//! Pointer positions are viewport coordinates; the interaction controller
//! subtracts the canvas origin to get document coordinates.

use serde::{Deserialize, Serialize};

use crate::element::ElementId;
use crate::geometry::{Point, Rect};

/// Part of an element that received a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitRegion {
    /// The element's container box; presses here may start a drag.
    Container,
    /// Inside an actively edited text field; never starts a drag.
    EditableText,
}

/// Result of hit-testing a press against the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Element under the pointer.
    pub element: ElementId,
    /// Element bounding box in document coordinates.
    pub bounds: Rect,
    /// Which region was pressed.
    pub region: HitRegion,
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    /// Up arrow.
    ArrowUp,
    /// Down arrow.
    ArrowDown,
    /// Left arrow.
    ArrowLeft,
    /// Right arrow.
    ArrowRight,
    /// Delete key.
    Delete,
    /// Backspace key.
    Backspace,
    /// Anything else, by name.
    Other(String),
}

impl Key {
    /// Map a DOM-style key name (`"ArrowUp"`, `"Delete"`, ...) to a key.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "Delete" => Self::Delete,
            "Backspace" => Self::Backspace,
            other => Self::Other(other.to_string()),
        }
    }

    /// Unit direction for arrow keys.
    #[must_use]
    pub fn direction(&self) -> Option<Point> {
        match self {
            Self::ArrowUp => Some(Point::new(0.0, -1.0)),
            Self::ArrowDown => Some(Point::new(0.0, 1.0)),
            Self::ArrowLeft => Some(Point::new(-1.0, 0.0)),
            Self::ArrowRight => Some(Point::new(1.0, 0.0)),
            _ => None,
        }
    }
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct KeyModifiers {
    /// Shift key pressed.
    pub shift: bool,
    /// Control key pressed.
    pub ctrl: bool,
    /// Alt/Option key pressed.
    pub alt: bool,
    /// Meta/Command key pressed.
    pub meta: bool,
}

/// A key press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    /// The key.
    pub key: Key,
    /// Active modifiers.
    pub modifiers: KeyModifiers,
    /// Whether a text field currently has input focus.
    pub text_input_focused: bool,
}

impl KeyInput {
    /// A key press without modifiers or focused inputs.
    #[must_use]
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::default(),
            text_input_focused: false,
        }
    }

    /// A key press with shift held.
    #[must_use]
    pub fn shifted(key: Key) -> Self {
        Self {
            modifiers: KeyModifiers {
                shift: true,
                ..KeyModifiers::default()
            },
            ..Self::plain(key)
        }
    }
}

/// All input events the editor can receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InputEvent {
    /// Pointer pressed on an element.
    PointerDown {
        /// Pointer position (viewport).
        position: Point,
        /// What was pressed.
        hit: Hit,
    },
    /// Pointer moved over the canvas.
    PointerMove {
        /// Pointer position (viewport).
        position: Point,
    },
    /// Pointer released.
    PointerUp,
    /// Pointer left the canvas.
    PointerLeave,
    /// Click on the bare canvas background.
    BackgroundClick,
    /// Double click on a text element's content.
    DoubleClick {
        /// Element that was double clicked.
        element: ElementId,
    },
    /// An edited text field lost focus.
    Blur {
        /// Element being edited.
        element: ElementId,
        /// Final text of the field.
        text: String,
    },
    /// Key pressed.
    Key(KeyInput),
    /// A rendering tick; applies the pending pointer move.
    Frame,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_name() {
        assert_eq!(Key::from_name("ArrowLeft"), Key::ArrowLeft);
        assert_eq!(Key::from_name("Delete"), Key::Delete);
        assert_eq!(Key::from_name("a"), Key::Other("a".to_string()));
    }

    #[test]
    fn test_direction() {
        assert_eq!(Key::ArrowRight.direction(), Some(Point::new(1.0, 0.0)));
        assert_eq!(Key::Delete.direction(), None);
    }

    #[test]
    fn test_event_serde_tag() {
        let event = InputEvent::PointerMove {
            position: Point::new(1.0, 2.0),
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "PointerMove");
        assert_eq!(json["data"]["position"]["x"], 1.0);
    }
}
