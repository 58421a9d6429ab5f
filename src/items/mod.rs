//! Headless interactive scene items. Each item owns its current geometry and
//! interaction state; pointer gestures mutate items and report the override
//! the engine should persist on release.

mod edge;
mod node;
mod sequence;

pub use edge::{EdgeHandle, EdgeItem};
pub use node::{NodeItem, NodeStyle, ResizeHandle};
pub use sequence::{MessageItem, NoteItem, ParticipantItem, TitleItem};

use crate::geometry::Point;

/// Pointer button, scene-level abstraction over whatever windowing shell
/// drives the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// One pointer event in scene coordinates.
#[derive(Debug, Clone, Copy)]
pub enum GestureEvent {
    Press {
        position: Point,
        button: PointerButton,
        extend_selection: bool,
    },
    Move {
        position: Point,
    },
    Release {
        position: Point,
    },
}
