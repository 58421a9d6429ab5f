//! Default geometry for entities without a stored override. Flowcharts get a
//! directional layered layout, sequence diagrams a lane layout; overrides
//! from the `PositionStore` always win.

mod flowchart;
mod sequence;

use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::geometry::Rect;
use crate::ir::Diagram;
use crate::store::PositionStore;
use crate::theme::Theme;

/// Computed vertical slot for a sequence message; the horizontal span always
/// follows the participants' current positions.
#[derive(Debug, Clone, Copy)]
pub struct MessageSlot {
    pub ordinal: usize,
    pub y: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct NoteSlot {
    pub ordinal: usize,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy)]
pub struct TitleSlot {
    /// Center of the participant span.
    pub x: f32,
    pub y: f32,
}

/// Resolved geometry for one parse: flowchart node rects or sequence
/// participant header rects keyed by id, plus the sequence-only slots.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub nodes: BTreeMap<String, Rect>,
    pub messages: Vec<MessageSlot>,
    pub notes: Vec<NoteSlot>,
    pub title: Option<TitleSlot>,
}

/// Needs `&mut` store: under `layout: fixed` every node must end up with an
/// override, so computed fallbacks are persisted as if user-set.
pub fn compute_layout(
    diagram: &Diagram,
    store: &mut PositionStore,
    theme: &Theme,
    config: &LayoutConfig,
) -> Layout {
    match diagram {
        Diagram::Flowchart(f) => flowchart::compute(f, store, theme, config),
        Diagram::Sequence(s) => sequence::compute(s, store, theme, config),
    }
}
