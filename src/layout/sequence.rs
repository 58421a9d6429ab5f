use crate::config::LayoutConfig;
use crate::geometry::Rect;
use crate::ir::SequenceDiagram;
use crate::store::PositionStore;
use crate::text_metrics;
use crate::theme::Theme;

use super::{Layout, MessageSlot, NoteSlot, TitleSlot};

pub(super) fn compute(
    diagram: &SequenceDiagram,
    store: &mut PositionStore,
    theme: &Theme,
    config: &LayoutConfig,
) -> Layout {
    let seq = &config.sequence;
    let mut layout = Layout::default();

    // Lane header row: declaration order left to right, advance proportional
    // to the label so wide names do not collide. An X override pins the lane
    // where the user dragged it without disturbing the computed grid.
    let mut cursor_x = 0.0f32;
    for participant in &diagram.participants {
        let extent = text_metrics::measure_label(&participant.label, theme);
        let width = (extent.width + theme.font_size * 2.0).max(seq.participant_width);
        let computed_x = cursor_x;
        cursor_x += width.max(seq.participant_spacing - 40.0) + 40.0;

        let (x, width) = match store.node_override(&participant.id) {
            Some(saved) => (saved.x, saved.width.max(1.0)),
            None => (computed_x, width),
        };
        layout.nodes.insert(
            participant.id.clone(),
            Rect::new(x, 0.0, width, seq.header_height),
        );
    }

    for (ordinal, _message) in diagram.messages.iter().enumerate() {
        layout.messages.push(MessageSlot {
            ordinal,
            y: seq.message_base_y + ordinal as f32 * seq.message_step_y,
        });
    }

    // Notes sit below the message block, each centered over the arithmetic
    // middle of its spanned participants.
    let notes_start =
        seq.message_base_y + diagram.messages.len() as f32 * seq.message_step_y + seq.note_gap;
    for (ordinal, note) in diagram.notes.iter().enumerate() {
        let centers: Vec<f32> = note
            .participants
            .iter()
            .filter_map(|id| layout.nodes.get(id))
            .map(|rect| rect.center().x)
            .collect();
        if centers.is_empty() {
            continue;
        }
        let min = centers.iter().copied().fold(f32::INFINITY, f32::min);
        let max = centers.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let center = (min + max) / 2.0;
        let extent = text_metrics::measure_label(&note.text, theme);
        let width = (extent.width + seq.note_padding_x * 2.0)
            .max(max - min + 40.0)
            .max(80.0);
        layout.notes.push(NoteSlot {
            ordinal,
            rect: Rect::new(
                center - width / 2.0,
                notes_start + ordinal as f32 * seq.note_step_y,
                width,
                seq.note_height,
            ),
        });
    }

    if diagram.title.is_some() && !layout.nodes.is_empty() {
        let min = layout
            .nodes
            .values()
            .map(|rect| rect.center().x)
            .fold(f32::INFINITY, f32::min);
        let max = layout
            .nodes
            .values()
            .map(|rect| rect.center().x)
            .fold(f32::NEG_INFINITY, f32::max);
        layout.title = Some(TitleSlot {
            x: (min + max) / 2.0,
            y: seq.title_y,
        });
    }

    layout
}
