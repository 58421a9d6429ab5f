use crate::config::SequenceConfig;
use crate::geometry::{Point, Rect};
use crate::ir::MessageStyle;

/// Lane header plus lifeline. Dragging is horizontal only; the header row is
/// pinned to y = 0.
#[derive(Debug, Clone)]
pub struct ParticipantItem {
    pub id: String,
    pub label: String,
    pub rect: Rect,
    pub selected: bool,
}

impl ParticipantItem {
    pub fn contains(&self, p: Point, config: &SequenceConfig) -> bool {
        self.rect.contains(p) || self.lifeline(config).contains(p)
    }

    /// Thin hit band around the dashed lifeline under the header.
    fn lifeline(&self, config: &SequenceConfig) -> Rect {
        let center_x = self.rect.center().x;
        Rect::new(
            center_x - 4.0,
            self.rect.y + self.rect.height,
            8.0,
            config.lifeline_height,
        )
    }

    pub fn drag_to_x(&mut self, x: f32) {
        self.rect.x = x;
        self.rect.y = 0.0;
    }

    /// Full extent for bounds computation, lifeline included.
    pub fn extent(&self, config: &SequenceConfig) -> Rect {
        Rect::new(
            self.rect.x,
            self.rect.y,
            self.rect.width,
            self.rect.height + config.lifeline_height,
        )
    }
}

#[derive(Debug, Clone)]
pub struct MessageItem {
    pub key: String,
    pub source: String,
    pub target: String,
    pub text: String,
    pub style: MessageStyle,
    pub start: Point,
    pub end: Point,
}

impl MessageItem {
    /// Horizontal arrow between the lifelines at this message's ordinate.
    pub fn refresh(&mut self, source_x: f32, target_x: f32, y: f32) {
        self.start = Point::new(source_x, y);
        self.end = Point::new(target_x, y);
    }

    pub fn extent(&self) -> Rect {
        let x = self.start.x.min(self.end.x);
        let width = (self.end.x - self.start.x).abs().max(1.0);
        Rect::new(x, self.start.y - 14.0, width, 18.0)
    }
}

#[derive(Debug, Clone)]
pub struct NoteItem {
    pub key: String,
    pub text: String,
    pub rect: Rect,
}

#[derive(Debug, Clone)]
pub struct TitleItem {
    pub text: String,
    /// Center of the participant span.
    pub position: Point,
}
