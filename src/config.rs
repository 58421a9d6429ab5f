use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub default_width: f32,
    pub default_height: f32,
    pub min_width: f32,
    pub min_height: f32,
    /// Interactive resize clamp, both axes.
    pub min_size: f32,
    pub label_padding: f32,
    pub handle_radius: f32,
    pub grid: f32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            default_width: 160.0,
            default_height: 60.0,
            min_width: 80.0,
            min_height: 48.0,
            min_size: 50.0,
            label_padding: 16.0,
            handle_radius: 6.0,
            grid: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Half-width of the expanded click zone around the drawn path.
    pub click_tolerance: f32,
    pub arrow_length: f32,
    pub arrow_half_width: f32,
    /// Seed distance of default Bézier controls along the chord.
    pub control_along: f32,
    pub control_normal: f32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            click_tolerance: 8.0,
            arrow_length: 14.0,
            arrow_half_width: 6.0,
            control_along: 40.0,
            control_normal: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowchartConfig {
    /// Horizontal step between layout slots.
    pub spacing_x: f32,
    /// Vertical step between layout slots.
    pub spacing_y: f32,
}

impl Default for FlowchartConfig {
    fn default() -> Self {
        Self {
            spacing_x: 220.0,
            spacing_y: 120.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceConfig {
    pub participant_spacing: f32,
    pub participant_width: f32,
    pub header_height: f32,
    pub lifeline_height: f32,
    /// Vertical ordinate of the first message.
    pub message_base_y: f32,
    pub message_step_y: f32,
    /// Gap between the last message and the first note.
    pub note_gap: f32,
    pub note_step_y: f32,
    pub note_height: f32,
    pub note_padding_x: f32,
    pub title_y: f32,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            participant_spacing: 220.0,
            participant_width: 140.0,
            header_height: 42.0,
            lifeline_height: 1000.0,
            message_base_y: 120.0,
            message_step_y: 70.0,
            note_gap: 50.0,
            note_step_y: 80.0,
            note_height: 40.0,
            note_padding_x: 12.0,
            title_y: 8.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node: NodeConfig,
    pub edge: EdgeConfig,
    pub flowchart: FlowchartConfig,
    pub sequence: SequenceConfig,
}
