use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub title_font_size: f32,
    pub node_fill: String,
    pub node_border: String,
    pub node_text_color: String,
    pub line_color: String,
    pub selection_color: String,
    pub anchor_handle_color: String,
    pub control_handle_color: String,
    pub participant_fill: String,
    pub participant_border: String,
    pub note_fill: String,
    pub note_border: String,
    pub background: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "Segoe UI, system-ui, sans-serif".to_string(),
            font_size: 13.0,
            title_font_size: 18.0,
            node_fill: "#DCDDFF".to_string(),
            node_border: "#6464C8".to_string(),
            node_text_color: "#2C3E50".to_string(),
            line_color: "#34495E".to_string(),
            selection_color: "#E74C3C".to_string(),
            anchor_handle_color: "#2ECC71".to_string(),
            control_handle_color: "#3498DB".to_string(),
            participant_fill: "#F0F6FF".to_string(),
            participant_border: "#1D5FA2".to_string(),
            note_fill: "#FFF8DC".to_string(),
            note_border: "#C9B458".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
