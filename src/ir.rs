use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    TopDown,
    BottomUp,
    LeftRight,
    RightLeft,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "TD" | "TB" => Some(Self::TopDown),
            "BT" => Some(Self::BottomUp),
            "LR" => Some(Self::LeftRight),
            "RL" => Some(Self::RightLeft),
            _ => None,
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Self::LeftRight | Self::RightLeft)
    }
}

impl Default for Direction {
    fn default() -> Self {
        Self::TopDown
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Arrow,
    Bidirectional,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arrow => "arrow",
            Self::Bidirectional => "bidirectional",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub label: String,
    pub kind: EdgeKind,
    /// Persistence identity: `source|target|label|kind`, disambiguated by the
    /// parser when the same tuple occurs twice in one diagram.
    pub key: String,
}

impl Edge {
    pub fn new(source: &str, target: &str, label: &str, kind: EdgeKind) -> Self {
        let key = Self::compose_key(source, target, label, kind);
        Self {
            source: source.to_string(),
            target: target.to_string(),
            label: label.to_string(),
            kind,
            key,
        }
    }

    pub fn compose_key(source: &str, target: &str, label: &str, kind: EdgeKind) -> String {
        format!("{source}|{target}|{label}|{}", kind.as_str())
    }
}

/// `classDef` style attributes. Unknown attributes are carried through in
/// `extra` so future style keys round-trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassDef {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f32>,
    pub extra: BTreeMap<String, String>,
}

/// Front-matter configuration block. Unknown keys are kept but ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramConfig {
    pub layout_fixed: bool,
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowchartDiagram {
    pub direction: Direction,
    pub nodes: BTreeMap<String, Node>,
    /// Declaration order of node ids, used by the automatic layout.
    pub order: Vec<String>,
    pub edges: Vec<Edge>,
    pub classes: BTreeMap<String, ClassDef>,
    pub config: DiagramConfig,
}

impl FlowchartDiagram {
    /// First declaration wins for the label; later mentions merge. Edges use
    /// this to auto-declare endpoints they reference with an empty label.
    pub fn ensure_node(&mut self, id: &str, label: Option<&str>) {
        if let Some(existing) = self.nodes.get_mut(id) {
            if existing.label.is_empty()
                && let Some(label) = label
            {
                existing.label = label.to_string();
            }
            return;
        }
        self.nodes.insert(
            id.to_string(),
            Node {
                id: id.to_string(),
                label: label.unwrap_or_default().to_string(),
                class_name: None,
            },
        );
        self.order.push(id.to_string());
    }

    pub fn assign_class(&mut self, id: &str, class_name: &str) {
        self.ensure_node(id, None);
        if let Some(node) = self.nodes.get_mut(id) {
            node.class_name = Some(class_name.to_string());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStyle {
    Solid,
    Dashed,
    Async,
}

impl MessageStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Dashed => "dashed",
            Self::Async => "async",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub source: String,
    pub target: String,
    pub text: String,
    pub style: MessageStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub participants: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceDiagram {
    pub title: Option<String>,
    pub participants: Vec<Participant>,
    pub messages: Vec<Message>,
    pub notes: Vec<Note>,
    pub config: DiagramConfig,
}

impl SequenceDiagram {
    pub fn ensure_participant(&mut self, id: &str, label: Option<&str>) {
        if let Some(existing) = self.participants.iter_mut().find(|p| p.id == id) {
            if let Some(label) = label {
                existing.label = label.to_string();
            }
            return;
        }
        self.participants.push(Participant {
            id: id.to_string(),
            label: label.unwrap_or(id).to_string(),
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramMode {
    Flowchart,
    Sequence,
}

/// One parse produces one immutable `Diagram`; the engine rebuilds it
/// wholesale on every text change.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagram {
    Flowchart(FlowchartDiagram),
    Sequence(SequenceDiagram),
}

impl Diagram {
    pub fn mode(&self) -> DiagramMode {
        match self {
            Self::Flowchart(_) => DiagramMode::Flowchart,
            Self::Sequence(_) => DiagramMode::Sequence,
        }
    }

    pub fn config(&self) -> &DiagramConfig {
        match self {
            Self::Flowchart(f) => &f.config,
            Self::Sequence(s) => &s.config,
        }
    }
}
