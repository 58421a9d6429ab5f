//! Keyed reconciliation of a parsed diagram into the scene. Existing items
//! are updated in place so interaction handles stay valid across re-parses;
//! only genuinely new or vanished keys create or remove items.

use std::collections::{BTreeMap, HashSet};

use crate::geometry::Point;
use crate::ir::{ClassDef, Diagram, FlowchartDiagram, Node, SequenceDiagram};
use crate::items::{EdgeItem, MessageItem, NodeItem, NoteItem, ParticipantItem, TitleItem};
use crate::layout::Layout;
use crate::scene::{ItemKey, Scene, SceneItem};
use crate::store::PositionStore;
use crate::theme::Theme;

/// Record of one reconciliation pass; an unchanged diagram yields an empty
/// patch.
#[derive(Debug, Default)]
pub struct ScenePatch {
    pub created: Vec<ItemKey>,
    pub updated: Vec<ItemKey>,
    pub removed: Vec<ItemKey>,
}

impl ScenePatch {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

pub fn reconcile(
    scene: &mut Scene,
    diagram: &Diagram,
    layout: &Layout,
    store: &PositionStore,
    theme: &Theme,
) -> ScenePatch {
    let mut patch = ScenePatch::default();

    if scene.mode != Some(diagram.mode()) {
        clear_recording(scene, &mut patch);
        scene.mode = Some(diagram.mode());
    }

    match diagram {
        Diagram::Flowchart(f) => reconcile_flowchart(scene, f, layout, store, theme, &mut patch),
        Diagram::Sequence(s) => reconcile_sequence(scene, s, layout, &mut patch),
    }

    patch
}

fn clear_recording(scene: &mut Scene, patch: &mut ScenePatch) {
    patch.removed.extend(scene.keys().cloned());
    scene.clear();
}

fn reconcile_flowchart(
    scene: &mut Scene,
    diagram: &FlowchartDiagram,
    layout: &Layout,
    store: &PositionStore,
    theme: &Theme,
    patch: &mut ScenePatch,
) {
    let mut live: HashSet<ItemKey> = HashSet::new();

    for id in &diagram.order {
        let Some(node) = diagram.nodes.get(id) else {
            continue;
        };
        let Some(&rect) = layout.nodes.get(id) else {
            continue;
        };
        let key = ItemKey::Node(id.clone());
        live.insert(key.clone());
        let style = node_style(node, &diagram.classes, theme);

        match scene.item_by_key_mut(&key) {
            Some(SceneItem::Node(item)) => {
                let mut changed = false;
                if item.label != node.label {
                    item.label = node.label.clone();
                    changed = true;
                }
                if item.class_name != node.class_name {
                    item.class_name = node.class_name.clone();
                    changed = true;
                }
                if item.style != style {
                    item.style = style;
                    changed = true;
                }
                if item.rect != rect {
                    item.rect = rect;
                    changed = true;
                }
                if changed {
                    patch.updated.push(key);
                }
            }
            _ => {
                scene.insert(SceneItem::Node(NodeItem {
                    id: id.clone(),
                    label: node.label.clone(),
                    class_name: node.class_name.clone(),
                    style,
                    rect,
                    selected: false,
                }));
                patch.created.push(key);
            }
        }
    }

    for edge in &diagram.edges {
        let key = ItemKey::Edge(edge.key.clone());
        live.insert(key.clone());
        let desired = store
            .edge_override(&edge.key)
            .cloned()
            .unwrap_or_default();

        match scene.item_by_key_mut(&key) {
            Some(SceneItem::Edge(item)) => {
                if item.as_override() != desired {
                    item.apply_override(&desired);
                    patch.updated.push(key);
                }
            }
            _ => {
                let mut item =
                    EdgeItem::new(&edge.key, &edge.source, &edge.target, &edge.label, edge.kind);
                item.apply_override(&desired);
                scene.insert(SceneItem::Edge(item));
                patch.created.push(key);
            }
        }
    }

    let stale: Vec<ItemKey> = scene.keys().filter(|k| !live.contains(*k)).cloned().collect();
    for key in stale {
        scene.remove(&key);
        patch.removed.push(key);
    }

    // Endpoint geometry is derived from the node rects, refreshed every pass
    // without counting as a mutation.
    let rects = layout.nodes.clone();
    for item in scene.iter_mut() {
        if let SceneItem::Edge(edge) = item
            && let (Some(&source), Some(&target)) = (rects.get(&edge.source), rects.get(&edge.target))
        {
            edge.refresh(source, target);
        }
    }
}

fn reconcile_sequence(
    scene: &mut Scene,
    diagram: &SequenceDiagram,
    layout: &Layout,
    patch: &mut ScenePatch,
) {
    let signature: Vec<String> = diagram.participants.iter().map(|p| p.id.clone()).collect();
    if scene.participant_signature != signature {
        // A changed lane set invalidates every message and note span; start
        // over rather than patching geometry piecemeal.
        if !scene.is_empty() {
            clear_recording(scene, patch);
            scene.mode = Some(crate::ir::DiagramMode::Sequence);
        }
        scene.participant_signature = signature;
    }

    let mut live: HashSet<ItemKey> = HashSet::new();

    for participant in &diagram.participants {
        let Some(&rect) = layout.nodes.get(&participant.id) else {
            continue;
        };
        let key = ItemKey::Participant(participant.id.clone());
        live.insert(key.clone());
        match scene.item_by_key_mut(&key) {
            Some(SceneItem::Participant(item)) => {
                let mut changed = false;
                if item.label != participant.label {
                    item.label = participant.label.clone();
                    changed = true;
                }
                if item.rect != rect {
                    item.rect = rect;
                    changed = true;
                }
                if changed {
                    patch.updated.push(key);
                }
            }
            _ => {
                scene.insert(SceneItem::Participant(ParticipantItem {
                    id: participant.id.clone(),
                    label: participant.label.clone(),
                    rect,
                    selected: false,
                }));
                patch.created.push(key);
            }
        }
    }

    for (ordinal, message) in diagram.messages.iter().enumerate() {
        let key_string = format!(
            "{ordinal}|{}|{}|{}|{}",
            message.source,
            message.target,
            message.text,
            message.style.as_str()
        );
        let key = ItemKey::Message(key_string.clone());
        live.insert(key.clone());
        if scene.item_by_key(&key).is_none() {
            scene.insert(SceneItem::Message(MessageItem {
                key: key_string,
                source: message.source.clone(),
                target: message.target.clone(),
                text: message.text.clone(),
                style: message.style,
                start: Point::default(),
                end: Point::default(),
            }));
            patch.created.push(key);
        }
    }

    for slot in &layout.notes {
        let Some(note) = diagram.notes.get(slot.ordinal) else {
            continue;
        };
        // Span order is presentation-free, so the key sorts it: flipping
        // `over A,B` to `over B,A` recycles the same item.
        let mut span: Vec<&str> = note.participants.iter().map(String::as_str).collect();
        span.sort_unstable();
        let key_string = format!("{}|{}|{}", slot.ordinal, span.join("&"), note.text);
        let key = ItemKey::Note(key_string.clone());
        live.insert(key.clone());
        match scene.item_by_key_mut(&key) {
            Some(SceneItem::Note(item)) => {
                if item.rect != slot.rect {
                    item.rect = slot.rect;
                    patch.updated.push(key);
                }
            }
            _ => {
                scene.insert(SceneItem::Note(NoteItem {
                    key: key_string,
                    text: note.text.clone(),
                    rect: slot.rect,
                }));
                patch.created.push(key);
            }
        }
    }

    if let (Some(title), Some(slot)) = (&diagram.title, layout.title) {
        let key = ItemKey::Title;
        live.insert(key.clone());
        let position = Point::new(slot.x, slot.y);
        match scene.item_by_key_mut(&key) {
            Some(SceneItem::Title(item)) => {
                let mut changed = false;
                if item.text != *title {
                    item.text = title.clone();
                    changed = true;
                }
                if item.position != position {
                    item.position = position;
                    changed = true;
                }
                if changed {
                    patch.updated.push(key);
                }
            }
            _ => {
                scene.insert(SceneItem::Title(TitleItem {
                    text: title.clone(),
                    position,
                }));
                patch.created.push(key);
            }
        }
    }

    let stale: Vec<ItemKey> = scene.keys().filter(|k| !live.contains(*k)).cloned().collect();
    for key in stale {
        scene.remove(&key);
        patch.removed.push(key);
    }

    // Message arrows track the lanes' current centers and their layout slot.
    let centers: BTreeMap<String, f32> = layout
        .nodes
        .iter()
        .map(|(id, rect)| (id.clone(), rect.center().x))
        .collect();
    let slots: BTreeMap<usize, f32> = layout.messages.iter().map(|m| (m.ordinal, m.y)).collect();
    for item in scene.iter_mut() {
        if let SceneItem::Message(message) = item {
            let ordinal: usize = message
                .key
                .split('|')
                .next()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            if let (Some(&sx), Some(&tx), Some(&y)) = (
                centers.get(&message.source),
                centers.get(&message.target),
                slots.get(&ordinal),
            ) {
                message.refresh(sx, tx, y);
            }
        }
    }
}

fn node_style(node: &Node, classes: &BTreeMap<String, ClassDef>, theme: &Theme) -> crate::items::NodeStyle {
    let class = node.class_name.as_deref().and_then(|name| classes.get(name));
    crate::items::NodeStyle {
        fill: class
            .and_then(|c| c.fill.clone())
            .unwrap_or_else(|| theme.node_fill.clone()),
        stroke: class
            .and_then(|c| c.stroke.clone())
            .unwrap_or_else(|| theme.node_border.clone()),
        stroke_width: class.and_then(|c| c.stroke_width).unwrap_or(2.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::compute_layout;
    use crate::parser::parse_diagram;

    fn scratch_store() -> PositionStore {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "manodiag-renderer-{}-{n}.json",
            std::process::id()
        ));
        PositionStore::open(path)
    }

    fn render_into(scene: &mut Scene, text: &str, store: &mut PositionStore) -> ScenePatch {
        let theme = Theme::classic();
        let config = LayoutConfig::default();
        let diagram = parse_diagram(text).unwrap();
        let layout = compute_layout(&diagram, store, &theme, &config);
        reconcile(scene, &diagram, &layout, store, &theme)
    }

    #[test]
    fn first_pass_creates_everything() {
        let mut scene = Scene::default();
        let mut store = scratch_store();
        let patch = render_into(&mut scene, "flowchart TD\nA[Start] --> B[End]", &mut store);
        assert_eq!(patch.created.len(), 3);
        assert!(patch.updated.is_empty());
        assert!(patch.removed.is_empty());
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn identical_repass_is_a_no_op() {
        let mut scene = Scene::default();
        let mut store = scratch_store();
        let text = "flowchart TD\nA[Start] --> B[End]\nB --> C";
        render_into(&mut scene, text, &mut store);
        let patch = render_into(&mut scene, text, &mut store);
        assert!(patch.is_empty());
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn label_change_updates_in_place() {
        let mut scene = Scene::default();
        let mut store = scratch_store();
        render_into(&mut scene, "flowchart TD\nA[One] --> B", &mut store);
        let id = scene.id_of(&ItemKey::Node("A".to_string())).unwrap();
        let patch = render_into(&mut scene, "flowchart TD\nA[Two] --> B", &mut store);
        assert!(patch.updated.contains(&ItemKey::Node("A".to_string())));
        assert_eq!(scene.id_of(&ItemKey::Node("A".to_string())), Some(id));
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn vanished_node_is_removed() {
        let mut scene = Scene::default();
        let mut store = scratch_store();
        render_into(&mut scene, "flowchart TD\nA --> B\nB --> C", &mut store);
        let patch = render_into(&mut scene, "flowchart TD\nA --> B", &mut store);
        assert!(patch.removed.contains(&ItemKey::Node("C".to_string())));
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn mode_switch_clears_scene() {
        let mut scene = Scene::default();
        let mut store = scratch_store();
        render_into(&mut scene, "flowchart TD\nA --> B", &mut store);
        let patch = render_into(&mut scene, "sequence\nX ->> Y: hi", &mut store);
        assert!(patch.removed.contains(&ItemKey::Node("A".to_string())));
        assert!(scene.id_of(&ItemKey::Node("A".to_string())).is_none());
        assert!(scene.id_of(&ItemKey::Participant("X".to_string())).is_some());
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn participant_set_change_rebuilds_sequence_scene() {
        let mut scene = Scene::default();
        let mut store = scratch_store();
        render_into(&mut scene, "sequence\nA ->> B: hi", &mut store);
        let before = scene.id_of(&ItemKey::Participant("A".to_string())).unwrap();
        render_into(&mut scene, "sequence\nA ->> B: hi\nB ->> C: yo", &mut store);
        let after = scene.id_of(&ItemKey::Participant("A".to_string())).unwrap();
        assert_ne!(before, after);
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn flipped_note_span_recycles_the_item() {
        let mut scene = Scene::default();
        let mut store = scratch_store();
        render_into(
            &mut scene,
            "sequence\nparticipant A\nparticipant B\nnote over A,B: mid",
            &mut store,
        );
        let id = scene.id_of(&ItemKey::Note("0|A&B|mid".to_string())).unwrap();

        let patch = render_into(
            &mut scene,
            "sequence\nparticipant A\nparticipant B\nnote over B,A: mid",
            &mut store,
        );
        assert!(patch.created.is_empty());
        assert!(patch.removed.is_empty());
        assert_eq!(scene.id_of(&ItemKey::Note("0|A&B|mid".to_string())), Some(id));
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn class_style_applies_to_node() {
        let mut scene = Scene::default();
        let mut store = scratch_store();
        render_into(
            &mut scene,
            "flowchart TD\nclassDef hot fill:#FF0000,stroke:#880000\nA[Hot]:::hot --> B",
            &mut store,
        );
        match scene.item_by_key(&ItemKey::Node("A".to_string())).unwrap() {
            SceneItem::Node(node) => {
                assert_eq!(node.style.fill, "#FF0000");
                assert_eq!(node.style.stroke, "#880000");
            }
            _ => panic!("expected node"),
        }
        let _ = std::fs::remove_file(store.path());
    }
}
