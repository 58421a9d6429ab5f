//! Orchestration: text in, scene out, gestures in between. The engine owns
//! the parsed diagram and the scene; the caller owns the store and the event
//! loop. Persistence failures during interaction are swallowed, the scene
//! stays usable either way.

use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::geometry::{Point, Rect};
use crate::ir::Diagram;
use crate::items::{EdgeHandle, GestureEvent, PointerButton, ResizeHandle};
use crate::layout::compute_layout;
use crate::parser::parse_diagram;
use crate::renderer::{self, ScenePatch};
use crate::scene::{ItemId, Scene, SceneItem};
use crate::store::PositionStore;
use crate::text_metrics;
use crate::theme::Theme;

#[derive(Debug)]
enum Gesture {
    Idle,
    DragNodes { last: Point, ids: Vec<ItemId> },
    ResizeNode { id: ItemId, handle: ResizeHandle, last: Point },
    DragEdgeHandle { id: ItemId, handle: EdgeHandle },
    DragParticipant { id: ItemId, grab_dx: f32 },
}

pub struct DiagramEngine {
    theme: Theme,
    config: LayoutConfig,
    diagram: Option<Diagram>,
    scene: Scene,
    gesture: Gesture,
    last_text: String,
}

impl Default for DiagramEngine {
    fn default() -> Self {
        Self::new(Theme::classic(), LayoutConfig::default())
    }
}

impl DiagramEngine {
    pub fn new(theme: Theme, config: LayoutConfig) -> Self {
        Self {
            theme,
            config,
            diagram: None,
            scene: Scene::default(),
            gesture: Gesture::Idle,
            last_text: String::new(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn diagram(&self) -> Option<&Diagram> {
        self.diagram.as_ref()
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn last_text(&self) -> &str {
        &self.last_text
    }

    /// Full pipeline for one text state: parse, lay out, reconcile. Called on
    /// every editor change; an unchanged text yields an empty patch.
    pub fn render(&mut self, text: &str, store: &mut PositionStore) -> ScenePatch {
        self.last_text = text.to_string();
        let Ok(diagram) = parse_diagram(text) else {
            return ScenePatch::default();
        };
        let layout = compute_layout(&diagram, store, &self.theme, &self.config);
        let patch = renderer::reconcile(&mut self.scene, &diagram, &layout, store, &self.theme);
        self.diagram = Some(diagram);
        patch
    }

    pub fn content_bounds(&self) -> Option<Rect> {
        self.scene.content_bounds(&self.config)
    }

    /// Drop every override and re-render the current text at computed
    /// positions.
    pub fn reset_positions(&mut self, store: &mut PositionStore) -> ScenePatch {
        store.clear().ok();
        let text = self.last_text.clone();
        self.render(&text, store)
    }

    /// Size every node to fit its label and snap positions to the grid,
    /// persisting the result as overrides.
    pub fn normalize_layout(&mut self, store: &mut PositionStore) {
        let grid = self.config.node.grid;
        let pad = self.config.node.label_padding;
        let mut writes = Vec::new();
        for item in self.scene.iter_mut() {
            if let SceneItem::Node(node) = item {
                let extent = text_metrics::measure_label(&node.label, &self.theme);
                let width = (extent.width + pad * 2.0).max(self.config.node.min_width);
                let height = (extent.height + pad * 2.0).max(self.config.node.min_height);
                let x = (node.rect.x / grid).round() * grid;
                let y = (node.rect.y / grid).round() * grid;
                node.rect = Rect::new(x, y, width, height);
                writes.push((node.id.clone(), node.rect));
            }
        }
        for (id, rect) in writes {
            store.set_node_override(&id, rect).ok();
        }
        self.refresh_edges();
    }

    pub fn pointer_event(&mut self, event: GestureEvent, store: &mut PositionStore) {
        match event {
            GestureEvent::Press {
                position,
                button,
                extend_selection,
            } => self.press(position, button, extend_selection, store),
            GestureEvent::Move { position } => self.drag(position),
            GestureEvent::Release { position } => self.release(position, store),
        }
    }

    fn press(&mut self, p: Point, button: PointerButton, extend: bool, store: &mut PositionStore) {
        if button == PointerButton::Secondary {
            self.toggle_edge_form(p, store);
            return;
        }

        // Affordances of the current selection come first, then body hits in
        // z-order: nodes, edges, participants.
        if let Some((id, handle)) = self.selected_edge_handle(p) {
            self.gesture = Gesture::DragEdgeHandle { id, handle };
            return;
        }
        if let Some((id, handle)) = self.selected_node_handle(p) {
            self.gesture = Gesture::ResizeNode { id, handle, last: p };
            return;
        }

        if let Some(id) = self.node_at(p) {
            let already_selected =
                matches!(self.scene.get(id), Some(SceneItem::Node(n)) if n.selected);
            if !extend && !already_selected {
                self.clear_selection();
            }
            if let Some(SceneItem::Node(node)) = self.scene.get_mut(id) {
                node.selected = true;
            }
            let ids: Vec<ItemId> = self
                .scene
                .iter()
                .filter_map(|(id, item)| match item {
                    SceneItem::Node(n) if n.selected => Some(id),
                    _ => None,
                })
                .collect();
            self.gesture = Gesture::DragNodes { last: p, ids };
            return;
        }

        if let Some(id) = self.edge_at(p) {
            if !extend {
                self.clear_selection();
            }
            if let Some(SceneItem::Edge(edge)) = self.scene.get_mut(id) {
                edge.selected = true;
            }
            return;
        }

        if let Some(id) = self.participant_at(p) {
            if !extend {
                self.clear_selection();
            }
            let grab_dx = match self.scene.get_mut(id) {
                Some(SceneItem::Participant(participant)) => {
                    participant.selected = true;
                    p.x - participant.rect.x
                }
                _ => 0.0,
            };
            self.gesture = Gesture::DragParticipant { id, grab_dx };
            return;
        }

        self.clear_selection();
    }

    fn drag(&mut self, p: Point) {
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::DragNodes { last, ids } => {
                let (dx, dy) = (p.x - last.x, p.y - last.y);
                *last = p;
                let ids = ids.clone();
                for id in ids {
                    if let Some(SceneItem::Node(node)) = self.scene.get_mut(id) {
                        node.translate(dx, dy);
                    }
                }
                self.refresh_edges();
            }
            Gesture::ResizeNode { id, handle, last } => {
                let (dx, dy) = (p.x - last.x, p.y - last.y);
                *last = p;
                let (id, handle) = (*id, *handle);
                let config = self.config.node.clone();
                if let Some(SceneItem::Node(node)) = self.scene.get_mut(id) {
                    node.resize(handle, dx, dy, &config);
                }
                self.refresh_edges();
            }
            Gesture::DragEdgeHandle { id, handle } => {
                let (id, handle) = (*id, *handle);
                if let Some(SceneItem::Edge(edge)) = self.scene.get_mut(id) {
                    edge.drag_handle(handle, p);
                }
            }
            Gesture::DragParticipant { id, grab_dx } => {
                let (id, grab_dx) = (*id, *grab_dx);
                if let Some(SceneItem::Participant(participant)) = self.scene.get_mut(id) {
                    participant.drag_to_x(p.x - grab_dx);
                }
                self.refresh_messages();
            }
        }
    }

    /// Completed gestures write through to the store; a failed write keeps
    /// the on-screen state and is retried by whichever gesture comes next.
    fn release(&mut self, p: Point, store: &mut PositionStore) {
        self.drag(p);
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Idle => {}
            Gesture::DragNodes { ids, .. } => {
                for id in ids {
                    if let Some(SceneItem::Node(node)) = self.scene.get(id) {
                        store.set_node_override(&node.id, node.rect).ok();
                    }
                }
            }
            Gesture::ResizeNode { id, .. } => {
                if let Some(SceneItem::Node(node)) = self.scene.get(id) {
                    store.set_node_override(&node.id, node.rect).ok();
                }
            }
            Gesture::DragEdgeHandle { id, .. } => {
                if let Some(SceneItem::Edge(edge)) = self.scene.get(id) {
                    store.merge_edge_override(&edge.key, &edge.as_override()).ok();
                }
            }
            Gesture::DragParticipant { id, .. } => {
                if let Some(SceneItem::Participant(participant)) = self.scene.get(id) {
                    store.set_node_override(&participant.id, participant.rect).ok();
                }
            }
        }
    }

    fn toggle_edge_form(&mut self, p: Point, store: &mut PositionStore) {
        let Some(id) = self.edge_at(p) else {
            return;
        };
        let edge_config = self.config.edge.clone();
        if let Some(SceneItem::Edge(edge)) = self.scene.get_mut(id) {
            edge.toggle_bezier(&edge_config);
            let (key, saved) = (edge.key.clone(), edge.as_override());
            store.merge_edge_override(&key, &saved).ok();
        }
    }

    fn selected_edge_handle(&self, p: Point) -> Option<(ItemId, EdgeHandle)> {
        self.scene.iter().find_map(|(id, item)| match item {
            SceneItem::Edge(edge) if edge.selected => {
                edge.handle_at(p, &self.config.edge).map(|h| (id, h))
            }
            _ => None,
        })
    }

    fn selected_node_handle(&self, p: Point) -> Option<(ItemId, ResizeHandle)> {
        self.scene.iter().find_map(|(id, item)| match item {
            SceneItem::Node(node) if node.selected => {
                node.handle_at(p, &self.config.node).map(|h| (id, h))
            }
            _ => None,
        })
    }

    fn node_at(&self, p: Point) -> Option<ItemId> {
        self.scene.iter().find_map(|(id, item)| match item {
            SceneItem::Node(node) if node.contains(p) => Some(id),
            _ => None,
        })
    }

    fn edge_at(&self, p: Point) -> Option<ItemId> {
        self.scene.iter().find_map(|(id, item)| match item {
            SceneItem::Edge(edge) if edge.hit_test(p, &self.config.edge) => Some(id),
            _ => None,
        })
    }

    fn participant_at(&self, p: Point) -> Option<ItemId> {
        self.scene.iter().find_map(|(id, item)| match item {
            SceneItem::Participant(participant)
                if participant.contains(p, &self.config.sequence) =>
            {
                Some(id)
            }
            _ => None,
        })
    }

    fn clear_selection(&mut self) {
        for item in self.scene.iter_mut() {
            match item {
                SceneItem::Node(node) => node.selected = false,
                SceneItem::Edge(edge) => edge.selected = false,
                SceneItem::Participant(participant) => participant.selected = false,
                _ => {}
            }
        }
    }

    fn refresh_edges(&mut self) {
        let rects: HashMap<String, Rect> = self
            .scene
            .iter()
            .filter_map(|(_, item)| match item {
                SceneItem::Node(node) => Some((node.id.clone(), node.rect)),
                _ => None,
            })
            .collect();
        for item in self.scene.iter_mut() {
            if let SceneItem::Edge(edge) = item
                && let (Some(&source), Some(&target)) =
                    (rects.get(&edge.source), rects.get(&edge.target))
            {
                edge.refresh(source, target);
            }
        }
    }

    fn refresh_messages(&mut self) {
        let centers: HashMap<String, f32> = self
            .scene
            .iter()
            .filter_map(|(_, item)| match item {
                SceneItem::Participant(p) => Some((p.id.clone(), p.rect.center().x)),
                _ => None,
            })
            .collect();
        for item in self.scene.iter_mut() {
            if let SceneItem::Message(message) = item
                && let (Some(&sx), Some(&tx)) =
                    (centers.get(&message.source), centers.get(&message.target))
            {
                let y = message.start.y;
                message.refresh(sx, tx, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ItemKey;

    fn scratch_store() -> PositionStore {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "manodiag-engine-{}-{n}.json",
            std::process::id()
        ));
        PositionStore::open(path)
    }

    fn node_rect(engine: &DiagramEngine, id: &str) -> Rect {
        match engine.scene().item_by_key(&ItemKey::Node(id.to_string())) {
            Some(SceneItem::Node(node)) => node.rect,
            _ => panic!("no node {id}"),
        }
    }

    fn press_at(engine: &mut DiagramEngine, store: &mut PositionStore, p: Point) {
        engine.pointer_event(
            GestureEvent::Press {
                position: p,
                button: PointerButton::Primary,
                extend_selection: false,
            },
            store,
        );
    }

    #[test]
    fn drag_persists_node_override() {
        let mut engine = DiagramEngine::default();
        let mut store = scratch_store();
        engine.render("flowchart TD\nA --> B", &mut store);
        let before = node_rect(&engine, "A");
        let grab = before.center();

        press_at(&mut engine, &mut store, grab);
        engine.pointer_event(
            GestureEvent::Move {
                position: Point::new(grab.x + 30.0, grab.y + 40.0),
            },
            &mut store,
        );
        engine.pointer_event(
            GestureEvent::Release {
                position: Point::new(grab.x + 30.0, grab.y + 40.0),
            },
            &mut store,
        );

        let after = node_rect(&engine, "A");
        assert_eq!(after.x, before.x + 30.0);
        assert_eq!(after.y, before.y + 40.0);
        assert_eq!(store.node_override("A"), Some(after));
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn override_survives_rerender() {
        let mut engine = DiagramEngine::default();
        let mut store = scratch_store();
        engine.render("flowchart TD\nA --> B", &mut store);
        let grab = node_rect(&engine, "A").center();
        press_at(&mut engine, &mut store, grab);
        engine.pointer_event(
            GestureEvent::Release {
                position: Point::new(grab.x + 100.0, grab.y),
            },
            &mut store,
        );
        let moved = node_rect(&engine, "A");

        engine.render("flowchart TD\nA --> B\nB --> C", &mut store);
        assert_eq!(node_rect(&engine, "A"), moved);
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn right_click_toggles_edge_to_bezier_and_persists() {
        let mut engine = DiagramEngine::default();
        let mut store = scratch_store();
        engine.render("flowchart TD\nA --> B", &mut store);
        let a = node_rect(&engine, "A");
        let b = node_rect(&engine, "B");
        let midpoint = Point::new(
            (a.center().x + b.center().x) / 2.0,
            (a.center().y + b.center().y) / 2.0,
        );

        engine.pointer_event(
            GestureEvent::Press {
                position: midpoint,
                button: PointerButton::Secondary,
                extend_selection: false,
            },
            &mut store,
        );

        let saved = store.edge_override("A|B||arrow").unwrap();
        assert!(saved.use_bezier);
        assert!(saved.control1.is_some());
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn participant_drag_is_horizontal_only() {
        let mut engine = DiagramEngine::default();
        let mut store = scratch_store();
        engine.render("sequence\nA ->> B: hi", &mut store);
        let rect = match engine.scene().item_by_key(&ItemKey::Participant("B".to_string())) {
            Some(SceneItem::Participant(p)) => p.rect,
            _ => panic!("no participant"),
        };
        let grab = rect.center();

        press_at(&mut engine, &mut store, grab);
        engine.pointer_event(
            GestureEvent::Release {
                position: Point::new(grab.x + 80.0, grab.y + 300.0),
            },
            &mut store,
        );

        let saved = store.node_override("B").unwrap();
        assert_eq!(saved.x, rect.x + 80.0);
        assert_eq!(saved.y, 0.0);
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn reset_positions_restores_computed_layout() {
        let mut engine = DiagramEngine::default();
        let mut store = scratch_store();
        engine.render("flowchart TD\nA --> B", &mut store);
        let computed = node_rect(&engine, "A");

        let grab = computed.center();
        press_at(&mut engine, &mut store, grab);
        engine.pointer_event(
            GestureEvent::Release {
                position: Point::new(grab.x + 200.0, grab.y),
            },
            &mut store,
        );
        assert_ne!(node_rect(&engine, "A"), computed);

        engine.reset_positions(&mut store);
        assert_eq!(node_rect(&engine, "A"), computed);
        assert!(!store.has_custom_layout());
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn normalize_layout_snaps_to_grid() {
        let mut engine = DiagramEngine::default();
        let mut store = scratch_store();
        engine.render("flowchart TD\nA[Label] --> B", &mut store);
        store
            .set_node_override("A", Rect::new(33.0, 47.0, 400.0, 300.0))
            .unwrap();
        engine.render("flowchart TD\nA[Label] --> B", &mut store);

        engine.normalize_layout(&mut store);
        let rect = node_rect(&engine, "A");
        assert_eq!(rect.x % 20.0, 0.0);
        assert_eq!(rect.y % 20.0, 0.0);
        assert!(rect.width < 400.0);
        assert_eq!(store.node_override("A"), Some(rect));
        let _ = std::fs::remove_file(store.path());
    }
}
