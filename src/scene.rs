//! Keyed arena of scene items. Reconciliation addresses items by `ItemKey`
//! (diagram identity); interaction holds on to `ItemId` handles that stay
//! valid as long as the item survives reconciliation.

use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::geometry::Rect;
use crate::ir::DiagramMode;
use crate::items::{EdgeItem, MessageItem, NodeItem, NoteItem, ParticipantItem, TitleItem};

/// Diagram-derived identity of one scene item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
    Node(String),
    Edge(String),
    Participant(String),
    Message(String),
    Note(String),
    Title,
}

/// Generational handle. A slot reused for a new item bumps the generation,
/// so stale handles miss instead of aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
pub enum SceneItem {
    Node(NodeItem),
    Edge(EdgeItem),
    Participant(ParticipantItem),
    Message(MessageItem),
    Note(NoteItem),
    Title(TitleItem),
}

impl SceneItem {
    pub fn key(&self) -> ItemKey {
        match self {
            Self::Node(node) => ItemKey::Node(node.id.clone()),
            Self::Edge(edge) => ItemKey::Edge(edge.key.clone()),
            Self::Participant(p) => ItemKey::Participant(p.id.clone()),
            Self::Message(m) => ItemKey::Message(m.key.clone()),
            Self::Note(n) => ItemKey::Note(n.key.clone()),
            Self::Title(_) => ItemKey::Title,
        }
    }

    /// Drawn footprint, transient affordances excluded.
    pub fn bounds(&self, config: &LayoutConfig) -> Option<Rect> {
        match self {
            Self::Node(node) => Some(node.rect),
            Self::Edge(edge) => {
                let x = edge.start.x.min(edge.end.x);
                let y = edge.start.y.min(edge.end.y);
                let mut rect = Rect::new(
                    x,
                    y,
                    (edge.end.x - edge.start.x).abs(),
                    (edge.end.y - edge.start.y).abs(),
                );
                if edge.use_bezier {
                    let (c1, c2) = edge.resolved_controls(&config.edge);
                    rect = rect.union(Rect::new(c1.x, c1.y, 0.0, 0.0));
                    rect = rect.union(Rect::new(c2.x, c2.y, 0.0, 0.0));
                }
                Some(rect)
            }
            Self::Participant(p) => Some(p.extent(&config.sequence)),
            Self::Message(m) => Some(m.extent()),
            Self::Note(n) => Some(n.rect),
            Self::Title(t) => Some(Rect::new(t.position.x - 1.0, t.position.y, 2.0, 24.0)),
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    item: Option<SceneItem>,
}

#[derive(Debug, Default)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    index: HashMap<ItemKey, ItemId>,
    /// Mode of the diagram the scene was last reconciled against.
    pub mode: Option<DiagramMode>,
    /// Participant ids in order, used to detect lane set changes.
    pub participant_signature: Vec<String>,
}

impl Scene {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn insert(&mut self, item: SceneItem) -> ItemId {
        let key = item.key();
        if let Some(&existing) = self.index.get(&key) {
            self.slots[existing.index as usize].item = Some(item);
            return existing;
        }
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.item = Some(item);
        let id = ItemId {
            index,
            generation: slot.generation,
        };
        self.index.insert(key, id);
        id
    }

    pub fn get(&self, id: ItemId) -> Option<&SceneItem> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.item.as_ref()
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut SceneItem> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.item.as_mut()
    }

    pub fn id_of(&self, key: &ItemKey) -> Option<ItemId> {
        self.index.get(key).copied()
    }

    pub fn item_by_key(&self, key: &ItemKey) -> Option<&SceneItem> {
        self.get(self.id_of(key)?)
    }

    pub fn item_by_key_mut(&mut self, key: &ItemKey) -> Option<&mut SceneItem> {
        let id = self.id_of(key)?;
        self.get_mut(id)
    }

    pub fn remove(&mut self, key: &ItemKey) -> Option<SceneItem> {
        let id = self.index.remove(key)?;
        let slot = &mut self.slots[id.index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        slot.item.take()
    }

    pub fn clear(&mut self) {
        for id in self.index.values() {
            let slot = &mut self.slots[id.index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.item = None;
            self.free.push(id.index);
        }
        self.index.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &ItemKey> {
        self.index.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &SceneItem)> {
        self.index.values().filter_map(|&id| Some((id, self.get(id)?)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SceneItem> {
        self.slots.iter_mut().filter_map(|slot| slot.item.as_mut())
    }

    /// Union of drawn item bounds, `None` for an empty scene.
    pub fn content_bounds(&self, config: &LayoutConfig) -> Option<Rect> {
        self.iter()
            .filter_map(|(_, item)| item.bounds(config))
            .reduce(|a, b| a.union(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::items::{NodeItem, NodeStyle};

    fn node(id: &str, rect: Rect) -> SceneItem {
        SceneItem::Node(NodeItem {
            id: id.to_string(),
            label: id.to_string(),
            class_name: None,
            style: NodeStyle {
                fill: "#FFFFFF".to_string(),
                stroke: "#000000".to_string(),
                stroke_width: 2.0,
            },
            rect,
            selected: false,
        })
    }

    #[test]
    fn insert_then_lookup_by_key_and_id() {
        let mut scene = Scene::default();
        let id = scene.insert(node("A", Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(scene.id_of(&ItemKey::Node("A".to_string())), Some(id));
        assert!(matches!(scene.get(id), Some(SceneItem::Node(_))));
    }

    #[test]
    fn reinsert_same_key_keeps_id() {
        let mut scene = Scene::default();
        let id = scene.insert(node("A", Rect::new(0.0, 0.0, 10.0, 10.0)));
        let again = scene.insert(node("A", Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert_eq!(id, again);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn removal_invalidates_stale_handles() {
        let mut scene = Scene::default();
        let id = scene.insert(node("A", Rect::new(0.0, 0.0, 10.0, 10.0)));
        scene.remove(&ItemKey::Node("A".to_string()));
        assert!(scene.get(id).is_none());

        let reused = scene.insert(node("B", Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_ne!(id, reused);
        assert!(scene.get(id).is_none());
        assert!(scene.get(reused).is_some());
    }

    #[test]
    fn content_bounds_unions_items() {
        let mut scene = Scene::default();
        scene.insert(node("A", Rect::new(0.0, 0.0, 10.0, 10.0)));
        scene.insert(node("B", Rect::new(90.0, 40.0, 10.0, 10.0)));
        let bounds = scene.content_bounds(&LayoutConfig::default()).unwrap();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 100.0, 50.0));
    }
}
