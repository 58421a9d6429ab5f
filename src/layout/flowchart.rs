use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::LayoutConfig;
use crate::geometry::Rect;
use crate::ir::{Direction, FlowchartDiagram};
use crate::store::PositionStore;
use crate::text_metrics;
use crate::theme::Theme;

use super::Layout;

pub(super) fn compute(
    diagram: &FlowchartDiagram,
    store: &mut PositionStore,
    theme: &Theme,
    config: &LayoutConfig,
) -> Layout {
    let ranks = assign_ranks(diagram);
    let max_rank = ranks.values().copied().max().unwrap_or(0);

    // Declaration order within a rank keeps the layout stable across edits.
    let mut rows: Vec<Vec<&str>> = vec![Vec::new(); max_rank + 1];
    for id in &diagram.order {
        if let Some(rank) = ranks.get(id.as_str()) {
            rows[*rank].push(id);
        }
    }

    let mut layout = Layout::default();
    for (rank, row) in rows.iter().enumerate() {
        // BT/RL run ranks against the stated direction.
        let along_rank = match diagram.direction {
            Direction::BottomUp | Direction::RightLeft => max_rank - rank,
            _ => rank,
        };
        for (lane, id) in row.iter().enumerate() {
            let size = node_size(diagram, id, theme, config);
            let (x, y) = if diagram.direction.is_horizontal() {
                (
                    along_rank as f32 * config.flowchart.spacing_x,
                    lane as f32 * config.flowchart.spacing_y,
                )
            } else {
                (
                    lane as f32 * config.flowchart.spacing_x,
                    along_rank as f32 * config.flowchart.spacing_y,
                )
            };
            let computed = Rect::new(x, y, size.0, size.1);

            let rect = match store.node_override(id) {
                Some(saved) => saved,
                None => {
                    if diagram.config.layout_fixed {
                        // Fixed layout promises an override for every node;
                        // backfill once so the next render is stable.
                        store.set_node_override(id, computed).ok();
                    }
                    computed
                }
            };
            layout.nodes.insert((*id).to_string(), rect);
        }
    }

    layout
}

/// Label measurement with minimum bounds: long labels widen the node, short
/// ones keep the default footprint.
fn node_size(
    diagram: &FlowchartDiagram,
    id: &str,
    theme: &Theme,
    config: &LayoutConfig,
) -> (f32, f32) {
    let label = diagram
        .nodes
        .get(id)
        .map(|node| node.label.as_str())
        .unwrap_or_default();
    let extent = text_metrics::measure_label(label, theme);
    let width = (extent.width + config.node.label_padding * 2.0).max(config.node.default_width);
    let height = (extent.height + config.node.label_padding * 2.0).max(config.node.default_height);
    (width, height)
}

/// Topological layering along the direction: rank 0 for sources, successors
/// one past their deepest predecessor. Cycle members that never drain fall
/// into ranks past the acyclic part, in declaration order.
fn assign_ranks(diagram: &FlowchartDiagram) -> HashMap<String, usize> {
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut indegree: HashMap<&str, usize> = HashMap::new();
    for id in diagram.nodes.keys() {
        indegree.entry(id).or_insert(0);
    }
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    for edge in &diagram.edges {
        if edge.source == edge.target {
            continue;
        }
        if !seen.insert((edge.source.as_str(), edge.target.as_str())) {
            continue;
        }
        successors
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
        *indegree.entry(edge.target.as_str()).or_insert(0) += 1;
    }

    let mut ranks: HashMap<String, usize> = HashMap::new();
    let mut queue: VecDeque<&str> = diagram
        .order
        .iter()
        .map(String::as_str)
        .filter(|id| indegree.get(id).copied().unwrap_or(0) == 0)
        .collect();
    for id in &queue {
        ranks.insert((*id).to_string(), 0);
    }

    while let Some(id) = queue.pop_front() {
        let rank = ranks.get(id).copied().unwrap_or(0);
        for succ in successors.get(id).cloned().unwrap_or_default() {
            let entry = ranks.entry(succ.to_string()).or_insert(0);
            *entry = (*entry).max(rank + 1);
            if let Some(degree) = indegree.get_mut(succ) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(succ);
                }
            }
        }
    }

    let mut next_rank = ranks.values().copied().max().map_or(0, |r| r + 1);
    for id in &diagram.order {
        if !ranks.contains_key(id) {
            ranks.insert(id.clone(), next_rank);
            next_rank += 1;
        }
    }

    ranks
}
