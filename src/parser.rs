use std::collections::HashMap;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::{
    ClassDef, Diagram, DiagramConfig, Direction, Edge, EdgeKind, FlowchartDiagram, MessageStyle,
    SequenceDiagram,
};

static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:flowchart|graph)\s+(\w+)").unwrap());
static NODE_QUOTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^(\w+)\["([^"]*)"\]$"#).unwrap());
static NODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)\[([^\]]+)\]$").unwrap());
static EDGE_BIDIR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s*<-->\s*(.+)$").unwrap());
static EDGE_LABELED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s*--\s*([^-<>]+?)\s*-->\s*(.+)$").unwrap());
static EDGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?)\s*-->\s*(.+)$").unwrap());
static CLASS_DEF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^classDef\s+(\w+)\s+(.+)$").unwrap());
static CLASS_ASSIGN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+):::(\w+)$").unwrap());
static INLINE_CLASS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r":::(\w+)\s*$").unwrap());

static SEQ_TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^title\s+(.+)$").unwrap());
static SEQ_PARTICIPANT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^participant\s+(\w+)(?:\s+as\s+(.+))?$").unwrap());
static SEQ_MESSAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\s*(-{1,2}>{1,2})\s*(\w+)\s*:\s*(.+)$").unwrap());
static SEQ_NOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^note\s+over\s+([\w,\s]+):\s*(.+)$").unwrap());

/// Parse diagram source into a `Diagram`. Best effort: unrecognized lines are
/// skipped so typing in the editor degrades to a partial diagram, never a
/// failure. The `Result` is part of the public contract but parsing itself
/// does not bail.
pub fn parse_diagram(input: &str) -> Result<Diagram> {
    let (config, body) = extract_config(input);
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("%%"))
        .collect();

    if lines
        .first()
        .is_some_and(|line| line.to_ascii_lowercase().starts_with("sequence"))
    {
        Ok(Diagram::Sequence(parse_sequence(&lines[1..], config)))
    } else {
        Ok(Diagram::Flowchart(parse_flowchart(&lines, config)))
    }
}

/// Split an optional leading `---` delimited block of `key: value` lines off
/// the diagram body. Unknown keys are retained but have no effect.
fn extract_config(input: &str) -> (DiagramConfig, &str) {
    let mut config = DiagramConfig::default();
    let trimmed = input.trim_start_matches(['\n', '\r', ' ', '\t']);
    let Some(rest) = trimmed.strip_prefix("---") else {
        return (config, input);
    };
    let Some(end) = rest.find("\n---") else {
        return (config, input);
    };
    for line in rest[..end].lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            continue;
        }
        if key == "layout" {
            config.layout_fixed = value.eq_ignore_ascii_case("fixed");
        }
        config.extra.insert(key.to_string(), value.to_string());
    }
    let body = &rest[end + 4..];
    (config, body)
}

fn parse_flowchart(lines: &[&str], config: DiagramConfig) -> FlowchartDiagram {
    let mut diagram = FlowchartDiagram {
        config,
        ..Default::default()
    };

    for line in lines {
        let line = *line;

        if let Some(caps) = HEADER_RE.captures(line) {
            if let Some(direction) = Direction::from_token(&caps[1]) {
                diagram.direction = direction;
            }
            continue;
        }

        if let Some(caps) = CLASS_DEF_RE.captures(line) {
            let class_def = parse_class_attributes(&caps[2]);
            diagram.classes.insert(caps[1].to_string(), class_def);
            continue;
        }

        if let Some(caps) = CLASS_ASSIGN_RE.captures(line) {
            let (id, class_name) = (caps[1].to_string(), caps[2].to_string());
            diagram.assign_class(&id, &class_name);
            continue;
        }

        if add_edge_line(line, &mut diagram) {
            continue;
        }

        // Inline `id[label]:::class` peels the class off before node parsing.
        let (line, inline_class) = match INLINE_CLASS_RE.captures(line) {
            Some(caps) => {
                let class_name = caps[1].to_string();
                (line[..line.len() - caps[0].len()].trim_end(), Some(class_name))
            }
            None => (line, None),
        };

        if let Some((id, label)) = parse_node_token(line) {
            diagram.ensure_node(&id, Some(&label));
            if let Some(class_name) = inline_class {
                diagram.assign_class(&id, &class_name);
            }
        }
    }

    disambiguate_edge_keys(&mut diagram.edges);
    diagram
}

fn add_edge_line(line: &str, diagram: &mut FlowchartDiagram) -> bool {
    if let Some(caps) = EDGE_BIDIR_RE.captures(line) {
        let sources = declare_endpoints(&caps[1], diagram);
        let targets = declare_endpoints(&caps[2], diagram);
        push_edges(diagram, &sources, &targets, "", EdgeKind::Bidirectional);
        return true;
    }

    if let Some(caps) = EDGE_LABELED_RE.captures(line) {
        let label = caps[2].trim().to_string();
        let sources = declare_endpoints(&caps[1], diagram);
        let targets = declare_endpoints(&caps[3], diagram);
        push_edges(diagram, &sources, &targets, &label, EdgeKind::Arrow);
        return true;
    }

    if let Some(caps) = EDGE_RE.captures(line) {
        let sources = declare_endpoints(&caps[1], diagram);
        let targets = declare_endpoints(&caps[2], diagram);
        push_edges(diagram, &sources, &targets, "", EdgeKind::Arrow);
        return true;
    }

    false
}

/// An edge end is either a bare id, an inline declaration `id[label]`
/// optionally suffixed `:::class`, or a `&`-joined fan of those. Every
/// referenced node is declared on the spot.
fn declare_endpoints(token: &str, diagram: &mut FlowchartDiagram) -> Vec<String> {
    let mut ids = Vec::new();
    for part in token.split('&') {
        let mut part = part.trim();
        let mut class_name = None;
        if let Some((head, class)) = part.rsplit_once(":::")
            && class.chars().all(|c| c.is_alphanumeric() || c == '_')
            && !class.is_empty()
        {
            part = head.trim_end();
            class_name = Some(class);
        }
        if part.is_empty() {
            continue;
        }
        let id = if let Some((id, label)) = parse_node_token(part) {
            diagram.ensure_node(&id, Some(&label));
            Some(id)
        } else if part.chars().all(|c| c.is_alphanumeric() || c == '_') {
            diagram.ensure_node(part, None);
            Some(part.to_string())
        } else {
            None
        };
        if let Some(id) = id {
            if let Some(class_name) = class_name {
                diagram.assign_class(&id, class_name);
            }
            ids.push(id);
        }
    }
    ids
}

fn push_edges(
    diagram: &mut FlowchartDiagram,
    sources: &[String],
    targets: &[String],
    label: &str,
    kind: EdgeKind,
) {
    for source in sources {
        for target in targets {
            diagram.edges.push(Edge::new(source, target, label, kind));
        }
    }
}

fn parse_node_token(token: &str) -> Option<(String, String)> {
    if let Some(caps) = NODE_QUOTED_RE.captures(token) {
        return Some((caps[1].to_string(), caps[2].to_string()));
    }
    if let Some(caps) = NODE_RE.captures(token) {
        let label = caps[2].trim_matches('"').to_string();
        return Some((caps[1].to_string(), label));
    }
    None
}

/// Duplicate composite keys would silently share one stored override, so the
/// second and later occurrences get an ordinal suffix and stay independent.
fn disambiguate_edge_keys(edges: &mut [Edge]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for edge in edges.iter_mut() {
        let count = seen.entry(edge.key.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            edge.key = format!("{}#{}", edge.key, *count);
        }
    }
}

fn parse_class_attributes(attributes: &str) -> ClassDef {
    let mut class_def = ClassDef::default();
    for attribute in attributes.split(',') {
        let Some((key, value)) = attribute.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        match key {
            "fill" => class_def.fill = Some(value.to_string()),
            "stroke" => class_def.stroke = Some(value.to_string()),
            "stroke-width" => {
                class_def.stroke_width = value.trim_end_matches("px").parse().ok();
            }
            _ => {
                class_def.extra.insert(key.to_string(), value.to_string());
            }
        }
    }
    class_def
}

fn parse_sequence(lines: &[&str], config: DiagramConfig) -> SequenceDiagram {
    let mut diagram = SequenceDiagram {
        config,
        ..Default::default()
    };

    for line in lines {
        let line = *line;

        if let Some(caps) = SEQ_TITLE_RE.captures(line) {
            diagram.title = Some(caps[1].trim().to_string());
            continue;
        }

        if let Some(caps) = SEQ_PARTICIPANT_RE.captures(line) {
            let id = caps[1].to_string();
            let alias = caps.get(2).map(|m| m.as_str().trim().to_string());
            diagram.ensure_participant(&id, alias.as_deref());
            continue;
        }

        if let Some(caps) = SEQ_NOTE_RE.captures(line) {
            let participants: Vec<String> = caps[1]
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            for id in &participants {
                diagram.ensure_participant(id, None);
            }
            diagram.notes.push(crate::ir::Note {
                participants,
                text: caps[2].trim().to_string(),
            });
            continue;
        }

        if let Some(caps) = SEQ_MESSAGE_RE.captures(line) {
            let (source, arrow, target, text) = (&caps[1], &caps[2], &caps[3], &caps[4]);
            diagram.ensure_participant(source, None);
            diagram.ensure_participant(target, None);
            // `->>` / `-->>` async, `-->` dashed return, anything else that
            // still matched the arrow family is a plain sync message.
            let style = if arrow.contains(">>") {
                MessageStyle::Async
            } else if arrow == "-->" {
                MessageStyle::Dashed
            } else {
                MessageStyle::Solid
            };
            diagram.messages.push(crate::ir::Message {
                source: source.to_string(),
                target: target.to_string(),
                text: text.trim().to_string(),
                style,
            });
        }
        // Unrecognized lines are skipped.
    }

    diagram
}
