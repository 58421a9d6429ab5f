//! Label measurement for layout. Resolves a system font through `fontdb`
//! and sums glyph advances with `ttf-parser`; when no face resolves (CI,
//! stripped containers) a fixed average advance keeps layout deterministic.

use std::collections::HashMap;
use std::sync::Mutex;

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use ttf_parser::Face;

use crate::theme::Theme;

const FALLBACK_ADVANCE_RATIO: f32 = 0.56;
const LINE_HEIGHT_RATIO: f32 = 1.35;

static MEASURER: Lazy<Mutex<Measurer>> = Lazy::new(|| Mutex::new(Measurer::new()));

/// Measured extent of a (possibly multi-line) label. Lines split on `\n` and
/// the literal `\n` escape accepted by node labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

pub fn measure_label(text: &str, theme: &Theme) -> TextExtent {
    measure(text, theme.font_size, &theme.font_family)
}

pub fn measure(text: &str, font_size: f32, font_family: &str) -> TextExtent {
    let lines: Vec<&str> = text.split(['\n']).flat_map(|l| l.split("\\n")).collect();
    let line_count = lines.len().max(1);
    let mut width = 0.0f32;
    for line in lines {
        width = width.max(line_width(line, font_size, font_family));
    }
    TextExtent {
        width,
        height: line_count as f32 * font_size * LINE_HEIGHT_RATIO,
    }
}

fn line_width(line: &str, font_size: f32, font_family: &str) -> f32 {
    if line.is_empty() || font_size <= 0.0 {
        return 0.0;
    }
    let fallback = || line.chars().count() as f32 * font_size * FALLBACK_ADVANCE_RATIO;
    match MEASURER.lock() {
        Ok(mut guard) => guard
            .line_width(line, font_size, font_family)
            .unwrap_or_else(fallback),
        Err(_) => fallback(),
    }
}

struct Measurer {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<LoadedFace>>,
}

impl Measurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn line_width(&mut self, line: &str, font_size: f32, font_family: &str) -> Option<f32> {
        if !self.faces.contains_key(font_family) {
            let face = self.load_face(font_family);
            self.faces.insert(font_family.to_string(), face);
        }
        let face = self.faces.get(font_family)?.as_ref()?;
        face.line_width(line, font_size)
    }

    fn load_face(&mut self, font_family: &str) -> Option<LoadedFace> {
        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let names: Vec<&str> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\''))
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = Vec::with_capacity(names.len() + 1);
        for name in &names {
            match name.to_ascii_lowercase().as_str() {
                "serif" => families.push(Family::Serif),
                "sans-serif" | "system-ui" | "-apple-system" => families.push(Family::SansSerif),
                "monospace" => families.push(Family::Monospace),
                _ => families.push(Family::Name(name)),
            }
        }
        families.push(Family::SansSerif);

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| LoadedFace::parse(data.to_vec(), index))
            .flatten()
    }
}

struct LoadedFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
}

impl LoadedFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let units_per_em = face.units_per_em().max(1);
        Some(Self {
            data,
            index,
            units_per_em,
        })
    }

    fn line_width(&self, line: &str, font_size: f32) -> Option<f32> {
        let face = Face::parse(&self.data, self.index).ok()?;
        let scale = font_size / self.units_per_em as f32;
        let fallback = font_size * FALLBACK_ADVANCE_RATIO;
        let mut width = 0.0f32;
        for ch in line.chars() {
            match face
                .glyph_index(ch)
                .and_then(|id| face.glyph_hor_advance(id))
            {
                Some(advance) if advance > 0 => width += advance as f32 * scale,
                _ => width += fallback,
            }
        }
        Some(width)
    }
}
