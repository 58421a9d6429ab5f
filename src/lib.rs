pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod ir;
pub mod items;
pub mod layout;
pub mod parser;
pub mod renderer;
pub mod scene;
pub mod store;
pub mod text_metrics;
pub mod theme;

pub use config::LayoutConfig;
pub use document::{DisplaySettings, Document, load_document, save_document};
pub use engine::DiagramEngine;
pub use error::Error;
pub use geometry::{Point, Rect};
pub use ir::Diagram;
pub use parser::parse_diagram;
pub use renderer::ScenePatch;
pub use store::PositionStore;
pub use theme::Theme;
