use crate::config::InsetPosition;
use crate::types::Figure;
use anyhow::{Context, Result};
use std::path::Path;
use svg::node::element::SVG;
use svg::Document;

/// Overlay the inset onto the main figure. The main figure spans the whole
/// canvas; the inset becomes a nested viewport at the given fractions of
/// the canvas, measured from the bottom-left corner.
pub fn compose(main: &Figure, inset: &Figure, position: &InsetPosition) -> Document {
    let width = main.width as f64;
    let height = main.height as f64;

    let inset_width = position.width * width;
    let inset_height = position.height * height;
    let inset_x = position.x * width;
    // Fractions are measured from the bottom-left; SVG y runs from the top.
    let inset_y = height - (position.y + position.height) * height;

    let inset_viewport = SVG::new()
        .set("x", inset_x)
        .set("y", inset_y)
        .set("width", inset_width)
        .set("height", inset_height)
        .set("viewBox", (0, 0, inset.width, inset.height))
        .set("preserveAspectRatio", "none")
        .add(inset.content.clone());

    Document::new()
        .set("width", main.width)
        .set("height", main.height)
        .set("viewBox", (0, 0, main.width, main.height))
        .add(main.content.clone())
        .add(inset_viewport)
}

pub fn write_figure(document: &Document, path: &Path) -> Result<()> {
    svg::save(path, document).with_context(|| format!("Failed to write map to {:?}", path))
}
