use geo::{coord, Point, Polygon, Rect};
use serde::Deserialize;
use svg::node::element::Group;

/// Geographic extent in lon/lat (EPSG:4326).
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Invariant: west < east and south < north.
    pub fn is_valid(&self) -> bool {
        self.west < self.east && self.south < self.north
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.west, y: self.south },
            coord! { x: self.east, y: self.north },
        )
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        self.to_rect().to_polygon()
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }
}

/// Which rendering path a marker takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Poi,
    Reference,
}

#[derive(Debug, Clone)]
pub struct PlaceMarker {
    pub name: String,
    pub point: Point<f64>,
    pub kind: MarkerKind,
}

/// A rendered figure: SVG content plus the pixel viewport it was drawn for.
/// Opaque to everything but the compositor.
#[derive(Debug, Clone)]
pub struct Figure {
    pub content: Group,
    pub width: u32,
    pub height: u32,
}
