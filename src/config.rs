use crate::types::BoundingBox;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub query: QueryConfig,
    pub display: DisplayConfig,
    pub points_of_interest: Vec<PlaceRecord>,
    pub reference_site: PlaceRecord,
    pub style: StyleConfig,
    pub scale_bar: ScaleBarConfig,
    pub inset: InsetConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    pub endpoint: String,
    pub bbox: BoundingBox,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    pub xlim: (f64, f64),
    pub ylim: (f64, f64),
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlaceRecord {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StyleConfig {
    pub water_fill: String,
    pub land_fill: String,
    pub coast_stroke: String,
    pub coast_stroke_width: f64,
    pub poi_color: String,
    pub reference_color: String,
    pub poi_marker_radius: f64,
    pub reference_marker_radius: f64,
    /// Label offset from the marker, in pixels (x right, y up).
    pub poi_label_offset: (f64, f64),
    pub reference_label_offset: (f64, f64),
    pub font_size: f64,
}

/// The bar is a fixed annotation between two geographic endpoints; the label
/// is whatever the author says it is. It is only nominally accurate for the
/// default display extent.
#[derive(Debug, Deserialize, Clone)]
pub struct ScaleBarConfig {
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub label: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InsetConfig {
    pub country: String,
    /// Natural Earth scale, e.g. "110m" for the coarse countries set.
    pub resolution: String,
    pub countries_url: String,
    /// Wider extent showing the whole country.
    pub extent: BoundingBox,
    /// The main map's extent, drawn as a highlight rectangle.
    pub highlight: BoundingBox,
    pub position: InsetPosition,
}

/// Placement as fractions of the canvas, measured from the bottom-left corner.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct InsetPosition {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            query: QueryConfig::default(),
            display: DisplayConfig::default(),
            points_of_interest: default_points_of_interest(),
            reference_site: default_reference_site(),
            style: StyleConfig::default(),
            scale_bar: ScaleBarConfig::default(),
            inset: InsetConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.query.bbox.is_valid() {
            bail!("query.bbox must satisfy west < east and south < north");
        }
        if !self.inset.extent.is_valid() {
            bail!("inset.extent must satisfy west < east and south < north");
        }
        if !self.inset.highlight.is_valid() {
            bail!("inset.highlight must satisfy west < east and south < north");
        }
        if self.display.xlim.0 >= self.display.xlim.1 || self.display.ylim.0 >= self.display.ylim.1
        {
            bail!("display.xlim and display.ylim must be increasing pairs");
        }
        Ok(())
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://overpass-api.de/api/interpreter".to_string(),
            bbox: BoundingBox::new(5.95, 42.90, 6.70, 43.20),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            xlim: (5.95, 6.70),
            ylim: (42.90, 43.20),
            width: 900,
            height: 600,
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            water_fill: "#cfe4f2".to_string(),
            land_fill: "#ffffff".to_string(),
            coast_stroke: "#000000".to_string(),
            coast_stroke_width: 1.0,
            poi_color: "#333333".to_string(),
            reference_color: "#d62728".to_string(),
            poi_marker_radius: 3.5,
            reference_marker_radius: 6.0,
            poi_label_offset: (7.0, 7.0),
            reference_label_offset: (10.0, -12.0),
            font_size: 13.0,
        }
    }
}

impl Default for ScaleBarConfig {
    fn default() -> Self {
        Self {
            start: (6.00, 42.925),
            end: (6.37, 42.925),
            label: "30 km".to_string(),
        }
    }
}

impl Default for InsetConfig {
    fn default() -> Self {
        Self {
            country: "France".to_string(),
            resolution: "110m".to_string(),
            countries_url: "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson/ne_{resolution}_admin_0_countries.geojson".to_string(),
            extent: BoundingBox::new(-5.8, 41.0, 10.0, 51.5),
            highlight: BoundingBox::new(5.95, 42.90, 6.70, 43.20),
            position: InsetPosition {
                x: 0.68,
                y: 0.68,
                width: 0.28,
                height: 0.28,
            },
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("port_cros.svg"),
        }
    }
}

/// The default place tables: the four main features of the Hyères island
/// group, plus the monitored seabird colony on Port-Cros.
pub fn default_points_of_interest() -> Vec<PlaceRecord> {
    vec![
        PlaceRecord {
            name: "Porquerolles".to_string(),
            lon: 6.203,
            lat: 43.001,
        },
        PlaceRecord {
            name: "Port-Cros".to_string(),
            lon: 6.402,
            lat: 43.004,
        },
        PlaceRecord {
            name: "Île du Levant".to_string(),
            lon: 6.470,
            lat: 43.030,
        },
        PlaceRecord {
            name: "Presqu'île de Giens".to_string(),
            lon: 6.128,
            lat: 43.038,
        },
    ]
}

pub fn default_reference_site() -> PlaceRecord {
    PlaceRecord {
        name: "Reference colony".to_string(),
        lon: 6.382,
        lat: 43.0115,
    }
}
