use crate::config::{AppConfig, StyleConfig};
use crate::types::{Figure, MarkerKind, PlaceMarker};
use geo::{MultiPolygon, Polygon};
use svg::node::element::path::Data;
use svg::node::element::{Circle, Group, Line, Path, Polygon as SvgPolygon, Rectangle, Text};
use tracing::{span, Level};

// Room for tick labels and axis titles around the plot frame.
const MARGIN_LEFT: f64 = 62.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 16.0;
const MARGIN_BOTTOM: f64 = 48.0;

const TICK_LENGTH: f64 = 5.0;
const INSET_WIDTH: u32 = 300;

/// Linear lon/lat to pixel mapping over a fixed viewport. Good enough at
/// this extent; no reprojection.
pub struct Projection {
    xlim: (f64, f64),
    ylim: (f64, f64),
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl Projection {
    pub fn new(xlim: (f64, f64), ylim: (f64, f64), left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            xlim,
            ylim,
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn to_px(&self, lon: f64, lat: f64) -> (f64, f64) {
        let x = self.left
            + (lon - self.xlim.0) / (self.xlim.1 - self.xlim.0) * (self.right - self.left);
        let y = self.top
            + (self.ylim.1 - lat) / (self.ylim.1 - self.ylim.0) * (self.bottom - self.top);
        (x, y)
    }
}

/// Draws the styled main map: water background, island polygons, tagged
/// markers with labels, axes, north arrow, scale bar. Back-to-front order.
pub fn render_main_map(
    config: &AppConfig,
    islands: &MultiPolygon<f64>,
    markers: &[PlaceMarker],
) -> Figure {
    let span = span!(Level::DEBUG, "render_main_map");
    let _guard = span.enter();

    let width = config.display.width as f64;
    let height = config.display.height as f64;
    let proj = Projection::new(
        config.display.xlim,
        config.display.ylim,
        MARGIN_LEFT,
        MARGIN_TOP,
        width - MARGIN_RIGHT,
        height - MARGIN_BOTTOM,
    );
    let style = &config.style;

    let mut group = Group::new().add(
        Rectangle::new()
            .set("x", 0)
            .set("y", 0)
            .set("width", width)
            .set("height", height)
            .set("fill", "#ffffff"),
    );

    // Water background over the plot area only.
    group = group.add(
        Rectangle::new()
            .set("x", MARGIN_LEFT)
            .set("y", MARGIN_TOP)
            .set("width", width - MARGIN_LEFT - MARGIN_RIGHT)
            .set("height", height - MARGIN_TOP - MARGIN_BOTTOM)
            .set("fill", style.water_fill.as_str()),
    );

    for island in &islands.0 {
        group = group.add(
            Path::new()
                .set("d", polygon_data(island, &proj))
                .set("fill", style.land_fill.as_str())
                .set("fill-rule", "evenodd")
                .set("stroke", style.coast_stroke.as_str())
                .set("stroke-width", style.coast_stroke_width),
        );
    }

    for marker in markers {
        group = group.add(marker_group(marker, style, &proj));
    }

    group = group
        .add(axes(config, &proj))
        .add(north_arrow(MARGIN_LEFT + 28.0, MARGIN_TOP + 18.0))
        .add(scale_bar(config, &proj));

    Figure {
        content: group,
        width: config.display.width,
        height: config.display.height,
    }
}

/// Locator inset: country outline on a blank background with a
/// semi-transparent rectangle over the main map's extent. No axes.
pub fn render_inset(config: &AppConfig, country: &MultiPolygon<f64>) -> Figure {
    let span = span!(Level::DEBUG, "render_inset");
    let _guard = span.enter();

    let extent = &config.inset.extent;
    let width = INSET_WIDTH as f64;
    let height = (width * extent.height() / extent.width()).round();
    let proj = Projection::new(
        (extent.west, extent.east),
        (extent.south, extent.north),
        0.0,
        0.0,
        width,
        height,
    );

    let mut group = Group::new().add(
        Rectangle::new()
            .set("x", 0)
            .set("y", 0)
            .set("width", width)
            .set("height", height)
            .set("fill", "#ffffff"),
    );

    for polygon in &country.0 {
        group = group.add(
            Path::new()
                .set("d", polygon_data(polygon, &proj))
                .set("fill", "#e4e0d8")
                .set("fill-rule", "evenodd")
                .set("stroke", "#6f6f6f")
                .set("stroke-width", 0.8),
        );
    }

    let highlight = &config.inset.highlight;
    let (hx, hy) = proj.to_px(highlight.west, highlight.north);
    let (hx1, hy1) = proj.to_px(highlight.east, highlight.south);
    group = group.add(
        Rectangle::new()
            .set("x", hx)
            .set("y", hy)
            .set("width", hx1 - hx)
            .set("height", hy1 - hy)
            .set("fill", config.style.reference_color.as_str())
            .set("fill-opacity", 0.35)
            .set("stroke", config.style.reference_color.as_str())
            .set("stroke-width", 1.0),
    );

    Figure {
        content: group,
        width: INSET_WIDTH,
        height: height as u32,
    }
}

fn polygon_data(polygon: &Polygon<f64>, proj: &Projection) -> Data {
    let mut data = ring_data(Data::new(), polygon.exterior(), proj);
    for interior in polygon.interiors() {
        data = ring_data(data, interior, proj);
    }
    data
}

fn ring_data(mut data: Data, ring: &geo::LineString<f64>, proj: &Projection) -> Data {
    let mut coords = ring.0.iter();
    if let Some(first) = coords.next() {
        data = data.move_to(proj.to_px(first.x, first.y));
        for c in coords {
            data = data.line_to(proj.to_px(c.x, c.y));
        }
        data = data.close();
    }
    data
}

fn marker_group(marker: &PlaceMarker, style: &StyleConfig, proj: &Projection) -> Group {
    let (x, y) = proj.to_px(marker.point.x(), marker.point.y());
    let (color, radius, offset) = match marker.kind {
        MarkerKind::Poi => (
            style.poi_color.as_str(),
            style.poi_marker_radius,
            style.poi_label_offset,
        ),
        MarkerKind::Reference => (
            style.reference_color.as_str(),
            style.reference_marker_radius,
            style.reference_label_offset,
        ),
    };

    // Offsets are in figure coordinates, y pointing up.
    Group::new()
        .add(
            Circle::new()
                .set("cx", x)
                .set("cy", y)
                .set("r", radius)
                .set("fill", color),
        )
        .add(
            Text::new(marker.name.clone())
                .set("x", x + offset.0)
                .set("y", y - offset.1)
                .set("font-family", "sans-serif")
                .set("font-size", style.font_size)
                .set("fill", "#000000"),
        )
}

fn axes(config: &AppConfig, proj: &Projection) -> Group {
    let width = config.display.width as f64;
    let height = config.display.height as f64;
    let font_size = config.style.font_size;
    let bottom = height - MARGIN_BOTTOM;

    let mut group = Group::new().add(
        Rectangle::new()
            .set("x", MARGIN_LEFT)
            .set("y", MARGIN_TOP)
            .set("width", width - MARGIN_LEFT - MARGIN_RIGHT)
            .set("height", height - MARGIN_TOP - MARGIN_BOTTOM)
            .set("fill", "none")
            .set("stroke", "#000000")
            .set("stroke-width", 1.0),
    );

    for tick in ticks(config.display.xlim.0, config.display.xlim.1) {
        let (x, _) = proj.to_px(tick, config.display.ylim.0);
        group = group
            .add(
                Line::new()
                    .set("x1", x)
                    .set("y1", bottom)
                    .set("x2", x)
                    .set("y2", bottom + TICK_LENGTH)
                    .set("stroke", "#000000")
                    .set("stroke-width", 1.0),
            )
            .add(
                Text::new(format_tick(tick))
                    .set("x", x)
                    .set("y", bottom + TICK_LENGTH + font_size)
                    .set("text-anchor", "middle")
                    .set("font-family", "sans-serif")
                    .set("font-size", font_size),
            );
    }

    for tick in ticks(config.display.ylim.0, config.display.ylim.1) {
        let (_, y) = proj.to_px(config.display.xlim.0, tick);
        group = group
            .add(
                Line::new()
                    .set("x1", MARGIN_LEFT - TICK_LENGTH)
                    .set("y1", y)
                    .set("x2", MARGIN_LEFT)
                    .set("y2", y)
                    .set("stroke", "#000000")
                    .set("stroke-width", 1.0),
            )
            .add(
                Text::new(format_tick(tick))
                    .set("x", MARGIN_LEFT - TICK_LENGTH - 3.0)
                    .set("y", y + font_size * 0.35)
                    .set("text-anchor", "end")
                    .set("font-family", "sans-serif")
                    .set("font-size", font_size),
            );
    }

    group
        .add(
            Text::new("Longitude (°E)")
                .set("x", (MARGIN_LEFT + width - MARGIN_RIGHT) / 2.0)
                .set("y", height - 10.0)
                .set("text-anchor", "middle")
                .set("font-family", "sans-serif")
                .set("font-size", font_size),
        )
        .add(
            Text::new("Latitude (°N)")
                .set("x", 16.0)
                .set("y", (MARGIN_TOP + bottom) / 2.0)
                .set("text-anchor", "middle")
                .set(
                    "transform",
                    format!(
                        "rotate(-90 16 {})",
                        (MARGIN_TOP + bottom) / 2.0
                    ),
                )
                .set("font-family", "sans-serif")
                .set("font-size", font_size),
        )
}

fn north_arrow(x: f64, y: f64) -> Group {
    let size = 22.0;
    let points = format!(
        "{},{} {},{} {},{}",
        x,
        y,
        x - size * 0.35,
        y + size,
        x + size * 0.35,
        y + size
    );
    Group::new()
        .add(SvgPolygon::new().set("points", points).set("fill", "#000000"))
        .add(
            Text::new("N")
                .set("x", x)
                .set("y", y + size + 15.0)
                .set("text-anchor", "middle")
                .set("font-family", "sans-serif")
                .set("font-size", 14.0)
                .set("font-weight", "bold"),
        )
}

/// Fixed-length annotation between two configured geographic endpoints.
/// The label is taken verbatim from the config.
fn scale_bar(config: &AppConfig, proj: &Projection) -> Group {
    let (x0, y0) = proj.to_px(config.scale_bar.start.0, config.scale_bar.start.1);
    let (x1, y1) = proj.to_px(config.scale_bar.end.0, config.scale_bar.end.1);

    Group::new()
        .add(
            Line::new()
                .set("x1", x0)
                .set("y1", y0)
                .set("x2", x1)
                .set("y2", y1)
                .set("stroke", "#000000")
                .set("stroke-width", 3.0),
        )
        .add(
            Text::new(config.scale_bar.label.clone())
                .set("x", (x0 + x1) / 2.0)
                .set("y", y0.min(y1) - 6.0)
                .set("text-anchor", "middle")
                .set("font-family", "sans-serif")
                .set("font-size", config.style.font_size),
        )
}

/// Tick positions at a step snapped to 1/2/5 times a power of ten, aiming
/// for about five intervals.
fn ticks(min: f64, max: f64) -> Vec<f64> {
    let step = tick_step(max - min);
    let mut positions = Vec::new();
    let mut tick = (min / step).ceil() * step;
    while tick <= max + step * 1e-6 {
        positions.push(tick);
        tick += step;
    }
    positions
}

fn tick_step(range: f64) -> f64 {
    let raw = range / 5.0;
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let snapped = if normalized < 1.5 {
        1.0
    } else if normalized < 3.5 {
        2.0
    } else if normalized < 7.5 {
        5.0
    } else {
        10.0
    };
    snapped * magnitude
}

fn format_tick(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_string()
}
