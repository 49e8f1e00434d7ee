use crate::types::BoundingBox;
use anyhow::{anyhow, bail, Context, Result};
use geo::{coord, LineString, MultiLineString, MultiPolygon};
use geojson::GeoJson;
use serde::Deserialize;
use std::io::BufReader;

/// Overpass returns way geometry inline with `out geom`.
#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    pub elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    pub element_type: String,
    pub id: i64,
    #[serde(default)]
    pub geometry: Vec<OverpassCoord>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct OverpassCoord {
    pub lat: f64,
    pub lon: f64,
}

/// Overpass QL for coastline ways in a bounding box. Overpass wants the box
/// in (south, west, north, east) order.
pub fn build_coastline_query(bbox: &BoundingBox) -> String {
    format!(
        "[out:json];way[\"natural\"=\"coastline\"]({},{},{},{});out geom;",
        bbox.south, bbox.west, bbox.north, bbox.east
    )
}

/// Queries the Overpass API for natural=coastline ways within the bbox and
/// returns their raw line geometry. An empty result is a valid empty
/// collection; network and decoding failures propagate.
pub fn fetch_coastline(
    agent: &ureq::Agent,
    endpoint: &str,
    bbox: &BoundingBox,
) -> Result<MultiLineString<f64>> {
    let query = build_coastline_query(bbox);
    let response: OverpassResponse = agent
        .post(endpoint)
        .send_form(&[("data", query.as_str())])
        .with_context(|| format!("Failed to query Overpass at {}", endpoint))?
        .into_json()
        .context("Failed to decode Overpass response")?;
    Ok(lines_from_response(response))
}

pub fn lines_from_response(response: OverpassResponse) -> MultiLineString<f64> {
    let lines: Vec<LineString<f64>> = response
        .elements
        .into_iter()
        .filter(|e| e.element_type == "way" && e.geometry.len() >= 2)
        .map(|e| {
            LineString::new(
                e.geometry
                    .iter()
                    .map(|c| coord! { x: c.lon, y: c.lat })
                    .collect(),
            )
        })
        .collect();
    MultiLineString::new(lines)
}

/// Downloads the Natural Earth countries set at the given scale and returns
/// the outline of the named country.
pub fn fetch_country_outline(
    agent: &ureq::Agent,
    url_template: &str,
    country: &str,
    resolution: &str,
) -> Result<MultiPolygon<f64>> {
    let url = url_template.replace("{resolution}", resolution);
    let response = agent
        .get(&url)
        .call()
        .with_context(|| format!("Failed to download country outlines from {}", url))?;
    let geojson = GeoJson::from_reader(BufReader::new(response.into_reader()))
        .context("Failed to parse country outlines GeoJSON")?;
    country_from_geojson(geojson, country)
}

pub fn country_from_geojson(geojson: GeoJson, country: &str) -> Result<MultiPolygon<f64>> {
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => bail!("Country outlines must be a FeatureCollection"),
    };

    for feature in collection.features {
        let name = feature.properties.as_ref().and_then(|props| {
            props
                .get("ADMIN")
                .or_else(|| props.get("NAME"))
                .and_then(|v| v.as_str())
        });
        if name != Some(country) {
            continue;
        }

        let geometry = feature
            .geometry
            .ok_or_else(|| anyhow!("Country '{}' has no geometry", country))?;
        let geo_geom: geo::Geometry<f64> = geometry
            .value
            .try_into()
            .map_err(|e| anyhow!("Failed to convert country geometry: {:?}", e))?;

        return match geo_geom {
            geo::Geometry::MultiPolygon(mp) => Ok(mp),
            geo::Geometry::Polygon(p) => Ok(MultiPolygon::new(vec![p])),
            other => bail!("Country '{}' is not a polygon: {:?}", country, other),
        };
    }

    bail!("Country '{}' not found in outline set", country)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coastline_query_uses_overpass_bbox_order() {
        let bbox = BoundingBox::new(5.5, 42.5, 7.5, 43.5);
        let query = build_coastline_query(&bbox);
        assert!(query.contains("way[\"natural\"=\"coastline\"](42.5,5.5,43.5,7.5)"));
        assert!(query.starts_with("[out:json]"));
        assert!(query.ends_with("out geom;"));
    }

    #[test]
    fn response_parsing_keeps_way_geometry() {
        let raw = r#"{
            "elements": [
                {"type": "way", "id": 1, "geometry": [
                    {"lat": 42.9, "lon": 6.0}, {"lat": 42.9, "lon": 6.5}
                ]},
                {"type": "node", "id": 2},
                {"type": "way", "id": 3, "geometry": [{"lat": 43.0, "lon": 6.1}]}
            ]
        }"#;
        let response: OverpassResponse = serde_json::from_str(raw).unwrap();
        let lines = lines_from_response(response);
        assert_eq!(lines.0.len(), 1);
        assert_eq!(lines.0[0].0.len(), 2);
        assert_eq!(lines.0[0].0[0], geo::coord! { x: 6.0, y: 42.9 });
    }

    #[test]
    fn country_lookup_by_admin_name() {
        let raw = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature",
                 "properties": {"ADMIN": "Spain"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0.0, 40.0], [1.0, 40.0], [1.0, 41.0], [0.0, 40.0]]]}},
                {"type": "Feature",
                 "properties": {"ADMIN": "France"},
                 "geometry": {"type": "Polygon", "coordinates": [[[2.0, 48.0], [3.0, 48.0], [3.0, 49.0], [2.0, 48.0]]]}}
            ]
        }"#;
        let geojson: GeoJson = raw.parse().unwrap();
        let outline = country_from_geojson(geojson, "France").unwrap();
        assert_eq!(outline.0.len(), 1);
        assert_eq!(outline.0[0].exterior().0[0], geo::coord! { x: 2.0, y: 48.0 });
    }

    #[test]
    fn missing_country_is_an_error() {
        let raw = r#"{"type": "FeatureCollection", "features": []}"#;
        let geojson: GeoJson = raw.parse().unwrap();
        let err = country_from_geojson(geojson, "Atlantis").unwrap_err();
        assert!(err.to_string().contains("Atlantis"));
    }
}
