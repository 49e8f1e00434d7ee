use crate::config::PlaceRecord;
use crate::types::{MarkerKind, PlaceMarker};
use geo::Point;

/// Turn the two literal place tables into tagged markers. Record count and
/// field values pass through unchanged; the tag is what lets the renderer
/// pick colors and label offsets per layer.
pub fn build_markers(pois: &[PlaceRecord], reference: &PlaceRecord) -> Vec<PlaceMarker> {
    let mut markers: Vec<PlaceMarker> = pois
        .iter()
        .map(|record| PlaceMarker {
            name: record.name.clone(),
            point: Point::new(record.lon, record.lat),
            kind: MarkerKind::Poi,
        })
        .collect();

    markers.push(PlaceMarker {
        name: reference.name.clone(),
        point: Point::new(reference.lon, reference.lat),
        kind: MarkerKind::Reference,
    });

    markers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_points_of_interest, default_reference_site};

    #[test]
    fn records_pass_through_unchanged() {
        let pois = default_points_of_interest();
        let reference = default_reference_site();
        let markers = build_markers(&pois, &reference);

        assert_eq!(markers.len(), pois.len() + 1);
        for (record, marker) in pois.iter().zip(&markers) {
            assert_eq!(marker.name, record.name);
            assert_eq!(marker.point.x(), record.lon);
            assert_eq!(marker.point.y(), record.lat);
            assert_eq!(marker.kind, MarkerKind::Poi);
        }
    }

    #[test]
    fn reference_site_is_a_single_tagged_marker() {
        let markers = build_markers(&default_points_of_interest(), &default_reference_site());
        let references: Vec<_> = markers
            .iter()
            .filter(|m| m.kind == MarkerKind::Reference)
            .collect();

        assert_eq!(references.len(), 1);
        assert_eq!(references[0].name, "Reference colony");
        assert_eq!(references[0].point.x(), 6.382);
        assert_eq!(references[0].point.y(), 43.0115);
    }
}
