use crate::types::BoundingBox;
use anyhow::{bail, Result};
use geo::{BooleanOps, Coord, LineString, MultiLineString, MultiPolygon, Polygon};

/// Endpoint snapping tolerance in degrees. Overpass coordinates carry seven
/// decimals, so anything below 1e-7 is representation noise.
const ENDPOINT_EPS: f64 = 1e-9;

/// Crop, merge, polygonize. The only entry point the pipeline uses.
pub fn process(lines: &MultiLineString<f64>, bbox: &BoundingBox) -> Result<MultiPolygon<f64>> {
    let cropped = crop(lines, bbox);
    let merged = merge(&cropped);
    polygonize(&merged)
}

/// Restrict lines to the bounding box. Every coordinate of the output lies
/// inside or on the boundary of the box.
pub fn crop(lines: &MultiLineString<f64>, bbox: &BoundingBox) -> MultiLineString<f64> {
    bbox.to_polygon().clip(lines, false)
}

/// Stitch line strings that share endpoints into maximal chains. A chain
/// whose ends meet is snapped exactly closed. Merging an already-merged
/// collection changes nothing: finished chains end only where no other
/// input ends, so no further stitching is possible.
pub fn merge(lines: &MultiLineString<f64>) -> MultiLineString<f64> {
    let mut pool: Vec<Vec<Coord<f64>>> = lines
        .0
        .iter()
        .filter(|line| line.0.len() >= 2)
        .map(|line| line.0.clone())
        .collect();

    let mut merged = Vec::new();
    while let Some(mut chain) = pool.pop() {
        loop {
            if is_ring(&chain) {
                break;
            }
            let Some(segment) = take_attachable(&mut pool, &chain) else {
                break;
            };
            attach(&mut chain, segment);
        }
        snap_closed(&mut chain);
        merged.push(LineString::new(chain));
    }

    MultiLineString::new(merged)
}

/// Convert closed rings into polygons. Open chains are never auto-closed:
/// they are counted and discarded when at least one ring exists, and the
/// whole operation fails when none does.
pub fn polygonize(lines: &MultiLineString<f64>) -> Result<MultiPolygon<f64>> {
    let mut polygons = Vec::new();
    let mut open = 0usize;

    for line in &lines.0 {
        if line.0.len() >= 4 && line.is_closed() {
            polygons.push(Polygon::new(line.clone(), vec![]));
        } else {
            open += 1;
        }
    }

    if polygons.is_empty() {
        bail!(
            "Coastline lines do not form any closed ring ({} open chains)",
            open
        );
    }
    if open > 0 {
        println!("Discarded {} open coastline chains", open);
    }

    Ok(MultiPolygon::new(polygons))
}

fn coords_close(a: Coord<f64>, b: Coord<f64>) -> bool {
    (a.x - b.x).abs() <= ENDPOINT_EPS && (a.y - b.y).abs() <= ENDPOINT_EPS
}

fn is_ring(chain: &[Coord<f64>]) -> bool {
    chain.len() >= 4 && coords_close(chain[0], chain[chain.len() - 1])
}

fn snap_closed(chain: &mut [Coord<f64>]) {
    if chain.len() >= 4 && coords_close(chain[0], chain[chain.len() - 1]) {
        let first = chain[0];
        let last = chain.len() - 1;
        chain[last] = first;
    }
}

fn take_attachable(
    pool: &mut Vec<Vec<Coord<f64>>>,
    chain: &[Coord<f64>],
) -> Option<Vec<Coord<f64>>> {
    let head = chain[0];
    let tail = chain[chain.len() - 1];
    let position = pool.iter().position(|seg| {
        let s0 = seg[0];
        let s1 = seg[seg.len() - 1];
        coords_close(tail, s0)
            || coords_close(tail, s1)
            || coords_close(head, s0)
            || coords_close(head, s1)
    })?;
    Some(pool.swap_remove(position))
}

fn attach(chain: &mut Vec<Coord<f64>>, mut segment: Vec<Coord<f64>>) {
    let tail = chain[chain.len() - 1];
    let head = chain[0];

    if coords_close(tail, segment[0]) {
        chain.extend(segment.into_iter().skip(1));
    } else if coords_close(tail, segment[segment.len() - 1]) {
        segment.reverse();
        chain.extend(segment.into_iter().skip(1));
    } else if coords_close(head, segment[segment.len() - 1]) {
        segment.pop();
        segment.extend(chain.iter().copied());
        *chain = segment;
    } else {
        // head matches segment start
        segment.reverse();
        segment.pop();
        segment.extend(chain.iter().copied());
        *chain = segment;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{coord, Area, BoundingRect};

    fn line(coords: &[(f64, f64)]) -> LineString<f64> {
        LineString::new(coords.iter().map(|&(x, y)| coord! { x: x, y: y }).collect())
    }

    #[test]
    fn crop_keeps_output_inside_bbox() {
        let bbox = BoundingBox::new(5.5, 42.5, 7.5, 43.5);
        let lines = MultiLineString::new(vec![
            line(&[(5.0, 43.0), (6.0, 43.0), (8.0, 43.0)]),
            line(&[(6.2, 42.0), (6.2, 44.0)]),
        ]);
        let cropped = crop(&lines, &bbox);
        assert!(!cropped.0.is_empty());
        for ls in &cropped.0 {
            for c in &ls.0 {
                assert!(c.x >= bbox.west - 1e-9 && c.x <= bbox.east + 1e-9);
                assert!(c.y >= bbox.south - 1e-9 && c.y <= bbox.north + 1e-9);
            }
        }
    }

    #[test]
    fn merge_stitches_split_ring() {
        let lines = MultiLineString::new(vec![
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]),
            line(&[(0.0, 1.0), (0.0, 0.0)]),
        ]);
        let merged = merge(&lines);
        assert_eq!(merged.0.len(), 1);
        assert!(merged.0[0].is_closed());
        assert_eq!(merged.0[0].0.len(), 5);
    }

    #[test]
    fn merge_handles_reversed_segments() {
        let lines = MultiLineString::new(vec![
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            // Runs backwards relative to the first segment.
            line(&[(1.0, 1.0), (1.0, 0.0)]),
            line(&[(1.0, 1.0), (0.0, 0.0)]),
        ]);
        let merged = merge(&lines);
        assert_eq!(merged.0.len(), 1);
        assert!(merged.0[0].is_closed());
    }

    #[test]
    fn merge_is_idempotent() {
        let lines = MultiLineString::new(vec![
            line(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
            line(&[(1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]),
            line(&[(5.0, 5.0), (6.0, 5.0)]),
        ]);
        let once = merge(&lines);
        let twice = merge(&once);
        assert_eq!(once.0.len(), twice.0.len());
        let mut sizes_once: Vec<usize> = once.0.iter().map(|l| l.0.len()).collect();
        let mut sizes_twice: Vec<usize> = twice.0.iter().map(|l| l.0.len()).collect();
        sizes_once.sort_unstable();
        sizes_twice.sort_unstable();
        assert_eq!(sizes_once, sizes_twice);
    }

    #[test]
    fn polygonize_accepts_closed_ring() {
        let ring = MultiLineString::new(vec![line(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (0.0, 0.0),
        ])]);
        let polygons = polygonize(&ring).unwrap();
        assert_eq!(polygons.0.len(), 1);
        assert_relative_eq!(polygons.unsigned_area(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn polygonize_rejects_open_input() {
        let open = MultiLineString::new(vec![line(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)])]);
        let err = polygonize(&open).unwrap_err();
        assert!(err.to_string().contains("closed ring"));
    }

    // Stub fetch returning a closed loop tracing a rectangle well inside the
    // crop box must come out as that single polygon.
    #[test]
    fn closed_loop_survives_full_processing() {
        let bbox = BoundingBox::new(5.5, 42.5, 7.5, 43.5);
        let loop_lines = MultiLineString::new(vec![line(&[
            (6.0, 42.9),
            (6.5, 42.9),
            (6.5, 43.1),
            (6.0, 43.1),
            (6.0, 42.9),
        ])]);
        let polygons = process(&loop_lines, &bbox).unwrap();
        assert_eq!(polygons.0.len(), 1);

        let rect = polygons.bounding_rect().unwrap();
        assert_relative_eq!(rect.min().x, 6.0, epsilon = 1e-9);
        assert_relative_eq!(rect.min().y, 42.9, epsilon = 1e-9);
        assert_relative_eq!(rect.max().x, 6.5, epsilon = 1e-9);
        assert_relative_eq!(rect.max().y, 43.1, epsilon = 1e-9);
        assert_relative_eq!(polygons.unsigned_area(), 0.1, epsilon = 1e-9);
    }
}
