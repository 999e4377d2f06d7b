use imageproc::point::Point;

use crate::models::RectDetection;

/// Drop detections whose corners all lie within `tolerance` pixels of an
/// earlier kept detection. Corner order may differ by rotation or direction.
/// The first occurrence wins, so the result keeps discovery order.
pub fn dedup_by_corners(detections: Vec<RectDetection>, tolerance: f64) -> Vec<RectDetection> {
    let t2 = tolerance * tolerance;
    let mut kept: Vec<RectDetection> = Vec::with_capacity(detections.len());

    for det in detections {
        let duplicate = kept
            .iter()
            .any(|k| corners_match(&k.polygon.points, &det.polygon.points, t2));
        if !duplicate {
            kept.push(det);
        }
    }

    kept
}

fn corners_match(a: &[Point<i32>], b: &[Point<i32>], t2: f64) -> bool {
    let n = a.len();
    if n == 0 || n != b.len() {
        return false;
    }

    let close = |p: Point<i32>, q: Point<i32>| {
        let dx = (p.x - q.x) as f64;
        let dy = (p.y - q.y) as f64;
        dx * dx + dy * dy <= t2
    };

    (0..n).any(|shift| {
        let forward = (0..n).all(|i| close(a[i], b[(i + shift) % n]));
        let backward = (0..n).all(|i| close(a[i], b[(shift + n - i) % n]));
        forward || backward
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Polygon;

    fn det(coords: &[(i32, i32)], channel: usize) -> RectDetection {
        RectDetection {
            polygon: Polygon::from_coords(coords),
            channel,
            level: 0,
        }
    }

    #[test]
    fn rotated_and_reversed_duplicates_are_merged() {
        let detections = vec![
            det(&[(0, 0), (100, 0), (100, 100), (0, 100)], 0),
            det(&[(101, 1), (101, 99), (1, 99), (1, 1)], 1),
            det(&[(200, 200), (300, 200), (300, 300), (200, 300)], 2),
        ];
        let kept = dedup_by_corners(detections, 3.0);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].channel, 0);
        assert_eq!(kept[1].channel, 2);
    }

    #[test]
    fn zero_tolerance_only_merges_exact_copies() {
        let detections = vec![
            det(&[(0, 0), (100, 0), (100, 100), (0, 100)], 0),
            det(&[(0, 0), (100, 0), (100, 100), (0, 100)], 1),
            det(&[(0, 0), (101, 0), (100, 100), (0, 100)], 2),
        ];
        assert_eq!(dedup_by_corners(detections, 0.0).len(), 2);
    }
}
