use imageproc::point::Point;

use crate::config::DetectionConfig;
use crate::models::Polygon;

/// Passes at most this many farthest-point hops when picking the split anchors
const ANCHOR_ITERATIONS: usize = 3;

/// Geometric test that keeps rectangle-like quadrilaterals
#[derive(Debug, Clone)]
pub struct QuadFilter {
    pub min_area: f64,
    pub max_cosine: f64,
    pub epsilon_fraction: f64,
}

impl QuadFilter {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            min_area: config.min_area,
            max_cosine: config.max_cosine,
            epsilon_fraction: config.epsilon_fraction,
        }
    }

    /// Approximated quadrilaterals that pass every test, in input order
    pub fn filter(&self, contours: &[Polygon]) -> Vec<Polygon> {
        contours
            .iter()
            .filter_map(|contour| {
                let epsilon = contour.perimeter() * self.epsilon_fraction;
                let approx = approximate_polygon(contour, epsilon);
                self.accepts(&approx).then_some(approx)
            })
            .collect()
    }

    /// Tests an already approximated polygon
    pub fn accepts(&self, approx: &Polygon) -> bool {
        // Vertex count goes first so the geometry helpers never see fewer than 4 points
        if approx.len() != 4 {
            return false;
        }
        let large_enough = matches!(approx.area(), Ok(area) if area > self.min_area);
        let convex = matches!(approx.is_convex(), Ok(true));
        if !(large_enough && convex) {
            return false;
        }
        matches!(approx.max_corner_cosine(), Ok(cosine) if cosine < self.max_cosine)
    }
}

/// Douglas-Peucker simplification of a closed curve.
///
/// The curve is split at two mutually distant anchor points and each half is
/// simplified as an open chain. The result starts at the first anchor.
pub fn approximate_polygon(contour: &Polygon, epsilon: f64) -> Polygon {
    let points = &contour.points;
    let n = points.len();
    if n < 3 {
        return contour.clone();
    }

    let (start, end) = pick_anchors(points);
    if start == end {
        return Polygon::new(vec![points[start]]);
    }

    let first_half: Vec<Point<i32>> = walk(points, start, end);
    let second_half: Vec<Point<i32>> = walk(points, end, start);

    let mut result = Vec::new();
    simplify_open(&first_half, epsilon, &mut result);
    simplify_open(&second_half, epsilon, &mut result);
    Polygon::new(result)
}

/// Points from `from` to `to` inclusive, wrapping around the closed curve
fn walk(points: &[Point<i32>], from: usize, to: usize) -> Vec<Point<i32>> {
    let n = points.len();
    let count = (to + n - from) % n + 1;
    (0..count).map(|i| points[(from + i) % n]).collect()
}

fn pick_anchors(points: &[Point<i32>]) -> (usize, usize) {
    let mut start = 0;
    let mut end = 0;
    for _ in 0..ANCHOR_ITERATIONS {
        let far = farthest_from(points, points[start]);
        if far == end {
            break;
        }
        end = far;
        std::mem::swap(&mut start, &mut end);
    }
    (end, start)
}

fn farthest_from(points: &[Point<i32>], origin: Point<i32>) -> usize {
    let mut best = 0;
    let mut best_dist = -1i64;
    for (i, p) in points.iter().enumerate() {
        let dx = (p.x - origin.x) as i64;
        let dy = (p.y - origin.y) as i64;
        let dist = dx * dx + dy * dy;
        if dist > best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}

/// Append the kept vertices of an open chain, excluding its last point
fn simplify_open(chain: &[Point<i32>], epsilon: f64, out: &mut Vec<Point<i32>>) {
    if chain.is_empty() {
        return;
    }
    let last = chain.len() - 1;
    let mut keep = vec![false; chain.len()];
    keep[0] = true;

    let mut stack = vec![(0usize, last)];
    while let Some((lo, hi)) = stack.pop() {
        if hi <= lo + 1 {
            continue;
        }
        // Farthest point from the chord between the range ends
        let mut max_dist = 0.0;
        let mut index = lo;
        for i in lo + 1..hi {
            let d = segment_distance(chain[i], chain[lo], chain[hi]);
            if d > max_dist {
                max_dist = d;
                index = i;
            }
        }
        // Split there if it is outside the tolerance
        if max_dist > epsilon {
            keep[index] = true;
            stack.push((index, hi));
            stack.push((lo, index));
        }
    }

    // The last point opens the next half
    out.extend(
        chain[..last]
            .iter()
            .zip(keep.iter())
            .filter(|&(_, &k)| k)
            .map(|(p, _)| *p),
    );
}

/// Distance from `p` to the line through `a` and `b` (to `a` if they coincide)
fn segment_distance(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    let px = (p.x - a.x) as f64;
    let py = (p.y - a.y) as f64;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return (px * px + py * py).sqrt();
    }
    (dx * py - dy * px).abs() / len
}
