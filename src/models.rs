use imageproc::geometry::arc_length;
use imageproc::point::Point;

use crate::error::{DetectionError, Result};

/// Stabilizes the corner cosine against zero-length edges
const COSINE_EPSILON: f64 = 1e-10;

/// Axis-aligned box in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Closed polyline; edges run `points[i] -> points[(i + 1) % n]`
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub points: Vec<Point<i32>>,
}

impl Polygon {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn from_coords(coords: &[(i32, i32)]) -> Self {
        Self::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Length of the closed outline
    pub fn perimeter(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        arc_length(&self.points, true)
    }

    /// Shoelace area; the sign follows the vertex orientation
    pub fn signed_area(&self) -> Result<f64> {
        self.require(3)?;
        let n = self.points.len();
        let twice: i64 = (0..n)
            .map(|i| {
                let p = self.points[i];
                let q = self.points[(i + 1) % n];
                p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64
            })
            .sum();
        Ok(twice as f64 / 2.0)
    }

    pub fn area(&self) -> Result<f64> {
        Ok(self.signed_area()?.abs())
    }

    /// True when every turn along the outline goes the same way.
    /// Collinear vertices do not break convexity on their own.
    pub fn is_convex(&self) -> Result<bool> {
        self.require(3)?;
        let n = self.points.len();
        let mut orientation = 0i64;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            let c = self.points[(i + 2) % n];
            let cross = (b.x - a.x) as i64 * (c.y - b.y) as i64
                - (b.y - a.y) as i64 * (c.x - b.x) as i64;
            if cross == 0 {
                continue;
            }
            let sign = cross.signum();
            if orientation == 0 {
                orientation = sign;
            } else if sign != orientation {
                return Ok(false);
            }
        }
        Ok(orientation != 0)
    }

    /// Cosine of the interior angle at vertex `index`
    pub fn corner_cosine(&self, index: usize) -> Result<f64> {
        self.require(3)?;
        let n = self.points.len();
        let corner = self.points[index % n];
        let prev = self.points[(index + n - 1) % n];
        let next = self.points[(index + 1) % n];
        Ok(angle_cosine(prev, next, corner))
    }

    /// Largest |cos| over all corners; 0 for a perfect rectangle
    pub fn max_corner_cosine(&self) -> Result<f64> {
        self.require(3)?;
        let mut max_cosine = 0.0f64;
        for i in 0..self.points.len() {
            max_cosine = max_cosine.max(self.corner_cosine(i)?.abs());
        }
        Ok(max_cosine)
    }

    /// Bounding box of the points, clipped to non-negative coordinates
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let min_x = self.points.iter().map(|p| p.x).min()?.max(0);
        let min_y = self.points.iter().map(|p| p.y).min()?.max(0);
        let max_x = self.points.iter().map(|p| p.x).max()?;
        let max_y = self.points.iter().map(|p| p.y).max()?;
        if max_x < min_x || max_y < min_y {
            return None;
        }
        Some(BoundingBox {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    fn require(&self, required: usize) -> Result<()> {
        if self.points.len() < required {
            return Err(DetectionError::InvalidGeometry {
                required,
                actual: self.points.len(),
            });
        }
        Ok(())
    }
}

/// Cosine of the angle at `pt0` between the rays towards `pt1` and `pt2`
pub fn angle_cosine(pt1: Point<i32>, pt2: Point<i32>, pt0: Point<i32>) -> f64 {
    let dx1 = (pt1.x - pt0.x) as f64;
    let dy1 = (pt1.y - pt0.y) as f64;
    let dx2 = (pt2.x - pt0.x) as f64;
    let dy2 = (pt2.y - pt0.y) as f64;
    let norm = (dx1 * dx1 + dy1 * dy1).sqrt() * (dx2 * dx2 + dy2 * dy2).sqrt();
    (dx1 * dx2 + dy1 * dy2) / (norm + COSINE_EPSILON)
}

/// An accepted quadrilateral and the mask it was found in
#[derive(Debug, Clone, PartialEq)]
pub struct RectDetection {
    pub polygon: Polygon,
    pub channel: usize,
    pub level: usize,
}

impl RectDetection {
    pub fn corners(&self) -> &[Point<i32>] {
        &self.polygon.points
    }
}

/// Accepted quadrilaterals in discovery order: channel, then level,
/// then contour scan order. Read-only once the pipeline returns it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    detections: Vec<RectDetection>,
}

impl ResultSet {
    pub(crate) fn from_detections(detections: Vec<RectDetection>) -> Self {
        Self { detections }
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RectDetection> {
        self.detections.iter()
    }

    pub fn detections(&self) -> &[RectDetection] {
        &self.detections
    }

    pub fn polygons(&self) -> impl Iterator<Item = &Polygon> {
        self.detections.iter().map(|d| &d.polygon)
    }

    pub fn into_vec(self) -> Vec<RectDetection> {
        self.detections
    }
}

impl IntoIterator for ResultSet {
    type Item = RectDetection;
    type IntoIter = std::vec::IntoIter<RectDetection>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a RectDetection;
    type IntoIter = std::slice::Iter<'a, RectDetection>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.iter()
    }
}

/// Text recognized in one region of the image
#[derive(Debug, Clone)]
pub struct RegionText {
    /// Region the text was read from (None means the whole image)
    pub bbox: Option<BoundingBox>,
    pub text: String,
}
