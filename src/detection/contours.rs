use image::GrayImage;
use imageproc::contours;
use imageproc::point::Point;

use crate::models::Polygon;

/// Find every outer and hole border of a binary mask as a flat list.
///
/// Nonzero pixels are foreground. Points inside straight horizontal,
/// vertical or diagonal runs are dropped so only the run endpoints remain.
pub fn find_contours(mask: &GrayImage) -> Vec<Polygon> {
    contours::find_contours::<i32>(mask)
        .into_iter()
        .map(|contour| Polygon::new(compress_chain(&contour.points)))
        .collect()
}

/// Keep only the points where the chain changes direction
pub fn compress_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let direction = |a: Point<i32>, b: Point<i32>| ((b.x - a.x).signum(), (b.y - a.y).signum());

    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let curr = points[i];
            let next = points[(i + 1) % n];
            direction(prev, curr) != direction(curr, next)
        })
        .map(|i| points[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn pts(coords: &[(i32, i32)]) -> Vec<Point<i32>> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn straight_runs_collapse_to_corners() {
        let chain = pts(&[(0, 0), (1, 0), (2, 0), (2, 1), (2, 2), (1, 2), (0, 2), (0, 1)]);
        assert_eq!(compress_chain(&chain), pts(&[(0, 0), (2, 0), (2, 2), (0, 2)]));
    }

    #[test]
    fn one_pixel_line_keeps_both_ends() {
        // Border of a thin line runs out and back over the same pixels
        let chain = pts(&[(0, 0), (1, 0), (2, 0), (3, 0), (2, 0), (1, 0)]);
        assert_eq!(compress_chain(&chain), pts(&[(0, 0), (3, 0)]));
    }

    #[test]
    fn empty_mask_has_no_contours() {
        let mask = GrayImage::new(20, 20);
        assert!(find_contours(&mask).is_empty());
    }

    #[test]
    fn filled_block_gives_its_four_corners() {
        let mut mask = GrayImage::new(20, 20);
        for y in 5..15 {
            for x in 3..13 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let contours = find_contours(&mask);
        assert_eq!(contours.len(), 1);
        let mut corners = contours[0].points.clone();
        corners.sort_by_key(|p| (p.y, p.x));
        assert_eq!(corners, pts(&[(3, 5), (12, 5), (3, 14), (12, 14)]));
    }
}
