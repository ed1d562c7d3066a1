use super::{BoundingBox, Mask};
use image::imageops;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

/// Trace the outermost borders of all foreground regions in `mask`
///
/// Holes, and anything nested inside a hole, are skipped. Each contour is
/// compressed with [`approximate_simple`].
pub fn external_contours(mask: &Mask) -> Vec<Vec<Point<i32>>> {
    let _span = tracing::debug_span!("find_contours").entered();

    // Border following needs a background pixel left of every outer border,
    // so regions touching the frame edge are traced on a 1 px zero frame.
    let (width, height) = mask.dimensions();
    let mut padded = Mask::new(width + 2, height + 2);
    imageops::replace(&mut padded, mask, 1, 1);

    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            let points: Vec<Point<i32>> = c
                .points
                .iter()
                .map(|p| Point::new(p.x - 1, p.y - 1))
                .collect();
            approximate_simple(&points)
        })
        .collect()
}

/// Collapse horizontal, vertical and diagonal runs to their end points
pub fn approximate_simple(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    points
        .iter()
        .enumerate()
        .filter(|(i, p)| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            (p.x - prev.x, p.y - prev.y) != (next.x - p.x, next.y - p.y)
        })
        .map(|(_, p)| *p)
        .collect()
}

/// Area enclosed by a closed polygon (shoelace formula, unsigned)
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let twice: i64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
        })
        .sum();

    (twice as f64 / 2.0).abs()
}

/// Smallest axis-aligned rectangle containing every point
pub fn bounding_rect(points: &[Point<i32>]) -> Option<BoundingBox> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;

    Some(BoundingBox {
        x: min_x,
        y: min_y,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    })
}

/// Bounding boxes of the external contours whose area is at least `min_area`
pub fn accepted_boxes(mask: &Mask, min_area: f64) -> Vec<BoundingBox> {
    let contours = external_contours(mask);
    let total = contours.len();

    let boxes: Vec<BoundingBox> = contours
        .iter()
        .filter(|c| contour_area(c) >= min_area)
        .filter_map(|c| bounding_rect(c))
        .collect();

    tracing::debug!(
        "{} contours, {} rejected below area {}",
        total,
        total - boxes.len(),
        min_area
    );

    boxes
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn fill(mask: &mut Mask, x0: u32, y0: u32, width: u32, height: u32, value: u8) {
        for y in y0..y0 + height {
            for x in x0..x0 + width {
                mask.put_pixel(x, y, Luma([value]));
            }
        }
    }

    #[test]
    fn square_compresses_to_corners() {
        let mut mask = Mask::new(100, 100);
        fill(&mut mask, 40, 30, 50, 50, 255);

        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 4);
        for corner in [
            Point::new(40, 30),
            Point::new(89, 30),
            Point::new(89, 79),
            Point::new(40, 79),
        ] {
            assert!(contours[0].contains(&corner));
        }
    }

    #[test]
    fn block_area_and_box() {
        let mut mask = Mask::new(100, 100);
        fill(&mut mask, 40, 30, 50, 50, 255);

        let contours = external_contours(&mask);
        assert_eq!(contour_area(&contours[0]), 2401.0);

        let boxes = accepted_boxes(&mask, 100.0);
        assert_eq!(
            boxes,
            vec![BoundingBox {
                x: 40,
                y: 30,
                width: 50,
                height: 50
            }]
        );
    }

    #[test]
    fn small_speck_is_rejected() {
        let mut mask = Mask::new(40, 40);
        fill(&mut mask, 10, 10, 5, 5, 255);

        assert_eq!(external_contours(&mask).len(), 1);
        assert!(accepted_boxes(&mask, 100.0).is_empty());
    }

    #[test]
    fn area_threshold_is_inclusive() {
        // 11x11 pixels trace a 10x10 polygon
        let mut mask = Mask::new(40, 40);
        fill(&mut mask, 5, 5, 11, 11, 255);

        assert_eq!(accepted_boxes(&mask, 100.0).len(), 1);
        assert!(accepted_boxes(&mask, 100.5).is_empty());
    }

    #[test]
    fn holes_and_nested_regions_are_ignored() {
        let mut mask = Mask::new(80, 80);
        fill(&mut mask, 10, 10, 40, 40, 255);
        fill(&mut mask, 20, 20, 20, 20, 0);
        fill(&mut mask, 25, 25, 10, 10, 255);

        let boxes = accepted_boxes(&mask, 0.0);
        assert_eq!(
            boxes,
            vec![BoundingBox {
                x: 10,
                y: 10,
                width: 40,
                height: 40
            }]
        );
    }

    #[test]
    fn region_on_left_edge_is_found() {
        let mut mask = Mask::new(80, 60);
        fill(&mut mask, 0, 10, 30, 30, 255);

        assert_eq!(
            accepted_boxes(&mask, 100.0),
            vec![BoundingBox {
                x: 0,
                y: 10,
                width: 30,
                height: 30
            }]
        );
    }

    #[test]
    fn region_on_top_edge_is_found() {
        let mut mask = Mask::new(80, 60);
        fill(&mut mask, 20, 0, 30, 30, 255);

        assert_eq!(
            accepted_boxes(&mask, 100.0),
            vec![BoundingBox {
                x: 20,
                y: 0,
                width: 30,
                height: 30
            }]
        );
    }

    #[test]
    fn region_on_right_edge_is_found() {
        let mut mask = Mask::new(80, 60);
        fill(&mut mask, 50, 15, 30, 30, 255);

        assert_eq!(
            accepted_boxes(&mask, 100.0),
            vec![BoundingBox {
                x: 50,
                y: 15,
                width: 30,
                height: 30
            }]
        );
    }

    #[test]
    fn full_frame_mask_is_one_region() {
        let mut mask = Mask::new(48, 36);
        fill(&mut mask, 0, 0, 48, 36, 127);

        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contour_area(&contours[0]), 47.0 * 35.0);
        assert_eq!(
            accepted_boxes(&mask, 100.0),
            vec![BoundingBox {
                x: 0,
                y: 0,
                width: 48,
                height: 36
            }]
        );
    }

    #[test]
    fn ring_along_frame_edges_is_one_region() {
        let mut mask = Mask::new(40, 40);
        fill(&mut mask, 0, 0, 40, 40, 255);
        fill(&mut mask, 5, 5, 30, 30, 0);

        let boxes = accepted_boxes(&mask, 0.0);
        assert_eq!(boxes.len(), 1);
        assert_eq!((boxes[0].width, boxes[0].height), (40, 40));
    }

    #[test]
    fn separate_regions_get_separate_boxes() {
        let mut mask = Mask::new(120, 60);
        fill(&mut mask, 5, 5, 20, 20, 255);
        fill(&mut mask, 60, 20, 30, 30, 127);

        let mut boxes = accepted_boxes(&mask, 100.0);
        boxes.sort_by_key(|b| b.x);
        assert_eq!(boxes.len(), 2);
        assert_eq!((boxes[0].x, boxes[0].y), (5, 5));
        assert_eq!((boxes[1].width, boxes[1].height), (30, 30));
    }

    #[test]
    fn line_collapses_to_end_points() {
        let points = vec![
            Point::new(0, 0),
            Point::new(1, 0),
            Point::new(2, 0),
            Point::new(1, 0),
        ];
        assert_eq!(
            approximate_simple(&points),
            vec![Point::new(0, 0), Point::new(2, 0)]
        );
    }

    #[test]
    fn degenerate_contours() {
        let single = vec![Point::new(3, 4)];
        assert_eq!(contour_area(&single), 0.0);
        assert_eq!(
            bounding_rect(&single),
            Some(BoundingBox {
                x: 3,
                y: 4,
                width: 1,
                height: 1
            })
        );
        assert_eq!(bounding_rect(&[]), None);
    }

    #[test]
    fn triangle_area() {
        let triangle = vec![Point::new(0, 0), Point::new(10, 0), Point::new(0, 10)];
        assert_eq!(contour_area(&triangle), 50.0);
    }
}
