use crate::detection::BoundingBox;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

/// Draw a hollow rectangle around each box, `thickness` pixels wide
///
/// The border grows inwards so it never leaves the box.
pub fn draw_boxes(frame: &mut RgbImage, boxes: &[BoundingBox], color: Rgb<u8>, thickness: u32) {
    for b in boxes {
        for t in 0..thickness {
            let width = b.width as i64 - 2 * t as i64;
            let height = b.height as i64 - 2 * t as i64;
            if width <= 0 || height <= 0 {
                break;
            }

            let rect = Rect::at(b.x + t as i32, b.y + t as i32).of_size(width as u32, height as u32);
            draw_hollow_rect_mut(frame, rect, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

    fn bbox(x: i32, y: i32, width: u32, height: u32) -> BoundingBox {
        BoundingBox {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn border_is_two_pixels_thick() {
        let mut frame = RgbImage::new(40, 40);
        draw_boxes(&mut frame, &[bbox(5, 5, 20, 10)], GREEN, 2);

        assert_eq!(*frame.get_pixel(5, 5), GREEN);
        assert_eq!(*frame.get_pixel(6, 6), GREEN);
        assert_eq!(*frame.get_pixel(24, 14), GREEN);
        assert_eq!(*frame.get_pixel(23, 13), GREEN);
        assert_eq!(*frame.get_pixel(7, 7), Rgb([0, 0, 0]));
        assert_eq!(*frame.get_pixel(4, 4), Rgb([0, 0, 0]));
        assert_eq!(*frame.get_pixel(25, 15), Rgb([0, 0, 0]));
    }

    #[test]
    fn boxes_touching_the_edge_are_clipped() {
        let mut frame = RgbImage::new(10, 10);
        draw_boxes(&mut frame, &[bbox(6, 6, 8, 8)], GREEN, 2);
        assert_eq!(*frame.get_pixel(6, 9), GREEN);
    }

    #[test]
    fn tiny_boxes_do_not_panic() {
        let mut frame = RgbImage::new(10, 10);
        draw_boxes(&mut frame, &[bbox(2, 2, 1, 1), bbox(4, 4, 2, 3)], GREEN, 2);
        assert_eq!(*frame.get_pixel(2, 2), GREEN);
    }

    #[test]
    fn nothing_to_draw() {
        let mut frame = RgbImage::new(4, 4);
        draw_boxes(&mut frame, &[], GREEN, 2);
        assert!(frame.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
