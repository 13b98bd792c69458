use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, Blend};
use imageproc::rect::Rect;

use crate::pipeline::{Detection, Region};
use crate::render::RenderedMask;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxStyle {
    pub color: Rgba<u8>,
    /// Border width in pixels, drawn inside the box.
    pub thickness: u32,
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self {
            color: Rgba([255, 255, 51, 102]),
            thickness: 5,
        }
    }
}

/// Stretches `mask` over `region` of `base` and alpha-blends it in.
/// `opacity` scales every mask pixel's own alpha.
pub fn blend_mask(base: &mut RgbaImage, mask: &RenderedMask, region: Region, opacity: f32) {
    if mask.width() == 0 || mask.height() == 0 || region.width == 0 || region.height == 0 {
        return;
    }
    let opacity = opacity.clamp(0.0, 1.0);
    let mut scaled = imageops::resize(mask, region.width, region.height, FilterType::Nearest);
    for pixel in scaled.pixels_mut() {
        pixel[3] = (pixel[3] as f32 * opacity).round() as u8;
    }
    imageops::overlay(base, &scaled, region.x as i64, region.y as i64);
}

/// Hollow rectangle per detection, boxes given relative to `region`.
pub fn draw_detections(
    base: &mut RgbaImage,
    detections: &[Detection],
    region: Region,
    style: BoxStyle,
) {
    let mut canvas = Blend(std::mem::take(base));
    for det in detections {
        let (x0, y0) = region.to_source(det.bbox.xmin, det.bbox.ymin);
        let (x1, y1) = region.to_source(det.bbox.xmax, det.bbox.ymax);
        let (left, top) = (x0.round() as i32, y0.round() as i32);
        let (right, bottom) = (x1.round() as i32, y1.round() as i32);
        // one nested ring per pixel of thickness, the outer ring on the box edge
        for inset in 0..style.thickness as i32 {
            let width = right - left - 2 * inset;
            let height = bottom - top - 2 * inset;
            if width <= 0 || height <= 0 {
                break;
            }
            let rect = Rect::at(left + inset, top + inset).of_size(width as u32, height as u32);
            draw_hollow_rect_mut(&mut canvas, rect, style.color);
        }
    }
    *base = canvas.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::BoundingBox;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

    fn det(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Detection {
        Detection {
            class: "person".to_string(),
            class_id: 0,
            score: 0.9,
            bbox: BoundingBox { xmin, ymin, xmax, ymax },
        }
    }

    #[test]
    fn test_blend_mask_keeps_transparent_cells() {
        let mut base = RgbaImage::from_pixel(4, 2, WHITE);
        let mut mask = RgbaImage::new(2, 1);
        mask.put_pixel(1, 0, RED);
        blend_mask(&mut base, &mask, Region::full(4, 2), 1.0);
        assert_eq!(base.get_pixel(0, 0), &WHITE);
        assert_eq!(base.get_pixel(1, 1), &WHITE);
        assert_eq!(base.get_pixel(2, 0), &RED);
        assert_eq!(base.get_pixel(3, 1), &RED);
    }

    #[test]
    fn test_blend_mask_opacity() {
        let mut base = RgbaImage::from_pixel(1, 1, WHITE);
        let mask = RgbaImage::from_pixel(1, 1, RED);
        blend_mask(&mut base, &mask, Region::full(1, 1), 0.5);
        let px = base.get_pixel(0, 0);
        assert!(px[0] >= 254);
        assert!((px[1] as i32 - 127).abs() <= 2);
        assert!(px[3] >= 254);

        let mut untouched = RgbaImage::from_pixel(1, 1, WHITE);
        blend_mask(&mut untouched, &mask, Region::full(1, 1), 0.0);
        assert_eq!(untouched.get_pixel(0, 0), &WHITE);
    }

    #[test]
    fn test_blend_mask_into_region() {
        let mut base = RgbaImage::from_pixel(6, 2, WHITE);
        let mask = RgbaImage::from_pixel(1, 1, RED);
        blend_mask(&mut base, &mask, Region { x: 2, y: 0, width: 2, height: 2 }, 1.0);
        assert_eq!(base.get_pixel(1, 0), &WHITE);
        assert_eq!(base.get_pixel(2, 0), &RED);
        assert_eq!(base.get_pixel(3, 1), &RED);
        assert_eq!(base.get_pixel(4, 1), &WHITE);
    }

    #[test]
    fn test_blend_empty_mask_is_noop() {
        let mut base = RgbaImage::from_pixel(2, 2, WHITE);
        blend_mask(&mut base, &RgbaImage::new(0, 0), Region::full(2, 2), 1.0);
        assert!(base.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_draw_box_border() {
        let mut base = RgbaImage::from_pixel(20, 20, BLACK);
        let style = BoxStyle { color: GREEN, thickness: 2 };
        draw_detections(&mut base, &[det(0.25, 0.25, 0.75, 0.75)], Region::full(20, 20), style);
        assert_eq!(base.get_pixel(5, 5), &GREEN);
        assert_eq!(base.get_pixel(6, 10), &GREEN);
        assert_eq!(base.get_pixel(14, 10), &GREEN);
        assert_eq!(base.get_pixel(10, 14), &GREEN);
        assert_eq!(base.get_pixel(7, 10), &BLACK);
        assert_eq!(base.get_pixel(10, 10), &BLACK);
        assert_eq!(base.get_pixel(15, 10), &BLACK);
        assert_eq!(base.get_pixel(4, 4), &BLACK);
    }

    #[test]
    fn test_draw_box_blends_translucent_color() {
        let mut base = RgbaImage::from_pixel(10, 10, WHITE);
        let style = BoxStyle { color: Rgba([0, 0, 0, 128]), thickness: 1 };
        draw_detections(&mut base, &[det(0.2, 0.2, 0.8, 0.8)], Region::full(10, 10), style);
        let edge = base.get_pixel(5, 2);
        assert!(edge[0] > 100 && edge[0] < 150);
        assert!(edge[3] >= 254);
        assert_eq!(base.get_pixel(5, 5), &WHITE);
    }

    #[test]
    fn test_draw_box_thicker_than_box() {
        let mut base = RgbaImage::from_pixel(10, 10, BLACK);
        let style = BoxStyle { color: GREEN, thickness: 10 };
        draw_detections(&mut base, &[det(0.0, 0.0, 0.4, 0.4)], Region::full(10, 10), style);
        assert!((0..4).all(|x| (0..4).all(|y| base.get_pixel(x, y) == &GREEN)));
        assert_eq!(base.get_pixel(4, 4), &BLACK);
    }

    #[test]
    fn test_draw_box_clipped_to_image() {
        let mut base = RgbaImage::from_pixel(10, 10, BLACK);
        let style = BoxStyle { color: GREEN, thickness: 1 };
        // region hangs off the left edge, as with letterboxed input
        let region = Region { x: -10, y: 0, width: 20, height: 10 };
        draw_detections(&mut base, &[det(0.0, 0.0, 1.0, 1.0)], region, style);
        assert_eq!(base.get_pixel(0, 5), &BLACK);
        assert_eq!(base.get_pixel(9, 5), &GREEN);
        assert_eq!(base.get_pixel(5, 0), &GREEN);
        assert_eq!(base.get_pixel(5, 9), &GREEN);
    }
}
