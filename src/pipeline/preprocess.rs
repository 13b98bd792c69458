use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How a source image is fitted into a model's fixed input size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropAndScale {
    /// Stretch the whole image, ignoring aspect ratio.
    ScaleFill,
    /// Largest centered window with the model's aspect ratio.
    CenterCrop,
    /// Whole image, aspect kept, padded with black.
    ScaleFit,
}

/// Area of the source image, in source pixels, that fills the model input.
/// May extend past the image edges for `ScaleFit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }

    /// Normalized model-space point to source pixel coordinates.
    pub fn to_source(&self, nx: f32, ny: f32) -> (f32, f32) {
        (
            self.x as f32 + nx * self.width as f32,
            self.y as f32 + ny * self.height as f32,
        )
    }
}

pub struct Prepared {
    pub rgb: RgbImage,
    pub region: Region,
}

pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let img = image::open(path)?;
    tracing::debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        "loaded image"
    );
    Ok(img)
}

pub fn input_region(
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
    policy: CropAndScale,
) -> Region {
    if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
        return Region::full(src_w, src_h);
    }
    let sx = dst_w as f64 / src_w as f64;
    let sy = dst_h as f64 / src_h as f64;
    let scale = match policy {
        CropAndScale::ScaleFill => return Region::full(src_w, src_h),
        CropAndScale::CenterCrop => sx.max(sy),
        CropAndScale::ScaleFit => sx.min(sy),
    };
    let width = (dst_w as f64 / scale).round() as u32;
    let height = (dst_h as f64 / scale).round() as u32;
    Region {
        x: ((src_w as f64 - width as f64) / 2.0).round() as i32,
        y: ((src_h as f64 - height as f64) / 2.0).round() as i32,
        width,
        height,
    }
}

pub fn prepare(image: &DynamicImage, dst_w: u32, dst_h: u32, policy: CropAndScale) -> Prepared {
    let region = input_region(image.width(), image.height(), dst_w, dst_h, policy);
    let rgb = match policy {
        CropAndScale::ScaleFill => {
            imageops::resize(&image.to_rgb8(), dst_w, dst_h, FilterType::Triangle)
        }
        CropAndScale::CenterCrop => {
            let cropped = image.crop_imm(
                region.x.max(0) as u32,
                region.y.max(0) as u32,
                region.width,
                region.height,
            );
            imageops::resize(&cropped.to_rgb8(), dst_w, dst_h, FilterType::Triangle)
        }
        CropAndScale::ScaleFit => {
            let scale = dst_w as f64 / region.width.max(1) as f64;
            let fit_w = ((image.width() as f64 * scale).round() as u32).clamp(1, dst_w);
            let fit_h = ((image.height() as f64 * scale).round() as u32).clamp(1, dst_h);
            let fitted = imageops::resize(&image.to_rgb8(), fit_w, fit_h, FilterType::Triangle);
            let mut canvas = RgbImage::new(dst_w, dst_h);
            imageops::replace(
                &mut canvas,
                &fitted,
                ((dst_w - fit_w) / 2) as i64,
                ((dst_h - fit_h) / 2) as i64,
            );
            canvas
        }
    };
    tracing::trace!(?policy, ?region, "prepared {}x{} model input", dst_w, dst_h);
    Prepared { rgb, region }
}

/// `(v - mean) / std` per channel value, for float input tensors.
pub fn normalize(rgb: &RgbImage, mean: f32, std: f32) -> Vec<f32> {
    rgb.as_raw().iter().map(|&v| (v as f32 - mean) / std).collect()
}
