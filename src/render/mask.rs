use image::{Rgba, RgbaImage};

use crate::error::{Error, Result};
use crate::render::Palette;

/// Color written for any cell whose label has no palette entry.
pub const FALLBACK: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Mask pixels ready to be handed to a display surface.
pub type RenderedMask = RgbaImage;

/// Per-pixel class ids produced by a segmentation network, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassIndexGrid {
    width: u32,
    height: u32,
    labels: Vec<i32>,
}

impl ClassIndexGrid {
    pub fn new(width: u32, height: u32, labels: Vec<i32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if labels.len() != expected {
            return Err(Error::GridShape {
                width,
                height,
                expected,
                actual: labels.len(),
            });
        }
        Ok(Self { width, height, labels })
    }

    pub fn empty() -> Self {
        Self { width: 0, height: 0, labels: Vec::new() }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn get(&self, x: u32, y: u32) -> Option<i32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.labels.get((y as usize) * (self.width as usize) + x as usize).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskStats {
    /// Cells whose label fell outside the palette and got `FALLBACK`.
    pub out_of_range: usize,
}

/// Maps every cell of `grid` to its palette color.
pub fn render(grid: &ClassIndexGrid, palette: &Palette) -> RenderedMask {
    render_with_stats(grid, palette).0
}

/// Same as [`render`], also counting the cells that fell back.
pub fn render_with_stats(grid: &ClassIndexGrid, palette: &Palette) -> (RenderedMask, MaskStats) {
    let mut stats = MaskStats::default();
    let mut mask = RgbaImage::new(grid.width, grid.height);
    for (pixel, &label) in mask.pixels_mut().zip(grid.labels.iter()) {
        *pixel = match palette.get(label) {
            Some(color) => color,
            None => {
                stats.out_of_range += 1;
                FALLBACK
            }
        };
    }
    (mask, stats)
}
