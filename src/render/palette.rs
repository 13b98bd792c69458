use image::Rgba;

use crate::error::{Error, Result};

/// PASCAL VOC color map, one entry per DeepLabV3 class.
/// Background is left transparent so the photo shows through.
const PASCAL_VOC: [[u8; 4]; 21] = [
    [0, 0, 0, 0],
    [128, 0, 0, 255],
    [0, 128, 0, 255],
    [128, 128, 0, 255],
    [0, 0, 128, 255],
    [128, 0, 128, 255],
    [0, 128, 128, 255],
    [128, 128, 128, 255],
    [64, 0, 0, 255],
    [192, 0, 0, 255],
    [64, 128, 0, 255],
    [192, 128, 0, 255],
    [64, 0, 128, 255],
    [192, 0, 128, 255],
    [64, 128, 128, 255],
    [192, 128, 128, 255],
    [0, 64, 0, 255],
    [128, 64, 0, 255],
    [0, 192, 0, 255],
    [128, 192, 0, 255],
    [0, 64, 128, 255],
];

/// Class-indexed display colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgba<u8>>,
}

impl Palette {
    pub fn new(colors: Vec<Rgba<u8>>) -> Result<Self> {
        if colors.is_empty() {
            return Err(Error::Palette);
        }
        Ok(Self { colors })
    }

    pub fn pascal_voc() -> Self {
        Self {
            colors: PASCAL_VOC.iter().map(|c| Rgba(*c)).collect(),
        }
    }

    pub fn from_config(colors: &[[u8; 4]]) -> Result<Self> {
        Self::new(colors.iter().map(|c| Rgba(*c)).collect())
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// `None` for negative labels or labels past the last entry.
    pub fn get(&self, label: i32) -> Option<Rgba<u8>> {
        usize::try_from(label).ok().and_then(|i| self.colors.get(i)).copied()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::pascal_voc()
    }
}
