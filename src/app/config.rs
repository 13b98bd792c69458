use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use config::{Config, ConfigError};

use crate::pipeline::CropAndScale;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub segmentation: SegmentationConfig,
    pub detection: DetectionConfig,
    pub overlay: OverlayConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub model_filename: PathBuf,
    /// PASCAL VOC names are used when unset.
    pub label_filename: Option<PathBuf>,
    pub num_threads: u8,
    pub crop: CropAndScale,
    pub input_mean: f32,
    pub input_std: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub model_filename: PathBuf,
    pub label_filename: PathBuf,
    pub threshold: f32,
    pub num_threads: u8,
    pub crop: CropAndScale,
    pub input_mean: f32,
    pub input_std: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub mask_opacity: f32,
    pub box_color: [u8; 4],
    pub box_thickness: u32,
    /// Replaces the built-in PASCAL VOC palette when set.
    pub palette: Option<Vec<[u8; 4]>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub write_mask: bool,
    pub write_report: bool,
}

impl fmt::Display for SegmentationConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "segmenter {}, {} threads, {:?}",
            self.model_filename.display(), self.num_threads, self.crop
        )
    }
}

impl fmt::Display for DetectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "detector {}, threshold {}, {} threads, {:?}",
            self.model_filename.display(), self.threshold, self.num_threads, self.crop
        )
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            model_filename: PathBuf::from("models/deeplabv3_257_mv_gpu.tflite"),
            label_filename: None,
            num_threads: 2,
            crop: CropAndScale::ScaleFill,
            input_mean: 127.5,
            input_std: 127.5,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            model_filename: PathBuf::from("models/ssd_mobilenet_v2_coco_quant_postprocess.tflite"),
            label_filename: PathBuf::from("models/coco_labels.txt"),
            threshold: 0.5,
            num_threads: 2,
            crop: CropAndScale::ScaleFill,
            input_mean: 127.5,
            input_std: 127.5,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            mask_opacity: 0.5,
            box_color: [255, 255, 51, 102],
            box_thickness: 5,
            palette: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("out"),
            write_mask: true,
            write_report: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            segmentation: SegmentationConfig::default(),
            detection: DetectionConfig::default(),
            overlay: OverlayConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::from(path))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Environment overrides on top of the built-in defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder().add_source(environment()).build()?.try_deserialize()
    }
}

// SEGLENS_<SECTION>__<KEY>, e.g. SEGLENS_OUTPUT__DIRECTORY
fn environment() -> config::Environment {
    config::Environment::with_prefix("seglens")
        .prefix_separator("_")
        .separator("__")
}
