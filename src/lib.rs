//! Semantic segmentation and object detection overlays for still images,
//! run on two TensorFlow Lite models.

mod error;

pub mod app;
pub mod pipeline;
pub mod render;

pub use error::{Error, Result};
