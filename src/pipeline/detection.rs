use image::DynamicImage;
use serde::Serialize;

use crate::app::config::DetectionConfig;
use crate::error::{Error, Result};
use crate::pipeline::interpreter::{
    build_interpreter, input_spec, write_input, InputSpec, TfInterpreter,
};
use crate::pipeline::labels::Labels;
use crate::pipeline::preprocess::{prepare, CropAndScale, Region};
use crate::pipeline::worker::Stage;

/// Normalized box, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub class: String,
    pub class_id: i32,
    pub score: f32,
    pub bbox: BoundingBox,
}

pub type Detections = Vec<Detection>;

#[derive(Debug, Clone)]
pub struct DetectionOutput {
    pub detections: Detections,
    pub region: Region,
}

/// SSD-style detector with post-processed outputs:
/// locations `[1, N, 4]`, classes `[1, N]`, scores `[1, N]`, count `[1]`.
pub struct DetectionStage<'a> {
    interpreter: TfInterpreter<'a>,
    input: InputSpec,
    labels: Labels,
    threshold: f32,
    crop: CropAndScale,
}

impl<'a> DetectionStage<'a> {
    pub fn new(config: &DetectionConfig) -> Result<Self> {
        let interpreter = build_interpreter(&config.model_filename, config.num_threads)?;
        let input = input_spec(&interpreter, config.input_mean, config.input_std)?;
        let outputs = interpreter.outputs().len();
        if outputs != 4 {
            return Err(Error::Model(format!("detector needs 4 output tensors, found {outputs}")));
        }
        let labels = Labels::from_file(&config.label_filename)?;
        tracing::info!(
            %config,
            width = input.width,
            height = input.height,
            labels = labels.len(),
            "loaded detector"
        );
        Ok(Self {
            interpreter,
            input,
            labels,
            threshold: config.threshold,
            crop: config.crop,
        })
    }

    pub fn detect(&mut self, image: &DynamicImage) -> Result<DetectionOutput> {
        let prepared = prepare(image, self.input.width, self.input.height, self.crop);
        write_input(&mut self.interpreter, &self.input, &prepared.rgb)?;
        self.interpreter.invoke()?;

        let outputs = self.interpreter.outputs().to_vec();
        let locations: &[f32] = self.interpreter.tensor_data(outputs[0])?;
        let classes: &[f32] = self.interpreter.tensor_data(outputs[1])?;
        let scores: &[f32] = self.interpreter.tensor_data(outputs[2])?;
        let raw_num_detections: &[f32] = self.interpreter.tensor_data(outputs[3])?;
        let num_detections = raw_num_detections.first().copied().unwrap_or(0.0) as usize;

        let detections = decode_detections(
            locations,
            classes,
            scores,
            num_detections,
            self.threshold,
            &self.labels,
        );
        Ok(DetectionOutput { detections, region: prepared.region })
    }
}

impl<'a> Stage for DetectionStage<'a> {
    type Output = DetectionOutput;

    fn infer(&mut self, image: &DynamicImage) -> Result<DetectionOutput> {
        self.detect(image)
    }
}

/// Keeps boxes scoring above `threshold`, clamped to the unit square.
pub fn decode_detections(
    locations: &[f32],
    classes: &[f32],
    scores: &[f32],
    num_detections: usize,
    threshold: f32,
    labels: &Labels,
) -> Detections {
    let count = num_detections
        .min(classes.len())
        .min(scores.len())
        .min(locations.len() / 4);

    let mut detections = Detections::new();
    for index in 0..count {
        let score = scores[index];
        if score <= threshold {
            continue;
        }
        let bbox = BoundingBox {
            ymin: locations[4 * index].clamp(0.0, 1.0),
            xmin: locations[4 * index + 1].clamp(0.0, 1.0),
            ymax: locations[4 * index + 2].clamp(0.0, 1.0),
            xmax: locations[4 * index + 3].clamp(0.0, 1.0),
        };
        let class_id = classes[index] as i32;
        let class = labels.name(class_id);
        tracing::trace!(
            "det class {class_id} ({class}) with score {score} at {},{} - {},{}",
            bbox.xmin, bbox.ymin, bbox.xmax, bbox.ymax
        );
        detections.push(Detection { class, class_id, score, bbox });
    }
    detections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Labels {
        Labels::parse("0 person\n17 dog\n").unwrap()
    }

    #[test]
    fn test_decode_threshold_and_labels() {
        let locations = [
            0.1, 0.2, 0.5, 0.6, //
            0.0, 0.0, 1.0, 1.0, //
            0.3, 0.3, 0.4, 0.4,
        ];
        let classes = [0.0, 17.0, 5.0];
        let scores = [0.9, 0.4, 0.7];
        let dets = decode_detections(&locations, &classes, &scores, 3, 0.5, &labels());
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].class, "person");
        assert_eq!(dets[0].bbox, BoundingBox { xmin: 0.2, ymin: 0.1, xmax: 0.6, ymax: 0.5 });
        assert_eq!(dets[1].class, "?");
        assert_eq!(dets[1].class_id, 5);
    }

    #[test]
    fn test_decode_clamps_boxes() {
        let locations = [-0.2, -0.1, 1.3, 1.5];
        let dets = decode_detections(&locations, &[17.0], &[0.99], 1, 0.5, &labels());
        assert_eq!(dets[0].bbox, BoundingBox { xmin: 0.0, ymin: 0.0, xmax: 1.0, ymax: 1.0 });
        assert_eq!(dets[0].class, "dog");
    }

    #[test]
    fn test_decode_count_bounded_by_tensors() {
        let dets = decode_detections(&[0.0, 0.0, 1.0, 1.0], &[0.0], &[0.9], 10, 0.5, &labels());
        assert_eq!(dets.len(), 1);
        let dets = decode_detections(&[0.0, 0.0, 1.0, 1.0], &[0.0], &[0.9], 0, 0.5, &labels());
        assert!(dets.is_empty());
    }

    #[test]
    fn test_missing_model_is_an_error() {
        let config = DetectionConfig {
            model_filename: "does/not/exist.tflite".into(),
            ..DetectionConfig::default()
        };
        assert!(DetectionStage::new(&config).is_err());
    }
}
