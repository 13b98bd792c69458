use std::path::PathBuf;

use serde::Serialize;

use crate::pipeline::{BoundingBox, CoverageSummary, Detection, DetectionSummary, Region};

/// What one inference-and-render cycle found, written next to the overlay as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub image: PathBuf,
    pub width: u32,
    pub height: u32,
    pub detections: Vec<DetectionReport>,
    pub detection_summary: DetectionSummary,
    pub segmentation: SegmentationReport,
    pub outputs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub class: String,
    pub score: f32,
    pub bbox: BoundingBox,
    /// `[xmin, ymin, xmax, ymax]` in source image pixels, clipped to the image.
    pub pixels: [u32; 4],
    /// Label text for the box, e.g. `"person\nConfidence:  0.93"`.
    pub caption: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentationReport {
    pub mask_width: u32,
    pub mask_height: u32,
    pub region: Region,
    pub coverage: CoverageSummary,
    pub out_of_range: usize,
}

impl DetectionReport {
    pub fn new(det: &Detection, region: Region, width: u32, height: u32) -> Self {
        let (x0, y0) = region.to_source(det.bbox.xmin, det.bbox.ymin);
        let (x1, y1) = region.to_source(det.bbox.xmax, det.bbox.ymax);
        let clip = |v: f32, max: u32| v.round().clamp(0.0, max as f32) as u32;
        Self {
            class: det.class.clone(),
            score: det.score,
            bbox: det.bbox,
            pixels: [clip(x0, width), clip(y0, height), clip(x1, width), clip(y1, height)],
            caption: caption(&det.class, det.score),
        }
    }
}

pub fn caption(class: &str, score: f32) -> String {
    format!("{class}\nConfidence:  {score:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det() -> Detection {
        Detection {
            class: "dog".to_string(),
            class_id: 17,
            score: 0.934,
            bbox: BoundingBox { xmin: 0.1, ymin: 0.2, xmax: 0.5, ymax: 1.0 },
        }
    }

    #[test]
    fn test_detection_pixels() {
        let report = DetectionReport::new(&det(), Region::full(200, 100), 200, 100);
        assert_eq!(report.pixels, [20, 20, 100, 100]);
    }

    #[test]
    fn test_detection_pixels_clipped() {
        let region = Region { x: 0, y: -50, width: 200, height: 200 };
        let report = DetectionReport::new(&det(), region, 200, 100);
        assert_eq!(report.pixels, [20, 0, 100, 100]);
    }

    #[test]
    fn test_caption() {
        let report = DetectionReport::new(&det(), Region::full(10, 10), 10, 10);
        assert_eq!(report.caption, "dog\nConfidence:  0.93");
        assert_eq!(caption("person", 1.0), "person\nConfidence:  1.00");
    }

    #[test]
    fn test_report_serializes() {
        let report = DetectionReport::new(&det(), Region::full(10, 10), 10, 10);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["class"], "dog");
        assert_eq!(json["pixels"][2], 5);
        assert_eq!(json["caption"], "dog\nConfidence:  0.93");
    }
}
