use std::collections::BTreeMap;

use crate::pipeline::labels::Labels;
use crate::pipeline::Detections;
use crate::render::ClassIndexGrid;

// Returns <group, instance count>
pub type DetectionSummary = BTreeMap<String, u32>;

// Returns <class, fraction of mask pixels>
pub type CoverageSummary = BTreeMap<String, f32>;

const VEHICLES: [&str; 10] = [
    "car", "motorcycle", "motorbike", "bus", "truck", "bicycle", "train", "boat", "airplane",
    "aeroplane",
];
const ANIMALS: [&str; 10] = [
    "dog", "cat", "horse", "bird", "sheep", "cow", "elephant", "bear", "zebra", "giraffe",
];

pub fn summarize_detections(dets: &Detections) -> DetectionSummary {
    let mut dets_out = DetectionSummary::new();
    dets_out.insert("person".to_string(), 0);
    dets_out.insert("animal".to_string(), 0);
    dets_out.insert("vehicle".to_string(), 0);
    for det in dets {
        let group = if det.class == "person" {
            "person"
        } else if VEHICLES.contains(&det.class.as_str()) {
            "vehicle"
        } else if ANIMALS.contains(&det.class.as_str()) {
            "animal"
        } else {
            continue;
        };
        *dets_out.entry(group.to_string()).or_default() += 1;
    }
    dets_out
}

/// Share of the grid taken by each class present; ids without a name are reported as `"?"`.
pub fn summarize_segmentation(grid: &ClassIndexGrid, labels: &Labels) -> CoverageSummary {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for &label in grid.labels() {
        *counts.entry(label).or_default() += 1;
    }
    let total = grid.labels().len().max(1) as f32;
    let mut coverage = CoverageSummary::new();
    for (label, count) in counts {
        *coverage.entry(labels.name(label)).or_default() += count as f32 / total;
    }
    coverage
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{BoundingBox, Detection};

    fn det(class: &str) -> Detection {
        Detection {
            class: class.to_string(),
            class_id: 0,
            score: 0.9,
            bbox: BoundingBox { xmin: 0.0, ymin: 0.0, xmax: 0.1, ymax: 0.1 },
        }
    }

    #[test]
    fn test_summary() {
        let dets: Detections =
            vec![det("person"), det("person"), det("dog"), det("bus"), det("chair")];
        let summary = summarize_detections(&dets);
        assert_eq!(summary.len(), 3); // always: person, animal, vehicle
        assert_eq!(summary.get("person").unwrap(), &2);
        assert_eq!(summary.get("animal").unwrap(), &1);
        assert_eq!(summary.get("vehicle").unwrap(), &1);
    }

    #[test]
    fn test_summary_empty() {
        let summary = summarize_detections(&Detections::new());
        assert!(summary.values().all(|count| *count == 0));
    }

    #[test]
    fn test_segmentation_coverage() {
        let grid = ClassIndexGrid::new(2, 2, vec![0, 0, 15, 42]).unwrap();
        let coverage = summarize_segmentation(&grid, &Labels::pascal_voc());
        assert_eq!(coverage.get("background"), Some(&0.5));
        assert_eq!(coverage.get("person"), Some(&0.25));
        assert_eq!(coverage.get("?"), Some(&0.25));
    }

    #[test]
    fn test_segmentation_coverage_empty_grid() {
        let coverage = summarize_segmentation(&ClassIndexGrid::empty(), &Labels::pascal_voc());
        assert!(coverage.is_empty());
    }
}
