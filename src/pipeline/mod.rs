mod interpreter;

mod detection;
pub use detection::decode_detections;
pub use detection::BoundingBox;
pub use detection::Detection;
pub use detection::DetectionOutput;
pub use detection::DetectionStage;
pub use detection::Detections;

mod segmentation;
pub use segmentation::argmax_labels;
pub use segmentation::SegmentationOutput;
pub use segmentation::SegmentationStage;

mod labels;
pub use labels::Labels;

pub mod preprocess;
pub use preprocess::CropAndScale;
pub use preprocess::Region;

mod worker;
pub use worker::ModelWorker;
pub use worker::Stage;

mod summarize;
pub use summarize::summarize_detections;
pub use summarize::summarize_segmentation;
pub use summarize::CoverageSummary;
pub use summarize::DetectionSummary;
