pub mod config;
pub mod report;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join;
use image::{Rgba, RgbaImage};

use crate::app::config::AppConfig;
use crate::app::report::{DetectionReport, Report, SegmentationReport};
use crate::error::Result;
use crate::pipeline::preprocess::load_image;
use crate::pipeline::{
    summarize_detections, summarize_segmentation, DetectionOutput, DetectionStage, Labels,
    ModelWorker, SegmentationOutput, SegmentationStage,
};
use crate::render::{blend_mask, draw_detections, render_with_stats, BoxStyle, Palette};

/// Both models loaded and waiting on their own threads.
pub struct App {
    config: AppConfig,
    palette: Palette,
    seg_labels: Labels,
    box_style: BoxStyle,
    segmenter: ModelWorker<SegmentationOutput>,
    detector: ModelWorker<DetectionOutput>,
}

impl App {
    pub async fn start(config: AppConfig) -> Result<App> {
        let palette = match &config.overlay.palette {
            Some(colors) => Palette::from_config(colors)?,
            None => Palette::pascal_voc(),
        };
        let seg_labels = match &config.segmentation.label_filename {
            Some(path) => Labels::from_file(path)?,
            None => Labels::pascal_voc(),
        };
        if seg_labels.len() > palette.len() {
            tracing::warn!(
                classes = seg_labels.len(),
                colors = palette.len(),
                "palette is shorter than the class list; extra classes render transparent"
            );
        }

        tracing::debug!("loading models");
        let seg_config = config.segmentation.clone();
        let det_config = config.detection.clone();
        let (segmenter, detector) = try_join(
            ModelWorker::spawn("segmenter", move || SegmentationStage::new(&seg_config)),
            ModelWorker::spawn("detector", move || DetectionStage::new(&det_config)),
        )
        .await?;

        let box_style = BoxStyle {
            color: Rgba(config.overlay.box_color),
            thickness: config.overlay.box_thickness,
        };
        Ok(Self {
            config,
            palette,
            seg_labels,
            box_style,
            segmenter,
            detector,
        })
    }

    /// Processes each image in turn; a failed image is logged and skipped.
    pub async fn run(&self, images: &[PathBuf]) -> Vec<Report> {
        let mut reports = Vec::with_capacity(images.len());
        for path in images {
            match self.process(path).await {
                Ok(report) => reports.push(report),
                Err(err) => {
                    tracing::error!(path = %path.display(), %err, "failed to process image")
                }
            }
        }
        reports
    }

    /// One full cycle: both inferences, then mask, boxes and output files.
    pub async fn process(&self, path: &Path) -> Result<Report> {
        let started = Instant::now();
        tracing::info!(path = %path.display(), "processing");
        let image = Arc::new(load_image(path)?);

        let (seg, det) = try_join(
            self.segmenter.infer(image.clone()),
            self.detector.infer(image.clone()),
        )
        .await?;

        let (mask, stats) = render_with_stats(&seg.grid, &self.palette);
        if stats.out_of_range > 0 {
            tracing::warn!(cells = stats.out_of_range, "segmentation labels outside the palette");
        }

        let (width, height) = (image.width(), image.height());
        let mut overlay = image.to_rgba8();
        blend_mask(&mut overlay, &mask, seg.region, self.config.overlay.mask_opacity);
        draw_detections(&mut overlay, &det.detections, det.region, self.box_style);

        let detections: Vec<DetectionReport> = det
            .detections
            .iter()
            .map(|d| DetectionReport::new(d, det.region, width, height))
            .collect();
        for d in &detections {
            tracing::info!(caption = %d.caption, bbox = ?d.pixels, "detected");
        }

        let outputs = self.write_images(path, &overlay, &mask)?;
        let mut report = Report {
            image: path.to_path_buf(),
            width,
            height,
            detections,
            detection_summary: summarize_detections(&det.detections),
            segmentation: SegmentationReport {
                mask_width: mask.width(),
                mask_height: mask.height(),
                region: seg.region,
                coverage: summarize_segmentation(&seg.grid, &self.seg_labels),
                out_of_range: stats.out_of_range,
            },
            outputs,
        };
        if self.config.output.write_report {
            let report_path = self.output_path(path, "json");
            report.outputs.push(report_path.clone());
            let writer = BufWriter::new(File::create(&report_path)?);
            serde_json::to_writer_pretty(writer, &report)?;
        }

        tracing::info!(
            path = %path.display(),
            detections = report.detections.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "done"
        );
        Ok(report)
    }

    fn write_images(
        &self,
        path: &Path,
        overlay: &RgbaImage,
        mask: &RgbaImage,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.config.output.directory)?;
        let mut written = Vec::new();

        let overlay_path = self.output_path(path, "overlay.png");
        overlay.save(&overlay_path)?;
        written.push(overlay_path);

        // a zero-area mask has nothing to encode
        if self.config.output.write_mask && mask.width() > 0 && mask.height() > 0 {
            let mask_path = self.output_path(path, "mask.png");
            mask.save(&mask_path)?;
            written.push(mask_path);
        }
        tracing::debug!(?written, "wrote images");
        Ok(written)
    }

    fn output_path(&self, image: &Path, suffix: &str) -> PathBuf {
        output_path(&self.config.output.directory, image, suffix)
    }
}

/// `<dir>/<stem>_<suffix>`, or `<dir>/<stem>.json` for reports.
pub fn output_path(directory: &Path, image: &Path, suffix: &str) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    if suffix == "json" {
        directory.join(format!("{stem}.json"))
    } else {
        directory.join(format!("{stem}_{suffix}"))
    }
}
