use image::DynamicImage;
use tflite::context::ElementKind;

use crate::app::config::SegmentationConfig;
use crate::error::{Error, Result};
use crate::pipeline::interpreter::{
    build_interpreter, input_spec, write_input, InputSpec, TfInterpreter,
};
use crate::pipeline::preprocess::{prepare, CropAndScale, Region};
use crate::pipeline::worker::Stage;
use crate::render::ClassIndexGrid;

#[derive(Debug, Clone)]
pub struct SegmentationOutput {
    pub grid: ClassIndexGrid,
    pub region: Region,
}

/// Layout of the segmenter's single output tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputLayout {
    /// `[1, H, W, C]` per-class scores.
    Scores { classes: usize },
    /// `[1, H, W]` or `[1, H, W, 1]` class ids.
    Labels,
}

/// Semantic segmentation network such as DeepLabV3.
pub struct SegmentationStage<'a> {
    interpreter: TfInterpreter<'a>,
    input: InputSpec,
    crop: CropAndScale,
    out_width: u32,
    out_height: u32,
    out_kind: ElementKind,
    layout: OutputLayout,
}

impl<'a> SegmentationStage<'a> {
    pub fn new(config: &SegmentationConfig) -> Result<Self> {
        let interpreter = build_interpreter(&config.model_filename, config.num_threads)?;
        let input = input_spec(&interpreter, config.input_mean, config.input_std)?;
        let outputs = interpreter.outputs().len();
        if outputs != 1 {
            return Err(Error::Model(format!("segmenter needs 1 output tensor, found {outputs}")));
        }
        let tinfos = interpreter.get_output_details()?;
        let dims = &tinfos[0].dims;
        let layout = match dims.as_slice() {
            [1, _, _, 1] | [1, _, _] => OutputLayout::Labels,
            [1, _, _, classes] => OutputLayout::Scores { classes: *classes },
            _ => return Err(Error::Model(format!("unexpected segmentation output shape {dims:?}"))),
        };
        tracing::info!(
            %config,
            width = input.width,
            height = input.height,
            ?layout,
            "loaded segmenter"
        );
        Ok(Self {
            out_height: dims[1] as u32,
            out_width: dims[2] as u32,
            out_kind: tinfos[0].element_kind,
            interpreter,
            input,
            crop: config.crop,
            layout,
        })
    }

    pub fn segment(&mut self, image: &DynamicImage) -> Result<SegmentationOutput> {
        let prepared = prepare(image, self.input.width, self.input.height, self.crop);
        write_input(&mut self.interpreter, &self.input, &prepared.rgb)?;
        self.interpreter.invoke()?;

        let output = self.interpreter.outputs()[0];
        let (w, h) = (self.out_width, self.out_height);
        let grid = match (self.layout, self.out_kind) {
            (OutputLayout::Scores { classes }, ElementKind::kTfLiteFloat32) => {
                let scores: &[f32] = self.interpreter.tensor_data(output)?;
                argmax_labels(scores, w, h, classes)?
            }
            (OutputLayout::Scores { classes }, ElementKind::kTfLiteUInt8) => {
                let scores: &[u8] = self.interpreter.tensor_data(output)?;
                argmax_labels(scores, w, h, classes)?
            }
            (OutputLayout::Labels, ElementKind::kTfLiteInt32) => {
                let ids: &[i32] = self.interpreter.tensor_data(output)?;
                ClassIndexGrid::new(w, h, ids.to_vec())?
            }
            (OutputLayout::Labels, ElementKind::kTfLiteUInt8) => {
                let ids: &[u8] = self.interpreter.tensor_data(output)?;
                ClassIndexGrid::new(w, h, ids.iter().map(|&id| id as i32).collect())?
            }
            (layout, kind) => {
                return Err(Error::Model(format!(
                    "unsupported segmentation output {layout:?} of {kind:?}"
                )))
            }
        };
        Ok(SegmentationOutput { grid, region: prepared.region })
    }
}

impl<'a> Stage for SegmentationStage<'a> {
    type Output = SegmentationOutput;

    fn infer(&mut self, image: &DynamicImage) -> Result<SegmentationOutput> {
        self.segment(image)
    }
}

/// Per-pixel index of the highest class score; ties go to the lower class.
pub fn argmax_labels<T: PartialOrd + Copy>(
    scores: &[T],
    width: u32,
    height: u32,
    classes: usize,
) -> Result<ClassIndexGrid> {
    let pixels = width as usize * height as usize;
    if classes == 0 || scores.len() != pixels * classes {
        return Err(Error::Model(format!(
            "score tensor of {} values does not match {width}x{height}x{classes}",
            scores.len()
        )));
    }
    let labels = scores
        .chunks_exact(classes)
        .map(|pixel| {
            let mut best = 0;
            for (class, score) in pixel.iter().enumerate().skip(1) {
                if *score > pixel[best] {
                    best = class;
                }
            }
            best as i32
        })
        .collect();
    ClassIndexGrid::new(width, height, labels)
}
