use std::path::Path;

use image::RgbImage;
use tflite::context::ElementKind;
use tflite::ops::builtin::BuiltinOpResolver;
use tflite::{FlatBufferModel, Interpreter, InterpreterBuilder};

use crate::error::{Error, Result};
use crate::pipeline::preprocess::normalize;

pub type TfInterpreter<'a> = Interpreter<'a, BuiltinOpResolver>;

/// Input tensor geometry read back from the model.
#[derive(Debug, Clone, Copy)]
pub struct InputSpec {
    pub width: u32,
    pub height: u32,
    pub kind: ElementKind,
    pub mean: f32,
    pub std: f32,
}

pub fn build_interpreter<'a>(
    model_filename: &Path,
    num_threads: u8,
) -> Result<TfInterpreter<'a>> {
    let model = FlatBufferModel::build_from_file(model_filename)?;
    let resolver = BuiltinOpResolver::default();
    let builder = InterpreterBuilder::new(model, resolver)?;
    let mut interpreter = builder.build()?;
    interpreter.allocate_tensors()?;
    interpreter.set_num_threads(num_threads.max(1) as i32);
    Ok(interpreter)
}

pub fn input_spec(interpreter: &TfInterpreter<'_>, mean: f32, std: f32) -> Result<InputSpec> {
    let inputs = interpreter.inputs().len();
    if inputs != 1 {
        return Err(Error::Model(format!("expected 1 input tensor, found {inputs}")));
    }
    let tinfos = interpreter.get_input_details()?;
    let tinfo = &tinfos[0];
    let (width, height) = input_size(&tinfo.dims)?;
    Ok(InputSpec {
        width,
        height,
        kind: tinfo.element_kind,
        mean,
        std,
    })
}

/// `(width, height)` of a `[1, H, W, 3]` input with non-zero H and W.
fn input_size(dims: &[usize]) -> Result<(u32, u32)> {
    match dims {
        [_, h, w, 3] if *h > 0 && *w > 0 => Ok((*w as u32, *h as u32)),
        _ => Err(Error::Model(format!("expected a [1, H, W, 3] input, found {dims:?}"))),
    }
}

/// Copies a prepared RGB image into the single input tensor.
pub fn write_input(
    interpreter: &mut TfInterpreter<'_>,
    spec: &InputSpec,
    rgb: &RgbImage,
) -> Result<()> {
    let input_index = interpreter.inputs()[0];
    match spec.kind {
        ElementKind::kTfLiteUInt8 => {
            let src = rgb.as_raw();
            let dst: &mut [u8] = interpreter.tensor_data_mut(input_index)?;
            check_len(dst.len(), src.len())?;
            dst.copy_from_slice(src);
        }
        ElementKind::kTfLiteFloat32 => {
            let src = normalize(rgb, spec.mean, spec.std);
            let dst: &mut [f32] = interpreter.tensor_data_mut(input_index)?;
            check_len(dst.len(), src.len())?;
            dst.copy_from_slice(&src);
        }
        other => return Err(Error::Model(format!("unsupported input tensor type {other:?}"))),
    }
    Ok(())
}

fn check_len(tensor: usize, input: usize) -> Result<()> {
    if tensor != input {
        return Err(Error::Model(format!(
            "input tensor holds {tensor} values, image has {input}"
        )));
    }
    Ok(())
}
