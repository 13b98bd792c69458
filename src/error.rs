use thiserror::Error;

/// Errors raised while loading models, running inference or writing output.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("TFLite error: {0}")]
    TfLite(#[from] tflite::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Label file error: {0}")]
    Label(String),

    #[error("Grid of {width}x{height} needs {expected} labels, got {actual}")]
    GridShape {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Palette must hold at least one color")]
    Palette,

    #[error("Worker error: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Model("expected 4 outputs".to_string());
        assert!(err.to_string().contains("Model error"));
        assert!(err.to_string().contains("expected 4 outputs"));

        let err = Error::GridShape { width: 2, height: 2, expected: 4, actual: 3 };
        assert_eq!(err.to_string(), "Grid of 2x2 needs 4 labels, got 3");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.tflite");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }
}
