use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error on {path}: {message}")]
    IoError { path: String, message: String },

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("Binary codec error: {0}")]
    CodecError(String),

    #[error("Dataset error: {0}")]
    DatasetError(String),

    #[error("Artifact not found: {0}")]
    MissingArtifact(String),

    #[error("Dataset contains no usable matches")]
    EmptyDataset,

    #[error("Training failed: {0}")]
    TrainingError(String),
}

impl AppError {
    pub fn io(path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        AppError::IoError {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::DatasetError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonError(err.to_string())
    }
}

impl From<bincode::Error> for AppError {
    fn from(err: bincode::Error) -> Self {
        AppError::CodecError(err.to_string())
    }
}
