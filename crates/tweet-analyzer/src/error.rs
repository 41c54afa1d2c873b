use thiserror::Error;
use toxicity_core::BackendError;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Tweet text is empty")]
    EmptyInput,

    #[error("No backend could be loaded: {0}")]
    BackendUnavailable(String),

    #[error("Inference failed: {0}")]
    Inference(#[from] BackendError),

    #[error("No model available: {0}")]
    NoModelAvailable(String),

    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV is missing the '{0}' column")]
    MissingColumn(String),
}

pub type AnalyzerResult<T> = Result<T, AnalyzerError>;
