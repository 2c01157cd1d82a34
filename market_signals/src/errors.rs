// errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No data available: {0}")]
    DataUnavailable(String),

    #[error("Insufficient history: {rows} rows, at least {required} required")]
    InsufficientHistory { rows: usize, required: usize },

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Model fit failed: {0}")]
    ModelFit(String),

    #[error("Invalid data format: {0}")]
    InvalidDataFormat(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),
}

impl AnalysisError {
    /// Stable tag reported to callers alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::DataUnavailable(_) => "data_unavailable",
            AnalysisError::InsufficientHistory { .. } => "insufficient_history",
            AnalysisError::ExternalService(_) | AnalysisError::HttpError(_) => {
                "external_service_error"
            }
            AnalysisError::ModelFit(_) => "model_fit_error",
            AnalysisError::InvalidDataFormat(_) | AnalysisError::JsonError(_) => {
                "invalid_data_format"
            }
            AnalysisError::InvalidParameter(_) => "invalid_parameter",
            AnalysisError::CsvError(_) | AnalysisError::IoError(_) => "export_error",
            AnalysisError::ConfigError(_) => "configuration_error",
            AnalysisError::RegexError(_) => "internal_error",
        }
    }

    /// True for failures caused by the caller's input rather than by a provider.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidParameter(_) | AnalysisError::InsufficientHistory { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
