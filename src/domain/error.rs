//! Domain error types.

/// Top-level error type for tradebench.
#[derive(Debug, thiserror::Error)]
pub enum TradebenchError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no price data in {source_name}")]
    NoData { source_name: String },

    #[error("invalid price series at bar {index}: {reason}")]
    InvalidSeries { index: usize, reason: String },

    #[error("signal count {signals} does not match bar count {bars}")]
    SignalLengthMismatch { bars: usize, signals: usize },

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradebenchError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TradebenchError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&TradebenchError> for std::process::ExitCode {
    fn from(err: &TradebenchError) -> Self {
        let code: u8 = match err {
            TradebenchError::Io(_) => 1,
            TradebenchError::ConfigParse { .. }
            | TradebenchError::ConfigMissing { .. }
            | TradebenchError::ConfigInvalid { .. } => 2,
            TradebenchError::Data { .. }
            | TradebenchError::NoData { .. }
            | TradebenchError::InvalidSeries { .. } => 3,
            TradebenchError::SignalLengthMismatch { .. } | TradebenchError::UnknownStrategy(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}
