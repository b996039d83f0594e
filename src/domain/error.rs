//! Domain error types.

/// Top-level error type for trendscope.
#[derive(Debug, thiserror::Error)]
pub enum TrendscopeError {
    #[error("no data for {symbol}")]
    DataUnavailable { symbol: String },

    #[error("insufficient history for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientHistory {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid price series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },

    #[error("{metric} is undefined: {reason}")]
    DegenerateStatistic { metric: String, reason: String },

    #[error("{stage} failed for {symbol}: {reason}")]
    Computation {
        symbol: String,
        stage: String,
        reason: String,
    },

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

    #[error("failed to write chart {path}: {reason}")]
    Chart { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrendscopeError {
    pub(crate) fn degenerate(metric: &str, reason: &str) -> Self {
        TrendscopeError::DegenerateStatistic {
            metric: metric.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for errors that only mean "this metric has no value".
    pub fn is_degenerate(&self) -> bool {
        matches!(self, TrendscopeError::DegenerateStatistic { .. })
    }
}

impl From<&TrendscopeError> for std::process::ExitCode {
    fn from(err: &TrendscopeError) -> Self {
        let code: u8 = match err {
            TrendscopeError::Io(_) | TrendscopeError::Chart { .. } => 1,
            TrendscopeError::ConfigParse { .. }
            | TrendscopeError::ConfigMissing { .. }
            | TrendscopeError::ConfigInvalid { .. } => 2,
            TrendscopeError::Computation { .. } | TrendscopeError::DegenerateStatistic { .. } => 3,
            TrendscopeError::InvalidSeries { .. } => 4,
            TrendscopeError::DataUnavailable { .. } | TrendscopeError::InsufficientHistory { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
