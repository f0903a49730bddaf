use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("upstream returned a non-JSON body (anti-bot block)")]
    Blocked,

    #[error("fetch exceeded the hard deadline")]
    Timeout,

    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {message}")]
    Api { message: String },
}

pub type Result<T> = std::result::Result<T, ScraperError>;

/// Per-venue failure classification recorded by the orchestrator. Every
/// fetch-level error collapses into one of these; none of them aborts the
/// run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum FailureKind {
    Blocked,
    Timeout,
    Network,
}

impl FailureKind {
    pub fn from_error(err: &ScraperError) -> Self {
        match err {
            ScraperError::Blocked => FailureKind::Blocked,
            ScraperError::Timeout => FailureKind::Timeout,
            _ => FailureKind::Network,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Blocked => "blocked",
            FailureKind::Timeout => "timeout",
            FailureKind::Network => "network",
        }
    }
}
