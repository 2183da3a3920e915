use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("venue error: {0}")]
    Venue(#[from] rumbo_core::Error),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("scenario parse error: {0}")]
    ScenarioParse(#[from] toml::de::Error),

    #[error("trace write error: {0}")]
    TraceWrite(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
