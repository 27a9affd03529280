//! Error types for the tracker client

/// Result type for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors that can occur while talking to the tracker service
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {url} failed ({status}): {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Root node not found: {0}")]
    RootNotFound(String),

    #[error("Invalid value for {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("Missing element: {0}")]
    MissingField(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<quick_xml::Error> for TrackerError {
    fn from(e: quick_xml::Error) -> Self {
        TrackerError::Xml(e.to_string())
    }
}
