use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the analysis pipeline.
///
/// Missing parents and empty graphs are not errors; they are skipped or
/// reported as [`crate::pipeline::Outcome::Empty`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration '{name}': {message}")]
    InvalidConfig { name: &'static str, message: String },

    #[error("Graphviz render failed: {0}")]
    Render(String),
}

impl Error {
    pub(crate) fn invalid_config(name: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            name,
            message: message.into(),
        }
    }
}
