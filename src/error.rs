use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployhookError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<serde_json::Error> for DeployhookError {
    fn from(e: serde_json::Error) -> Self {
        DeployhookError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for DeployhookError {
    fn from(e: toml::de::Error) -> Self {
        DeployhookError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for DeployhookError {
    fn from(e: toml::ser::Error) -> Self {
        DeployhookError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for DeployhookError {
    fn from(e: reqwest::Error) -> Self {
        DeployhookError::Http(e.to_string())
    }
}
