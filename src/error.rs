use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type ConfigError = Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

impl Error {
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_) | Error::Config(_) | Error::NotFound(_) | Error::Invalid(_)
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::Parse(_) => "PARSE",
            Error::Io(_) => "IO_ERROR",
            Error::Serialization(_) => "SERIALIZATION",
            Error::Config(_) => "CONFIG",
            Error::Storage(_) => "STORAGE",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Invalid(_) => "INVALID",
        }
    }
}
