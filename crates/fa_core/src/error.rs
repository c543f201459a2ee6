use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Market data error: {0}")]
    Market(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("Redirect decode error: {0}")]
    Decode(String),

    #[error("API key is missing (set OPENAI_API_KEY or pass --api-key)")]
    MissingCredential,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a failed stage, stable enough for a UI to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Timeout,
    HttpStatus,
    InvalidUrl,
    Decode,
    Parse,
    MalformedOutput,
    MissingCredential,
    Inference,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::HttpStatus => "http_status",
            ErrorKind::InvalidUrl => "invalid_url",
            ErrorKind::Decode => "decode",
            ErrorKind::Parse => "parse",
            ErrorKind::MalformedOutput => "malformed_output",
            ErrorKind::MissingCredential => "missing_credential",
            ErrorKind::Inference => "inference",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure turned into data.
///
/// Pipeline stages hand these to the presentation side instead of
/// propagating [`Error`], so a partially successful run can still be rendered.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct StageError {
    pub kind: ErrorKind,
    pub message: String,
}

impl StageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing_credential() -> Self {
        Self::from(&Error::MissingCredential)
    }
}

impl From<&Error> for StageError {
    fn from(err: &Error) -> Self {
        let kind = match err {
            Error::Http(e) if e.is_timeout() => ErrorKind::Timeout,
            Error::Http(e) if e.is_status() => ErrorKind::HttpStatus,
            Error::Http(e) if e.is_decode() => ErrorKind::Decode,
            Error::Http(_) | Error::Io(_) | Error::Fetch(_) | Error::Market(_) => ErrorKind::Network,
            Error::InvalidUrl(_) => ErrorKind::InvalidUrl,
            Error::Serialization(_) | Error::Feed(_) => ErrorKind::Parse,
            Error::MalformedOutput(_) => ErrorKind::MalformedOutput,
            Error::Decode(_) => ErrorKind::Decode,
            Error::MissingCredential => ErrorKind::MissingCredential,
            Error::Inference(_) | Error::External(_) => ErrorKind::Inference,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<Error> for StageError {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}
