//! Structured error handling for code generation.

use std::borrow::Cow;

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with the generator [`Error`] type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while generating artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The generation request is malformed.
    InvalidInput,
    /// The generator is misconfigured.
    Configuration,
    /// The model endpoint could not be reached.
    NetworkError,
    /// The model endpoint did not answer in time.
    Timeout,
    /// The model endpoint rejected the credentials.
    Authentication,
    /// The model endpoint is throttling requests.
    RateLimited,
    /// The model endpoint is temporarily unavailable.
    ServiceUnavailable,
    /// The model endpoint returned an unexpected error.
    ExternalError,
    /// The model response could not be interpreted.
    InvalidResponse,
    /// The output misses a target or contains an empty one.
    IncompleteOutput,
    /// Unknown error occurred.
    #[default]
    Unknown,
}

impl ErrorKind {
    /// Returns whether a later attempt may succeed without changes.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::Timeout | Self::ServiceUnavailable | Self::RateLimited
        )
    }
}

/// Structured error type with classification and an optional source.
#[must_use]
#[derive(Debug, Error)]
#[error("[{kind}]{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Human-readable cause.
    pub message: Option<Cow<'static, str>>,
    /// Underlying source error, if any.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Creates a new error from a source error.
    pub fn from_source(kind: ErrorKind, source: impl Into<BoxedError>) -> Self {
        Self {
            kind,
            message: None,
            source: Some(source.into()),
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the source of the error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the message, falling back to the kind.
    pub fn cause(&self) -> Cow<'_, str> {
        match &self.message {
            Some(message) => Cow::Borrowed(message.as_ref()),
            None => Cow::Owned(self.kind.to_string()),
        }
    }

    /// Returns whether a later attempt may succeed without changes.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::from_source(ErrorKind::Timeout, error).with_message("Model request timed out")
        } else if error.is_connect() {
            Self::from_source(ErrorKind::NetworkError, error)
                .with_message("Could not connect to the model endpoint")
        } else if error.is_decode() {
            Self::from_source(ErrorKind::InvalidResponse, error)
                .with_message("Model response could not be decoded")
        } else {
            let message = error.to_string();
            Self::from_source(ErrorKind::NetworkError, error).with_message(message)
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::from_source(ErrorKind::InvalidResponse, error)
            .with_message("Model response is not valid JSON")
    }
}
