use std::fmt::{Display, Formatter};

use thiserror::Error;

/// A single expectation that did not hold for a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailure {
    pub expectation: String,
    pub expected: String,
    pub actual: String,
}

impl AssertionFailure {
    pub fn new(expectation: impl Into<String>, expected: impl Display, actual: impl Display) -> AssertionFailure {
        return AssertionFailure {
            expectation: expectation.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        };
    }
}

impl Display for AssertionFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: expected {}, got {}", self.expectation, self.expected, self.actual)
    }
}

impl std::error::Error for AssertionFailure {}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("couldn't build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} timed out")]
    Timeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with error status {status}")]
    ErrorStatus { url: String, status: u16 },

    #[error("assertion failed: {0}")]
    Assertion(#[from] AssertionFailure),
}

impl HarnessError {
    pub fn transport(url: &str, source: reqwest::Error) -> HarnessError {
        return if source.is_timeout() {
            HarnessError::Timeout { url: url.to_string(), source }
        } else {
            HarnessError::Transport { url: url.to_string(), source }
        };
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
