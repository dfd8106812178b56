//! Error types for the status source and recovery invoker.

use thiserror::Error;

/// Errors raised while talking to the monitored replica.
///
/// None of these are fatal to the poll loop: a failed fetch is reported and the
/// cycle is treated as error-free, a failed recovery is reported and the loop
/// polls again.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Could not reach the server or the connection dropped.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The server rejected or failed the statement.
    #[error("Query failed: {0}")]
    Query(String),

    /// The call did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The server answered with something we could not interpret.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<mysql_async::Error> for SourceError {
    fn from(err: mysql_async::Error) -> Self {
        use mysql_async::{DriverError, Error};

        match err {
            Error::Io(e) => SourceError::Connection(e.to_string()),
            Error::Driver(e @ (DriverError::FromRow { .. } | DriverError::FromValue { .. })) => {
                SourceError::Decode(e.to_string())
            }
            Error::Server(e) => SourceError::Query(e.to_string()),
            Error::Url(e) => SourceError::Connection(e.to_string()),
            other => SourceError::Query(other.to_string()),
        }
    }
}

impl From<tokio::time::error::Elapsed> for SourceError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        SourceError::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            SourceError::Connection("refused".into()).to_string(),
            "Connection failed: refused"
        );
        assert_eq!(SourceError::Timeout.to_string(), "Request timed out");
    }
}
