//! Error taxonomy for height fetches.
//!
//! Every failure of a single height request is classified into one of three
//! kinds; the decision loop never branches on the kind, only on which source
//! the failure came from.

use std::fmt;

/// A single height fetch failed.
#[derive(Debug)]
pub enum FetchError {
    /// The network call itself could not complete (connection refused,
    /// timeout, DNS failure).
    Transport { source: String, cause: String },

    /// The call completed but returned a non-success HTTP status.
    Protocol {
        source: String,
        status: u16,
        url: String,
        body: String,
    },

    /// The body is not the expected envelope, or the expected field is
    /// missing or unusable.
    Format {
        source: String,
        url: String,
        body: String,
        reason: String,
    },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport { source, cause } => {
                write!(f, "{} query failed due to {}", source, cause)
            }
            FetchError::Protocol {
                source,
                status,
                url,
                body,
            } => {
                write!(
                    f,
                    "{} API request {} failed with HTTP status code {} and text {}",
                    source, url, status, body
                )
            }
            FetchError::Format {
                source,
                url,
                body,
                reason,
            } => {
                write!(
                    f,
                    "Unexpected format of {} response for request {}: {}. Response was: {}",
                    source, url, reason, body
                )
            }
        }
    }
}

impl std::error::Error for FetchError {}
