use std::error::Error as StdError;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The transport itself failed (connection refused, DNS, body read...).
    #[error("transport error: {0}")]
    Transport(Box<dyn StdError + Send + Sync>),
    /// The response arrived but its status was not successful.
    #[error("http error, status: {status}")]
    Http {
        /// Numeric HTTP status.
        status: u16,
        /// Reason phrase reported alongside the status.
        status_text: String,
    },
    /// Payload decoding failed after a successful response.
    #[error("decode error: {0}")]
    Decode(String),
    /// Every attempt failed.
    #[error("All {max_retries} retry attempts failed. Last error: {source}")]
    Exhausted {
        /// The configured retry bound.
        max_retries: usize,
        /// Error observed on the final attempt.
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    /// Wraps any transport-level error.
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Transport(err.into())
    }

    pub(crate) fn exhausted(max_retries: usize, last: FetchError) -> Self {
        Self::Exhausted {
            max_retries,
            source: Box::new(last),
        }
    }

    /// Returns the HTTP status carried by this error, looking through
    /// [`FetchError::Exhausted`] to the last attempt.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Exhausted { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// Rejection produced by [`crate::MockApi::call`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("Mock API call failed (random: {draw:.2}, success threshold: {threshold})")]
pub struct MockApiError {
    /// The uniform draw that decided the outcome.
    pub draw: f64,
    /// Success probability the draw was compared against.
    pub threshold: f64,
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::{FetchError, MockApiError};

    #[test]
    fn exhausted_message_embeds_bound_and_last_error() {
        let err = FetchError::exhausted(
            2,
            FetchError::Http {
                status: 500,
                status_text: "Internal Server Error".to_owned(),
            },
        );
        let message = err.to_string();
        assert!(message.contains("All 2 retry attempts failed"));
        assert!(message.contains("status: 500"));
        assert_eq!(err.status(), Some(500));
        assert!(err.source().is_some());
    }

    #[test]
    fn transport_wraps_string_errors() {
        let err = FetchError::transport("connection reset");
        assert_eq!(err.to_string(), "transport error: connection reset");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn mock_api_error_formats_draw_with_two_decimals() {
        let err = MockApiError {
            draw: 0.8765,
            threshold: 0.5,
        };
        assert_eq!(
            err.to_string(),
            "Mock API call failed (random: 0.88, success threshold: 0.5)"
        );
    }
}
