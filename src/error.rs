//! Error types for the analytics trigger.

use thiserror::Error;

/// Errors raised while setting up or talking to the video events endpoint.
///
/// Request-time errors never reach the host; each one is turned into a
/// failure notification carrying [`describe`] text.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The timestamp format contains a specifier chrono cannot render.
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    /// The request could not be sent or no response arrived.
    #[error(transparent)]
    Transport(reqwest::Error),

    /// The response arrived but accessing or reading it failed.
    #[error("{0}")]
    ResponseHandling(String),
}

/// Error text followed by each underlying cause, as `outer: cause: root`.
pub fn describe<E>(error: E) -> String
where
    E: std::error::Error + Send + Sync + 'static,
{
    format!("{:#}", anyhow::Error::from(error))
}
