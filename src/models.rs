//! Data models for the analytics trigger.
//!
//! This module contains the request sent to the `/video_events` endpoint
//! and the notifications relayed back to the host.

use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default endpoint path for video event actions.
pub const DEFAULT_PATH: &str = "/video_events";

/// Content type of every request body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Default time format, matching a locale-style `HH:MM:SS` clock.
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

/// Text of the notification emitted right after the request is issued.
pub const INITIATED_TEXT: &str = "Video analytics initiated.";

/// Action requested from the video events endpoint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Start video analytics (default)
    #[default]
    Start,
    /// Stop running video analytics
    Stop,
    /// Query the latest video analytics status
    Status,
}

impl Action {
    /// The form key the endpoint looks for.
    pub fn form_key(&self) -> &'static str {
        match self {
            Action::Start => "video_analytics_start",
            Action::Stop => "video_analytics_stop",
            Action::Status => "video_status",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Start => write!(f, "start"),
            Action::Stop => write!(f, "stop"),
            Action::Status => write!(f, "status"),
        }
    }
}

/// A single form-encoded POST to the video events endpoint.
///
/// The payload is always one `key=true` pair whose key is one of the
/// fixed [`Action`] keys, so the body needs no percent-encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsRequest {
    path: String,
    action: Action,
}

impl AnalyticsRequest {
    /// The request the trigger sends by default: start analytics on `/video_events`.
    pub fn start() -> Self {
        Self::new(DEFAULT_PATH, Action::Start)
    }

    /// Build a request for `action` against `path`.
    ///
    /// A missing leading slash is added.
    pub fn new(path: &str, action: Action) -> Self {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        Self { path, action }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn content_type(&self) -> &'static str {
        FORM_CONTENT_TYPE
    }

    /// The form-encoded body, e.g. `video_analytics_start=true`.
    pub fn body(&self) -> String {
        format!("{}=true", self.action.form_key())
    }
}

impl Default for AnalyticsRequest {
    fn default() -> Self {
        Self::start()
    }
}

/// Wall clock time captured once and shared by every notification of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

/// Whether `format` only contains strftime specifiers chrono understands.
pub fn is_valid_time_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

impl Timestamp {
    /// Capture the current local time using a strftime `format`.
    ///
    /// `format` must pass [`is_valid_time_format`].
    pub fn now(format: &str) -> Self {
        Self(Local::now().format(format).to_string())
    }
}

impl From<&str> for Timestamp {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// The request was issued.
    Initiated,
    /// The server answered; the text is the raw response body.
    Response,
    /// The response could not be obtained or read.
    Failure,
}

/// A status message relayed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub timestamp: Timestamp,
    pub kind: NotificationKind,
    pub text: String,
}

impl Notification {
    pub fn initiated(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            kind: NotificationKind::Initiated,
            text: INITIATED_TEXT.to_string(),
        }
    }

    pub fn response(timestamp: Timestamp, body: String) -> Self {
        Self {
            timestamp,
            kind: NotificationKind::Response,
            text: body,
        }
    }

    pub fn failure(timestamp: Timestamp, error: impl fmt::Display) -> Self {
        Self {
            timestamp,
            kind: NotificationKind::Failure,
            text: error.to_string(),
        }
    }

    /// Whether this is the second, final notification of a run.
    pub fn is_outcome(&self) -> bool {
        self.kind != NotificationKind::Initiated
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.timestamp, self.text)
    }
}
