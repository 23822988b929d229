//! Runs one analytics request and relays its outcome.
//!
//! Each run captures a single timestamp, queues the "initiated"
//! notification, then spawns the request. The outcome arrives on the
//! same channel as the second and last notification.

use crate::error::{describe, TriggerError};
use crate::models::{is_valid_time_format, AnalyticsRequest, Notification, Timestamp};
use crate::trigger::transport::Transport;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Fires analytics requests through a [`Transport`].
pub struct AnalyticsTrigger<T> {
    transport: Arc<T>,
    request: AnalyticsRequest,
    time_format: String,
}

impl<T: Transport> AnalyticsTrigger<T> {
    /// Create a trigger sending `request` with timestamps in `time_format`.
    ///
    /// Fails if `time_format` is not a valid strftime format.
    pub fn new(
        transport: T,
        request: AnalyticsRequest,
        time_format: impl Into<String>,
    ) -> Result<Self, TriggerError> {
        let time_format = time_format.into();
        if !is_valid_time_format(&time_format) {
            return Err(TriggerError::InvalidTimeFormat(time_format));
        }

        Ok(Self {
            transport: Arc::new(transport),
            request,
            time_format,
        })
    }

    pub fn request(&self) -> &AnalyticsRequest {
        &self.request
    }

    /// Issue the request, stamping both notifications with the current time.
    ///
    /// Must be called within a tokio runtime. Every call is an independent
    /// request with its own timestamp.
    pub fn run(&self) -> Notifications {
        self.run_at(Timestamp::now(&self.time_format))
    }

    /// Issue the request, stamping both notifications with `timestamp`.
    pub fn run_at(&self, timestamp: Timestamp) -> Notifications {
        let (tx, rx) = mpsc::unbounded_channel();

        info!(
            "Triggering video analytics {} via POST {}",
            self.request.action(),
            self.request.path()
        );

        // Queued before the task exists, so it always precedes the outcome.
        let _ = tx.send(Notification::initiated(timestamp.clone()));

        let transport = Arc::clone(&self.transport);
        let request = self.request.clone();

        tokio::spawn(async move {
            let notification = match transport.post_form(&request).await {
                Ok(body) => {
                    debug!("Video events response: {} bytes", body.len());
                    Notification::response(timestamp, body)
                }
                Err(e) => {
                    let text = describe(e);
                    warn!("Video analytics request failed: {}", text);
                    Notification::failure(timestamp, text)
                }
            };

            if tx.send(notification).is_err() {
                debug!("Notification receiver dropped before the outcome arrived");
            }
        });

        Notifications { rx }
    }
}

/// Receiving end of one run's notifications.
#[derive(Debug)]
pub struct Notifications {
    rx: mpsc::UnboundedReceiver<Notification>,
}

impl Notifications {
    /// Next notification, or `None` once the run has finished.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    /// Wait for the run to finish and return every notification in order.
    #[cfg(test)]
    pub async fn collect(mut self) -> Vec<Notification> {
        let mut all = Vec::with_capacity(2);
        while let Some(notification) = self.recv().await {
            all.push(notification);
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, NotificationKind, DEFAULT_PATH, DEFAULT_TIME_FORMAT};
    use crate::trigger::transport::tests::serve_once;
    use crate::trigger::HttpTransport;
    use std::future::Future;
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeTransport {
        reply: Result<String, String>,
        delay: Duration,
        seen: Mutex<Vec<AnalyticsRequest>>,
    }

    impl FakeTransport {
        fn replying(reply: Result<&str, &str>) -> Self {
            Self {
                reply: reply.map(String::from).map_err(String::from),
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for FakeTransport {
        fn post_form(
            &self,
            request: &AnalyticsRequest,
        ) -> impl Future<Output = Result<String, TriggerError>> + Send {
            self.seen.lock().unwrap().push(request.clone());
            let reply = self.reply.clone();
            let delay = self.delay;
            async move {
                tokio::time::sleep(delay).await;
                reply.map_err(TriggerError::ResponseHandling)
            }
        }
    }

    #[tokio::test]
    async fn test_ok_body_is_second_notification() {
        let trigger = AnalyticsTrigger::new(
            FakeTransport::replying(Ok("OK")),
            AnalyticsRequest::start(),
            DEFAULT_TIME_FORMAT,
        )
        .unwrap();

        let notes = trigger.run_at(Timestamp::from("10:00:00")).collect().await;
        let lines: Vec<String> = notes.iter().map(|n| n.to_string()).collect();
        assert_eq!(
            lines,
            vec!["10:00:00: Video analytics initiated.", "10:00:00: OK"]
        );
        assert_eq!(notes[1].kind, NotificationKind::Response);
    }

    #[tokio::test]
    async fn test_error_becomes_notification() {
        let trigger = AnalyticsTrigger::new(
            FakeTransport::replying(Err("boom")),
            AnalyticsRequest::start(),
            DEFAULT_TIME_FORMAT,
        )
        .unwrap();

        let notes = trigger.run_at(Timestamp::from("10:00:00")).collect().await;
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1].kind, NotificationKind::Failure);
        assert_eq!(notes[1].to_string(), "10:00:00: boom");
    }

    #[tokio::test]
    async fn test_initiated_arrives_before_response() {
        let mut transport = FakeTransport::replying(Ok("done"));
        transport.delay = Duration::from_millis(50);
        let trigger =
            AnalyticsTrigger::new(transport, AnalyticsRequest::start(), DEFAULT_TIME_FORMAT)
            .unwrap();

        let mut notes = trigger.run();
        let first = notes.recv().await.unwrap();
        assert_eq!(first.kind, NotificationKind::Initiated);
        assert!(!first.is_outcome());

        let second = notes.recv().await.unwrap();
        assert!(second.is_outcome());
        assert_eq!(second.text, "done");
        assert!(notes.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_timestamp_shared_across_notifications() {
        let mut transport = FakeTransport::replying(Ok("OK"));
        transport.delay = Duration::from_millis(1100);
        let trigger =
            AnalyticsTrigger::new(transport, AnalyticsRequest::start(), DEFAULT_TIME_FORMAT)
            .unwrap();

        let notes = trigger.run().collect().await;
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].timestamp, notes[1].timestamp);
    }

    #[tokio::test]
    async fn test_repeated_runs_are_independent() {
        let trigger = AnalyticsTrigger::new(
            FakeTransport::replying(Ok("OK")),
            AnalyticsRequest::new(DEFAULT_PATH, Action::Status),
            DEFAULT_TIME_FORMAT,
        )
        .unwrap();

        let first = trigger.run_at(Timestamp::from("08:00:00")).collect().await;
        let second = trigger.run_at(Timestamp::from("08:00:05")).collect().await;
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(second[1].to_string(), "08:00:05: OK");

        let seen = trigger.transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|r| r.body() == "video_status=true"));
    }

    #[tokio::test]
    async fn test_http_run_reports_body_verbatim() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found",
        )
        .await;
        let transport = HttpTransport::new(&base_url, None).unwrap();
        let trigger =
            AnalyticsTrigger::new(transport, AnalyticsRequest::start(), DEFAULT_TIME_FORMAT)
            .unwrap();

        let notes = trigger.run_at(Timestamp::from("11:11:11")).collect().await;
        assert_eq!(notes[0].to_string(), "11:11:11: Video analytics initiated.");
        assert_eq!(notes[1].to_string(), "11:11:11: not found");
        assert_eq!(notes[1].kind, NotificationKind::Response);

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /video_events HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn test_http_unreachable_still_two_notifications() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(&format!("http://{}", addr), Some(5)).unwrap();
        let trigger =
            AnalyticsTrigger::new(transport, AnalyticsRequest::start(), DEFAULT_TIME_FORMAT)
            .unwrap();

        let notes = trigger.run().collect().await;
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1].kind, NotificationKind::Failure);
        assert!(notes[1].text.to_lowercase().contains("connect"));
    }

    #[test]
    fn test_invalid_time_format_rejected() {
        let result = AnalyticsTrigger::new(
            FakeTransport::replying(Ok("OK")),
            AnalyticsRequest::start(),
            "%H:%",
        );
        assert!(matches!(result, Err(TriggerError::InvalidTimeFormat(_))));
    }
}
