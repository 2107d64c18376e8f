//! End-to-end submission pipeline: raw input → validate → notify → result.

use std::time::Instant;

use tracing::{info, instrument, warn};

use contactdesk_notify::{DispatchOutcome, Notifier};
use contactdesk_shared::{SubmissionId, SubmissionInput};
use contactdesk_validation::{ValidationResult, validate};

use crate::result::{NOTIFICATION_FAILED, SubmissionResult};

/// Runs contact submissions through validation and notification.
///
/// Holds no per-submission state, so one controller can serve concurrent
/// requests.
#[derive(Debug)]
pub struct SubmissionController<N> {
    notifier: N,
}

impl<N: Notifier> SubmissionController<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Process one submission.
    ///
    /// 1. Validate. Invalid input is rejected without dispatching.
    /// 2. Dispatch the validated submission exactly once.
    /// 3. Accept. A failed dispatch only adds a warning and a log line.
    #[instrument(skip_all, fields(submission_id = %SubmissionId::new()))]
    pub async fn submit(&self, raw: SubmissionInput) -> SubmissionResult {
        let start = Instant::now();

        let submission = match validate(&raw) {
            ValidationResult::Valid(submission) => submission,
            ValidationResult::Invalid(errors) => {
                info!(fields = ?errors.fields(), "submission rejected");
                return SubmissionResult::Rejected(errors);
            }
        };

        match self.notifier.dispatch(submission).await {
            DispatchOutcome::Delivered => {
                info!(elapsed_ms = start.elapsed().as_millis(), "submission accepted");
                SubmissionResult::Accepted
            }
            DispatchOutcome::Failed(reason) => {
                warn!(
                    %reason,
                    elapsed_ms = start.elapsed().as_millis(),
                    "submission accepted but notification failed"
                );
                SubmissionResult::AcceptedWithWarning(NOTIFICATION_FAILED.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::Mutex;
    use std::time::Duration;

    use contactdesk_notify::{DispatchFailure, Dispatcher};
    use contactdesk_shared::{ErrorReason, PayloadFormat, ResolvedSink};
    use contactdesk_validation::ValidatedSubmission;
    use serde_json::{Value, json};
    use url::Url;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Records every submission and answers with a fixed outcome.
    struct RecordingNotifier {
        outcome: DispatchOutcome,
        calls: Mutex<Vec<ValidatedSubmission>>,
    }

    impl RecordingNotifier {
        fn new(outcome: DispatchOutcome) -> Self {
            Self {
                outcome,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<ValidatedSubmission> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn dispatch(
            &self,
            submission: ValidatedSubmission,
        ) -> impl Future<Output = DispatchOutcome> + Send {
            self.calls.lock().unwrap().push(submission);
            let outcome = self.outcome.clone();
            async move { outcome }
        }
    }

    fn scenario_a_input() -> SubmissionInput {
        SubmissionInput::from_fields([
            ("name", "Taro"),
            ("company", ""),
            ("phone", ""),
            ("email", "taro@example.com"),
            ("message", "hello"),
            ("locale", "ja"),
        ])
    }

    fn http_controller(uri: &str) -> SubmissionController<Dispatcher> {
        let sink = ResolvedSink {
            name: "webhook".into(),
            url: Url::parse(uri).unwrap(),
            format: PayloadFormat::Json,
        };
        let dispatcher = Dispatcher::new(vec![sink], Duration::from_secs(5)).unwrap();
        SubmissionController::new(dispatcher)
    }

    #[tokio::test]
    async fn valid_submission_is_dispatched_once() {
        let controller =
            SubmissionController::new(RecordingNotifier::new(DispatchOutcome::Delivered));

        let result = controller.submit(scenario_a_input()).await;

        assert_eq!(result, SubmissionResult::Accepted);
        let calls = controller.notifier().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name(), "Taro");
        assert_eq!(calls[0].locale(), "ja");
    }

    #[tokio::test]
    async fn invalid_submission_never_dispatches() {
        let controller =
            SubmissionController::new(RecordingNotifier::new(DispatchOutcome::Delivered));

        let raw = SubmissionInput::from_fields([("name", ""), ("email", "bad"), ("message", "")]);
        let result = controller.submit(raw).await;

        let errors = result.field_errors().expect("rejected");
        assert_eq!(errors.get("name"), Some(&[ErrorReason::Required][..]));
        assert_eq!(errors.get("email"), Some(&[ErrorReason::InvalidFormat][..]));
        assert_eq!(errors.get("message"), Some(&[ErrorReason::Required][..]));
        assert!(controller.notifier().calls().is_empty());
    }

    #[tokio::test]
    async fn failed_dispatch_is_accepted_with_warning() {
        let controller = SubmissionController::new(RecordingNotifier::new(
            DispatchOutcome::Failed(DispatchFailure::Timeout),
        ));

        let result = controller.submit(scenario_a_input()).await;

        assert!(result.is_ok());
        assert_eq!(result.warning(), Some(NOTIFICATION_FAILED));
        assert_eq!(controller.notifier().calls().len(), 1);
    }

    #[tokio::test]
    async fn scenario_a_posts_all_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let result = http_controller(&server.uri()).submit(scenario_a_input()).await;
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({ "ok": true }));

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body: Value = requests[0].body_json().unwrap();
        assert_eq!(
            body,
            json!({
                "name": "Taro",
                "company": "",
                "phone": "",
                "email": "taro@example.com",
                "message": "hello",
                "locale": "ja",
            })
        );
    }

    #[tokio::test]
    async fn scenario_b_makes_no_outbound_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let raw = SubmissionInput::from_fields([("name", ""), ("email", "bad"), ("message", "")]);
        let result = http_controller(&server.uri()).submit(raw).await;

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "ok": false,
                "fieldErrors": {
                    "name": ["required"],
                    "email": ["invalid_format"],
                    "message": ["required"],
                },
            })
        );
        assert_eq!(
            result.field_errors().map(|e| e.fields()),
            Some(vec!["name", "email", "message"])
        );
    }

    #[tokio::test]
    async fn scenario_c_network_failure_still_succeeds() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let result = http_controller(&uri).submit(scenario_a_input()).await;

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "ok": true, "warning": "notification failed" })
        );
    }
}
