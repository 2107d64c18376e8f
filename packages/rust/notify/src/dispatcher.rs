//! Webhook notification dispatcher.
//!
//! Delivers a validated submission to every configured sink with exactly one
//! POST each. There is no retry and no queue: a failed call is reported as a
//! [`DispatchOutcome::Failed`] value and the caller decides what to do.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use contactdesk_shared::{ContactDeskError, NotifyConfig, PayloadFormat, ResolvedSink, Result};
use contactdesk_validation::ValidatedSubmission;

use crate::payload;

/// User-Agent string for webhook requests.
const USER_AGENT: &str = concat!("ContactDesk/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Why a delivery did not happen. Never contains the destination URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchFailure {
    /// The request or the whole dispatch ran past its deadline.
    Timeout,
    /// Connection, TLS, or body error.
    Transport(String),
    /// The sink answered with a non-success status.
    Rejected { status: u16 },
}

impl std::fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchFailure::Timeout => f.write_str("timeout"),
            DispatchFailure::Transport(reason) => write!(f, "transport error: {reason}"),
            DispatchFailure::Rejected { status } => write!(f, "sink responded with HTTP {status}"),
        }
    }
}

/// Result of one [`Dispatcher::dispatch`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    Failed(DispatchFailure),
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered)
    }
}

/// Anything that can deliver a validated submission somewhere.
///
/// The submission controller is generic over this so the HTTP dispatcher can
/// be swapped out in tests.
pub trait Notifier: Send + Sync {
    fn dispatch(
        &self,
        submission: ValidatedSubmission,
    ) -> impl Future<Output = DispatchOutcome> + Send;
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Posts submissions to one or more webhook sinks.
pub struct Dispatcher {
    client: Client,
    sinks: Vec<ResolvedSink>,
    deadline: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("sinks", &self.sinks)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher for already-resolved sinks.
    ///
    /// `deadline` bounds a whole [`dispatch`](Self::dispatch) call.
    pub fn new(sinks: Vec<ResolvedSink>, deadline: Duration) -> Result<Self> {
        if sinks.is_empty() {
            return Err(ContactDeskError::config("no notification sinks configured"));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(deadline)
            .build()
            .map_err(|e| ContactDeskError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            sinks,
            deadline,
        })
    }

    /// Build from config, reading sink URLs from the process environment.
    ///
    /// A missing or malformed webhook URL is a `Config` error here, never a
    /// per-call failure.
    pub fn from_config(config: &NotifyConfig) -> Result<Self> {
        let sinks = config.resolve_sinks()?;
        let dispatcher = Self::new(sinks, Duration::from_secs(config.timeout_secs))?;

        info!(
            sinks = dispatcher.sinks.len(),
            timeout_secs = config.timeout_secs,
            "notification dispatcher ready"
        );

        Ok(dispatcher)
    }

    /// Configured sinks as `(name, format)` pairs.
    pub fn sinks(&self) -> impl Iterator<Item = (&str, PayloadFormat)> {
        self.sinks.iter().map(|s| (s.name.as_str(), s.format))
    }

    /// Deliver `submission` to every sink, one attempt each.
    ///
    /// Returns `Delivered` only if every sink accepted it, otherwise the first
    /// failure. Running past the deadline yields `Failed(Timeout)`.
    #[instrument(skip_all, fields(sinks = self.sinks.len()))]
    pub async fn dispatch(&self, submission: ValidatedSubmission) -> DispatchOutcome {
        match tokio::time::timeout(self.deadline, self.deliver_all(&submission)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(deadline_ms = self.deadline.as_millis(), "dispatch deadline elapsed");
                DispatchOutcome::Failed(DispatchFailure::Timeout)
            }
        }
    }

    async fn deliver_all(&self, submission: &ValidatedSubmission) -> DispatchOutcome {
        let mut first_failure = None;

        for sink in &self.sinks {
            let body = payload::render(sink.format, submission);
            match post(&self.client, sink, &body).await {
                Ok(()) => debug!(sink = %sink.name, "notification delivered"),
                Err(failure) => {
                    warn!(sink = %sink.name, reason = %failure, "notification failed");
                    if first_failure.is_none() {
                        first_failure = Some(failure);
                    }
                }
            }
        }

        match first_failure {
            None => DispatchOutcome::Delivered,
            Some(failure) => DispatchOutcome::Failed(failure),
        }
    }
}

impl Notifier for Dispatcher {
    fn dispatch(
        &self,
        submission: ValidatedSubmission,
    ) -> impl Future<Output = DispatchOutcome> + Send {
        Dispatcher::dispatch(self, submission)
    }
}

/// POST `body` to a single sink.
async fn post(
    client: &Client,
    sink: &ResolvedSink,
    body: &Value,
) -> std::result::Result<(), DispatchFailure> {
    let response = client
        .post(sink.url.clone())
        .json(body)
        .send()
        .await
        .map_err(transport_failure)?;

    let status = response.status();
    if !status.is_success() {
        return Err(DispatchFailure::Rejected {
            status: status.as_u16(),
        });
    }

    Ok(())
}

/// Map a reqwest error to a failure, stripping the URL from its message.
fn transport_failure(e: reqwest::Error) -> DispatchFailure {
    if e.is_timeout() {
        DispatchFailure::Timeout
    } else {
        DispatchFailure::Transport(e.without_url().to_string())
    }
}
