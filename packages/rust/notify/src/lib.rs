//! Outbound notification of accepted contact submissions.
//!
//! This crate provides:
//! - [`Dispatcher`] — posts a submission to the configured webhook sinks
//! - [`Notifier`] — the seam the submission controller depends on
//! - [`payload`] — per-format request bodies (flat JSON, Slack)

pub mod dispatcher;
pub mod payload;

pub use dispatcher::{DispatchFailure, DispatchOutcome, Dispatcher, Notifier};
