//! Submission pipeline orchestration for ContactDesk.
//!
//! This crate ties validation and notification together into the single
//! `submit` workflow the HTTP surface and CLI call.

pub mod pipeline;
pub mod result;

pub use pipeline::SubmissionController;
pub use result::{NOTIFICATION_FAILED, SubmissionResult};
