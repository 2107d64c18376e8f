//! Shared types, error model, and configuration for ContactDesk.
//!
//! This crate is the foundation depended on by all other ContactDesk crates.
//! It provides:
//! - [`ContactDeskError`] — the unified error type
//! - Domain types ([`SubmissionInput`], [`FieldErrors`], [`SubmissionId`])
//! - Configuration ([`AppConfig`], [`NotifyConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AddressConfig, AppConfig, NotifyConfig, PRIMARY_SINK_NAME, PayloadFormat, ResolvedSink,
    ServerConfig, SinkConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{ContactDeskError, Result};
pub use types::{
    ErrorReason, Field, FieldErrors, SubmissionId, SubmissionInput, ValidationError,
};
