//! REST client for the Viral DNA analysis backend.
//!
//! This crate provides:
//! - Analysis creation, lookup and history
//! - Script creation and per-segment media generation
//! - Video preview submission and task status polling
//! - Request metrics per operation

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use types::{CreateScriptRequest, PreviewRequest, PreviewSubmission};
