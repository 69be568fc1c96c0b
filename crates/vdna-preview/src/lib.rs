//! Video preview core for the Viral DNA client.
//!
//! This crate provides:
//! - Segment grouping by accumulated timeframe duration
//! - Reconciliation of task results against the segments of a group
//! - The [`TaskPoller`] state machine and its scheduled polling loop
//! - The [`GenerationBackend`] and [`SettleHook`] seams used by callers

pub mod backend;
pub mod config;
pub mod error;
pub mod group;
pub mod logging;
pub mod metrics;
pub mod poller;
pub mod reconcile;
pub mod schedule;

pub use backend::{GenerationBackend, SettleHook};
pub use config::PollerConfig;
pub use error::{PreviewError, PreviewResult};
pub use group::{
    accumulated_duration, is_group_ready, resolve_group_boundary, SegmentGroup,
    READY_THRESHOLD_SECS,
};
pub use logging::TaskLogger;
pub use poller::{PollOutcome, PreviewPhase, PreviewView, TaskHandle, TaskPoller};
pub use reconcile::{
    compute_group_identity, merge_settled, reconcile_video_info, MergeOutcome, ReconciledVideo,
    Settlement,
};
pub use schedule::PollHandle;
