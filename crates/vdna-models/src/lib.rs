//! Shared data models for the Viral DNA client.
//!
//! This crate provides Serde-serializable types for:
//! - Analyses, style passports and content patterns
//! - Generated scripts, their segments and per-segment media state
//! - Video generation tasks and the remote task states reported while polling
//! - Timeframe parsing for segment durations

pub mod analysis;
pub mod script;
pub mod task;
pub mod timeframe;
pub mod video_model;

// Re-export common types
pub use analysis::{
    AnalysisResult, AnalysisSource, AnalysisStatus, ContentPattern, GroundingSource,
    PassportSection, SourceInput, SourceKind, StylePassport, TranscriptSegment,
};
pub use script::{MediaStatus, Script, ScriptSegment, SegmentMedia};
pub use task::{GenerationTask, RemoteTaskState, TaskState, TaskStatusResponse};
pub use timeframe::{parse_span_end_seconds, TimeframeError, FALLBACK_SPAN_SECS};
pub use video_model::{VideoModel, VideoModelParseError};
