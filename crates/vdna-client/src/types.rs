//! Request and response bodies of the backend REST API.

use serde::{Deserialize, Serialize};
use vdna_models::{SourceInput, VideoModel};

/// Body of `POST analyses/`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAnalysisRequest {
    pub sources: Vec<SourceInput>,
}

/// Body of `POST scripts/`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateScriptRequest {
    pub analysis_id: String,
    pub topic: String,
}

/// Body of `POST scripts/{id}/generate_media/`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateMediaRequest {
    pub segment_id: String,
}

/// Body of `POST scripts/{id}/generate_video_preview/`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PreviewRequest {
    /// Only the leading segment of a group is ever sent
    pub segment_ids: Vec<String>,
    pub model: VideoModel,
    pub additional_notes: String,
}

impl PreviewRequest {
    /// Request for a group led by `first_segment_id`.
    pub fn for_leading_segment(
        first_segment_id: impl Into<String>,
        model: VideoModel,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            segment_ids: vec![first_segment_id.into()],
            model,
            additional_notes: notes.into(),
        }
    }
}

/// Response of the preview submission (HTTP 202).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PreviewSubmission {
    pub task_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body; the backend uses either key.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.error.or(self.detail).filter(|m| !m.trim().is_empty())
    }
}
