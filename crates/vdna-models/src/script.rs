//! Generated scripts and per-segment media state.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media generation status of a single script segment.
///
/// The backend walks a segment through image, video and audio generation;
/// the preview flow only ever moves it into `GeneratingVideo` and then to
/// `Done` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaStatus {
    #[default]
    Idle,
    GeneratingImage,
    GeneratingVideo,
    GeneratingAudio,
    Done,
    Error,
}

impl MediaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaStatus::Idle => "idle",
            MediaStatus::GeneratingImage => "generating_image",
            MediaStatus::GeneratingVideo => "generating_video",
            MediaStatus::GeneratingAudio => "generating_audio",
            MediaStatus::Done => "done",
            MediaStatus::Error => "error",
        }
    }

    /// True while any generation step is running.
    pub fn is_generating(&self) -> bool {
        matches!(
            self,
            MediaStatus::GeneratingImage | MediaStatus::GeneratingVideo | MediaStatus::GeneratingAudio
        )
    }

    /// True once generation finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MediaStatus::Done | MediaStatus::Error)
    }
}

impl fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Media attached to a script segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMedia {
    #[serde(default)]
    pub status: MediaStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Identifier of the external generation task that owns this media
    #[serde(default, alias = "kieTaskId", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Model used for the task
    #[serde(default, alias = "kieModel", skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

impl SegmentMedia {
    /// Media record for a segment with nothing generated yet.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Attach a freshly accepted video task.
    pub fn begin_video(&mut self, task_id: impl Into<String>, model_id: impl Into<String>) {
        self.status = MediaStatus::GeneratingVideo;
        self.task_id = Some(task_id.into());
        self.model_id = Some(model_id.into());
        self.video_url = None;
    }

    /// Record the finished video.
    pub fn complete_video(&mut self, video_url: impl Into<String>) {
        self.status = MediaStatus::Done;
        self.video_url = Some(video_url.into());
    }

    /// Mark the current generation as failed. URLs from earlier runs are dropped.
    pub fn fail(&mut self) {
        self.status = MediaStatus::Error;
        self.video_url = None;
    }
}

/// One timed beat of a generated script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScriptSegment {
    pub id: String,
    /// Span encoded as text, e.g. `0:00-0:15` or `15s`
    pub timeframe: String,
    /// Visual plan
    #[serde(default)]
    pub visual: String,
    /// Voice-over text
    #[serde(default)]
    pub audio: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<SegmentMedia>,
}

impl ScriptSegment {
    pub fn new(id: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timeframe: timeframe.into(),
            visual: String::new(),
            audio: String::new(),
            order: 0,
            media: None,
        }
    }

    pub fn with_visual(mut self, visual: impl Into<String>) -> Self {
        self.visual = visual.into();
        self
    }

    pub fn with_audio(mut self, audio: impl Into<String>) -> Self {
        self.audio = audio.into();
        self
    }

    pub fn with_media(mut self, media: SegmentMedia) -> Self {
        self.media = Some(media);
        self
    }

    /// Media status; a segment without media is idle.
    pub fn media_status(&self) -> MediaStatus {
        self.media.as_ref().map(|m| m.status).unwrap_or_default()
    }

    /// Task id currently stored on the segment, if any.
    pub fn task_id(&self) -> Option<&str> {
        self.media.as_ref().and_then(|m| m.task_id.as_deref())
    }

    pub fn video_url(&self) -> Option<&str> {
        self.media.as_ref().and_then(|m| m.video_url.as_deref())
    }

    /// Mutable media record, created idle on first access.
    pub fn media_mut(&mut self) -> &mut SegmentMedia {
        self.media.get_or_insert_with(SegmentMedia::idle)
    }
}

/// A script generated from an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Script {
    #[serde(rename = "id")]
    pub script_id: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub segments: Vec<ScriptSegment>,
}

impl Script {
    pub fn new(script_id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            script_id: script_id.into(),
            topic: topic.into(),
            segments: Vec::new(),
        }
    }

    pub fn with_segment(mut self, segment: ScriptSegment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn segment(&self, segment_id: &str) -> Option<&ScriptSegment> {
        self.segments.iter().find(|s| s.id == segment_id)
    }

    pub fn segment_mut(&mut self, segment_id: &str) -> Option<&mut ScriptSegment> {
        self.segments.iter_mut().find(|s| s.id == segment_id)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
