//! Analysis records returned by the backend.
//!
//! An analysis takes a batch of short-form videos and produces a cross-video
//! style passport, success patterns and a combined transcript. Scripts
//! generated from the analysis hang off the same record.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Script;

/// Processing phase of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Idle,
    Processing,
    Downloading,
    Transcribing,
    Analyzing,
    Ready,
    Error,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Downloading => "downloading",
            Self::Transcribing => "transcribing",
            Self::Analyzing => "analyzing",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }

    /// Returns true if the status is terminal (ready or error).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    /// Progress line shown while the analysis runs.
    pub fn progress_label(&self) -> &'static str {
        match self {
            Self::Idle => "Waiting to start",
            Self::Processing => "Preparing sources",
            Self::Downloading => "Downloading videos",
            Self::Transcribing => "Transcribing audio",
            Self::Analyzing => "Extracting style DNA",
            Self::Ready => "Analysis ready",
            Self::Error => "Analysis failed",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of analysis source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Url,
    File,
}

/// Source submitted when creating an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourceInput {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// Video link, or an uploaded file reference
    pub value: String,
    pub label: String,
}

impl SourceInput {
    /// Link source labelled with its own URL.
    pub fn url(url: impl Into<String>) -> Self {
        let value = url.into();
        Self {
            kind: SourceKind::Url,
            label: value.clone(),
            value,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Source as stored on an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisSource {
    #[serde(default)]
    pub id: Option<String>,
    pub source_type: SourceKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub file_mime_type: Option<String>,
}

/// One line of the combined transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegment {
    pub start: String,
    pub end: String,
    pub text: String,
}

/// Structural beat of the creator's typical video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PassportSection {
    pub segment: String,
    pub start: String,
    pub end: String,
    pub description: String,
}

/// Cross-video profile of a creator's structure, tone and recurring phrases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StylePassport {
    pub structure: Vec<PassportSection>,
    pub speech_rate_wpm: f64,
    pub catchphrases: Vec<String>,
    pub fillers: Vec<String>,
    pub sentiment: String,
    pub tone_tags: Vec<String>,
    pub visual_context: Vec<String>,
}

impl StylePassport {
    pub fn is_empty(&self) -> bool {
        self.structure.is_empty() && self.catchphrases.is_empty() && self.tone_tags.is_empty()
    }
}

/// Recurring success pattern found across the analysed videos.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ContentPattern {
    pub name: String,
    pub description: String,
    /// Impact rating as written by the analysis model
    pub impact: String,
    pub evidence_segments: Vec<String>,
}

/// Web source cited by the analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GroundingSource {
    pub title: Option<String>,
    pub uri: Option<String>,
}

/// Full analysis record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    pub id: String,
    #[serde(default)]
    pub status: AnalysisStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sources: Vec<AnalysisSource>,
    #[serde(default)]
    pub transcript: Vec<TranscriptSegment>,
    #[serde(default)]
    pub style_passport: StylePassport,
    #[serde(default)]
    pub patterns: Vec<ContentPattern>,
    #[serde(default)]
    pub grounding_sources: Vec<GroundingSource>,
    #[serde(default)]
    pub scripts: Vec<Script>,
}

impl AnalysisResult {
    pub fn script(&self, script_id: &str) -> Option<&Script> {
        self.scripts.iter().find(|s| s.script_id == script_id)
    }

    pub fn script_mut(&mut self, script_id: &str) -> Option<&mut Script> {
        self.scripts.iter_mut().find(|s| s.script_id == script_id)
    }
}
