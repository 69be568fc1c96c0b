//! Text-to-video models accepted by the preview endpoint.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Video generation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum VideoModel {
    /// Grok Imagine text-to-video (portrait 2:3 output)
    #[default]
    #[serde(rename = "grok-imagine/text-to-video")]
    GrokImagine,
    /// Sora 2 text-to-video
    #[serde(rename = "sora-2-text-to-video")]
    Sora2,
}

impl VideoModel {
    pub const ALL: &'static [VideoModel] = &[VideoModel::GrokImagine, VideoModel::Sora2];

    /// Wire identifier sent to the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoModel::GrokImagine => "grok-imagine/text-to-video",
            VideoModel::Sora2 => "sora-2-text-to-video",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            VideoModel::GrokImagine => "Grok Imagine - Text to Video",
            VideoModel::Sora2 => "Sora 2 - Text to Video",
        }
    }
}

impl fmt::Display for VideoModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VideoModel {
    type Err = VideoModelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "grok-imagine/text-to-video" => Ok(VideoModel::GrokImagine),
            "sora-2-text-to-video" => Ok(VideoModel::Sora2),
            _ => Err(VideoModelParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown video model: {0}")]
pub struct VideoModelParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_models() {
        for model in VideoModel::ALL {
            assert_eq!(model.as_str().parse::<VideoModel>().unwrap(), *model);
        }
    }

    #[test]
    fn test_parse_unknown_model() {
        let err = "veo-3".parse::<VideoModel>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown video model: veo-3");
        assert!("Sora-2-Text-To-Video".parse::<VideoModel>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_identifier() {
        let json = serde_json::to_string(&VideoModel::Sora2).unwrap();
        assert_eq!(json, "\"sora-2-text-to-video\"");
        let parsed: VideoModel = serde_json::from_str("\"grok-imagine/text-to-video\"").unwrap();
        assert_eq!(parsed, VideoModel::GrokImagine);
    }
}
