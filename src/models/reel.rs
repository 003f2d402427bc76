//! Reel (voiceover + music) models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReelStatus {
    GeneratingAudio,
    Ready,
    Failed,
}

impl ReelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeneratingAudio => "generating_audio",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "generating_audio" => Some(Self::GeneratingAudio),
            "ready" => Some(Self::Ready),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Reel row.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content_id: Uuid,
    pub voiceover_url: Option<String>,
    pub music_url: Option<String>,
    pub caption_english: Option<String>,
    pub caption_hindi: Option<String>,
    pub status: ReelStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full-row write for a reel. Fields left `None` are stored as NULL.
#[derive(Debug, Clone)]
pub struct ReelWrite {
    pub voiceover_url: Option<String>,
    pub music_url: Option<String>,
    pub caption_english: Option<String>,
    pub caption_hindi: Option<String>,
    pub status: ReelStatus,
    pub error_message: Option<String>,
}
