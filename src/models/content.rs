//! Generated content, results and upload assets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Per-result generation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Generating,
    Completed,
    Failed,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "generating" => Some(Self::Generating),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Generating)
    }
}

/// Seller approval state of a single-job content row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Caption pair. Primary is English, secondary is Hindi.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Captions {
    pub primary: String,
    pub secondary: String,
}

/// What the seller uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum UploadKind {
    /// Plain fabric or a photo that may contain a person
    #[serde(rename = "fabric")]
    Fabric,
    /// Photo of a person wearing the garment, to be moved onto a mannequin
    #[serde(rename = "mannequin", alias = "mannequin-conversion")]
    MannequinConversion,
    /// Labeled multi-fabric photo
    #[serde(rename = "multi-fabric")]
    LabeledMultiFabric,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fabric => "fabric",
            Self::MannequinConversion => "mannequin",
            Self::LabeledMultiFabric => "multi-fabric",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fabric" => Some(Self::Fabric),
            "mannequin" | "mannequin-conversion" => Some(Self::MannequinConversion),
            "multi-fabric" => Some(Self::LabeledMultiFabric),
            _ => None,
        }
    }
}

/// Fabric upload row (read-only for the pipeline).
#[derive(Debug, Clone)]
pub struct FabricImage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_url: String,
    pub file_name: String,
    pub upload_type: UploadKind,
}

/// Single-job generated content row.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub fabric_id: Uuid,
    pub model_image_url: Option<String>,
    pub background_image_url: Option<String>,
    pub caption_english: Option<String>,
    pub caption_hindi: Option<String>,
    pub status: ApprovalStatus,
    pub generation_status: ResultStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values written when a single-job generation settles.
#[derive(Debug, Clone)]
pub struct ContentWrite {
    pub fabric_id: Uuid,
    pub model_image_url: Option<String>,
    pub background_image_url: Option<String>,
    pub captions: Captions,
    pub generation_status: ResultStatus,
    pub error_message: Option<String>,
}

/// One multi-fabric output (row in `multi_fabric_results`).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub label: String,
    pub color_variant: Option<String>,
    pub generated_image_url: Option<String>,
    pub caption_english: Option<String>,
    pub caption_hindi: Option<String>,
    pub status: ResultStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row to create before a fan-out task starts.
#[derive(Debug, Clone)]
pub struct NewResult {
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub label: String,
    pub color_variant: Option<String>,
}

/// Terminal write for a result row.
#[derive(Debug, Clone)]
pub enum ResultUpdate {
    Success {
        image_url: String,
        captions: Captions,
    },
    Failure {
        error: String,
    },
}

impl ResultUpdate {
    pub fn status(&self) -> ResultStatus {
        match self {
            Self::Success { .. } => ResultStatus::Completed,
            Self::Failure { .. } => ResultStatus::Failed,
        }
    }
}
