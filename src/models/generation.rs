//! Request/response bodies for the generation endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::content::{GenerationResult, UploadKind};
use super::job::{MultiFabricJob, OutputMode};
use super::labels::DetectedLabels;

/// Single-job generation request.
///
/// Required fields are optional here so that a missing field is reported as
/// `INVALID_INPUT` naming the field.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Fabric upload id
    pub source_id: Option<Uuid>,
    pub source_image_url: Option<String>,
    /// Existing content row to regenerate in place
    pub result_id: Option<Uuid>,
    pub custom_instructions: Option<String>,
    pub background_image_url: Option<String>,
    /// Defaults to the stored upload type of the fabric row
    pub upload_kind: Option<UploadKind>,
    pub mannequin_reference_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    pub success: bool,
    pub content_id: Uuid,
    pub generated_image_url: String,
    pub caption_primary: String,
    pub caption_secondary: String,
}

/// Multi-fabric request, tagged by `action`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum MultiFabricRequest {
    #[serde(rename_all = "camelCase")]
    Detect { source_image_url: Option<String> },
    #[serde(rename_all = "camelCase")]
    Generate {
        job_id: Option<Uuid>,
        mannequin_reference_url: Option<String>,
        background_image_url: Option<String>,
        output_mode: Option<OutputMode>,
    },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    pub success: bool,
    pub job_id: Uuid,
    pub detected_labels: DetectedLabels,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MultiFabricGenerateResponse {
    pub success: bool,
    pub job_id: Uuid,
    pub results: Vec<GenerationResult>,
}

/// Job with its results, for polling.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobDetailResponse {
    pub job: MultiFabricJob,
    pub results: Vec<GenerationResult>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReelRequest {
    #[serde(alias = "sourceContentId")]
    pub content_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReelResponse {
    pub success: bool,
    pub reel_id: Uuid,
    pub voiceover_url: String,
    pub music_url: String,
    pub caption_primary: String,
    pub caption_secondary: String,
    pub image_url: Option<String>,
}
