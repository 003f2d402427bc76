//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fabric Studio Server",
        version = "0.1.0",
        description = "Turns fabric photographs into on-model catalog images, bilingual captions and reel audio"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        api::health::health,
        api::health::ready,
        api::content::generate,
        api::multi_fabric::multi_fabric,
        api::multi_fabric::get_job,
        api::reels::generate_reel,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Content
            models::UploadKind,
            models::ApprovalStatus,
            models::ResultStatus,
            models::GeneratedContent,
            models::GenerateContentRequest,
            models::GenerateContentResponse,
            // Multi-fabric
            models::JobStatus,
            models::OutputMode,
            models::FabricPiece,
            models::DetectedLabels,
            models::MultiFabricJob,
            models::GenerationResult,
            models::MultiFabricRequest,
            models::DetectResponse,
            models::MultiFabricGenerateResponse,
            models::JobDetailResponse,
            // Reels
            models::ReelStatus,
            models::Reel,
            models::ReelRequest,
            models::ReelResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Content", description = "Single fabric photo generation"),
        (name = "Multi-fabric", description = "Labeled multi-fabric detection and sample generation"),
        (name = "Reels", description = "Voiceover and music for generated content")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Bearer token security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
