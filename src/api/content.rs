//! Single-job content generation handler.

use actix_web::{HttpResponse, web};

use crate::auth::UserAuth;
use crate::error::AppResult;
use crate::models::{GenerateContentRequest, GenerateContentResponse};
use crate::services::Pipeline;
use crate::services::content::generate_content;

/// Generate an on-model image and captions for a fabric upload.
///
/// With `resultId` the existing content row is regenerated in place and its
/// approval goes back to pending. A 409 means the fabric was deleted while
/// the image was being made; the body then carries `generatedImageUrl`.
#[utoipa::path(
    post,
    path = "/api/v1/content/generate",
    tag = "Content",
    request_body = GenerateContentRequest,
    responses(
        (status = 200, description = "Content generated", body = GenerateContentResponse),
        (status = 400, description = "Missing or invalid field", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 402, description = "AI credits exhausted", body = crate::error::ErrorResponse),
        (status = 404, description = "Fabric or content not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Source removed during generation", body = crate::error::ErrorResponse),
        (status = 429, description = "Rate limited", body = crate::error::ErrorResponse),
        (status = 500, description = "Generation failed", body = crate::error::ErrorResponse),
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn generate(
    auth: UserAuth,
    pipeline: web::Data<Pipeline>,
    body: web::Json<GenerateContentRequest>,
) -> AppResult<HttpResponse> {
    let response = generate_content(pipeline.get_ref(), auth.user.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/content/generate").route(web::post().to(generate)));
}
