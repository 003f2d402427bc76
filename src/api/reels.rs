//! Reel Studio handler.

use actix_web::{HttpResponse, web};

use crate::auth::UserAuth;
use crate::error::AppResult;
use crate::models::{ReelRequest, ReelResponse};
use crate::services::Pipeline;
use crate::services::reels::create_reel;

/// Generate voiceover and background music for a content row.
#[utoipa::path(
    post,
    path = "/api/v1/reels",
    tag = "Reels",
    request_body = ReelRequest,
    responses(
        (status = 200, description = "Reel ready", body = ReelResponse),
        (status = 400, description = "Missing contentId", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 402, description = "Audio credits exhausted", body = crate::error::ErrorResponse),
        (status = 404, description = "Content not found", body = crate::error::ErrorResponse),
        (status = 429, description = "Rate limited", body = crate::error::ErrorResponse),
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn generate_reel(
    auth: UserAuth,
    pipeline: web::Data<Pipeline>,
    body: web::Json<ReelRequest>,
) -> AppResult<HttpResponse> {
    let response = create_reel(pipeline.get_ref(), auth.user.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/reels").route(web::post().to(generate_reel)));
}
