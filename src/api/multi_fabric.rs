//! Labeled multi-fabric handlers.

use actix_web::{HttpResponse, web};
use tracing::info;
use uuid::Uuid;

use crate::auth::UserAuth;
use crate::error::{AppError, AppResult};
use crate::models::{
    DetectResponse, JobDetailResponse, MultiFabricGenerateResponse, MultiFabricRequest,
};
use crate::services::Pipeline;
use crate::services::detector::run_detection;
use crate::services::orchestrator::{GenerateOptions, run_multi_sample_generation};

/// Detect labels or generate samples, depending on `action`.
///
/// `detect` returns `DetectResponse`; `generate` returns
/// `MultiFabricGenerateResponse` with every result row of the job.
#[utoipa::path(
    post,
    path = "/api/v1/multi-fabric",
    tag = "Multi-fabric",
    request_body = MultiFabricRequest,
    responses(
        (status = 200, description = "Samples generated; detect answers with DetectResponse", body = MultiFabricGenerateResponse),
        (status = 400, description = "Invalid request or job state", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 402, description = "AI credits exhausted", body = crate::error::ErrorResponse),
        (status = 404, description = "Job not found", body = crate::error::ErrorResponse),
        (status = 429, description = "Rate limited", body = crate::error::ErrorResponse),
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn multi_fabric(
    auth: UserAuth,
    pipeline: web::Data<Pipeline>,
    body: web::Json<MultiFabricRequest>,
) -> AppResult<HttpResponse> {
    let user_id = auth.user.user_id;

    match body.into_inner() {
        MultiFabricRequest::Detect { source_image_url } => {
            let (job_id, detected_labels) =
                run_detection(pipeline.get_ref(), user_id, source_image_url.as_deref()).await?;

            Ok(HttpResponse::Ok().json(DetectResponse {
                success: true,
                job_id,
                detected_labels,
            }))
        }
        MultiFabricRequest::Generate {
            job_id,
            mannequin_reference_url,
            background_image_url,
            output_mode,
        } => {
            let job_id =
                job_id.ok_or_else(|| AppError::InvalidInput("jobId is required".to_string()))?;
            let options = GenerateOptions {
                mannequin_reference_url,
                background_image_url,
                output_mode: output_mode.unwrap_or_default(),
            };
            let results =
                run_multi_sample_generation(pipeline.get_ref(), user_id, Some(job_id), options)
                    .await?;

            info!(%job_id, results = results.len(), "Returning multi-fabric results");

            Ok(HttpResponse::Ok().json(MultiFabricGenerateResponse {
                success: true,
                job_id,
                results,
            }))
        }
    }
}

/// Job with its results, for polling.
#[utoipa::path(
    get,
    path = "/api/v1/multi-fabric/jobs/{job_id}",
    tag = "Multi-fabric",
    params(
        ("job_id" = Uuid, Path, description = "Job UUID")
    ),
    responses(
        (status = 200, description = "Job found", body = JobDetailResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 404, description = "Job not found", body = crate::error::ErrorResponse),
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn get_job(
    auth: UserAuth,
    pipeline: web::Data<Pipeline>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let job_id = path.into_inner();
    let repo = pipeline.repo.as_ref();

    let job = repo
        .find_multi_fabric_job(auth.user.user_id, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {}", job_id)))?;
    let results = repo.list_results(job_id).await?;

    Ok(HttpResponse::Ok().json(JobDetailResponse { job, results }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/multi-fabric").route(web::post().to(multi_fabric)))
        .service(web::resource("/multi-fabric/jobs/{job_id}").route(web::get().to(get_job)));
}
