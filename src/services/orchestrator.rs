//! Multi-sample fan-out for labeled multi-fabric jobs (`generate` action).
//!
//! Captions are generated once and shared. In `separate` mode every result
//! row is created up front and all image generations run concurrently; each
//! task writes only its own row. In `combined` mode a single row gets one
//! image with every variant side by side.

use futures_util::future::join_all;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::invoker::{generate_captions, generate_image};
use super::pipeline::{Pipeline, advance_job, fail_job};
use super::prompts::{GarmentSpec, PromptContext, build_image_prompt};
use super::reconciler::finalize_result;
use super::resolver::resolve_background;
use super::storage::{extension_for_content_type, generated_image_key};
use crate::error::{AppError, AppResult};
use crate::models::{
    Captions, DetectedLabels, GenerationResult, JobStatus, MultiFabricJob, NewResult, OutputMode,
    PieceKind, ResultUpdate, UploadKind,
};

/// Label of the main sample row.
pub const MAIN_LABEL: &str = "main";
/// Label of color variant rows.
pub const COLOR_VARIANT_LABEL: &str = "color_variant";
/// Label of the single row written in combined mode.
pub const COMBINED_LABEL: &str = "combined";

/// One image to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplePlan {
    pub label: String,
    pub color_variant: Option<String>,
    pub description: String,
}

/// Caller options for a generate call.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub mannequin_reference_url: Option<String>,
    pub background_image_url: Option<String>,
    pub output_mode: OutputMode,
}

/// Number of samples [`plan_samples`] produces, without building the plan.
pub fn planned_sample_count(labels: &DetectedLabels) -> usize {
    labels.sample_count.max(1 + labels.color_variants.len())
}

/// Samples for a job: `main`, one per color variant, then `sample_N` fillers
/// up to the declared sample count.
pub fn plan_samples(labels: &DetectedLabels) -> Vec<SamplePlan> {
    let main_description = main_description(labels);
    let color_pieces: Vec<_> = labels.pieces_of(PieceKind::ColorVariant).collect();

    let mut plan = vec![SamplePlan {
        label: MAIN_LABEL.to_string(),
        color_variant: None,
        description: main_description.clone(),
    }];

    for (index, variant) in labels.color_variants.iter().enumerate() {
        let swatch = color_pieces
            .get(index)
            .map(|p| p.description.as_str())
            .filter(|d| !d.is_empty() && *d != variant.as_str());
        let description = match swatch {
            Some(swatch) => format!(
                "{}, recolored in the {} colorway shown on the C swatch ({})",
                main_description, variant, swatch
            ),
            None => format!("{}, recolored in the {} colorway", main_description, variant),
        };
        plan.push(SamplePlan {
            label: COLOR_VARIANT_LABEL.to_string(),
            color_variant: Some(variant.clone()),
            description,
        });
    }

    let total = planned_sample_count(labels);
    while plan.len() < total {
        let number = plan.len() + 1;
        plan.push(SamplePlan {
            label: format!("sample_{}", number),
            color_variant: None,
            description: format!(
                "{}, styled as alternate look {} of the same fabrics",
                main_description, number
            ),
        });
    }

    plan
}

fn main_description(labels: &DetectedLabels) -> String {
    let parts: Vec<String> = [
        (PieceKind::Top, "top"),
        (PieceKind::Dupatta, "dupatta"),
        (PieceKind::Bottom, "bottom"),
    ]
    .iter()
    .filter_map(|(kind, name)| {
        labels
            .first_piece(*kind)
            .filter(|p| !p.description.is_empty())
            .map(|p| format!("{} in {}", name, p.description))
    })
    .collect();

    if parts.is_empty() {
        "outfit made from the labeled fabrics".to_string()
    } else {
        format!("outfit with {}", parts.join("; "))
    }
}

/// Run the generate action for a detected job.
///
/// Returns every result row of the job, re-read after all tasks settled.
pub async fn run_multi_sample_generation(
    pipeline: &Pipeline,
    user_id: Uuid,
    job_id: Option<Uuid>,
    options: GenerateOptions,
) -> AppResult<Vec<GenerationResult>> {
    let job_id = job_id.ok_or_else(|| AppError::InvalidInput("jobId is required".to_string()))?;
    let repo = pipeline.repo.as_ref();

    let job = repo
        .find_multi_fabric_job(user_id, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {}", job_id)))?;

    if !job.status.can_transition_to(JobStatus::Generating) {
        warn!(%job_id, status = %job.status, "Generate requested for job that is not detected");
        return Err(AppError::InvalidInput(format!(
            "Job is {}, labels must be detected first",
            job.status
        )));
    }
    let labels = job
        .detected_labels
        .clone()
        .ok_or_else(|| AppError::InvalidInput("Job has no detected labels".to_string()))?;

    let requested = planned_sample_count(&labels);
    if requested > pipeline.max_samples {
        return Err(AppError::InvalidInput(format!(
            "Job asks for {} samples, at most {} are allowed per job",
            requested, pipeline.max_samples
        )));
    }
    let plan = plan_samples(&labels);

    let mannequin_url = options
        .mannequin_reference_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string);
    let background_url = resolve_background(
        repo,
        pipeline.picker.as_ref(),
        user_id,
        options.background_image_url.as_deref(),
    )
    .await?;

    let claimed = repo
        .start_job_generation(
            job_id,
            mannequin_url.clone(),
            background_url.clone(),
            options.output_mode,
        )
        .await?;
    if !claimed {
        warn!(%job_id, "Job was claimed by another generate call");
        return Err(AppError::InvalidInput(
            "Job is already generating or finished".to_string(),
        ));
    }
    let status = JobStatus::Generating;

    info!(
        %job_id,
        samples = plan.len(),
        mode = options.output_mode.as_str(),
        background = background_url.is_some(),
        mannequin = mannequin_url.is_some(),
        "Starting multi-fabric generation"
    );

    let captions = generate_captions(
        pipeline.model.as_ref(),
        &pipeline.models.caption_model,
        &job.source_image_url,
        &labels.context_lines(),
    )
    .await;

    let mut references = vec![job.source_image_url.clone()];
    references.extend(mannequin_url.iter().cloned());
    references.extend(background_url.iter().cloned());

    let base = PromptContext {
        upload_kind: UploadKind::LabeledMultiFabric,
        has_human_model: false,
        has_bottom_fabric: labels.has_bottom,
        custom_prompt: None,
        background_provided: background_url.is_some(),
        mannequin_reference_provided: mannequin_url.is_some(),
        garment: GarmentSpec::SourcePhoto,
    };

    let tasks = match options.output_mode {
        OutputMode::Combined => vec![(
            NewResult {
                job_id,
                user_id,
                label: COMBINED_LABEL.to_string(),
                color_variant: (!labels.color_variants.is_empty())
                    .then(|| labels.color_variants.join(", ")),
            },
            GarmentSpec::Combined {
                mannequin_count: plan.len(),
                variant_descriptions: plan.iter().map(|s| s.description.clone()).collect(),
            },
        )],
        OutputMode::Separate => plan
            .iter()
            .map(|sample| {
                (
                    NewResult {
                        job_id,
                        user_id,
                        label: sample.label.clone(),
                        color_variant: sample.color_variant.clone(),
                    },
                    GarmentSpec::Sample {
                        description: sample.description.clone(),
                        sibling_count: plan.len(),
                    },
                )
            })
            .collect(),
    };

    // Create every row before any generation starts
    let mut rows = Vec::with_capacity(tasks.len());
    for (new, garment) in tasks {
        match repo.insert_result(&new).await {
            Ok(row) => rows.push((row, garment)),
            Err(e) => {
                error!(%job_id, error = %e, "Failed to create result row");
                for (row, _) in &rows {
                    let update = ResultUpdate::Failure {
                        error: "Job aborted before generation started".to_string(),
                    };
                    finalize_result(repo, row.id, &update).await;
                }
                fail_job(repo, job_id, status, &e.to_string()).await;
                return Err(e);
            }
        }
    }

    let settled = join_all(rows.iter().map(|(row, garment)| {
        let ctx = PromptContext {
            garment: garment.clone(),
            ..base.clone()
        };
        generate_one(pipeline, &job, row, ctx, &references, &captions)
    }))
    .await;

    let failed = settled.iter().filter(|ok| !**ok).count();
    advance_job(repo, job_id, status, JobStatus::Completed, None).await?;

    info!(
        %job_id,
        total = settled.len(),
        failed,
        "Multi-fabric generation completed"
    );

    repo.list_results(job_id).await
}

/// Generate, upload and finalize one result row. Never propagates errors;
/// returns whether the row ended `completed`.
async fn generate_one(
    pipeline: &Pipeline,
    job: &MultiFabricJob,
    row: &GenerationResult,
    ctx: PromptContext,
    references: &[String],
    captions: &Captions,
) -> bool {
    let prompt = build_image_prompt(&ctx);

    let update = match produce_image_url(pipeline, job, row, &prompt, references).await {
        Ok(image_url) => ResultUpdate::Success {
            image_url,
            captions: captions.clone(),
        },
        Err(error) => {
            warn!(job_id = %job.id, result_id = %row.id, label = %row.label, %error, "Sample failed");
            ResultUpdate::Failure { error }
        }
    };

    let succeeded = matches!(update, ResultUpdate::Success { .. });
    let written = finalize_result(pipeline.repo.as_ref(), row.id, &update).await;
    succeeded && written
}

async fn produce_image_url(
    pipeline: &Pipeline,
    job: &MultiFabricJob,
    row: &GenerationResult,
    prompt: &str,
    references: &[String],
) -> Result<String, String> {
    let image = generate_image(
        pipeline.model.as_ref(),
        &pipeline.models.image_model,
        prompt,
        references,
    )
    .await
    .map_err(|e| e.to_string())?
    .ok_or_else(|| "Image generation failed after retry".to_string())?;

    let suffix = row.color_variant.as_deref().unwrap_or(&row.label);
    let key = generated_image_key(
        job.user_id,
        suffix,
        extension_for_content_type(&image.mime_type),
    );

    pipeline
        .objects
        .put_public(&key, image.bytes, &image.mime_type)
        .await
        .map_err(|e| e.to_string())
}
