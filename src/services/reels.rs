//! Reel Studio: Hindi voiceover and background music for a generated content
//! row.

use tracing::{error, info};
use uuid::Uuid;

use super::pipeline::Pipeline;
use super::storage::reel_asset_key;
use crate::error::{AppError, AppResult};
use crate::models::{GeneratedContent, Reel, ReelRequest, ReelResponse, ReelStatus, ReelWrite};

/// Spoken when the content has no caption at all.
pub const FALLBACK_VOICEOVER: &str = "यह एक सुंदर कुर्ती है।";

/// Requested music length.
pub const MUSIC_DURATION_SECS: u32 = 20;

const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Text to speak: Hindi caption, then English, then a fixed line.
pub fn voiceover_text(content: &GeneratedContent) -> &str {
    [&content.caption_hindi, &content.caption_english]
        .into_iter()
        .filter_map(|c| c.as_deref().map(str::trim))
        .find(|c| !c.is_empty())
        .unwrap_or(FALLBACK_VOICEOVER)
}

/// Music prompt themed on the English caption.
pub fn music_prompt(english_caption: &str) -> String {
    let theme = match english_caption.trim() {
        "" => "Indian ethnic fashion",
        caption => caption,
    };
    format!(
        "Elegant, upbeat Indian fashion background music. Theme: {}. Style: modern \
         Bollywood-inspired, trendy, suitable for Instagram reels. Duration: 15-20 seconds. \
         Instrumental only, no vocals.",
        theme
    )
}

/// Produced assets; whatever exists when a step fails is kept on the row.
#[derive(Debug, Default)]
struct ReelAssets {
    voiceover_url: Option<String>,
    music_url: Option<String>,
}

/// Create or refresh the reel for a content row.
pub async fn create_reel(
    pipeline: &Pipeline,
    user_id: Uuid,
    request: ReelRequest,
) -> AppResult<ReelResponse> {
    let content_id = request
        .content_id
        .ok_or_else(|| AppError::InvalidInput("contentId is required".to_string()))?;

    let repo = pipeline.repo.as_ref();
    let content = repo
        .find_generated_content(user_id, content_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Content {}", content_id)))?;

    let pending = ReelWrite {
        voiceover_url: None,
        music_url: None,
        caption_english: content.caption_english.clone(),
        caption_hindi: content.caption_hindi.clone(),
        status: ReelStatus::GeneratingAudio,
        error_message: None,
    };
    let reel = match repo.find_reel(user_id, content_id).await? {
        Some(existing) => {
            repo.update_reel(existing.id, &pending).await?;
            existing
        }
        None => repo.insert_reel(user_id, content_id, &pending).await?,
    };

    info!(reel_id = %reel.id, %content_id, "Generating reel audio");

    let mut assets = ReelAssets::default();
    let outcome = produce_audio(pipeline, &reel, &content, &mut assets).await;

    let write = ReelWrite {
        voiceover_url: assets.voiceover_url.clone(),
        music_url: assets.music_url.clone(),
        status: if outcome.is_ok() {
            ReelStatus::Ready
        } else {
            ReelStatus::Failed
        },
        error_message: outcome.as_ref().err().map(|e| e.to_string()),
        ..pending
    };
    let recorded = repo.update_reel(reel.id, &write).await;
    if let Err(e) = &recorded {
        error!(reel_id = %reel.id, error = %e, "Failed to record reel outcome");
    }
    outcome?;
    recorded?;

    let (Some(voiceover_url), Some(music_url)) = (assets.voiceover_url, assets.music_url) else {
        return Err(AppError::Upstream("reel audio incomplete".to_string()));
    };

    info!(reel_id = %reel.id, "Reel ready");

    Ok(ReelResponse {
        success: true,
        reel_id: reel.id,
        voiceover_url,
        music_url,
        caption_primary: content.caption_english.unwrap_or_default(),
        caption_secondary: content.caption_hindi.unwrap_or_default(),
        image_url: content.model_image_url,
    })
}

async fn produce_audio(
    pipeline: &Pipeline,
    reel: &Reel,
    content: &GeneratedContent,
    assets: &mut ReelAssets,
) -> AppResult<()> {
    let voiceover = pipeline
        .audio
        .text_to_speech(voiceover_text(content))
        .await
        .inspect_err(|e| error!(reel_id = %reel.id, error = %e, "Voiceover generation failed"))?;
    let key = reel_asset_key(reel.user_id, reel.id, "voiceover");
    assets.voiceover_url = Some(
        pipeline
            .objects
            .put_public(&key, voiceover, AUDIO_CONTENT_TYPE)
            .await?,
    );

    let prompt = music_prompt(content.caption_english.as_deref().unwrap_or_default());
    let music = pipeline
        .audio
        .compose_music(&prompt, MUSIC_DURATION_SECS)
        .await
        .inspect_err(|e| error!(reel_id = %reel.id, error = %e, "Music generation failed"))?;
    let key = reel_asset_key(reel.user_id, reel.id, "music");
    assets.music_url = Some(
        pipeline
            .objects
            .put_public(&key, music, AUDIO_CONTENT_TYPE)
            .await?,
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadKind;
    use crate::services::ai_gateway::GatewayError;
    use crate::testing::{FakeAudio, MemoryStore, ScriptedModel, pipeline_with};

    fn content(hindi: Option<&str>, english: Option<&str>) -> GeneratedContent {
        GeneratedContent {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            fabric_id: Uuid::new_v4(),
            model_image_url: None,
            background_image_url: None,
            caption_english: english.map(str::to_string),
            caption_hindi: hindi.map(str::to_string),
            status: crate::models::ApprovalStatus::Pending,
            generation_status: crate::models::ResultStatus::Completed,
            error_message: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_voiceover_text_prefers_hindi() {
        assert_eq!(voiceover_text(&content(Some("नमस्ते"), Some("Hello"))), "नमस्ते");
        assert_eq!(voiceover_text(&content(Some(" "), Some("Hello"))), "Hello");
        assert_eq!(voiceover_text(&content(None, None)), FALLBACK_VOICEOVER);
    }

    #[test]
    fn test_music_prompt_uses_caption_theme() {
        assert!(music_prompt("Navy silk saree").contains("Theme: Navy silk saree."));
        assert!(music_prompt("").contains("Theme: Indian ethnic fashion."));
    }

    #[tokio::test]
    async fn test_reel_ready_with_both_assets() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let fabric = store.add_fabric(user, UploadKind::Fabric);
        let content_id = store.add_approved_content(user, fabric);
        let audio = FakeAudio::new();
        let pipeline = pipeline_with(store.clone(), ScriptedModel::new()).with_audio(audio.clone());

        let response = create_reel(
            &pipeline,
            user,
            ReelRequest {
                content_id: Some(content_id),
            },
        )
        .await
        .unwrap();

        assert!(response.voiceover_url.ends_with("-voiceover.mp3"));
        assert!(response.music_url.ends_with("-music.mp3"));
        assert_eq!(audio.spoken(), vec!["सुंदर साड़ी".to_string()]);

        let reel = store.only_reel();
        assert_eq!(reel.status, ReelStatus::Ready);
        assert!(reel.error_message.is_none());
    }

    #[tokio::test]
    async fn test_music_failure_keeps_voiceover() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let fabric = store.add_fabric(user, UploadKind::Fabric);
        let content_id = store.add_approved_content(user, fabric);
        let audio = FakeAudio::new().failing_music(GatewayError::QuotaExhausted);
        let pipeline = pipeline_with(store.clone(), ScriptedModel::new()).with_audio(audio);

        let err = create_reel(
            &pipeline,
            user,
            ReelRequest {
                content_id: Some(content_id),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::QuotaExhausted));
        let reel = store.only_reel();
        assert_eq!(reel.status, ReelStatus::Failed);
        assert!(reel.voiceover_url.is_some());
        assert!(reel.music_url.is_none());
        assert!(reel.error_message.is_some());
    }

    #[tokio::test]
    async fn test_second_request_reuses_reel_row() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let fabric = store.add_fabric(user, UploadKind::Fabric);
        let content_id = store.add_approved_content(user, fabric);
        let pipeline = pipeline_with(store.clone(), ScriptedModel::new());
        let request = ReelRequest {
            content_id: Some(content_id),
        };

        let first = create_reel(&pipeline, user, request.clone()).await.unwrap();
        let second = create_reel(&pipeline, user, request).await.unwrap();
        assert_eq!(first.reel_id, second.reel_id);
    }

    #[tokio::test]
    async fn test_unknown_content_is_not_found() {
        let pipeline = pipeline_with(MemoryStore::new(), ScriptedModel::new());
        let err = create_reel(
            &pipeline,
            Uuid::new_v4(),
            ReelRequest {
                content_id: Some(Uuid::new_v4()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = create_reel(&pipeline, Uuid::new_v4(), ReelRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
