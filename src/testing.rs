//! In-memory doubles for service tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::db::ContentRepository;
use crate::error::{AppError, AppResult};
use crate::models::{
    ApprovalStatus, ContentWrite, DetectedLabels, FabricImage, GeneratedContent,
    GenerationResult, JobStatus, MultiFabricJob, NewResult, OutputMode, Reel, ReelWrite,
    ResultStatus, ResultUpdate, UploadKind,
};
use crate::services::ai_gateway::{ChatReply, ChatRequest, GatewayError, GenerativeModel};
use crate::services::audio::AudioSynthesizer;
use crate::services::pipeline::{ModelSettings, Pipeline};
use crate::services::resolver::BackgroundPicker;
use crate::services::storage::ObjectStore;

/// A tiny valid inline PNG.
pub const PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgo=";

/// Gateway reply carrying one inline PNG.
pub fn image_reply() -> Result<ChatReply, GatewayError> {
    Ok(ChatReply {
        text: String::new(),
        images: vec![PNG_DATA_URL.to_string()],
    })
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreState {
    fabrics: Vec<FabricImage>,
    backgrounds: Vec<(Uuid, String)>,
    contents: Vec<GeneratedContent>,
    jobs: Vec<MultiFabricJob>,
    job_history: HashMap<Uuid, Vec<JobStatus>>,
    results: Vec<GenerationResult>,
    reels: Vec<Reel>,
    fk_violation_on_content_insert: bool,
    fail_next_success_write: bool,
}

impl StoreState {
    fn job_mut(&mut self, id: Uuid) -> AppResult<&mut MultiFabricJob> {
        self.jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Job {}", id)))
    }

    fn record_status(&mut self, id: Uuid, status: JobStatus) {
        self.job_history.entry(id).or_default().push(status);
    }
}

/// [`ContentRepository`] over plain vectors. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }

    pub fn add_background(&self, user_id: Uuid, url: &str) {
        self.lock().backgrounds.push((user_id, url.to_string()));
    }

    pub fn add_fabric(&self, user_id: Uuid, upload_type: UploadKind) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().fabrics.push(FabricImage {
            id,
            user_id,
            image_url: format!("https://cdn.example/fabric-images/{}.jpg", id),
            file_name: format!("{}.jpg", id),
            upload_type,
        });
        id
    }

    /// Delete a fabric row and cascade to its content, like the database does.
    pub fn remove_fabric(&self, id: Uuid) {
        let mut state = self.lock();
        state.fabrics.retain(|f| f.id != id);
        state.contents.retain(|c| c.fabric_id != id);
    }

    /// Completed, approved content with both captions.
    pub fn add_approved_content(&self, user_id: Uuid, fabric_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.lock().contents.push(GeneratedContent {
            id,
            user_id,
            fabric_id,
            model_image_url: Some(format!("https://cdn.example/generated-images/{}.png", id)),
            background_image_url: None,
            caption_english: Some("Navy silk saree".to_string()),
            caption_hindi: Some("सुंदर साड़ी".to_string()),
            status: ApprovalStatus::Approved,
            generation_status: ResultStatus::Completed,
            error_message: None,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn contents(&self) -> Vec<GeneratedContent> {
        self.lock().contents.clone()
    }

    /// Next content insert fails as if the fabric row vanished.
    pub fn fail_content_insert_with_fk_violation(&self) {
        self.lock().fk_violation_on_content_insert = true;
    }

    /// Job already through detection, ready for generate.
    pub fn seed_detected_job(&self, user_id: Uuid, labels: DetectedLabels) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.lock().jobs.push(MultiFabricJob {
            id,
            user_id,
            source_image_url: "https://cdn.example/multi/source.jpg".to_string(),
            mannequin_image_url: None,
            background_image_url: None,
            output_mode: OutputMode::default(),
            detected_labels: Some(labels),
            status: JobStatus::Detected,
            error_message: None,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn jobs(&self) -> Vec<MultiFabricJob> {
        self.lock().jobs.clone()
    }

    pub fn only_job(&self) -> MultiFabricJob {
        let jobs = self.jobs();
        assert_eq!(jobs.len(), 1, "expected exactly one job");
        jobs[0].clone()
    }

    pub fn job_status(&self, id: Uuid) -> Option<JobStatus> {
        self.lock().jobs.iter().find(|j| j.id == id).map(|j| j.status)
    }

    /// Statuses written after creation, in order.
    pub fn job_status_history(&self, id: Uuid) -> Vec<JobStatus> {
        self.lock().job_history.get(&id).cloned().unwrap_or_default()
    }

    pub fn add_generating_result(&self, job_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().results.push(GenerationResult {
            id,
            job_id,
            user_id: Uuid::new_v4(),
            label: "main".to_string(),
            color_variant: None,
            generated_image_url: None,
            caption_english: None,
            caption_hindi: None,
            status: ResultStatus::Generating,
            error_message: None,
            created_at: Utc::now(),
        });
        id
    }

    /// Next successful result write fails with a database error.
    pub fn fail_next_result_success_write(&self) {
        self.lock().fail_next_success_write = true;
    }

    pub fn result(&self, id: Uuid) -> Option<GenerationResult> {
        self.lock().results.iter().find(|r| r.id == id).cloned()
    }

    pub fn results(&self, job_id: Uuid) -> Vec<GenerationResult> {
        self.lock()
            .results
            .iter()
            .filter(|r| r.job_id == job_id)
            .cloned()
            .collect()
    }

    pub fn only_reel(&self) -> Reel {
        let state = self.lock();
        assert_eq!(state.reels.len(), 1, "expected exactly one reel");
        state.reels[0].clone()
    }
}

#[async_trait]
impl ContentRepository for MemoryStore {
    async fn find_fabric_image(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<FabricImage>> {
        Ok(self
            .lock()
            .fabrics
            .iter()
            .find(|f| f.id == id && f.user_id == user_id)
            .cloned())
    }

    async fn fabric_image_exists(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.lock().fabrics.iter().any(|f| f.id == id))
    }

    async fn list_background_urls(&self, user_id: Uuid) -> AppResult<Vec<String>> {
        // Stand-in for a database round trip, so concurrent callers interleave
        tokio::task::yield_now().await;
        Ok(self
            .lock()
            .backgrounds
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, url)| url.clone())
            .collect())
    }

    async fn find_generated_content(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<GeneratedContent>> {
        Ok(self
            .lock()
            .contents
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
            .cloned())
    }

    async fn insert_generated_content(
        &self,
        user_id: Uuid,
        write: &ContentWrite,
    ) -> AppResult<GeneratedContent> {
        let mut state = self.lock();
        let fabric_present = state.fabrics.iter().any(|f| f.id == write.fabric_id);
        if std::mem::take(&mut state.fk_violation_on_content_insert) || !fabric_present {
            return Err(AppError::ReferenceViolation(format!("fabric {}", write.fabric_id)));
        }

        let now = Utc::now();
        let content = GeneratedContent {
            id: Uuid::new_v4(),
            user_id,
            fabric_id: write.fabric_id,
            model_image_url: write.model_image_url.clone(),
            background_image_url: write.background_image_url.clone(),
            caption_english: Some(write.captions.primary.clone()),
            caption_hindi: Some(write.captions.secondary.clone()),
            status: ApprovalStatus::Pending,
            generation_status: write.generation_status,
            error_message: write.error_message.clone(),
            created_at: now,
            updated_at: now,
        };
        state.contents.push(content.clone());
        Ok(content)
    }

    async fn update_generated_content(
        &self,
        user_id: Uuid,
        id: Uuid,
        write: &ContentWrite,
    ) -> AppResult<Option<GeneratedContent>> {
        let mut state = self.lock();
        let Some(content) = state
            .contents
            .iter_mut()
            .find(|c| c.id == id && c.user_id == user_id)
        else {
            return Ok(None);
        };

        content.model_image_url = write.model_image_url.clone();
        content.background_image_url = write.background_image_url.clone();
        content.caption_english = Some(write.captions.primary.clone());
        content.caption_hindi = Some(write.captions.secondary.clone());
        content.status = ApprovalStatus::Pending;
        content.generation_status = write.generation_status;
        content.error_message = write.error_message.clone();
        content.updated_at = Utc::now();
        Ok(Some(content.clone()))
    }

    async fn insert_multi_fabric_job(
        &self,
        user_id: Uuid,
        source_image_url: &str,
    ) -> AppResult<MultiFabricJob> {
        let now = Utc::now();
        let job = MultiFabricJob {
            id: Uuid::new_v4(),
            user_id,
            source_image_url: source_image_url.to_string(),
            mannequin_image_url: None,
            background_image_url: None,
            output_mode: OutputMode::default(),
            detected_labels: None,
            status: JobStatus::Pending,
            error_message: None,
            created_at: now,
            updated_at: now,
        };
        self.lock().jobs.push(job.clone());
        Ok(job)
    }

    async fn find_multi_fabric_job(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<MultiFabricJob>> {
        Ok(self
            .lock()
            .jobs
            .iter()
            .find(|j| j.id == id && j.user_id == user_id)
            .cloned())
    }

    async fn set_job_status(
        &self,
        id: Uuid,
        status: JobStatus,
        error_message: Option<String>,
    ) -> AppResult<()> {
        let mut state = self.lock();
        let job = state.job_mut(id)?;
        job.status = status;
        job.error_message = error_message;
        state.record_status(id, status);
        Ok(())
    }

    async fn save_detected_labels(&self, id: Uuid, labels: &DetectedLabels) -> AppResult<()> {
        let mut state = self.lock();
        let job = state.job_mut(id)?;
        job.detected_labels = Some(labels.clone());
        job.status = JobStatus::Detected;
        job.error_message = None;
        state.record_status(id, JobStatus::Detected);
        Ok(())
    }

    async fn start_job_generation(
        &self,
        id: Uuid,
        mannequin_image_url: Option<String>,
        background_image_url: Option<String>,
        output_mode: OutputMode,
    ) -> AppResult<bool> {
        let mut state = self.lock();
        let job = state.job_mut(id)?;
        if job.status != JobStatus::Detected {
            return Ok(false);
        }
        job.mannequin_image_url = mannequin_image_url;
        job.background_image_url = background_image_url;
        job.output_mode = output_mode;
        job.status = JobStatus::Generating;
        state.record_status(id, JobStatus::Generating);
        Ok(true)
    }

    async fn insert_result(&self, new: &NewResult) -> AppResult<GenerationResult> {
        let row = GenerationResult {
            id: Uuid::new_v4(),
            job_id: new.job_id,
            user_id: new.user_id,
            label: new.label.clone(),
            color_variant: new.color_variant.clone(),
            generated_image_url: None,
            caption_english: None,
            caption_hindi: None,
            status: ResultStatus::Generating,
            error_message: None,
            created_at: Utc::now(),
        };
        self.lock().results.push(row.clone());
        Ok(row)
    }

    async fn finalize_result(&self, id: Uuid, update: &ResultUpdate) -> AppResult<()> {
        let mut state = self.lock();
        if matches!(update, ResultUpdate::Success { .. })
            && std::mem::take(&mut state.fail_next_success_write)
        {
            return Err(AppError::Database("connection reset".to_string()));
        }

        let row = state
            .results
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Result {}", id)))?;

        row.status = update.status();
        match update {
            ResultUpdate::Success {
                image_url,
                captions,
            } => {
                row.generated_image_url = Some(image_url.clone());
                row.caption_english = Some(captions.primary.clone());
                row.caption_hindi = Some(captions.secondary.clone());
                row.error_message = None;
            }
            ResultUpdate::Failure { error } => {
                row.generated_image_url = None;
                row.error_message = Some(error.clone());
            }
        }
        Ok(())
    }

    async fn list_results(&self, job_id: Uuid) -> AppResult<Vec<GenerationResult>> {
        Ok(self.results(job_id))
    }

    async fn find_reel(&self, user_id: Uuid, content_id: Uuid) -> AppResult<Option<Reel>> {
        Ok(self
            .lock()
            .reels
            .iter()
            .find(|r| r.content_id == content_id && r.user_id == user_id)
            .cloned())
    }

    async fn insert_reel(
        &self,
        user_id: Uuid,
        content_id: Uuid,
        write: &ReelWrite,
    ) -> AppResult<Reel> {
        let now = Utc::now();
        let reel = Reel {
            id: Uuid::new_v4(),
            user_id,
            content_id,
            voiceover_url: write.voiceover_url.clone(),
            music_url: write.music_url.clone(),
            caption_english: write.caption_english.clone(),
            caption_hindi: write.caption_hindi.clone(),
            status: write.status,
            error_message: write.error_message.clone(),
            created_at: now,
            updated_at: now,
        };
        self.lock().reels.push(reel.clone());
        Ok(reel)
    }

    async fn update_reel(&self, id: Uuid, write: &ReelWrite) -> AppResult<()> {
        let mut state = self.lock();
        let reel = state
            .reels
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Reel {}", id)))?;

        reel.voiceover_url = write.voiceover_url.clone();
        reel.music_url = write.music_url.clone();
        reel.caption_english = write.caption_english.clone();
        reel.caption_hindi = write.caption_hindi.clone();
        reel.status = write.status;
        reel.error_message = write.error_message.clone();
        reel.updated_at = Utc::now();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Generative model
// ---------------------------------------------------------------------------

type Reply = Result<ChatReply, GatewayError>;
type Hook = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Script {
    image: VecDeque<Reply>,
    caption: VecDeque<Reply>,
    vision: VecDeque<Reply>,
    image_default: Option<Reply>,
    failing_marker: Option<String>,
    on_image: Option<Hook>,
    image_prompts: Vec<String>,
}

/// [`GenerativeModel`] answering from per-task queues.
///
/// Image requests (`want_image`) read the image queue, requests for the
/// `vision` model read the vision queue, and everything else reads the
/// caption queue. Empty queues give: no image, a valid caption JSON, `{}`.
#[derive(Clone, Default)]
pub struct ScriptedModel {
    script: Arc<Mutex<Script>>,
    image_calls: Arc<AtomicUsize>,
    caption_calls: Arc<AtomicUsize>,
    vision_calls: Arc<AtomicUsize>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image_replies(self, replies: Vec<Reply>) -> Self {
        self.script.lock().unwrap().image.extend(replies);
        self
    }

    pub fn caption_replies(self, replies: Vec<Reply>) -> Self {
        self.script.lock().unwrap().caption.extend(replies);
        self
    }

    pub fn vision_replies(self, replies: Vec<Reply>) -> Self {
        self.script.lock().unwrap().vision.extend(replies);
        self
    }

    /// Answer every image request without a queued reply with an image.
    pub fn always_image(self) -> Self {
        self.script.lock().unwrap().image_default = Some(image_reply());
        self
    }

    /// Image requests whose prompt contains `marker` fail with a 500.
    pub fn failing_prompt(self, marker: &str) -> Self {
        self.script.lock().unwrap().failing_marker = Some(marker.to_string());
        self
    }

    /// Run `hook` after every image request.
    pub fn on_image(self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.script.lock().unwrap().on_image = Some(Arc::new(hook));
        self
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn caption_calls(&self) -> usize {
        self.caption_calls.load(Ordering::SeqCst)
    }

    pub fn vision_calls(&self) -> usize {
        self.vision_calls.load(Ordering::SeqCst)
    }

    pub fn image_prompts(&self) -> Vec<String> {
        self.script.lock().unwrap().image_prompts.clone()
    }

    fn image(&self, request: &ChatRequest) -> Reply {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        let (reply, hook) = {
            let mut script = self.script.lock().unwrap();
            script.image_prompts.push(request.prompt.clone());
            let failing = script
                .failing_marker
                .as_deref()
                .is_some_and(|marker| request.prompt.contains(marker));
            let reply = if failing {
                Err(GatewayError::Status(500))
            } else {
                script
                    .image
                    .pop_front()
                    .or_else(|| script.image_default.clone())
                    .unwrap_or_else(|| Ok(ChatReply::default()))
            };
            (reply, script.on_image.clone())
        };
        if let Some(hook) = hook {
            hook();
        }
        reply
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, GatewayError> {
        if request.want_image {
            return self.image(request);
        }

        let mut script = self.script.lock().unwrap();
        if request.model == "vision" {
            self.vision_calls.fetch_add(1, Ordering::SeqCst);
            return script.vision.pop_front().unwrap_or_else(|| {
                Ok(ChatReply {
                    text: "{}".to_string(),
                    images: vec![],
                })
            });
        }

        self.caption_calls.fetch_add(1, Ordering::SeqCst);
        script.caption.pop_front().unwrap_or_else(|| {
            Ok(ChatReply {
                text: "{\"english\": \"Festive outfit\", \"hindi\": \"त्योहारी पोशाक\"}"
                    .to_string(),
                images: vec![],
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Object store, audio, picker
// ---------------------------------------------------------------------------

/// [`ObjectStore`] that keeps uploaded keys.
#[derive(Clone, Default)]
pub struct MemoryObjects {
    keys: Arc<Mutex<Vec<String>>>,
    fail_uploads: bool,
}

impl MemoryObjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every upload fails with a storage error.
    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjects {
    async fn put_public(&self, key: &str, _data: Vec<u8>, _content_type: &str) -> AppResult<String> {
        if self.fail_uploads {
            return Err(AppError::Storage(format!("Failed to upload {}", key)));
        }
        self.keys.lock().unwrap().push(key.to_string());
        Ok(format!("https://objects.test/fabric-studio/{}", key))
    }
}

/// [`AudioSynthesizer`] returning fixed bytes.
#[derive(Clone, Default)]
pub struct FakeAudio {
    spoken: Arc<Mutex<Vec<String>>>,
    speech_error: Option<GatewayError>,
    music_error: Option<GatewayError>,
}

impl FakeAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_speech(mut self, err: GatewayError) -> Self {
        self.speech_error = Some(err);
        self
    }

    pub fn failing_music(mut self, err: GatewayError) -> Self {
        self.music_error = Some(err);
        self
    }

    /// Texts passed to text-to-speech.
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioSynthesizer for FakeAudio {
    async fn text_to_speech(&self, text: &str) -> Result<Vec<u8>, GatewayError> {
        self.spoken.lock().unwrap().push(text.to_string());
        match &self.speech_error {
            Some(err) => Err(err.clone()),
            None => Ok(b"ID3voice".to_vec()),
        }
    }

    async fn compose_music(
        &self,
        _prompt: &str,
        _duration_secs: u32,
    ) -> Result<Vec<u8>, GatewayError> {
        match &self.music_error {
            Some(err) => Err(err.clone()),
            None => Ok(b"ID3music".to_vec()),
        }
    }
}

/// Always picks the first candidate.
pub struct FirstPicker;

impl BackgroundPicker for FirstPicker {
    fn pick_random(&self, candidates: &[String]) -> Option<String> {
        candidates.first().cloned()
    }
}

/// Pipeline over in-memory doubles; model names are `img`, `cap` and
/// `vision`, at most 6 samples per job.
pub fn pipeline_with(store: MemoryStore, model: ScriptedModel) -> Pipeline {
    Pipeline {
        repo: Arc::new(store),
        model: Arc::new(model),
        audio: Arc::new(FakeAudio::new()),
        objects: Arc::new(MemoryObjects::new()),
        picker: Arc::new(FirstPicker),
        models: ModelSettings {
            image_model: "img".to_string(),
            caption_model: "cap".to_string(),
            vision_model: "vision".to_string(),
        },
        max_samples: 6,
    }
}

impl Pipeline {
    pub fn with_audio(mut self, audio: FakeAudio) -> Self {
        self.audio = Arc::new(audio);
        self
    }

    pub fn with_objects(mut self, objects: MemoryObjects) -> Self {
        self.objects = Arc::new(objects);
        self
    }
}
