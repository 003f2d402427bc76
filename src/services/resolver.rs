//! Background selection.

use tracing::debug;
use uuid::Uuid;

use crate::db::ContentRepository;
use crate::error::AppResult;

/// Chooses one candidate. Injected so tests can be deterministic.
pub trait BackgroundPicker: Send + Sync {
    fn pick_random(&self, candidates: &[String]) -> Option<String>;
}

/// Uniform random pick.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPicker;

impl BackgroundPicker for RandomPicker {
    fn pick_random(&self, candidates: &[String]) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }
        let index = (rand::random::<u64>() % candidates.len() as u64) as usize;
        candidates.get(index).cloned()
    }
}

/// Background URL for a generation.
///
/// A non-blank explicit URL is used verbatim. Otherwise one of the user's
/// uploaded backgrounds is picked; `None` when there are none.
pub async fn resolve_background(
    repo: &dyn ContentRepository,
    picker: &dyn BackgroundPicker,
    user_id: Uuid,
    explicit: Option<&str>,
) -> AppResult<Option<String>> {
    if let Some(url) = explicit.map(str::trim).filter(|u| !u.is_empty()) {
        return Ok(Some(url.to_string()));
    }

    let candidates = repo.list_background_urls(user_id).await?;
    let picked = picker.pick_random(&candidates);
    debug!(
        %user_id,
        candidates = candidates.len(),
        picked = picked.is_some(),
        "Resolved background"
    );
    Ok(picked)
}
