//! Multi-fabric job domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::labels::DetectedLabels;

/// Job status enum.
///
/// Progression is strictly forward; `completed` and `failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job row created, nothing started yet.
    Pending,
    /// Label detection in progress.
    Analyzing,
    /// Labels stored, waiting for a generate call.
    Detected,
    /// Fan-out in progress.
    Generating,
    /// Orchestration finished (individual results may have failed).
    Completed,
    /// Job failed.
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Analyzing => "analyzing",
            Self::Detected => "detected",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "analyzing" => Some(Self::Analyzing),
            "detected" => Some(Self::Detected),
            "generating" => Some(Self::Generating),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `self -> next` is in the transition table.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (self, next) {
            (Pending, Analyzing)
            | (Analyzing, Detected)
            | (Detected, Generating)
            | (Generating, Completed) => true,
            (current, Failed) => !current.is_terminal(),
            _ => false,
        }
    }

    /// Validate a transition, returning the new status.
    pub fn transition(self, next: JobStatus) -> Result<JobStatus, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition { from: self, to: next })
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejected job status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid job transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// How color variants of a multi-fabric job are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// One image per sample/variant.
    #[default]
    Separate,
    /// One image with every mannequin side by side.
    Combined,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Separate => "separate",
            Self::Combined => "combined",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "separate" => Some(Self::Separate),
            "combined" => Some(Self::Combined),
            _ => None,
        }
    }
}

/// Multi-fabric generation job.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MultiFabricJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub source_image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mannequin_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image_url: Option<String>,
    pub output_mode: OutputMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_labels: Option<DetectedLabels>,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Analyzing));
        assert!(JobStatus::Analyzing.can_transition_to(JobStatus::Detected));
        assert!(JobStatus::Detected.can_transition_to(JobStatus::Generating));
        assert!(JobStatus::Generating.can_transition_to(JobStatus::Completed));
    }

    #[test]
    fn test_any_live_state_can_fail() {
        for status in [
            JobStatus::Pending,
            JobStatus::Analyzing,
            JobStatus::Detected,
            JobStatus::Generating,
        ] {
            assert_eq!(status.transition(JobStatus::Failed), Ok(JobStatus::Failed));
        }
    }

    #[test]
    fn test_terminal_and_skipping_transitions_rejected() {
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Generating));
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Generating));
        assert!(!JobStatus::Detected.can_transition_to(JobStatus::Analyzing));

        let err = JobStatus::Pending
            .transition(JobStatus::Completed)
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid job transition pending -> completed");
    }

    #[test]
    fn test_status_round_trips_through_column_text() {
        for status in [
            JobStatus::Pending,
            JobStatus::Analyzing,
            JobStatus::Detected,
            JobStatus::Generating,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("complete"), None);
    }
}
