//! Domain models for Fabric Studio.

pub mod content;
pub mod generation;
pub mod job;
pub mod labels;
pub mod reel;
pub mod user;

// Re-export commonly used types
pub use content::{
    ApprovalStatus, Captions, ContentWrite, FabricImage, GeneratedContent, GenerationResult,
    NewResult, ResultStatus, ResultUpdate, UploadKind,
};
pub use generation::{
    DetectResponse, GenerateContentRequest, GenerateContentResponse, JobDetailResponse,
    MultiFabricGenerateResponse, MultiFabricRequest, ReelRequest, ReelResponse,
};
pub use job::{InvalidTransition, JobStatus, MultiFabricJob, OutputMode};
pub use labels::{DetectedLabels, FabricPiece, PieceKind};
pub use reel::{Reel, ReelStatus, ReelWrite};
pub use user::{AccessClaims, AuthenticatedUser};
