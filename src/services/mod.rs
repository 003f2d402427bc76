//! Generation pipeline services.

pub mod ai_gateway;
pub mod audio;
pub mod classifier;
pub mod content;
pub mod detector;
pub mod invoker;
pub mod json_text;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod reconciler;
pub mod reels;
pub mod resolver;
pub mod retry;
pub mod storage;

pub use ai_gateway::{AiGateway, GenerativeModel};
pub use audio::{AudioSynthesizer, SpeechStudio};
pub use pipeline::{ModelSettings, Pipeline};
pub use resolver::RandomPicker;
pub use storage::{ObjectStore, Storage};
