//! API endpoint modules.

pub mod content;
pub mod health;
pub mod multi_fabric;
pub mod openapi;
pub mod reels;

pub use content::configure_routes as configure_content_routes;
pub use health::configure_health_routes;
pub use multi_fabric::configure_routes as configure_multi_fabric_routes;
pub use openapi::ApiDoc;
pub use reels::configure_routes as configure_reel_routes;
