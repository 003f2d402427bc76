//! SeaORM entity definitions for PostgreSQL database.

pub mod background_image;
pub mod fabric_image;
pub mod generated_content;
pub mod multi_fabric_job;
pub mod multi_fabric_result;
pub mod reel;
