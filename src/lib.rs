//! Fabric Studio server library.
//!
//! Turns fabric photographs into on-model catalog images, bilingual captions
//! and reel audio. The binary wires these modules into an actix-web server.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;

#[cfg(test)]
pub mod testing;
