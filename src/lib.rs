//! Core library for music-timestamp-tools
pub mod config;
pub mod genericize;
pub mod logging;
pub mod models;
pub mod sidecar;
pub mod timestamps;
