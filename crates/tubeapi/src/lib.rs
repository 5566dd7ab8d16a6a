//! tubeapi - HTTP service for tubeinfo
//!
//! Thin axum layer over [`tubecore`]: request validation, error-to-status
//! mapping, health and metrics endpoints, CLI and logging setup.

pub mod cli;
pub mod error;
pub mod logging;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::{router, serve};
pub use state::AppState;
