//! Sitegate Library
//!
//! This module exposes the core components of the Sitegate site front door
//! for use in tests and other contexts.

pub mod components;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

pub use config::{AppConfig, AppState, Environment};
pub use error::{AppError, AppResult};
pub use models::*;
