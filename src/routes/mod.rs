//! HTTP routes

pub mod health;
pub mod site;

pub use site::{build_app, create_router};
