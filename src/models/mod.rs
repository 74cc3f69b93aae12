//! Data models

mod types;

pub use types::*;
