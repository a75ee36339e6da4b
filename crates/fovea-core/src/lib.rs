//! # fovea-core
//!
//! Core types, traits, and abstractions for the fovea capture pipeline.
//!
//! This crate provides the foundational data structures, the error taxonomy,
//! configuration, and the collaborator trait definitions that the other fovea
//! crates depend on.

pub mod config;
pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::{ApiConfig, CaptureConfig, ConfigError};
pub use error::{Error, Result};
pub use events::{EventBus, ScanEvent};
pub use models::*;
pub use traits::*;
