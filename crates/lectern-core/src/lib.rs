//! Lectern Core Library
//!
//! This crate provides the domain models, configuration and error metadata
//! shared by the Lectern course platform components.

pub mod config;
pub mod error;
pub mod hooks;
pub mod models;

// Re-export commonly used types
pub use config::VideoMetadataConfig;
pub use error::{ErrorMetadata, LogLevel};
pub use hooks::{LessonMetadataStore, NoOpLessonMetadataStore};
pub use models::{
    AspectRatio, LessonVideoMetadata, LessonVideoUpdate, ResolutionBucket, VideoMetadata,
};
