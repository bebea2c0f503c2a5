//! Hooks for the lesson persistence layer
//!
//! The metadata pipeline does not own any storage. The content-management
//! layer implements [`LessonMetadataStore`] to persist extracted metadata
//! against its lesson records.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::LessonVideoMetadata;

/// Persistence for extracted lesson video metadata.
#[async_trait]
pub trait LessonMetadataStore: Send + Sync {
    /// Store (or replace) the metadata record for a lesson.
    async fn save_video_metadata(&self, record: &LessonVideoMetadata) -> Result<(), String>;

    /// Fetch the last stored record for a lesson.
    async fn get_video_metadata(
        &self,
        lesson_id: Uuid,
    ) -> Result<Option<LessonVideoMetadata>, String>;
}

/// No-op implementation for callers that persist the record themselves
pub struct NoOpLessonMetadataStore;

#[async_trait]
impl LessonMetadataStore for NoOpLessonMetadataStore {
    async fn save_video_metadata(&self, _record: &LessonVideoMetadata) -> Result<(), String> {
        Ok(())
    }

    async fn get_video_metadata(
        &self,
        _lesson_id: Uuid,
    ) -> Result<Option<LessonVideoMetadata>, String> {
        Ok(None)
    }
}
