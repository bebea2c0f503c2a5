//! Lesson content-update hook: extract metadata for a newly attached video and
//! persist it against the lesson.

use anyhow::{anyhow, Result};
use chrono::Utc;
use lectern_core::{LessonMetadataStore, LessonVideoMetadata, LessonVideoUpdate};
use std::sync::Arc;

use super::orchestration::ExtractionOrchestrator;

pub struct LessonVideoService {
    orchestrator: Arc<ExtractionOrchestrator>,
    store: Arc<dyn LessonMetadataStore>,
}

impl LessonVideoService {
    pub fn new(orchestrator: Arc<ExtractionOrchestrator>, store: Arc<dyn LessonMetadataStore>) -> Self {
        Self {
            orchestrator,
            store,
        }
    }

    /// Called once per video attachment. Extraction always yields a record;
    /// only a persistence failure is returned as an error.
    #[tracing::instrument(skip(self, update), fields(lesson_id = %update.lesson_id))]
    pub async fn on_video_attached(&self, update: &LessonVideoUpdate) -> Result<LessonVideoMetadata> {
        let metadata = self
            .orchestrator
            .extract(&update.video_url, update.content_type.as_deref())
            .await;

        let record = LessonVideoMetadata {
            lesson_id: update.lesson_id,
            video_url: update.video_url.clone(),
            metadata,
            extracted_at: Utc::now(),
        };

        self.store
            .save_video_metadata(&record)
            .await
            .map_err(|e| anyhow!("Failed to save video metadata for lesson {}: {}", update.lesson_id, e))?;

        tracing::info!(
            duration = ?record.metadata.duration_seconds,
            resolution = %record.metadata.resolution_bucket,
            "Lesson video metadata saved"
        );
        Ok(record)
    }
}
