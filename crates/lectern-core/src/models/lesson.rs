use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::video::VideoMetadata;

/// A video URL attached to a lesson by the content-update flow.
///
/// The URL has already been validated by the router/authorization layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonVideoUpdate {
    pub lesson_id: Uuid,
    pub video_url: String,
    pub content_type: Option<String>,
}

impl LessonVideoUpdate {
    pub fn new(lesson_id: Uuid, video_url: impl Into<String>) -> Self {
        Self {
            lesson_id,
            video_url: video_url.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Metadata persisted against a lesson record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonVideoMetadata {
    pub lesson_id: Uuid,
    pub video_url: String,
    pub metadata: VideoMetadata,
    pub extracted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_video_update_builder() {
        let lesson_id = Uuid::new_v4();
        let update = LessonVideoUpdate::new(lesson_id, "https://cdn.example.com/intro.mp4")
            .with_content_type("video/mp4");

        assert_eq!(update.lesson_id, lesson_id);
        assert_eq!(update.video_url, "https://cdn.example.com/intro.mp4");
        assert_eq!(update.content_type.as_deref(), Some("video/mp4"));
    }

    #[test]
    fn test_lesson_video_metadata_serialization() {
        let record = LessonVideoMetadata {
            lesson_id: Uuid::new_v4(),
            video_url: "https://cdn.example.com/intro.mp4".to_string(),
            metadata: VideoMetadata::default(),
            extracted_at: Utc::now(),
        };

        let json = serde_json::to_string(&record).unwrap();
        let deserialized: LessonVideoMetadata = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.lesson_id, record.lesson_id);
        assert_eq!(deserialized.metadata, record.metadata);
        assert_eq!(deserialized.extracted_at, record.extracted_at);
    }
}
