mod helpers;

use helpers::fixtures::{faststart_movie, moov_at_end_prefix};
use helpers::test_config;
use lectern_core::models::{AspectRatio, ResolutionBucket};
use lectern_core::{LessonVideoUpdate, NoOpLessonMetadataStore};
use lectern_processing::{ExtractionOrchestrator, LessonVideoService};
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn test_faststart_movie_read_from_container() {
    let movie = faststart_movie(90_000, 90_000 * 125, 1280, 720);
    let mut server = mockito::Server::new_async().await;
    server
        .mock("HEAD", "/courses/rust/lesson-3.mp4")
        .with_status(200)
        .with_header("content-length", &movie.len().to_string())
        .with_header("content-type", "video/mp4")
        .create_async()
        .await;
    server
        .mock("GET", "/courses/rust/lesson-3.mp4")
        .with_status(200)
        .with_body(&movie)
        .create_async()
        .await;

    let orchestrator = Arc::new(ExtractionOrchestrator::from_config(&test_config(64 * 1024)).unwrap());
    let service = LessonVideoService::new(orchestrator, Arc::new(NoOpLessonMetadataStore));
    let lesson_id = Uuid::new_v4();
    let update = LessonVideoUpdate::new(lesson_id, format!("{}/courses/rust/lesson-3.mp4", server.url()));

    let record = service.on_video_attached(&update).await.unwrap();

    assert_eq!(record.lesson_id, lesson_id);
    assert_eq!(record.metadata.duration_seconds, Some(125));
    assert_eq!(record.metadata.resolution_bucket, ResolutionBucket::P720);
    assert_eq!(record.metadata.aspect_ratio, AspectRatio::Widescreen);
    assert_eq!(record.metadata.size_bytes, movie.len() as u64);
    assert_eq!(record.metadata.fps, 30);
}

#[tokio::test]
async fn test_moov_at_end_falls_back_to_estimate() {
    let cap = 64 * 1024;
    let mut server = mockito::Server::new_async().await;
    server
        .mock("HEAD", "/uploads/intro_720p.mp4")
        .with_status(200)
        .with_header("content-length", "112500000")
        .create_async()
        .await;
    let ranged = server
        .mock("GET", "/uploads/intro_720p.mp4")
        .match_header("range", "bytes=0-65535")
        .with_status(206)
        .with_header("content-range", "bytes 0-65535/112500000")
        .with_body(moov_at_end_prefix(cap))
        .expect(1)
        .create_async()
        .await;

    let orchestrator = ExtractionOrchestrator::from_config(&test_config(cap as u64)).unwrap();
    let url = format!("{}/uploads/intro_720p.mp4", server.url());
    let metadata = orchestrator.extract(&url, None).await;

    assert_eq!(metadata.duration_seconds, Some(300));
    assert_eq!(metadata.resolution_bucket, ResolutionBucket::P720);
    assert_eq!(metadata.codec, "H.264");
    assert_eq!(metadata.size_bytes, 112_500_000);
    ranged.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_extractions_are_independent() {
    let short = faststart_movie(1000, 65_000, 1920, 1080);
    let long = faststart_movie(1000, 1_800_000, 640, 480);
    let mut server = mockito::Server::new_async().await;
    for (path, body) in [("/a.mp4", &short), ("/b.mp4", &long)] {
        server
            .mock("HEAD", path)
            .with_status(200)
            .with_header("content-length", &body.len().to_string())
            .create_async()
            .await;
        server
            .mock("GET", path)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;
    }

    let orchestrator = ExtractionOrchestrator::from_config(&test_config(64 * 1024)).unwrap();
    let url_a = format!("{}/a.mp4", server.url());
    let url_b = format!("{}/b.mp4", server.url());
    let (a, b) = tokio::join!(
        orchestrator.extract(&url_a, None),
        orchestrator.extract(&url_b, None)
    );

    assert_eq!(a.duration_seconds, Some(65));
    assert_eq!(a.resolution_bucket, ResolutionBucket::P1080);
    assert_eq!(b.duration_seconds, Some(1800));
    assert_eq!(b.resolution_bucket, ResolutionBucket::P480);
    assert_eq!(b.aspect_ratio, AspectRatio::Standard);
}
