use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use uuid::Uuid;

use lectern_cli::render_table;
use lectern_core::{LessonVideoMetadata, VideoMetadataConfig};
use lectern_infra::{init_telemetry, shutdown_telemetry, LogFormat};
use lectern_processing::ExtractionOrchestrator;

#[derive(Parser, Debug)]
#[command(name = "video_metadata")]
#[command(about = "Extract technical metadata for a lesson video URL")]
struct Args {
    /// Absolute URL of the video object
    url: String,

    /// Declared content type (e.g. video/mp4)
    #[arg(long)]
    content_type: Option<String>,

    /// Lesson the video belongs to; prints the record that would be stored
    #[arg(long, value_name = "UUID")]
    lesson_id: Option<Uuid>,

    /// Skip the external probe even if it is installed
    #[arg(long)]
    no_probe: bool,

    /// Output format: json or table (default: table)
    #[arg(long, default_value = "table")]
    format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_telemetry(
        Some("video_metadata=info,lectern_processing=info"),
        LogFormat::from_env(),
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    let mut config = VideoMetadataConfig::from_env().context("Invalid video metadata configuration")?;
    if args.no_probe {
        config.probe_enabled = false;
    }

    let orchestrator =
        ExtractionOrchestrator::from_config(&config).context("Failed to build extraction pipeline")?;
    let metadata = orchestrator
        .extract(&args.url, args.content_type.as_deref())
        .await;

    match (args.format.as_str(), args.lesson_id) {
        ("json", Some(lesson_id)) => {
            let record = LessonVideoMetadata {
                lesson_id,
                video_url: args.url.clone(),
                metadata,
                extracted_at: Utc::now(),
            };
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        ("json", None) => {
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        (_, lesson_id) => {
            if let Some(lesson_id) = lesson_id {
                println!("Lesson ID: {}", lesson_id);
            }
            print!("{}", render_table(&args.url, &metadata));
        }
    }

    shutdown_telemetry().await;
    Ok(())
}
