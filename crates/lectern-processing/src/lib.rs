//! Lectern Video Metadata Pipeline
//!
//! Derives technical metadata (duration, resolution, codec, frame rate,
//! aspect ratio, size) for a lesson video given only its URL. Stages run from
//! most to least precise and the pipeline never fails outright.

pub mod error;
pub mod fetch;
pub mod metadata;
pub mod video;

// Re-export commonly used types
pub use error::{ExtractionError, ExtractionResult};
pub use fetch::{BoundedFetcher, FetchedBytes, RemoteObjectInfo, StagedFile};
pub use metadata::PartialMetadata;
pub use video::{
    ExternalProbeAdapter, ExtractionOrchestrator, GenericMetadataExtractor, HeuristicEstimator,
    LessonVideoService, MetadataStrategy, Mp4BoxMetadata,
};
