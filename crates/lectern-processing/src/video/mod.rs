pub mod generic;
pub mod heuristics;
pub mod mp4_boxes;
pub mod orchestration;
pub mod probe;
pub mod service;

pub use generic::{GenericMetadataExtractor, MetadataSniffer, SniffHint, SniffedFields};
#[cfg(feature = "generic-sniffer")]
pub use generic::SymphoniaSniffer;
pub use heuristics::HeuristicEstimator;
pub use mp4_boxes::{parse_mp4_boxes, Mp4BoxMetadata};
pub use orchestration::{
    ContainerStrategy, ExtractionContext, ExtractionOrchestrator, GenericStrategy,
    HeuristicStrategy, MetadataStrategy, ProbeStrategy,
};
pub use probe::ExternalProbeAdapter;
pub use service::LessonVideoService;
