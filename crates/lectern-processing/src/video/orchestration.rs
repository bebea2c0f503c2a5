//! Metadata extraction orchestration: probe → container/generic → estimate.
//!
//! Stages run in order until one supplies a positive duration. Every stage
//! error is logged and treated as "contributed nothing", so [`extract`]
//! always returns a fully populated [`VideoMetadata`].
//!
//! [`extract`]: ExtractionOrchestrator::extract

use async_trait::async_trait;
use lectern_core::models::VideoMetadata;
use lectern_core::{ErrorMetadata, LogLevel, VideoMetadataConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::Instrument;

use crate::error::{ExtractionError, ExtractionResult};
use crate::fetch::{extension_from_url, BoundedFetcher, FetchedBytes, RemoteObjectInfo};
use crate::metadata::PartialMetadata;

use super::generic::{GenericMetadataExtractor, SniffHint};
use super::heuristics::HeuristicEstimator;
use super::mp4_boxes::{looks_like_iso_bmff, parse_mp4_boxes};
use super::probe::ExternalProbeAdapter;

/// State shared by the stages of one extraction call.
///
/// The HEAD result and the byte prefix are fetched at most once, so the
/// container and generic stages read the same bytes.
pub struct ExtractionContext<'a> {
    url: &'a str,
    declared_content_type: Option<&'a str>,
    fetcher: &'a BoundedFetcher,
    prefix_bytes: u64,
    info: OnceCell<Result<RemoteObjectInfo, Arc<ExtractionError>>>,
    prefix: OnceCell<Result<FetchedBytes, Arc<ExtractionError>>>,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(
        url: &'a str,
        declared_content_type: Option<&'a str>,
        fetcher: &'a BoundedFetcher,
        prefix_bytes: u64,
    ) -> Self {
        Self {
            url,
            declared_content_type,
            fetcher,
            prefix_bytes,
            info: OnceCell::new(),
            prefix: OnceCell::new(),
        }
    }

    pub fn url(&self) -> &str {
        self.url
    }

    pub fn fetcher(&self) -> &BoundedFetcher {
        self.fetcher
    }

    /// Size and content type from a metadata-only request.
    pub async fn remote_info(&self) -> ExtractionResult<&RemoteObjectInfo> {
        self.info
            .get_or_init(|| async { self.fetcher.head_or_unknown(self.url).await.map_err(Arc::new) })
            .await
            .as_ref()
            .map_err(|e| ExtractionError::Shared(Arc::clone(e)))
    }

    /// The first `prefix_bytes` of the object.
    pub async fn prefix(&self) -> ExtractionResult<&FetchedBytes> {
        self.prefix
            .get_or_init(|| async {
                let info = self.remote_info().await.map_err(Arc::new)?;
                self.fetcher
                    .fetch_prefix_with_info(self.url, self.prefix_bytes, info)
                    .await
                    .map_err(Arc::new)
            })
            .await
            .as_ref()
            .map_err(|e| ExtractionError::Shared(Arc::clone(e)))
    }

    /// Declared content type, else the one the server reported.
    pub fn content_type(&self) -> Option<&str> {
        self.declared_content_type.or_else(|| {
            self.fetched_info()
                .and_then(|info| info.content_type.as_deref())
                .or_else(|| self.fetched_prefix().and_then(|p| p.content_type.as_deref()))
        })
    }

    /// Object size, if any request made so far has reported it.
    pub fn known_size(&self) -> Option<u64> {
        self.fetched_info()
            .and_then(|info| info.content_length)
            .or_else(|| self.fetched_prefix().map(FetchedBytes::size_bytes))
    }

    fn fetched_info(&self) -> Option<&RemoteObjectInfo> {
        self.info.get().and_then(|r| r.as_ref().ok())
    }

    fn fetched_prefix(&self) -> Option<&FetchedBytes> {
        self.prefix.get().and_then(|r| r.as_ref().ok())
    }
}

/// One stage of the pipeline.
#[async_trait]
pub trait MetadataStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, ctx: &ExtractionContext<'_>) -> ExtractionResult<PartialMetadata>;
}

/// Stage a local copy and run the external probe against it.
pub struct ProbeStrategy {
    adapter: ExternalProbeAdapter,
    max_bytes: u64,
    temp_dir: Option<PathBuf>,
}

impl ProbeStrategy {
    pub fn new(adapter: ExternalProbeAdapter, max_bytes: u64, temp_dir: Option<PathBuf>) -> Self {
        Self {
            adapter,
            max_bytes,
            temp_dir,
        }
    }
}

#[async_trait]
impl MetadataStrategy for ProbeStrategy {
    fn name(&self) -> &'static str {
        "probe"
    }

    async fn extract(&self, ctx: &ExtractionContext<'_>) -> ExtractionResult<PartialMetadata> {
        // No download when the tool is missing.
        self.adapter.locate()?;

        let info = ctx.remote_info().await?;
        let staged = ctx
            .fetcher()
            .stage_to_file(ctx.url(), self.max_bytes, info, self.temp_dir.as_deref())
            .await?;

        let mut partial = self.adapter.probe_file(staged.path()).await?;
        // The probe only saw the staged copy.
        partial.size_bytes = Some(staged.size_bytes());
        Ok(partial)
    }
}

/// Walk the ISO-BMFF box tree of the byte prefix.
#[derive(Debug, Default)]
pub struct ContainerStrategy;

#[async_trait]
impl MetadataStrategy for ContainerStrategy {
    fn name(&self) -> &'static str {
        "container"
    }

    async fn extract(&self, ctx: &ExtractionContext<'_>) -> ExtractionResult<PartialMetadata> {
        let prefix = ctx.prefix().await?;
        if !looks_like_iso_bmff(&prefix.data) {
            return Err(ExtractionError::decode("prefix is not an ISO-BMFF container"));
        }

        let boxes = parse_mp4_boxes(&prefix.data);
        if boxes.is_empty() {
            return Err(ExtractionError::decode(format!(
                "no movie or track header in the first {} bytes",
                prefix.data.len()
            )));
        }

        let mut partial = boxes.into_partial();
        partial.size_bytes = Some(prefix.size_bytes());
        Ok(partial)
    }
}

/// Run the generic sniffer over the byte prefix.
pub struct GenericStrategy {
    extractor: Arc<GenericMetadataExtractor>,
}

impl GenericStrategy {
    pub fn new(extractor: Arc<GenericMetadataExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl MetadataStrategy for GenericStrategy {
    fn name(&self) -> &'static str {
        "generic"
    }

    async fn extract(&self, ctx: &ExtractionContext<'_>) -> ExtractionResult<PartialMetadata> {
        let prefix = ctx.prefix().await?;
        let data = prefix.data.clone();
        let size_bytes = prefix.size_bytes();
        let content_type = ctx.content_type().map(str::to_string);
        let extension = extension_from_url(ctx.url());
        let extractor = Arc::clone(&self.extractor);

        // Third-party decoders run off the async workers; a panic there is a
        // decode failure, not a crash.
        let mut partial = tokio::task::spawn_blocking(move || {
            let hint = SniffHint {
                content_type: content_type.as_deref(),
                extension: extension.as_deref(),
            };
            extractor.extract(&data, &hint)
        })
        .await
        .map_err(|e| ExtractionError::decode(format!("metadata sniffer aborted: {}", e)))??;

        partial.size_bytes = Some(size_bytes);
        Ok(partial)
    }
}

/// Estimate from the URL, content type and size. Never fails.
pub struct HeuristicStrategy {
    estimator: HeuristicEstimator,
}

impl HeuristicStrategy {
    pub fn new(estimator: HeuristicEstimator) -> Self {
        Self { estimator }
    }
}

#[async_trait]
impl MetadataStrategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn extract(&self, ctx: &ExtractionContext<'_>) -> ExtractionResult<PartialMetadata> {
        if ctx.known_size().is_none() {
            if let Err(e) = ctx.remote_info().await {
                tracing::debug!(error = %e, "Size unknown for estimate");
            }
        }
        Ok(self
            .estimator
            .estimate(ctx.url(), ctx.content_type(), ctx.known_size()))
    }
}

/// Sequences the extraction stages for one video URL.
pub struct ExtractionOrchestrator {
    fetcher: BoundedFetcher,
    prefix_bytes: u64,
    strategies: Vec<Arc<dyn MetadataStrategy>>,
}

impl ExtractionOrchestrator {
    /// Build the default pipeline from configuration. The probe stage is
    /// skipped when disabled.
    pub fn from_config(config: &VideoMetadataConfig) -> ExtractionResult<Self> {
        let fetcher = BoundedFetcher::from_config(config)?;
        let mut strategies: Vec<Arc<dyn MetadataStrategy>> = Vec::new();

        if config.probe_enabled {
            let adapter = ExternalProbeAdapter::new(
                config.ffprobe_path.clone(),
                Duration::from_secs(config.probe_timeout_secs),
            );
            strategies.push(Arc::new(ProbeStrategy::new(
                adapter,
                config.probe_max_bytes,
                config.temp_dir.clone(),
            )));
        }

        strategies.push(Arc::new(ContainerStrategy));

        #[cfg(feature = "generic-sniffer")]
        strategies.push(Arc::new(GenericStrategy::new(Arc::new(
            GenericMetadataExtractor::new(Arc::new(super::generic::SymphoniaSniffer)),
        ))));

        strategies.push(Arc::new(HeuristicStrategy::new(HeuristicEstimator::new(
            config.assumed_bytes_per_sec,
        ))));

        Ok(Self::with_strategies(fetcher, config.prefix_bytes, strategies))
    }

    pub fn with_strategies(
        fetcher: BoundedFetcher,
        prefix_bytes: u64,
        strategies: Vec<Arc<dyn MetadataStrategy>>,
    ) -> Self {
        Self {
            fetcher,
            prefix_bytes,
            strategies,
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Extract metadata for `url`. Never fails: stage errors degrade
    /// precision, and anything still unknown takes its default.
    #[tracing::instrument(skip(self))]
    pub async fn extract(&self, url: &str, content_type: Option<&str>) -> VideoMetadata {
        let start = std::time::Instant::now();
        let ctx = ExtractionContext::new(url, content_type, &self.fetcher, self.prefix_bytes);
        let mut merged = PartialMetadata::default();
        let mut duration_source = None;

        for strategy in &self.strategies {
            if merged.has_duration() {
                break;
            }

            let span = tracing::info_span!("extraction_stage", stage = strategy.name());
            match strategy.extract(&ctx).instrument(span).await {
                Ok(partial) => {
                    tracing::debug!(
                        stage = strategy.name(),
                        duration = ?partial.duration_seconds,
                        height = ?partial.height,
                        codec = ?partial.codec,
                        "Stage contributed metadata"
                    );
                    merged.merge_missing(partial);
                    if merged.has_duration() {
                        duration_source = Some(strategy.name());
                    }
                }
                Err(e) => log_stage_error(strategy.name(), &e),
            }
        }

        if merged.size_bytes.is_none() {
            merged.size_bytes = ctx.known_size();
        }
        let metadata = merged.into_video_metadata();

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            video_duration = ?metadata.duration_seconds,
            duration_source = duration_source.unwrap_or("none"),
            resolution = %metadata.resolution_bucket,
            aspect_ratio = %metadata.aspect_ratio,
            codec = %metadata.codec,
            fps = metadata.fps,
            size_bytes = metadata.size_bytes,
            "Video metadata extracted"
        );
        metadata
    }
}

fn log_stage_error(stage: &str, error: &ExtractionError) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(stage, code, error = %error, "Stage skipped"),
        LogLevel::Info => tracing::info!(stage, code, error = %error, "Stage failed"),
        LogLevel::Warn => tracing::warn!(stage, code, error = %error, "Stage failed"),
        LogLevel::Error => tracing::error!(stage, code, error = %error, "Stage failed"),
    }
}
