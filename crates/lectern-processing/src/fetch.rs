//! Bounded retrieval of remote video bytes.
//!
//! The fetcher never downloads more than the caller's byte cap. When the
//! object is larger than the cap (or its size is unknown) it issues a single
//! `Range: bytes=0-{cap-1}` request; servers that ignore the range are read
//! only up to the cap before the connection is dropped.

use bytes::{Bytes, BytesMut};
use lectern_core::VideoMetadataConfig;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE};
use reqwest::{Client, Response, StatusCode, Url};
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{ExtractionError, ExtractionResult};

const USER_AGENT: &str = concat!("lectern-video-metadata/", env!("CARGO_PKG_VERSION"));

/// What a metadata-only (HEAD) request told us about the remote object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteObjectInfo {
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
}

/// Bytes read from the start of a remote object.
#[derive(Debug, Clone)]
pub struct FetchedBytes {
    pub data: Bytes,
    /// Full size of the remote object, when the server reported it
    pub total_size: Option<u64>,
    pub content_type: Option<String>,
}

impl FetchedBytes {
    /// True when `data` holds the whole object.
    pub fn is_complete(&self) -> bool {
        matches!(self.total_size, Some(total) if total == self.data.len() as u64)
    }

    /// Full object size when known, otherwise the number of bytes examined.
    pub fn size_bytes(&self) -> u64 {
        self.total_size.unwrap_or(self.data.len() as u64)
    }
}

/// A local copy of (a prefix of) a remote object.
///
/// The file lives under a unique name and is removed when this value is
/// dropped, including when the owning future is cancelled mid-download.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
    pub bytes_written: u64,
    pub total_size: Option<u64>,
    pub content_type: Option<String>,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn size_bytes(&self) -> u64 {
        self.total_size.unwrap_or(self.bytes_written)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchPlan {
    Whole,
    Range { last_byte: u64 },
}

impl FetchPlan {
    fn for_size(total: Option<u64>, cap: u64) -> Self {
        match total {
            Some(total) if total <= cap => FetchPlan::Whole,
            _ => FetchPlan::Range {
                last_byte: cap.saturating_sub(1),
            },
        }
    }
}

/// HTTP fetcher with a hard byte cap per request.
///
/// Retries are not attempted here; the orchestrator decides what happens
/// after a failure.
#[derive(Clone)]
pub struct BoundedFetcher {
    client: Client,
}

impl BoundedFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a fetcher whose client carries the configured request timeout.
    pub fn from_config(config: &VideoMetadataConfig) -> ExtractionResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ExtractionError::transport("<client>", e))?;
        Ok(Self::new(client))
    }

    /// Metadata-only request for size and content type.
    #[tracing::instrument(skip(self))]
    pub async fn head(&self, url: &str) -> ExtractionResult<RemoteObjectInfo> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| ExtractionError::transport(url, e))?;

        if !response.status().is_success() {
            return Err(ExtractionError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let headers = response.headers();
        let info = RemoteObjectInfo {
            content_length: headers
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok()),
            content_type: header_string(&response, CONTENT_TYPE),
        };

        tracing::debug!(
            content_length = ?info.content_length,
            content_type = ?info.content_type,
            "Remote object info"
        );
        Ok(info)
    }

    /// Fetch at most `cap` bytes from the start of `url`, asking the server
    /// for the object size first.
    pub async fn fetch_prefix(&self, url: &str, cap: u64) -> ExtractionResult<FetchedBytes> {
        let info = self.head_or_unknown(url).await?;
        self.fetch_prefix_with_info(url, cap, &info).await
    }

    /// Fetch at most `cap` bytes using an already known [`RemoteObjectInfo`].
    #[tracing::instrument(skip(self, info))]
    pub async fn fetch_prefix_with_info(
        &self,
        url: &str,
        cap: u64,
        info: &RemoteObjectInfo,
    ) -> ExtractionResult<FetchedBytes> {
        let cap = cap.max(1);
        let mut response = self.send_planned(url, cap, info).await?;
        let total_size = resolve_total_size(info, &response);
        let content_type =
            header_string(&response, CONTENT_TYPE).or_else(|| info.content_type.clone());

        let mut buffer = BytesMut::with_capacity(initial_capacity(total_size, cap));
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ExtractionError::transport(url, e))?
        {
            let remaining = (cap - buffer.len() as u64) as usize;
            if chunk.len() >= remaining {
                buffer.extend_from_slice(&chunk[..remaining]);
                break;
            }
            buffer.extend_from_slice(&chunk);
        }

        tracing::debug!(bytes = buffer.len(), ?total_size, "Fetched byte prefix");
        Ok(FetchedBytes {
            data: buffer.freeze(),
            total_size,
            content_type,
        })
    }

    /// Download at most `cap` bytes of `url` into a uniquely named temporary
    /// file under `dir` (system temp dir when `None`).
    #[tracing::instrument(skip(self, info, dir))]
    pub async fn stage_to_file(
        &self,
        url: &str,
        cap: u64,
        info: &RemoteObjectInfo,
        dir: Option<&Path>,
    ) -> ExtractionResult<StagedFile> {
        let cap = cap.max(1);
        let mut response = self.send_planned(url, cap, info).await?;
        let total_size = resolve_total_size(info, &response);
        let content_type =
            header_string(&response, CONTENT_TYPE).or_else(|| info.content_type.clone());

        let prefix = format!("lectern-video-{}-", Uuid::new_v4().simple());
        let suffix = extension_from_url(url)
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(&suffix);
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        let mut out = tokio::fs::File::from_std(file.as_file().try_clone()?);
        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ExtractionError::transport(url, e))?
        {
            let remaining = (cap - written) as usize;
            let slice = if chunk.len() >= remaining {
                &chunk[..remaining]
            } else {
                &chunk[..]
            };
            out.write_all(slice).await?;
            written += slice.len() as u64;
            if written >= cap {
                break;
            }
        }
        out.flush().await?;

        tracing::debug!(
            path = %file.path().display(),
            bytes = written,
            ?total_size,
            "Staged video copy"
        );
        Ok(StagedFile {
            file,
            bytes_written: written,
            total_size,
            content_type,
        })
    }

    /// HEAD the object; a non-success status degrades to "size unknown",
    /// a transport failure is surfaced.
    pub async fn head_or_unknown(&self, url: &str) -> ExtractionResult<RemoteObjectInfo> {
        match self.head(url).await {
            Ok(info) => Ok(info),
            Err(e @ ExtractionError::HttpStatus { .. }) => {
                tracing::debug!(error = %e, "HEAD rejected, assuming unknown size");
                Ok(RemoteObjectInfo::default())
            }
            Err(e) => Err(e),
        }
    }

    async fn send_planned(
        &self,
        url: &str,
        cap: u64,
        info: &RemoteObjectInfo,
    ) -> ExtractionResult<Response> {
        let plan = FetchPlan::for_size(info.content_length, cap);
        let mut request = self.client.get(url);
        if let FetchPlan::Range { last_byte } = plan {
            request = request.header(RANGE, format!("bytes=0-{}", last_byte));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ExtractionError::transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if matches!(plan, FetchPlan::Range { .. }) && status != StatusCode::PARTIAL_CONTENT {
            tracing::debug!(%status, "Server ignored range request, reading up to cap");
        }

        Ok(response)
    }
}

fn header_string(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Full object size: the HEAD length, else the `Content-Range` total, else
/// the length of a `200 OK` body (a server that ignored the range).
fn resolve_total_size(info: &RemoteObjectInfo, response: &Response) -> Option<u64> {
    info.content_length
        .or_else(|| total_from_content_range(response))
        .or_else(|| {
            if response.status() == StatusCode::OK {
                response.content_length()
            } else {
                None
            }
        })
}

/// Total size from a `Content-Range: bytes 0-1023/5000` header.
fn total_from_content_range(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_range_total)
}

fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

fn initial_capacity(total: Option<u64>, cap: u64) -> usize {
    const MAX_PREALLOC: u64 = 4 * 1024 * 1024;
    total.unwrap_or(cap).min(cap).min(MAX_PREALLOC) as usize
}

/// Last path segment of a URL, without query or fragment.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .to_string(),
    };
    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
}

/// Lower-cased file extension of the URL's file name.
pub fn extension_from_url(url: &str) -> Option<String> {
    let name = file_name_from_url(url)?;
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
