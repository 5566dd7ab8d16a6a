//! Format normalization.
//!
//! Projects the engine's stream descriptors into [`NormalizedFormat`], drops
//! the ones a client cannot use (unknown size, storyboard containers) and keeps
//! the engine's ordering for the rest.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use crate::engine::ExtractionEngine;
use crate::error::ExtractionError;
use crate::metrics::Metrics;
use crate::types::{MediaType, NormalizedFormat, RawVideoInfo, StreamFormat, VideoInfo};

/// Containers never returned to clients (`mhtml` is yt-dlp's storyboard format)
pub const EXCLUDED_CONTAINERS: &[&str] = &["mhtml"];

/// Size label for formats whose byte size the engine did not report
pub const UNKNOWN_SIZE: &str = "N/A";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Renders a byte count as megabytes with up to two decimals ("2.0 MB", "12.35 MB").
///
/// Fractional bytes are truncated and exact ties round to the even hundredth.
/// Missing or zero sizes become [`UNKNOWN_SIZE`].
pub fn size_label(filesize: Option<f64>) -> String {
    let bytes = match filesize {
        // `+ 0.0` turns the -0.0 left by truncating (-1, 0) into 0.0
        Some(bytes) if bytes != 0.0 => bytes.trunc() + 0.0,
        _ => return UNKNOWN_SIZE.to_string(),
    };

    let megabytes = (bytes * 100.0 / BYTES_PER_MB).round_ties_even() / 100.0;
    if megabytes.fract() == 0.0 {
        format!("{:.1} MB", megabytes)
    } else {
        format!("{} MB", megabytes)
    }
}

/// A format carries video unless its codec is missing or reported as "none".
pub fn media_type(vcodec: Option<&str>) -> MediaType {
    match vcodec {
        Some(codec) if codec != "none" => MediaType::Video,
        _ => MediaType::Audio,
    }
}

/// Projects a single engine descriptor. Does not filter.
pub fn project(format: &StreamFormat) -> NormalizedFormat {
    NormalizedFormat {
        id: format.format_id.clone(),
        quality_label: format.format_note.clone().unwrap_or_else(|| "Audio only".to_string()),
        container: format.ext.clone().unwrap_or_else(|| "unknown".to_string()),
        size_label: size_label(format.filesize),
        media_type: media_type(format.vcodec.as_deref()),
        is_60fps: format.fps == Some(60.0),
        url: format.url.clone(),
        video_codec: format.vcodec.clone().unwrap_or_else(|| "none".to_string()),
        audio_codec: format.acodec.clone().unwrap_or_else(|| "none".to_string()),
    }
}

fn is_listable(format: &NormalizedFormat) -> bool {
    format.size_label != UNKNOWN_SIZE && !EXCLUDED_CONTAINERS.contains(&format.container.as_str())
}

/// Converts raw engine metadata into the public response shape.
pub fn normalize_info(raw: RawVideoInfo) -> VideoInfo {
    let formats = raw.formats.iter().map(project).filter(is_listable).collect();

    VideoInfo {
        title: raw.title.unwrap_or_default(),
        thumbnail: raw.thumbnail.unwrap_or_default(),
        formats,
    }
}

/// Runs the extraction engine under a concurrency limit and timeout and
/// normalizes its output.
pub struct FormatNormalizer {
    engine: Arc<dyn ExtractionEngine>,
    permits: Semaphore,
    timeout: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl FormatNormalizer {
    pub fn new(engine: Arc<dyn ExtractionEngine>, max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            engine,
            permits: Semaphore::new(max_concurrent.max(1)),
            timeout,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Resolve `url` into a [`VideoInfo`].
    ///
    /// Never panics past this boundary: every engine failure, including a
    /// timeout, comes back as an [`ExtractionError`].
    pub async fn normalize(&self, url: &str) -> Result<VideoInfo, ExtractionError> {
        let started = Instant::now();
        let result = self.extract_bounded(url).await.map(normalize_info);
        let elapsed = started.elapsed();

        match &result {
            Ok(info) => {
                log::info!(
                    "Extracted {} format(s) for {} in {:.2}s",
                    info.formats.len(),
                    url,
                    elapsed.as_secs_f64()
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_success(elapsed, info.formats.len());
                }
            }
            Err(e) => {
                log::warn!("Extraction failed for {} ({}): {}", url, e.outcome(), e);
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(e.outcome(), elapsed);
                }
            }
        }

        result
    }

    async fn extract_bounded(&self, url: &str) -> Result<RawVideoInfo, ExtractionError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ExtractionError::Engine("extraction limiter closed".to_string()))?;

        match tokio::time::timeout(self.timeout, self.engine.extract(url)).await {
            Ok(result) => result,
            Err(_) => Err(ExtractionError::Timeout(self.timeout)),
        }
    }
}
