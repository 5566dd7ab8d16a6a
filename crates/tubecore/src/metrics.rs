//! Prometheus metrics for extractions.
//!
//! The registry is owned by [`Metrics`] rather than the process-global default,
//! so each server instance (and each test) gets an isolated set of series.

use std::time::Duration;

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

/// Outcome label for successful extractions
pub const OUTCOME_SUCCESS: &str = "success";

pub struct Metrics {
    registry: Registry,

    /// Extractions by outcome
    /// Labels: outcome (success/engine_error/timeout/...)
    extractions_total: IntCounterVec,

    /// Wall time of each extraction, including permit wait
    extraction_duration_seconds: Histogram,

    /// Formats left after filtering, per successful extraction
    formats_returned: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let extractions_total = IntCounterVec::new(
            Opts::new("tubeinfo_extractions_total", "Total number of extractions by outcome"),
            &["outcome"],
        )?;
        let extraction_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "tubeinfo_extraction_duration_seconds",
                "Time spent resolving a URL into formats",
            )
            .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 240.0]),
        )?;
        let formats_returned = Histogram::with_opts(
            HistogramOpts::new("tubeinfo_formats_returned", "Number of formats returned per extraction")
                .buckets(vec![0.0, 1.0, 5.0, 10.0, 20.0, 40.0, 80.0]),
        )?;

        registry.register(Box::new(extractions_total.clone()))?;
        registry.register(Box::new(extraction_duration_seconds.clone()))?;
        registry.register(Box::new(formats_returned.clone()))?;

        Ok(Self {
            registry,
            extractions_total,
            extraction_duration_seconds,
            formats_returned,
        })
    }

    pub fn record_success(&self, elapsed: Duration, formats: usize) {
        self.extractions_total.with_label_values(&[OUTCOME_SUCCESS]).inc();
        self.extraction_duration_seconds.observe(elapsed.as_secs_f64());
        self.formats_returned.observe(formats as f64);
    }

    pub fn record_failure(&self, outcome: &str, elapsed: Duration) {
        self.extractions_total.with_label_values(&[outcome]).inc();
        self.extraction_duration_seconds.observe(elapsed.as_secs_f64());
    }

    /// Renders every series in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}
