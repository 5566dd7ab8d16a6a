use std::sync::Arc;
use std::time::Instant;

use tubecore::{EngineConfig, ExtractionEngine, FormatNormalizer, Metrics};

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub normalizer: Arc<FormatNormalizer>,
    pub metrics: Arc<Metrics>,
    pub started_at: Instant,
}

impl AppState {
    /// Wires `engine` behind the limiter and timeout from `config`.
    pub fn new(engine: Arc<dyn ExtractionEngine>, config: &EngineConfig) -> Result<Self, prometheus::Error> {
        let metrics = Arc::new(Metrics::new()?);
        let normalizer = FormatNormalizer::new(engine, config.max_concurrent_extractions, config.timeout)
            .with_metrics(Arc::clone(&metrics));

        Ok(Self {
            normalizer: Arc::new(normalizer),
            metrics,
            started_at: Instant::now(),
        })
    }
}
