use std::sync::Arc;

use crate::config::Config;
use crate::parsing::CvParser;
use crate::rate_limit::UploadRateLimiter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Stateless pipeline; cloning shares the same decoder collaborators.
    pub parser: CvParser,
    /// Per-client upload counters. Eviction is driven from `main`.
    pub rate_limiter: Arc<UploadRateLimiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let rate_limiter = Arc::new(UploadRateLimiter::new(
            config.rate_limit_max_uploads,
            config.rate_limit_window,
        ));
        Self {
            config,
            parser: CvParser::default(),
            rate_limiter,
        }
    }
}
