//! Shared API state.

use std::sync::Arc;

use crate::analyzer::ThumbnailAnalyzer;
use crate::config::Settings;

/// State handed to every request handler.
#[derive(Clone)]
pub struct ApiContext {
    pub analyzer: Arc<ThumbnailAnalyzer>,
    pub settings: Arc<Settings>,
}

impl ApiContext {
    pub fn new(analyzer: Arc<ThumbnailAnalyzer>, settings: Arc<Settings>) -> Self {
        Self { analyzer, settings }
    }
}
