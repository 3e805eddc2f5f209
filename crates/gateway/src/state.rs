use std::sync::Arc;

use ul_domain::config::Config;
use ul_providers::{Discovery, DownstreamProbe, HealthMonitor};
use ul_routing::RoutingEngine;
use ul_store::{JsonRecordStore, ModelManager};

/// Shared state handed to every admin handler and background task.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    // Records
    pub store: Arc<JsonRecordStore>,
    pub models: Arc<ModelManager>,
    // Provider-facing network work
    pub discovery: Arc<Discovery>,
    pub health: Arc<HealthMonitor>,
    pub downstream: Arc<DownstreamProbe>,
    // Output
    pub engine: Arc<RoutingEngine>,
}
