use std::sync::Arc;

use anyhow::Result;
use dashboard_service::{
    api::{self, ApiState},
    config::AppConfig,
    metrics_server, observability,
    pipeline::DashboardPipeline,
    sources::{DatasetSource, JsonFileSource},
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    // A dataset that cannot be loaded aborts startup.
    let source: Arc<dyn DatasetSource> = Arc::new(JsonFileSource::from_config(&cfg.dataset));
    let pipeline = DashboardPipeline::from_config(&cfg, source.as_ref())?;

    let state = ApiState {
        pipeline: Arc::new(pipeline),
        source,
    };
    api::serve(&cfg.server.bind_addr, state).await?;

    tracing::info!("dashboard service stopped");
    Ok(())
}
