use anyhow::Result;
use dashboard_service::{
    config::AppConfig, observability, pipeline::DashboardPipeline, sources::JsonFileSource,
    transform::View,
};

/// Print the household and community dashboards for the current hour, plus the
/// community's 24-hour energy summary, as JSON.
fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    let source = JsonFileSource::from_config(&cfg.dataset);
    let pipeline = DashboardPipeline::from_config(&cfg, &source)?;

    let (household, community) = pipeline.current_views();
    let out = serde_json::json!({
        "household": household,
        "community": community,
        "energy_summary": pipeline.energy_summary(View::Community),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);

    Ok(())
}
