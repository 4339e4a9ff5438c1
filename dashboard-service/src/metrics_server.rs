use std::net::SocketAddr;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROM_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Counters emitted by the dashboard service, with their `/metrics` help text.
pub const COUNTERS: [(&str, &str); 5] = [
    ("dashboard_requests_total", "Dashboard computations served, by view"),
    (
        "dashboard_unavailable_total",
        "Dashboard computations without usable demand data, by view",
    ),
    (
        "scaling_updates_rejected_total",
        "Scaling config updates rejected by validation",
    ),
    ("dataset_load_failures_total", "Failed dataset load attempts"),
    (
        "demand_rows_skipped_total",
        "Market demand rows outside the 24-hour day",
    ),
];

fn describe_counters() {
    for (name, help) in COUNTERS {
        metrics::describe_counter!(name, help);
    }
}

/// Install the Prometheus recorder and serve `/metrics` on `bind_addr`.
pub fn init(bind_addr: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid metrics.bind_addr '{bind_addr}': {e}"))?;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus metrics recorder: {e}"))?;

    // Only the first recorder can be installed, so a second handle is never produced.
    let _ = PROM_HANDLE.set(handle);
    describe_counters();

    tokio::spawn(async move {
        let app = Router::new().route("/metrics", get(render_metrics));

        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                tracing::info!(%addr, "metrics endpoint listening");
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    tracing::error!(error = %e, "metrics server error");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to bind metrics listener");
            }
        }
    });

    Ok(())
}

async fn render_metrics() -> String {
    PROM_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}
