use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use community_domain::domain::{EnergyFlowPoint, ScalingConfig, ValidationError};
use serde::Deserialize;

use crate::{
    pipeline::{DashboardData, DashboardPipeline, EnergySummary},
    sources::DatasetSource,
    store::DataLoadError,
    transform::View,
};

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<DashboardPipeline>,
    pub source: Arc<dyn DatasetSource>,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    DataLoad(#[from] DataLoadError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::DataLoad(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/dashboard", get(dashboard))
        .route("/api/community-dashboard", get(community_dashboard))
        .route("/api/energy-flow", get(energy_flow))
        .route("/api/energy-summary", get(energy_summary))
        .route("/api/config/scaling", get(scaling))
        .route("/api/config/self-sufficiency", put(set_self_sufficiency))
        .route("/api/dataset/reload", post(reload))
        .route("/healthz", get(healthz))
        .with_state(state)
}

pub async fn serve(bind_addr: &str, state: ApiState) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server.bind_addr '{bind_addr}': {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "dashboard API listening");

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await?;
    Ok(())
}

async fn dashboard(State(state): State<ApiState>) -> Json<DashboardData> {
    Json(state.pipeline.get_dashboard_data())
}

async fn community_dashboard(State(state): State<ApiState>) -> Json<DashboardData> {
    Json(state.pipeline.get_community_dashboard_data())
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    view: Option<View>,
}

async fn energy_flow(
    State(state): State<ApiState>,
    Query(query): Query<ViewQuery>,
) -> Json<Vec<EnergyFlowPoint>> {
    let view = query.view.unwrap_or(View::Community);
    Json(state.pipeline.energy_flow_24h(view))
}

async fn energy_summary(
    State(state): State<ApiState>,
    Query(query): Query<ViewQuery>,
) -> Json<EnergySummary> {
    let view = query.view.unwrap_or(View::Community);
    Json(state.pipeline.energy_summary(view))
}

async fn scaling(State(state): State<ApiState>) -> Json<ScalingConfig> {
    Json(state.pipeline.scaling())
}

#[derive(Debug, Deserialize)]
pub struct SelfSufficiencyUpdate {
    pub value: f64,
}

async fn set_self_sufficiency(
    State(state): State<ApiState>,
    Json(update): Json<SelfSufficiencyUpdate>,
) -> Result<Json<ScalingConfig>, ApiError> {
    let cfg = state.pipeline.set_self_sufficiency_factor(update.value)?;
    Ok(Json(cfg))
}

async fn reload(State(state): State<ApiState>) -> Result<StatusCode, ApiError> {
    let pipeline = state.pipeline.clone();
    let source = state.source.clone();
    tokio::task::spawn_blocking(move || pipeline.reload(source.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(StatusCode::NO_CONTENT)
}

async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::FixedClock, store::RecordStore};
    use community_domain::domain::{DemandPeriod, DemandRecord, PlantId, Region, SolarRecord};
    use time::macros::datetime;

    struct EmptySource;

    impl DatasetSource for EmptySource {
        fn describe(&self) -> String {
            "empty".to_string()
        }

        fn load(&self) -> Result<RecordStore, DataLoadError> {
            Err(DataLoadError::MissingSection("demand_data"))
        }
    }

    fn state() -> ApiState {
        let period = DemandPeriod::new(10, 0).unwrap();
        let store = RecordStore::new(
            vec![
                SolarRecord::new(PlantId::Plant1, 10, 150.0),
                SolarRecord::new(PlantId::Plant2, 10, 50.0),
            ],
            vec![DemandRecord::new(period, Region::North, Some(800.0))],
        );
        let pipeline = DashboardPipeline::new(
            store,
            ScalingConfig::default(),
            Arc::new(FixedClock(datetime!(2025-10-27 10:30:00 UTC))),
        )
        .unwrap();
        ApiState {
            pipeline: Arc::new(pipeline),
            source: Arc::new(EmptySource),
        }
    }

    #[tokio::test]
    async fn community_dashboard_serializes_as_available() {
        let Json(data) = community_dashboard(State(state())).await;
        let body = serde_json::to_value(&data).unwrap();

        assert_eq!(body["status"], "available");
        assert_eq!(body["view"], "community");
        assert_eq!(body["metrics"]["generation_kw"], 240.0);
        assert_eq!(body["metrics"]["consumption_kw"], 800.0);
        assert_eq!(body["raw"]["avg_demand_mw"], 800.0);
    }

    #[tokio::test]
    async fn household_dashboard_uses_household_view() {
        let Json(data) = dashboard(State(state())).await;
        let metrics = data.metrics().unwrap();
        assert_eq!(metrics.generation_kw, 0.2);
        assert_eq!(metrics.consumption_kw, 0.4);
    }

    #[tokio::test]
    async fn self_sufficiency_update_round_trips() {
        let state = state();
        let Json(cfg) = set_self_sufficiency(
            State(state.clone()),
            Json(SelfSufficiencyUpdate { value: 1.5 }),
        )
        .await
        .unwrap();
        assert_eq!(cfg.self_sufficiency_factor, 1.5);

        let Json(current) = scaling(State(state)).await;
        assert_eq!(current.self_sufficiency_factor, 1.5);
    }

    #[tokio::test]
    async fn out_of_range_update_is_unprocessable() {
        let res = set_self_sufficiency(State(state()), Json(SelfSufficiencyUpdate { value: 0.2 })).await;
        let err = res.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn energy_flow_defaults_to_community_view() {
        let Json(flow) = energy_flow(State(state()), Query(ViewQuery { view: None })).await;
        assert_eq!(flow.len(), 24);
        let ten = flow.iter().find(|p| p.hour == 10).unwrap();
        assert_eq!(ten.produced_kw, 240.0);
    }

    #[tokio::test]
    async fn energy_summary_serializes_history_and_carbon() {
        let Json(summary) = energy_summary(State(state()), Query(ViewQuery { view: None })).await;
        let body = serde_json::to_value(summary).unwrap();

        assert_eq!(body["view"], "community");
        assert_eq!(body["history_24h"]["produced_kwh"], 240.0);
        assert!(body["carbon"]["total_offset_kg"].as_f64().unwrap() > 0.0);
        assert!(body["carbon"]["baseline_comparison"].is_number());
    }

    #[tokio::test]
    async fn failed_reload_reports_server_error() {
        let err = reload(State(state())).await.unwrap_err();
        assert!(matches!(err, ApiError::DataLoad(DataLoadError::MissingSection(_))));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
