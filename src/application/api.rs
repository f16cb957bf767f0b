//! HTTP status API
//!
//! Read-only JSON endpoints over the engine's latest output plus on-chain
//! snapshot history for any wallet.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use super::state::SharedState;
use crate::config::models::ServerConfig;
use crate::core::error::AppError;
use crate::core::ports::SnapshotStore;
use crate::core::result::AppResult;
use crate::core::types::RiskSnapshotRecord;
use crate::core::validation::parse_pubkey;
use crate::utils::{format_iso_millis, format_uptime};

/// Handler state
#[derive(Clone)]
pub struct ApiState {
    pub state: SharedState,
    pub snapshots: Arc<dyn SnapshotStore>,
}

impl ApiState {
    pub fn new(state: SharedState, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self { state, snapshots }
    }
}

/// Errors rendered as `{"error": "..."}`
#[derive(Debug)]
enum ApiError {
    MissingWallet,
    InvalidWallet,
    Upstream(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingWallet => (StatusCode::BAD_REQUEST, "Wallet address required"),
            ApiError::InvalidWallet => (StatusCode::BAD_REQUEST, "Invalid wallet address"),
            ApiError::Upstream(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct WalletQuery {
    wallet: Option<String>,
}

/// Build the API router
pub fn router(api: ApiState, enable_cors: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/risk", get(risk))
        .route("/portfolio", get(portfolio))
        .route("/snapshots", get(snapshots))
        .route("/snapshots/chart", get(snapshot_chart))
        .with_state(api)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Bind and serve until `shutdown` is cancelled
pub async fn serve(
    config: &ServerConfig,
    api: ApiState,
    shutdown: CancellationToken,
) -> AppResult<()> {
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::network(format!("Failed to bind {}: {}", addr, e)))?;

    info!("🌐 API running on http://{}", addr);

    axum::serve(listener, router(api, config.enable_cors))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::internal(format!("HTTP server error: {}", e)))?;

    info!("🛑 API server stopped");
    Ok(())
}

async fn health(State(api): State<ApiState>) -> Json<Value> {
    let health = api.state.health();
    Json(json!({
        "status": "ok",
        "engine": health.overall(),
        "uptime_seconds": api.state.uptime().as_secs(),
        "uptime": format_uptime(api.state.uptime()),
        "components": health.all(),
    }))
}

async fn risk(State(api): State<ApiState>) -> Json<Value> {
    match api.state.latest() {
        Some(latest) => Json(json!({
            "risk": latest.risk_score,
            "hhi": latest.hhi,
            "value_at_risk": latest.value_at_risk,
            "updated_at": latest.assessed_at.to_rfc3339(),
        })),
        None => Json(json!({
            "risk": 0.0,
            "hhi": 0.0,
            "value_at_risk": 0.0,
            "updated_at": null,
        })),
    }
}

async fn portfolio(State(api): State<ApiState>) -> Json<Value> {
    match api.state.latest() {
        Some(latest) => Json(json!({
            "portfolio": latest.portfolio.total_value,
            "positions": latest.portfolio.positions,
            "updated_at": latest.assessed_at.to_rfc3339(),
        })),
        None => Json(json!({
            "portfolio": 0.0,
            "positions": [],
            "updated_at": null,
        })),
    }
}

/// Unparseable query strings (e.g. a repeated `wallet`) count as an invalid wallet
fn wallet_query(query: Result<Query<WalletQuery>, QueryRejection>) -> Result<WalletQuery, ApiError> {
    query.map(|Query(q)| q).map_err(|e| {
        warn!("Rejected snapshot query: {}", e);
        ApiError::InvalidWallet
    })
}

async fn snapshots(
    State(api): State<ApiState>,
    query: Result<Query<WalletQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let query = wallet_query(query)?;
    let snapshots = load_snapshots(&api, query, "Failed to fetch snapshots").await?;
    Ok(Json(json!({ "snapshots": snapshots })))
}

async fn snapshot_chart(
    State(api): State<ApiState>,
    query: Result<Query<WalletQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    const FAILURE: &str = "Failed to fetch chart data";

    let query = wallet_query(query)?;
    let snapshots = load_snapshots(&api, query, FAILURE).await?;
    let data = snapshots
        .iter()
        .map(|s| {
            Ok(json!({
                "time": format_iso_millis(s.timestamp)?,
                "risk": s.risk_score,
            }))
        })
        .collect::<AppResult<Vec<Value>>>()
        .map_err(|e| {
            warn!("Snapshot with unrepresentable timestamp: {}", e);
            ApiError::Upstream(FAILURE)
        })?;

    Ok(Json(json!({ "data": data })))
}

async fn load_snapshots(
    api: &ApiState,
    query: WalletQuery,
    failure: &'static str,
) -> Result<Vec<RiskSnapshotRecord>, ApiError> {
    let wallet = query
        .wallet
        .filter(|w| !w.trim().is_empty())
        .ok_or(ApiError::MissingWallet)?;
    let owner = parse_pubkey(wallet.trim(), "wallet").map_err(|_| ApiError::InvalidWallet)?;

    api.snapshots.snapshots(&owner).await.map_err(|e| {
        warn!("⚠️  Snapshot query for {} failed: {}", owner, e);
        ApiError::Upstream(failure)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ports::MockSnapshotStore;
    use crate::core::types::{PortfolioValuation, Position, RiskAssessment, ScoreMethod};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use solana_sdk::pubkey::Pubkey;
    use tower::ServiceExt;

    fn app(store: MockSnapshotStore, state: SharedState) -> Router {
        router(ApiState::new(state, Arc::new(store)), true)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn record(timestamp: i64, risk_score: u8) -> RiskSnapshotRecord {
        RiskSnapshotRecord {
            public_key: Pubkey::new_unique().to_string(),
            risk_score,
            timestamp,
        }
    }

    #[tokio::test]
    async fn test_health_reports_engine_status() {
        let (status, body) = get_json(app(MockSnapshotStore::new(), SharedState::new()), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["engine"], "starting");
        assert!(body["uptime_seconds"].is_u64());
        assert!(body["uptime"].as_str().is_some_and(|u| u.ends_with('s')));
        assert_eq!(body["components"].as_array().map(Vec::len), Some(4));
    }

    #[tokio::test]
    async fn test_risk_and_portfolio_before_first_tick() {
        let state = SharedState::new();

        let (_, risk) = get_json(app(MockSnapshotStore::new(), state.clone()), "/risk").await;
        assert_eq!(risk["risk"], 0.0);
        assert!(risk["updated_at"].is_null());

        let (_, portfolio) = get_json(app(MockSnapshotStore::new(), state), "/portfolio").await;
        assert_eq!(portfolio["portfolio"], 0.0);
        assert_eq!(portfolio["positions"], json!([]));
    }

    #[tokio::test]
    async fn test_risk_and_portfolio_after_publish() {
        let state = SharedState::new();
        state.publish(RiskAssessment {
            portfolio: PortfolioValuation {
                positions: vec![Position {
                    symbol: "SOL".to_string(),
                    amount: 2.0,
                    price: 100.0,
                    value: 200.0,
                }],
                total_value: 200.0,
            },
            variance: 0.0004,
            sigma: 0.02,
            value_at_risk: 6.58,
            var_score: 3.29,
            hhi: 1.0,
            hhi_score: 100.0,
            method: ScoreMethod::Var,
            risk_score: 3.29,
            assessed_at: Utc::now(),
        });

        let (_, risk) = get_json(app(MockSnapshotStore::new(), state.clone()), "/risk").await;
        assert_eq!(risk["risk"], 3.29);
        assert_eq!(risk["hhi"], 1.0);
        assert_eq!(risk["value_at_risk"], 6.58);
        assert!(risk["updated_at"].is_string());

        let (_, portfolio) = get_json(app(MockSnapshotStore::new(), state), "/portfolio").await;
        assert_eq!(portfolio["portfolio"], 200.0);
        assert_eq!(portfolio["positions"][0]["symbol"], "SOL");
    }

    #[tokio::test]
    async fn test_snapshots_require_wallet() {
        for uri in ["/snapshots", "/snapshots?wallet=", "/snapshots/chart"] {
            let (status, body) = get_json(app(MockSnapshotStore::new(), SharedState::new()), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({ "error": "Wallet address required" }));
        }
    }

    #[tokio::test]
    async fn test_snapshots_reject_malformed_wallet() {
        let (status, body) = get_json(
            app(MockSnapshotStore::new(), SharedState::new()),
            "/snapshots?wallet=not-a-key",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid wallet address" }));
    }

    #[tokio::test]
    async fn test_unparseable_query_is_json_400() {
        let wallet = Pubkey::new_unique();
        for path in ["/snapshots", "/snapshots/chart"] {
            let (status, body) = get_json(
                app(MockSnapshotStore::new(), SharedState::new()),
                &format!("{}?wallet={}&wallet={}", path, wallet, wallet),
            )
            .await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({ "error": "Invalid wallet address" }));
        }
    }

    #[tokio::test]
    async fn test_snapshots_for_wallet() {
        let wallet = Pubkey::new_unique();
        let first = record(1_700_000_000, 12);
        let second = record(1_700_000_060, 40);
        let expected = vec![first.clone(), second.clone()];

        let mut store = MockSnapshotStore::new();
        store
            .expect_snapshots()
            .withf(move |owner| *owner == wallet)
            .times(1)
            .returning(move |_| Ok(vec![first.clone(), second.clone()]));

        let (status, body) = get_json(
            app(store, SharedState::new()),
            &format!("/snapshots?wallet={}", wallet),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["snapshots"][1]["riskScore"], 40);
        assert_eq!(body["snapshots"][0]["publicKey"], expected[0].public_key);
        assert_eq!(body["snapshots"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_chart_formats_iso_times() {
        let mut store = MockSnapshotStore::new();
        store
            .expect_snapshots()
            .returning(|_| Ok(vec![record(1_700_000_000, 55)]));

        let (status, body) = get_json(
            app(store, SharedState::new()),
            &format!("/snapshots/chart?wallet={}", Pubkey::new_unique()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "data": [{ "time": "2023-11-14T22:13:20.000Z", "risk": 55 }] })
        );
    }

    #[tokio::test]
    async fn test_rpc_failures_are_500() {
        let wallet = Pubkey::new_unique();
        for (path, message) in [
            ("/snapshots", "Failed to fetch snapshots"),
            ("/snapshots/chart", "Failed to fetch chart data"),
        ] {
            let mut store = MockSnapshotStore::new();
            store
                .expect_snapshots()
                .returning(|_| Err(AppError::solana("connection refused")));

            let (status, body) = get_json(
                app(store, SharedState::new()),
                &format!("{}?wallet={}", path, wallet),
            )
            .await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, json!({ "error": message }));
        }
    }
}
