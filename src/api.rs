//! REST API for Chainview
//!
//! Serves block, transaction and account queries from the ledger files and
//! accepts signed transactions into the pending pool. Routes keep the paths
//! existing wallets and explorers already call.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::block::Block;
use crate::config::{ApiConfig, Config};
use crate::error::LedgerError;
use crate::mempool::{PendingPool, SubmitRequest};
use crate::resolver::{BlockSelector, QueryResolver};
use crate::transaction::Transaction;

/// Shared state behind every route.
pub struct Node {
    pub resolver: QueryResolver,
    pub pool: Arc<PendingPool>,
    allow_any_origin: bool,
    api_stats: RwLock<ApiStats>,
}

/// API statistics and monitoring
#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    transactions_submitted: u64,
    start_time: Option<Instant>,
}

impl ApiStats {
    fn new() -> Self {
        ApiStats {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record_request(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

impl Node {
    pub fn new(resolver: QueryResolver, pool: Arc<PendingPool>) -> Self {
        Self {
            resolver,
            pool,
            allow_any_origin: true,
            api_stats: RwLock::new(ApiStats::new()),
        }
    }

    /// Node over the stores named in the configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            QueryResolver::from_config(&config.store),
            Arc::new(PendingPool::from_config(&config.store)),
        )
        .with_any_origin(config.api.allow_any_origin)
    }

    /// Mirror any request origin in CORS responses, or send no CORS headers.
    pub fn with_any_origin(mut self, allow: bool) -> Self {
        self.allow_any_origin = allow;
        self
    }

    pub async fn get_stats(&self) -> ApiStatsResponse {
        let stats = self.api_stats.read().await;
        let uptime = stats.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0);

        ApiStatsResponse {
            total_requests: stats.total_requests,
            successful_requests: stats.successful_requests,
            failed_requests: stats.failed_requests,
            transactions_submitted: stats.transactions_submitted,
            uptime_seconds: uptime,
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub struct ApiError(pub LedgerError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LedgerError::CallerError(_) => StatusCode::BAD_REQUEST,
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            LedgerError::EncodingFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if !self.0.is_expected() {
            tracing::error!(error = %self.0, "query failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(LedgerError::CallerError(rejection.body_text()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(LedgerError::CallerError(rejection.body_text()))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub transactions_submitted: u64,
    pub uptime_seconds: u64,
}

#[derive(Serialize)]
struct SuccessResponse {
    message: String,
}

#[derive(Deserialize)]
struct BlockQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    number: Option<u64>,
    hash: Option<String>,
}

/// An empty query value counts as absent.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Deserialize)]
struct HashQuery {
    #[serde(default)]
    hash: String,
}

#[derive(Deserialize)]
struct AddressQuery {
    #[serde(default)]
    address: String,
}

// ============================================================================
// Middleware
// ============================================================================

async fn stats_middleware(State(node): State<Arc<Node>>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let success = response.status().is_success();
    let mut stats = node.api_stats.write().await;
    stats.record_request(success);

    response
}

/// Logs method, path, status and duration of every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints
pub fn build_api_router(node: Arc<Node>) -> Router {
    let cors = if node.allow_any_origin {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(vec![
                http::Method::GET,
                http::Method::POST,
                http::Method::OPTIONS,
            ])
            .allow_headers(vec![http::header::CONTENT_TYPE])
            .allow_credentials(true)
    } else {
        CorsLayer::new()
    };

    Router::new()
        // Ledger queries
        .route("/blockNumber", get(get_block_number))
        .route("/block", get(get_block))
        .route("/tx", get(get_transaction))
        // Account queries
        .route("/getNonce", get(get_nonce))
        .route("/getBalance", get(get_balance))
        // Pending pool
        .route("/sendTx", post(send_transaction))
        // System endpoints
        .route("/health", get(health_check))
        .route("/stats", get(get_api_stats))
        // logging before stats so we always record timing
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(node.clone(), stats_middleware))
        .with_state(node)
        .layer(cors)
}

pub async fn run_api_server(
    node: Arc<Node>,
    config: &ApiConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;
    let app = build_api_router(node);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server is running on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Run a store operation on the blocking pool. Queries parse whole files and
/// submissions hold the pool lock across a synced rewrite.
async fn blocking<T, F>(node: &Arc<Node>, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&Node) -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let node = Arc::clone(node);
    tokio::task::spawn_blocking(move || op(&node))
        .await
        .map_err(|e| ApiError(LedgerError::StoreUnavailable(format!("store task failed: {}", e))))?
        .map_err(ApiError::from)
}

async fn health_check(State(node): State<Arc<Node>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "header_schema": node.resolver.schema(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_block_number(State(node): State<Arc<Node>>) -> Result<Json<u64>, ApiError> {
    Ok(Json(blocking(&node, |node| node.resolver.block_number()).await?))
}

async fn get_block(
    State(node): State<Arc<Node>>,
    query: Result<Query<BlockQuery>, QueryRejection>,
) -> Result<Json<Block>, ApiError> {
    let Query(params) = query?;
    let selector = BlockSelector::from_params(params.number, params.hash)?;
    Ok(Json(blocking(&node, move |node| node.resolver.block(&selector)).await?))
}

async fn get_transaction(
    State(node): State<Arc<Node>>,
    query: Result<Query<HashQuery>, QueryRejection>,
) -> Result<Json<Transaction>, ApiError> {
    let Query(params) = query?;
    Ok(Json(
        blocking(&node, move |node| node.resolver.transaction_by_hash(&params.hash)).await?,
    ))
}

async fn get_nonce(
    State(node): State<Arc<Node>>,
    query: Result<Query<AddressQuery>, QueryRejection>,
) -> Result<Json<u64>, ApiError> {
    let Query(params) = query?;
    Ok(Json(
        blocking(&node, move |node| node.resolver.account_nonce(&params.address)).await?,
    ))
}

async fn get_balance(
    State(node): State<Arc<Node>>,
    query: Result<Query<AddressQuery>, QueryRejection>,
) -> Result<Json<u64>, ApiError> {
    let Query(params) = query?;
    Ok(Json(
        blocking(&node, move |node| node.resolver.account_balance(&params.address)).await?,
    ))
}

async fn send_transaction(
    State(node): State<Arc<Node>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let request = SubmitRequest::from_value(payload)?;
    blocking(&node, move |node| node.pool.submit(request)).await?;

    {
        let mut stats = node.api_stats.write().await;
        stats.transactions_submitted += 1;
    }

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            message: "Transaction added to mempool".to_string(),
        }),
    ))
}

async fn get_api_stats(State(node): State<Arc<Node>>) -> impl IntoResponse {
    Json(node.get_stats().await)
}
