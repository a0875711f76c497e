use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oppmatch_core::domain::contract::ValidationError;
use oppmatch_core::domain::recommendation::{RecommendRequest, RecommendResponse};
use oppmatch_core::pipeline::{MatchingContext, MatchingPipeline, PipelineOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = oppmatch_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let ctx = match MatchingContext::from_settings(&settings, false).await {
        Ok(ctx) => ctx,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "failed to prepare matching context");
            return Err(e);
        }
    };

    let options = PipelineOptions::from_env();
    let provider = ctx.generator.provider();
    let pipeline = MatchingPipeline::new(ctx, options.clone());
    tracing::info!(
        products = pipeline.catalog().len(),
        %provider,
        evidence_k = options.evidence_k,
        max_concurrency = options.max_concurrency,
        "matching pipeline ready"
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
    };
    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Clone)]
struct AppState {
    pipeline: Arc<MatchingPipeline>,
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/recommend", post(recommend))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let Json(req) = payload?;
    req.validate()?;

    Ok(Json(state.pipeline.recommend(&req).await))
}

#[derive(Debug)]
enum ApiError {
    Validation(ValidationError),
    Body(JsonRejection),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::Body(e)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    field: String,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, field, detail) = match self {
            ApiError::Validation(e) => {
                tracing::info!(field = e.field, detail = %e.detail, "rejected invalid request");
                (StatusCode::UNPROCESSABLE_ENTITY, e.field.to_string(), e.detail)
            }
            ApiError::Body(e) => {
                tracing::info!(error = %e, "rejected unreadable request body");
                (e.status(), "body".to_string(), e.body_text())
            }
        };

        (
            status,
            Json(ErrorBody {
                error: ErrorDetail { field, detail },
            }),
        )
            .into_response()
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &oppmatch_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
