use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;

use etape_core::model::{ItineraryStep, StepGroup};
use etape_core::reorder::OrderEntry;
use etape_core::sequence::{Clock, MonthKey, SystemClock, bucket_by_month, current_step};
use etape_core::service::load_itinerary;
use etape_db::models::{Destination, Step};
use etape_db::queries::{destinations as destination_db, steps as step_db};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.into(),
        }
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateStepRequest {
    pub destination_id: i64,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PatchStepRequest {
    pub date: Option<NaiveDate>,
    pub destination_id: Option<i64>,
    pub notes: Option<String>,
}

/// Body of `PUT /api/steps/order`: the full renumbered sequence.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub steps: Vec<OrderEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDestinationRequest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MonthBucketResponse {
    pub key: MonthKey,
    /// Presentational label; the numeric key is the one to sort on.
    pub label: String,
    pub groups: Vec<StepGroup>,
}

#[derive(Debug, Serialize)]
pub struct CurrentStepResponse {
    pub today: NaiveDate,
    pub current: Option<ItineraryStep>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(pool: PgPool) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/steps", get(list_steps).post(create_step))
        .route(
            "/api/steps/{id}",
            axum::routing::patch(patch_step).delete(delete_step),
        )
        .route("/api/steps/order", put(reorder_steps))
        .route("/api/steps/months", get(months))
        .route("/api/steps/current", get(current))
        .route(
            "/api/destinations",
            get(list_destinations).post(create_destination),
        )
        .route(
            "/api/destinations/{id}",
            axum::routing::delete(delete_destination),
        )
        .layer(CorsLayer::permissive())
        .with_state(pool)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(pool: PgPool, bind: &str, port: u16) -> Result<()> {
    let app = build_router(pool);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("etape serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("etape serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index(State(pool): State<PgPool>) -> Result<axum::response::Response, AppError> {
    let itinerary = load_itinerary(&pool).await.map_err(AppError::internal)?;

    let rows = if itinerary.is_empty() {
        "<tr><td colspan=\"3\">No steps yet.</td></tr>".to_string()
    } else {
        itinerary
            .iter()
            .map(|s| {
                format!(
                    "<tr><td>{pos}</td><td>{date}</td><td>{dest}</td></tr>",
                    pos = s.position,
                    date = s.date,
                    dest = s.destination.name,
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let html = format!(
        "<!DOCTYPE html>\
<html><head><title>étape</title></head><body>\
<h1>étape</h1>\
<p><a href=\"/api/steps\">/api/steps</a> | <a href=\"/api/steps/months\">/api/steps/months</a> | <a href=\"/api/destinations\">/api/destinations</a></p>\
<table><tr><th>#</th><th>Date</th><th>Destination</th></tr>{rows}</table>\
</body></html>"
    );

    Ok(Html(html).into_response())
}

async fn list_steps(State(pool): State<PgPool>) -> Result<Json<Vec<ItineraryStep>>, AppError> {
    let itinerary = load_itinerary(&pool).await.map_err(AppError::internal)?;
    Ok(Json(itinerary))
}

async fn create_step(
    State(pool): State<PgPool>,
    Json(body): Json<CreateStepRequest>,
) -> Result<(StatusCode, Json<Step>), AppError> {
    let known = destination_db::get_destination(&pool, body.destination_id)
        .await
        .map_err(AppError::internal)?;
    if known.is_none() {
        return Err(AppError::unprocessable(format!(
            "destination {} not found",
            body.destination_id
        )));
    }

    let step = step_db::insert_step(&pool, body.destination_id, body.date, body.notes.as_deref())
        .await
        .map_err(AppError::internal)?;
    Ok((StatusCode::CREATED, Json(step)))
}

async fn patch_step(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(body): Json<PatchStepRequest>,
) -> Result<Json<Step>, AppError> {
    let existing = step_db::get_step(&pool, id)
        .await
        .map_err(AppError::internal)?;
    if existing.is_none() {
        return Err(AppError::not_found(format!("step {id} not found")));
    }

    let step = step_db::patch_step(&pool, id, body.date, body.destination_id, body.notes.as_deref())
        .await
        .map_err(AppError::internal)?;
    Ok(Json(step))
}

async fn delete_step(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let existing = step_db::get_step(&pool, id)
        .await
        .map_err(AppError::internal)?;
    if existing.is_none() {
        return Err(AppError::not_found(format!("step {id} not found")));
    }

    step_db::delete_step(&pool, id)
        .await
        .map_err(AppError::internal)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Apply a full renumbered order in one transactional bulk update.
///
/// An unknown id rejects the whole payload and leaves every position
/// untouched, so a stale client cannot half-apply an order.
async fn reorder_steps(
    State(pool): State<PgPool>,
    Json(body): Json<ReorderRequest>,
) -> Result<StatusCode, AppError> {
    let pairs: Vec<(i64, i32)> = body.steps.iter().map(|e| (e.id, e.order)).collect();

    match step_db::apply_order(&pool, &pairs).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(err) => {
            let message = format!("{err:#}");
            if message.contains("not found") {
                Err(AppError::unprocessable(message))
            } else {
                Err(AppError::internal(err))
            }
        }
    }
}

async fn months(
    State(pool): State<PgPool>,
) -> Result<Json<Vec<MonthBucketResponse>>, AppError> {
    let itinerary = load_itinerary(&pool).await.map_err(AppError::internal)?;

    let buckets = bucket_by_month(&itinerary)
        .into_iter()
        .map(|(key, groups)| MonthBucketResponse {
            key,
            label: key.label_fr(),
            groups,
        })
        .collect();

    Ok(Json(buckets))
}

async fn current(State(pool): State<PgPool>) -> Result<Json<CurrentStepResponse>, AppError> {
    let itinerary = load_itinerary(&pool).await.map_err(AppError::internal)?;
    let today = SystemClock.today();
    let resolved = current_step(&itinerary, today).cloned();

    Ok(Json(CurrentStepResponse {
        today,
        current: resolved,
    }))
}

async fn list_destinations(
    State(pool): State<PgPool>,
) -> Result<Json<Vec<Destination>>, AppError> {
    let all = destination_db::list_destinations(&pool)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(all))
}

async fn create_destination(
    State(pool): State<PgPool>,
    Json(body): Json<CreateDestinationRequest>,
) -> Result<(StatusCode, Json<Destination>), AppError> {
    let destination = destination_db::insert_destination(
        &pool,
        &body.name,
        body.latitude,
        body.longitude,
        body.address.as_deref(),
        body.category.as_deref(),
        body.description.as_deref(),
    )
    .await
    .map_err(AppError::internal)?;
    Ok((StatusCode::CREATED, Json(destination)))
}

async fn delete_destination(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let referencing = destination_db::count_referencing_steps(&pool, id)
        .await
        .map_err(AppError::internal)?;
    if referencing > 0 {
        return Err(AppError::conflict(format!(
            "destination {id} is referenced by {referencing} step(s)"
        )));
    }

    destination_db::delete_destination(&pool, id)
        .await
        .map_err(|err| {
            let message = format!("{err:#}");
            if message.contains("not found") {
                AppError::not_found(message)
            } else {
                AppError::internal(err)
            }
        })?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
