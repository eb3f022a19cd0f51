use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use mealmate_core::catalog::{RecipeCatalog, StaticCatalog};
use mealmate_core::export::{ExportError, ExportFormat, export_meal_plan, render_plan_html};
use mealmate_core::plan::{PlanNotFound, get_meal_plan_with_meals};
use mealmate_core::selector::PlanSummary;
use mealmate_core::share::service::open_shared_plan;
use mealmate_core::share::{ShareConfig, ShareError};
use mealmate_core::shopping::ShoppingProgress;
use mealmate_core::shopping::service::get_shopping_list;
use mealmate_db::models::{Meal, MealPlan, ShoppingList};
use mealmate_db::queries::meal_plans;

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

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }

    /// Map a service error, turning missing plans and bad share tokens
    /// into 404s.
    pub fn from_service(err: anyhow::Error) -> Self {
        if let Some(e) = err.downcast_ref::<PlanNotFound>() {
            return Self::not_found(e.to_string());
        }
        if err.downcast_ref::<ShareError>().is_some() {
            return Self::not_found("share link is invalid");
        }
        Self::internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        }
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State and response types
// ---------------------------------------------------------------------------

/// Shared handler state. The server acts as a single configured user.
#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    user_id: Uuid,
    catalog: Arc<StaticCatalog>,
    share: Arc<ShareConfig>,
}

impl AppState {
    pub fn new(pool: PgPool, user_id: Uuid, catalog: StaticCatalog, share: ShareConfig) -> Self {
        Self {
            pool,
            user_id,
            catalog: Arc::new(catalog),
            share: Arc::new(share),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanDetailResponse {
    #[serde(flatten)]
    pub plan: MealPlan,
    pub meals: Vec<Meal>,
    pub summary: PlanSummary,
}

#[derive(Debug, Serialize)]
pub struct ShoppingListResponse {
    #[serde(flatten)]
    pub list: ShoppingList,
    pub progress: ShoppingProgress,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/recipes", get(list_recipes))
        .route("/api/plans", get(list_plans))
        .route("/api/plans/{id}", get(get_plan_detail))
        .route("/api/plans/{id}/shopping-list", get(get_plan_shopping_list))
        .route("/api/plans/{id}/export", get(export_plan))
        .route("/shared/meal-plan/{token}", get(shared_plan_page))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("mealmate serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("mealmate serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_recipes(State(state): State<AppState>) -> axum::response::Response {
    Json(state.catalog.recipes()).into_response()
}

async fn list_plans(State(state): State<AppState>) -> Result<axum::response::Response, AppError> {
    let plans = meal_plans::list_meal_plans_for_user(&state.pool, state.user_id)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(plans).into_response())
}

async fn get_plan_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let found = get_meal_plan_with_meals(&state.pool, state.user_id, id)
        .await
        .map_err(AppError::from_service)?;

    let summary = PlanSummary::from_meals(&found.meals, None);
    Ok(Json(PlanDetailResponse {
        plan: found.plan,
        meals: found.meals,
        summary,
    })
    .into_response())
}

async fn get_plan_shopping_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let list = get_shopping_list(&state.pool, state.user_id, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("no shopping list for plan {id}")))?;

    let progress = ShoppingProgress::of(&list.items.0);
    Ok(Json(ShoppingListResponse { list, progress }).into_response())
}

async fn export_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<axum::response::Response, AppError> {
    let format: ExportFormat = match query.format.as_deref() {
        None => ExportFormat::Csv,
        Some(raw) => raw
            .parse()
            .map_err(|e: mealmate_db::models::ParseEnumError| AppError::bad_request(e.to_string()))?,
    };

    let found = get_meal_plan_with_meals(&state.pool, state.user_id, id)
        .await
        .map_err(AppError::from_service)?;

    let artifact = export_meal_plan(&found.plan, &found.meals, format).map_err(|e| match e {
        ExportError::PdfUnsupported => AppError::bad_request(e.to_string()),
        other => AppError::internal(other.into()),
    })?;

    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.body,
    )
        .into_response())
}

async fn shared_plan_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let found = open_shared_plan(&state.pool, &state.share, &token)
        .await
        .map_err(AppError::from_service)?
        .ok_or_else(|| AppError::not_found("this meal plan is no longer available"))?;

    let page = render_plan_html(&found.plan, &found.meals);
    Ok(Html(page.into_string()).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
