//! HTTP handlers for the PMS Bridge Service
//!
//! Thin glue over the feed pipeline and the tenant store. Errors are rendered by
//! [`BridgeError`]'s `IntoResponse` implementation.

use crate::error::{BridgeError, BridgeResult};
use crate::models::{
    DeployRequest, DeployResponse, DeploymentManifest, FeedRequest, FeedResponse, SchemaKind,
    Stats, TenantCode, TenantConfig, TestTranslationRequest, TestTranslationResponse,
};
use crate::service::AppState;
use crate::validation::compile_schema;
use crate::HealthStatus;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Create all routes for the PMS bridge service
pub fn create_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Feed intake
        .route("/api/pms/:code", post(submit_feed))
        .route("/api/pms/:code/test", post(test_translation))
        .route("/api/pms/:code/stats", get(tenant_stats))
        // Onboarding and management
        .route("/api/deployment/deploy", post(deploy))
        .route("/api/mapping", get(list_integrations))
        .route(
            "/api/mapping/:code",
            get(get_integration)
                .put(update_integration)
                .delete(delete_integration),
        )
        .route("/api/mapping/:code/config", get(tenant_config))
        .route("/api/mapping/:code/schema/:kind", put(upload_schema))
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Health check requested");

    let storage_ok = tokio::fs::try_exists(state.store.root())
        .await
        .unwrap_or(false);

    let health = HealthStatus::healthy()
        .with_translators(state.processor.registry().codes())
        .with_uptime(state.started_at.elapsed())
        .with_check("storage", storage_ok);

    (StatusCode::OK, Json(health))
}

/// Submit a PMS feed for translation and delivery
///
/// The pipeline runs on its own task: a request dropped by the timeout layer or a
/// client disconnect does not cancel delivery retries or stats recording.
async fn submit_feed(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    payload: Result<Json<FeedRequest>, JsonRejection>,
) -> BridgeResult<Json<FeedResponse>> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let error = BridgeError::validation("feedData", rejection.body_text());
            return Err(state.processor.reject(&code, error).await);
        }
    };

    let task = tokio::spawn(async move {
        state.processor.process(&code, &request.feed_data).await
    });
    let response = task
        .await
        .map_err(|e| BridgeError::internal(format!("Feed processing task failed: {}", e)))??;
    Ok(Json(response))
}

/// Translate a sample feed without delivering it
async fn test_translation(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(request): Json<TestTranslationRequest>,
) -> BridgeResult<Json<TestTranslationResponse>> {
    let response = state.processor.preview(&code, &request.test_data).await?;
    Ok(Json(response))
}

async fn tenant_stats(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> BridgeResult<Json<Stats>> {
    let code = TenantCode::parse(&code)?;
    Ok(Json(state.processor.stats().snapshot(&code).await?))
}

/// Deploy a mapping set for a tenant
async fn deploy(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeployRequest>,
) -> BridgeResult<Json<DeployResponse>> {
    if request.pms_code.trim().is_empty() {
        return Err(BridgeError::validation("pmsCode", "PMS code is required"));
    }

    let manifest = state.store.deploy(&request).await?;

    Ok(Json(DeployResponse {
        success: true,
        message: format!("Integration for {} deployed successfully", manifest.pms_code),
        deployment_id: manifest.deployment_id,
        endpoint: manifest.endpoint,
        status: manifest.status,
        timestamp: Utc::now(),
    }))
}

async fn list_integrations(
    State(state): State<Arc<AppState>>,
) -> BridgeResult<Json<Vec<DeploymentManifest>>> {
    Ok(Json(state.store.list_manifests().await?))
}

async fn get_integration(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> BridgeResult<Json<DeploymentManifest>> {
    let code = TenantCode::parse(&code)?;
    Ok(Json(state.store.get_manifest(&code).await?))
}

/// Replace a tenant's manifest
async fn update_integration(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(manifest): Json<DeploymentManifest>,
) -> BridgeResult<Json<DeploymentManifest>> {
    let code = TenantCode::parse(&code)?;
    if manifest.pms_code != code.as_str() {
        return Err(BridgeError::validation(
            "pmsCode",
            format!(
                "Manifest code '{}' does not match path code '{}'",
                manifest.pms_code, code
            ),
        ));
    }

    state.store.update_manifest(&code, &manifest).await?;
    Ok(Json(manifest))
}

/// Remove a tenant and everything stored for it
async fn delete_integration(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> BridgeResult<Json<Value>> {
    let code = TenantCode::parse(&code)?;
    state.store.delete_tenant(&code).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("PMS integration '{}' deleted.", code)
    })))
}

async fn tenant_config(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> BridgeResult<Json<TenantConfig>> {
    let code = TenantCode::parse(&code)?;
    Ok(Json(state.store.load_config(&code).await?))
}

/// Store a JSON Schema or XSD for a tenant; the body is the raw schema text
async fn upload_schema(
    State(state): State<Arc<AppState>>,
    Path((code, kind)): Path<(String, String)>,
    schema: String,
) -> BridgeResult<Json<Value>> {
    let code = TenantCode::parse(&code)?;
    let kind = SchemaKind::parse(&kind)?;

    compile_schema(kind, &schema).map_err(|e| BridgeError::validation("schema", e))?;
    state.store.save_schema(&code, kind, &schema).await?;
    info!(tenant_code = %code, file = kind.file_name(), "Tenant schema replaced");

    Ok(Json(json!({
        "success": true,
        "message": format!("Stored {} for PMS integration '{}'.", kind.file_name(), code)
    })))
}
