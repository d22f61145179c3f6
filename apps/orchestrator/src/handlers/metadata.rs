// INICIO DEL ARCHIVO [apps/orchestrator/src/handlers/metadata.rs]
/*!
 * =================================================================
 * APARATO: METADATA HANDLER (V10.4 - FOLD SURFACE)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: SUPERFICIE HTTP DEL PIPELINE DE METADATOS
 * =================================================================
 */

use crate::errors::{ApiError, ASSET_NOT_FOUND, INVALID_HASH, INVALID_REQUEST};
use crate::middleware::{require_identity, ClientIp};
use crate::services::{metadata_pipeline, preset_engine};
use crate::state::AppState;
use axum::{
    extract::{Extension, Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use stratavault_domain_authz::{ActionToken, OperationContext};
use stratavault_domain_models::{
    is_valid_content_hash, AuditAction, BatchMetadataOperation, CallerIdentity, MetadataOp,
};
use tracing::instrument;

// --- ESTRUCTURAS DE PETICIÓN ---

#[derive(Debug, Deserialize)]
pub struct SingleMetadataPayload {
    pub op: String,
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub processor: String,
    pub processor_version: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchMetadataPayload {
    pub operations: Vec<BatchMetadataOperation>,
    pub processor: String,
    pub processor_version: String,
}

#[derive(Debug, Deserialize)]
pub struct ApplyFromQueryPayload {
    pub query_preset: String,
    #[serde(default)]
    pub query_params: Option<serde_json::Value>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub op: String,
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub processor: String,
    pub processor_version: String,
}

pub struct MetadataHandler;

impl MetadataHandler {
    /**
     * Endpoint: GET /api/assets/:hash/metadata
     * Vista computada + log completo del activo.
     */
    pub async fn handle_get_metadata(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Path(asset_hash): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        if !is_valid_content_hash(&asset_hash) {
            return Err(ApiError::bad_request(INVALID_HASH, "hash must be 64 lowercase hex chars"));
        }

        let (store, _record) = core
            .topic_registry
            .locate_asset(&asset_hash)
            .await
            .map_err(ApiError::internal)?
            .ok_or_else(|| ApiError::not_found(ASSET_NOT_FOUND, "asset not found"))?;

        let computed = store.computed_metadata(&asset_hash).await.map_err(ApiError::internal)?;
        let log = store.metadata_log(&asset_hash).await.map_err(ApiError::internal)?;

        Ok(Json(json!({
            "hash": asset_hash,
            "topic": store.name,
            "computed_metadata": computed,
            "log": log,
        })))
    }

    /**
     * Endpoint: POST /api/assets/:hash/metadata
     */
    #[instrument(skip(application_state, caller_identity, payload))]
    pub async fn handle_apply_single(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Path(asset_hash): Path<String>,
        Json(payload): Json<SingleMetadataPayload>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
        core.auth_gate
            .authorize(&caller, ActionToken::Upload, OperationContext::default())
            .await?;

        if !is_valid_content_hash(&asset_hash) {
            return Err(ApiError::bad_request(INVALID_HASH, "hash must be 64 lowercase hex chars"));
        }
        let op = MetadataOp::parse(&payload.op).ok_or_else(|| {
            ApiError::bad_request(INVALID_REQUEST, "op must be 'set' or 'delete'")
        })?;

        let (topic_name, log_id) = metadata_pipeline::apply_single(
            &core.topic_registry,
            &core.limits,
            &asset_hash,
            op,
            &payload.key,
            &payload.value,
            &payload.processor,
            &payload.processor_version,
        )
        .await?;

        let _ = core
            .audit_trail
            .log(
                AuditAction::MetadataUpdate,
                &client_ip,
                &caller.username,
                json!({
                    "hash": asset_hash,
                    "topic_name": topic_name,
                    "op": payload.op,
                    "key": payload.key,
                    "processor": payload.processor,
                }),
            )
            .await;

        Ok(Json(json!({ "applied": true, "log_id": log_id, "topic": topic_name })))
    }

    /**
     * Endpoint: POST /api/metadata/batch
     */
    #[instrument(skip(application_state, caller_identity, payload))]
    pub async fn handle_apply_batch(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Json(payload): Json<BatchMetadataPayload>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
        core.auth_gate
            .authorize(&caller, ActionToken::Upload, OperationContext::default())
            .await?;

        let report = metadata_pipeline::apply_batch(
            &core.topic_registry,
            &core.limits,
            &payload.operations,
            &payload.processor,
            &payload.processor_version,
        )
        .await?;

        let _ = core
            .audit_trail
            .log(
                AuditAction::MetadataBatch,
                &client_ip,
                &caller.username,
                json!({
                    "operation_count": report.total,
                    "processor": payload.processor,
                    "succeeded": report.succeeded,
                    "failed": report.failed,
                }),
            )
            .await;

        Ok(Json(json!(report)))
    }

    /**
     * Endpoint: POST /api/metadata/apply — preset -> lote.
     */
    #[instrument(skip(application_state, caller_identity, payload))]
    pub async fn handle_apply_from_query(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Json(payload): Json<ApplyFromQueryPayload>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        // Autorización dual: mutación (upload) + lectura (query con preset).
        core.auth_gate
            .authorize(&caller, ActionToken::Upload, OperationContext::default())
            .await?;
        core.auth_gate
            .authorize(
                &caller,
                ActionToken::Query,
                OperationContext { preset: Some(&payload.query_preset), ..Default::default() },
            )
            .await?;

        let op = MetadataOp::parse(&payload.op).ok_or_else(|| {
            ApiError::bad_request(INVALID_REQUEST, "op must be 'set' or 'delete'")
        })?;
        let preset = preset_engine::resolve_or_fault(&core.preset_registry, &payload.query_preset)?
            .clone();

        let stores = if payload.topics.is_empty() {
            core.topic_registry.stores().await
        } else {
            let mut selected = Vec::new();
            for topic_name in &payload.topics {
                let store = core.topic_registry.get(topic_name).await.ok_or_else(|| {
                    ApiError::not_found(
                        crate::errors::TOPIC_NOT_FOUND,
                        format!("topic '{}' does not exist", topic_name),
                    )
                })?;
                selected.push(store);
            }
            selected
        };

        let query_params = payload.query_params.clone().unwrap_or(json!({}));
        let (report, matched_rows) = metadata_pipeline::apply_from_query(
            &core.topic_registry,
            &core.limits,
            stores,
            &payload.query_preset,
            &preset,
            &query_params,
            op,
            &payload.key,
            &payload.value,
            &payload.processor,
            &payload.processor_version,
        )
        .await?;

        let _ = core
            .audit_trail
            .log(
                AuditAction::MetadataApply,
                &client_ip,
                &caller.username,
                json!({
                    "query_preset": payload.query_preset,
                    "matched_rows": matched_rows,
                    "operation_count": report.total,
                    "processor": payload.processor,
                    "succeeded": report.succeeded,
                    "failed": report.failed,
                }),
            )
            .await;

        Ok(Json(json!({ "matched_rows": matched_rows, "report": report })))
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/handlers/metadata.rs]
