// INICIO DEL ARCHIVO [apps/orchestrator/src/handlers/topics.rs]
/*!
 * =================================================================
 * APARATO: TOPIC GOVERNANCE HANDLER (V10.3 - PARTITION CONTROL)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: LISTADO, FORJA, DETALLE, STATS Y REMOCIÓN DE TÓPICOS
 * =================================================================
 */

use crate::errors::{ApiError, INVALID_REQUEST, TOPIC_ALREADY_EXISTS, TOPIC_NOT_FOUND};
use crate::middleware::{require_identity, ClientIp};
use crate::services::reconciliation;
use crate::state::AppState;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use stratavault_domain_authz::{ActionToken, OperationContext};
use stratavault_domain_models::{validate_topic_name, AuditAction, CallerIdentity, TopicSummary};
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct CreateTopicPayload {
    pub name: String,
}

pub struct TopicGovernanceHandler;

impl TopicGovernanceHandler {
    /**
     * Endpoint: GET /api/topics — listado con resumen de stats.
     */
    pub async fn handle_list_topics(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        let mut summaries = Vec::new();
        for store in core.topic_registry.stores().await {
            let stats = store.read_stats().await.ok().flatten().unwrap_or_default();
            summaries.push(TopicSummary {
                name: store.name.clone(),
                file_count: stats.file_count,
                total_size_bytes: stats.total_size_bytes,
                last_upload_at: stats.last_upload_at,
            });
        }
        Ok(Json(json!({ "topics": summaries })))
    }

    /**
     * Endpoint: POST /api/topics (manage_topics)
     */
    #[instrument(skip(application_state, caller_identity, payload))]
    pub async fn handle_create_topic(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Json(payload): Json<CreateTopicPayload>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
        core.auth_gate
            .authorize(&caller, ActionToken::ManageTopics, OperationContext::default())
            .await?;

        if !validate_topic_name(&payload.name) {
            return Err(ApiError::bad_request(
                INVALID_REQUEST,
                "topic name must match ^[a-z0-9_-]{1,255}$",
            ));
        }

        let created = core
            .topic_registry
            .create(&payload.name)
            .await
            .map_err(ApiError::internal)?;
        if created.is_none() {
            return Err(ApiError::conflict(
                TOPIC_ALREADY_EXISTS,
                format!("topic '{}' already exists", payload.name),
            ));
        }

        let _ = core
            .audit_trail
            .log(
                AuditAction::TopicCreated,
                &client_ip,
                &caller.username,
                json!({ "topic_name": payload.name }),
            )
            .await;

        Ok((StatusCode::CREATED, Json(json!({ "topic": payload.name, "created": true }))))
    }

    /**
     * Endpoint: GET /api/topics/:name — detalle.
     */
    pub async fn handle_topic_detail(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Path(topic_name): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        let store = core.topic_registry.get(&topic_name).await.ok_or_else(|| {
            ApiError::not_found(TOPIC_NOT_FOUND, format!("topic '{}' does not exist", topic_name))
        })?;

        let stats = store.read_stats().await.ok().flatten().unwrap_or_default();
        let cursor = store.cursor_snapshot().await;
        Ok(Json(json!({
            "topic": store.name,
            "stats": stats,
            "active_segment": cursor.segment_name(),
        })))
    }

    /**
     * Endpoint: GET /api/topics/:name/stats — caché recomputada.
     */
    pub async fn handle_topic_stats(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Path(topic_name): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        let store = core.topic_registry.get(&topic_name).await.ok_or_else(|| {
            ApiError::not_found(TOPIC_NOT_FOUND, format!("topic '{}' does not exist", topic_name))
        })?;

        let stats = store.refresh_stats().await.map_err(ApiError::internal)?;
        Ok(Json(json!({ "topic": topic_name, "stats": stats })))
    }

    /**
     * Endpoint: DELETE /api/topics/:name (manage_topics)
     * Remoción de tópico completo: registro, disco e índice.
     */
    #[instrument(skip(application_state, caller_identity))]
    pub async fn handle_remove_topic(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Path(topic_name): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
        core.auth_gate
            .authorize(&caller, ActionToken::ManageTopics, OperationContext::default())
            .await?;

        let removed = core
            .topic_registry
            .remove(&topic_name)
            .await
            .map_err(ApiError::internal)?;
        if !removed {
            return Err(ApiError::not_found(
                TOPIC_NOT_FOUND,
                format!("topic '{}' does not exist", topic_name),
            ));
        }

        let purged_entries = core.index_repository.purge_topic(&topic_name).await?;

        let _ = core
            .audit_trail
            .log(
                AuditAction::TopicRemoved,
                &client_ip,
                &caller.username,
                json!({ "topic_name": topic_name, "entries_purged": purged_entries }),
            )
            .await;

        // La reconciliación posterior es un no-op sobre este estado.
        let _ = reconciliation::reconcile(&core).await;

        Ok(Json(json!({ "removed": true, "entries_purged": purged_entries })))
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/handlers/topics.rs]
