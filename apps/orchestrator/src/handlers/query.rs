// INICIO DEL ARCHIVO [apps/orchestrator/src/handlers/query.rs]
/*!
 * =================================================================
 * APARATO: QUERY SURFACE HANDLER (V10.2 - PRESET FANOUT)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: EJECUCIÓN DE PRESETS SQL MULTI-TÓPICO
 * =================================================================
 */

use crate::errors::{ApiError, TOPIC_NOT_FOUND};
use crate::middleware::{require_identity, ClientIp};
use crate::services::preset_engine;
use crate::state::AppState;
use axum::{
    extract::{Extension, Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use stratavault_domain_authz::{ActionToken, OperationContext};
use stratavault_domain_models::{AuditAction, CallerIdentity};
use tracing::instrument;

#[derive(Debug, Deserialize, Default)]
pub struct QueryExecutionPayload {
    #[serde(default)]
    pub params: Option<serde_json::Value>,
    /// Lista vacía = todos los tópicos sanos.
    #[serde(default)]
    pub topics: Vec<String>,
}

pub struct QuerySurfaceHandler;

impl QuerySurfaceHandler {
    /**
     * Endpoint: GET /api/query — presets disponibles y sus parámetros.
     */
    pub async fn handle_list_presets(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        let listing: Vec<_> = core
            .preset_registry
            .list()
            .into_iter()
            .map(|(name, definition)| {
                json!({
                    "name": name,
                    "description": definition.description,
                    "parameters": definition.parameters,
                })
            })
            .collect();
        Ok(Json(json!({ "presets": listing })))
    }

    /**
     * Endpoint: POST /api/query/:preset
     */
    #[instrument(skip(application_state, caller_identity, payload))]
    pub async fn handle_execute_preset(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Path(preset_name): Path<String>,
        payload: Option<Json<QueryExecutionPayload>>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        core.auth_gate
            .authorize(
                &caller,
                ActionToken::Query,
                OperationContext { preset: Some(&preset_name), ..Default::default() },
            )
            .await?;

        let preset = preset_engine::resolve_or_fault(&core.preset_registry, &preset_name)?.clone();
        let request = payload.map(|Json(body)| body).unwrap_or_default();

        // Selección de tópicos (vacío = todos, orden lexicográfico).
        let stores = if request.topics.is_empty() {
            core.topic_registry.stores().await
        } else {
            let mut selected = Vec::new();
            for topic_name in &request.topics {
                let store = core.topic_registry.get(topic_name).await.ok_or_else(|| {
                    ApiError::not_found(
                        TOPIC_NOT_FOUND,
                        format!("topic '{}' does not exist", topic_name),
                    )
                })?;
                selected.push(store);
            }
            selected
        };

        let params = request.params.unwrap_or(json!({}));
        let report =
            preset_engine::execute_fanout(stores, &preset_name, &preset, &params).await?;

        let _ = core
            .audit_trail
            .log(
                AuditAction::QueryPreset,
                &client_ip,
                &caller.username,
                json!({ "preset": preset_name, "row_count": report.row_count }),
            )
            .await;

        Ok(Json(json!(report)))
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/handlers/query.rs]
