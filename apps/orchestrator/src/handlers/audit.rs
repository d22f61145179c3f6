// INICIO DEL ARCHIVO [apps/orchestrator/src/handlers/audit.rs]
/*!
 * =================================================================
 * APARATO: AUDIT SURFACE HANDLER (V10.4 - TRAIL + SSE)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CONSULTA PAGINADA, STREAM SSE Y ACCIONES DEL RASTRO
 *
 * # Contrato de visibilidad:
 * can_view_all=false (u omitido) reescribe transparentemente cualquier
 * filtro distinto de 'me' hacia 'me'; can_stream=false veta el stream.
 * =================================================================
 */

use crate::errors::{ApiError, AUDIT_INVALID_ACTION, INVALID_REQUEST};
use crate::middleware::{require_identity, ClientIp};
use crate::state::AppState;
use axum::{
    extract::{Extension, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    Json,
};
use futures::stream::Stream;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use stratavault_domain_models::{AuditAction, AuditScopeFilter, CallerIdentity};
use stratavault_infra_db::repositories::audit_repository::AuditQuery;
use tokio_stream::wrappers::ReceiverStream;
use tracing::instrument;

#[derive(Debug, Deserialize, Default)]
pub struct AuditQueryParams {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub since: Option<i64>,
    #[serde(default)]
    pub until: Option<i64>,
}

pub struct AuditSurfaceHandler;

impl AuditSurfaceHandler {
    /**
     * Endpoint: GET /api/audit
     */
    #[instrument(skip(application_state, caller_identity, params))]
    pub async fn handle_query(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Query(params): Query<AuditQueryParams>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
        let visibility = core.auth_gate.effective_view_audit(&caller).await?;

        // 1. VALIDACIÓN DE ACCIÓN Y FILTRO (400 en token ajeno)
        if let Some(action_token) = &params.action {
            if AuditAction::parse(action_token).is_none() {
                return Err(ApiError::bad_request(
                    AUDIT_INVALID_ACTION,
                    format!("unknown audit action '{}'", action_token),
                ));
            }
        }
        let requested_scope = AuditScopeFilter::parse(params.filter.as_deref().unwrap_or(""))
            .ok_or_else(|| {
                ApiError::bad_request(INVALID_REQUEST, "filter must be '', 'me' or 'others'")
            })?;

        // 2. REESCRITURA TRANSPARENTE DE VISIBILIDAD
        let effective_scope = if visibility.can_view_all {
            requested_scope
        } else {
            AuditScopeFilter::Me
        };
        let username_filter = if visibility.can_view_all { params.username.clone() } else { None };

        let filter = AuditQuery {
            limit: params.limit.unwrap_or(100).clamp(1, 1_000),
            offset: params.offset.unwrap_or(0).max(0),
            action: params.action.clone(),
            scope: effective_scope,
            caller_username: caller.username.clone(),
            username: username_filter,
            since: params.since,
            until: params.until,
        };

        let entries = core.audit_trail.query(&filter).await?;
        Ok(Json(json!({
            "entries": entries,
            "limit": filter.limit,
            "offset": filter.offset,
        })))
    }

    /**
     * Endpoint: GET /api/audit/actions — enumeración cerrada.
     */
    pub async fn handle_actions(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
    ) -> Result<impl IntoResponse, ApiError> {
        application_state.require_core().await?;
        require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        let actions: Vec<&str> = AuditAction::ALL.iter().map(|action| action.as_str()).collect();
        Ok(Json(json!({ "actions": actions })))
    }

    /**
     * Endpoint: GET /api/audit/stream (SSE)
     * Primer evento: {type:"connected", data:{client_ip}}. Los
     * siguientes espejan cada fila anexada como {type:action, data:row}.
     */
    #[instrument(skip(application_state, caller_identity))]
    pub async fn handle_stream(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
    ) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        let visibility = core.auth_gate.effective_view_audit(&caller).await?;
        if !visibility.can_stream {
            return Err(ApiError::forbidden("audit streaming is not permitted by the grant"));
        }

        let (_subscriber, receiver) = core.audit_trail.subscribe();

        let connected_event = futures::stream::once(async move {
            Ok::<Event, Infallible>(Event::default().data(
                json!({ "type": "connected", "data": { "client_ip": client_ip } }).to_string(),
            ))
        });

        let trail_events = ReceiverStream::new(receiver).map(|entry| {
            Ok::<Event, Infallible>(Event::default().data(
                json!({ "type": entry.action, "data": entry }).to_string(),
            ))
        });

        Ok(Sse::new(connected_event.chain(trail_events)).keep_alive(KeepAlive::default()))
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/handlers/audit.rs]
