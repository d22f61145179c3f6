// INICIO DEL ARCHIVO [apps/orchestrator/src/handlers/download.rs]
/*!
 * =================================================================
 * APARATO: BULK DOWNLOAD HANDLER (V10.5 - DUAL SURFACE)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ZIP SÍNCRONO, SESIONES SSE Y ENTREGA SINGLE-USE
 * =================================================================
 */

use crate::errors::{ApiError, DOWNLOAD_SESSION_NOT_FOUND};
use crate::middleware::{require_identity, ClientIp};
use crate::services::bulk_download::BulkDownloadManager;
use crate::state::AppState;
use axum::{
    extract::{Extension, Path, Query, State},
    http::header,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    Json,
};
use futures::stream::Stream;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use stratavault_domain_authz::{ActionToken, OperationContext};
use stratavault_domain_models::{BulkDownloadRequest, CallerIdentity};
use tokio_stream::wrappers::ReceiverStream;
use tracing::instrument;

/// Parámetros del arranque SSE (GET, por query string).
#[derive(Debug, Deserialize, Default)]
pub struct StartSessionParams {
    pub mode: Option<String>,
    #[serde(default)]
    pub asset_ids: Option<String>,
    #[serde(default)]
    pub preset: Option<String>,
    /// Parámetros del preset como JSON codificado en la query.
    #[serde(default)]
    pub params: Option<String>,
    #[serde(default)]
    pub topics: Option<String>,
    #[serde(default)]
    pub include_metadata: Option<bool>,
    #[serde(default)]
    pub filename_format: Option<String>,
}

impl StartSessionParams {
    fn into_request(self) -> Result<BulkDownloadRequest, ApiError> {
        let parsed_params = match self.params {
            Some(raw) => Some(serde_json::from_str(&raw).map_err(|fault| {
                ApiError::bad_request(
                    crate::errors::INVALID_REQUEST,
                    format!("params must be JSON: {}", fault),
                )
            })?),
            None => None,
        };

        Ok(BulkDownloadRequest {
            mode: self.mode.unwrap_or_default(),
            preset: self.preset,
            params: parsed_params,
            topics: split_csv(self.topics),
            asset_ids: split_csv(self.asset_ids),
            include_metadata: self.include_metadata.unwrap_or(false),
            filename_format: self.filename_format,
        })
    }
}

fn split_csv(raw: Option<String>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

pub struct BulkDownloadHandler;

impl BulkDownloadHandler {
    /**
     * Endpoint: POST /api/download/bulk — ZIP directo en la respuesta.
     */
    #[instrument(skip(application_state, caller_identity, request))]
    pub async fn handle_synchronous(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Json(request): Json<BulkDownloadRequest>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
        core.auth_gate
            .authorize(&caller, ActionToken::Download, OperationContext::default())
            .await?;

        let mut resolution = BulkDownloadManager::resolve_selection(
            &core.topic_registry,
            &core.preset_registry,
            &request,
        )
        .await?;
        BulkDownloadManager::seal_offsets(&mut resolution, &core.index_repository).await?;

        let (zip_bytes, manifest) = BulkDownloadManager::assemble_in_memory(&resolution)?;

        core.auth_gate
            .consume_quota(&caller, ActionToken::Download, manifest.total_size as i64)
            .await?;
        let _ = core
            .audit_trail
            .log(
                stratavault_domain_models::AuditAction::BulkDownload,
                &client_ip,
                &caller.username,
                json!({
                    "mode": resolution.mode.as_str(),
                    "asset_count": manifest.asset_count,
                    "total_size": manifest.total_size,
                    "failed_assets": manifest.failed_assets.len(),
                    "synchronous": true,
                }),
            )
            .await;

        Ok((
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"assets.zip\"".to_string(),
                ),
            ],
            zip_bytes,
        ))
    }

    /**
     * Endpoint: GET /api/download/bulk/start — sesión asíncrona SSE.
     */
    #[instrument(skip(application_state, caller_identity, params))]
    pub async fn handle_start_session(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Query(params): Query<StartSessionParams>,
    ) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
        core.auth_gate
            .authorize(&caller, ActionToken::Download, OperationContext::default())
            .await?;

        let request = params.into_request()?;
        let mut resolution = BulkDownloadManager::resolve_selection(
            &core.topic_registry,
            &core.preset_registry,
            &request,
        )
        .await?;
        BulkDownloadManager::seal_offsets(&mut resolution, &core.index_repository).await?;

        let asset_total = resolution.assets.len();
        let (download_id, receiver) = core.download_manager.spawn_session(resolution);

        let _ = core
            .audit_trail
            .log(
                stratavault_domain_models::AuditAction::BulkDownload,
                &client_ip,
                &caller.username,
                json!({ "download_id": download_id, "asset_count": asset_total, "synchronous": false }),
            )
            .await;

        let event_stream = ReceiverStream::new(receiver).map(|(event_name, payload)| {
            Ok::<Event, Infallible>(Event::default().event(event_name).data(payload.to_string()))
        });
        Ok(Sse::new(event_stream).keep_alive(KeepAlive::default()))
    }

    /**
     * Endpoint: GET /api/download/bulk/:id — entrega single-use.
     */
    #[instrument(skip(application_state, caller_identity))]
    pub async fn handle_fetch_artifact(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Path(download_id): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
        core.auth_gate
            .authorize(&caller, ActionToken::Download, OperationContext::default())
            .await?;

        let artifact_path = core.download_manager.claim_artifact(&download_id).await?;
        let zip_bytes = tokio::fs::read(&artifact_path).await.map_err(|_| {
            ApiError::not_found(DOWNLOAD_SESSION_NOT_FOUND, "download artifact vanished")
        })?;

        // SINGLE USE: el artefacto se borra tras la lectura exitosa.
        let _ = tokio::fs::remove_file(&artifact_path).await;

        Ok((
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}.zip\"", download_id),
                ),
            ],
            zip_bytes,
        ))
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/handlers/download.rs]
