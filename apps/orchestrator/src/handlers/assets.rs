// INICIO DEL ARCHIVO [apps/orchestrator/src/handlers/assets.rs]
/*!
 * =================================================================
 * APARATO: ASSET GATEWAY HANDLER (V10.5 - CONTENT ADDRESSED)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: INGESTA MULTIPART, DESCARGA Y DETALLE DE ACTIVOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DEDUP RECEIPT: La ingesta devuelve {hash, skipped}; re-subir el
 *    mismo payload es un no-op certificado.
 * 2. DISPOSITION SHIELD: El nombre servido jamás porta '/', '\',
 *    '..' ni bytes de control.
 * 3. DUAL UPDATE: Todo put consuma catálogo + índice del orquestador
 *    y emite el evento de auditoría adding_file.
 * =================================================================
 */

use crate::errors::{ApiError, ASSET_NOT_FOUND, ASSET_TOO_LARGE, INVALID_HASH, INVALID_REQUEST, TOPIC_NOT_FOUND};
use crate::middleware::{require_identity, ClientIp};
use crate::services::naming::{sanitize_filename, split_upload_filename};
use crate::state::AppState;
use axum::{
    extract::{Extension, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use stratavault_domain_authz::{ActionToken, OperationContext};
use stratavault_domain_models::{is_valid_content_hash, AssetLocation, AuditAction, CallerIdentity};
use tracing::instrument;

pub struct AssetGatewayHandler;

impl AssetGatewayHandler {
    /**
     * Endpoint: POST /api/topics/:name/assets (multipart: file, parent_id?)
     */
    #[instrument(skip(application_state, caller_identity, multipart))]
    pub async fn handle_upload(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Path(topic_name): Path<String>,
        mut multipart: Multipart,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        let store = core.topic_registry.get(&topic_name).await.ok_or_else(|| {
            ApiError::not_found(TOPIC_NOT_FOUND, format!("topic '{}' does not exist", topic_name))
        })?;

        // 1. EXTRACCIÓN MULTIPART (campos file y parent_id)
        let mut payload: Option<Vec<u8>> = None;
        let mut uploaded_filename = String::new();
        let mut parent_hash: Option<String> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|fault| ApiError::bad_request(INVALID_REQUEST, fault.to_string()))?
        {
            let field_name = field.name().unwrap_or_default().to_string();
            match field_name.as_str() {
                "file" => {
                    uploaded_filename = field.file_name().unwrap_or("asset").to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|fault| ApiError::bad_request(INVALID_REQUEST, fault.to_string()))?;
                    payload = Some(bytes.to_vec());
                }
                "parent_id" => {
                    let raw = field
                        .text()
                        .await
                        .map_err(|fault| ApiError::bad_request(INVALID_REQUEST, fault.to_string()))?;
                    if !raw.is_empty() {
                        if !is_valid_content_hash(&raw) {
                            return Err(ApiError::bad_request(
                                INVALID_HASH,
                                "parent_id must be a 64-char lowercase hex hash",
                            ));
                        }
                        parent_hash = Some(raw);
                    }
                }
                _ => {}
            }
        }

        let payload = payload.ok_or_else(|| {
            ApiError::bad_request(INVALID_REQUEST, "multipart field 'file' is required")
        })?;
        let (origin_name, extension) = split_upload_filename(&uploaded_filename);

        // 2. VALLA DE CAPACIDAD FÍSICA (413 antes de autorizar cuotas)
        if store.payload_exceeds_capacity(payload.len() as u64) {
            return Err(ApiError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                ASSET_TOO_LARGE,
                "payload exceeds the maximum segment capacity",
            ));
        }

        // 3. AUTORIZACIÓN CON CONSTRAINTS Y FRONTERA DE CUOTA
        core.auth_gate
            .authorize(
                &caller,
                ActionToken::Upload,
                OperationContext {
                    topic: Some(&topic_name),
                    extension: Some(&extension),
                    payload_size: Some(payload.len() as u64),
                    preset: None,
                },
            )
            .await?;

        // 4. PUT + DUAL UPDATE
        let outcome = store
            .put_asset(&payload, &extension, &origin_name, parent_hash)
            .await
            .map_err(|fault| match fault {
                crate::services::topic_store::StoreError::Segment(segment_fault) => {
                    segment_fault.into()
                }
                other => ApiError::internal(other),
            })?;

        if !outcome.receipt.skipped {
            core.index_repository
                .index_asset(&AssetLocation {
                    hash: outcome.receipt.hash.clone(),
                    topic: topic_name.clone(),
                    dat_file: outcome.receipt.dat_file.clone(),
                    offset: outcome.payload_offset,
                    size: outcome.receipt.size,
                })
                .await?;
        }

        // 5. CUOTA (solo tras éxito) + AUDITORÍA
        core.auth_gate
            .consume_quota(&caller, ActionToken::Upload, outcome.receipt.size as i64)
            .await?;

        let _ = core
            .audit_trail
            .log(
                AuditAction::AddingFile,
                &client_ip,
                &caller.username,
                json!({
                    "hash": outcome.receipt.hash,
                    "filename": sanitize_filename(&uploaded_filename),
                    "topic_name": topic_name,
                    "size": outcome.receipt.size,
                    "skipped": outcome.receipt.skipped,
                }),
            )
            .await;

        Ok((StatusCode::OK, Json(json!(outcome.receipt))))
    }

    /**
     * Endpoint: GET /api/assets/:hash/download
     * Localiza vía índice del orquestador y sirve el payload exacto.
     */
    #[instrument(skip(application_state, caller_identity))]
    pub async fn handle_download(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Path(asset_hash): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        if !is_valid_content_hash(&asset_hash) {
            return Err(ApiError::bad_request(INVALID_HASH, "hash must be 64 lowercase hex chars"));
        }

        core.auth_gate
            .authorize(&caller, ActionToken::Download, OperationContext::default())
            .await?;

        let location = core
            .index_repository
            .locate(&asset_hash)
            .await?
            .ok_or_else(|| ApiError::not_found(ASSET_NOT_FOUND, "asset not found"))?;

        let store = core.topic_registry.get(&location.topic).await.ok_or_else(|| {
            ApiError::not_found(ASSET_NOT_FOUND, "asset topic is no longer mounted")
        })?;
        let record = store
            .get_asset(&asset_hash)
            .await
            .map_err(ApiError::internal)?
            .ok_or_else(|| ApiError::not_found(ASSET_NOT_FOUND, "asset not found"))?;

        let payload = store
            .read_asset_payload(&record, location.offset)
            .await
            .map_err(ApiError::internal)?;

        // CUOTA + AUDITORÍA
        core.auth_gate
            .consume_quota(&caller, ActionToken::Download, payload.len() as i64)
            .await?;
        let _ = core
            .audit_trail
            .log(
                AuditAction::DownloadFile,
                &client_ip,
                &caller.username,
                json!({ "hash": asset_hash, "topic_name": location.topic, "size": payload.len() }),
            )
            .await;

        let safe_filename = sanitize_filename(&record.display_filename());
        Ok((
            [
                (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", safe_filename),
                ),
            ],
            payload,
        ))
    }

    /**
     * Endpoint: GET /api/assets/:hash — detalle + metadatos + ubicaciones.
     */
    pub async fn handle_asset_detail(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Path(asset_hash): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        if !is_valid_content_hash(&asset_hash) {
            return Err(ApiError::bad_request(INVALID_HASH, "hash must be 64 lowercase hex chars"));
        }

        let locations = core.index_repository.locate_all(&asset_hash).await?;
        let Some(primary_location) = locations.first() else {
            return Err(ApiError::not_found(ASSET_NOT_FOUND, "asset not found"));
        };

        let store = core
            .topic_registry
            .get(&primary_location.topic)
            .await
            .ok_or_else(|| ApiError::not_found(ASSET_NOT_FOUND, "asset topic is no longer mounted"))?;
        let record = store
            .get_asset(&asset_hash)
            .await
            .map_err(ApiError::internal)?
            .ok_or_else(|| ApiError::not_found(ASSET_NOT_FOUND, "asset not found"))?;
        let computed_metadata = store
            .computed_metadata(&asset_hash)
            .await
            .map_err(ApiError::internal)?;

        Ok(Json(json!({
            "asset": record,
            "topic": primary_location.topic,
            "computed_metadata": computed_metadata,
            "locations": locations,
        })))
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/handlers/assets.rs]
