// INICIO DEL ARCHIVO [apps/orchestrator/src/handlers/schema.rs]
/*!
 * =================================================================
 * APARATO: SELF-DESCRIPTION HANDLER (V10.2 - API SCHEMA + PROMPTS)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: API AUTODESCRIPTIVA Y PLANTILLAS DE PROMPTS
 * =================================================================
 */

use crate::errors::{ApiError, INVALID_REQUEST};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde_json::json;

/// Plantillas de prompt embebidas; `{{base_url}}` se renderiza por petición.
const PROMPT_TEMPLATES: &[(&str, &str)] = &[
    (
        "upload_guide",
        "Upload binary assets to {{base_url}}/api/topics/<topic>/assets as \
multipart form-data with a 'file' field (optional 'parent_id' hash). Every asset \
is content-addressed: the response carries its SHA-256 hash and a dedup 'skipped' flag.",
    ),
    (
        "query_guide",
        "Run parameterised SQL presets with POST {{base_url}}/api/query/<preset>. \
Body: {\"params\": {...}, \"topics\": []}. An empty topics list fans out across \
every topic. Discover presets with GET {{base_url}}/api/query.",
    ),
    (
        "bulk_download_guide",
        "Stream a ZIP of many assets: POST {{base_url}}/api/download/bulk with \
{\"mode\":\"ids\",\"asset_ids\":[...]} or mode 'query' plus a preset. For large \
sets use GET {{base_url}}/api/download/bulk/start for an SSE-driven session and \
fetch the staged artifact once from the URL in the 'complete' event.",
    ),
];

pub struct SelfDescriptionHandler;

impl SelfDescriptionHandler {
    /**
     * Endpoint: GET /api/schema — mapa autodescriptivo de la API.
     */
    pub async fn handle_schema(State(_application_state): State<AppState>) -> impl IntoResponse {
        Json(json!({
            "service": "stratavault",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": [
                { "method": "GET",    "path": "/api/auth/status",            "auth": "public" },
                { "method": "POST",   "path": "/api/config",                 "auth": "open-once / manage_config" },
                { "method": "POST",   "path": "/api/auth/login",             "auth": "public" },
                { "method": "POST",   "path": "/api/auth/logout",            "auth": "session" },
                { "method": "GET",    "path": "/api/auth/me",                "auth": "any" },
                { "method": "GET",    "path": "/api/auth/me/quota",          "auth": "any" },
                { "method": "GET",    "path": "/api/auth/users",             "auth": "manage_users" },
                { "method": "POST",   "path": "/api/auth/users",             "auth": "manage_users" },
                { "method": "GET",    "path": "/api/auth/users/:id",         "auth": "manage_users|self" },
                { "method": "PATCH",  "path": "/api/auth/users/:id",         "auth": "manage_users" },
                { "method": "DELETE", "path": "/api/auth/users/:id",         "auth": "manage_users" },
                { "method": "POST",   "path": "/api/auth/users/:id/api-key", "auth": "manage_users|self" },
                { "method": "GET",    "path": "/api/auth/users/:id/quota",   "auth": "manage_users|self" },
                { "method": "GET",    "path": "/api/auth/users/:id/grants",  "auth": "manage_grants" },
                { "method": "POST",   "path": "/api/auth/users/:id/grants",  "auth": "manage_grants" },
                { "method": "GET",    "path": "/api/auth/grants/:id",        "auth": "manage_grants" },
                { "method": "DELETE", "path": "/api/auth/grants/:id",        "auth": "manage_grants" },
                { "method": "GET",    "path": "/api/topics",                 "auth": "any" },
                { "method": "POST",   "path": "/api/topics",                 "auth": "manage_topics" },
                { "method": "GET",    "path": "/api/topics/:name",           "auth": "any" },
                { "method": "GET",    "path": "/api/topics/:name/stats",     "auth": "any" },
                { "method": "DELETE", "path": "/api/topics/:name",           "auth": "manage_topics" },
                { "method": "POST",   "path": "/api/topics/:name/assets",    "auth": "upload" },
                { "method": "GET",    "path": "/api/assets/:hash",           "auth": "any" },
                { "method": "GET",    "path": "/api/assets/:hash/download",  "auth": "download" },
                { "method": "GET",    "path": "/api/assets/:hash/metadata",  "auth": "any" },
                { "method": "POST",   "path": "/api/assets/:hash/metadata",  "auth": "upload" },
                { "method": "POST",   "path": "/api/metadata/batch",         "auth": "upload" },
                { "method": "POST",   "path": "/api/metadata/apply",         "auth": "upload+query" },
                { "method": "GET",    "path": "/api/query",                  "auth": "any" },
                { "method": "POST",   "path": "/api/query/:preset",          "auth": "query" },
                { "method": "GET",    "path": "/api/audit",                  "auth": "view_audit" },
                { "method": "GET",    "path": "/api/audit/stream",           "auth": "view_audit(can_stream)" },
                { "method": "GET",    "path": "/api/audit/actions",          "auth": "any" },
                { "method": "GET",    "path": "/api/verify",                 "auth": "manage_topics" },
                { "method": "POST",   "path": "/api/download/bulk",          "auth": "download" },
                { "method": "GET",    "path": "/api/download/bulk/start",    "auth": "download" },
                { "method": "GET",    "path": "/api/download/bulk/:id",      "auth": "download" },
                { "method": "GET",    "path": "/api/monitoring",             "auth": "any" },
                { "method": "GET",    "path": "/api/monitoring/logs/:level/:filename", "auth": "any" },
                { "method": "GET",    "path": "/api/schema",                 "auth": "public" },
                { "method": "GET",    "path": "/api/prompts",                "auth": "public" },
                { "method": "GET",    "path": "/api/prompts/:name",          "auth": "public" },
            ],
        }))
    }

    /**
     * Endpoint: GET /api/prompts — nombres disponibles.
     */
    pub async fn handle_list_prompts(State(_application_state): State<AppState>) -> impl IntoResponse {
        let names: Vec<&str> = PROMPT_TEMPLATES.iter().map(|(name, _)| *name).collect();
        Json(json!({ "prompts": names }))
    }

    /**
     * Endpoint: GET /api/prompts/:name — plantilla con base_url rendida.
     */
    pub async fn handle_render_prompt(
        State(_application_state): State<AppState>,
        headers: HeaderMap,
        Path(prompt_name): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        let (_, template) = PROMPT_TEMPLATES
            .iter()
            .find(|(name, _)| *name == prompt_name)
            .ok_or_else(|| {
                ApiError::not_found(INVALID_REQUEST, format!("prompt '{}' does not exist", prompt_name))
            })?;

        let host = headers
            .get(axum::http::header::HOST)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("localhost");
        let base_url = format!("http://{}", host);

        Ok(Json(json!({
            "name": prompt_name,
            "prompt": template.replace("{{base_url}}", &base_url),
        })))
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/handlers/schema.rs]
