// INICIO DEL ARCHIVO [apps/orchestrator/src/handlers/monitoring.rs]
/*!
 * =================================================================
 * APARATO: MONITORING HANDLER (V10.2 - PROCESS PULSE)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: MÉTRICAS DEL PROCESO Y LECTURA ACOTADA DE LOGS
 *
 * # Contrato de logs:
 * Solo los niveles warn/error son legibles vía API; el nombre de
 * archivo debe satisfacer ^[0-9]+\.log$ (jamás rutas arbitrarias).
 * =================================================================
 */

use crate::errors::{ApiError, INVALID_REQUEST};
use crate::middleware::require_identity;
use crate::state::{now_unix, AppState};
use axum::{
    extract::{Extension, Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use stratavault_domain_models::CallerIdentity;
use tracing::instrument;

pub struct MonitoringHandler;

impl MonitoringHandler {
    /**
     * Endpoint: GET /api/monitoring
     */
    pub async fn handle_metrics(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        let topic_total = core.topic_registry.count().await;
        let unique_hashes = core.index_repository.count_unique_hashes().await.unwrap_or(0);
        let audit_rows = core.audit_trail.count().await.unwrap_or(0);
        let user_total = core.user_repository.count().await.unwrap_or(0);

        let mut topic_digests = Vec::new();
        for store in core.topic_registry.stores().await {
            let stats = store.read_stats().await.ok().flatten().unwrap_or_default();
            topic_digests.push(json!({
                "topic": store.name,
                "file_count": stats.file_count,
                "total_size_bytes": stats.total_size_bytes,
                "dat_file_count": stats.dat_file_count,
            }));
        }

        Ok(Json(json!({
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_seconds": now_unix() - application_state.boot_unix,
            "working_directory": core.working_directory.display().to_string(),
            "topics": topic_total,
            "unique_hashes": unique_hashes,
            "audit_rows": audit_rows,
            "users": user_total,
            "audit_subscribers": core.audit_trail.subscriber_count(),
            "preset_count": core.preset_registry.count(),
            "cpu_cores": num_cpus::get(),
            "topic_digests": topic_digests,
        })))
    }

    /**
     * Endpoint: GET /api/monitoring/logs/:level/:filename
     */
    #[instrument(skip(application_state, caller_identity))]
    pub async fn handle_read_log(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Path((level, filename)): Path<(String, String)>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        // 1. NIVEL ACOTADO: solo warn/error son servibles.
        if level != "warn" && level != "error" {
            return Err(ApiError::bad_request(
                INVALID_REQUEST,
                "only 'warn' and 'error' log levels are readable",
            ));
        }

        // 2. NOMBRE ACOTADO: ^[0-9]+\.log$
        let stem_is_numeric = filename
            .strip_suffix(".log")
            .map(|stem| !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()))
            .unwrap_or(false);
        if !stem_is_numeric {
            return Err(ApiError::bad_request(
                INVALID_REQUEST,
                "log filename must match ^[0-9]+\\.log$",
            ));
        }

        let log_path = core.internal_root.join("logs").join(&level).join(&filename);
        let content = tokio::fs::read_to_string(&log_path)
            .await
            .map_err(|_| ApiError::not_found(INVALID_REQUEST, "log file not found"))?;

        Ok(Json(json!({ "level": level, "filename": filename, "content": content })))
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/handlers/monitoring.rs]
