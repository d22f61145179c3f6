// INICIO DEL ARCHIVO [apps/orchestrator/src/routes.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN ROUTING MATRIX (V10.4 - VAULT TOPOLOGY)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: TOPOLOGÍA COMPLETA DE LA API HTTP/JSON + SSE
 *
 * VISION HIPER-HOLÍSTICA:
 * La topología soporta:
 * 1. REST de activos y tópicos (alto volumen).
 * 2. SSE (auditoría en vivo, verificación, sesiones de descarga).
 * 3. Superficie autodescriptiva (schema + prompts).
 * =================================================================
 */

use crate::handlers::{
    assets::AssetGatewayHandler, audit::AuditSurfaceHandler, auth::IdentityGovernanceHandler,
    config::ConfigurationHandler, download::BulkDownloadHandler, metadata::MetadataHandler,
    monitoring::MonitoringHandler, query::QuerySurfaceHandler, schema::SelfDescriptionHandler,
    topics::TopicGovernanceHandler, verify::VerificationSurfaceHandler,
};
use crate::middleware::identity_resolver;
use crate::state::AppState;
use axum::{
    http::{header, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

pub fn create_sovereign_router(application_shared_state: AppState) -> Router {
    // Escudo de Red: CORS para el panel de operación y herramientas Ops.
    let network_security_shield = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-api-key"),
        ])
        .max_age(Duration::from_secs(3600));

    // ESTRATO DE IDENTIDAD: login, sesiones, usuarios, grants, cuotas.
    let identity_stratum = Router::new()
        .route("/status", get(IdentityGovernanceHandler::handle_status))
        .route("/login", post(IdentityGovernanceHandler::handle_login))
        .route("/logout", post(IdentityGovernanceHandler::handle_logout))
        .route("/me", get(IdentityGovernanceHandler::handle_me))
        .route("/me/quota", get(IdentityGovernanceHandler::handle_my_quota))
        .route(
            "/users",
            get(IdentityGovernanceHandler::handle_list_users)
                .post(IdentityGovernanceHandler::handle_create_user),
        )
        .route(
            "/users/:id",
            get(IdentityGovernanceHandler::handle_get_user)
                .patch(IdentityGovernanceHandler::handle_update_user)
                .delete(IdentityGovernanceHandler::handle_disable_user),
        )
        .route("/users/:id/api-key", post(IdentityGovernanceHandler::handle_regenerate_api_key))
        .route("/users/:id/quota", get(IdentityGovernanceHandler::handle_user_quota))
        .route(
            "/users/:id/grants",
            get(IdentityGovernanceHandler::handle_list_grants)
                .post(IdentityGovernanceHandler::handle_create_grant),
        )
        .route("/users/:id/grants/:gid", delete(revoke_nested_grant_alias))
        .route(
            "/grants/:id",
            get(IdentityGovernanceHandler::handle_get_grant)
                .delete(IdentityGovernanceHandler::handle_revoke_grant),
        );

    // ESTRATO DE ALMACÉN: tópicos, activos y metadatos.
    let vault_stratum = Router::new()
        .route(
            "/topics",
            get(TopicGovernanceHandler::handle_list_topics)
                .post(TopicGovernanceHandler::handle_create_topic),
        )
        .route(
            "/topics/:name",
            get(TopicGovernanceHandler::handle_topic_detail)
                .delete(TopicGovernanceHandler::handle_remove_topic),
        )
        .route("/topics/:name/stats", get(TopicGovernanceHandler::handle_topic_stats))
        .route("/topics/:name/assets", post(AssetGatewayHandler::handle_upload))
        .route("/assets/:hash", get(AssetGatewayHandler::handle_asset_detail))
        .route("/assets/:hash/download", get(AssetGatewayHandler::handle_download))
        .route(
            "/assets/:hash/metadata",
            get(MetadataHandler::handle_get_metadata).post(MetadataHandler::handle_apply_single),
        )
        .route("/metadata/batch", post(MetadataHandler::handle_apply_batch))
        .route("/metadata/apply", post(MetadataHandler::handle_apply_from_query));

    // ESTRATO DE CONSULTA Y OBSERVABILIDAD.
    let observation_stratum = Router::new()
        .route("/query", get(QuerySurfaceHandler::handle_list_presets))
        .route("/query/:preset", post(QuerySurfaceHandler::handle_execute_preset))
        .route("/audit", get(AuditSurfaceHandler::handle_query))
        .route("/audit/stream", get(AuditSurfaceHandler::handle_stream))
        .route("/audit/actions", get(AuditSurfaceHandler::handle_actions))
        .route("/verify", get(VerificationSurfaceHandler::handle_verify))
        .route("/monitoring", get(MonitoringHandler::handle_metrics))
        .route("/monitoring/logs/:level/:filename", get(MonitoringHandler::handle_read_log));

    // ESTRATO DE DESCARGA MASIVA.
    let download_stratum = Router::new()
        .route("/download/bulk", post(BulkDownloadHandler::handle_synchronous))
        .route("/download/bulk/start", get(BulkDownloadHandler::handle_start_session))
        .route("/download/bulk/:id", get(BulkDownloadHandler::handle_fetch_artifact));

    // ESTRATO AUTODESCRIPTIVO.
    let description_stratum = Router::new()
        .route("/schema", get(SelfDescriptionHandler::handle_schema))
        .route("/prompts", get(SelfDescriptionHandler::handle_list_prompts))
        .route("/prompts/:name", get(SelfDescriptionHandler::handle_render_prompt));

    // COMPOSICIÓN GLOBAL (Root Topology)
    Router::new()
        .route("/health", get(|| async { "STATUS_OK" }))
        .nest(
            "/api",
            Router::new()
                .route("/config", post(ConfigurationHandler::handle_configure))
                .nest("/auth", identity_stratum)
                .merge(vault_stratum)
                .merge(observation_stratum)
                .merge(download_stratum)
                .merge(description_stratum)
                .layer(middleware::from_fn_with_state(
                    application_shared_state.clone(),
                    identity_resolver,
                )),
        )
        .layer(network_security_shield)
        .with_state(application_shared_state)
}

/// Alias anidado DELETE /api/auth/users/:id/grants/:gid -> revocación.
async fn revoke_nested_grant_alias(
    state: axum::extract::State<AppState>,
    caller_identity: Option<axum::extract::Extension<stratavault_domain_models::CallerIdentity>>,
    client_ip: axum::extract::Extension<crate::middleware::ClientIp>,
    axum::extract::Path((_user_id, grant_id)): axum::extract::Path<(String, String)>,
) -> Result<axum::response::Response, crate::errors::ApiError> {
    use axum::response::IntoResponse;
    IdentityGovernanceHandler::handle_revoke_grant(
        state,
        caller_identity,
        client_ip,
        axum::extract::Path(grant_id),
    )
    .await
    .map(IntoResponse::into_response)
}
// FIN DEL ARCHIVO [apps/orchestrator/src/routes.rs]
