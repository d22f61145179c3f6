// [apps/orchestrator/src/middleware.rs]
/*!
 * =================================================================
 * APARATO: GALVANIC IDENTITY MIDDLEWARE (V10.2 - TRIPLE CREDENTIAL)
 * CLASIFICACIÓN: SECURITY STRATUM (ESTRATO L4)
 * RESPONSABILIDAD: RESOLUCIÓN DE CREDENCIALES E INYECCIÓN DE IDENTIDAD
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TRIPLE CITIZENSHIP: X-API-Key, Bearer apik_/sess_ o anónimo.
 *    La identidad resuelta viaja como extension para los handlers.
 * 2. FAIL CLOSED: Una credencial presente pero inválida corta la
 *    petición aquí; el anonimato solo existe por ausencia total.
 * 3. IP INJECTION: La IP de origen se inyecta para el rastro de
 *    auditoría (ConnectInfo con fallback X-Forwarded-For).
 * =================================================================
 */

use crate::errors::ApiError;
use crate::state::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use stratavault_domain_models::CallerIdentity;

/// IP de origen del llamador, inyectada para el rastro de auditoría.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

/**
 * Resuelve la credencial presentada (si la hay) y la inyecta junto a
 * la IP de origen en el flujo de la petición.
 */
pub async fn identity_resolver(
    State(application_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. IP DE ORIGEN (ConnectInfo con fallback de proxy)
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .or_else(|| {
            request
                .headers()
                .get("x-forwarded-for")
                .and_then(|value| value.to_str().ok())
                .and_then(|raw| raw.split(',').next())
                .map(|ip| ip.trim().to_string())
        })
        .unwrap_or_default();
    request.extensions_mut().insert(ClientIp(client_ip));

    // 2. CREDENCIALES (solo con el núcleo configurado)
    if let Some(core) = application_state.core().await {
        let api_key_header = request
            .headers()
            .get("x-api-key")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bearer_token = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| raw.strip_prefix("Bearer "))
            .map(str::to_string);

        let resolved_identity = core
            .auth_gate
            .resolve_identity(api_key_header.as_deref(), bearer_token.as_deref())
            .await?;

        if let Some(identity) = resolved_identity {
            request.extensions_mut().insert(identity);
        }
    }

    Ok(next.run(request).await)
}

/// Identidad obligatoria: 401 si la petición llegó anónima.
pub fn require_identity(request_identity: Option<&CallerIdentity>) -> Result<CallerIdentity, ApiError> {
    request_identity
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("authentication required"))
}
// FIN DEL ARCHIVO [apps/orchestrator/src/middleware.rs]
