// INICIO DEL ARCHIVO [apps/orchestrator/src/handlers/config.rs]
/*!
 * =================================================================
 * APARATO: CONFIGURATION HANDLER (V10.3 - BOOTSTRAP FORGE)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: FIJAR EL WORKDIR Y FORJAR EL USUARIO BOOTSTRAP
 *
 * # Contrato:
 * La primera configuración forja el usuario bootstrap y devuelve sus
 * credenciales UNA única vez. Reconfiguraciones posteriores exigen
 * manage_config y jamás re-emiten material de credenciales.
 * =================================================================
 */

use crate::errors::{ApiError, INVALID_REQUEST};
use crate::middleware::{require_identity, ClientIp};
use crate::state::{now_unix, AppState, CoreContext};
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use stratavault_domain_authz::{
    credential_hash_hex, hash_password, mint_api_key, ActionToken, OperationContext,
};
use stratavault_domain_models::{AuditAction, CallerIdentity, UserAccount};
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ConfigurePayload {
    pub working_dir: String,
}

pub struct ConfigurationHandler;

impl ConfigurationHandler {
    /**
     * Endpoint: POST /api/config
     * Fija (o re-fija) el directorio de trabajo. La primera llamada es
     * abierta y forja el bootstrap; las siguientes exigen manage_config.
     */
    #[instrument(skip(application_state, caller_identity, payload))]
    pub async fn handle_configure(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Json(payload): Json<ConfigurePayload>,
    ) -> Result<impl IntoResponse, ApiError> {
        if payload.working_dir.trim().is_empty() {
            return Err(ApiError::bad_request(INVALID_REQUEST, "working_dir must not be empty"));
        }

        // Reconfiguración: exige identidad con manage_config.
        if let Some(existing_core) = application_state.core().await {
            let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
            existing_core
                .auth_gate
                .authorize(&caller, ActionToken::ManageConfig, OperationContext::default())
                .await?;
        }

        let working_directory = PathBuf::from(payload.working_dir.trim());
        let core = CoreContext::ignite(
            &working_directory,
            application_state.limits.clone(),
            application_state.shutdown_receiver(),
        )
        .await
        .map_err(ApiError::internal)?;

        // Forja del bootstrap: solo con el ledger de usuarios virgen.
        let bootstrap_credentials = Self::forge_bootstrap_if_absent(&core).await?;

        let _ = core
            .audit_trail
            .log(
                AuditAction::ConfigInitialized,
                &client_ip,
                "",
                json!({
                    "working_dir": working_directory.display().to_string(),
                    "bootstrap_forged": bootstrap_credentials.is_some(),
                }),
            )
            .await;

        application_state.install_core(core).await;

        let response_body = match bootstrap_credentials {
            Some((username, password, api_key)) => json!({
                "configured": true,
                "bootstrap": {
                    "username": username,
                    "password": password,
                    "api_key": api_key,
                },
            }),
            None => json!({ "configured": true }),
        };

        Ok((StatusCode::OK, Json(response_body)))
    }

    /// Forja el usuario bootstrap con credenciales generadas; las
    /// devuelve UNA única vez.
    async fn forge_bootstrap_if_absent(
        core: &CoreContext,
    ) -> Result<Option<(String, String, String)>, ApiError> {
        if core.user_repository.count().await? > 0 {
            return Ok(None);
        }

        let username = "admin".to_string();
        let generated_password = hex::encode({
            use rand::RngCore;
            let mut material = [0u8; 18];
            rand::thread_rng().fill_bytes(&mut material);
            material
        });
        let api_key = mint_api_key();

        let account = UserAccount {
            id: Uuid::new_v4().to_string(),
            username: username.clone(),
            display_name: "Bootstrap Administrator".to_string(),
            password_hash: hash_password(&generated_password),
            api_key_hash: credential_hash_hex(&api_key),
            is_active: true,
            is_bootstrap: true,
            failed_login_count: 0,
            locked_until: None,
            created_at: now_unix(),
            updated_at: now_unix(),
        };
        core.user_repository.insert(&account).await?;

        info!("👑 [BOOTSTRAP_FORGE]: Bootstrap user '{}' created.", username);
        Ok(Some((username, generated_password, api_key)))
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/handlers/config.rs]
