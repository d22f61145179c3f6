// INICIO DEL ARCHIVO [apps/orchestrator/src/handlers/auth.rs]
/*!
 * =================================================================
 * APARATO: IDENTITY GOVERNANCE HANDLER (V10.6 - SOVEREIGN GATE)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: LOGIN, SESIONES, USUARIOS, GRANTS, API KEYS Y CUOTAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BOOTSTRAP SHIELD: El bootstrap jamás se deshabilita; su último
 *    grant activo jamás se revoca (AUTH_BOOTSTRAP_PROTECTED).
 * 2. GRANT POLICY: can_grant_actions acota las acciones concedibles;
 *    escalation_allowed=false veta conceder lo que no se porta.
 * 3. CONSTRAINT SCHEMAS: Todo constraints JSON se valida contra el
 *    esquema declarativo de su acción antes de tocar el ledger.
 * =================================================================
 */

use crate::errors::{ApiError, AUTH_GRANT_ACTION_DENIED, INVALID_REQUEST};
use crate::middleware::{require_identity, ClientIp};
use crate::state::{now_unix, utc_day_today, AppState};
use axum::{
    extract::{Extension, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use stratavault_domain_authz::{
    credential_hash_hex, enforce_password_policy, hash_password, mint_api_key,
    validate_constraints, ActionToken, ManageUsersConstraints, OperationContext,
};
use stratavault_domain_models::{
    validate_username, AuditAction, CallerIdentity, Grant, UserAccount,
};
use tracing::instrument;
use uuid::Uuid;

// --- ESTRUCTURAS DE PETICIÓN ---

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserPayload {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserPayload {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGrantPayload {
    pub action: String,
    #[serde(default)]
    pub constraints: Option<serde_json::Value>,
}

pub struct IdentityGovernanceHandler;

impl IdentityGovernanceHandler {
    // =============================================================
    // ESTRATO 1: ESTADO, LOGIN Y SESIÓN
    // =============================================================

    /**
     * Endpoint: GET /api/auth/status (público)
     */
    pub async fn handle_status(State(application_state): State<AppState>) -> impl IntoResponse {
        let (configured, bootstrapped) = match application_state.core().await {
            Some(core) => {
                let user_total = core.user_repository.count().await.unwrap_or(0);
                (true, user_total > 0)
            }
            None => (false, false),
        };
        Json(json!({ "bootstrapped": bootstrapped, "configured": configured }))
    }

    /**
     * Endpoint: POST /api/auth/login
     */
    #[instrument(skip(application_state, payload))]
    pub async fn handle_login(
        State(application_state): State<AppState>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Json(payload): Json<LoginPayload>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let (session_token, account) = core
            .auth_gate
            .login(&payload.username, &payload.password, &client_ip)
            .await?;

        Ok(Json(json!({ "token": session_token, "user": account.to_public() })))
    }

    /**
     * Endpoint: POST /api/auth/logout (token de sesión requerido)
     */
    pub async fn handle_logout(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        headers: HeaderMap,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        let presented_token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| raw.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::unauthorized("session token required"))?;

        core.auth_gate.logout(presented_token, &caller, &client_ip).await?;
        Ok(Json(json!({ "logged_out": true })))
    }

    /**
     * Endpoint: GET /api/auth/me
     */
    pub async fn handle_me(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        let account = core
            .user_repository
            .find_by_id(&caller.user_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("invalid credentials"))?;
        let grants = core.grant_repository.active_grants_for_user(&caller.user_id).await?;

        Ok(Json(json!({
            "user": account.to_public(),
            "grants": grants,
            "method": caller.method.as_str(),
            "is_bootstrap": caller.is_bootstrap,
        })))
    }

    /**
     * Endpoint: GET /api/auth/me/quota
     */
    pub async fn handle_my_quota(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
        let snapshot = core
            .quota_repository
            .snapshot_for_user(&caller.user_id, &utc_day_today())
            .await?;
        Ok(Json(json!({ "day": utc_day_today(), "quota": snapshot })))
    }

    /**
     * Endpoint: GET /api/auth/users/:id/quota (manage_users o self)
     */
    pub async fn handle_user_quota(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Path(user_id): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        if caller.user_id != user_id {
            core.auth_gate
                .authorize(&caller, ActionToken::ManageUsers, OperationContext::default())
                .await?;
        }

        let snapshot = core.quota_repository.snapshot_for_user(&user_id, &utc_day_today()).await?;
        Ok(Json(json!({ "day": utc_day_today(), "quota": snapshot })))
    }

    // =============================================================
    // ESTRATO 2: CRUD DE USUARIOS
    // =============================================================

    /**
     * Endpoint: GET /api/auth/users (manage_users)
     */
    pub async fn handle_list_users(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
        core.auth_gate
            .authorize(&caller, ActionToken::ManageUsers, OperationContext::default())
            .await?;

        let accounts = core.user_repository.list_all().await?;
        let public: Vec<_> = accounts.iter().map(UserAccount::to_public).collect();
        Ok(Json(json!({ "users": public })))
    }

    /**
     * Endpoint: POST /api/auth/users (manage_users con can_create)
     */
    #[instrument(skip(application_state, caller_identity, payload))]
    pub async fn handle_create_user(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Json(payload): Json<CreateUserPayload>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
        let envelope = core
            .auth_gate
            .authorize(&caller, ActionToken::ManageUsers, OperationContext::default())
            .await?;

        let policy = ManageUsersConstraints::from_json(&envelope.constraints);
        if !caller.is_bootstrap && !policy.can_create {
            return Err(ApiError::forbidden("user creation is not permitted by the grant"));
        }

        if !validate_username(&payload.username) {
            return Err(ApiError::bad_request(
                INVALID_REQUEST,
                "username must match [a-z0-9_-]{3,63}",
            ));
        }
        enforce_password_policy(&payload.password)?;

        let api_key = mint_api_key();
        let account = UserAccount {
            id: Uuid::new_v4().to_string(),
            username: payload.username.clone(),
            display_name: payload.display_name.unwrap_or_else(|| payload.username.clone()),
            password_hash: hash_password(&payload.password),
            api_key_hash: credential_hash_hex(&api_key),
            is_active: true,
            is_bootstrap: false,
            failed_login_count: 0,
            locked_until: None,
            created_at: now_unix(),
            updated_at: now_unix(),
        };
        core.user_repository.insert(&account).await?;

        let _ = core
            .audit_trail
            .log(
                AuditAction::UserCreated,
                &client_ip,
                &caller.username,
                json!({ "user_id": account.id, "username": account.username }),
            )
            .await;

        // El API key del usuario nuevo se emite una única vez.
        Ok((
            StatusCode::CREATED,
            Json(json!({ "user": account.to_public(), "api_key": api_key })),
        ))
    }

    /**
     * Endpoint: GET /api/auth/users/:id (manage_users o self)
     */
    pub async fn handle_get_user(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Path(user_id): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        if caller.user_id != user_id {
            core.auth_gate
                .authorize(&caller, ActionToken::ManageUsers, OperationContext::default())
                .await?;
        }

        let account = core
            .user_repository
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| ApiError::not_found(INVALID_REQUEST, "user not found"))?;
        let grants = core.grant_repository.all_grants_for_user(&user_id).await?;

        Ok(Json(json!({ "user": account.to_public(), "grants": grants })))
    }

    /**
     * Endpoint: PATCH /api/auth/users/:id (manage_users con can_edit)
     */
    #[instrument(skip(application_state, caller_identity, payload))]
    pub async fn handle_update_user(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Path(user_id): Path<String>,
        Json(payload): Json<UpdateUserPayload>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
        let envelope = core
            .auth_gate
            .authorize(&caller, ActionToken::ManageUsers, OperationContext::default())
            .await?;

        let policy = ManageUsersConstraints::from_json(&envelope.constraints);
        if !caller.is_bootstrap && !policy.can_edit {
            return Err(ApiError::forbidden("user edition is not permitted by the grant"));
        }

        let target = core
            .user_repository
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| ApiError::not_found(INVALID_REQUEST, "user not found"))?;

        // BOOTSTRAP SHIELD: el bootstrap jamás se deshabilita.
        if target.is_bootstrap && payload.is_active == Some(false) {
            return Err(stratavault_domain_authz::AuthzError::BootstrapProtected.into());
        }

        let password_hash = match &payload.password {
            Some(new_password) => {
                enforce_password_policy(new_password)?;
                Some(hash_password(new_password))
            }
            None => None,
        };

        core.user_repository
            .update_profile(
                &user_id,
                payload.display_name.as_deref(),
                password_hash.as_deref(),
                payload.is_active,
                now_unix(),
            )
            .await?;

        // Deshabilitar purga las sesiones vivas del usuario.
        let was_disabled = payload.is_active == Some(false);
        if was_disabled {
            let _ = core.session_repository.delete_for_user(&user_id).await;
        }

        let _ = core
            .audit_trail
            .log(
                if was_disabled { AuditAction::UserDisabled } else { AuditAction::UserUpdated },
                &client_ip,
                &caller.username,
                json!({ "user_id": user_id, "disabled": was_disabled }),
            )
            .await;

        let refreshed = core.user_repository.find_by_id(&user_id).await?;
        Ok(Json(json!({ "user": refreshed.map(|account| account.to_public()) })))
    }

    /**
     * Endpoint: DELETE /api/auth/users/:id — deshabilitación soft.
     */
    pub async fn handle_disable_user(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(client_ip): Extension<ClientIp>,
        Path(user_id): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        Self::handle_update_user(
            State(application_state),
            caller_identity,
            Extension(client_ip),
            Path(user_id),
            Json(UpdateUserPayload { display_name: None, password: None, is_active: Some(false) }),
        )
        .await
    }

    /**
     * Endpoint: POST /api/auth/users/:id/api-key — regeneración.
     * El API key anterior queda inválido en el mismo instante.
     */
    #[instrument(skip(application_state, caller_identity))]
    pub async fn handle_regenerate_api_key(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Path(user_id): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        if caller.user_id != user_id {
            core.auth_gate
                .authorize(&caller, ActionToken::ManageUsers, OperationContext::default())
                .await?;
        }

        let target = core
            .user_repository
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| ApiError::not_found(INVALID_REQUEST, "user not found"))?;

        let fresh_api_key = mint_api_key();
        core.user_repository
            .replace_api_key_hash(&target.id, &credential_hash_hex(&fresh_api_key), now_unix())
            .await?;

        let _ = core
            .audit_trail
            .log(
                AuditAction::ApiKeyRegenerated,
                &client_ip,
                &caller.username,
                json!({ "user_id": target.id }),
            )
            .await;

        Ok(Json(json!({ "api_key": fresh_api_key })))
    }

    // =============================================================
    // ESTRATO 3: GRANTS
    // =============================================================

    /**
     * Endpoint: GET /api/auth/users/:id/grants
     */
    pub async fn handle_list_grants(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Path(user_id): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;

        if caller.user_id != user_id {
            Self::authorize_grant_management(&core, &caller).await?;
        }

        let grants = core.grant_repository.all_grants_for_user(&user_id).await?;
        Ok(Json(json!({ "grants": grants })))
    }

    /**
     * Endpoint: POST /api/auth/users/:id/grants
     */
    #[instrument(skip(application_state, caller_identity, payload))]
    pub async fn handle_create_grant(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Path(user_id): Path<String>,
        Json(payload): Json<CreateGrantPayload>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
        let envelope = Self::authorize_grant_management(&core, &caller).await?;

        // 1. TOKEN DE ACCIÓN DEL CONJUNTO CERRADO
        let action = ActionToken::parse(&payload.action).ok_or_else(|| {
            ApiError::bad_request(INVALID_REQUEST, format!("unknown action '{}'", payload.action))
        })?;

        // 2. POLÍTICA DE CONCESIÓN DEL LLAMADOR
        if !caller.is_bootstrap {
            let policy = ManageUsersConstraints::from_json(&envelope.constraints);
            if let Some(grantable) = &policy.can_grant_actions {
                if !grantable.is_empty() && !grantable.iter().any(|granted| granted == action.as_str()) {
                    return Err(ApiError::new(
                        StatusCode::FORBIDDEN,
                        AUTH_GRANT_ACTION_DENIED,
                        format!("granting action '{}' is not permitted", action.as_str()),
                    ));
                }
            }
            if !policy.escalation_allowed {
                let held = core.auth_gate.held_actions(&caller.user_id).await?;
                if !held.contains(action.as_str()) {
                    return Err(ApiError::new(
                        StatusCode::FORBIDDEN,
                        AUTH_GRANT_ACTION_DENIED,
                        format!(
                            "escalation denied: caller does not hold action '{}'",
                            action.as_str()
                        ),
                    ));
                }
            }
        }

        // 3. VALIDACIÓN DE CONSTRAINTS CONTRA EL ESQUEMA DECLARATIVO
        let constraints = payload.constraints.unwrap_or(serde_json::Value::Null);
        validate_constraints(action, &constraints)
            .map_err(ApiError::from)?;

        let target = core
            .user_repository
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| ApiError::not_found(INVALID_REQUEST, "user not found"))?;

        let grant = Grant {
            id: Uuid::new_v4().to_string(),
            user_id: target.id.clone(),
            action: action.as_str().to_string(),
            constraints: match &constraints {
                serde_json::Value::Null => None,
                other => Some(other.clone()),
            },
            is_active: true,
            created_by: caller.user_id.clone(),
            created_at: now_unix(),
        };
        core.grant_repository.insert(&grant).await?;

        let _ = core
            .audit_trail
            .log(
                AuditAction::GrantCreated,
                &client_ip,
                &caller.username,
                json!({
                    "grant_id": grant.id,
                    "action": grant.action,
                    "target_user_id": target.id,
                    "has_constraints": grant.constraints.is_some(),
                }),
            )
            .await;

        Ok((StatusCode::CREATED, Json(json!({ "grant": grant }))))
    }

    /**
     * Endpoint: DELETE /api/auth/grants/:id (y el alias anidado)
     */
    #[instrument(skip(application_state, caller_identity))]
    pub async fn handle_revoke_grant(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Extension(ClientIp(client_ip)): Extension<ClientIp>,
        Path(grant_id): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
        Self::authorize_grant_management(&core, &caller).await?;

        let grant = core
            .grant_repository
            .find_by_id(&grant_id)
            .await?
            .ok_or_else(|| ApiError::not_found(INVALID_REQUEST, "grant not found"))?;

        // BOOTSTRAP SHIELD: el último grant activo del bootstrap es intocable.
        if let Some(target) = core.user_repository.find_by_id(&grant.user_id).await? {
            if target.is_bootstrap
                && grant.is_active
                && core.grant_repository.count_active_for_user(&target.id).await? <= 1
            {
                return Err(stratavault_domain_authz::AuthzError::BootstrapProtected.into());
            }
        }

        core.grant_repository.revoke(&grant_id).await?;

        let _ = core
            .audit_trail
            .log(
                AuditAction::GrantRevoked,
                &client_ip,
                &caller.username,
                json!({ "grant_id": grant_id, "action": grant.action, "target_user_id": grant.user_id }),
            )
            .await;

        Ok(Json(json!({ "revoked": true })))
    }

    /**
     * Endpoint: GET /api/auth/grants/:id
     */
    pub async fn handle_get_grant(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Path(grant_id): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
        Self::authorize_grant_management(&core, &caller).await?;

        let grant = core
            .grant_repository
            .find_by_id(&grant_id)
            .await?
            .ok_or_else(|| ApiError::not_found(INVALID_REQUEST, "grant not found"))?;
        Ok(Json(json!({ "grant": grant })))
    }

    /// Gestión de grants: manage_grants o, en su defecto, manage_users.
    async fn authorize_grant_management(
        core: &crate::state::CoreContext,
        caller: &CallerIdentity,
    ) -> Result<crate::services::auth_gate::AuthorizationEnvelope, ApiError> {
        match core
            .auth_gate
            .authorize(caller, ActionToken::ManageGrants, OperationContext::default())
            .await
        {
            Ok(envelope) => Ok(envelope),
            Err(_) => {
                core.auth_gate
                    .authorize(caller, ActionToken::ManageUsers, OperationContext::default())
                    .await
            }
        }
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/handlers/auth.rs]
