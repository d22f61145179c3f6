// INICIO DEL ARCHIVO [apps/orchestrator/src/services/auth_gate.rs]
/*!
 * =================================================================
 * APARATO: GALVANIC AUTH GATE (V10.6 - ZERO ORACLE)
 * CLASIFICACIÓN: SECURITY STRATUM (ESTRATO L4)
 * RESPONSABILIDAD: AUTENTICACIÓN, AUTORIZACIÓN, CUOTAS Y LOCKOUT
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TRIPLE CREDENTIAL: API key (X-API-Key o Bearer apik_), sesión
 *    (Bearer sess_) o anónimo. La resolución es por hash del material
 *    presentado; nada viaja en claro hacia el ledger.
 * 2. ZERO ORACLE: Usuario inexistente y contraseña errónea devuelven
 *    exactamente el mismo status y código; el gate quema un PBKDF2
 *    señuelo para igualar el perfil temporal.
 * 3. LOCKED MEANS LOCKED: Durante la ventana de lockout se rechaza
 *    tanto el login por contraseña como el uso del API key.
 * 4. QUOTA PHYSICS: La frontera se consulta antes de ejecutar; el
 *    ledger se consume únicamente tras el éxito.
 * =================================================================
 */

use crate::errors::ApiError;
use crate::services::audit_trail::AuditTrailService;
use crate::state::{now_unix, utc_day_today, RuntimeLimits};
use axum::http::StatusCode;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use stratavault_domain_authz::{
    classify_bearer, credential_hash_hex, evaluate_constraints, mint_session_token,
    quota_would_exceed, register_login_failure, verify_password, ActionToken, CredentialKind,
    OperationContext, QuotaDemand, UploadConstraints, ViewAuditConstraints,
};
use stratavault_domain_models::{
    AuditAction, AuthMethod, CallerIdentity, Grant, SessionRecord, UserAccount,
};
use stratavault_infra_db::repositories::{
    GrantRepository, QuotaRepository, SessionRepository, UserRepository,
};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// Veredicto positivo de autorización con las constraints del grant.
#[derive(Debug, Clone)]
pub struct AuthorizationEnvelope {
    /// Constraints del grant vencedor (objeto vacío para bootstrap).
    pub constraints: serde_json::Value,
}

pub struct AuthGate {
    user_repository: Arc<UserRepository>,
    grant_repository: Arc<GrantRepository>,
    session_repository: Arc<SessionRepository>,
    quota_repository: Arc<QuotaRepository>,
    audit_trail: Arc<AuditTrailService>,
    limits: RuntimeLimits,
    /// Cerrojos por usuario: serializan login-failure y consumo de cuota.
    per_user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    /// Sello señuelo para igualar el coste de un login inexistente.
    decoy_password_seal: String,
}

impl AuthGate {
    pub fn new(
        user_repository: Arc<UserRepository>,
        grant_repository: Arc<GrantRepository>,
        session_repository: Arc<SessionRepository>,
        quota_repository: Arc<QuotaRepository>,
        audit_trail: Arc<AuditTrailService>,
        limits: RuntimeLimits,
    ) -> Self {
        Self {
            user_repository,
            grant_repository,
            session_repository,
            quota_repository,
            audit_trail,
            limits,
            per_user_locks: Mutex::new(HashMap::new()),
            decoy_password_seal: stratavault_domain_authz::hash_password("decoy-equalizer"),
        }
    }

    async fn user_lock(&self, lock_key: &str) -> Arc<Mutex<()>> {
        let mut locks_guard = self.per_user_locks.lock().await;
        locks_guard.entry(lock_key.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    // =============================================================
    // ESTRATO 1: AUTENTICACIÓN
    // =============================================================

    /**
     * Resuelve la identidad del llamador desde las cabeceras.
     * None = anónimo (cabeceras ausentes). Credencial presente pero
     * inválida es un fallo, no anonimato.
     */
    pub async fn resolve_identity(
        &self,
        api_key_header: Option<&str>,
        bearer_token: Option<&str>,
    ) -> Result<Option<CallerIdentity>, ApiError> {
        if let Some(api_key) = api_key_header {
            return Ok(Some(self.authenticate_api_key(api_key).await?));
        }

        let Some(token) = bearer_token else { return Ok(None) };
        match classify_bearer(token) {
            CredentialKind::ApiKey => Ok(Some(self.authenticate_api_key(token).await?)),
            CredentialKind::Session => Ok(Some(self.authenticate_session(token).await?)),
            CredentialKind::Unknown => {
                Err(ApiError::unauthorized("unrecognized credential format"))
            }
        }
    }

    async fn authenticate_api_key(&self, presented_key: &str) -> Result<CallerIdentity, ApiError> {
        let key_hash = credential_hash_hex(presented_key);
        let account = self
            .user_repository
            .find_by_api_key_hash(&key_hash)
            .await?
            .ok_or_else(|| ApiError::unauthorized("invalid credentials"))?;

        self.enforce_account_health(&account)?;
        Ok(CallerIdentity {
            user_id: account.id,
            username: account.username,
            is_bootstrap: account.is_bootstrap,
            method: AuthMethod::ApiKey,
        })
    }

    async fn authenticate_session(&self, presented_token: &str) -> Result<CallerIdentity, ApiError> {
        let token_hash = credential_hash_hex(presented_token);
        let session = self
            .session_repository
            .find_live(&token_hash, now_unix())
            .await?
            .ok_or_else(|| ApiError::unauthorized("invalid credentials"))?;

        let account = self
            .user_repository
            .find_by_id(&session.user_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("invalid credentials"))?;
        self.enforce_account_health(&account)?;

        let _ = self.session_repository.touch(&token_hash, now_unix()).await;
        Ok(CallerIdentity {
            user_id: account.id,
            username: account.username,
            is_bootstrap: account.is_bootstrap,
            method: AuthMethod::Session,
        })
    }

    /// Usuarios deshabilitados se rechazan siempre; el lockout vigente
    /// también veta el API key (locked means locked).
    fn enforce_account_health(&self, account: &UserAccount) -> Result<(), ApiError> {
        if !account.is_active {
            return Err(ApiError::unauthorized("invalid credentials"));
        }
        if account.is_locked_at(now_unix()) {
            return Err(ApiError::new(
                StatusCode::TOO_MANY_REQUESTS,
                crate::errors::AUTH_ACCOUNT_LOCKED,
                "account is temporarily locked",
            ));
        }
        Ok(())
    }

    // =============================================================
    // ESTRATO 2: LOGIN / LOGOUT
    // =============================================================

    /**
     * Login por contraseña con física anti-oráculo y lockout.
     */
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        source_ip: &str,
    ) -> Result<(String, UserAccount), ApiError> {
        let lock = self.user_lock(username).await;
        let _login_guard = lock.lock().await;

        let Some(account) = self.user_repository.find_by_username(username).await? else {
            // Señuelo: mismo coste criptográfico que un usuario real.
            let _ = verify_password(password, &self.decoy_password_seal);
            self.audit_login_failed(username, source_ip, "unknown_user").await;
            return Err(ApiError::unauthorized("invalid credentials"));
        };

        if account.is_locked_at(now_unix()) {
            self.audit_login_failed(username, source_ip, "locked").await;
            return Err(ApiError::new(
                StatusCode::TOO_MANY_REQUESTS,
                crate::errors::AUTH_ACCOUNT_LOCKED,
                "account is temporarily locked",
            ));
        }

        if !account.is_active || !verify_password(password, &account.password_hash) {
            let registration = register_login_failure(
                &self.limits.lockout,
                account.failed_login_count,
                now_unix(),
            );
            self.user_repository
                .record_login_failure(
                    &account.id,
                    registration.failed_login_count,
                    registration.locked_until,
                    now_unix(),
                )
                .await?;
            if registration.locked_until.is_some() {
                warn!("🔒 [AUTH_LOCKOUT]: Account '{}' locked by brute-force shield.", username);
            }
            self.audit_login_failed(username, source_ip, "bad_password").await;
            return Err(ApiError::unauthorized("invalid credentials"));
        }

        // ÉXITO: reset de contador + forja de sesión.
        self.user_repository.reset_login_failures(&account.id, now_unix()).await?;

        let session_token = mint_session_token();
        let session = SessionRecord {
            token_hash: credential_hash_hex(&session_token),
            user_id: account.id.clone(),
            created_at: now_unix(),
            last_seen_at: now_unix(),
            expires_at: now_unix() + self.limits.session_ttl_seconds,
        };
        self.session_repository.insert(&session).await?;

        let _ = self
            .audit_trail
            .log(
                AuditAction::LoginSuccess,
                source_ip,
                &account.username,
                json!({ "method": "password" }),
            )
            .await;

        info!("🔓 [AUTH_LOGIN]: Session forged for '{}'.", account.username);
        Ok((session_token, account))
    }

    async fn audit_login_failed(&self, username: &str, source_ip: &str, reason: &str) {
        let _ = self
            .audit_trail
            .log(AuditAction::LoginFailed, source_ip, username, json!({ "reason": reason }))
            .await;
    }

    pub async fn logout(&self, presented_token: &str, caller: &CallerIdentity, source_ip: &str) -> Result<(), ApiError> {
        self.session_repository.delete(&credential_hash_hex(presented_token)).await?;
        let _ = self
            .audit_trail
            .log(AuditAction::Logout, source_ip, &caller.username, json!({}))
            .await;
        Ok(())
    }

    // =============================================================
    // ESTRATO 3: AUTORIZACIÓN + CUOTAS
    // =============================================================

    /**
     * Autoriza una acción contra los grants activos del llamador.
     * El bootstrap porta un grant implícito sin constraints sobre toda
     * acción. Evalúa constraints y fronteras de cuota; el consumo del
     * ledger queda para [`consume_quota`] tras el éxito.
     */
    #[instrument(skip(self, context))]
    pub async fn authorize(
        &self,
        caller: &CallerIdentity,
        action: ActionToken,
        context: OperationContext<'_>,
    ) -> Result<AuthorizationEnvelope, ApiError> {
        if caller.is_bootstrap {
            return Ok(AuthorizationEnvelope { constraints: json!({}) });
        }

        let grants = self.grant_repository.active_grants_for_user(&caller.user_id).await?;
        let candidates: Vec<&Grant> =
            grants.iter().filter(|grant| grant.action == action.as_str()).collect();

        if candidates.is_empty() {
            return Err(ApiError::forbidden(format!(
                "action '{}' is not granted",
                action.as_str()
            )));
        }

        let mut last_denial: Option<ApiError> = None;
        for grant in candidates {
            let constraints = grant.constraints.clone().unwrap_or(json!({}));

            if let Err(violation) = evaluate_constraints(action, &constraints, &context) {
                last_denial = Some(violation.into());
                continue;
            }

            if let Some(quota_denial) = self.quota_boundary_denial(caller, action, &constraints, &context).await? {
                last_denial = Some(quota_denial);
                continue;
            }

            return Ok(AuthorizationEnvelope { constraints });
        }

        Err(last_denial.unwrap_or_else(|| ApiError::forbidden("no grant satisfies the request")))
    }

    async fn quota_boundary_denial(
        &self,
        caller: &CallerIdentity,
        action: ActionToken,
        constraints: &serde_json::Value,
        context: &OperationContext<'_>,
    ) -> Result<Option<ApiError>, ApiError> {
        let (daily_count_limit, daily_volume_limit) = match action {
            ActionToken::Upload => {
                let view = UploadConstraints::from_json(constraints);
                (view.daily_count_limit, view.daily_volume_bytes)
            }
            ActionToken::Download => {
                let limit = constraints.get("daily_count_limit").and_then(|v| v.as_i64());
                (limit, None)
            }
            _ => (None, None),
        };

        if daily_count_limit.is_none() && daily_volume_limit.is_none() {
            return Ok(None);
        }

        let today = utc_day_today();
        let (consumed_operations, consumed_volume) = self
            .quota_repository
            .consumed(&caller.user_id, action.as_str(), &today)
            .await?;

        let demand = QuotaDemand {
            operations: 1,
            volume_bytes: context.payload_size.unwrap_or(0) as i64,
        };

        if quota_would_exceed(
            daily_count_limit,
            daily_volume_limit,
            consumed_operations,
            consumed_volume,
            demand,
        ) {
            return Ok(Some(ApiError::new(
                StatusCode::TOO_MANY_REQUESTS,
                crate::errors::AUTH_QUOTA_EXCEEDED,
                format!("daily quota exceeded for action '{}'", action.as_str()),
            )));
        }
        Ok(None)
    }

    /// Consuma la demanda en el ledger tras una operación exitosa.
    pub async fn consume_quota(
        &self,
        caller: &CallerIdentity,
        action: ActionToken,
        volume_bytes: i64,
    ) -> Result<(), ApiError> {
        let lock = self.user_lock(&caller.user_id).await;
        let _quota_guard = lock.lock().await;
        self.quota_repository
            .record_success(&caller.user_id, action.as_str(), &utc_day_today(), 1, volume_bytes)
            .await?;
        Ok(())
    }

    // =============================================================
    // ESTRATO 4: VISTAS DE CONSTRAINTS ESPECIALES
    // =============================================================

    /// Constraints efectivas de view_audit (bootstrap ve y streamea todo).
    pub async fn effective_view_audit(
        &self,
        caller: &CallerIdentity,
    ) -> Result<ViewAuditConstraints, ApiError> {
        if caller.is_bootstrap {
            return Ok(ViewAuditConstraints { can_view_all: true, can_stream: true });
        }

        let grants = self.grant_repository.active_grants_for_user(&caller.user_id).await?;
        let grant = grants
            .iter()
            .find(|grant| grant.action == ActionToken::ViewAudit.as_str())
            .ok_or_else(|| ApiError::forbidden("action 'view_audit' is not granted"))?;

        Ok(ViewAuditConstraints::from_json(&grant.constraints.clone().unwrap_or(json!({}))))
    }

    /// Conjunto de acciones que el llamador porta activas.
    pub async fn held_actions(&self, user_id: &str) -> Result<HashSet<String>, ApiError> {
        let grants = self.grant_repository.active_grants_for_user(user_id).await?;
        Ok(grants.into_iter().filter(|grant| grant.is_active).map(|grant| grant.action).collect())
    }

    pub fn limits(&self) -> &RuntimeLimits {
        &self.limits
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/services/auth_gate.rs]
