// INICIO DEL ARCHIVO [apps/orchestrator/src/errors.rs]
/*!
 * =================================================================
 * APARATO: API ERROR ENVELOPE (V10.2 - CLOSED CODE SET)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: MAPEO DE FALLOS TIPADOS AL ENVELOPE JSON SOBERANO
 *
 * # Contrato:
 * Todo fallo visible cruza la frontera HTTP como
 * `{error:true, message, code}` con status en {400,401,403,404,409,
 * 413,429,500}. Los códigos pertenecen a un conjunto cerrado de
 * constantes; jamás se improvisa un código nuevo en un handler.
 * =================================================================
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use stratavault_core_segment::SegmentError;
use stratavault_domain_authz::AuthzError;
use stratavault_infra_db::DbError;
use tracing::error;

// --- CONSTANTES DEL CONJUNTO CERRADO DE CÓDIGOS ---

pub const ASSET_NOT_FOUND: &str = "ASSET_NOT_FOUND";
pub const INVALID_HASH: &str = "INVALID_HASH";
pub const TOPIC_NOT_FOUND: &str = "TOPIC_NOT_FOUND";
pub const TOPIC_ALREADY_EXISTS: &str = "TOPIC_ALREADY_EXISTS";
pub const ASSET_TOO_LARGE: &str = "ASSET_TOO_LARGE";
pub const PRESET_NOT_FOUND: &str = "PRESET_NOT_FOUND";
pub const MISSING_PARAM: &str = "MISSING_PARAM";
pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
pub const INVALID_DOWNLOAD_MODE: &str = "INVALID_DOWNLOAD_MODE";
pub const INVALID_FILENAME_FORMAT: &str = "INVALID_FILENAME_FORMAT";
pub const BULK_DOWNLOAD_EMPTY: &str = "BULK_DOWNLOAD_EMPTY";
pub const DOWNLOAD_SESSION_NOT_FOUND: &str = "DOWNLOAD_SESSION_NOT_FOUND";
pub const NOT_CONFIGURED: &str = "NOT_CONFIGURED";
pub const AUTH_FORBIDDEN: &str = "AUTH_FORBIDDEN";
pub const AUTH_INVALID_CREDENTIALS: &str = "AUTH_INVALID_CREDENTIALS";
pub const AUTH_ACCOUNT_LOCKED: &str = "AUTH_ACCOUNT_LOCKED";
pub const AUTH_USER_EXISTS: &str = "AUTH_USER_EXISTS";
pub const AUTH_PASSWORD_TOO_WEAK: &str = "AUTH_PASSWORD_TOO_WEAK";
pub const AUTH_BOOTSTRAP_PROTECTED: &str = "AUTH_BOOTSTRAP_PROTECTED";
pub const AUTH_INVALID_CONSTRAINTS: &str = "AUTH_INVALID_CONSTRAINTS";
pub const AUTH_GRANT_ACTION_DENIED: &str = "AUTH_GRANT_ACTION_DENIED";
pub const AUTH_QUOTA_EXCEEDED: &str = "AUTH_QUOTA_EXCEEDED";
pub const AUDIT_INVALID_ACTION: &str = "AUDIT_INVALID_ACTION";
pub const METADATA_KEY_TOO_LONG: &str = "METADATA_KEY_TOO_LONG";
pub const METADATA_VALUE_TOO_LONG: &str = "METADATA_VALUE_TOO_LONG";
pub const METADATA_ERROR: &str = "METADATA_ERROR";
pub const BATCH_TOO_MANY_OPERATIONS: &str = "BATCH_TOO_MANY_OPERATIONS";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// Fallo tipado listo para cruzar la frontera HTTP.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into() }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, AUTH_INVALID_CREDENTIALS, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, AUTH_FORBIDDEN, message)
    }

    pub fn not_configured() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            NOT_CONFIGURED,
            "working directory has not been configured",
        )
    }

    /// Fallo interno: mensaje genérico hacia afuera, detalle al rastro.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!("💀 [INTERNAL_FAULT]: {}", detail);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR, "internal error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = json!({
            "error": true,
            "message": self.message,
            "code": self.code,
        });
        (self.status, Json(envelope)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(fault: DbError) -> Self {
        match fault {
            DbError::AssetNotFound => Self::not_found(ASSET_NOT_FOUND, "asset not found"),
            DbError::UserNotFound => Self::not_found(INVALID_REQUEST, "user not found"),
            DbError::UserAlreadyExists => {
                Self::conflict(AUTH_USER_EXISTS, "username already exists")
            }
            DbError::GrantNotFound => Self::not_found(INVALID_REQUEST, "grant not found"),
            DbError::SessionNotFound => Self::unauthorized("invalid session"),
            other => Self::internal(other),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(fault: AuthzError) -> Self {
        match fault {
            AuthzError::InvalidCredentials => Self::unauthorized("invalid credentials"),
            AuthzError::AccountLocked => Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                AUTH_ACCOUNT_LOCKED,
                "account is temporarily locked",
            ),
            AuthzError::Forbidden(action) => {
                Self::forbidden(format!("action '{}' is not granted", action))
            }
            AuthzError::ConstraintViolation(detail) => {
                Self::new(StatusCode::FORBIDDEN, AUTH_FORBIDDEN, detail)
            }
            AuthzError::InvalidConstraints(detail) => {
                Self::bad_request(AUTH_INVALID_CONSTRAINTS, detail)
            }
            AuthzError::QuotaExceeded { action, .. } => Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                AUTH_QUOTA_EXCEEDED,
                format!("daily quota exceeded for action '{}'", action),
            ),
            AuthzError::GrantActionDenied(action) => Self::new(
                StatusCode::FORBIDDEN,
                AUTH_GRANT_ACTION_DENIED,
                format!("granting action '{}' is not permitted", action),
            ),
            AuthzError::BootstrapProtected => Self::new(
                StatusCode::FORBIDDEN,
                AUTH_BOOTSTRAP_PROTECTED,
                "the bootstrap user cannot be degraded",
            ),
            AuthzError::PasswordTooWeak => Self::bad_request(
                AUTH_PASSWORD_TOO_WEAK,
                "password does not satisfy the minimum policy",
            ),
            AuthzError::UnknownAction(action) => {
                Self::bad_request(INVALID_REQUEST, format!("unknown action '{}'", action))
            }
        }
    }
}

impl From<SegmentError> for ApiError {
    fn from(fault: SegmentError) -> Self {
        match fault {
            SegmentError::RecordExceedsCapacity { .. } => Self::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                ASSET_TOO_LARGE,
                "payload exceeds the maximum segment capacity",
            ),
            other => Self::internal(other),
        }
    }
}

// FIN DEL ARCHIVO [apps/orchestrator/src/errors.rs]
