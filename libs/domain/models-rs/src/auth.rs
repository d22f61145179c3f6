// [libs/domain/models-rs/src/auth.rs]
/*!
 * =================================================================
 * APARATO: AUTH DOMAIN MODELS (V6.3 - IDENTITY CONTRACTS)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE USUARIOS, GRANTS, SESIONES Y CUOTAS
 *
 * # Invariantes:
 * Las contraseñas y tokens jamás viajan ni se persisten en claro: las
 * filas transportan únicamente hashes. El usuario bootstrap porta un
 * grant implícito sin restricciones sobre toda acción.
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/// Fila completa de la tabla `users` (solo para estratos internos).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    /// Minúsculas, `[a-z0-9_-]+`, 3–63 chars.
    pub username: String,
    pub display_name: String,
    /// Formato `pbkdf2$sha256$<iter>$<salt_b64>$<hash_b64>`.
    pub password_hash: String,
    /// SHA-256 hex del API key vigente.
    pub api_key_hash: String,
    pub is_active: bool,
    pub is_bootstrap: bool,
    pub failed_login_count: i64,
    /// Timestamp unix hasta el cual la cuenta está bloqueada.
    pub locked_until: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserAccount {
    /// Verdadero si el bloqueo por fuerza bruta sigue vigente.
    pub fn is_locked_at(&self, now_unix: i64) -> bool {
        matches!(self.locked_until, Some(locked_until) if locked_until > now_unix)
    }

    /// Proyección pública sin material criptográfico.
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            is_active: self.is_active,
            is_bootstrap: self.is_bootstrap,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Proyección de usuario apta para el envelope JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub is_active: bool,
    pub is_bootstrap: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Valida un username: minúsculas, dígitos, guiones, 3–63 chars.
pub fn validate_username(candidate: &str) -> bool {
    (3..=63).contains(&candidate.len())
        && candidate
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

/// Fila de la tabla `grants`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grant {
    pub id: String,
    pub user_id: String,
    /// Token de acción del conjunto cerrado (ver authz::ActionToken).
    pub action: String,
    /// Constraints JSON validadas contra el esquema por acción.
    pub constraints: Option<serde_json::Value>,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: i64,
}

/// Fila de la tabla `sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// SHA-256 hex del token opaco `sess_…`.
    pub token_hash: String,
    pub user_id: String,
    pub created_at: i64,
    pub last_seen_at: i64,
    pub expires_at: i64,
}

/// Método por el que un llamador quedó autenticado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    ApiKey,
    Session,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::ApiKey => "api_key",
            AuthMethod::Session => "session",
        }
    }
}

/// Identidad inyectada en el flujo de la petición por el middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: String,
    pub username: String,
    pub is_bootstrap: bool,
    pub method: AuthMethod,
}

/// Fila del ledger de cuotas por (usuario, acción, día UTC).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaDayRow {
    pub user_id: String,
    pub action: String,
    /// Día UTC `YYYY-MM-DD`.
    pub day: String,
    pub op_count: i64,
    pub volume_bytes: i64,
}

// FIN DEL ARCHIVO [libs/domain/models-rs/src/auth.rs]
