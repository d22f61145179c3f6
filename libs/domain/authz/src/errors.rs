// [libs/domain/authz/src/errors.rs]
/*!
 * =================================================================
 * APARATO: AUTHORIZATION ERROR CATALOG (V8.0)
 * CLASIFICACIÓN: DOMAIN SECURITY (ESTRATO L2)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE AUTORIZACIÓN
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// Credencial ausente o inválida; también cubre usuario inexistente
    /// para impedir el oráculo de existencia.
    #[error("[L2_AUTH_FAULT]: INVALID_CREDENTIALS")]
    InvalidCredentials,

    /// La cuenta está bloqueada por la ventana de fuerza bruta.
    #[error("[L2_AUTH_FAULT]: ACCOUNT_LOCKED")]
    AccountLocked,

    /// El llamador no porta un grant activo para la acción.
    #[error("[L2_AUTH_FAULT]: FORBIDDEN action={0}")]
    Forbidden(String),

    /// Parámetros de la operación fuera de las constraints del grant.
    #[error("[L2_AUTH_FAULT]: CONSTRAINT_VIOLATION {0}")]
    ConstraintViolation(String),

    /// Constraints JSON malformadas contra el esquema de la acción.
    #[error("[L2_AUTH_FAULT]: INVALID_CONSTRAINTS {0}")]
    InvalidConstraints(String),

    /// La operación excedería la cuota diaria del llamador.
    #[error("[L2_AUTH_FAULT]: QUOTA_EXCEEDED action={action} day={day}")]
    QuotaExceeded { action: String, day: String },

    /// El llamador no puede conceder la acción solicitada.
    #[error("[L2_AUTH_FAULT]: GRANT_ACTION_DENIED action={0}")]
    GrantActionDenied(String),

    /// Intento de degradar al usuario bootstrap.
    #[error("[L2_AUTH_FAULT]: BOOTSTRAP_PROTECTED")]
    BootstrapProtected,

    /// La contraseña no satisface la política mínima.
    #[error("[L2_AUTH_FAULT]: PASSWORD_TOO_WEAK")]
    PasswordTooWeak,

    /// Token de acción fuera del conjunto cerrado.
    #[error("[L2_AUTH_FAULT]: UNKNOWN_ACTION {0}")]
    UnknownAction(String),
}
// FIN DEL ARCHIVO [libs/domain/authz/src/errors.rs]
