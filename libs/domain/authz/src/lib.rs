// [libs/domain/authz/src/lib.rs]
/*!
 * =================================================================
 * APARATO: AUTHORIZATION CORE (V8.0 - CONSTRAINT SOVEREIGNTY)
 * CLASIFICACIÓN: DOMAIN SECURITY (ESTRATO L2)
 * RESPONSABILIDAD: ACCIONES CERRADAS, CONSTRAINTS COMO DATOS Y CREDENCIALES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SCHEMAS AS DATA: El esquema de constraints por acción es una tabla
 *    declarativa registrada al arranque; el rechazo de campos
 *    desconocidos es uniforme y extensible.
 * 2. ZERO ORACLES: La física de login es indistinguible entre usuario
 *    inexistente y contraseña errónea.
 * 3. QUOTA PHYSICS: El ledger de cuotas solo se consume en éxito; la
 *    frontera (k+1) se rechaza con AUTH_QUOTA_EXCEEDED.
 * =================================================================
 */

pub mod actions;
pub mod constraints;
pub mod credentials;
pub mod errors;
pub mod evaluator;
pub mod lockout;

pub use actions::ActionToken;
pub use constraints::{
    constraint_schema_for, validate_constraints, ManageUsersConstraints, QueryConstraints,
    UploadConstraints, ViewAuditConstraints,
};
pub use credentials::{
    classify_bearer, constant_time_eq, credential_hash_hex, enforce_password_policy,
    hash_password, is_password_strong_enough, mint_api_key, mint_session_token, verify_password,
    CredentialKind, API_KEY_PREFIX, SESSION_TOKEN_PREFIX,
};
pub use errors::AuthzError;
pub use evaluator::{evaluate_constraints, quota_would_exceed, OperationContext, QuotaDemand};
pub use lockout::{register_login_failure, FailureRegistration, LockoutPolicy};
