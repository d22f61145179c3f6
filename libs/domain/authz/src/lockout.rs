// [libs/domain/authz/src/lockout.rs]
/*!
 * =================================================================
 * APARATO: BRUTE-FORCE LOCKOUT POLICY (V8.1)
 * CLASIFICACIÓN: DOMAIN SECURITY (ESTRATO L2)
 * RESPONSABILIDAD: ARITMÉTICA PURA DE CONTADOR DE FALLOS Y VENTANA DE BLOQUEO
 * =================================================================
 */

/// Política configurable de bloqueo por fuerza bruta.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    /// Fallos consecutivos tolerados antes del bloqueo.
    pub max_failed_logins: i64,
    /// Duración de la ventana de bloqueo en segundos.
    pub lockout_window_seconds: i64,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self { max_failed_logins: 5, lockout_window_seconds: 900 }
    }
}

/// Resultado de registrar un fallo de login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureRegistration {
    pub failed_login_count: i64,
    /// Presente cuando el contador alcanzó el umbral.
    pub locked_until: Option<i64>,
}

/// Registra un fallo de login contra la política.
///
/// En el umbral, el bloqueo arranca en `now + window`. El contador
/// sigue subiendo durante la ventana; el éxito lo resetea (en el
/// estrato de aplicación).
pub fn register_login_failure(
    policy: &LockoutPolicy,
    current_failed_count: i64,
    now_unix: i64,
) -> FailureRegistration {
    let failed_login_count = current_failed_count + 1;
    let locked_until = if failed_login_count >= policy.max_failed_logins {
        Some(now_unix + policy.lockout_window_seconds)
    } else {
        None
    };
    FailureRegistration { failed_login_count, locked_until }
}

// FIN DEL ARCHIVO [libs/domain/authz/src/lockout.rs]
