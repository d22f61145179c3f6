// [libs/infra/db-libsql/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY ACCESS MATRIX (V7.0 - VAULT TOPOLOGY)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ORQUESTACIÓN DE SUBSISTEMAS DE PERSISTENCIA
 *
 * # Mathematical Proof (Modular Encapsulation):
 * El barrel file actúa como una interfaz galvánica. Los sub-módulos
 * permanecen aislados, y solo las estructuras de autoridad
 * (Repositories) son expuestas al exterior, reduciendo el
 * acoplamiento sistémico.
 * =================================================================
 */

// --- ESTRATO 1: CATÁLOGO DE ACTIVOS (POR TÓPICO) ---

/// Activos, log de metadatos, vista computada, ledger de segmentos y stats.
pub mod catalogue;

// --- ESTRATO 2: ÍNDICE Y AUDITORÍA (PROCESS-WIDE) ---

/// Mapeo hash -> (tópico, segmento, offset) del orquestador.
pub mod index_repository;
/// Log de auditoría durable con poda oldest-first.
pub mod audit_repository;

// --- ESTRATO 3: GOBERNANZA DE IDENTIDAD ---

/// Cuentas de usuario, lockout y material de credenciales.
pub mod user_repository;
/// Grants con constraints JSON por acción.
pub mod grant_repository;
/// Sesiones de corta vida.
pub mod session_repository;
/// Ledger de cuotas por (usuario, acción, día UTC).
pub mod quota_repository;

// --- RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS API) ---

pub use audit_repository::AuditRepository;
pub use catalogue::TopicCatalogueRepository;
pub use grant_repository::GrantRepository;
pub use index_repository::IndexRepository;
pub use quota_repository::QuotaRepository;
pub use session_repository::SessionRepository;
pub use user_repository::UserRepository;
