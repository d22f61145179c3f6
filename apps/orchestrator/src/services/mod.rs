// [apps/orchestrator/src/services/mod.rs]
/**
 * =================================================================
 * APARATO: SERVICE ORCHESTRATION HUB (V10.0 - VAULT MATRIX)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE DAEMONS Y MOTORES
 *
 * VISION HIPER-HOLÍSTICA:
 * Actúa como la central de registro de la inteligencia del sistema.
 * 1. MODULARIDAD: Cada servicio opera como una unidad atómica aislada.
 * 2. TYPE SAFETY: Garantiza la visibilidad de los tipos de servicio
 *    en apps/ y en el proving grounds espejo.
 * =================================================================
 */

pub mod audit_trail;
pub mod auth_gate;
pub mod bulk_download;
pub mod metadata_pipeline;
pub mod naming;
pub mod preset_engine;
pub mod reconciliation;
pub mod topic_registry;
pub mod topic_store;
pub mod verification;

// --- RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS) ---

pub use audit_trail::AuditTrailService;
pub use auth_gate::AuthGate;
pub use bulk_download::BulkDownloadManager;
pub use preset_engine::PresetRegistry;
pub use topic_registry::TopicRegistry;
pub use topic_store::TopicStore;
