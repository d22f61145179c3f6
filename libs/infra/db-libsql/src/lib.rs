// [libs/infra/db-libsql/src/lib.rs]
/*!
 * =================================================================
 * APARATO: PERSISTENCE ADAPTER ROOT (V7.0 - DUAL STRATA)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DEL CLIENTE Y LOS REPOSITORIOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DUAL STRATA: Un mismo cliente libSQL sirve dos perfiles de
 *    esquema: el ledger del orquestador (.internal/orchestrator.db) y
 *    el catálogo local de cada tópico (<topic>/.internal/<topic>.db).
 * 2. ACCESS SOVEREIGNTY: Solo las estructuras de autoridad
 *    (repositorios) son expuestas al exterior.
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;
pub mod values;

pub use client::{LibsqlClient, SchemaProfile};
pub use errors::DbError;
pub use repositories::{
    AuditRepository, GrantRepository, IndexRepository, QuotaRepository, SessionRepository,
    TopicCatalogueRepository, UserRepository,
};
