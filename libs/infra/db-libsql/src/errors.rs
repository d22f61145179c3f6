// [libs/infra/db-libsql/src/errors.rs]
/*!
 * =================================================================
 * APARATO: DATABASE ERROR CATALOG (V7.0 - VAULT STRATA)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PANOPTICON COMPLIANCE: Mensajes con prefijos de estrato para su
 *    renderizado cromático en observabilidad.
 * 2. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta.
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Error de apertura o enlace físico con el archivo SQLite.
    #[error("[L3_DB_LINK_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_DB_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el dominio.
    #[error("[L3_DB_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    /// Error al comprometer una secuencia multi-tabla.
    #[error("[L3_DB_FAULT]: TRANSACTION_COLLAPSE -> {0}")]
    TransactionError(String),

    // --- ESTRATO DE CATÁLOGO (ACTIVOS) ---

    /// El activo solicitado no existe en el catálogo consultado.
    #[error("[L3_CATALOGUE_FAULT]: ASSET_NOT_FOUND")]
    AssetNotFound,

    // --- ESTRATO DE GOBERNANZA DE IDENTIDAD ---

    /// La cuenta solicitada no existe.
    #[error("[L3_IDENTITY_FAULT]: USER_NOT_FOUND")]
    UserNotFound,

    /// Username ya tomado.
    #[error("[L3_IDENTITY_FAULT]: USER_ALREADY_EXISTS")]
    UserAlreadyExists,

    /// El grant solicitado no existe.
    #[error("[L3_IDENTITY_FAULT]: GRANT_NOT_FOUND")]
    GrantNotFound,

    /// La sesión presentada no existe o expiró.
    #[error("[L3_IDENTITY_FAULT]: SESSION_NOT_FOUND")]
    SessionNotFound,
}
// FIN DEL ARCHIVO [libs/infra/db-libsql/src/errors.rs]
