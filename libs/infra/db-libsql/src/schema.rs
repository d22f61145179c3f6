// [libs/infra/db-libsql/src/schema.rs]
/**
 * =================================================================
 * APARATO: SOVEREIGN DATABASE SCHEMA (V7.1 - DUAL STRATA)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. DUAL STRATA: Perfil de orquestador (índice, auditoría, identidad)
 *    y perfil de catálogo por tópico (activos, metadatos, segmentos).
 * 2. IDEMPOTENCIA: Todo CREATE es IF NOT EXISTS; re-aplicar el esquema
 *    sobre una base viva es un no-op.
 * 3. PERFORMANCE: Índices de aceleración para filtros de auditoría y
 *    recorridos de metadatos.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument};

/**
 * ESTRATO ORQUESTADOR: Génesis de tablas process-wide.
 */
const ORCHESTRATOR_TABLES: &[(&str, &str)] = &[
    ("TABLE_ASSET_INDEX", r#"
        CREATE TABLE IF NOT EXISTS asset_index (
            hash TEXT NOT NULL,
            topic TEXT NOT NULL,
            dat_file TEXT NOT NULL,
            byte_offset INTEGER NOT NULL,
            size INTEGER NOT NULL,
            PRIMARY KEY (hash, topic)
        );
    "#),
    ("TABLE_AUDIT_LOG", r#"
        CREATE TABLE IF NOT EXISTS audit_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at INTEGER NOT NULL,
            action TEXT NOT NULL,
            source_ip TEXT NOT NULL DEFAULT '',
            username TEXT NOT NULL DEFAULT '',
            details TEXT NOT NULL DEFAULT '{}'
        );
    "#),
    ("TABLE_USERS", r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL DEFAULT '',
            password_hash TEXT NOT NULL,
            api_key_hash TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_bootstrap INTEGER NOT NULL DEFAULT 0,
            failed_login_count INTEGER NOT NULL DEFAULT 0,
            locked_until INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
    "#),
    ("TABLE_GRANTS", r#"
        CREATE TABLE IF NOT EXISTS grants (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            action TEXT NOT NULL,
            constraints_json TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_by TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
    "#),
    ("TABLE_SESSIONS", r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token_hash TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            last_seen_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        );
    "#),
    ("TABLE_QUOTA_LEDGER", r#"
        CREATE TABLE IF NOT EXISTS quota_ledger (
            user_id TEXT NOT NULL,
            action TEXT NOT NULL,
            day TEXT NOT NULL,
            op_count INTEGER NOT NULL DEFAULT 0,
            volume_bytes INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (user_id, action, day)
        );
    "#),
];

/**
 * ESTRATO ORQUESTADOR: Índices de aceleración.
 */
const ORCHESTRATOR_INDEXES: &[(&str, &str)] = &[
    ("IDX_INDEX_TOPIC", "CREATE INDEX IF NOT EXISTS idx_asset_index_topic ON asset_index(topic);"),
    ("IDX_AUDIT_ACTION", "CREATE INDEX IF NOT EXISTS idx_audit_action ON audit_log(action);"),
    ("IDX_AUDIT_USERNAME", "CREATE INDEX IF NOT EXISTS idx_audit_username ON audit_log(username);"),
    ("IDX_AUDIT_CREATED", "CREATE INDEX IF NOT EXISTS idx_audit_created ON audit_log(created_at);"),
    ("IDX_GRANTS_USER", "CREATE INDEX IF NOT EXISTS idx_grants_user ON grants(user_id, is_active);"),
    ("IDX_SESSIONS_USER", "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);"),
];

/**
 * ESTRATO CATÁLOGO: Génesis de tablas por tópico.
 */
const TOPIC_CATALOGUE_TABLES: &[(&str, &str)] = &[
    ("TABLE_ASSETS", r#"
        CREATE TABLE IF NOT EXISTS assets (
            hash TEXT PRIMARY KEY,
            size INTEGER NOT NULL,
            extension TEXT NOT NULL DEFAULT '',
            origin_name TEXT NOT NULL DEFAULT '',
            parent_hash TEXT,
            created_at INTEGER NOT NULL,
            dat_file TEXT NOT NULL
        );
    "#),
    ("TABLE_METADATA_LOG", r#"
        CREATE TABLE IF NOT EXISTS metadata_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            asset_hash TEXT NOT NULL,
            op TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL DEFAULT '',
            value_numeric REAL,
            processor TEXT NOT NULL DEFAULT '',
            processor_version TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL
        );
    "#),
    ("TABLE_METADATA_COMPUTED", r#"
        CREATE TABLE IF NOT EXISTS metadata_computed (
            asset_hash TEXT PRIMARY KEY,
            document TEXT NOT NULL DEFAULT '{}',
            updated_at INTEGER NOT NULL
        );
    "#),
    ("TABLE_DAT_FILES", r#"
        CREATE TABLE IF NOT EXISTS dat_files (
            name TEXT PRIMARY KEY,
            record_count INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL,
            chain_hash TEXT NOT NULL
        );
    "#),
    ("TABLE_TOPIC_STATS", r#"
        CREATE TABLE IF NOT EXISTS topic_stats (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            document TEXT NOT NULL DEFAULT '{}',
            refreshed_at INTEGER NOT NULL
        );
    "#),
];

/**
 * ESTRATO CATÁLOGO: Índices de aceleración.
 */
const TOPIC_CATALOGUE_INDEXES: &[(&str, &str)] = &[
    ("IDX_METADATA_LOG_ASSET", "CREATE INDEX IF NOT EXISTS idx_metadata_log_asset ON metadata_log(asset_hash, id);"),
    ("IDX_ASSETS_CREATED", "CREATE INDEX IF NOT EXISTS idx_assets_created ON assets(created_at);"),
    ("IDX_ASSETS_EXTENSION", "CREATE INDEX IF NOT EXISTS idx_assets_extension ON assets(extension);"),
    ("IDX_ASSETS_PARENT", "CREATE INDEX IF NOT EXISTS idx_assets_parent ON assets(parent_hash);"),
];

/**
 * Solidifica el esquema process-wide del orquestador.
 */
#[instrument(skip(database_connection))]
pub async fn apply_orchestrator_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Solidifying orchestrator strata V7.1...");
    solidify(database_connection, ORCHESTRATOR_TABLES).await?;
    solidify(database_connection, ORCHESTRATOR_INDEXES).await?;
    info!("✅ [SCHEMA_ENGINE]: Orchestrator ledger level and certified.");
    Ok(())
}

/**
 * Solidifica el esquema local de un catálogo de tópico.
 */
#[instrument(skip(database_connection))]
pub async fn apply_topic_catalogue_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Solidifying topic catalogue strata V7.1...");
    solidify(database_connection, TOPIC_CATALOGUE_TABLES).await?;
    solidify(database_connection, TOPIC_CATALOGUE_INDEXES).await?;
    Ok(())
}

async fn solidify(db: &Connection, strata: &[(&str, &str)]) -> Result<()> {
    for (identifier, sql) in strata {
        debug!("  ↳ Solidifying: {}", identifier);
        db.execute(*sql, ())
            .await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }
    Ok(())
}
// FIN DEL ARCHIVO [libs/infra/db-libsql/src/schema.rs]
