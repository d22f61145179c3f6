// INICIO DEL ARCHIVO [libs/infra/db-libsql/src/repositories/catalogue.rs]
/*!
 * =================================================================
 * APARATO: TOPIC CATALOGUE REPOSITORY (V7.6 - ACID STRATA)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: ACTIVOS, LOG DE METADATOS, VISTA COMPUTADA Y LEDGER
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ACID PUT: La fila de activo y la fila de ledger del segmento se
 *    comprometen en una única transacción.
 * 2. FOLD MATERIALIZADO: Cada anexo al metadata_log actualiza la vista
 *    computada en la misma transacción; la vista siempre es derivable
 *    por replay del log.
 * 3. BATCH ISOLATION: La atomicidad de lotes es por activo, jamás
 *    cruzada: el fallo de un activo no revierte a sus vecinos.
 * =================================================================
 */

use crate::errors::DbError;
use crate::values::{get_i64, get_opt_f64, get_opt_i64, get_opt_string, get_string, sql_to_json};
use crate::LibsqlClient;
use libsql::{params, Connection, Value};
use serde_json::json;
use stratavault_domain_models::{
    coerce_numeric_value, AssetRecord, ExtensionBreakdownEntry, MetadataEventRow, MetadataOp,
    TopicStatsDocument,
};
use tracing::{debug, instrument};

/// Fila del ledger de segmentos `dat_files`.
#[derive(Debug, Clone)]
pub struct DatFileRow {
    pub name: String,
    pub record_count: i64,
    pub updated_at: i64,
    pub chain_hash: String,
}

/// Actualización de ledger que acompaña a un PutAsset.
#[derive(Debug, Clone)]
pub struct LedgerUpdate {
    pub dat_file: String,
    pub record_count: i64,
    pub chain_hash: String,
    pub updated_at: i64,
}

/// Una operación de metadatos lista para el fold.
#[derive(Debug, Clone)]
pub struct MetadataMutation {
    pub op: MetadataOp,
    pub key: String,
    pub value: String,
    pub processor: String,
    pub processor_version: String,
}

pub struct TopicCatalogueRepository {
    database_client: LibsqlClient,
}

impl TopicCatalogueRepository {
    pub fn new(client: LibsqlClient) -> Self {
        Self { database_client: client }
    }

    // =============================================================
    // ESTRATO 1: ACTIVOS Y LEDGER DE SEGMENTOS
    // =============================================================

    pub async fn asset_exists(&self, hash: &str) -> Result<bool, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query("SELECT 1 FROM assets WHERE hash = ?1", params![hash])
            .await?;
        Ok(rows.next().await?.is_some())
    }

    /// Compromete la fila de activo, el ledger del segmento y la vista
    /// computada vacía en una única transacción.
    #[instrument(skip(self, asset, ledger))]
    pub async fn insert_asset_with_ledger(
        &self,
        asset: &AssetRecord,
        ledger: &LedgerUpdate,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        transaction
            .execute(
                r#"
                INSERT INTO assets (hash, size, extension, origin_name, parent_hash, created_at, dat_file)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    asset.hash.clone(),
                    asset.size as i64,
                    asset.extension.clone(),
                    asset.origin_name.clone(),
                    asset.parent_hash.clone(),
                    asset.created_at,
                    asset.dat_file.clone()
                ],
            )
            .await?;

        transaction
            .execute(
                r#"
                INSERT INTO dat_files (name, record_count, updated_at, chain_hash)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (name) DO UPDATE SET
                    record_count = excluded.record_count,
                    updated_at = excluded.updated_at,
                    chain_hash = excluded.chain_hash
                "#,
                params![
                    ledger.dat_file.clone(),
                    ledger.record_count,
                    ledger.updated_at,
                    ledger.chain_hash.clone()
                ],
            )
            .await?;

        transaction
            .execute(
                r#"
                INSERT INTO metadata_computed (asset_hash, document, updated_at)
                VALUES (?1, '{}', ?2)
                ON CONFLICT (asset_hash) DO NOTHING
                "#,
                params![asset.hash.clone(), asset.created_at],
            )
            .await?;

        transaction
            .commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        debug!("💾 [CATALOGUE_PUT]: Asset {} sealed into {}.", &asset.hash[..8], asset.dat_file);
        Ok(())
    }

    pub async fn get_asset(&self, hash: &str) -> Result<Option<AssetRecord>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT hash, size, extension, origin_name, parent_hash, created_at, dat_file
                 FROM assets WHERE hash = ?1",
                params![hash],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::map_asset(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_asset_hashes(&self) -> Result<Vec<String>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query("SELECT hash FROM assets ORDER BY hash ASC", ())
            .await?;
        let mut hashes = Vec::new();
        while let Some(row) = rows.next().await? {
            hashes.push(get_string(&row, 0)?);
        }
        Ok(hashes)
    }

    pub async fn count_assets(&self) -> Result<i64, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection.query("SELECT COUNT(*) FROM assets", ()).await?;
        match rows.next().await? {
            Some(row) => get_i64(&row, 0),
            None => Ok(0),
        }
    }

    /// Filas completas del ledger de segmentos, por nombre ascendente.
    pub async fn ledger_rows(&self) -> Result<Vec<DatFileRow>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT name, record_count, updated_at, chain_hash FROM dat_files ORDER BY name ASC",
                (),
            )
            .await?;
        let mut ledger = Vec::new();
        while let Some(row) = rows.next().await? {
            ledger.push(DatFileRow {
                name: get_string(&row, 0)?,
                record_count: get_i64(&row, 1)?,
                updated_at: get_i64(&row, 2)?,
                chain_hash: get_string(&row, 3)?,
            });
        }
        Ok(ledger)
    }

    /// Fila de ledger del segmento de mayor secuencia (cursor activo).
    pub async fn newest_ledger_row(&self) -> Result<Option<DatFileRow>, DbError> {
        let mut ledger = self.ledger_rows().await?;
        Ok(ledger.pop())
    }

    // =============================================================
    // ESTRATO 2: METADATOS (LOG + FOLD)
    // =============================================================

    /// Aplica una mutación de metadatos: anexa al log y pliega la vista
    /// computada en una única transacción. Devuelve el id del log.
    #[instrument(skip(self, mutation))]
    pub async fn apply_metadata(
        &self,
        asset_hash: &str,
        mutation: &MetadataMutation,
        now_unix: i64,
    ) -> Result<i64, DbError> {
        let connection = self.database_client.get_connection()?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        let log_id = Self::apply_single_mutation(&transaction, asset_hash, mutation, now_unix).await?;

        transaction
            .commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        Ok(log_id)
    }

    /// Aplica todas las mutaciones de UN activo en una transacción.
    /// El fallo de cualquiera revierte el lote completo de ese activo.
    #[instrument(skip(self, mutations))]
    pub async fn apply_metadata_batch_for_asset(
        &self,
        asset_hash: &str,
        mutations: &[MetadataMutation],
        now_unix: i64,
    ) -> Result<Vec<i64>, DbError> {
        let connection = self.database_client.get_connection()?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        let mut log_ids = Vec::with_capacity(mutations.len());
        for mutation in mutations {
            match Self::apply_single_mutation(&transaction, asset_hash, mutation, now_unix).await {
                Ok(log_id) => log_ids.push(log_id),
                Err(fault) => {
                    let _ = transaction.rollback().await;
                    return Err(fault);
                }
            }
        }

        transaction
            .commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        Ok(log_ids)
    }

    async fn apply_single_mutation(
        transaction: &libsql::Transaction,
        asset_hash: &str,
        mutation: &MetadataMutation,
        now_unix: i64,
    ) -> Result<i64, DbError> {
        // El activo debe existir en este catálogo.
        let mut probe = transaction
            .query("SELECT 1 FROM assets WHERE hash = ?1", params![asset_hash])
            .await?;
        if probe.next().await?.is_none() {
            return Err(DbError::AssetNotFound);
        }

        let value_numeric = match mutation.op {
            MetadataOp::Set => coerce_numeric_value(&mutation.value),
            MetadataOp::Delete => None,
        };

        let mut inserted = transaction
            .query(
                r#"
                INSERT INTO metadata_log
                    (asset_hash, op, key, value, value_numeric, processor, processor_version, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                RETURNING id
                "#,
                params![
                    asset_hash,
                    mutation.op.as_str(),
                    mutation.key.clone(),
                    mutation.value.clone(),
                    value_numeric,
                    mutation.processor.clone(),
                    mutation.processor_version.clone(),
                    now_unix
                ],
            )
            .await?;
        let log_id = match inserted.next().await? {
            Some(row) => get_i64(&row, 0)?,
            None => return Err(DbError::MappingError("metadata_log returned no id".into())),
        };

        // Fold sobre la vista materializada.
        let mut computed_rows = transaction
            .query(
                "SELECT document FROM metadata_computed WHERE asset_hash = ?1",
                params![asset_hash],
            )
            .await?;
        let mut document: serde_json::Value = match computed_rows.next().await? {
            Some(row) => serde_json::from_str(&get_string(&row, 0)?)
                .unwrap_or_else(|_| json!({})),
            None => json!({}),
        };

        let map = document
            .as_object_mut()
            .ok_or_else(|| DbError::MappingError("computed document is not an object".into()))?;
        match mutation.op {
            MetadataOp::Set => {
                // Valores numéricos pliegan como números JSON (enteros sin
                // parte fraccional); el resto permanece textual verbatim.
                let folded_value = match value_numeric {
                    Some(numeric)
                        if numeric.fract() == 0.0
                            && numeric >= i64::MIN as f64
                            && numeric <= i64::MAX as f64 =>
                    {
                        json!(numeric as i64)
                    }
                    Some(numeric) => json!(numeric),
                    None => serde_json::Value::String(mutation.value.clone()),
                };
                map.insert(mutation.key.clone(), folded_value);
            }
            MetadataOp::Delete => {
                map.remove(&mutation.key);
            }
        }

        transaction
            .execute(
                r#"
                INSERT INTO metadata_computed (asset_hash, document, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT (asset_hash) DO UPDATE SET
                    document = excluded.document,
                    updated_at = excluded.updated_at
                "#,
                params![asset_hash, document.to_string(), now_unix],
            )
            .await?;

        Ok(log_id)
    }

    /// Documento computado de un activo (objeto vacío si jamás mutó).
    pub async fn get_computed_metadata(&self, asset_hash: &str) -> Result<serde_json::Value, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT document FROM metadata_computed WHERE asset_hash = ?1",
                params![asset_hash],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(serde_json::from_str(&get_string(&row, 0)?).unwrap_or_else(|_| json!({}))),
            None => Ok(json!({})),
        }
    }

    /// Log completo de un activo ordenado por id ascendente.
    pub async fn get_metadata_log(&self, asset_hash: &str) -> Result<Vec<MetadataEventRow>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                r#"
                SELECT id, asset_hash, op, key, value, value_numeric, processor, processor_version, created_at
                FROM metadata_log WHERE asset_hash = ?1 ORDER BY id ASC
                "#,
                params![asset_hash],
            )
            .await?;

        let mut events = Vec::new();
        while let Some(row) = rows.next().await? {
            let op_token = get_string(&row, 2)?;
            let op = MetadataOp::parse(&op_token)
                .ok_or_else(|| DbError::MappingError(format!("unknown op token '{}'", op_token)))?;
            events.push(MetadataEventRow {
                id: get_i64(&row, 0)?,
                asset_hash: get_string(&row, 1)?,
                op,
                key: get_string(&row, 3)?,
                value: get_string(&row, 4)?,
                value_numeric: get_opt_f64(&row, 5)?,
                processor: get_string(&row, 6)?,
                processor_version: get_string(&row, 7)?,
                created_at: get_i64(&row, 8)?,
            });
        }
        Ok(events)
    }

    // =============================================================
    // ESTRATO 3: EJECUCIÓN DE PRESETS (SQL PARAMETRIZADO)
    // =============================================================

    /// Ejecuta una sentencia parametrizada arbitraria (inyectada por el
    /// motor de presets) devolviendo columnas y filas JSON.
    pub async fn query_raw(
        &self,
        sql: &str,
        parameter_values: Vec<Value>,
    ) -> Result<(Vec<String>, Vec<Vec<serde_json::Value>>), DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection.query(sql, parameter_values).await?;

        let column_total = rows.column_count();
        let mut columns = Vec::with_capacity(column_total as usize);
        for index in 0..column_total {
            columns.push(rows.column_name(index).unwrap_or("").to_string());
        }

        let mut result_rows = Vec::new();
        while let Some(row) = rows.next().await? {
            let mut projected = Vec::with_capacity(column_total as usize);
            for index in 0..column_total {
                projected.push(sql_to_json(row.get_value(index)?));
            }
            result_rows.push(projected);
        }
        Ok((columns, result_rows))
    }

    // =============================================================
    // ESTRATO 4: CACHÉ DE ESTADÍSTICAS
    // =============================================================

    /// Recomputa el documento de estadísticas y lo sella en la caché.
    /// Idempotente. Los tamaños físicos (db, segmentos) los aporta el
    /// llamador, que conoce el filesystem del tópico.
    #[instrument(skip(self))]
    pub async fn refresh_stats(
        &self,
        db_size_bytes: u64,
        dat_size_bytes: u64,
        now_unix: i64,
    ) -> Result<TopicStatsDocument, DbError> {
        let connection = self.database_client.get_connection()?;
        let document = self.compute_stats_document(&connection, db_size_bytes, dat_size_bytes).await?;

        let serialized = serde_json::to_string(&document)
            .map_err(|e| DbError::MappingError(format!("stats document: {}", e)))?;
        connection
            .execute(
                r#"
                INSERT INTO topic_stats (id, document, refreshed_at)
                VALUES (1, ?1, ?2)
                ON CONFLICT (id) DO UPDATE SET
                    document = excluded.document,
                    refreshed_at = excluded.refreshed_at
                "#,
                params![serialized, now_unix],
            )
            .await?;
        Ok(document)
    }

    /// Lee la caché sellada; None si jamás se refrescó.
    pub async fn read_stats(&self) -> Result<Option<TopicStatsDocument>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query("SELECT document FROM topic_stats WHERE id = 1", ())
            .await?;
        match rows.next().await? {
            Some(row) => {
                let raw = get_string(&row, 0)?;
                let document = serde_json::from_str(&raw)
                    .map_err(|e| DbError::MappingError(format!("stats cache: {}", e)))?;
                Ok(Some(document))
            }
            None => Ok(None),
        }
    }

    async fn compute_stats_document(
        &self,
        connection: &Connection,
        db_size_bytes: u64,
        dat_size_bytes: u64,
    ) -> Result<TopicStatsDocument, DbError> {
        // Escalares base en una pasada.
        let mut scalar_rows = connection
            .query(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(size), 0),
                    COUNT(DISTINCT CASE WHEN extension != '' THEN extension END),
                    COUNT(CASE WHEN parent_hash IS NOT NULL THEN 1 END),
                    COUNT(CASE WHEN parent_hash IS NULL THEN 1 END),
                    MIN(created_at),
                    MAX(created_at)
                FROM assets
                "#,
                (),
            )
            .await?;
        let scalar_row = scalar_rows
            .next()
            .await?
            .ok_or_else(|| DbError::MappingError("stats scalar row missing".into()))?;

        let file_count = get_i64(&scalar_row, 0)? as u64;
        let total_size_bytes = get_i64(&scalar_row, 1)? as u64;
        let unique_extension_count = get_i64(&scalar_row, 2)? as u64;
        let versioned_count = get_i64(&scalar_row, 3)? as u64;
        let root_count = get_i64(&scalar_row, 4)? as u64;
        let oldest_asset_at = get_opt_i64(&scalar_row, 5)?;
        let newest_asset_at = get_opt_i64(&scalar_row, 6)?;

        // Padres declarados que no existen en el tópico.
        let mut orphan_rows = connection
            .query(
                r#"
                SELECT COUNT(*) FROM assets a
                WHERE a.parent_hash IS NOT NULL
                  AND NOT EXISTS (SELECT 1 FROM assets p WHERE p.hash = a.parent_hash)
                "#,
                (),
            )
            .await?;
        let orphan_count = match orphan_rows.next().await? {
            Some(row) => get_i64(&row, 0)? as u64,
            None => 0,
        };

        // Cobertura de metadatos y promedio de claves por activo.
        let mut coverage_count: u64 = 0;
        let mut total_keys: u64 = 0;
        let mut computed_rows = connection
            .query("SELECT document FROM metadata_computed", ())
            .await?;
        while let Some(row) = computed_rows.next().await? {
            let document: serde_json::Value =
                serde_json::from_str(&get_string(&row, 0)?).unwrap_or_else(|_| json!({}));
            let keys = document.as_object().map(|map| map.len()).unwrap_or(0) as u64;
            if keys > 0 {
                coverage_count += 1;
            }
            total_keys += keys;
        }
        let average_metadata_keys_per_asset = if file_count > 0 {
            total_keys as f64 / file_count as f64
        } else {
            0.0
        };

        // Ledger de segmentos.
        let ledger = self.ledger_rows().await?;
        let dat_files: Vec<String> = ledger.iter().map(|row| row.name.clone()).collect();

        // Desglose por extensión.
        let mut breakdown_rows = connection
            .query(
                "SELECT extension, COUNT(*) FROM assets GROUP BY extension ORDER BY COUNT(*) DESC, extension ASC",
                (),
            )
            .await?;
        let mut extension_breakdown = Vec::new();
        while let Some(row) = breakdown_rows.next().await? {
            extension_breakdown.push(ExtensionBreakdownEntry {
                extension: get_string(&row, 0)?,
                count: get_i64(&row, 1)? as u64,
            });
        }

        // Último activo sellado.
        let mut last_rows = connection
            .query(
                "SELECT hash, created_at FROM assets ORDER BY created_at DESC, hash DESC LIMIT 1",
                (),
            )
            .await?;
        let (last_hash, last_upload_at) = match last_rows.next().await? {
            Some(row) => (Some(get_string(&row, 0)?), Some(get_i64(&row, 1)?)),
            None => (None, None),
        };

        Ok(TopicStatsDocument {
            file_count,
            total_size_bytes,
            db_size_bytes,
            dat_size_bytes,
            unique_extension_count,
            versioned_count,
            root_count,
            orphan_count,
            metadata_coverage_count: coverage_count,
            average_metadata_keys_per_asset,
            dat_file_count: dat_files.len() as u64,
            dat_files,
            extension_breakdown,
            last_hash,
            last_upload_at,
            oldest_asset_at,
            newest_asset_at,
        })
    }

    fn map_asset(row: &libsql::Row) -> Result<AssetRecord, DbError> {
        Ok(AssetRecord {
            hash: get_string(row, 0)?,
            size: get_i64(row, 1)? as u64,
            extension: get_string(row, 2)?,
            origin_name: get_string(row, 3)?,
            parent_hash: get_opt_string(row, 4)?,
            created_at: get_i64(row, 5)?,
            dat_file: get_string(row, 6)?,
        })
    }
}
// FIN DEL ARCHIVO [libs/infra/db-libsql/src/repositories/catalogue.rs]
