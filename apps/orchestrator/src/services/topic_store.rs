// INICIO DEL ARCHIVO [apps/orchestrator/src/services/topic_store.rs]
/*!
 * =================================================================
 * APARATO: TOPIC STORE SERVICE (V10.5 - DUAL UPDATE CORE)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: ORQUESTACIÓN SEGMENTO + CATÁLOGO BAJO CERROJO DE TÓPICO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. WRITE LOCK PHYSICS: Toda mutación (PutAsset, ApplyMetadata,
 *    RefreshStats, rodado) toma el cerrojo de escritura del tópico;
 *    las lecturas toman el compartido.
 * 2. CRASH REPAIR: Al abrir, el segmento activo se escanea y una cola
 *    truncada se recorta hasta el prefijo válido antes de aceptar
 *    escrituras nuevas.
 * 3. DEDUP NO-OP: Re-subir un payload idéntico devuelve skipped=true
 *    sin tocar el disco.
 * =================================================================
 */

use crate::state::now_unix;
use std::path::{Path, PathBuf};
use stratavault_core_segment::{
    content_hash_hex, parse_segment_sequence, read_payload_at, scan_segment, ScanTermination,
    SegmentCursor, SegmentWriter, GENESIS_CHAIN,
};
use stratavault_domain_models::{AssetRecord, IngestReceipt, TopicStatsDocument};
use stratavault_infra_db::repositories::catalogue::{LedgerUpdate, MetadataMutation};
use stratavault_infra_db::repositories::TopicCatalogueRepository;
use stratavault_infra_db::{DbError, LibsqlClient, SchemaProfile};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Segment(#[from] stratavault_core_segment::SegmentError),
    #[error("[L4_STORE_FAULT]: IO -> {0}")]
    Io(#[from] std::io::Error),
    /// El payload releído no reproduce su hash de contenido.
    #[error("[L4_STORE_FAULT]: READ_HASH_MISMATCH for {0}")]
    ReadHashMismatch(String),
}

/// Resultado de PutAsset junto al receipt público.
pub struct PutOutcome {
    pub receipt: IngestReceipt,
    /// Offset absoluto del payload (para el índice del orquestador).
    pub payload_offset: u64,
    pub rolled_segment: bool,
}

/**
 * Almacén vivo de un tópico: catálogo SQLite + segmentos .dat.
 */
pub struct TopicStore {
    pub name: String,
    pub directory: PathBuf,
    catalogue: TopicCatalogueRepository,
    writer: SegmentWriter,
    /// Cursor del segmento activo, custodiado por el cerrojo de escritura.
    write_cursor: RwLock<SegmentCursor>,
}

impl TopicStore {
    /**
     * Abre (o forja) el almacén de un tópico bajo el workdir.
     *
     * Reconstruye el cursor activo desde el ledger `dat_files` y repara
     * una cola truncada del último segmento si el proceso colapsó a
     * mitad de un anexado.
     */
    #[instrument(skip(maximum_segment_bytes))]
    pub async fn open(
        topic_name: &str,
        topic_directory: &Path,
        maximum_segment_bytes: u64,
    ) -> Result<Self, StoreError> {
        let internal_directory = topic_directory.join(".internal");
        tokio::fs::create_dir_all(&internal_directory).await?;

        let catalogue_path = internal_directory.join(format!("{}.db", topic_name));
        let catalogue_client = LibsqlClient::open(
            catalogue_path.to_str().unwrap_or_default(),
            SchemaProfile::TopicCatalogue,
        )
        .await?;
        let catalogue = TopicCatalogueRepository::new(catalogue_client);

        let write_cursor =
            Self::rebuild_cursor(topic_name, topic_directory, &catalogue).await?;

        Ok(Self {
            name: topic_name.to_string(),
            directory: topic_directory.to_path_buf(),
            catalogue,
            writer: SegmentWriter::new(topic_directory, maximum_segment_bytes),
            write_cursor: RwLock::new(write_cursor),
        })
    }

    async fn rebuild_cursor(
        topic_name: &str,
        topic_directory: &Path,
        catalogue: &TopicCatalogueRepository,
    ) -> Result<SegmentCursor, StoreError> {
        let Some(newest) = catalogue.newest_ledger_row().await? else {
            return Ok(SegmentCursor::genesis());
        };

        let sequence = parse_segment_sequence(&newest.name).unwrap_or(1);
        let segment_path = topic_directory.join(&newest.name);

        if !segment_path.exists() {
            warn!("⚠️ [STORE_REPAIR]: Ledger references missing segment {} in '{}'.",
                newest.name, topic_name);
            return Ok(SegmentCursor::genesis());
        }

        // Escaneo estructural + reparación de cola truncada.
        let scan_report = scan_segment(&segment_path)?;
        if let ScanTermination::TruncatedTail { at_offset } = scan_report.termination {
            warn!(
                "🔧 [STORE_REPAIR]: Truncating torn tail of {} at byte {} in '{}'.",
                newest.name, at_offset, topic_name
            );
            let repair_file = std::fs::OpenOptions::new().write(true).open(&segment_path)?;
            repair_file.set_len(scan_report.valid_prefix_bytes)?;
        }

        let recomputed_chain_hex = hex::encode(scan_report.chain);
        if recomputed_chain_hex != newest.chain_hash
            || scan_report.records.len() as i64 != newest.record_count
        {
            warn!(
                "⚠️ [STORE_REPAIR]: Ledger drift on {} in '{}' (ledger {} records, disk {}).",
                newest.name,
                topic_name,
                newest.record_count,
                scan_report.records.len()
            );
        }

        Ok(SegmentCursor {
            sequence,
            occupied_bytes: scan_report.valid_prefix_bytes,
            record_count: scan_report.records.len() as u64,
            chain: scan_report.chain,
        })
    }

    /// Verdadero si la trama jamás cabría en un segmento vacío.
    pub fn payload_exceeds_capacity(&self, payload_length: u64) -> bool {
        self.writer.frame_exceeds_segment_capacity(payload_length)
    }

    // =============================================================
    // ESTRATO 1: PUT / GET
    // =============================================================

    /**
     * PutAsset: dedup por hash, anexado al segmento activo y commit
     * transaccional de fila + ledger. Devuelve skipped=true si el
     * payload ya residía en el tópico.
     */
    #[instrument(skip(self, payload, extension, origin_name, parent_hash))]
    pub async fn put_asset(
        &self,
        payload: &[u8],
        extension: &str,
        origin_name: &str,
        parent_hash: Option<String>,
    ) -> Result<PutOutcome, StoreError> {
        let payload_hash = content_hash_hex(payload);
        let mut cursor_guard = self.write_cursor.write().await;

        if self.catalogue.asset_exists(&payload_hash).await? {
            let existing = self
                .catalogue
                .get_asset(&payload_hash)
                .await?
                .ok_or(DbError::AssetNotFound)?;
            return Ok(PutOutcome {
                receipt: IngestReceipt {
                    hash: payload_hash,
                    topic: self.name.clone(),
                    size: payload.len() as u64,
                    skipped: true,
                    dat_file: existing.dat_file,
                },
                payload_offset: 0,
                rolled_segment: false,
            });
        }

        let append_receipt = self.writer.append_record(&cursor_guard, payload, &payload_hash)?;
        let created_at = now_unix();

        let asset_row = AssetRecord {
            hash: payload_hash.clone(),
            size: payload.len() as u64,
            extension: extension.to_string(),
            origin_name: origin_name.to_string(),
            parent_hash,
            created_at,
            dat_file: append_receipt.dat_file.clone(),
        };
        let ledger_update = LedgerUpdate {
            dat_file: append_receipt.dat_file.clone(),
            record_count: append_receipt.cursor.record_count as i64,
            chain_hash: append_receipt.cursor.chain_hex(),
            updated_at: created_at,
        };

        self.catalogue.insert_asset_with_ledger(&asset_row, &ledger_update).await?;
        *cursor_guard = append_receipt.cursor.clone();
        drop(cursor_guard);

        self.refresh_stats_internal().await?;

        info!("📦 [TOPIC_PUT]: '{}' sealed {} into {}.", self.name, &payload_hash[..8], append_receipt.dat_file);
        Ok(PutOutcome {
            receipt: IngestReceipt {
                hash: payload_hash,
                topic: self.name.clone(),
                size: payload.len() as u64,
                skipped: false,
                dat_file: append_receipt.dat_file,
            },
            payload_offset: append_receipt.payload_offset,
            rolled_segment: append_receipt.rolled,
        })
    }

    pub async fn get_asset(&self, hash: &str) -> Result<Option<AssetRecord>, StoreError> {
        let _read_guard = self.write_cursor.read().await;
        Ok(self.catalogue.get_asset(hash).await?)
    }

    /**
     * Lee el payload completo de un activo verificando su hash de
     * contenido. Una divergencia es corrupción, jamás un pánico.
     */
    pub async fn read_asset_payload(&self, record: &AssetRecord, offset: u64) -> Result<Vec<u8>, StoreError> {
        let _read_guard = self.write_cursor.read().await;
        let segment_path = self.directory.join(&record.dat_file);
        let payload = read_payload_at(&segment_path, offset, record.size)?;

        if content_hash_hex(&payload) != record.hash {
            return Err(StoreError::ReadHashMismatch(record.hash.clone()));
        }
        Ok(payload)
    }

    // =============================================================
    // ESTRATO 2: METADATOS
    // =============================================================

    /// Aplica una mutación de metadatos bajo el cerrojo de escritura.
    pub async fn apply_metadata(
        &self,
        asset_hash: &str,
        mutation: &MetadataMutation,
    ) -> Result<i64, StoreError> {
        let log_id = {
            let _write_guard = self.write_cursor.write().await;
            self.catalogue.apply_metadata(asset_hash, mutation, now_unix()).await?
        };
        self.refresh_stats_internal().await?;
        Ok(log_id)
    }

    /// Lote por activo: una transacción cubre todas sus mutaciones.
    pub async fn apply_metadata_batch_for_asset(
        &self,
        asset_hash: &str,
        mutations: &[MetadataMutation],
    ) -> Result<Vec<i64>, StoreError> {
        let log_ids = {
            let _write_guard = self.write_cursor.write().await;
            self.catalogue
                .apply_metadata_batch_for_asset(asset_hash, mutations, now_unix())
                .await?
        };
        self.refresh_stats_internal().await?;
        Ok(log_ids)
    }

    pub async fn computed_metadata(&self, asset_hash: &str) -> Result<serde_json::Value, StoreError> {
        Ok(self.catalogue.get_computed_metadata(asset_hash).await?)
    }

    pub async fn metadata_log(
        &self,
        asset_hash: &str,
    ) -> Result<Vec<stratavault_domain_models::MetadataEventRow>, StoreError> {
        Ok(self.catalogue.get_metadata_log(asset_hash).await?)
    }

    // =============================================================
    // ESTRATO 3: CONSULTAS Y ESTADÍSTICAS
    // =============================================================

    /// Ejecuta una sentencia de preset bajo el cerrojo compartido.
    pub async fn execute_preset_statement(
        &self,
        sql: &str,
        parameter_values: Vec<libsql::Value>,
    ) -> Result<(Vec<String>, Vec<Vec<serde_json::Value>>), StoreError> {
        let _read_guard = self.write_cursor.read().await;
        Ok(self.catalogue.query_raw(sql, parameter_values).await?)
    }

    /// RefreshStats público e idempotente.
    pub async fn refresh_stats(&self) -> Result<TopicStatsDocument, StoreError> {
        let _write_guard = self.write_cursor.write().await;
        self.refresh_stats_internal().await
    }

    pub async fn read_stats(&self) -> Result<Option<TopicStatsDocument>, StoreError> {
        Ok(self.catalogue.read_stats().await?)
    }

    async fn refresh_stats_internal(&self) -> Result<TopicStatsDocument, StoreError> {
        let db_size_bytes = self.physical_size(&self.directory.join(".internal")).await;
        let dat_size_bytes = self.segments_physical_size().await;
        Ok(self.catalogue.refresh_stats(db_size_bytes, dat_size_bytes, now_unix()).await?)
    }

    async fn physical_size(&self, directory: &Path) -> u64 {
        let mut total: u64 = 0;
        if let Ok(mut entries) = tokio::fs::read_dir(directory).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                if let Ok(metadata) = entry.metadata().await {
                    if metadata.is_file() {
                        total += metadata.len();
                    }
                }
            }
        }
        total
    }

    async fn segments_physical_size(&self) -> u64 {
        let mut total: u64 = 0;
        if let Ok(mut entries) = tokio::fs::read_dir(&self.directory).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let file_name = entry.file_name().to_string_lossy().to_string();
                if parse_segment_sequence(&file_name).is_some() {
                    if let Ok(metadata) = entry.metadata().await {
                        total += metadata.len();
                    }
                }
            }
        }
        total
    }

    // =============================================================
    // ESTRATO 4: SOPORTE DE VERIFICACIÓN
    // =============================================================

    /// Acceso al catálogo para verificación e índice cruzado.
    pub fn catalogue(&self) -> &TopicCatalogueRepository {
        &self.catalogue
    }

    /// Cursor activo (instantánea para diagnóstico).
    pub async fn cursor_snapshot(&self) -> SegmentCursor {
        self.write_cursor.read().await.clone()
    }

    /// Cadena génesis expuesta para los replays de verificación.
    pub fn genesis_chain_hex() -> String {
        hex::encode(GENESIS_CHAIN)
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/services/topic_store.rs]
