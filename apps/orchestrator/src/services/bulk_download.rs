// INICIO DEL ARCHIVO [apps/orchestrator/src/services/bulk_download.rs]
/*!
 * =================================================================
 * APARATO: BULK DOWNLOAD ENGINE (V10.7 - ZIP + SSE PIPELINE)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: ZIP SÍNCRONO Y SESIONES ASÍNCRONAS CON EVENTOS SSE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ONE PIPELINE, TWO SURFACES: La resolución de selección y el
 *    ensamblado ZIP son compartidos; el modo síncrono ensambla en
 *    memoria, el asíncrono materializa bajo .internal/downloads/.
 * 2. STRICT EVENT SEQUENCE: download_start primero; asset_progress y
 *    zip_progress intermedios; complete|error terminal; timestamps
 *    monótonos no decrecientes.
 * 3. SINGLE USE ARTIFACTS: El ZIP staged se sirve una única vez y se
 *    borra; el directorio se vacía íntegro en cada inicialización.
 * =================================================================
 */

use crate::errors::{
    ApiError, ASSET_NOT_FOUND, BULK_DOWNLOAD_EMPTY, DOWNLOAD_SESSION_NOT_FOUND,
    INVALID_DOWNLOAD_MODE, INVALID_FILENAME_FORMAT, INVALID_REQUEST, TOPIC_NOT_FOUND,
};
use crate::services::naming::{zip_entry_name, CollisionResolver};
use crate::services::preset_engine::{self, PresetRegistry};
use crate::services::topic_registry::TopicRegistry;
use crate::state::{now_unix, RuntimeLimits};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use stratavault_core_segment::read_payload_at;
use stratavault_domain_models::{
    AssetRecord, BulkDownloadRequest, DownloadManifest, DownloadMode, FailedManifestAsset,
    FilenameFormat, ManifestAsset,
};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Activo resuelto y listo para el ensamblado.
#[derive(Debug, Clone)]
pub struct ResolvedAsset {
    pub record: AssetRecord,
    pub topic: String,
    pub segment_path: PathBuf,
    pub payload_offset: u64,
    /// Nombre de entrada ZIP ya saneado y sin colisiones.
    pub entry_name: String,
    /// Documento de metadatos computados del activo.
    pub computed_metadata: serde_json::Value,
}

/// Informe de resolución de selección.
#[derive(Debug)]
pub struct ResolutionReport {
    pub assets: Vec<ResolvedAsset>,
    pub failed: Vec<FailedManifestAsset>,
    pub total_payload_bytes: u64,
    pub mode: DownloadMode,
    pub filename_format: FilenameFormat,
    pub include_metadata: bool,
}

/// Evento SSE del pipeline asíncrono: (nombre, payload).
pub type SessionEvent = (&'static str, serde_json::Value);

struct StagedSession {
    artifact_path: PathBuf,
    expires_at: i64,
}

pub struct BulkDownloadManager {
    downloads_directory: PathBuf,
    limits: RuntimeLimits,
    sessions: Mutex<HashMap<String, StagedSession>>,
}

impl BulkDownloadManager {
    /**
     * Inicializa el gestor vaciando el directorio de staging completo
     * (solo archivos dentro de él; jamás fuera).
     */
    #[instrument(skip(limits))]
    pub async fn initialize(downloads_directory: &Path, limits: RuntimeLimits) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(downloads_directory).await?;

        let mut purged = 0u32;
        let mut entries = tokio::fs::read_dir(downloads_directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                let _ = tokio::fs::remove_file(entry.path()).await;
                purged += 1;
            }
        }
        if purged > 0 {
            info!("🧹 [DOWNLOADS_INIT]: {} stale artifacts purged from staging.", purged);
        }

        Ok(Self {
            downloads_directory: downloads_directory.to_path_buf(),
            limits,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    // =============================================================
    // ESTRATO 1: RESOLUCIÓN DE SELECCIÓN
    // =============================================================

    /**
     * Resuelve la petición (modo ids o query) a activos concretos con
     * nombres de entrada ya deduplicados.
     */
    pub async fn resolve_selection(
        registry: &TopicRegistry,
        preset_registry: &PresetRegistry,
        request: &BulkDownloadRequest,
    ) -> Result<ResolutionReport, ApiError> {
        let mode = DownloadMode::parse(&request.mode).ok_or_else(|| {
            ApiError::bad_request(
                INVALID_DOWNLOAD_MODE,
                format!("download mode '{}' is not supported", request.mode),
            )
        })?;

        let filename_format = match &request.filename_format {
            None => FilenameFormat::default(),
            Some(token) => FilenameFormat::parse(token).ok_or_else(|| {
                ApiError::bad_request(
                    INVALID_FILENAME_FORMAT,
                    format!("filename format '{}' is not supported", token),
                )
            })?,
        };

        let candidate_hashes: Vec<String> = match mode {
            DownloadMode::Ids => request.asset_ids.clone(),
            DownloadMode::Query => {
                let preset_name = request.preset.as_deref().ok_or_else(|| {
                    ApiError::bad_request(INVALID_REQUEST, "query mode requires a preset name")
                })?;
                let preset = preset_engine::resolve_or_fault(preset_registry, preset_name)?;

                let stores = if request.topics.is_empty() {
                    registry.stores().await
                } else {
                    let mut selected = Vec::new();
                    for topic_name in &request.topics {
                        let store = registry.get(topic_name).await.ok_or_else(|| {
                            ApiError::not_found(
                                TOPIC_NOT_FOUND,
                                format!("topic '{}' does not exist", topic_name),
                            )
                        })?;
                        selected.push(store);
                    }
                    selected
                };

                let params = request.params.clone().unwrap_or(serde_json::json!({}));
                let execution =
                    preset_engine::execute_fanout(stores, preset_name, preset, &params).await?;
                let asset_id_column = execution
                    .columns
                    .iter()
                    .position(|column| column == "asset_id")
                    .ok_or_else(|| {
                        ApiError::bad_request(
                            INVALID_REQUEST,
                            "query result does not expose an asset_id column",
                        )
                    })?;
                execution
                    .rows
                    .iter()
                    .filter_map(|row| row.get(asset_id_column))
                    .filter_map(|cell| cell.as_str().map(str::to_string))
                    .collect()
            }
        };

        let mut collision_resolver = CollisionResolver::default();
        let mut assets = Vec::new();
        let mut failed = Vec::new();
        let mut total_payload_bytes = 0u64;

        for hash in candidate_hashes {
            match registry.locate_asset(&hash).await.map_err(ApiError::internal)? {
                Some((store, record)) => {
                    let computed_metadata = store
                        .computed_metadata(&record.hash)
                        .await
                        .unwrap_or(serde_json::json!({}));

                    let entry_name =
                        collision_resolver.resolve(zip_entry_name(&record, filename_format));
                    total_payload_bytes += record.size;
                    assets.push(ResolvedAsset {
                        segment_path: store.directory.join(&record.dat_file),
                        payload_offset: 0, // sellado por el índice más abajo
                        topic: store.name.clone(),
                        entry_name,
                        computed_metadata,
                        record,
                    });
                }
                None => failed.push(FailedManifestAsset {
                    hash,
                    error: ASSET_NOT_FOUND.to_string(),
                    topic: None,
                }),
            }
        }

        if assets.is_empty() {
            return Err(ApiError::bad_request(
                BULK_DOWNLOAD_EMPTY,
                "selection resolved to zero downloadable assets",
            ));
        }

        Ok(ResolutionReport {
            assets,
            failed,
            total_payload_bytes,
            mode,
            filename_format,
            include_metadata: request.include_metadata,
        })
    }

    /// Sella los offsets de payload desde el índice del orquestador.
    pub async fn seal_offsets(
        report: &mut ResolutionReport,
        index_repository: &stratavault_infra_db::repositories::IndexRepository,
    ) -> Result<(), ApiError> {
        for asset in &mut report.assets {
            let location = index_repository
                .locate_in_topic(&asset.record.hash, &asset.topic)
                .await?
                .ok_or_else(|| {
                    ApiError::not_found(ASSET_NOT_FOUND, "asset missing from orchestrator index")
                })?;
            asset.payload_offset = location.offset;
        }
        Ok(())
    }

    // =============================================================
    // ESTRATO 2: ENSAMBLADO ZIP
    // =============================================================

    /**
     * Ensambla el ZIP completo sobre cualquier Write+Seek.
     * Invoca `on_asset(index, entry_name, size)` tras sellar cada activo.
     */
    pub fn assemble_zip<W, F>(
        writer: W,
        report: &ResolutionReport,
        mut on_asset: F,
    ) -> Result<DownloadManifest, ApiError>
    where
        W: Write + std::io::Seek,
        F: FnMut(usize, &ResolvedAsset),
    {
        let mut zip_writer = ZipWriter::new(writer);
        let entry_options =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        // 1. MANIFIESTO
        let manifest = DownloadManifest {
            created_at: now_unix(),
            asset_count: report.assets.len(),
            total_size: report.total_payload_bytes,
            include_metadata: report.include_metadata,
            assets: report
                .assets
                .iter()
                .map(|asset| ManifestAsset {
                    hash: asset.record.hash.clone(),
                    filename: asset.entry_name.clone(),
                    size: asset.record.size,
                    extension: asset.record.extension.clone(),
                    origin_name: asset.record.origin_name.clone(),
                    topic: asset.topic.clone(),
                })
                .collect(),
            failed_assets: report.failed.clone(),
        };

        zip_writer
            .start_file("manifest.json", entry_options)
            .map_err(|fault| ApiError::internal(format!("zip manifest: {}", fault)))?;
        zip_writer
            .write_all(serde_json::to_string_pretty(&manifest).unwrap_or_default().as_bytes())
            .map_err(|fault| ApiError::internal(format!("zip manifest: {}", fault)))?;

        // 2. PAYLOADS (+ METADATOS OPCIONALES)
        for (asset_index, asset) in report.assets.iter().enumerate() {
            let payload =
                read_payload_at(&asset.segment_path, asset.payload_offset, asset.record.size)
                    .map_err(|fault| ApiError::internal(format!("payload read: {}", fault)))?;

            zip_writer
                .start_file(format!("assets/{}", asset.entry_name), entry_options)
                .map_err(|fault| ApiError::internal(format!("zip entry: {}", fault)))?;
            zip_writer
                .write_all(&payload)
                .map_err(|fault| ApiError::internal(format!("zip entry: {}", fault)))?;

            if report.include_metadata {
                let metadata_document = serde_json::json!({
                    "hash": asset.record.hash,
                    "topic": asset.topic,
                    "filename": asset.entry_name,
                    "origin_name": asset.record.origin_name,
                    "extension": asset.record.extension,
                    "size": asset.record.size,
                    "metadata": asset.computed_metadata,
                });
                let metadata_entry_name = format!("metadata/{}.json", asset.entry_name);
                zip_writer
                    .start_file(metadata_entry_name, entry_options)
                    .map_err(|fault| ApiError::internal(format!("zip metadata entry: {}", fault)))?;
                zip_writer
                    .write_all(
                        serde_json::to_string_pretty(&metadata_document)
                            .unwrap_or_default()
                            .as_bytes(),
                    )
                    .map_err(|fault| ApiError::internal(format!("zip metadata entry: {}", fault)))?;
            }

            on_asset(asset_index, asset);
        }

        zip_writer
            .finish()
            .map_err(|fault| ApiError::internal(format!("zip finish: {}", fault)))?;
        Ok(manifest)
    }

    /// Superficie síncrona: ensambla el ZIP completo en memoria.
    pub fn assemble_in_memory(report: &ResolutionReport) -> Result<(Vec<u8>, DownloadManifest), ApiError> {
        let mut buffer = Cursor::new(Vec::new());
        let manifest = Self::assemble_zip(&mut buffer, report, |_, _| {})?;
        Ok((buffer.into_inner(), manifest))
    }

    // =============================================================
    // ESTRATO 3: SESIONES ASÍNCRONAS (SSE)
    // =============================================================

    /**
     * Lanza el worker de staging y devuelve (download_id, receptor de
     * eventos). El worker respeta la secuencia estricta y finaliza o
     * borra el artefacto; jamás lo deja colgando.
     */
    pub fn spawn_session(
        self: &Arc<Self>,
        report: ResolutionReport,
    ) -> (String, mpsc::Receiver<SessionEvent>) {
        let download_id = Uuid::new_v4().to_string();
        let (event_sender, event_receiver) = mpsc::channel::<SessionEvent>(64);
        let manager = self.clone();
        let session_id = download_id.clone();

        tokio::spawn(async move {
            manager.run_staging_worker(session_id, report, event_sender).await;
        });

        (download_id, event_receiver)
    }

    async fn run_staging_worker(
        self: Arc<Self>,
        download_id: String,
        report: ResolutionReport,
        event_sender: mpsc::Sender<SessionEvent>,
    ) {
        let staging_started = Instant::now();
        let artifact_path = self.downloads_directory.join(format!("{}.zip", download_id));

        // EVENTO 1: download_start (siempre primero).
        let started = event_sender
            .send((
                "download_start",
                serde_json::json!({
                    "download_id": download_id,
                    "total_assets": report.assets.len(),
                    "total_bytes": report.total_payload_bytes,
                    "mode": report.mode.as_str(),
                    "timestamp": chrono::Utc::now().timestamp_millis(),
                }),
            ))
            .await;
        if started.is_err() {
            return; // Cliente desconectado antes de arrancar.
        }

        let assembly_outcome = self
            .stage_artifact(&download_id, &artifact_path, &report, &event_sender)
            .await;

        match assembly_outcome {
            Ok(artifact_size) => {
                let expires_at = now_unix() + self.limits.download_artifact_ttl_seconds;
                self.sessions.lock().await.insert(
                    download_id.clone(),
                    StagedSession { artifact_path: artifact_path.clone(), expires_at },
                );

                let _ = event_sender
                    .send((
                        "complete",
                        serde_json::json!({
                            "download_id": download_id,
                            "download_url": format!("/api/download/bulk/{}", download_id),
                            "total_assets": report.assets.len(),
                            "total_size": artifact_size,
                            "failed_assets": report.failed.len(),
                            "duration_ms": staging_started.elapsed().as_millis() as u64,
                            "expires_at": expires_at,
                            "timestamp": chrono::Utc::now().timestamp_millis(),
                        }),
                    ))
                    .await;
                info!("📦 [BULK_STAGE]: Session {} staged ({} bytes).", download_id, artifact_size);
            }
            Err(stage_fault) => {
                // El artefacto jamás queda colgando.
                let _ = tokio::fs::remove_file(&artifact_path).await;
                warn!("⚠️ [BULK_STAGE]: Session {} collapsed: {}", download_id, stage_fault.message);
                let _ = event_sender
                    .send((
                        "error",
                        serde_json::json!({
                            "download_id": download_id,
                            "message": stage_fault.message,
                            "code": stage_fault.code,
                            "timestamp": chrono::Utc::now().timestamp_millis(),
                        }),
                    ))
                    .await;
            }
        }
    }

    async fn stage_artifact(
        &self,
        download_id: &str,
        artifact_path: &Path,
        report: &ResolutionReport,
        event_sender: &mpsc::Sender<SessionEvent>,
    ) -> Result<u64, ApiError> {
        let artifact_file = std::fs::File::create(artifact_path)
            .map_err(|fault| ApiError::internal(format!("staging file: {}", fault)))?;

        let cadence = self.limits.asset_progress_cadence.max(1);
        let total_assets = report.assets.len();
        let total_bytes = report.total_payload_bytes.max(1);
        let mut streamed_bytes: u64 = 0;

        Self::assemble_zip(artifact_file, report, |asset_index, asset| {
            streamed_bytes += asset.record.size;

            // Cadencia mínima: uno cada N activos más el último.
            if asset_index % cadence == 0 || asset_index + 1 == total_assets {
                let _ = event_sender.try_send((
                    "asset_progress",
                    serde_json::json!({
                        "download_id": download_id,
                        "asset_index": asset_index,
                        "total_assets": total_assets,
                        "hash": asset.record.hash,
                        "topic": asset.topic,
                        "size": asset.record.size,
                        "filename": asset.entry_name,
                        "timestamp": chrono::Utc::now().timestamp_millis(),
                    }),
                ));
                let percent = (streamed_bytes as f64 / total_bytes as f64) * 100.0;
                let _ = event_sender.try_send((
                    "zip_progress",
                    serde_json::json!({
                        "download_id": download_id,
                        "bytes_written": streamed_bytes,
                        "total_bytes": report.total_payload_bytes,
                        "percent_complete": percent,
                        "timestamp": chrono::Utc::now().timestamp_millis(),
                    }),
                ));
            }
        })?;

        let artifact_size = std::fs::metadata(artifact_path)
            .map(|metadata| metadata.len())
            .unwrap_or(0);
        Ok(artifact_size)
    }

    // =============================================================
    // ESTRATO 4: ENTREGA SINGLE-USE
    // =============================================================

    /**
     * Reclama un artefacto staged: lo retira del mapa y devuelve su
     * ruta. El llamador lo sirve y lo borra (single-use).
     */
    pub async fn claim_artifact(&self, download_id: &str) -> Result<PathBuf, ApiError> {
        let staged = self.sessions.lock().await.remove(download_id);
        let Some(session) = staged else {
            return Err(ApiError::not_found(
                DOWNLOAD_SESSION_NOT_FOUND,
                "download session not found or already consumed",
            ));
        };

        if session.expires_at <= now_unix() || !session.artifact_path.exists() {
            let _ = tokio::fs::remove_file(&session.artifact_path).await;
            return Err(ApiError::not_found(
                DOWNLOAD_SESSION_NOT_FOUND,
                "download session expired",
            ));
        }
        Ok(session.artifact_path)
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/services/bulk_download.rs]
