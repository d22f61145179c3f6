// [apps/orchestrator/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN STATE ORCHESTRATOR (V10.1 - VAULT CORE)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: ORQUESTACIÓN DE REPOSITORIOS, SERVICIOS Y LÍMITES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DEFERRED IGNITION: El núcleo (CoreContext) nace en la llamada de
 *    configuración del directorio de trabajo, no en el arranque del
 *    proceso. Hasta entonces, toda ruta de negocio responde
 *    NOT_CONFIGURED.
 * 2. COMPOSITION ROOT: Centraliza el rastro de los repositorios y
 *    daemons; cualquier handler alcanza el estrato L3 vía Arc.
 * 3. NOMINAL PURITY: Erradicación total de abreviaciones.
 * =================================================================
 */

use crate::services::audit_trail::AuditTrailService;
use crate::services::auth_gate::AuthGate;
use crate::services::bulk_download::BulkDownloadManager;
use crate::services::preset_engine::PresetRegistry;
use crate::services::reconciliation;
use crate::services::topic_registry::TopicRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stratavault_domain_authz::LockoutPolicy;
use stratavault_infra_db::repositories::{
    AuditRepository, GrantRepository, IndexRepository, QuotaRepository, SessionRepository,
    UserRepository,
};
use stratavault_infra_db::{LibsqlClient, SchemaProfile};
use tokio::sync::{watch, RwLock};
use tracing::{info, instrument};

/// Timestamp unix actual en segundos.
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Día UTC vigente en formato `YYYY-MM-DD` (ventana del ledger de cuotas).
pub fn utc_day_today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Límites operativos del proceso, adoptados del entorno en la ignición.
#[derive(Debug, Clone)]
pub struct RuntimeLimits {
    /// Tamaño máximo de un segmento .dat (headers + payloads).
    pub max_dat_size: u64,
    pub max_metadata_key_length: usize,
    pub max_metadata_value_bytes: usize,
    pub max_batch_operations: usize,
    pub lockout: LockoutPolicy,
    pub session_ttl_seconds: i64,
    /// Umbral de filas del rastro de auditoría antes de la poda.
    pub audit_max_rows: i64,
    pub audit_prune_percentage: u8,
    pub audit_prune_floor: i64,
    pub audit_cleanup_interval_seconds: u64,
    /// Cadencia mínima de eventos asset_progress (uno cada N activos).
    pub asset_progress_cadence: usize,
    /// Vida útil de un artefacto de descarga masiva staged.
    pub download_artifact_ttl_seconds: i64,
}

impl Default for RuntimeLimits {
    fn default() -> Self {
        Self {
            max_dat_size: 1_073_741_824,
            max_metadata_key_length: 255,
            max_metadata_value_bytes: 65_536,
            max_batch_operations: 1_000,
            lockout: LockoutPolicy::default(),
            session_ttl_seconds: 86_400,
            audit_max_rows: 100_000,
            audit_prune_percentage: 10,
            audit_prune_floor: 100,
            audit_cleanup_interval_seconds: 60,
            asset_progress_cadence: 10,
            download_artifact_ttl_seconds: 3_600,
        }
    }
}

impl RuntimeLimits {
    /// Adopta los límites desde variables de entorno, con defaults.
    pub fn from_environment() -> Self {
        let mut limits = Self::default();
        if let Some(value) = env_u64("STRATAVAULT_MAX_DAT_SIZE") {
            limits.max_dat_size = value;
        }
        if let Some(value) = env_u64("STRATAVAULT_MAX_METADATA_KEY_LENGTH") {
            limits.max_metadata_key_length = value as usize;
        }
        if let Some(value) = env_u64("STRATAVAULT_MAX_METADATA_VALUE_BYTES") {
            limits.max_metadata_value_bytes = value as usize;
        }
        if let Some(value) = env_u64("STRATAVAULT_MAX_BATCH_OPERATIONS") {
            limits.max_batch_operations = value as usize;
        }
        if let Some(value) = env_u64("STRATAVAULT_MAX_FAILED_LOGINS") {
            limits.lockout.max_failed_logins = value as i64;
        }
        if let Some(value) = env_u64("STRATAVAULT_LOCKOUT_WINDOW_SECONDS") {
            limits.lockout.lockout_window_seconds = value as i64;
        }
        if let Some(value) = env_u64("STRATAVAULT_AUDIT_MAX_ROWS") {
            limits.audit_max_rows = value as i64;
        }
        limits
    }
}

fn env_u64(variable: &str) -> Option<u64> {
    std::env::var(variable).ok().and_then(|raw| raw.parse().ok())
}

/**
 * Núcleo configurado: todo lo que existe solo tras fijar el workdir.
 */
pub struct CoreContext {
    pub working_directory: PathBuf,
    /// Raíz interna: `<workdir>/.internal`.
    pub internal_root: PathBuf,
    pub orchestrator_client: LibsqlClient,

    // --- REPOSITORIOS L3 ---
    pub index_repository: Arc<IndexRepository>,
    pub user_repository: Arc<UserRepository>,
    pub grant_repository: Arc<GrantRepository>,
    pub session_repository: Arc<SessionRepository>,
    pub quota_repository: Arc<QuotaRepository>,

    // --- SERVICIOS L4 ---
    pub audit_trail: Arc<AuditTrailService>,
    pub auth_gate: Arc<AuthGate>,
    pub topic_registry: Arc<TopicRegistry>,
    pub preset_registry: Arc<PresetRegistry>,
    pub download_manager: Arc<BulkDownloadManager>,

    pub limits: RuntimeLimits,
}

impl CoreContext {
    /**
     * Forja el núcleo completo sobre un directorio de trabajo.
     *
     * Secuencia: filesystem -> ledger del orquestador -> repositorios ->
     * servicios -> descubrimiento de tópicos -> reconciliación.
     */
    #[instrument(skip(limits, shutdown_receiver))]
    pub async fn ignite(
        working_directory: &Path,
        limits: RuntimeLimits,
        shutdown_receiver: watch::Receiver<bool>,
    ) -> anyhow::Result<Arc<Self>> {
        info!("🧬 [CORE_IGNITION]: Forging vault core at {}", working_directory.display());

        // 1. FILESYSTEM STRATA
        let internal_root = working_directory.join(".internal");
        tokio::fs::create_dir_all(&internal_root).await?;
        let _ = stratavault_shared_heimdall::arm_file_logging(&internal_root);

        // 2. LEDGER DEL ORQUESTADOR
        let orchestrator_db_path = internal_root.join("orchestrator.db");
        let orchestrator_client = LibsqlClient::open(
            orchestrator_db_path.to_str().unwrap_or_default(),
            SchemaProfile::Orchestrator,
        )
        .await?;

        // 3. REPOSITORIOS
        let index_repository = Arc::new(IndexRepository::new(orchestrator_client.clone()));
        let user_repository = Arc::new(UserRepository::new(orchestrator_client.clone()));
        let grant_repository = Arc::new(GrantRepository::new(orchestrator_client.clone()));
        let session_repository = Arc::new(SessionRepository::new(orchestrator_client.clone()));
        let quota_repository = Arc::new(QuotaRepository::new(orchestrator_client.clone()));
        let audit_repository = Arc::new(AuditRepository::new(orchestrator_client.clone()));

        // 4. SERVICIOS
        let audit_trail = Arc::new(AuditTrailService::new(audit_repository));
        audit_trail.spawn_cleanup_daemon(&limits, shutdown_receiver.clone());

        let auth_gate = Arc::new(AuthGate::new(
            user_repository.clone(),
            grant_repository.clone(),
            session_repository.clone(),
            quota_repository.clone(),
            audit_trail.clone(),
            limits.clone(),
        ));

        let topic_registry =
            Arc::new(TopicRegistry::discover(working_directory, limits.max_dat_size).await?);

        let preset_registry = Arc::new(PresetRegistry::load(&internal_root.join("queries"))?);

        let download_manager = Arc::new(
            BulkDownloadManager::initialize(&internal_root.join("downloads"), limits.clone()).await?,
        );

        let core = Arc::new(Self {
            working_directory: working_directory.to_path_buf(),
            internal_root,
            orchestrator_client,
            index_repository,
            user_repository,
            grant_repository,
            session_repository,
            quota_repository,
            audit_trail,
            auth_gate,
            topic_registry,
            preset_registry,
            download_manager,
            limits,
        });

        // 5. RECONCILIACIÓN DE ARRANQUE (huérfanos del índice)
        let report = reconciliation::reconcile(&core).await?;
        if report.topics_removed > 0 {
            info!(
                "🧹 [CORE_IGNITION]: Reconciliation purged {} orphan topics ({} entries).",
                report.topics_removed, report.entries_purged
            );
        }

        info!("✅ [CORE_IGNITION]: Vault core operational.");
        Ok(core)
    }
}

/**
 * Contenedor de estado compartido (Thread-Safe) para el Orquestador.
 * Actúa como la placa base donde se conectan todos los estratos.
 */
#[derive(Clone)]
pub struct AppState {
    /// Ranura del núcleo configurado; None hasta el primer /api/config.
    core_slot: Arc<RwLock<Option<Arc<CoreContext>>>>,
    pub limits: RuntimeLimits,
    pub boot_unix: i64,
    shutdown_receiver: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(limits: RuntimeLimits, shutdown_receiver: watch::Receiver<bool>) -> Self {
        Self {
            core_slot: Arc::new(RwLock::new(None)),
            limits,
            boot_unix: now_unix(),
            shutdown_receiver,
        }
    }

    pub async fn core(&self) -> Option<Arc<CoreContext>> {
        self.core_slot.read().await.clone()
    }

    /// Núcleo configurado o fallo NOT_CONFIGURED.
    pub async fn require_core(&self) -> Result<Arc<CoreContext>, crate::errors::ApiError> {
        self.core().await.ok_or_else(crate::errors::ApiError::not_configured)
    }

    pub async fn install_core(&self, core: Arc<CoreContext>) {
        *self.core_slot.write().await = Some(core);
    }

    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_receiver.clone()
    }
}
