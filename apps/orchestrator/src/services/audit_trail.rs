// INICIO DEL ARCHIVO [apps/orchestrator/src/services/audit_trail.rs]
/*!
 * =================================================================
 * APARATO: AUDIT TRAIL SERVICE (V10.3 - NON-BLOCKING FANOUT)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: RASTRO DURABLE + DIFUSIÓN SSE SIN BLOQUEO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CLOSED CHANNEL SHIELD: Cada suscriptor porta su bandera atómica
 *    de cierre de disparo único; notify verifica la bandera antes de
 *    cada envío y usa exclusivamente try_send. Un Log posterior a un
 *    Unsubscribe jamás entra en pánico.
 * 2. LOSSY BY DESIGN CONTRACT: Un suscriptor con buffer lleno pierde
 *    esa entrada; el escritor nunca se suspende por un lector lento.
 * 3. SIZE-BOUNDED TRAIL: Un daemon periódico poda las filas más
 *    antiguas cuando el rastro excede el umbral configurado.
 * =================================================================
 */

use crate::state::{now_unix, RuntimeLimits};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use stratavault_domain_models::{AuditAction, AuditEntry};
use stratavault_infra_db::repositories::audit_repository::AuditQuery;
use stratavault_infra_db::repositories::AuditRepository;
use stratavault_infra_db::DbError;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Capacidad del buffer de cada suscriptor SSE.
const SUBSCRIBER_BUFFER_CAPACITY: usize = 256;

/// Suscriptor del rastro: buffer acotado + bandera de cierre atómica.
pub struct AuditSubscriber {
    pub id: u64,
    sender: mpsc::Sender<AuditEntry>,
    closed: AtomicBool,
}

impl AuditSubscriber {
    /// Cierre de disparo único e idempotente.
    fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct AuditTrailService {
    repository: Arc<AuditRepository>,
    subscribers: RwLock<Vec<Arc<AuditSubscriber>>>,
    subscriber_sequence: AtomicU64,
    /// Serializa los anexos durables (ids monótonos bajo un solo escritor).
    append_mutex: Mutex<()>,
}

impl AuditTrailService {
    pub fn new(repository: Arc<AuditRepository>) -> Self {
        Self {
            repository,
            subscribers: RwLock::new(Vec::new()),
            subscriber_sequence: AtomicU64::new(1),
            append_mutex: Mutex::new(()),
        }
    }

    /**
     * Registra una acción auditable: una fila durable + fan-out a los
     * suscriptores vivos. El token de acción pertenece al enum cerrado
     * por construcción.
     */
    pub async fn log(
        &self,
        action: AuditAction,
        source_ip: &str,
        username: &str,
        details: serde_json::Value,
    ) -> Result<i64, DbError> {
        let created_at = now_unix();

        let entry_id = {
            let _writer_guard = self.append_mutex.lock().await;
            self.repository
                .append(action.as_str(), source_ip, username, &details, created_at)
                .await?
        };

        let entry = AuditEntry {
            id: entry_id,
            created_at,
            action: action.as_str().to_string(),
            source_ip: source_ip.to_string(),
            username: username.to_string(),
            details,
        };
        self.notify_subscribers(&entry);
        Ok(entry_id)
    }

    /// Difusión sin bloqueo: bandera de cierre + try_send, jamás await.
    fn notify_subscribers(&self, entry: &AuditEntry) {
        let subscribers_snapshot = match self.subscribers.read() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };

        let mut defunct_subscriber_ids: Vec<u64> = Vec::new();
        for subscriber in subscribers_snapshot {
            if subscriber.is_closed() {
                defunct_subscriber_ids.push(subscriber.id);
                continue;
            }
            match subscriber.sender.try_send(entry.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!("🐢 [AUDIT_FANOUT]: Subscriber {} missed entry {} (buffer full).",
                        subscriber.id, entry.id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    subscriber.mark_closed();
                    defunct_subscriber_ids.push(subscriber.id);
                }
            }
        }

        // Poda de receptores difuntos (desconexión sin unsubscribe).
        if !defunct_subscriber_ids.is_empty() {
            if let Ok(mut registry) = self.subscribers.write() {
                registry.retain(|candidate| !defunct_subscriber_ids.contains(&candidate.id));
            }
        }
    }

    /// Alta de un suscriptor SSE.
    pub fn subscribe(&self) -> (Arc<AuditSubscriber>, mpsc::Receiver<AuditEntry>) {
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_BUFFER_CAPACITY);
        let subscriber = Arc::new(AuditSubscriber {
            id: self.subscriber_sequence.fetch_add(1, Ordering::SeqCst),
            sender,
            closed: AtomicBool::new(false),
        });

        if let Ok(mut registry) = self.subscribers.write() {
            registry.push(subscriber.clone());
        }
        debug!("📡 [AUDIT_FANOUT]: Subscriber {} attached.", subscriber.id);
        (subscriber, receiver)
    }

    /// Baja idempotente: concurrente con notify y consigo misma.
    pub fn unsubscribe(&self, subscriber: &Arc<AuditSubscriber>) {
        subscriber.mark_closed();
        if let Ok(mut registry) = self.subscribers.write() {
            registry.retain(|candidate| candidate.id != subscriber.id);
        }
        debug!("📡 [AUDIT_FANOUT]: Subscriber {} detached.", subscriber.id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().map(|registry| registry.len()).unwrap_or(0)
    }

    /// Consulta paginada del rastro durable.
    pub async fn query(&self, filter: &AuditQuery) -> Result<Vec<AuditEntry>, DbError> {
        self.repository.query(filter).await
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        self.repository.count().await
    }

    /**
     * Daemon de poda: cuando el rastro durable excede el umbral, borra
     * las filas más antiguas por porcentaje con piso, en una transacción.
     */
    pub fn spawn_cleanup_daemon(
        self: &Arc<Self>,
        limits: &RuntimeLimits,
        mut shutdown_receiver: watch::Receiver<bool>,
    ) {
        let service = self.clone();
        let maximum_rows = limits.audit_max_rows;
        let percentage = limits.audit_prune_percentage;
        let floor_rows = limits.audit_prune_floor;
        let cleanup_interval_seconds = limits.audit_cleanup_interval_seconds;

        tokio::spawn(async move {
            let mut maintenance_ticker = interval(Duration::from_secs(cleanup_interval_seconds));
            maintenance_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!("🧹 [AUDIT_CLEANUP]: Trail maintenance daemon operational.");

            loop {
                tokio::select! {
                    _ = maintenance_ticker.tick() => {
                        match service.repository.prune_oldest(maximum_rows, percentage, floor_rows).await {
                            Ok(0) => {}
                            Ok(removed) => {
                                let _ = service
                                    .log(
                                        AuditAction::AuditPruned,
                                        "",
                                        "",
                                        serde_json::json!({ "rows_removed": removed }),
                                    )
                                    .await;
                            }
                            Err(prune_fault) => {
                                warn!("⚠️ [AUDIT_CLEANUP]: Prune pass failed: {}", prune_fault);
                            }
                        }
                    }
                    _ = shutdown_receiver.changed() => {
                        info!("🧹 [AUDIT_CLEANUP]: Shutdown signal received. Daemon exiting.");
                        break;
                    }
                }
            }
        });
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/services/audit_trail.rs]
