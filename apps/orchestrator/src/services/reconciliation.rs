// [apps/orchestrator/src/services/reconciliation.rs]
/*!
 * =================================================================
 * APARATO: INDEX RECONCILIATION SERVICE (V10.2 - ORPHAN PURGE)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: REPARACIÓN DEL ÍNDICE CONTRA EL FILESYSTEM VIVO
 *
 * # Invariantes:
 * Idempotente: una segunda pasada sobre el mismo estado reporta cero
 * remociones. Cada tópico purgado emite exactamente un evento
 * reconcile_topic_removed. El rastro de auditoría jamás se purga aquí.
 * =================================================================
 */

use crate::state::CoreContext;
use serde_json::json;
use std::collections::HashSet;
use stratavault_domain_models::AuditAction;
use tracing::{info, instrument};

/// Informe de una pasada de reconciliación.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub topics_removed: usize,
    pub entries_purged: u64,
    pub removed_topics: Vec<String>,
}

/**
 * Purga del índice del orquestador toda fila cuyo tópico ya no existe
 * en disco, emitiendo un evento de auditoría por tópico removido.
 */
#[instrument(skip(core))]
pub async fn reconcile(core: &CoreContext) -> anyhow::Result<ReconcileReport> {
    let live_topics: HashSet<String> = core.topic_registry.topic_names().await.into_iter().collect();
    let indexed_topics = core.index_repository.distinct_topics().await?;

    let mut report = ReconcileReport::default();
    for indexed_topic in indexed_topics {
        if live_topics.contains(&indexed_topic) {
            continue;
        }

        let purged_entries = core.index_repository.purge_topic(&indexed_topic).await?;
        report.topics_removed += 1;
        report.entries_purged += purged_entries;
        report.removed_topics.push(indexed_topic.clone());

        let _ = core
            .audit_trail
            .log(
                AuditAction::ReconcileTopicRemoved,
                "",
                "",
                json!({
                    "topic_name": indexed_topic,
                    "entries_purged": purged_entries,
                }),
            )
            .await;

        info!(
            "🧹 [RECONCILE]: Topic '{}' purged from index ({} entries).",
            indexed_topic, purged_entries
        );
    }

    Ok(report)
}
// FIN DEL ARCHIVO [apps/orchestrator/src/services/reconciliation.rs]
