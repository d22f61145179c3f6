// INICIO DEL ARCHIVO [apps/orchestrator/src/services/verification.rs]
/*!
 * =================================================================
 * APARATO: INTEGRITY VERIFICATION SERVICE (V10.3 - SSE SCAN)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: ESCANEO COMPLETO DE TÓPICOS Y CRUCE DE ÍNDICE
 *
 * # Secuencia de eventos (estricta):
 * scan_start -> por tópico: topic_start, dat_complete*, topic_complete
 * -> opcional index_start, index_complete -> complete.
 * La corrupción viaja como evento, jamás aborta el escaneo completo.
 * =================================================================
 */

use crate::services::topic_store::TopicStore;
use std::collections::HashSet;
use std::sync::Arc;
use stratavault_core_segment::verify_segment;
use stratavault_infra_db::repositories::IndexRepository;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Evento SSE del escaneo: (nombre, payload).
pub type VerifyEvent = (&'static str, serde_json::Value);

/**
 * Lanza el escaneo de integridad y devuelve el receptor de eventos.
 * El worker se detiene de inmediato si el receptor se suelta.
 */
pub fn spawn_verification(
    stores: Vec<Arc<TopicStore>>,
    index_repository: Arc<IndexRepository>,
    check_index: bool,
) -> mpsc::Receiver<VerifyEvent> {
    let (event_sender, event_receiver) = mpsc::channel::<VerifyEvent>(64);

    tokio::spawn(async move {
        run_verification(stores, index_repository, check_index, event_sender).await;
    });

    event_receiver
}

async fn run_verification(
    stores: Vec<Arc<TopicStore>>,
    index_repository: Arc<IndexRepository>,
    check_index: bool,
    event_sender: mpsc::Sender<VerifyEvent>,
) {
    let topic_names: Vec<String> = stores.iter().map(|store| store.name.clone()).collect();

    if event_sender
        .send((
            "scan_start",
            serde_json::json!({ "topics": topic_names, "check_index": check_index }),
        ))
        .await
        .is_err()
    {
        return;
    }

    let mut topics_valid = 0usize;
    for store in &stores {
        let ledger = match store.catalogue().ledger_rows().await {
            Ok(ledger) => ledger,
            Err(ledger_fault) => {
                warn!("⚠️ [VERIFY]: Ledger unreadable for '{}': {}", store.name, ledger_fault);
                let _ = event_sender
                    .send((
                        "topic_complete",
                        serde_json::json!({ "topic": store.name, "valid": false }),
                    ))
                    .await;
                continue;
            }
        };

        if event_sender
            .send((
                "topic_start",
                serde_json::json!({ "topic": store.name, "dat_files": ledger.len() }),
            ))
            .await
            .is_err()
        {
            return;
        }

        let mut topic_is_valid = true;
        for ledger_row in &ledger {
            let segment_path = store.directory.join(&ledger_row.name);
            let verdict = match verify_segment(
                &segment_path,
                &ledger_row.chain_hash,
                ledger_row.record_count as u64,
            ) {
                Ok(verdict) => verdict,
                Err(io_fault) => {
                    // E/S dura: reportamos como segmento inválido.
                    topic_is_valid = false;
                    let _ = event_sender
                        .send((
                            "dat_complete",
                            serde_json::json!({
                                "topic": store.name,
                                "dat_file": ledger_row.name,
                                "valid": false,
                                "error": io_fault.to_string(),
                            }),
                        ))
                        .await;
                    continue;
                }
            };

            if !verdict.valid {
                topic_is_valid = false;
            }
            let mut payload = serde_json::json!({
                "topic": store.name,
                "dat_file": ledger_row.name,
                "valid": verdict.valid,
            });
            if let Some(error) = &verdict.error {
                payload["error"] = serde_json::Value::String(error.clone());
            }
            if event_sender.send(("dat_complete", payload)).await.is_err() {
                return;
            }
        }

        if topic_is_valid {
            topics_valid += 1;
        }
        if event_sender
            .send((
                "topic_complete",
                serde_json::json!({ "topic": store.name, "valid": topic_is_valid }),
            ))
            .await
            .is_err()
        {
            return;
        }
    }

    // --- CRUCE DE ÍNDICE (OPCIONAL) ---
    let mut index_valid = true;
    if check_index {
        if event_sender.send(("index_start", serde_json::json!({}))).await.is_err() {
            return;
        }

        for store in &stores {
            let catalogue_hashes: HashSet<String> = match store.catalogue().list_asset_hashes().await {
                Ok(hashes) => hashes.into_iter().collect(),
                Err(_) => {
                    index_valid = false;
                    continue;
                }
            };
            let index_hashes: HashSet<String> = match index_repository.list_topic_entries(&store.name).await {
                Ok(entries) => entries.into_iter().map(|entry| entry.hash).collect(),
                Err(_) => {
                    index_valid = false;
                    continue;
                }
            };

            // Cruce bidireccional: filas de índice sin activo y activos sin índice.
            let orphaned_in_index = index_hashes.difference(&catalogue_hashes).count();
            let missing_from_index = catalogue_hashes.difference(&index_hashes).count();
            if orphaned_in_index > 0 || missing_from_index > 0 {
                index_valid = false;
                warn!(
                    "⚠️ [VERIFY_INDEX]: Drift on '{}': {} orphaned, {} missing.",
                    store.name, orphaned_in_index, missing_from_index
                );
            }
        }

        if event_sender
            .send(("index_complete", serde_json::json!({ "valid": index_valid })))
            .await
            .is_err()
        {
            return;
        }
    }

    let _ = event_sender
        .send((
            "complete",
            serde_json::json!({
                "topics_checked": stores.len(),
                "topics_valid": topics_valid,
                "index_valid": index_valid,
            }),
        ))
        .await;

    info!("🔏 [VERIFY]: Scan finished ({}/{} topics valid).", topics_valid, stores.len());
}
// FIN DEL ARCHIVO [apps/orchestrator/src/services/verification.rs]
