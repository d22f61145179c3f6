// [tests/mirror/apps/orchestrator/services/audit_trail.test.rs]
/**
 * =================================================================
 * APARATO: AUDIT TRAIL FANOUT CERTIFICATION
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: Difusión sin bloqueo, cierre idempotente y pérdida
 *           tolerada bajo buffer lleno. Log tras Unsubscribe jamás
 *           entra en pánico.
 * =================================================================
 */

use std::sync::Arc;
use stratavault_domain_models::AuditAction;
use stratavault_infra_db::repositories::AuditRepository;
use stratavault_infra_db::{LibsqlClient, SchemaProfile};
use stratavault_orchestrator::services::audit_trail::AuditTrailService;

async fn forge_trail() -> (tempfile::TempDir, Arc<AuditTrailService>) {
    let scratch = tempfile::tempdir().unwrap();
    let db_path = scratch.path().join("orchestrator.db");
    let client = LibsqlClient::open(db_path.to_str().unwrap(), SchemaProfile::Orchestrator)
        .await
        .unwrap();
    let service = Arc::new(AuditTrailService::new(Arc::new(AuditRepository::new(client))));
    (scratch, service)
}

#[tokio::test]
async fn certify_subscriber_receives_live_entries() {
    println!("\n🧪 [PROVING_GROUNDS]: Audit fanout audit...");
    let (_scratch, trail) = forge_trail().await;
    let (subscriber, mut receiver) = trail.subscribe();

    trail
        .log(AuditAction::AddingFile, "::1", "operator", serde_json::json!({ "hash": "abcd" }))
        .await
        .expect("log");

    let delivered = receiver.recv().await.expect("fanout entry");
    assert_eq!(delivered.action, "adding_file");
    assert_eq!(delivered.username, "operator");
    assert_eq!(delivered.details["hash"], "abcd");

    trail.unsubscribe(&subscriber);
    assert_eq!(trail.subscriber_count(), 0);
    println!("   ✅ [SUCCESS]: Live mirror certified.");
}

/**
 * Log tras Unsubscribe: el camino de cierre es idempotente y la
 * difusión posterior jamás entra en pánico.
 */
#[tokio::test]
async fn certify_log_after_unsubscribe_is_safe() {
    let (_scratch, trail) = forge_trail().await;
    let (subscriber, receiver) = trail.subscribe();

    // Doble baja concurrente consigo misma: idempotente.
    trail.unsubscribe(&subscriber);
    trail.unsubscribe(&subscriber);
    drop(receiver);

    for _ in 0..10 {
        trail
            .log(AuditAction::LoginFailed, "", "", serde_json::json!({}))
            .await
            .expect("log after unsubscribe");
    }
    assert_eq!(trail.subscriber_count(), 0);
}

/**
 * Buffer lleno: el suscriptor lento pierde entradas; el escritor
 * jamás se suspende ni falla.
 */
#[tokio::test]
async fn certify_slow_subscriber_is_lossy_never_blocking() {
    let (_scratch, trail) = forge_trail().await;
    let (_subscriber, mut receiver) = trail.subscribe();

    // 300 entradas sin drenar: el buffer (256) se desborda sin bloqueo.
    for sequence in 0..300 {
        trail
            .log(AuditAction::AddingFile, "", "", serde_json::json!({ "n": sequence }))
            .await
            .expect("non-blocking log");
    }

    // El durable registró todo; el espejo SSE perdió el excedente.
    assert_eq!(trail.count().await.unwrap(), 300);
    let mut mirrored = 0usize;
    while receiver.try_recv().is_ok() {
        mirrored += 1;
    }
    assert!(mirrored <= 256, "mirror must be bounded by the buffer");
    assert!(mirrored > 0);
}

/**
 * P5 en el servicio: ids estrictamente crecientes bajo escritores
 * concurrentes serializados por el mutex de anexado.
 */
#[tokio::test]
async fn certify_concurrent_writers_keep_monotonic_ids() {
    let (_scratch, trail) = forge_trail().await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let writer = trail.clone();
        tasks.push(tokio::spawn(async move {
            let mut ids = Vec::new();
            for _ in 0..10 {
                ids.push(
                    writer
                        .log(AuditAction::QueryPreset, "", "", serde_json::json!({}))
                        .await
                        .unwrap(),
                );
            }
            ids
        }));
    }

    let mut all_ids = Vec::new();
    for task in tasks {
        all_ids.extend(task.await.unwrap());
    }
    all_ids.sort_unstable();
    all_ids.dedup();
    assert_eq!(all_ids.len(), 80, "every append must mint a distinct id");
}
