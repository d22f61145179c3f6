// [tests/mirror/apps/orchestrator/services/reconciliation.test.rs]
/**
 * =================================================================
 * APARATO: RECONCILIATION CERTIFICATION
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: Escenario completo — alpha (3 activos) removida del disco,
 *           beta (1 activo) intacta: purga de índice, evento de
 *           auditoría único e idempotencia (P8).
 * =================================================================
 */

use std::sync::Arc;
use stratavault_domain_models::{AssetLocation, AuditScopeFilter};
use stratavault_infra_db::repositories::audit_repository::AuditQuery;
use stratavault_orchestrator::services::reconciliation::reconcile;
use stratavault_orchestrator::state::{CoreContext, RuntimeLimits};
use tokio::sync::watch;

async fn ignite_core(workdir: &std::path::Path) -> (watch::Sender<bool>, Arc<CoreContext>) {
    let (shutdown_sender, shutdown_receiver) = watch::channel(false);
    let core = CoreContext::ignite(workdir, RuntimeLimits::default(), shutdown_receiver)
        .await
        .expect("core ignition");
    (shutdown_sender, core)
}

async fn seed_topic_with_assets(core: &CoreContext, topic: &str, payloads: &[&[u8]]) {
    let store = core.topic_registry.create(topic).await.unwrap().expect("fresh topic");
    for payload in payloads {
        let outcome = store.put_asset(payload, "bin", "seed", None).await.unwrap();
        core.index_repository
            .index_asset(&AssetLocation {
                hash: outcome.receipt.hash,
                topic: topic.to_string(),
                dat_file: outcome.receipt.dat_file,
                offset: outcome.payload_offset,
                size: outcome.receipt.size,
            })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn certify_orphan_topic_purge_and_idempotence() {
    println!("\n🧪 [PROVING_GROUNDS]: Reconciliation orphan purge audit...");
    let scratch = tempfile::tempdir().unwrap();

    // FASE 1: mundo con alpha (3 activos) y beta (1 activo).
    let beta_payload: &[u8] = b"beta-survivor";
    {
        let (_shutdown, core) = ignite_core(scratch.path()).await;
        seed_topic_with_assets(&core, "alpha", &[b"a-one", b"a-two", b"a-three"]).await;
        seed_topic_with_assets(&core, "beta", &[beta_payload]).await;
        assert_eq!(core.index_repository.distinct_topics().await.unwrap().len(), 2);
    }

    // COLAPSO EXTERNO: el directorio de alpha desaparece del disco.
    std::fs::remove_dir_all(scratch.path().join("alpha")).unwrap();

    // FASE 2: re-ignición — la reconciliación de arranque repara el índice.
    let (_shutdown, core) = ignite_core(scratch.path()).await;

    let surviving_topics = core.index_repository.distinct_topics().await.unwrap();
    assert_eq!(surviving_topics, vec!["beta".to_string()]);

    // Exactamente un evento reconcile_topic_removed con los detalles.
    let audit_rows = core
        .audit_trail
        .query(&AuditQuery {
            limit: 50,
            action: Some("reconcile_topic_removed".into()),
            scope: AuditScopeFilter::All,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(audit_rows.len(), 1);
    assert_eq!(audit_rows[0].details["topic_name"], "alpha");
    assert_eq!(audit_rows[0].details["entries_purged"], 3);

    // El activo de beta sigue descargable byte a byte.
    let beta_store = core.topic_registry.get("beta").await.expect("beta online");
    let beta_entries = core.index_repository.list_topic_entries("beta").await.unwrap();
    assert_eq!(beta_entries.len(), 1);
    let record = beta_store.get_asset(&beta_entries[0].hash).await.unwrap().unwrap();
    let payload = beta_store.read_asset_payload(&record, beta_entries[0].offset).await.unwrap();
    assert_eq!(payload, beta_payload);

    // P8: la segunda pasada sobre el mismo estado es un no-op.
    let second_pass = reconcile(&core).await.unwrap();
    assert_eq!(second_pass.topics_removed, 0);
    assert_eq!(second_pass.entries_purged, 0);

    // Y el rastro de auditoría no ganó eventos nuevos de reconciliación.
    let audit_after = core
        .audit_trail
        .query(&AuditQuery {
            limit: 50,
            action: Some("reconcile_topic_removed".into()),
            scope: AuditScopeFilter::All,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(audit_after.len(), 1);
    println!("   ✅ [SUCCESS]: {{topics_removed:1, entries_purged:3}} + idempotence certified.");
}
