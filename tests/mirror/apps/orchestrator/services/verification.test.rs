// [tests/mirror/apps/orchestrator/services/verification.test.rs]
/**
 * =================================================================
 * APARATO: VERIFICATION PIPELINE CERTIFICATION
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: Secuencia estricta de eventos, replay de cadena (P3) y
 *           cruce de índice bidireccional.
 * =================================================================
 */

use std::sync::Arc;
use stratavault_domain_models::AssetLocation;
use stratavault_infra_db::repositories::IndexRepository;
use stratavault_infra_db::{LibsqlClient, SchemaProfile};
use stratavault_orchestrator::services::topic_store::TopicStore;
use stratavault_orchestrator::services::verification::spawn_verification;

async fn forge_world() -> (tempfile::TempDir, Arc<TopicStore>, Arc<IndexRepository>) {
    let scratch = tempfile::tempdir().unwrap();
    let store = Arc::new(
        TopicStore::open("probe", &scratch.path().join("probe"), 1_048_576).await.unwrap(),
    );
    let index_client = LibsqlClient::open(
        scratch.path().join("orchestrator.db").to_str().unwrap(),
        SchemaProfile::Orchestrator,
    )
    .await
    .unwrap();
    (scratch, store, Arc::new(IndexRepository::new(index_client)))
}

async fn collect_events(
    mut receiver: tokio::sync::mpsc::Receiver<(&'static str, serde_json::Value)>,
) -> Vec<(&'static str, serde_json::Value)> {
    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        events.push(event);
    }
    events
}

/**
 * Escaneo limpio: scan_start primero, complete último, segmento válido.
 */
#[tokio::test]
async fn certify_clean_scan_event_sequence() {
    println!("\n🧪 [PROVING_GROUNDS]: Clean verification scan audit...");
    let (_scratch, store, index) = forge_world().await;

    for payload in [b"one".as_ref(), b"two".as_ref(), b"three".as_ref()] {
        store.put_asset(payload, "", "blob", None).await.unwrap();
    }

    let events = collect_events(spawn_verification(vec![store], index, false)).await;

    assert_eq!(events.first().unwrap().0, "scan_start");
    assert_eq!(events.last().unwrap().0, "complete");

    let dat_events: Vec<_> = events.iter().filter(|(name, _)| *name == "dat_complete").collect();
    assert_eq!(dat_events.len(), 1);
    assert_eq!(dat_events[0].1["valid"], true);

    let topic_complete = events.iter().find(|(name, _)| *name == "topic_complete").unwrap();
    assert_eq!(topic_complete.1["valid"], true);

    let complete = &events.last().unwrap().1;
    assert_eq!(complete["topics_checked"], 1);
    assert_eq!(complete["topics_valid"], 1);
    println!("   ✅ [SUCCESS]: Strict sequence certified.");
}

/**
 * P3: un bit volteado en el payload rompe la verificación con un
 * error que menciona la categoría, sin abortar el escaneo.
 */
#[tokio::test]
async fn certify_bit_flip_surfaces_as_event() {
    let (_scratch, store, index) = forge_world().await;
    let outcome = store.put_asset(b"sacred-payload", "", "blob", None).await.unwrap();

    let segment_path = store.directory.join(&outcome.receipt.dat_file);
    {
        use std::io::{Seek, SeekFrom, Write};
        let mut file = std::fs::OpenOptions::new().write(true).open(&segment_path).unwrap();
        file.seek(SeekFrom::Start(outcome.payload_offset)).unwrap();
        file.write_all(b"Z").unwrap();
    }

    let events = collect_events(spawn_verification(vec![store], index, false)).await;

    let dat_complete = events.iter().find(|(name, _)| *name == "dat_complete").unwrap();
    assert_eq!(dat_complete.1["valid"], false);
    assert!(dat_complete.1["error"].as_str().unwrap().contains("hash mismatch"));

    // El escaneo llega a complete pese a la corrupción.
    assert_eq!(events.last().unwrap().0, "complete");
    assert_eq!(events.last().unwrap().1["topics_valid"], 0);
}

/**
 * Cruce de índice: un activo sin fila de índice degrada index_valid.
 */
#[tokio::test]
async fn certify_index_cross_check() {
    let (_scratch, store, index) = forge_world().await;

    let first = store.put_asset(b"indexed-blob", "", "a", None).await.unwrap();
    let _second = store.put_asset(b"unindexed-blob", "", "b", None).await.unwrap();

    // Solo el primero queda indexado: drift bidireccional detectable.
    index
        .index_asset(&AssetLocation {
            hash: first.receipt.hash.clone(),
            topic: "probe".into(),
            dat_file: first.receipt.dat_file.clone(),
            offset: first.payload_offset,
            size: first.receipt.size,
        })
        .await
        .unwrap();

    let events = collect_events(spawn_verification(vec![store], index, true)).await;

    let index_complete = events.iter().find(|(name, _)| *name == "index_complete").unwrap();
    assert_eq!(index_complete.1["valid"], false);
    assert_eq!(events.last().unwrap().1["index_valid"], false);

    // index_start precede a index_complete.
    let start_position = events.iter().position(|(name, _)| *name == "index_start").unwrap();
    let complete_position = events.iter().position(|(name, _)| *name == "index_complete").unwrap();
    assert!(start_position < complete_position);
}
