// [tests/mirror/apps/orchestrator/services/topic_store.test.rs]
/**
 * =================================================================
 * APARATO: TOPIC STORE CERTIFICATION
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: Certificar content addressing, dedup, rodado y reparación.
 * =================================================================
 */

use stratavault_core_segment::{content_hash_hex, RECORD_HEADER_SIZE};
use stratavault_orchestrator::services::topic_store::TopicStore;

async fn forge_store(maximum_segment_bytes: u64) -> (tempfile::TempDir, TopicStore) {
    let scratch = tempfile::tempdir().unwrap();
    let topic_directory = scratch.path().join("probe-topic");
    let store = TopicStore::open("probe-topic", &topic_directory, maximum_segment_bytes)
        .await
        .expect("store ignition");
    (scratch, store)
}

/**
 * P1 + P2: el hash devuelto es el SHA-256 del payload; la re-subida es
 * un no-op con skipped=true y un único registro durable.
 */
#[tokio::test]
async fn certify_content_addressing_and_dedup() {
    println!("\n🧪 [PROVING_GROUNDS]: Content addressing audit...");
    let (_scratch, store) = forge_store(1_048_576).await;

    let payload = b"immutable-firmware-blob";
    let first = store.put_asset(payload, "bin", "firmware", None).await.expect("put");
    assert_eq!(first.receipt.hash, content_hash_hex(payload));
    assert!(!first.receipt.skipped);

    let second = store.put_asset(payload, "bin", "firmware", None).await.expect("dedup put");
    assert!(second.receipt.skipped);
    assert_eq!(second.receipt.hash, first.receipt.hash);

    // Un único registro durable.
    let record = store.get_asset(&first.receipt.hash).await.unwrap().expect("row");
    assert_eq!(record.size, payload.len() as u64);

    // Round-trip bit-perfecto.
    let revived = store.read_asset_payload(&record, first.payload_offset).await.unwrap();
    assert_eq!(revived, payload);
    println!("   ✅ [SUCCESS]: Dedup no-op certified.");
}

/**
 * Rodado de segmento: el segundo activo que no cabe abre 000002.dat.
 */
#[tokio::test]
async fn certify_segment_roll_on_capacity() {
    let payload = vec![0x41u8; 100];
    let capacity = (RECORD_HEADER_SIZE + payload.len()) as u64; // exactamente una trama
    let (_scratch, store) = forge_store(capacity).await;

    let first = store.put_asset(&payload, "bin", "one", None).await.unwrap();
    assert_eq!(first.receipt.dat_file, "000001.dat");
    assert!(!first.rolled_segment);

    let mut other_payload = payload.clone();
    other_payload[0] = 0x42;
    let second = store.put_asset(&other_payload, "bin", "two", None).await.unwrap();
    assert!(second.rolled_segment);
    assert_eq!(second.receipt.dat_file, "000002.dat");
}

/**
 * Frontera 413: con capacidad 10240, una trama de 10130 bytes de
 * payload cabe exacta; 10131 jamás cabrá.
 */
#[tokio::test]
async fn certify_capacity_fence_boundary() {
    let (_scratch, store) = forge_store(10_240).await;
    assert!(!store.payload_exceeds_capacity(10_130));
    assert!(store.payload_exceeds_capacity(10_131));
}

/**
 * Reparación de colapso: una cola truncada se recorta al reabrir y el
 * almacén sigue aceptando escrituras coherentes.
 */
#[tokio::test]
async fn certify_crash_tail_repair_on_reopen() {
    let scratch = tempfile::tempdir().unwrap();
    let topic_directory = scratch.path().join("probe-topic");

    let intact_hash = {
        let store = TopicStore::open("probe-topic", &topic_directory, 1_048_576).await.unwrap();
        let outcome = store.put_asset(b"intact-record", "", "intact", None).await.unwrap();
        outcome.receipt.hash
    };

    // Simulamos el colapso: media trama anexada al segmento activo.
    let segment_path = topic_directory.join("000001.dat");
    let intact_size = std::fs::metadata(&segment_path).unwrap().len();
    {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new().append(true).open(&segment_path).unwrap();
        file.write_all(b"MSHB\x01\x00torn-tail").unwrap();
    }

    let reopened = TopicStore::open("probe-topic", &topic_directory, 1_048_576).await.unwrap();
    assert_eq!(std::fs::metadata(&segment_path).unwrap().len(), intact_size);

    let cursor = reopened.cursor_snapshot().await;
    assert_eq!(cursor.record_count, 1);
    assert_eq!(cursor.occupied_bytes, intact_size);

    // El registro previo sobrevive y el almacén acepta escrituras nuevas.
    assert!(reopened.get_asset(&intact_hash).await.unwrap().is_some());
    let next = reopened.put_asset(b"post-crash", "", "next", None).await.unwrap();
    assert!(!next.receipt.skipped);
    assert_eq!(next.receipt.dat_file, "000001.dat");
}

/**
 * Corrupción en lectura: un bit volteado en el payload degrada a un
 * fallo estructurado de hash, jamás a un pánico.
 */
#[tokio::test]
async fn certify_read_hash_mismatch_is_structured() {
    let (_scratch, store) = forge_store(1_048_576).await;
    let outcome = store.put_asset(b"pristine-payload", "", "pristine", None).await.unwrap();
    let record = store.get_asset(&outcome.receipt.hash).await.unwrap().unwrap();

    // Volteamos el primer byte del payload en disco.
    let segment_path = store.directory.join(&record.dat_file);
    {
        use std::io::{Seek, SeekFrom, Write};
        let mut file = std::fs::OpenOptions::new().write(true).open(&segment_path).unwrap();
        file.seek(SeekFrom::Start(outcome.payload_offset)).unwrap();
        file.write_all(b"X").unwrap();
    }

    let fault = store.read_asset_payload(&record, outcome.payload_offset).await;
    assert!(matches!(
        fault,
        Err(stratavault_orchestrator::services::topic_store::StoreError::ReadHashMismatch(_))
    ));
}
