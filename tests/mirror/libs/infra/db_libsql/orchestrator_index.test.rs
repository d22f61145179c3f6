// [tests/mirror/libs/infra/db_libsql/orchestrator_index.test.rs]
/**
 * =================================================================
 * APARATO: ORCHESTRATOR INDEX CERTIFICATION
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * OBJETIVO: Certificar upsert idempotente, locate estable y purga.
 * =================================================================
 */

use stratavault_domain_models::AssetLocation;
use stratavault_infra_db::repositories::IndexRepository;
use stratavault_infra_db::{LibsqlClient, SchemaProfile};

async fn forge_index() -> (tempfile::TempDir, IndexRepository) {
    let scratch = tempfile::tempdir().unwrap();
    let db_path = scratch.path().join("orchestrator.db");
    let client = LibsqlClient::open(db_path.to_str().unwrap(), SchemaProfile::Orchestrator)
        .await
        .unwrap();
    (scratch, IndexRepository::new(client))
}

fn location(hash_seed: u8, topic: &str, offset: u64) -> AssetLocation {
    AssetLocation {
        hash: format!("{:02x}", hash_seed).repeat(32),
        topic: topic.into(),
        dat_file: "000001.dat".into(),
        offset,
        size: 64,
    }
}

#[tokio::test]
async fn certify_index_upsert_is_idempotent() {
    println!("\n🧪 [PROVING_GROUNDS]: Index idempotent upsert audit...");
    let (_scratch, index) = forge_index().await;

    let first = location(0xaa, "alpha", 110);
    index.index_asset(&first).await.unwrap();
    index.index_asset(&first).await.unwrap();

    let mut relocated = first.clone();
    relocated.offset = 440;
    index.index_asset(&relocated).await.unwrap();

    let resolved = index.locate(&first.hash).await.unwrap().expect("location");
    assert_eq!(resolved.offset, 440);
    assert_eq!(index.count_unique_hashes().await.unwrap(), 1);
    println!("   ✅ [SUCCESS]: Triple upsert collapsed into one row.");
}

#[tokio::test]
async fn certify_multi_topic_residency_and_stable_locate() {
    let (_scratch, index) = forge_index().await;

    // El mismo hash reside en dos tópicos: filas separadas.
    index.index_asset(&location(0xbb, "zulu", 0)).await.unwrap();
    index.index_asset(&location(0xbb, "alpha", 0)).await.unwrap();

    assert_eq!(index.count_unique_hashes().await.unwrap(), 1);
    let all = index.locate_all(&"bb".repeat(32)).await.unwrap();
    assert_eq!(all.len(), 2);

    // Locate devuelve la primera por orden de nombre de tópico.
    let primary = index.locate(&"bb".repeat(32)).await.unwrap().unwrap();
    assert_eq!(primary.topic, "alpha");
}

#[tokio::test]
async fn certify_topic_purge_reports_count_and_is_idempotent() {
    let (_scratch, index) = forge_index().await;

    for seed in [1u8, 2, 3] {
        index.index_asset(&location(seed, "alpha", 0)).await.unwrap();
    }
    index.index_asset(&location(9, "beta", 0)).await.unwrap();

    assert_eq!(index.purge_topic("alpha").await.unwrap(), 3);
    // Segunda purga sobre el mismo estado: no-op.
    assert_eq!(index.purge_topic("alpha").await.unwrap(), 0);

    let surviving = index.list_topic_entries("beta").await.unwrap();
    assert_eq!(surviving.len(), 1);
    assert_eq!(index.distinct_topics().await.unwrap(), vec!["beta".to_string()]);
}
