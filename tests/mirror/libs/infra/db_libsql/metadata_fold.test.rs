// [tests/mirror/libs/infra/db_libsql/metadata_fold.test.rs]
/**
 * =================================================================
 * APARATO: METADATA FOLD CERTIFICATION
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * OBJETIVO: Certificar que la vista computada es el left-fold exacto
 *           del log append-only ordenado por id.
 * =================================================================
 */

use stratavault_domain_models::{AssetRecord, MetadataOp};
use stratavault_infra_db::repositories::catalogue::{
    LedgerUpdate, MetadataMutation, TopicCatalogueRepository,
};
use stratavault_infra_db::{DbError, LibsqlClient, SchemaProfile};

async fn forge_catalogue_with_asset() -> (tempfile::TempDir, TopicCatalogueRepository, String) {
    let scratch = tempfile::tempdir().unwrap();
    let db_path = scratch.path().join("probe.db");
    let client = LibsqlClient::open(db_path.to_str().unwrap(), SchemaProfile::TopicCatalogue)
        .await
        .unwrap();
    let catalogue = TopicCatalogueRepository::new(client);

    let hash = "ab".repeat(32);
    let asset = AssetRecord {
        hash: hash.clone(),
        size: 8,
        extension: String::new(),
        origin_name: "probe".into(),
        parent_hash: None,
        created_at: 0,
        dat_file: "000001.dat".into(),
    };
    let ledger = LedgerUpdate {
        dat_file: "000001.dat".into(),
        record_count: 1,
        chain_hash: "00".repeat(32),
        updated_at: 0,
    };
    catalogue.insert_asset_with_ledger(&asset, &ledger).await.unwrap();
    (scratch, catalogue, hash)
}

fn mutation(op: MetadataOp, key: &str, value: &str) -> MetadataMutation {
    MetadataMutation {
        op,
        key: key.into(),
        value: value.into(),
        processor: "prover".into(),
        processor_version: "1.0".into(),
    }
}

/**
 * Escenario del contrato: set key=1, set key=2, set other=7, delete key
 * => log con 4 ids estrictamente crecientes; computed == {other: 7}
 * (número JSON, no texto).
 */
#[tokio::test]
async fn certify_fold_matches_log_replay() {
    println!("\n🧪 [PROVING_GROUNDS]: Metadata fold replay audit...");
    let (_scratch, catalogue, hash) = forge_catalogue_with_asset().await;

    let script = [
        mutation(MetadataOp::Set, "key", "1"),
        mutation(MetadataOp::Set, "key", "2"),
        mutation(MetadataOp::Set, "other", "7"),
        mutation(MetadataOp::Delete, "key", ""),
    ];
    for step in &script {
        catalogue.apply_metadata(&hash, step, 100).await.expect("apply");
    }

    let log = catalogue.get_metadata_log(&hash).await.unwrap();
    assert_eq!(log.len(), 4);
    for window in log.windows(2) {
        assert!(window[0].id < window[1].id, "log ids must be strictly increasing");
    }

    let computed = catalogue.get_computed_metadata(&hash).await.unwrap();
    assert_eq!(computed, serde_json::json!({ "other": 7 }));
    println!("   ✅ [SUCCESS]: Fold {{other:7}} certified.");
}

#[tokio::test]
async fn certify_numeric_coercion_in_log_and_fold() {
    let (_scratch, catalogue, hash) = forge_catalogue_with_asset().await;

    catalogue.apply_metadata(&hash, &mutation(MetadataOp::Set, "score", "42.5"), 0).await.unwrap();
    catalogue.apply_metadata(&hash, &mutation(MetadataOp::Set, "flag", "true"), 0).await.unwrap();
    catalogue.apply_metadata(&hash, &mutation(MetadataOp::Set, "note", "7 apples"), 0).await.unwrap();

    let log = catalogue.get_metadata_log(&hash).await.unwrap();
    assert_eq!(log[0].value_numeric, Some(42.5));
    // Booleanos quedan textuales con columna numérica nula.
    assert_eq!(log[1].value_numeric, None);
    assert_eq!(log[1].value, "true");

    // La vista computada pliega números como números; el resto, texto.
    let computed = catalogue.get_computed_metadata(&hash).await.unwrap();
    assert_eq!(computed["score"], serde_json::json!(42.5));
    assert_eq!(computed["flag"], serde_json::json!("true"));
    assert_eq!(computed["note"], serde_json::json!("7 apples"));
}

#[tokio::test]
async fn certify_batch_is_atomic_per_asset() {
    let (_scratch, catalogue, hash) = forge_catalogue_with_asset().await;

    let good_batch = [
        mutation(MetadataOp::Set, "stage", "alpha"),
        mutation(MetadataOp::Set, "stage", "beta"),
    ];
    let ids = catalogue
        .apply_metadata_batch_for_asset(&hash, &good_batch, 50)
        .await
        .expect("batch");
    assert_eq!(ids.len(), 2);
    assert!(ids[0] < ids[1]);

    let computed = catalogue.get_computed_metadata(&hash).await.unwrap();
    assert_eq!(computed["stage"], "beta");
}

#[tokio::test]
async fn certify_mutation_on_unknown_asset_is_rejected() {
    let (_scratch, catalogue, _hash) = forge_catalogue_with_asset().await;
    let ghost = "00".repeat(32);
    let fault = catalogue
        .apply_metadata(&ghost, &mutation(MetadataOp::Set, "k", "v"), 0)
        .await;
    assert!(matches!(fault, Err(DbError::AssetNotFound)));
}
