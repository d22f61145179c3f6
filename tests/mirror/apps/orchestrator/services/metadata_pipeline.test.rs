// [tests/mirror/apps/orchestrator/services/metadata_pipeline.test.rs]
/**
 * =================================================================
 * APARATO: METADATA PIPELINE CERTIFICATION
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: Vallas de longitud, lote con aislamiento por activo y
 *           reporte de éxito parcial.
 * =================================================================
 */

use stratavault_domain_models::{BatchMetadataOperation, MetadataOp};
use stratavault_orchestrator::services::metadata_pipeline::{
    apply_batch, apply_single, validate_key_value,
};
use stratavault_orchestrator::services::topic_registry::TopicRegistry;
use stratavault_orchestrator::state::RuntimeLimits;

async fn forge_registry_with_asset() -> (tempfile::TempDir, TopicRegistry, String) {
    let scratch = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(scratch.path().join("probe")).unwrap();

    let registry = TopicRegistry::discover(scratch.path(), 1_048_576).await.unwrap();
    let store = registry.get("probe").await.expect("discovered topic");
    let outcome = store.put_asset(b"metadata-target", "bin", "target", None).await.unwrap();
    (scratch, registry, outcome.receipt.hash)
}

#[test]
fn certify_length_fences() {
    let limits = RuntimeLimits::default();

    assert!(validate_key_value(&limits, "stage", "alpha").is_ok());

    let empty_key = validate_key_value(&limits, "", "alpha").unwrap_err();
    assert_eq!(empty_key.code, "INVALID_REQUEST");

    let long_key = "k".repeat(limits.max_metadata_key_length + 1);
    assert_eq!(validate_key_value(&limits, &long_key, "v").unwrap_err().code, "METADATA_KEY_TOO_LONG");

    let long_value = "v".repeat(limits.max_metadata_value_bytes + 1);
    assert_eq!(
        validate_key_value(&limits, "k", &long_value).unwrap_err().code,
        "METADATA_VALUE_TOO_LONG"
    );
}

#[tokio::test]
async fn certify_single_apply_folds_into_view() {
    println!("\n🧪 [PROVING_GROUNDS]: Single metadata apply audit...");
    let (_scratch, registry, hash) = forge_registry_with_asset().await;
    let limits = RuntimeLimits::default();

    let (topic, first_id) = apply_single(
        &registry, &limits, &hash, MetadataOp::Set, "stage", "alpha", "prover", "1.0",
    )
    .await
    .expect("set");
    assert_eq!(topic, "probe");

    let (_, second_id) = apply_single(
        &registry, &limits, &hash, MetadataOp::Set, "stage", "beta", "prover", "1.0",
    )
    .await
    .expect("overwrite");
    assert!(second_id > first_id);

    let store = registry.get("probe").await.unwrap();
    let computed = store.computed_metadata(&hash).await.unwrap();
    assert_eq!(computed, serde_json::json!({ "stage": "beta" }));
    println!("   ✅ [SUCCESS]: Last-write-wins fold certified.");
}

#[tokio::test]
async fn certify_unknown_asset_is_a_404_class_fault() {
    let (_scratch, registry, _hash) = forge_registry_with_asset().await;
    let limits = RuntimeLimits::default();

    let fault = apply_single(
        &registry,
        &limits,
        &"00".repeat(32),
        MetadataOp::Set,
        "stage",
        "alpha",
        "prover",
        "1.0",
    )
    .await
    .unwrap_err();
    assert_eq!(fault.code, "ASSET_NOT_FOUND");
}

/**
 * Lote con éxito parcial: las operaciones consumadas persisten y el
 * reporte marca success:false con el detalle por operación.
 */
#[tokio::test]
async fn certify_batch_partial_failure_isolation() {
    let (_scratch, registry, hash) = forge_registry_with_asset().await;
    let limits = RuntimeLimits::default();

    let operations = vec![
        BatchMetadataOperation {
            asset_id: hash.clone(),
            op: MetadataOp::Set,
            key: "stage".into(),
            value: "alpha".into(),
        },
        BatchMetadataOperation {
            asset_id: "ff".repeat(32), // fantasma
            op: MetadataOp::Set,
            key: "stage".into(),
            value: "alpha".into(),
        },
    ];

    let report = apply_batch(&registry, &limits, &operations, "prover", "1.0").await.unwrap();
    assert!(!report.success);
    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert!(report.results[0].success);
    assert_eq!(report.results[1].error.as_deref(), Some("ASSET_NOT_FOUND"));

    // La operación consumada persiste pese al fallo del vecino.
    let store = registry.get("probe").await.unwrap();
    let computed = store.computed_metadata(&hash).await.unwrap();
    assert_eq!(computed["stage"], "alpha");
}

#[tokio::test]
async fn certify_batch_ceiling() {
    let (_scratch, registry, hash) = forge_registry_with_asset().await;
    let mut limits = RuntimeLimits::default();
    limits.max_batch_operations = 2;

    let oversized: Vec<BatchMetadataOperation> = (0..3)
        .map(|index| BatchMetadataOperation {
            asset_id: hash.clone(),
            op: MetadataOp::Set,
            key: format!("k{}", index),
            value: "v".into(),
        })
        .collect();

    let fault = apply_batch(&registry, &limits, &oversized, "prover", "1.0").await.unwrap_err();
    assert_eq!(fault.code, "BATCH_TOO_MANY_OPERATIONS");
}
