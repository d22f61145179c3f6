// [tests/mirror/apps/orchestrator/services/bulk_download.test.rs]
/**
 * =================================================================
 * APARATO: BULK DOWNLOAD CERTIFICATION
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: Round-trip ZIP bit-perfecto, secuencia SSE estricta (P12)
 *           y entrega single-use del artefacto staged.
 * =================================================================
 */

use std::io::Read;
use std::sync::Arc;
use stratavault_domain_models::{AssetLocation, BulkDownloadRequest, DownloadManifest};
use stratavault_orchestrator::services::bulk_download::BulkDownloadManager;
use stratavault_orchestrator::state::{CoreContext, RuntimeLimits};
use tokio::sync::watch;

struct World {
    _scratch: tempfile::TempDir,
    _shutdown: watch::Sender<bool>,
    core: Arc<CoreContext>,
    hashes: Vec<String>,
    payloads: Vec<Vec<u8>>,
}

async fn forge_world() -> World {
    let scratch = tempfile::tempdir().unwrap();
    let (shutdown_sender, shutdown_receiver) = watch::channel(false);
    let core = CoreContext::ignite(scratch.path(), RuntimeLimits::default(), shutdown_receiver)
        .await
        .unwrap();

    let store = core.topic_registry.create("firmware").await.unwrap().unwrap();
    let payloads: Vec<Vec<u8>> = vec![b"first-firmware-blob".to_vec(), b"second-firmware-blob".to_vec()];
    let mut hashes = Vec::new();
    for (index, payload) in payloads.iter().enumerate() {
        let outcome = store
            .put_asset(payload, "bin", &format!("blob{}", index), None)
            .await
            .unwrap();
        core.index_repository
            .index_asset(&AssetLocation {
                hash: outcome.receipt.hash.clone(),
                topic: "firmware".into(),
                dat_file: outcome.receipt.dat_file.clone(),
                offset: outcome.payload_offset,
                size: outcome.receipt.size,
            })
            .await
            .unwrap();
        hashes.push(outcome.receipt.hash);
    }

    World { _scratch: scratch, _shutdown: shutdown_sender, core, hashes, payloads }
}

fn ids_request(world: &World) -> BulkDownloadRequest {
    BulkDownloadRequest {
        mode: "ids".into(),
        preset: None,
        params: None,
        topics: Vec::new(),
        asset_ids: world.hashes.clone(),
        include_metadata: true,
        filename_format: Some("original".into()),
    }
}

/**
 * Round-trip síncrono: manifest coherente y payloads bit-idénticos.
 */
#[tokio::test]
async fn certify_synchronous_zip_round_trip() {
    println!("\n🧪 [PROVING_GROUNDS]: Synchronous ZIP round-trip audit...");
    let world = forge_world().await;

    let mut resolution = BulkDownloadManager::resolve_selection(
        &world.core.topic_registry,
        &world.core.preset_registry,
        &ids_request(&world),
    )
    .await
    .expect("resolution");
    BulkDownloadManager::seal_offsets(&mut resolution, &world.core.index_repository)
        .await
        .expect("offsets");

    let (zip_bytes, manifest) =
        BulkDownloadManager::assemble_in_memory(&resolution).expect("assembly");
    assert_eq!(manifest.asset_count, 2);
    assert!(manifest.failed_assets.is_empty());

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).expect("zip");

    // manifest.json coherente.
    let mut manifest_raw = String::new();
    archive.by_name("manifest.json").unwrap().read_to_string(&mut manifest_raw).unwrap();
    let revived_manifest: DownloadManifest = serde_json::from_str(&manifest_raw).unwrap();
    assert_eq!(revived_manifest.asset_count, 2);
    assert!(revived_manifest.include_metadata);

    // Payloads bit-idénticos + entradas de metadatos presentes.
    for (asset, expected_payload) in revived_manifest.assets.iter().zip(&world.payloads) {
        let mut entry_bytes = Vec::new();
        archive
            .by_name(&format!("assets/{}", asset.filename))
            .unwrap()
            .read_to_end(&mut entry_bytes)
            .unwrap();
        assert_eq!(&entry_bytes, expected_payload);

        assert!(archive.by_name(&format!("metadata/{}.json", asset.filename)).is_ok());
    }
    println!("   ✅ [SUCCESS]: Byte-identical round trip certified.");
}

/**
 * Colisión de nombres 'original': el duplicado gana sufijo _2.
 */
#[tokio::test]
async fn certify_collision_policy_in_resolution() {
    let world = forge_world().await;

    // Tercer activo con el mismo origin_name que el primero.
    let store = world.core.topic_registry.get("firmware").await.unwrap();
    let clash = store.put_asset(b"third-but-same-name", "bin", "blob0", None).await.unwrap();
    world
        .core
        .index_repository
        .index_asset(&AssetLocation {
            hash: clash.receipt.hash.clone(),
            topic: "firmware".into(),
            dat_file: clash.receipt.dat_file.clone(),
            offset: clash.payload_offset,
            size: clash.receipt.size,
        })
        .await
        .unwrap();

    let mut request = ids_request(&world);
    request.asset_ids.push(clash.receipt.hash);

    let resolution = BulkDownloadManager::resolve_selection(
        &world.core.topic_registry,
        &world.core.preset_registry,
        &request,
    )
    .await
    .unwrap();

    let names: Vec<&str> = resolution.assets.iter().map(|a| a.entry_name.as_str()).collect();
    assert!(names.contains(&"blob0.bin"));
    assert!(names.contains(&"blob0_2.bin"));
}

/**
 * P12 + single-use: download_start primero, complete último con
 * timestamps no decrecientes; el artefacto se reclama una sola vez.
 */
#[tokio::test]
async fn certify_async_session_sequence_and_single_use() {
    let world = forge_world().await;

    let mut resolution = BulkDownloadManager::resolve_selection(
        &world.core.topic_registry,
        &world.core.preset_registry,
        &ids_request(&world),
    )
    .await
    .unwrap();
    BulkDownloadManager::seal_offsets(&mut resolution, &world.core.index_repository)
        .await
        .unwrap();

    let (download_id, mut receiver) = world.core.download_manager.spawn_session(resolution);

    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        events.push(event);
    }

    assert_eq!(events.first().unwrap().0, "download_start");
    assert_eq!(events.last().unwrap().0, "complete");
    assert_eq!(events.first().unwrap().1["total_assets"], 2);

    // Timestamps monótonos no decrecientes a través de la sesión.
    let mut previous_timestamp = 0i64;
    for (_, payload) in &events {
        let timestamp = payload["timestamp"].as_i64().expect("timestamp");
        assert!(timestamp >= previous_timestamp);
        previous_timestamp = timestamp;
    }

    let complete = &events.last().unwrap().1;
    assert_eq!(complete["download_id"], download_id.as_str());
    assert_eq!(
        complete["download_url"],
        format!("/api/download/bulk/{}", download_id).as_str()
    );

    // Primera reclamación: éxito; el ZIP staged existe y es legible.
    let artifact_path = world.core.download_manager.claim_artifact(&download_id).await.unwrap();
    let staged_bytes = std::fs::read(&artifact_path).unwrap();
    assert!(zip::ZipArchive::new(std::io::Cursor::new(staged_bytes)).is_ok());

    // Segunda reclamación: DOWNLOAD_SESSION_NOT_FOUND (single-use).
    let second_claim = world.core.download_manager.claim_artifact(&download_id).await.unwrap_err();
    assert_eq!(second_claim.code, "DOWNLOAD_SESSION_NOT_FOUND");
}

/**
 * Selección vacía y modo ajeno: fallos tipados del conjunto cerrado.
 */
#[tokio::test]
async fn certify_selection_faults() {
    let world = forge_world().await;

    let mut empty = ids_request(&world);
    empty.asset_ids = vec!["00".repeat(32)];
    let empty_fault = BulkDownloadManager::resolve_selection(
        &world.core.topic_registry,
        &world.core.preset_registry,
        &empty,
    )
    .await
    .unwrap_err();
    assert_eq!(empty_fault.code, "BULK_DOWNLOAD_EMPTY");

    let mut foreign = ids_request(&world);
    foreign.mode = "everything".into();
    let mode_fault = BulkDownloadManager::resolve_selection(
        &world.core.topic_registry,
        &world.core.preset_registry,
        &foreign,
    )
    .await
    .unwrap_err();
    assert_eq!(mode_fault.code, "INVALID_DOWNLOAD_MODE");

    let mut bad_format = ids_request(&world);
    bad_format.filename_format = Some("uuid".into());
    let format_fault = BulkDownloadManager::resolve_selection(
        &world.core.topic_registry,
        &world.core.preset_registry,
        &bad_format,
    )
    .await
    .unwrap_err();
    assert_eq!(format_fault.code, "INVALID_FILENAME_FORMAT");
}
