// [tests/mirror/libs/infra/db_libsql/catalogue_ingest.test.rs]
/**
 * =================================================================
 * APARATO: CATALOGUE INGEST CERTIFICATION
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * OBJETIVO: Certificar el ciclo ACID de activos y ledger de segmentos.
 * =================================================================
 */

use stratavault_domain_models::AssetRecord;
use stratavault_infra_db::repositories::catalogue::{LedgerUpdate, TopicCatalogueRepository};
use stratavault_infra_db::{LibsqlClient, SchemaProfile};

async fn forge_catalogue() -> (tempfile::TempDir, TopicCatalogueRepository) {
    let scratch = tempfile::tempdir().expect("scratch dir");
    let db_path = scratch.path().join("probe.db");
    let client = LibsqlClient::open(db_path.to_str().unwrap(), SchemaProfile::TopicCatalogue)
        .await
        .expect("catalogue ignition");
    (scratch, TopicCatalogueRepository::new(client))
}

fn probe_asset(hash_seed: u8, dat_file: &str) -> AssetRecord {
    AssetRecord {
        hash: format!("{:02x}", hash_seed).repeat(32),
        size: 64,
        extension: "bin".into(),
        origin_name: "probe".into(),
        parent_hash: None,
        created_at: 1_760_000_000,
        dat_file: dat_file.into(),
    }
}

#[tokio::test]
async fn certify_put_asset_seals_row_and_ledger_atomically() {
    println!("\n🧪 [PROVING_GROUNDS]: Catalogue ACID put audit...");
    let (_scratch, catalogue) = forge_catalogue().await;

    let asset = probe_asset(0xa1, "000001.dat");
    let ledger = LedgerUpdate {
        dat_file: "000001.dat".into(),
        record_count: 1,
        chain_hash: "cafe".repeat(16),
        updated_at: 1_760_000_000,
    };

    catalogue.insert_asset_with_ledger(&asset, &ledger).await.expect("put");

    assert!(catalogue.asset_exists(&asset.hash).await.unwrap());
    let revived = catalogue.get_asset(&asset.hash).await.unwrap().expect("asset row");
    assert_eq!(revived.dat_file, "000001.dat");
    assert_eq!(revived.size, 64);

    let ledger_rows = catalogue.ledger_rows().await.unwrap();
    assert_eq!(ledger_rows.len(), 1);
    assert_eq!(ledger_rows[0].record_count, 1);
    assert_eq!(ledger_rows[0].chain_hash, "cafe".repeat(16));

    // La vista computada nace vacía junto al activo.
    let computed = catalogue.get_computed_metadata(&asset.hash).await.unwrap();
    assert_eq!(computed, serde_json::json!({}));
    println!("   ✅ [SUCCESS]: Row + ledger + computed view sealed.");
}

#[tokio::test]
async fn certify_ledger_upsert_tracks_segment_growth() {
    let (_scratch, catalogue) = forge_catalogue().await;

    for (seed, record_count) in [(0x01u8, 1i64), (0x02, 2), (0x03, 3)] {
        let asset = probe_asset(seed, "000001.dat");
        let ledger = LedgerUpdate {
            dat_file: "000001.dat".into(),
            record_count,
            chain_hash: format!("{:02x}", seed).repeat(32),
            updated_at: 1_760_000_000 + i64::from(seed),
        };
        catalogue.insert_asset_with_ledger(&asset, &ledger).await.expect("put");
    }

    let newest = catalogue.newest_ledger_row().await.unwrap().expect("ledger row");
    assert_eq!(newest.record_count, 3);
    assert_eq!(newest.chain_hash, "03".repeat(32));
    assert_eq!(catalogue.count_assets().await.unwrap(), 3);
}

#[tokio::test]
async fn certify_stats_refresh_is_idempotent() {
    let (_scratch, catalogue) = forge_catalogue().await;

    let mut child = probe_asset(0x10, "000001.dat");
    child.parent_hash = Some("ff".repeat(32)); // padre inexistente -> huérfano
    let ledger = LedgerUpdate {
        dat_file: "000001.dat".into(),
        record_count: 1,
        chain_hash: "00".repeat(32),
        updated_at: 0,
    };
    catalogue.insert_asset_with_ledger(&child, &ledger).await.unwrap();

    let first = catalogue.refresh_stats(1_024, 2_048, 10).await.unwrap();
    let second = catalogue.refresh_stats(1_024, 2_048, 20).await.unwrap();

    assert_eq!(first.file_count, 1);
    assert_eq!(second.file_count, 1);
    assert_eq!(second.versioned_count, 1);
    assert_eq!(second.orphan_count, 1);
    assert_eq!(second.db_size_bytes, 1_024);
    assert_eq!(second.dat_files, vec!["000001.dat".to_string()]);

    let cached = catalogue.read_stats().await.unwrap().expect("stats cache");
    assert_eq!(cached.file_count, 1);
}
