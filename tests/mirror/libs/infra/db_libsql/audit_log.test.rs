// [tests/mirror/libs/infra/db_libsql/audit_log.test.rs]
/**
 * =================================================================
 * APARATO: AUDIT LOG CERTIFICATION
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * OBJETIVO: Monotonicidad de ids, filtros y poda oldest-first.
 * =================================================================
 */

use stratavault_domain_models::AuditScopeFilter;
use stratavault_infra_db::repositories::audit_repository::{AuditQuery, AuditRepository};
use stratavault_infra_db::{LibsqlClient, SchemaProfile};

async fn forge_trail() -> (tempfile::TempDir, AuditRepository) {
    let scratch = tempfile::tempdir().unwrap();
    let db_path = scratch.path().join("orchestrator.db");
    let client = LibsqlClient::open(db_path.to_str().unwrap(), SchemaProfile::Orchestrator)
        .await
        .unwrap();
    (scratch, AuditRepository::new(client))
}

#[tokio::test]
async fn certify_append_ids_are_strictly_monotonic() {
    println!("\n🧪 [PROVING_GROUNDS]: Audit monotonicity audit...");
    let (_scratch, trail) = forge_trail().await;

    let mut previous_id = 0i64;
    for sequence in 0..20 {
        let entry_id = trail
            .append(
                "adding_file",
                "127.0.0.1",
                "operator",
                &serde_json::json!({ "sequence": sequence }),
                1_000 + sequence,
            )
            .await
            .expect("append");
        assert!(entry_id > previous_id, "ids must be strictly monotonic");
        previous_id = entry_id;
    }
    assert_eq!(trail.count().await.unwrap(), 20);
    println!("   ✅ [SUCCESS]: 20 rows, strictly increasing ids.");
}

#[tokio::test]
async fn certify_scope_and_action_filters() {
    let (_scratch, trail) = forge_trail().await;

    trail.append("adding_file", "", "alice", &serde_json::json!({}), 10).await.unwrap();
    trail.append("login_success", "", "alice", &serde_json::json!({}), 20).await.unwrap();
    trail.append("adding_file", "", "bob", &serde_json::json!({}), 30).await.unwrap();

    let mine = trail
        .query(&AuditQuery {
            limit: 100,
            scope: AuditScopeFilter::Me,
            caller_username: "alice".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(mine.len(), 2);

    let others = trail
        .query(&AuditQuery {
            limit: 100,
            scope: AuditScopeFilter::Others,
            caller_username: "alice".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(others.len(), 1);
    assert_eq!(others[0].username, "bob");

    let uploads = trail
        .query(&AuditQuery {
            limit: 100,
            action: Some("adding_file".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(uploads.len(), 2);

    let windowed = trail
        .query(&AuditQuery { limit: 100, since: Some(15), until: Some(25), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(windowed.len(), 1);
    assert_eq!(windowed[0].action, "login_success");
}

#[tokio::test]
async fn certify_prune_removes_oldest_first() {
    let (_scratch, trail) = forge_trail().await;

    for sequence in 0..50 {
        trail
            .append("adding_file", "", "", &serde_json::json!({ "n": sequence }), sequence)
            .await
            .unwrap();
    }

    // Umbral 30: exceso -> poda de max(10% de 50, piso 20) = 20 filas.
    let removed = trail.prune_oldest(30, 10, 20).await.unwrap();
    assert_eq!(removed, 20);
    assert_eq!(trail.count().await.unwrap(), 30);

    // Las supervivientes son las más recientes.
    let survivors = trail.entries_after(0, 100).await.unwrap();
    assert_eq!(survivors.first().unwrap().details["n"], 20);

    // Bajo el umbral: no-op.
    assert_eq!(trail.prune_oldest(30, 10, 20).await.unwrap(), 0);
}
