// [tests/mirror/libs/infra/db_libsql/identity_persistence.test.rs]
/**
 * =================================================================
 * APARATO: IDENTITY PERSISTENCE CERTIFICATION
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * OBJETIVO: Certificar cuentas, grants, sesiones y ledger de cuotas.
 * =================================================================
 */

use stratavault_domain_models::{Grant, SessionRecord, UserAccount};
use stratavault_infra_db::repositories::{
    GrantRepository, QuotaRepository, SessionRepository, UserRepository,
};
use stratavault_infra_db::{DbError, LibsqlClient, SchemaProfile};

async fn forge_orchestrator_db() -> (tempfile::TempDir, LibsqlClient) {
    let scratch = tempfile::tempdir().unwrap();
    let db_path = scratch.path().join("orchestrator.db");
    let client = LibsqlClient::open(db_path.to_str().unwrap(), SchemaProfile::Orchestrator)
        .await
        .unwrap();
    (scratch, client)
}

fn probe_account(id: &str, username: &str) -> UserAccount {
    UserAccount {
        id: id.into(),
        username: username.into(),
        display_name: username.to_uppercase(),
        password_hash: "pbkdf2$sha256$1$c2FsdA==$aGFzaA==".into(),
        api_key_hash: format!("{}-key-hash", id),
        is_active: true,
        is_bootstrap: false,
        failed_login_count: 0,
        locked_until: None,
        created_at: 100,
        updated_at: 100,
    }
}

#[tokio::test]
async fn certify_account_round_trip_and_username_uniqueness() {
    println!("\n🧪 [PROVING_GROUNDS]: Identity vault audit...");
    let (_scratch, client) = forge_orchestrator_db().await;
    let users = UserRepository::new(client);

    users.insert(&probe_account("u1", "operator")).await.expect("insert");
    let revived = users.find_by_username("operator").await.unwrap().expect("account");
    assert_eq!(revived.id, "u1");
    assert!(revived.is_active);

    let duplicate = users.insert(&probe_account("u2", "operator")).await;
    assert!(matches!(duplicate, Err(DbError::UserAlreadyExists)));
    println!("   ✅ [SUCCESS]: Uniqueness shield engaged.");
}

#[tokio::test]
async fn certify_lockout_bookkeeping() {
    let (_scratch, client) = forge_orchestrator_db().await;
    let users = UserRepository::new(client);
    users.insert(&probe_account("u1", "operator")).await.unwrap();

    users.record_login_failure("u1", 3, Some(9_999), 200).await.unwrap();
    let locked = users.find_by_id("u1").await.unwrap().unwrap();
    assert_eq!(locked.failed_login_count, 3);
    assert_eq!(locked.locked_until, Some(9_999));
    assert!(locked.is_locked_at(9_998));

    users.reset_login_failures("u1", 300).await.unwrap();
    let released = users.find_by_id("u1").await.unwrap().unwrap();
    assert_eq!(released.failed_login_count, 0);
    assert_eq!(released.locked_until, None);
}

#[tokio::test]
async fn certify_grant_lifecycle() {
    let (_scratch, client) = forge_orchestrator_db().await;
    let grants = GrantRepository::new(client);

    let grant = Grant {
        id: "g1".into(),
        user_id: "u1".into(),
        action: "upload".into(),
        constraints: Some(serde_json::json!({ "daily_count_limit": 3 })),
        is_active: true,
        created_by: "root".into(),
        created_at: 0,
    };
    grants.insert(&grant).await.unwrap();

    let active = grants.active_grants_for_user("u1").await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].constraints.as_ref().unwrap()["daily_count_limit"], 3);

    grants.revoke("g1").await.unwrap();
    assert!(grants.active_grants_for_user("u1").await.unwrap().is_empty());
    assert_eq!(grants.count_active_for_user("u1").await.unwrap(), 0);
    // La fila revocada permanece para el rastro.
    assert_eq!(grants.all_grants_for_user("u1").await.unwrap().len(), 1);

    assert!(matches!(grants.revoke("ghost").await, Err(DbError::GrantNotFound)));
}

#[tokio::test]
async fn certify_session_expiry_semantics() {
    let (_scratch, client) = forge_orchestrator_db().await;
    let sessions = SessionRepository::new(client);

    let session = SessionRecord {
        token_hash: "hash-1".into(),
        user_id: "u1".into(),
        created_at: 0,
        last_seen_at: 0,
        expires_at: 1_000,
    };
    sessions.insert(&session).await.unwrap();

    assert!(sessions.find_live("hash-1", 999).await.unwrap().is_some());
    // Expirada cuenta como inexistente.
    assert!(sessions.find_live("hash-1", 1_000).await.unwrap().is_none());

    assert_eq!(sessions.purge_expired(1_000).await.unwrap(), 1);
    assert_eq!(sessions.delete_for_user("u1").await.unwrap(), 0);
}

#[tokio::test]
async fn certify_quota_ledger_accumulation() {
    let (_scratch, client) = forge_orchestrator_db().await;
    let quotas = QuotaRepository::new(client);

    assert_eq!(quotas.consumed("u1", "upload", "2026-01-15").await.unwrap(), (0, 0));

    quotas.record_success("u1", "upload", "2026-01-15", 1, 512).await.unwrap();
    quotas.record_success("u1", "upload", "2026-01-15", 1, 256).await.unwrap();
    assert_eq!(quotas.consumed("u1", "upload", "2026-01-15").await.unwrap(), (2, 768));

    // Día distinto: ventana independiente.
    assert_eq!(quotas.consumed("u1", "upload", "2026-01-16").await.unwrap(), (0, 0));

    let snapshot = quotas.snapshot_for_user("u1", "2026-01-15").await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].op_count, 2);
    assert_eq!(snapshot[0].volume_bytes, 768);
}
