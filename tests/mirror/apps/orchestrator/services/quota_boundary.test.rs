// [tests/mirror/apps/orchestrator/services/quota_boundary.test.rs]
/**
 * =================================================================
 * APARATO: QUOTA BOUNDARY CERTIFICATION
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: P6 — con daily_count_limit=k, la operación k pasa y la
 *           (k+1) rebota con AUTH_QUOTA_EXCEEDED (429). El ledger
 *           solo se consume en éxito.
 * =================================================================
 */

use axum::http::StatusCode;
use std::sync::Arc;
use stratavault_domain_authz::{credential_hash_hex, hash_password, ActionToken, OperationContext};
use stratavault_domain_models::{AuthMethod, CallerIdentity, Grant, UserAccount};
use stratavault_orchestrator::state::{now_unix, utc_day_today, CoreContext, RuntimeLimits};
use tokio::sync::watch;
use uuid::Uuid;

async fn forge_core() -> (tempfile::TempDir, watch::Sender<bool>, Arc<CoreContext>) {
    let scratch = tempfile::tempdir().unwrap();
    let (shutdown_sender, shutdown_receiver) = watch::channel(false);
    let core = CoreContext::ignite(scratch.path(), RuntimeLimits::default(), shutdown_receiver)
        .await
        .unwrap();
    (scratch, shutdown_sender, core)
}

async fn seed_quota_bound_uploader(core: &CoreContext, daily_count_limit: i64) -> CallerIdentity {
    let account = UserAccount {
        id: Uuid::new_v4().to_string(),
        username: "uploader".into(),
        display_name: "Uploader".into(),
        password_hash: hash_password("secret-pass-9"),
        api_key_hash: credential_hash_hex("apik_quota_probe"),
        is_active: true,
        is_bootstrap: false,
        failed_login_count: 0,
        locked_until: None,
        created_at: now_unix(),
        updated_at: now_unix(),
    };
    core.user_repository.insert(&account).await.unwrap();

    core.grant_repository
        .insert(&Grant {
            id: Uuid::new_v4().to_string(),
            user_id: account.id.clone(),
            action: "upload".into(),
            constraints: Some(serde_json::json!({ "daily_count_limit": daily_count_limit })),
            is_active: true,
            created_by: "root".into(),
            created_at: now_unix(),
        })
        .await
        .unwrap();

    CallerIdentity {
        user_id: account.id,
        username: account.username,
        is_bootstrap: false,
        method: AuthMethod::ApiKey,
    }
}

/**
 * Escenario del contrato: límite 3 => subidas 1,2,3 autorizadas; la
 * cuarta rechazada con 429 AUTH_QUOTA_EXCEEDED.
 */
#[tokio::test]
async fn certify_fourth_upload_is_rejected_at_limit_three() {
    println!("\n🧪 [PROVING_GROUNDS]: Quota boundary k+1 audit...");
    let (_scratch, _shutdown, core) = forge_core().await;
    let caller = seed_quota_bound_uploader(&core, 3).await;

    let context = OperationContext { payload_size: Some(64), ..Default::default() };

    for attempt in 1..=3 {
        core.auth_gate
            .authorize(&caller, ActionToken::Upload, context)
            .await
            .unwrap_or_else(|fault| panic!("attempt {} should pass: {}", attempt, fault.message));
        core.auth_gate.consume_quota(&caller, ActionToken::Upload, 64).await.unwrap();
    }

    let boundary_fault = core
        .auth_gate
        .authorize(&caller, ActionToken::Upload, context)
        .await
        .unwrap_err();
    assert_eq!(boundary_fault.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(boundary_fault.code, "AUTH_QUOTA_EXCEEDED");
    println!("   ✅ [SUCCESS]: 200,200,200,429 sequence certified.");
}

/**
 * El ledger solo se consume en éxito: autorizar sin consumar no gasta.
 */
#[tokio::test]
async fn certify_ledger_only_moves_on_success() {
    let (_scratch, _shutdown, core) = forge_core().await;
    let caller = seed_quota_bound_uploader(&core, 2).await;
    let context = OperationContext { payload_size: Some(10), ..Default::default() };

    // Tres autorizaciones sin consumo: el ledger permanece virgen.
    for _ in 0..3 {
        core.auth_gate.authorize(&caller, ActionToken::Upload, context).await.unwrap();
    }
    let (operations, _volume) = core
        .quota_repository
        .consumed(&caller.user_id, "upload", &utc_day_today())
        .await
        .unwrap();
    assert_eq!(operations, 0);
}

/**
 * Frontera de volumen diario: el byte que rebasa el límite rechaza.
 */
#[tokio::test]
async fn certify_daily_volume_boundary() {
    let (_scratch, _shutdown, core) = forge_core().await;

    let account = UserAccount {
        id: Uuid::new_v4().to_string(),
        username: "volumetric".into(),
        display_name: "Volumetric".into(),
        password_hash: hash_password("secret-pass-9"),
        api_key_hash: credential_hash_hex("apik_volume_probe"),
        is_active: true,
        is_bootstrap: false,
        failed_login_count: 0,
        locked_until: None,
        created_at: now_unix(),
        updated_at: now_unix(),
    };
    core.user_repository.insert(&account).await.unwrap();
    core.grant_repository
        .insert(&Grant {
            id: Uuid::new_v4().to_string(),
            user_id: account.id.clone(),
            action: "upload".into(),
            constraints: Some(serde_json::json!({ "daily_volume_bytes": 1000 })),
            is_active: true,
            created_by: "root".into(),
            created_at: now_unix(),
        })
        .await
        .unwrap();
    let caller = CallerIdentity {
        user_id: account.id,
        username: account.username,
        is_bootstrap: false,
        method: AuthMethod::ApiKey,
    };

    core.auth_gate
        .authorize(
            &caller,
            ActionToken::Upload,
            OperationContext { payload_size: Some(600), ..Default::default() },
        )
        .await
        .unwrap();
    core.auth_gate.consume_quota(&caller, ActionToken::Upload, 600).await.unwrap();

    // 600 consumados: 400 más caben exactos, 401 rebasan.
    assert!(core
        .auth_gate
        .authorize(
            &caller,
            ActionToken::Upload,
            OperationContext { payload_size: Some(400), ..Default::default() },
        )
        .await
        .is_ok());
    let fault = core
        .auth_gate
        .authorize(
            &caller,
            ActionToken::Upload,
            OperationContext { payload_size: Some(401), ..Default::default() },
        )
        .await
        .unwrap_err();
    assert_eq!(fault.code, "AUTH_QUOTA_EXCEEDED");
}
