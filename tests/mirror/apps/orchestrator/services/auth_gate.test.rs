// [tests/mirror/apps/orchestrator/services/auth_gate.test.rs]
/**
 * =================================================================
 * APARATO: AUTH GATE CERTIFICATION
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: Certificar el anti-oráculo de login, el lockout integral
 *           (contraseña Y api key) y la evaluación de grants.
 * =================================================================
 */

use axum::http::StatusCode;
use std::sync::Arc;
use stratavault_domain_authz::{
    credential_hash_hex, hash_password, ActionToken, OperationContext,
};
use stratavault_domain_models::{AuthMethod, CallerIdentity, Grant, UserAccount};
use stratavault_orchestrator::state::{now_unix, CoreContext, RuntimeLimits};
use tokio::sync::watch;
use uuid::Uuid;

struct Harness {
    _scratch: tempfile::TempDir,
    _shutdown: watch::Sender<bool>,
    core: Arc<CoreContext>,
}

async fn forge_core() -> Harness {
    let scratch = tempfile::tempdir().unwrap();
    let (shutdown_sender, shutdown_receiver) = watch::channel(false);
    let mut limits = RuntimeLimits::default();
    limits.lockout.max_failed_logins = 3;
    limits.lockout.lockout_window_seconds = 600;

    let core = CoreContext::ignite(scratch.path(), limits, shutdown_receiver)
        .await
        .expect("core ignition");
    Harness { _scratch: scratch, _shutdown: shutdown_sender, core }
}

async fn seed_operator(core: &CoreContext, username: &str, password: &str, api_key: &str) -> UserAccount {
    let account = UserAccount {
        id: Uuid::new_v4().to_string(),
        username: username.into(),
        display_name: username.into(),
        password_hash: hash_password(password),
        api_key_hash: credential_hash_hex(api_key),
        is_active: true,
        is_bootstrap: false,
        failed_login_count: 0,
        locked_until: None,
        created_at: now_unix(),
        updated_at: now_unix(),
    };
    core.user_repository.insert(&account).await.expect("seed user");
    account
}

fn caller_for(account: &UserAccount) -> CallerIdentity {
    CallerIdentity {
        user_id: account.id.clone(),
        username: account.username.clone(),
        is_bootstrap: account.is_bootstrap,
        method: AuthMethod::ApiKey,
    }
}

/**
 * P11: usuario inexistente y contraseña errónea son indistinguibles.
 */
#[tokio::test]
async fn certify_login_has_no_user_oracle() {
    println!("\n🧪 [PROVING_GROUNDS]: Zero-oracle login audit...");
    let harness = forge_core().await;
    seed_operator(&harness.core, "operator", "secret-pass-9", "apik_probe").await;

    let unknown_user = harness.core.auth_gate.login("ghost", "whatever99", "::1").await.unwrap_err();
    let wrong_password =
        harness.core.auth_gate.login("operator", "wrong-pass-9", "::1").await.unwrap_err();

    assert_eq!(unknown_user.status, wrong_password.status);
    assert_eq!(unknown_user.code, wrong_password.code);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    println!("   ✅ [SUCCESS]: Indistinguishable rejections.");
}

/**
 * Lockout integral: en el umbral, la contraseña correcta rebota con
 * 429 y el API key queda igualmente vetado (locked means locked).
 */
#[tokio::test]
async fn certify_lockout_blocks_password_and_api_key() {
    let harness = forge_core().await;
    let api_key = "apik_locked_probe";
    seed_operator(&harness.core, "operator", "secret-pass-9", api_key).await;

    for _ in 0..3 {
        let _ = harness.core.auth_gate.login("operator", "bad-pass-123", "::1").await;
    }

    let locked_login =
        harness.core.auth_gate.login("operator", "secret-pass-9", "::1").await.unwrap_err();
    assert_eq!(locked_login.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(locked_login.code, "AUTH_ACCOUNT_LOCKED");

    let locked_api = harness
        .core
        .auth_gate
        .resolve_identity(Some(api_key), None)
        .await
        .unwrap_err();
    assert_eq!(locked_api.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(locked_api.code, "AUTH_ACCOUNT_LOCKED");
}

/**
 * El éxito resetea el contador y forja una sesión utilizable.
 */
#[tokio::test]
async fn certify_login_success_resets_and_mints_session() {
    let harness = forge_core().await;
    seed_operator(&harness.core, "operator", "secret-pass-9", "apik_x1").await;

    let _ = harness.core.auth_gate.login("operator", "bad-pass-123", "::1").await;
    let (session_token, account) =
        harness.core.auth_gate.login("operator", "secret-pass-9", "::1").await.expect("login");
    assert!(session_token.starts_with("sess_"));
    assert_eq!(account.username, "operator");

    let refreshed = harness.core.user_repository.find_by_id(&account.id).await.unwrap().unwrap();
    assert_eq!(refreshed.failed_login_count, 0);

    let identity = harness
        .core
        .auth_gate
        .resolve_identity(None, Some(&session_token))
        .await
        .unwrap()
        .expect("session identity");
    assert_eq!(identity.username, "operator");
    assert_eq!(identity.method, AuthMethod::Session);
}

/**
 * Autorización: sin grant -> 403; constraints de tópico/extensión se
 * aplican; el bootstrap porta el grant implícito universal.
 */
#[tokio::test]
async fn certify_grant_evaluation_fences() {
    let harness = forge_core().await;
    let account = seed_operator(&harness.core, "operator", "secret-pass-9", "apik_x2").await;
    let caller = caller_for(&account);

    // Sin grant: prohibido.
    let denied = harness
        .core
        .auth_gate
        .authorize(&caller, ActionToken::Upload, OperationContext::default())
        .await
        .unwrap_err();
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    // Grant acotado a tópico 'firmware' y extensión 'bin'.
    harness
        .core
        .grant_repository
        .insert(&Grant {
            id: Uuid::new_v4().to_string(),
            user_id: account.id.clone(),
            action: "upload".into(),
            constraints: Some(serde_json::json!({
                "allowed_topics": ["firmware"],
                "allowed_extensions": ["bin"]
            })),
            is_active: true,
            created_by: "root".into(),
            created_at: now_unix(),
        })
        .await
        .unwrap();

    let granted = harness
        .core
        .auth_gate
        .authorize(
            &caller,
            ActionToken::Upload,
            OperationContext {
                topic: Some("firmware"),
                extension: Some("bin"),
                payload_size: Some(10),
                preset: None,
            },
        )
        .await;
    assert!(granted.is_ok());

    let wrong_topic = harness
        .core
        .auth_gate
        .authorize(
            &caller,
            ActionToken::Upload,
            OperationContext {
                topic: Some("captures"),
                extension: Some("bin"),
                payload_size: Some(10),
                preset: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(wrong_topic.status, StatusCode::FORBIDDEN);

    // Bootstrap: grant implícito sin constraints sobre toda acción.
    let bootstrap_caller = CallerIdentity {
        user_id: "boot".into(),
        username: "admin".into(),
        is_bootstrap: true,
        method: AuthMethod::ApiKey,
    };
    assert!(harness
        .core
        .auth_gate
        .authorize(&bootstrap_caller, ActionToken::ManageUsers, OperationContext::default())
        .await
        .is_ok());
}
