// [tests/mirror/apps/orchestrator/handlers/bootstrap_shield.test.rs]
/**
 * =================================================================
 * APARATO: BOOTSTRAP SHIELD CERTIFICATION
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * OBJETIVO: P7 — deshabilitar al usuario bootstrap o revocar su último
 *           grant activo falla siempre con AUTH_BOOTSTRAP_PROTECTED.
 * =================================================================
 */

use axum::extract::{Extension, Path, State};
use axum::Json;
use stratavault_domain_authz::{credential_hash_hex, hash_password};
use stratavault_domain_models::{AuthMethod, CallerIdentity, Grant, UserAccount};
use stratavault_orchestrator::handlers::auth::{IdentityGovernanceHandler, UpdateUserPayload};
use stratavault_orchestrator::middleware::ClientIp;
use stratavault_orchestrator::state::{now_unix, AppState, CoreContext, RuntimeLimits};
use tokio::sync::watch;
use uuid::Uuid;

struct World {
    _scratch: tempfile::TempDir,
    _shutdown: watch::Sender<bool>,
    application_state: AppState,
    bootstrap_id: String,
    bootstrap_caller: CallerIdentity,
    sole_grant_id: String,
}

async fn forge_world() -> World {
    let scratch = tempfile::tempdir().unwrap();
    let (shutdown_sender, shutdown_receiver) = watch::channel(false);
    let limits = RuntimeLimits::default();

    let core = CoreContext::ignite(scratch.path(), limits.clone(), shutdown_receiver.clone())
        .await
        .unwrap();

    let bootstrap_id = Uuid::new_v4().to_string();
    core.user_repository
        .insert(&UserAccount {
            id: bootstrap_id.clone(),
            username: "admin".into(),
            display_name: "Bootstrap Administrator".into(),
            password_hash: hash_password("bootstrap-secret"),
            api_key_hash: credential_hash_hex("apik_bootstrap_probe"),
            is_active: true,
            is_bootstrap: true,
            failed_login_count: 0,
            locked_until: None,
            created_at: now_unix(),
            updated_at: now_unix(),
        })
        .await
        .unwrap();

    // Un único grant explícito activo: el candidato a "último grant".
    let sole_grant_id = Uuid::new_v4().to_string();
    core.grant_repository
        .insert(&Grant {
            id: sole_grant_id.clone(),
            user_id: bootstrap_id.clone(),
            action: "view_audit".into(),
            constraints: None,
            is_active: true,
            created_by: bootstrap_id.clone(),
            created_at: now_unix(),
        })
        .await
        .unwrap();

    let application_state = AppState::new(limits, shutdown_receiver);
    application_state.install_core(core).await;

    let bootstrap_caller = CallerIdentity {
        user_id: bootstrap_id.clone(),
        username: "admin".into(),
        is_bootstrap: true,
        method: AuthMethod::ApiKey,
    };

    World {
        _scratch: scratch,
        _shutdown: shutdown_sender,
        application_state,
        bootstrap_id,
        bootstrap_caller,
        sole_grant_id,
    }
}

#[tokio::test]
async fn certify_bootstrap_cannot_be_disabled() {
    println!("\n🧪 [PROVING_GROUNDS]: Bootstrap disable shield audit...");
    let world = forge_world().await;

    let fault = IdentityGovernanceHandler::handle_update_user(
        State(world.application_state.clone()),
        Some(Extension(world.bootstrap_caller.clone())),
        Extension(ClientIp("::1".into())),
        Path(world.bootstrap_id.clone()),
        Json(UpdateUserPayload { display_name: None, password: None, is_active: Some(false) }),
    )
    .await
    .err()
    .expect("disable must fail");

    assert_eq!(fault.code, "AUTH_BOOTSTRAP_PROTECTED");
    println!("   ✅ [SUCCESS]: Disable rejected.");
}

#[tokio::test]
async fn certify_last_bootstrap_grant_cannot_be_revoked() {
    let world = forge_world().await;

    let fault = IdentityGovernanceHandler::handle_revoke_grant(
        State(world.application_state.clone()),
        Some(Extension(world.bootstrap_caller.clone())),
        Extension(ClientIp("::1".into())),
        Path(world.sole_grant_id.clone()),
    )
    .await
    .err()
    .expect("revocation must fail");

    assert_eq!(fault.code, "AUTH_BOOTSTRAP_PROTECTED");

    // El grant sigue activo tras el intento.
    let core = world.application_state.core().await.unwrap();
    let grants = core.grant_repository.active_grants_for_user(&world.bootstrap_id).await.unwrap();
    assert_eq!(grants.len(), 1);
}

#[tokio::test]
async fn certify_non_final_grant_revocation_still_works() {
    let world = forge_world().await;
    let core = world.application_state.core().await.unwrap();

    // Con un segundo grant activo, la revocación del primero procede.
    let second_grant_id = Uuid::new_v4().to_string();
    core.grant_repository
        .insert(&Grant {
            id: second_grant_id,
            user_id: world.bootstrap_id.clone(),
            action: "query".into(),
            constraints: None,
            is_active: true,
            created_by: world.bootstrap_id.clone(),
            created_at: now_unix(),
        })
        .await
        .unwrap();

    let revoked = IdentityGovernanceHandler::handle_revoke_grant(
        State(world.application_state.clone()),
        Some(Extension(world.bootstrap_caller.clone())),
        Extension(ClientIp("::1".into())),
        Path(world.sole_grant_id.clone()),
    )
    .await;
    assert!(revoked.is_ok());

    let remaining = core.grant_repository.active_grants_for_user(&world.bootstrap_id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].action, "query");
}
