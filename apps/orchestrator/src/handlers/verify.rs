// INICIO DEL ARCHIVO [apps/orchestrator/src/handlers/verify.rs]
/*!
 * =================================================================
 * APARATO: VERIFICATION SURFACE HANDLER (V10.2 - SSE SCAN)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: DISPARO DEL ESCANEO DE INTEGRIDAD VÍA SSE
 * =================================================================
 */

use crate::errors::{ApiError, TOPIC_NOT_FOUND};
use crate::middleware::require_identity;
use crate::services::verification;
use crate::state::AppState;
use axum::{
    extract::{Extension, Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use futures_util::StreamExt;
use serde::Deserialize;
use std::convert::Infallible;
use stratavault_domain_authz::{ActionToken, OperationContext};
use stratavault_domain_models::CallerIdentity;
use tokio_stream::wrappers::ReceiverStream;
use tracing::instrument;

#[derive(Debug, Deserialize, Default)]
pub struct VerifyParams {
    /// Lista separada por comas; ausente = todos los tópicos.
    #[serde(default)]
    pub topics: Option<String>,
    #[serde(default)]
    pub check_index: Option<bool>,
}

pub struct VerificationSurfaceHandler;

impl VerificationSurfaceHandler {
    /**
     * Endpoint: GET /api/verify?topics=…&check_index=…
     */
    #[instrument(skip(application_state, caller_identity, params))]
    pub async fn handle_verify(
        State(application_state): State<AppState>,
        caller_identity: Option<Extension<CallerIdentity>>,
        Query(params): Query<VerifyParams>,
    ) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
        let core = application_state.require_core().await?;
        let caller = require_identity(caller_identity.as_ref().map(|ext| &ext.0))?;
        core.auth_gate
            .authorize(&caller, ActionToken::ManageTopics, OperationContext::default())
            .await?;

        // Selección de tópicos (ausente = todos).
        let stores = match &params.topics {
            None => core.topic_registry.stores().await,
            Some(raw_list) => {
                let mut selected = Vec::new();
                for topic_name in raw_list.split(',').map(str::trim).filter(|name| !name.is_empty()) {
                    let store = core.topic_registry.get(topic_name).await.ok_or_else(|| {
                        ApiError::not_found(
                            TOPIC_NOT_FOUND,
                            format!("topic '{}' does not exist", topic_name),
                        )
                    })?;
                    selected.push(store);
                }
                selected
            }
        };

        let receiver = verification::spawn_verification(
            stores,
            core.index_repository.clone(),
            params.check_index.unwrap_or(false),
        );

        let event_stream = ReceiverStream::new(receiver).map(|(event_name, payload)| {
            Ok::<Event, Infallible>(Event::default().event(event_name).data(payload.to_string()))
        });

        Ok(Sse::new(event_stream).keep_alive(KeepAlive::default()))
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/handlers/verify.rs]
