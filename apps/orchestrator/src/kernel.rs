// INICIO DEL ARCHIVO [apps/orchestrator/src/kernel.rs]
/**
 * =================================================================
 * APARATO: ORCHESTRATOR SOVEREIGN KERNEL (V10.3 - GRACEFUL CORE)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * VISION HIPER-HOLÍSTICA:
 * Actúa como la placa base donde se conectan todos los servicios.
 * 1. DEFERRED CORE: El núcleo puede nacer vía STRATAVAULT_WORKDIR en
 *    el arranque o vía POST /api/config en caliente.
 * 2. GRACEFUL SHUTDOWN: Ctrl-C dispara la señal watch; los daemons
 *    (limpieza de auditoría, staging de descargas) la escuchan y
 *    salen antes de la terminación del proceso.
 * =================================================================
 */

use crate::routes::create_sovereign_router;
use crate::state::{AppState, CoreContext, RuntimeLimits};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

pub struct OrchestratorKernel {
    pub server_network_port: u16,
    pub application_shared_state: AppState,
    shutdown_sender: watch::Sender<bool>,
}

impl OrchestratorKernel {
    /**
     * Forja el estado compartido y, si el entorno porta un workdir,
     * enciende el núcleo de inmediato.
     */
    #[instrument(skip(listening_port))]
    pub async fn ignite(listening_port: u16) -> Self {
        let (shutdown_sender, shutdown_receiver) = watch::channel(false);
        let limits = RuntimeLimits::from_environment();
        let application_shared_state = AppState::new(limits.clone(), shutdown_receiver.clone());

        // Ignición temprana opcional del núcleo (entornos headless).
        if let Ok(preset_workdir) = std::env::var("STRATAVAULT_WORKDIR") {
            if !preset_workdir.trim().is_empty() {
                match CoreContext::ignite(
                    &PathBuf::from(preset_workdir.trim()),
                    limits,
                    shutdown_receiver,
                )
                .await
                {
                    Ok(core) => {
                        application_shared_state.install_core(core).await;
                        info!("🧬 [KERNEL]: Core pre-ignited from STRATAVAULT_WORKDIR.");
                    }
                    Err(ignition_fault) => {
                        warn!("⚠️ [KERNEL]: Early core ignition failed: {}", ignition_fault);
                    }
                }
            }
        }

        Self {
            server_network_port: listening_port,
            application_shared_state,
            shutdown_sender,
        }
    }

    /**
     * Levanta el transporte HTTP y bloquea hasta el apagado.
     */
    pub async fn launch_sovereign_operations(self) {
        let sovereign_router = create_sovereign_router(self.application_shared_state.clone());

        let bind_address =
            SocketAddr::new("0.0.0.0".parse::<IpAddr>().unwrap(), self.server_network_port);

        info!("🚀 [KERNEL_ONLINE]: Stratavault Control Center listening at {}", bind_address);

        let tcp_listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .expect("CRITICAL_FAULT: Failed to bind network port.");

        let shutdown_sender = self.shutdown_sender;
        let graceful_shutdown = async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("🛑 [KERNEL]: Shutdown signal received. Draining daemons...");
            let _ = shutdown_sender.send(true);
        };

        let serving_outcome = axum::serve(
            tcp_listener,
            sovereign_router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(graceful_shutdown)
        .await;

        if let Err(server_error) = serving_outcome {
            error!("💀 [KERNEL_COLLAPSE]: Runtime failure: {}", server_error);
            std::process::exit(1);
        }
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/kernel.rs]
