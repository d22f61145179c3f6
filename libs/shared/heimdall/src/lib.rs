// [libs/shared/heimdall/src/lib.rs]
/*!
 * =================================================================
 * APARATO: HEIMDALL NEURAL OBSERVER (V9.0 - FILE STRATA)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4/L6)
 * RESPONSABILIDAD: TRAZADO, CAPTURA DE PÁNICOS Y LOGS POR NIVEL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DUAL MODE: Logs interactivos en desarrollo, JSON plano en
 *    producción.
 * 2. FILE STRATA: Una capa de archivo enruta cada evento a
 *    .internal/logs/{debug,info,warn,error}/<unix-ts>.log. La capa
 *    nace dormida y se arma cuando el directorio de trabajo queda
 *    configurado.
 * 3. PHOENIX SHIELD: Hook de pánico global con volcado forense de
 *    payload y coordenadas de estrato.
 * =================================================================
 */

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info, Level};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as formatting_layer, EnvFilter, Layer};

/// Niveles materializados como subdirectorios de logs.
pub const LOG_LEVEL_DIRECTORIES: &[&str] = &["debug", "info", "warn", "error"];

/// Sumideros de archivo por nivel, armados tras la configuración.
struct FileSinkSet {
    sinks: HashMap<&'static str, Mutex<File>>,
}

static FILE_SINKS: OnceCell<FileSinkSet> = OnceCell::new();

/// Capa de enrutado de eventos hacia los archivos por nivel.
struct FileStrataLayer;

impl<S> Layer<S> for FileStrataLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _context: Context<'_, S>) {
        let Some(sink_set) = FILE_SINKS.get() else { return };

        let level_directory = match *event.metadata().level() {
            Level::ERROR => "error",
            Level::WARN => "warn",
            Level::INFO => "info",
            _ => "debug",
        };
        let Some(sink) = sink_set.sinks.get(level_directory) else { return };

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let line = format!(
            "{} [{}] {}: {}\n",
            chrono::Utc::now().timestamp(),
            event.metadata().level(),
            event.metadata().target(),
            visitor.rendered
        );

        if let Ok(mut file) = sink.lock() {
            let _ = file.write_all(line.as_bytes());
        }
    }
}

/// Visitor que captura el campo `message` y anexa el resto como k=v.
#[derive(Default)]
struct MessageVisitor {
    rendered: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            if self.rendered.is_empty() {
                self.rendered = format!("{:?}", value);
            } else {
                self.rendered = format!("{:?} {}", value, self.rendered);
            }
        } else {
            if !self.rendered.is_empty() {
                self.rendered.push(' ');
            }
            self.rendered.push_str(&format!("{}={:?}", field.name(), value));
        }
    }
}

/// Inicializa el sistema de trazas Heimdall con blindaje de pánicos.
///
/// # Comportamiento:
/// - Desarrollo: logs interactivos compactos.
/// - Producción: JSON plano para ingesta estructurada.
/// - La capa de archivo queda instalada pero dormida hasta
///   [`arm_file_logging`].
///
/// # Errors:
/// Entra en pánico si otro suscriptor global ya fue inicializado.
pub fn init_tracing(service_nominal_identifier: &str) {
    let environmental_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{}={level},tower_http=warn,hyper=warn,libsql=error",
            service_nominal_identifier.replace('-', "_"),
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    let is_production_strata = !cfg!(debug_assertions);

    if is_production_strata {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().json().flatten_event(true))
            .with(FileStrataLayer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().compact().with_target(false))
            .with(FileStrataLayer)
            .init();
    }

    install_phoenix_shield(service_nominal_identifier);

    info!(
        "👁️  [HEIMDALL_ONLINE]: Observability strata levelized for [{}]. Phoenix Shield ACTIVE.",
        service_nominal_identifier
    );
}

/// Arma la capa de archivo creando `.internal/logs/{nivel}/<unix-ts>.log`.
///
/// Idempotente: el segundo armado es un no-op (los sumideros originales
/// permanecen). Devuelve la raíz de logs materializada.
pub fn arm_file_logging(internal_root: &Path) -> std::io::Result<PathBuf> {
    let logs_root = internal_root.join("logs");
    let boot_stamp = chrono::Utc::now().timestamp();

    let mut sinks = HashMap::new();
    for level_directory in LOG_LEVEL_DIRECTORIES {
        let level_path = logs_root.join(level_directory);
        std::fs::create_dir_all(&level_path)?;
        let file_path = level_path.join(format!("{}.log", boot_stamp));
        let file = OpenOptions::new().create(true).append(true).open(&file_path)?;
        sinks.insert(*level_directory, Mutex::new(file));
    }

    let _ = FILE_SINKS.set(FileSinkSet { sinks });
    info!("🗂️  [HEIMDALL_FILES]: Level strata armed under {}.", logs_root.display());
    Ok(logs_root)
}

fn install_phoenix_shield(service_nominal_identifier: &str) {
    let service_id_snapshot = service_nominal_identifier.to_string();

    panic::set_hook(Box::new(move |panic_metadata| {
        let panic_location = panic_metadata
            .location()
            .map(|location| format!("{}:{}:{}", location.file(), location.line(), location.column()))
            .unwrap_or_else(|| "UNKNOWN_STRATA_COORDINATES".to_string());

        let panic_payload_message = panic_metadata
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_metadata.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("UNDEFINED_KERNEL_COLLAPSE_PAYLOAD");

        error!(
            target: "panic_monitor",
            service = %service_id_snapshot,
            estrato = %panic_location,
            "🔥 [CRITICAL_PANIC]: Thread terminated abruptly. Analysis: {}",
            panic_payload_message
        );
    }));
}
// FIN DEL ARCHIVO [libs/shared/heimdall/src/lib.rs]
