// INICIO DEL ARCHIVO [libs/infra/db-libsql/src/client.rs]
/*!
 * =================================================================
 * APARATO: DATABASE CONNECTION CLIENT (V7.2 - DUAL PROFILE)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DE ENLACES LOCALES Y PERSISTENCIA ACID
 *
 * # Mathematical Proof (In-Memory Consistency):
 * Para garantizar que el esquema sea visible entre hilos en modo RAM,
 * el cliente detecta URLs de memoria y aplica el ancla de persistencia
 * ANTES de la ejecución del bootstrap, asegurando que las tablas
 * residan en un segmento de memoria compartido.
 * =================================================================
 */

use crate::errors::DbError;
use crate::schema::{apply_orchestrator_schema, apply_topic_catalogue_schema};
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Perfil de esquema a solidificar al abrir el enlace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaProfile {
    /// Ledger process-wide: índice, auditoría, identidad, cuotas.
    Orchestrator,
    /// Catálogo local de un tópico: activos, metadatos, segmentos.
    TopicCatalogue,
}

#[derive(Clone)]
pub struct LibsqlClient {
    internal_database_driver: Arc<Database>,
    /// Mantiene la base viva en memoria evitando que SQLite la purgue.
    _memory_persistence_anchor: Option<Arc<Connection>>,
}

impl LibsqlClient {
    /// Abre (o crea) una base local y solidifica el perfil de esquema.
    #[instrument(skip(database_path))]
    pub async fn open(database_path: &str, profile: SchemaProfile) -> Result<Self, DbError> {
        if database_path.is_empty() {
            return Err(DbError::ConnectionError("CRITICAL_FAULT: DATABASE_PATH_UNDEFINED".into()));
        }

        info!("🔌 [DATABASE]: Initiating local link to [{}]", database_path);

        let is_memory = database_path.contains(":memory:") || database_path.contains("mode=memory");

        let database_driver = Builder::new_local(database_path)
            .build()
            .await
            .map_err(|e| DbError::ConnectionError(format!("DRIVER_IGNITION_FAILURE: {}", e)))?;

        let shared_driver = Arc::new(database_driver);
        let mut anchor = None;

        if is_memory {
            // En modo memoria el ancla debe abrirse ANTES de cualquier
            // otra operación para compartir el segmento entre hilos.
            let anchor_connection = shared_driver
                .connect()
                .map_err(|e| DbError::ConnectionError(format!("ANCHOR_FAULT: {}", e)))?;
            Self::solidify_schema(&anchor_connection, profile).await?;
            anchor = Some(Arc::new(anchor_connection));
            info!("⚓ [DATABASE]: Memory strata solidified and anchored.");
        } else {
            let bootstrap_connection = shared_driver
                .connect()
                .map_err(|e| DbError::ConnectionError(format!("BOOTSTRAP_LINK_FAULT: {}", e)))?;
            Self::solidify_schema(&bootstrap_connection, profile).await?;
        }

        Ok(Self { internal_database_driver: shared_driver, _memory_persistence_anchor: anchor })
    }

    async fn solidify_schema(connection: &Connection, profile: SchemaProfile) -> Result<(), DbError> {
        let outcome = match profile {
            SchemaProfile::Orchestrator => apply_orchestrator_schema(connection).await,
            SchemaProfile::TopicCatalogue => apply_topic_catalogue_schema(connection).await,
        };
        outcome.map_err(|e| DbError::ConnectionError(format!("SCHEMA_SYNC_FAULT: {}", e)))
    }

    pub fn get_connection(&self) -> Result<Connection, DbError> {
        self.internal_database_driver.connect().map_err(|e| {
            error!("⚠️ [POOL_FAULT]: Connection allocation failed: {}", e);
            DbError::ConnectionError(e.to_string())
        })
    }
}
// FIN DEL ARCHIVO [libs/infra/db-libsql/src/client.rs]
