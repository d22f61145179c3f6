// [apps/orchestrator/src/services/topic_registry.rs]
/*!
 * =================================================================
 * APARATO: TOPIC REGISTRY SERVICE (V10.2 - DISCOVERY STRATA)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: DESCUBRIMIENTO, FORJA Y REMOCIÓN DE TÓPICOS
 *
 * # Physics:
 * Un tópico existe si su directorio vive bajo el workdir (nombres
 * válidos, jamás '.internal'). El registro mantiene un Arc<TopicStore>
 * por tópico; la remoción borra el directorio completo y deja el
 * índice del orquestador al cuidado del llamador.
 * =================================================================
 */

use crate::services::topic_store::{StoreError, TopicStore};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stratavault_domain_models::validate_topic_name;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

pub struct TopicRegistry {
    working_directory: PathBuf,
    maximum_segment_bytes: u64,
    /// BTreeMap: recorrido lexicográfico estable para el fan-out.
    topics: RwLock<BTreeMap<String, Arc<TopicStore>>>,
}

impl TopicRegistry {
    /**
     * Descubre los tópicos presentes en disco y abre sus almacenes.
     * Un directorio con nombre inválido se ignora con advertencia.
     */
    #[instrument(skip(maximum_segment_bytes))]
    pub async fn discover(
        working_directory: &Path,
        maximum_segment_bytes: u64,
    ) -> Result<Self, StoreError> {
        let mut topics = BTreeMap::new();

        let mut entries = tokio::fs::read_dir(working_directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name().to_string_lossy().to_string();
            if !entry.file_type().await?.is_dir() || file_name.starts_with('.') {
                continue;
            }
            if !validate_topic_name(&file_name) {
                warn!("⚠️ [TOPIC_DISCOVERY]: Ignoring foreign directory '{}'.", file_name);
                continue;
            }

            match TopicStore::open(&file_name, &entry.path(), maximum_segment_bytes).await {
                Ok(store) => {
                    topics.insert(file_name, Arc::new(store));
                }
                Err(open_fault) => {
                    warn!("⚠️ [TOPIC_DISCOVERY]: Topic '{}' failed to open: {}", file_name, open_fault);
                }
            }
        }

        info!("🗃️  [TOPIC_DISCOVERY]: {} topics online.", topics.len());
        Ok(Self {
            working_directory: working_directory.to_path_buf(),
            maximum_segment_bytes,
            topics: RwLock::new(topics),
        })
    }

    /// Forja un tópico nuevo; Err(None) del llamador si ya existe.
    #[instrument(skip(self))]
    pub async fn create(&self, topic_name: &str) -> Result<Option<Arc<TopicStore>>, StoreError> {
        let mut topics_guard = self.topics.write().await;
        if topics_guard.contains_key(topic_name) {
            return Ok(None);
        }

        let topic_directory = self.working_directory.join(topic_name);
        let store = Arc::new(
            TopicStore::open(topic_name, &topic_directory, self.maximum_segment_bytes).await?,
        );
        store.refresh_stats().await?;
        topics_guard.insert(topic_name.to_string(), store.clone());

        info!("🌱 [TOPIC_FORGE]: Topic '{}' created.", topic_name);
        Ok(Some(store))
    }

    pub async fn get(&self, topic_name: &str) -> Option<Arc<TopicStore>> {
        self.topics.read().await.get(topic_name).cloned()
    }

    /// Nombres vivos en orden lexicográfico.
    pub async fn topic_names(&self) -> Vec<String> {
        self.topics.read().await.keys().cloned().collect()
    }

    /// Almacenes vivos en orden lexicográfico de nombre.
    pub async fn stores(&self) -> Vec<Arc<TopicStore>> {
        self.topics.read().await.values().cloned().collect()
    }

    pub async fn count(&self) -> usize {
        self.topics.read().await.len()
    }

    /**
     * Remueve un tópico: lo saca del registro y borra su directorio
     * completo del disco. Devuelve false si no existía.
     */
    #[instrument(skip(self))]
    pub async fn remove(&self, topic_name: &str) -> Result<bool, StoreError> {
        let removed_store = self.topics.write().await.remove(topic_name);
        let Some(store) = removed_store else { return Ok(false) };

        // Tomamos el cerrojo de escritura para drenar mutaciones en vuelo
        // antes de borrar el directorio físico.
        let _quiesce = store.refresh_stats().await;

        tokio::fs::remove_dir_all(&store.directory).await?;
        info!("🔥 [TOPIC_REMOVAL]: Topic '{}' erased from disk.", topic_name);
        Ok(true)
    }

    /// Busca el activo a través de los tópicos (orden lexicográfico).
    pub async fn locate_asset(
        &self,
        hash: &str,
    ) -> Result<Option<(Arc<TopicStore>, stratavault_domain_models::AssetRecord)>, StoreError> {
        for store in self.stores().await {
            if let Some(record) = store.get_asset(hash).await? {
                return Ok(Some((store, record)));
            }
        }
        Ok(None)
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/services/topic_registry.rs]
