// [libs/infra/db-libsql/src/repositories/index_repository.rs]
/*!
 * =================================================================
 * APARATO: ORCHESTRATOR INDEX REPOSITORY (V7.2 - LOCATION MAP)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: MAPEO PROCESS-WIDE HASH -> (TÓPICO, SEGMENTO, OFFSET)
 *
 * # Invariantes:
 * Toda fila corresponde a una fila de activo viva en el tópico
 * referenciado; la reconciliación purga las huérfanas. Un mismo hash
 * puede residir en varios tópicos (filas separadas).
 * =================================================================
 */

use crate::errors::DbError;
use crate::values::{get_i64, get_string};
use crate::LibsqlClient;
use libsql::params;
use stratavault_domain_models::AssetLocation;
use tracing::{debug, instrument};

pub struct IndexRepository {
    database_client: LibsqlClient,
}

impl IndexRepository {
    pub fn new(client: LibsqlClient) -> Self {
        Self { database_client: client }
    }

    /// Upsert idempotente de la ubicación de un activo.
    #[instrument(skip(self))]
    pub async fn index_asset(&self, location: &AssetLocation) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                r#"
                INSERT INTO asset_index (hash, topic, dat_file, byte_offset, size)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT (hash, topic) DO UPDATE SET
                    dat_file = excluded.dat_file,
                    byte_offset = excluded.byte_offset,
                    size = excluded.size
                "#,
                params![
                    location.hash.clone(),
                    location.topic.clone(),
                    location.dat_file.clone(),
                    location.offset as i64,
                    location.size as i64
                ],
            )
            .await?;
        Ok(())
    }

    /// Primera ubicación de un hash (cualquier tópico, orden estable por
    /// nombre de tópico) o None.
    pub async fn locate(&self, hash: &str) -> Result<Option<AssetLocation>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT hash, topic, dat_file, byte_offset, size
                 FROM asset_index WHERE hash = ?1 ORDER BY topic ASC LIMIT 1",
                params![hash],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::map_location(&row)?)),
            None => Ok(None),
        }
    }

    /// Ubicación de un hash dentro de un tópico concreto.
    pub async fn locate_in_topic(&self, hash: &str, topic: &str) -> Result<Option<AssetLocation>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT hash, topic, dat_file, byte_offset, size
                 FROM asset_index WHERE hash = ?1 AND topic = ?2",
                params![hash, topic],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::map_location(&row)?)),
            None => Ok(None),
        }
    }

    /// Todas las ubicaciones registradas de un hash.
    pub async fn locate_all(&self, hash: &str) -> Result<Vec<AssetLocation>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT hash, topic, dat_file, byte_offset, size
                 FROM asset_index WHERE hash = ?1 ORDER BY topic ASC",
                params![hash],
            )
            .await?;

        let mut locations = Vec::new();
        while let Some(row) = rows.next().await? {
            locations.push(Self::map_location(&row)?);
        }
        Ok(locations)
    }

    /// Conteo de hashes únicos a través de todos los tópicos.
    pub async fn count_unique_hashes(&self) -> Result<u64, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query("SELECT COUNT(DISTINCT hash) FROM asset_index", ())
            .await?;
        match rows.next().await? {
            Some(row) => Ok(get_i64(&row, 0)? as u64),
            None => Ok(0),
        }
    }

    /// Filas registradas para un tópico, en orden de hash.
    pub async fn list_topic_entries(&self, topic: &str) -> Result<Vec<AssetLocation>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT hash, topic, dat_file, byte_offset, size
                 FROM asset_index WHERE topic = ?1 ORDER BY hash ASC",
                params![topic],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(Self::map_location(&row)?);
        }
        Ok(entries)
    }

    /// Tópicos distintos presentes en el índice.
    pub async fn distinct_topics(&self) -> Result<Vec<String>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query("SELECT DISTINCT topic FROM asset_index ORDER BY topic ASC", ())
            .await?;

        let mut topics = Vec::new();
        while let Some(row) = rows.next().await? {
            topics.push(get_string(&row, 0)?);
        }
        Ok(topics)
    }

    /// Elimina todas las filas de un tópico; devuelve el conteo purgado.
    #[instrument(skip(self))]
    pub async fn purge_topic(&self, topic: &str) -> Result<u64, DbError> {
        let connection = self.database_client.get_connection()?;
        let purged = connection
            .execute("DELETE FROM asset_index WHERE topic = ?1", params![topic])
            .await?;
        debug!("🧹 [INDEX_PURGE]: {} entries removed for topic '{}'.", purged, topic);
        Ok(purged)
    }

    fn map_location(row: &libsql::Row) -> Result<AssetLocation, DbError> {
        Ok(AssetLocation {
            hash: get_string(row, 0)?,
            topic: get_string(row, 1)?,
            dat_file: get_string(row, 2)?,
            offset: get_i64(row, 3)? as u64,
            size: get_i64(row, 4)? as u64,
        })
    }
}
// FIN DEL ARCHIVO [libs/infra/db-libsql/src/repositories/index_repository.rs]
