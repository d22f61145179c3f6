// [libs/infra/db-libsql/src/repositories/session_repository.rs]
/*!
 * =================================================================
 * APARATO: SESSION REPOSITORY (V7.2 - SHORT-LIVED CREDENTIALS)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE SESIONES POR HASH DE TOKEN
 * =================================================================
 */

use crate::errors::DbError;
use crate::values::{get_i64, get_string};
use crate::LibsqlClient;
use libsql::params;
use stratavault_domain_models::SessionRecord;
use tracing::instrument;

pub struct SessionRepository {
    database_client: LibsqlClient,
}

impl SessionRepository {
    pub fn new(client: LibsqlClient) -> Self {
        Self { database_client: client }
    }

    #[instrument(skip(self, session))]
    pub async fn insert(&self, session: &SessionRecord) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                r#"
                INSERT INTO sessions (token_hash, user_id, created_at, last_seen_at, expires_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    session.token_hash.clone(),
                    session.user_id.clone(),
                    session.created_at,
                    session.last_seen_at,
                    session.expires_at
                ],
            )
            .await?;
        Ok(())
    }

    /// Resuelve una sesión viva por hash de token; expirada cuenta como
    /// inexistente.
    pub async fn find_live(&self, token_hash: &str, now_unix: i64) -> Result<Option<SessionRecord>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT token_hash, user_id, created_at, last_seen_at, expires_at
                 FROM sessions WHERE token_hash = ?1 AND expires_at > ?2",
                params![token_hash, now_unix],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(SessionRecord {
                token_hash: get_string(&row, 0)?,
                user_id: get_string(&row, 1)?,
                created_at: get_i64(&row, 2)?,
                last_seen_at: get_i64(&row, 3)?,
                expires_at: get_i64(&row, 4)?,
            })),
            None => Ok(None),
        }
    }

    pub async fn touch(&self, token_hash: &str, last_seen_at: i64) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "UPDATE sessions SET last_seen_at = ?2 WHERE token_hash = ?1",
                params![token_hash, last_seen_at],
            )
            .await?;
        Ok(())
    }

    /// Borra una sesión (logout).
    pub async fn delete(&self, token_hash: &str) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute("DELETE FROM sessions WHERE token_hash = ?1", params![token_hash])
            .await?;
        Ok(())
    }

    /// Borra toda sesión del usuario (deshabilitación de cuenta).
    #[instrument(skip(self))]
    pub async fn delete_for_user(&self, user_id: &str) -> Result<u64, DbError> {
        let connection = self.database_client.get_connection()?;
        let removed = connection
            .execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id])
            .await?;
        Ok(removed)
    }

    /// Purga sesiones expiradas (mantenimiento periódico).
    pub async fn purge_expired(&self, now_unix: i64) -> Result<u64, DbError> {
        let connection = self.database_client.get_connection()?;
        let removed = connection
            .execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now_unix])
            .await?;
        Ok(removed)
    }
}
// FIN DEL ARCHIVO [libs/infra/db-libsql/src/repositories/session_repository.rs]
