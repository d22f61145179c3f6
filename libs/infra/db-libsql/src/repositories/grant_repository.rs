// [libs/infra/db-libsql/src/repositories/grant_repository.rs]
/*!
 * =================================================================
 * APARATO: GRANT REPOSITORY (V7.3 - ACTION LEDGER)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE GRANTS CON CONSTRAINTS JSON
 * =================================================================
 */

use crate::errors::DbError;
use crate::values::{get_bool, get_i64, get_opt_string, get_string};
use crate::LibsqlClient;
use libsql::params;
use stratavault_domain_models::Grant;
use tracing::instrument;

pub struct GrantRepository {
    database_client: LibsqlClient,
}

impl GrantRepository {
    pub fn new(client: LibsqlClient) -> Self {
        Self { database_client: client }
    }

    #[instrument(skip(self, grant))]
    pub async fn insert(&self, grant: &Grant) -> Result<(), DbError> {
        let constraints_json = grant.constraints.as_ref().map(|value| value.to_string());
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                r#"
                INSERT INTO grants (id, user_id, action, constraints_json, is_active, created_by, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    grant.id.clone(),
                    grant.user_id.clone(),
                    grant.action.clone(),
                    constraints_json,
                    grant.is_active as i64,
                    grant.created_by.clone(),
                    grant.created_at
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn find_by_id(&self, grant_id: &str) -> Result<Option<Grant>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query("SELECT * FROM grants WHERE id = ?1", params![grant_id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::map_grant(&row)?)),
            None => Ok(None),
        }
    }

    /// Grants activos de un usuario (los únicos que autorizan).
    pub async fn active_grants_for_user(&self, user_id: &str) -> Result<Vec<Grant>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT * FROM grants WHERE user_id = ?1 AND is_active = 1 ORDER BY created_at ASC",
                params![user_id],
            )
            .await?;
        let mut grants = Vec::new();
        while let Some(row) = rows.next().await? {
            grants.push(Self::map_grant(&row)?);
        }
        Ok(grants)
    }

    /// Todos los grants de un usuario, activos o no.
    pub async fn all_grants_for_user(&self, user_id: &str) -> Result<Vec<Grant>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT * FROM grants WHERE user_id = ?1 ORDER BY created_at ASC",
                params![user_id],
            )
            .await?;
        let mut grants = Vec::new();
        while let Some(row) = rows.next().await? {
            grants.push(Self::map_grant(&row)?);
        }
        Ok(grants)
    }

    /// Conteo de grants activos de un usuario (protección bootstrap).
    pub async fn count_active_for_user(&self, user_id: &str) -> Result<i64, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT COUNT(*) FROM grants WHERE user_id = ?1 AND is_active = 1",
                params![user_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => get_i64(&row, 0),
            None => Ok(0),
        }
    }

    /// Revoca (desactiva) un grant. La fila permanece para el rastro.
    #[instrument(skip(self))]
    pub async fn revoke(&self, grant_id: &str) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        let updated = connection
            .execute("UPDATE grants SET is_active = 0 WHERE id = ?1", params![grant_id])
            .await?;
        if updated == 0 {
            return Err(DbError::GrantNotFound);
        }
        Ok(())
    }

    fn map_grant(row: &libsql::Row) -> Result<Grant, DbError> {
        let constraints = match get_opt_string(row, 3)? {
            Some(raw) => Some(
                serde_json::from_str(&raw)
                    .map_err(|e| DbError::MappingError(format!("constraints blob: {}", e)))?,
            ),
            None => None,
        };
        Ok(Grant {
            id: get_string(row, 0)?,
            user_id: get_string(row, 1)?,
            action: get_string(row, 2)?,
            constraints,
            is_active: get_bool(row, 4)?,
            created_by: get_string(row, 5)?,
            created_at: get_i64(row, 6)?,
        })
    }
}
// FIN DEL ARCHIVO [libs/infra/db-libsql/src/repositories/grant_repository.rs]
