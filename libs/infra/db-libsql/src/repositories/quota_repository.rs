// [libs/infra/db-libsql/src/repositories/quota_repository.rs]
/*!
 * =================================================================
 * APARATO: QUOTA LEDGER REPOSITORY (V7.2 - UTC DAY WINDOWS)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CONTADORES POR (USUARIO, ACCIÓN, DÍA UTC)
 *
 * # Invariantes:
 * El ledger solo se consume tras el éxito de la operación; la consulta
 * de frontera ocurre antes, en el evaluador de constraints.
 * =================================================================
 */

use crate::errors::DbError;
use crate::values::get_i64;
use crate::LibsqlClient;
use libsql::params;
use stratavault_domain_models::QuotaDayRow;
use tracing::instrument;

pub struct QuotaRepository {
    database_client: LibsqlClient,
}

impl QuotaRepository {
    pub fn new(client: LibsqlClient) -> Self {
        Self { database_client: client }
    }

    /// Consumo acumulado de (usuario, acción) en el día UTC dado.
    pub async fn consumed(&self, user_id: &str, action: &str, day: &str) -> Result<(i64, i64), DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT op_count, volume_bytes FROM quota_ledger
                 WHERE user_id = ?1 AND action = ?2 AND day = ?3",
                params![user_id, action, day],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok((get_i64(&row, 0)?, get_i64(&row, 1)?)),
            None => Ok((0, 0)),
        }
    }

    /// Consuma la demanda en el ledger (solo tras operación exitosa).
    #[instrument(skip(self))]
    pub async fn record_success(
        &self,
        user_id: &str,
        action: &str,
        day: &str,
        operations: i64,
        volume_bytes: i64,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                r#"
                INSERT INTO quota_ledger (user_id, action, day, op_count, volume_bytes)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT (user_id, action, day) DO UPDATE SET
                    op_count = op_count + excluded.op_count,
                    volume_bytes = volume_bytes + excluded.volume_bytes
                "#,
                params![user_id, action, day, operations, volume_bytes],
            )
            .await?;
        Ok(())
    }

    /// Instantánea del ledger de un usuario para el día dado.
    pub async fn snapshot_for_user(&self, user_id: &str, day: &str) -> Result<Vec<QuotaDayRow>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT user_id, action, day, op_count, volume_bytes
                 FROM quota_ledger WHERE user_id = ?1 AND day = ?2 ORDER BY action ASC",
                params![user_id, day],
            )
            .await?;

        let mut snapshot = Vec::new();
        while let Some(row) = rows.next().await? {
            snapshot.push(QuotaDayRow {
                user_id: crate::values::get_string(&row, 0)?,
                action: crate::values::get_string(&row, 1)?,
                day: crate::values::get_string(&row, 2)?,
                op_count: get_i64(&row, 3)?,
                volume_bytes: get_i64(&row, 4)?,
            });
        }
        Ok(snapshot)
    }
}
// FIN DEL ARCHIVO [libs/infra/db-libsql/src/repositories/quota_repository.rs]
