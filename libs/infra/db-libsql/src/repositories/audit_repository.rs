// INICIO DEL ARCHIVO [libs/infra/db-libsql/src/repositories/audit_repository.rs]
/*!
 * =================================================================
 * APARATO: AUDIT LOG REPOSITORY (V7.3 - MONOTONIC TRAIL)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: REGISTRO ACÍDICO APPEND-ONLY Y PODA OLDEST-FIRST
 *
 * # Invariantes:
 * Ids estrictamente monótonos process-wide (AUTOINCREMENT); ninguna
 * fila se actualiza jamás; la única remoción es la poda transaccional
 * por tamaño, de las filas más antiguas primero.
 * =================================================================
 */

use crate::errors::DbError;
use crate::values::{get_i64, get_string};
use crate::LibsqlClient;
use libsql::{params, Value};
use stratavault_domain_models::{AuditEntry, AuditScopeFilter};
use tracing::{info, instrument};

/// Filtros de consulta del log de auditoría.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub limit: i64,
    pub offset: i64,
    pub action: Option<String>,
    pub scope: AuditScopeFilter,
    /// Actor contra el que se evalúa el scope me/others.
    pub caller_username: String,
    /// Filtro explícito por username (admin).
    pub username: Option<String>,
    pub since: Option<i64>,
    pub until: Option<i64>,
}

pub struct AuditRepository {
    database_client: LibsqlClient,
}

impl AuditRepository {
    pub fn new(client: LibsqlClient) -> Self {
        Self { database_client: client }
    }

    /// Anexa una fila al rastro durable; devuelve su id monótono.
    #[instrument(skip(self, details))]
    pub async fn append(
        &self,
        action: &str,
        source_ip: &str,
        username: &str,
        details: &serde_json::Value,
        created_at: i64,
    ) -> Result<i64, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                r#"
                INSERT INTO audit_log (created_at, action, source_ip, username, details)
                VALUES (?1, ?2, ?3, ?4, ?5)
                RETURNING id
                "#,
                params![created_at, action, source_ip, username, details.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => get_i64(&row, 0),
            None => Err(DbError::MappingError("audit append returned no id".into())),
        }
    }

    /// Consulta paginada con filtros de acción, scope, actor y ventana.
    pub async fn query(&self, filter: &AuditQuery) -> Result<Vec<AuditEntry>, DbError> {
        let mut sql = String::from(
            "SELECT id, created_at, action, source_ip, username, details FROM audit_log WHERE 1=1",
        );
        let mut parameter_values: Vec<Value> = Vec::new();

        if let Some(action) = &filter.action {
            sql.push_str(&format!(" AND action = ?{}", parameter_values.len() + 1));
            parameter_values.push(Value::Text(action.clone()));
        }
        match filter.scope {
            AuditScopeFilter::All => {}
            AuditScopeFilter::Me => {
                sql.push_str(&format!(" AND username = ?{}", parameter_values.len() + 1));
                parameter_values.push(Value::Text(filter.caller_username.clone()));
            }
            AuditScopeFilter::Others => {
                sql.push_str(&format!(" AND username != ?{}", parameter_values.len() + 1));
                parameter_values.push(Value::Text(filter.caller_username.clone()));
            }
        }
        if let Some(username) = &filter.username {
            sql.push_str(&format!(" AND username = ?{}", parameter_values.len() + 1));
            parameter_values.push(Value::Text(username.clone()));
        }
        if let Some(since) = filter.since {
            sql.push_str(&format!(" AND created_at >= ?{}", parameter_values.len() + 1));
            parameter_values.push(Value::Integer(since));
        }
        if let Some(until) = filter.until {
            sql.push_str(&format!(" AND created_at <= ?{}", parameter_values.len() + 1));
            parameter_values.push(Value::Integer(until));
        }

        sql.push_str(&format!(
            " ORDER BY id DESC LIMIT ?{} OFFSET ?{}",
            parameter_values.len() + 1,
            parameter_values.len() + 2
        ));
        parameter_values.push(Value::Integer(filter.limit.max(0)));
        parameter_values.push(Value::Integer(filter.offset.max(0)));

        let connection = self.database_client.get_connection()?;
        let mut rows = connection.query(&sql, parameter_values).await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(Self::map_entry(&row)?);
        }
        Ok(entries)
    }

    /// Conteo total de filas del rastro.
    pub async fn count(&self) -> Result<i64, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection.query("SELECT COUNT(*) FROM audit_log", ()).await?;
        match rows.next().await? {
            Some(row) => get_i64(&row, 0),
            None => Ok(0),
        }
    }

    /// Filas con id estrictamente mayor al marcado (cola del stream SSE).
    pub async fn entries_after(&self, last_seen_id: i64, limit: i64) -> Result<Vec<AuditEntry>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, created_at, action, source_ip, username, details
                 FROM audit_log WHERE id > ?1 ORDER BY id ASC LIMIT ?2",
                params![last_seen_id, limit],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(Self::map_entry(&row)?);
        }
        Ok(entries)
    }

    /// Poda transaccional oldest-first: elimina `percentage`% de las filas
    /// (con piso mínimo) cuando el rastro excede el umbral.
    ///
    /// Devuelve las filas eliminadas.
    #[instrument(skip(self))]
    pub async fn prune_oldest(
        &self,
        maximum_rows: i64,
        percentage: u8,
        floor_rows: i64,
    ) -> Result<i64, DbError> {
        let current_rows = self.count().await?;
        if current_rows <= maximum_rows {
            return Ok(0);
        }

        let by_percentage = current_rows * i64::from(percentage) / 100;
        let rows_to_remove = by_percentage.max(floor_rows).min(current_rows);

        let connection = self.database_client.get_connection()?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        let removed = transaction
            .execute(
                "DELETE FROM audit_log WHERE id IN (
                    SELECT id FROM audit_log ORDER BY id ASC LIMIT ?1
                 )",
                params![rows_to_remove],
            )
            .await?;

        transaction
            .commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        info!("🧹 [AUDIT_PRUNE]: {} oldest rows trimmed (trail was {}).", removed, current_rows);
        Ok(removed as i64)
    }

    fn map_entry(row: &libsql::Row) -> Result<AuditEntry, DbError> {
        let details_raw = get_string(row, 5)?;
        let details = serde_json::from_str(&details_raw)
            .unwrap_or(serde_json::Value::Object(Default::default()));
        Ok(AuditEntry {
            id: get_i64(row, 0)?,
            created_at: get_i64(row, 1)?,
            action: get_string(row, 2)?,
            source_ip: get_string(row, 3)?,
            username: get_string(row, 4)?,
            details,
        })
    }
}
// FIN DEL ARCHIVO [libs/infra/db-libsql/src/repositories/audit_repository.rs]
