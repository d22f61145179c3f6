// [libs/infra/db-libsql/src/repositories/user_repository.rs]
/*!
 * =================================================================
 * APARATO: USER ACCOUNT REPOSITORY (V7.4 - IDENTITY VAULT)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE CUENTAS, LOCKOUT Y MATERIAL DE CREDENCIALES
 *
 * # Invariantes:
 * Jamás toca una contraseña o token en claro: solo sellos PBKDF2 y
 * hashes SHA-256. El usuario bootstrap es único y su degradación se
 * veta en el estrato de aplicación.
 * =================================================================
 */

use crate::errors::DbError;
use crate::values::{get_bool, get_i64, get_opt_i64, get_string};
use crate::LibsqlClient;
use libsql::params;
use stratavault_domain_models::UserAccount;
use tracing::instrument;

pub struct UserRepository {
    database_client: LibsqlClient,
}

impl UserRepository {
    pub fn new(client: LibsqlClient) -> Self {
        Self { database_client: client }
    }

    /// Inserta una cuenta nueva; username duplicado degrada a
    /// `UserAlreadyExists`.
    #[instrument(skip(self, account))]
    pub async fn insert(&self, account: &UserAccount) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        let outcome = connection
            .execute(
                r#"
                INSERT INTO users (
                    id, username, display_name, password_hash, api_key_hash,
                    is_active, is_bootstrap, failed_login_count, locked_until,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
                params![
                    account.id.clone(),
                    account.username.clone(),
                    account.display_name.clone(),
                    account.password_hash.clone(),
                    account.api_key_hash.clone(),
                    account.is_active as i64,
                    account.is_bootstrap as i64,
                    account.failed_login_count,
                    account.locked_until,
                    account.created_at,
                    account.updated_at
                ],
            )
            .await;

        match outcome {
            Ok(_) => Ok(()),
            Err(fault) if fault.to_string().contains("UNIQUE") => Err(DbError::UserAlreadyExists),
            Err(fault) => Err(fault.into()),
        }
    }

    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<UserAccount>, DbError> {
        self.find_one("SELECT * FROM users WHERE id = ?1", user_id).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, DbError> {
        self.find_one("SELECT * FROM users WHERE username = ?1", username).await
    }

    /// Resolución por hash del API key presentado.
    pub async fn find_by_api_key_hash(&self, api_key_hash: &str) -> Result<Option<UserAccount>, DbError> {
        self.find_one("SELECT * FROM users WHERE api_key_hash = ?1", api_key_hash).await
    }

    pub async fn list_all(&self) -> Result<Vec<UserAccount>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query("SELECT * FROM users ORDER BY username ASC", ())
            .await?;
        let mut accounts = Vec::new();
        while let Some(row) = rows.next().await? {
            accounts.push(Self::map_account(&row)?);
        }
        Ok(accounts)
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection.query("SELECT COUNT(*) FROM users", ()).await?;
        match rows.next().await? {
            Some(row) => get_i64(&row, 0),
            None => Ok(0),
        }
    }

    /// Actualiza los campos editables de perfil.
    #[instrument(skip(self, display_name, password_hash))]
    pub async fn update_profile(
        &self,
        user_id: &str,
        display_name: Option<&str>,
        password_hash: Option<&str>,
        is_active: Option<bool>,
        updated_at: i64,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        if let Some(display_name) = display_name {
            connection
                .execute(
                    "UPDATE users SET display_name = ?2, updated_at = ?3 WHERE id = ?1",
                    params![user_id, display_name, updated_at],
                )
                .await?;
        }
        if let Some(password_hash) = password_hash {
            connection
                .execute(
                    "UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1",
                    params![user_id, password_hash, updated_at],
                )
                .await?;
        }
        if let Some(is_active) = is_active {
            connection
                .execute(
                    "UPDATE users SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
                    params![user_id, is_active as i64, updated_at],
                )
                .await?;
        }
        Ok(())
    }

    /// Reemplaza el hash del API key; el anterior queda inválido al instante.
    pub async fn replace_api_key_hash(
        &self,
        user_id: &str,
        api_key_hash: &str,
        updated_at: i64,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "UPDATE users SET api_key_hash = ?2, updated_at = ?3 WHERE id = ?1",
                params![user_id, api_key_hash, updated_at],
            )
            .await?;
        Ok(())
    }

    /// Registra un fallo de login y, en el umbral, la ventana de bloqueo.
    pub async fn record_login_failure(
        &self,
        user_id: &str,
        failed_login_count: i64,
        locked_until: Option<i64>,
        updated_at: i64,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "UPDATE users SET failed_login_count = ?2, locked_until = ?3, updated_at = ?4
                 WHERE id = ?1",
                params![user_id, failed_login_count, locked_until, updated_at],
            )
            .await?;
        Ok(())
    }

    /// Resetea el contador de fallos tras un login exitoso.
    pub async fn reset_login_failures(&self, user_id: &str, updated_at: i64) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "UPDATE users SET failed_login_count = 0, locked_until = NULL, updated_at = ?2
                 WHERE id = ?1",
                params![user_id, updated_at],
            )
            .await?;
        Ok(())
    }

    async fn find_one(&self, sql: &str, key: &str) -> Result<Option<UserAccount>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection.query(sql, params![key]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::map_account(&row)?)),
            None => Ok(None),
        }
    }

    fn map_account(row: &libsql::Row) -> Result<UserAccount, DbError> {
        Ok(UserAccount {
            id: get_string(row, 0)?,
            username: get_string(row, 1)?,
            display_name: get_string(row, 2)?,
            password_hash: get_string(row, 3)?,
            api_key_hash: get_string(row, 4)?,
            is_active: get_bool(row, 5)?,
            is_bootstrap: get_bool(row, 6)?,
            failed_login_count: get_i64(row, 7)?,
            locked_until: get_opt_i64(row, 8)?,
            created_at: get_i64(row, 9)?,
            updated_at: get_i64(row, 10)?,
        })
    }
}
// FIN DEL ARCHIVO [libs/infra/db-libsql/src/repositories/user_repository.rs]
