// [libs/domain/models-rs/src/audit.rs]
/*!
 * =================================================================
 * APARATO: AUDIT DOMAIN MODELS (V6.2 - CLOSED ACTION SET)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DEL LOG DE AUDITORÍA PROCESS-WIDE
 *
 * # Invariantes:
 * Ids monótonos; el log solo se poda por recorte oldest-first basado en
 * tamaño; ninguna fila se actualiza. El token de acción pertenece a una
 * enumeración cerrada: todo token ajeno se rechaza en el logger.
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/// Enumeración cerrada de acciones auditables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    AddingFile,
    DownloadFile,
    BulkDownload,
    QueryPreset,
    MetadataUpdate,
    MetadataBatch,
    MetadataApply,
    TopicCreated,
    TopicRemoved,
    ReconcileTopicRemoved,
    LoginSuccess,
    LoginFailed,
    Logout,
    UserCreated,
    UserUpdated,
    UserDisabled,
    GrantCreated,
    GrantRevoked,
    ApiKeyRegenerated,
    ConfigInitialized,
    AuditPruned,
}

impl AuditAction {
    /// Tabla cerrada completa, en orden estable para `/api/audit/actions`.
    pub const ALL: &'static [AuditAction] = &[
        AuditAction::AddingFile,
        AuditAction::DownloadFile,
        AuditAction::BulkDownload,
        AuditAction::QueryPreset,
        AuditAction::MetadataUpdate,
        AuditAction::MetadataBatch,
        AuditAction::MetadataApply,
        AuditAction::TopicCreated,
        AuditAction::TopicRemoved,
        AuditAction::ReconcileTopicRemoved,
        AuditAction::LoginSuccess,
        AuditAction::LoginFailed,
        AuditAction::Logout,
        AuditAction::UserCreated,
        AuditAction::UserUpdated,
        AuditAction::UserDisabled,
        AuditAction::GrantCreated,
        AuditAction::GrantRevoked,
        AuditAction::ApiKeyRegenerated,
        AuditAction::ConfigInitialized,
        AuditAction::AuditPruned,
    ];

    /// Token textual estable hacia SQLite y el envelope JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::AddingFile => "adding_file",
            AuditAction::DownloadFile => "download_file",
            AuditAction::BulkDownload => "bulk_download",
            AuditAction::QueryPreset => "query_preset",
            AuditAction::MetadataUpdate => "metadata_update",
            AuditAction::MetadataBatch => "metadata_batch",
            AuditAction::MetadataApply => "metadata_apply",
            AuditAction::TopicCreated => "topic_created",
            AuditAction::TopicRemoved => "topic_removed",
            AuditAction::ReconcileTopicRemoved => "reconcile_topic_removed",
            AuditAction::LoginSuccess => "login_success",
            AuditAction::LoginFailed => "login_failed",
            AuditAction::Logout => "logout",
            AuditAction::UserCreated => "user_created",
            AuditAction::UserUpdated => "user_updated",
            AuditAction::UserDisabled => "user_disabled",
            AuditAction::GrantCreated => "grant_created",
            AuditAction::GrantRevoked => "grant_revoked",
            AuditAction::ApiKeyRegenerated => "api_key_regenerated",
            AuditAction::ConfigInitialized => "config_initialized",
            AuditAction::AuditPruned => "audit_pruned",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|action| action.as_str() == token)
    }
}

/// Fila del log de auditoría.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub created_at: i64,
    pub action: String,
    pub source_ip: String,
    /// Puede ser vacío en eventos no autenticados o de bootstrap.
    pub username: String,
    /// Blob JSON de detalles específicos de la acción.
    pub details: serde_json::Value,
}

/// Filtro de alcance para la consulta del log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditScopeFilter {
    /// Sin filtro de actor.
    #[default]
    All,
    /// Solo filas del llamador.
    Me,
    /// Solo filas de otros actores.
    Others,
}

impl AuditScopeFilter {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "" => Some(AuditScopeFilter::All),
            "me" => Some(AuditScopeFilter::Me),
            "others" => Some(AuditScopeFilter::Others),
            _ => None,
        }
    }
}

// FIN DEL ARCHIVO [libs/domain/models-rs/src/audit.rs]
