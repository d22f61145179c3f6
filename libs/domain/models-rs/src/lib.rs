// [libs/domain/models-rs/src/lib.rs]
/*!
 * =================================================================
 * APARATO: STRATAVAULT DOMAIN MODELS (V6.0 - VAULT CONTRACTS)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: SSOT DE CONTRATOS ENTRE CATÁLOGO, API Y PIPELINES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CONTENT ADDRESSING: Todo activo se identifica por el SHA-256 de
 *    su payload; los contratos transportan hashes hex de 64 chars.
 * 2. CLOSED ENUMERATIONS: Acciones de auditoría, modos de descarga y
 *    operaciones de metadatos viven como enums cerrados con mapeo
 *    textual estable hacia SQLite y el envelope JSON.
 * 3. NOMINAL PRECISION: Nomenclatura nominal absoluta en los campos.
 * =================================================================
 */

pub mod asset;
pub mod audit;
pub mod auth;
pub mod download;
pub mod metadata;
pub mod query;
pub mod topic;

pub use asset::{is_valid_content_hash, AssetDetail, AssetLocation, AssetRecord, IngestReceipt};
pub use audit::{AuditAction, AuditEntry, AuditScopeFilter};
pub use auth::{
    validate_username, AuthMethod, CallerIdentity, Grant, PublicUser, QuotaDayRow, SessionRecord,
    UserAccount,
};
pub use download::{
    BulkDownloadRequest, DownloadManifest, DownloadMode, FailedManifestAsset, FilenameFormat,
    ManifestAsset,
};
pub use metadata::{
    coerce_numeric_value, BatchMetadataOperation, BatchOperationOutcome, BatchReport,
    MetadataEventRow, MetadataOp,
};
pub use query::{PresetDefinition, PresetExecutionReport, PresetParameter};
pub use topic::{validate_topic_name, ExtensionBreakdownEntry, TopicStatsDocument, TopicSummary};
