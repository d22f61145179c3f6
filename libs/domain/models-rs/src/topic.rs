// [libs/domain/models-rs/src/topic.rs]
/*!
 * =================================================================
 * APARATO: TOPIC DOMAIN MODELS (V6.1 - STATS STRATA)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE TÓPICOS Y CACHÉ DE ESTADÍSTICAS
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/// Longitud máxima de un nombre de tópico.
pub const TOPIC_NAME_MAX_LENGTH: usize = 255;

/// Valida un nombre de tópico contra `^[a-z0-9_-]{1,255}$`.
pub fn validate_topic_name(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.len() <= TOPIC_NAME_MAX_LENGTH
        && candidate
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

/// Resumen de un tópico para el listado de la API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSummary {
    pub name: String,
    pub file_count: u64,
    pub total_size_bytes: u64,
    pub last_upload_at: Option<i64>,
}

/// Entrada del desglose por extensión dentro de la caché de estadísticas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionBreakdownEntry {
    pub extension: String,
    pub count: u64,
}

/// Documento de la caché de estadísticas por tópico.
///
/// Se invalida y recomputa ante subida, mutación de metadatos, rodado de
/// segmento y creación del tópico; nunca se confía entre procesos.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicStatsDocument {
    pub file_count: u64,
    pub total_size_bytes: u64,
    pub db_size_bytes: u64,
    pub dat_size_bytes: u64,
    pub unique_extension_count: u64,
    /// Activos con hash padre (versionados).
    pub versioned_count: u64,
    /// Activos sin padre (raíces del DAG).
    pub root_count: u64,
    /// Padres declarados que no existen en el tópico.
    pub orphan_count: u64,
    /// Activos con al menos una clave de metadatos computados.
    pub metadata_coverage_count: u64,
    pub average_metadata_keys_per_asset: f64,
    pub dat_file_count: u64,
    pub dat_files: Vec<String>,
    pub extension_breakdown: Vec<ExtensionBreakdownEntry>,
    pub last_hash: Option<String>,
    pub last_upload_at: Option<i64>,
    pub oldest_asset_at: Option<i64>,
    pub newest_asset_at: Option<i64>,
}

// FIN DEL ARCHIVO [libs/domain/models-rs/src/topic.rs]
