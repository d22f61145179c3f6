// [libs/domain/models-rs/src/download.rs]
/*!
 * =================================================================
 * APARATO: BULK DOWNLOAD MODELS (V6.2 - MANIFEST CONTRACTS)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DEL MOTOR DE DESCARGA MASIVA (ZIP + SSE)
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/// Modo de selección de activos para una descarga masiva.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    Ids,
    Query,
}

impl DownloadMode {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "ids" => Some(DownloadMode::Ids),
            "query" => Some(DownloadMode::Query),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadMode::Ids => "ids",
            DownloadMode::Query => "query",
        }
    }
}

/// Política de nombrado de entradas dentro del ZIP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilenameFormat {
    Hash,
    #[default]
    Original,
    HashOriginal,
}

impl FilenameFormat {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "hash" => Some(FilenameFormat::Hash),
            "original" => Some(FilenameFormat::Original),
            "hash_original" => Some(FilenameFormat::HashOriginal),
            _ => None,
        }
    }
}

/// Petición del endpoint síncrono `POST /api/download/bulk`.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkDownloadRequest {
    pub mode: String,
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub asset_ids: Vec<String>,
    #[serde(default)]
    pub include_metadata: bool,
    #[serde(default)]
    pub filename_format: Option<String>,
}

/// Entrada de activo dentro de `manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestAsset {
    pub hash: String,
    pub filename: String,
    pub size: u64,
    pub extension: String,
    pub origin_name: String,
    pub topic: String,
}

/// Entrada de activo fallido dentro de `manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedManifestAsset {
    pub hash: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

/// Documento `manifest.json` sellado dentro de cada ZIP masivo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadManifest {
    pub created_at: i64,
    pub asset_count: usize,
    pub total_size: u64,
    pub include_metadata: bool,
    pub assets: Vec<ManifestAsset>,
    pub failed_assets: Vec<FailedManifestAsset>,
}

// FIN DEL ARCHIVO [libs/domain/models-rs/src/download.rs]
