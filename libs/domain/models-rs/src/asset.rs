// [libs/domain/models-rs/src/asset.rs]
/*!
 * =================================================================
 * APARATO: ASSET DOMAIN MODELS (V6.1 - CONTENT ADDRESSED)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE ACTIVOS INMUTABLES POR TÓPICO
 *
 * # Invariantes:
 * El hash identifica unívocamente el payload; (hash, tópico) es único;
 * la re-subida de un payload idéntico es un no-op con skipped=true;
 * los registros jamás se mutan salvo por la remoción del tópico entero.
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/// Fila de activo tal como vive en la tabla `assets` de un catálogo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    /// SHA-256 hex minúscula del payload (64 chars).
    pub hash: String,
    /// Tamaño del payload en bytes.
    pub size: u64,
    /// Token de extensión en minúsculas; puede ser vacío.
    pub extension: String,
    /// Nombre de origen sin extensión.
    pub origin_name: String,
    /// Hash padre opcional dentro del mismo tópico (DAG de versiones).
    pub parent_hash: Option<String>,
    /// Timestamp unix de creación (segundos).
    pub created_at: i64,
    /// Segmento empaquetado donde reside el payload.
    pub dat_file: String,
}

impl AssetRecord {
    /// Nombre de archivo reconstruido: `origin.ext` u `origin` si no hay extensión.
    pub fn display_filename(&self) -> String {
        if self.extension.is_empty() {
            self.origin_name.clone()
        } else {
            format!("{}.{}", self.origin_name, self.extension)
        }
    }
}

/// Ubicación física de un payload resuelta por el índice del orquestador.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetLocation {
    pub hash: String,
    pub topic: String,
    pub dat_file: String,
    /// Offset absoluto del primer byte del payload dentro del segmento.
    pub offset: u64,
    pub size: u64,
}

/// Recibo de ingesta devuelto por PutAsset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub hash: String,
    pub topic: String,
    pub size: u64,
    /// Verdadero cuando el payload ya residía en el tópico (dedup no-op).
    pub skipped: bool,
    pub dat_file: String,
}

/// Vista enriquecida de un activo: fila + metadatos computados + ubicaciones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDetail {
    #[serde(flatten)]
    pub record: AssetRecord,
    pub topic: String,
    /// Documento JSON last-write-wins derivado del log de metadatos.
    pub computed_metadata: serde_json::Value,
}

/// Valida un hash de contenido: 64 hex en minúsculas.
pub fn is_valid_content_hash(candidate: &str) -> bool {
    candidate.len() == 64
        && candidate
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

// FIN DEL ARCHIVO [libs/domain/models-rs/src/asset.rs]
