// [libs/domain/models-rs/src/metadata.rs]
/*!
 * =================================================================
 * APARATO: METADATA DOMAIN MODELS (V6.2 - FOLD CONTRACTS)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DEL LOG APPEND-ONLY Y SU VISTA COMPUTADA
 *
 * # Invariantes:
 * Ninguna fila del log se actualiza jamás; los deletes se registran,
 * nunca se omiten. La vista computada es el left-fold del log ordenado
 * por id: set asigna, delete remueve.
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/// Operación tipada sobre una clave de metadatos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataOp {
    Set,
    Delete,
}

impl MetadataOp {
    /// Token textual estable hacia SQLite.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataOp::Set => "set",
            MetadataOp::Delete => "delete",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "set" => Some(MetadataOp::Set),
            "delete" => Some(MetadataOp::Delete),
            _ => None,
        }
    }
}

/// Fila del log append-only `metadata_log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataEventRow {
    /// Id monotónico estricto por tópico.
    pub id: i64,
    pub asset_hash: String,
    pub op: MetadataOp,
    /// Clave no vacía, longitud acotada por configuración.
    pub key: String,
    /// Valor textual verbatim.
    pub value: String,
    /// Presente sii el valor parsea como número real finito.
    pub value_numeric: Option<f64>,
    /// Procesador emisor y su versión.
    pub processor: String,
    pub processor_version: String,
    pub created_at: i64,
}

/// Coerción numérica del valor textual: solo reales finitos.
/// Los booleanos "true"/"false" permanecen textuales (numeric NULL).
pub fn coerce_numeric_value(textual_value: &str) -> Option<f64> {
    match textual_value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Some(parsed),
        _ => None,
    }
}

/// Una operación dentro de un lote de metadatos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchMetadataOperation {
    pub asset_id: String,
    pub op: MetadataOp,
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Resultado individual de una operación de lote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOperationOutcome {
    pub asset_id: String,
    pub key: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Informe agregado de un lote: atomicidad por activo, no cruzada.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub success: bool,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BatchOperationOutcome>,
}

impl BatchReport {
    pub fn from_outcomes(results: Vec<BatchOperationOutcome>) -> Self {
        let total = results.len();
        let succeeded = results.iter().filter(|outcome| outcome.success).count();
        let failed = total - succeeded;
        Self { success: failed == 0, total, succeeded, failed, results }
    }
}

// FIN DEL ARCHIVO [libs/domain/models-rs/src/metadata.rs]
