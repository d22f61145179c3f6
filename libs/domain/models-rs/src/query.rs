// [libs/domain/models-rs/src/query.rs]
/*!
 * =================================================================
 * APARATO: QUERY PRESET MODELS (V6.1 - SQL TEMPLATES)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE PRESETS SQL PARAMETRIZADOS
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/// Declaración de un parámetro de preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetParameter {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    /// Valor por defecto inyectado cuando el parámetro no viaja en el body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

/// Plantilla SQL parametrizada resoluble por nombre.
///
/// Los archivos YAML viven bajo `.internal/queries/{stats,presets}/` y se
/// siembran desde los defaults embebidos en la primera configuración.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetDefinition {
    #[serde(default)]
    pub description: String,
    /// SQL con placeholders `:name`.
    pub sql: String,
    #[serde(default)]
    pub parameters: Vec<PresetParameter>,
}

/// Respuesta de la ejecución multi-tópico de un preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetExecutionReport {
    pub preset: String,
    pub row_count: usize,
    /// Unión de columnas preservando el orden first-seen bajo el
    /// recorrido lexicográfico de tópicos.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}
// FIN DEL ARCHIVO [libs/domain/models-rs/src/query.rs]
