// INICIO DEL ARCHIVO [apps/orchestrator/src/services/preset_engine.rs]
/*!
 * =================================================================
 * APARATO: QUERY PRESET ENGINE (V10.4 - FANOUT UNION)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: REGISTRO YAML, BINDING DE PARÁMETROS Y FAN-OUT
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SEEDED DEFAULTS: El directorio queries/{stats,presets} se siembra
 *    desde los defaults embebidos en la primera configuración; los
 *    archivos del operador sobreviven y extienden.
 * 2. SKIP, NEVER ABORT: Un YAML inválido se salta con advertencia;
 *    jamás aborta el arranque.
 * 3. STABLE UNION: El fan-out recorre los tópicos en orden
 *    lexicográfico; la unión de columnas preserva el orden first-seen
 *    bajo ese recorrido, haciendo el resultado determinista.
 * =================================================================
 */

use crate::errors::{ApiError, INVALID_REQUEST, MISSING_PARAM, PRESET_NOT_FOUND};
use crate::services::topic_store::TopicStore;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use stratavault_domain_models::{PresetDefinition, PresetExecutionReport};
use stratavault_infra_db::values::json_to_sql;
use tracing::{info, instrument, warn};

/// Defaults embebidos: (subdirectorio, nombre, YAML).
const EMBEDDED_DEFAULTS: &[(&str, &str, &str)] = &[
    (
        "presets",
        "recent_assets",
        r#"description: Most recently ingested assets
sql: |
  SELECT hash AS asset_id, origin_name, extension, size, created_at
  FROM assets
  ORDER BY created_at DESC
  LIMIT :limit
parameters:
  - name: limit
    required: false
    default: 100
"#,
    ),
    (
        "presets",
        "assets_by_extension",
        r#"description: Assets filtered by extension token
sql: |
  SELECT hash AS asset_id, origin_name, size, created_at
  FROM assets
  WHERE extension = :extension
  ORDER BY created_at DESC
parameters:
  - name: extension
    required: true
"#,
    ),
    (
        "presets",
        "assets_without_metadata",
        r#"description: Assets whose computed metadata document is empty
sql: |
  SELECT a.hash AS asset_id, a.origin_name, a.created_at
  FROM assets a
  LEFT JOIN metadata_computed mc ON mc.asset_hash = a.hash
  WHERE mc.document IS NULL OR mc.document = '{}'
  ORDER BY a.created_at DESC
parameters: []
"#,
    ),
    (
        "presets",
        "metadata_key_value",
        r#"description: Assets whose latest value for a key equals the given value
sql: |
  SELECT ml.asset_hash AS asset_id, ml.value
  FROM metadata_log ml
  WHERE ml.key = :key
    AND ml.id = (
      SELECT MAX(ml2.id) FROM metadata_log ml2
      WHERE ml2.asset_hash = ml.asset_hash AND ml2.key = :key
    )
    AND ml.op = 'set'
    AND ml.value = :value
parameters:
  - name: key
    required: true
  - name: value
    required: true
"#,
    ),
    (
        "stats",
        "extension_breakdown",
        r#"description: Asset count per extension token
sql: |
  SELECT extension, COUNT(*) AS count
  FROM assets
  GROUP BY extension
  ORDER BY count DESC
parameters: []
"#,
    ),
    (
        "stats",
        "size_overview",
        r#"description: Scalar size overview of a topic
sql: |
  SELECT COUNT(*) AS file_count,
         COALESCE(SUM(size), 0) AS total_bytes,
         COALESCE(MAX(created_at), 0) AS newest_upload
  FROM assets
parameters: []
"#,
    ),
];

pub struct PresetRegistry {
    presets: BTreeMap<String, PresetDefinition>,
}

impl PresetRegistry {
    /**
     * Siembra los defaults ausentes y carga todos los YAML del
     * directorio de queries. Archivos inválidos se saltan con
     * advertencia.
     */
    #[instrument(skip(queries_root))]
    pub fn load(queries_root: &Path) -> anyhow::Result<Self> {
        Self::seed_defaults(queries_root)?;

        let mut presets = BTreeMap::new();
        // stats primero; presets del operador ganan en colisión de nombre.
        for subdirectory in ["stats", "presets"] {
            let directory = queries_root.join(subdirectory);
            let Ok(entries) = std::fs::read_dir(&directory) else { continue };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some("yaml") {
                    continue;
                }
                let Some(preset_name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                    continue;
                };

                match std::fs::read_to_string(&path)
                    .map_err(anyhow::Error::from)
                    .and_then(|raw| serde_yaml::from_str::<PresetDefinition>(&raw).map_err(Into::into))
                {
                    Ok(definition) => {
                        presets.insert(preset_name.to_string(), definition);
                    }
                    Err(load_fault) => {
                        warn!("⚠️ [PRESET_REGISTRY]: Skipping invalid preset '{}': {}",
                            path.display(), load_fault);
                    }
                }
            }
        }

        info!("📚 [PRESET_REGISTRY]: {} presets online.", presets.len());
        Ok(Self { presets })
    }

    fn seed_defaults(queries_root: &Path) -> std::io::Result<()> {
        for (subdirectory, preset_name, yaml_body) in EMBEDDED_DEFAULTS {
            let directory = queries_root.join(subdirectory);
            std::fs::create_dir_all(&directory)?;
            let file_path = directory.join(format!("{}.yaml", preset_name));
            if !file_path.exists() {
                std::fs::write(&file_path, yaml_body)?;
            }
        }
        Ok(())
    }

    pub fn resolve(&self, preset_name: &str) -> Option<&PresetDefinition> {
        self.presets.get(preset_name)
    }

    pub fn list(&self) -> Vec<(String, PresetDefinition)> {
        self.presets.iter().map(|(name, def)| (name.clone(), def.clone())).collect()
    }

    pub fn count(&self) -> usize {
        self.presets.len()
    }
}

/**
 * Liga los parámetros declarados contra el body de la petición.
 * Requerido ausente -> MISSING_PARAM; parámetros extra se ignoran.
 */
pub fn bind_parameters(
    preset: &PresetDefinition,
    request_params: &serde_json::Value,
) -> Result<BTreeMap<String, serde_json::Value>, ApiError> {
    let mut bound = BTreeMap::new();
    for declared in &preset.parameters {
        let provided = request_params.get(&declared.name);
        match (provided, &declared.default, declared.required) {
            (Some(value), _, _) => {
                bound.insert(declared.name.clone(), value.clone());
            }
            (None, Some(default_value), _) => {
                bound.insert(declared.name.clone(), default_value.clone());
            }
            (None, None, true) => {
                return Err(ApiError::bad_request(
                    MISSING_PARAM,
                    format!("required parameter '{}' is missing", declared.name),
                ));
            }
            (None, None, false) => {
                bound.insert(declared.name.clone(), serde_json::Value::Null);
            }
        }
    }
    Ok(bound)
}

/**
 * Compila los placeholders `:name` a posicionales `?N` generando el
 * vector de valores en orden de aparición. Un placeholder sin binding
 * es un fallo del preset.
 */
pub fn compile_statement(
    sql: &str,
    bound: &BTreeMap<String, serde_json::Value>,
) -> Result<(String, Vec<libsql::Value>), ApiError> {
    let mut compiled_sql = String::with_capacity(sql.len());
    let mut parameter_values = Vec::new();
    let source: Vec<char> = sql.chars().collect();

    let mut index = 0;
    let mut inside_string_literal = false;
    while index < source.len() {
        let current = source[index];

        if current == '\'' {
            inside_string_literal = !inside_string_literal;
            compiled_sql.push(current);
            index += 1;
            continue;
        }

        // Placeholder :name fuera de literales (se excluye '::' de SQL cast).
        if !inside_string_literal
            && current == ':'
            && index + 1 < source.len()
            && (source[index + 1].is_ascii_alphabetic() || source[index + 1] == '_')
        {
            let mut cursor = index + 1;
            while cursor < source.len()
                && (source[cursor].is_ascii_alphanumeric() || source[cursor] == '_')
            {
                cursor += 1;
            }
            let placeholder_name: String = source[index + 1..cursor].iter().collect();

            let value = bound.get(&placeholder_name).ok_or_else(|| {
                ApiError::bad_request(
                    INVALID_REQUEST,
                    format!("preset references undeclared parameter '{}'", placeholder_name),
                )
            })?;
            parameter_values.push(json_to_sql(value));
            compiled_sql.push_str(&format!("?{}", parameter_values.len()));
            index = cursor;
            continue;
        }

        compiled_sql.push(current);
        index += 1;
    }

    Ok((compiled_sql, parameter_values))
}

/**
 * Fan-out multi-tópico: ejecuta el preset en cada almacén seleccionado
 * (orden lexicográfico ya garantizado por el registro) y concatena las
 * filas bajo la unión first-seen de columnas.
 *
 * # Physics:
 * Dos fases. La fase 1 recolecta (columnas, filas) por tópico y sella
 * la unión completa; la fase 2 proyecta cada fila sobre esa unión
 * final. Toda fila del resultado porta el ancho completo: una columna
 * que un tópico no conoce viaja como null, sin importar el orden en
 * que los tópicos la introdujeron.
 */
#[instrument(skip(stores, preset, request_params))]
pub async fn execute_fanout(
    stores: Vec<Arc<TopicStore>>,
    preset_name: &str,
    preset: &PresetDefinition,
    request_params: &serde_json::Value,
) -> Result<PresetExecutionReport, ApiError> {
    let bound = bind_parameters(preset, request_params)?;

    // --- FASE 1: RECOLECCIÓN Y UNIÓN FIRST-SEEN ---
    let mut union_columns: Vec<String> = Vec::new();
    let mut per_topic_results: Vec<(Vec<String>, Vec<Vec<serde_json::Value>>)> = Vec::new();

    for store in stores {
        let (compiled_sql, parameter_values) = compile_statement(&preset.sql, &bound)?;
        let (topic_columns, topic_rows) = store
            .execute_preset_statement(&compiled_sql, parameter_values)
            .await
            .map_err(|fault| ApiError::internal(format!("preset '{}' on '{}': {}", preset_name, store.name, fault)))?;

        for column in &topic_columns {
            if !union_columns.iter().any(|existing| existing == column) {
                union_columns.push(column.clone());
            }
        }
        per_topic_results.push((topic_columns, topic_rows));
    }

    // --- FASE 2: PROYECCIÓN SOBRE LA UNIÓN FINAL ---
    let mut merged_rows: Vec<Vec<serde_json::Value>> = Vec::new();
    for (topic_columns, topic_rows) in per_topic_results {
        let projection_map: Vec<usize> = topic_columns
            .iter()
            .map(|column| {
                union_columns
                    .iter()
                    .position(|existing| existing == column)
                    .unwrap_or(0)
            })
            .collect();

        for row in topic_rows {
            let mut projected = vec![serde_json::Value::Null; union_columns.len()];
            for (column_index, cell) in row.into_iter().enumerate() {
                if let Some(union_index) = projection_map.get(column_index) {
                    projected[*union_index] = cell;
                }
            }
            merged_rows.push(projected);
        }
    }

    Ok(PresetExecutionReport {
        preset: preset_name.to_string(),
        row_count: merged_rows.len(),
        columns: union_columns,
        rows: merged_rows,
    })
}

/// Resolución nominal: preset ausente -> PRESET_NOT_FOUND.
pub fn resolve_or_fault<'a>(
    registry: &'a PresetRegistry,
    preset_name: &str,
) -> Result<&'a PresetDefinition, ApiError> {
    registry.resolve(preset_name).ok_or_else(|| {
        ApiError::not_found(PRESET_NOT_FOUND, format!("preset '{}' is not registered", preset_name))
    })
}
// FIN DEL ARCHIVO [apps/orchestrator/src/services/preset_engine.rs]
