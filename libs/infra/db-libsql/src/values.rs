// [libs/infra/db-libsql/src/values.rs]
/*!
 * =================================================================
 * APARATO: VALUE MAPPING LAYER (V7.0 - TYPE BRIDGE)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PUENTE BIT-PERFECTO ENTRE SQLITE, JSON Y EL DOMINIO
 * =================================================================
 */

use crate::errors::DbError;
use libsql::{Row, Value};

/// Convierte un valor JSON a su representación SQLite para el binding
/// de parámetros de presets. Booleanos viajan como enteros 0/1;
/// estructuras compuestas se degradan a su texto JSON.
pub fn json_to_sql(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(flag) => Value::Integer(i64::from(*flag)),
        serde_json::Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Value::Integer(integer)
            } else {
                Value::Real(number.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(text) => Value::Text(text.clone()),
        composite => Value::Text(composite.to_string()),
    }
}

/// Convierte un valor SQLite a JSON para las filas de resultado.
/// Blobs viajan como hex minúscula.
pub fn sql_to_json(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(integer) => serde_json::Value::from(integer),
        Value::Real(real) => serde_json::Value::from(real),
        Value::Text(text) => serde_json::Value::String(text),
        Value::Blob(bytes) => serde_json::Value::String(hex::encode(bytes)),
    }
}

// --- EXTRACTORES NOMINALES DE FILA ---

pub fn get_string(row: &Row, index: i32) -> Result<String, DbError> {
    match row.get_value(index)? {
        Value::Text(text) => Ok(text),
        other => Err(DbError::MappingError(format!("column {} is not text: {:?}", index, other))),
    }
}

pub fn get_i64(row: &Row, index: i32) -> Result<i64, DbError> {
    match row.get_value(index)? {
        Value::Integer(integer) => Ok(integer),
        other => Err(DbError::MappingError(format!("column {} is not integer: {:?}", index, other))),
    }
}

pub fn get_bool(row: &Row, index: i32) -> Result<bool, DbError> {
    Ok(get_i64(row, index)? != 0)
}

pub fn get_opt_string(row: &Row, index: i32) -> Result<Option<String>, DbError> {
    match row.get_value(index)? {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text)),
        other => Err(DbError::MappingError(format!("column {} is not text/null: {:?}", index, other))),
    }
}

pub fn get_opt_i64(row: &Row, index: i32) -> Result<Option<i64>, DbError> {
    match row.get_value(index)? {
        Value::Null => Ok(None),
        Value::Integer(integer) => Ok(Some(integer)),
        other => Err(DbError::MappingError(format!("column {} is not int/null: {:?}", index, other))),
    }
}

pub fn get_opt_f64(row: &Row, index: i32) -> Result<Option<f64>, DbError> {
    match row.get_value(index)? {
        Value::Null => Ok(None),
        Value::Real(real) => Ok(Some(real)),
        Value::Integer(integer) => Ok(Some(integer as f64)),
        other => Err(DbError::MappingError(format!("column {} is not real/null: {:?}", index, other))),
    }
}

// FIN DEL ARCHIVO [libs/infra/db-libsql/src/values.rs]
