// [libs/domain/authz/src/evaluator.rs]
/*!
 * =================================================================
 * APARATO: CONSTRAINT EVALUATOR (V8.2 - REQUEST PHYSICS)
 * CLASIFICACIÓN: DOMAIN SECURITY (ESTRATO L2)
 * RESPONSABILIDAD: EVALUACIÓN DE GRANTS CONTRA PARÁMETROS DE PETICIÓN
 *
 * # Physics:
 * El evaluador es puro: recibe las constraints del grant y el contexto
 * de la operación, y dictamina. Los efectos de cuota (consulta y
 * consumo del ledger) quedan en el estrato de aplicación; aquí solo
 * vive la aritmética de frontera.
 * =================================================================
 */

use crate::actions::ActionToken;
use crate::constraints::{QueryConstraints, UploadConstraints};
use crate::errors::AuthzError;
use serde_json::Value;

/// Parámetros de la operación bajo evaluación.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationContext<'a> {
    pub topic: Option<&'a str>,
    /// Extensión en minúsculas del archivo subido.
    pub extension: Option<&'a str>,
    pub payload_size: Option<u64>,
    pub preset: Option<&'a str>,
}

/// Demanda de cuota de una operación: un op y su volumen en bytes.
#[derive(Debug, Clone, Copy)]
pub struct QuotaDemand {
    pub operations: i64,
    pub volume_bytes: i64,
}

impl QuotaDemand {
    pub fn single_operation(volume_bytes: i64) -> Self {
        Self { operations: 1, volume_bytes }
    }
}

/// Evalúa las constraints de un grant contra la operación.
///
/// Las fronteras de cuota no se evalúan aquí (requieren el ledger);
/// ver [`quota_would_exceed`].
pub fn evaluate_constraints(
    action: ActionToken,
    constraints: &Value,
    context: &OperationContext<'_>,
) -> Result<(), AuthzError> {
    match action {
        ActionToken::Upload => evaluate_upload(&UploadConstraints::from_json(constraints), context),
        ActionToken::Query => evaluate_query(&QueryConstraints::from_json(constraints), context),
        // download/view_audit/manage_*: sus constraints se aplican en el
        // estrato de aplicación (cuotas, reescritura de filtros, política
        // de concesión); no hay parámetros de petición que evaluar aquí.
        _ => Ok(()),
    }
}

fn evaluate_upload(
    constraints: &UploadConstraints,
    context: &OperationContext<'_>,
) -> Result<(), AuthzError> {
    if let Some(allowed_extensions) = &constraints.allowed_extensions {
        let extension = context.extension.unwrap_or("");
        if !allowed_extensions.iter().any(|candidate| candidate == extension) {
            return Err(AuthzError::ConstraintViolation(format!(
                "extension '{}' is not allowed",
                extension
            )));
        }
    }

    if let Some(allowed_topics) = &constraints.allowed_topics {
        let topic = context.topic.unwrap_or("");
        if !allowed_topics.iter().any(|candidate| candidate == topic) {
            return Err(AuthzError::ConstraintViolation(format!(
                "topic '{}' is not allowed",
                topic
            )));
        }
    }

    if let (Some(limit), Some(payload_size)) = (constraints.max_file_size_bytes, context.payload_size) {
        if payload_size > limit.max(0) as u64 {
            return Err(AuthzError::ConstraintViolation(format!(
                "payload of {} bytes exceeds grant limit {}",
                payload_size, limit
            )));
        }
    }

    Ok(())
}

fn evaluate_query(
    constraints: &QueryConstraints,
    context: &OperationContext<'_>,
) -> Result<(), AuthzError> {
    if let Some(allowed_presets) = &constraints.allowed_presets {
        let preset = context.preset.unwrap_or("");
        if !allowed_presets.iter().any(|candidate| candidate == preset) {
            return Err(AuthzError::ConstraintViolation(format!(
                "preset '{}' is not allowed",
                preset
            )));
        }
    }
    Ok(())
}

/// Aritmética de frontera de cuota: verdadero si consumar la demanda
/// rebasaría alguno de los límites declarados.
///
/// El ledger se actualiza solo en éxito, por lo que la operación (k+1)
/// sobre un límite k debe dictaminarse aquí *antes* de ejecutar.
pub fn quota_would_exceed(
    daily_count_limit: Option<i64>,
    daily_volume_limit: Option<i64>,
    consumed_operations: i64,
    consumed_volume_bytes: i64,
    demand: QuotaDemand,
) -> bool {
    if let Some(count_limit) = daily_count_limit {
        if consumed_operations + demand.operations > count_limit {
            return true;
        }
    }
    if let Some(volume_limit) = daily_volume_limit {
        if consumed_volume_bytes + demand.volume_bytes > volume_limit {
            return true;
        }
    }
    false
}

// FIN DEL ARCHIVO [libs/domain/authz/src/evaluator.rs]
