// INICIO DEL ARCHIVO [apps/orchestrator/src/services/metadata_pipeline.rs]
/*!
 * =================================================================
 * APARATO: METADATA PIPELINE (V10.3 - PER-ASSET ATOMICITY)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: MUTACIONES SINGLE, BATCH Y QUERY-DRIVEN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ASSET-SCOPED TRANSACTIONS: El lote se agrupa por activo; cada
 *    grupo corre en una transacción propia. Un fallo parcial reporta
 *    success:false pero las operaciones consumadas persisten.
 * 2. LENGTH FENCES: Clave no vacía y acotada; valor acotado en bytes.
 * 3. QUERY-DRIVEN APPLY: Un preset cuyo resultado porta la columna
 *    asset_id se transforma fila a fila en operaciones de lote.
 * =================================================================
 */

use crate::errors::{
    ApiError, ASSET_NOT_FOUND, BATCH_TOO_MANY_OPERATIONS, INVALID_REQUEST, METADATA_ERROR,
    METADATA_KEY_TOO_LONG, METADATA_VALUE_TOO_LONG,
};
use crate::services::preset_engine;
use crate::services::topic_registry::TopicRegistry;
use crate::state::RuntimeLimits;
use std::collections::BTreeMap;
use std::sync::Arc;
use stratavault_domain_models::{
    BatchMetadataOperation, BatchOperationOutcome, BatchReport, MetadataOp, PresetDefinition,
};
use stratavault_infra_db::repositories::catalogue::MetadataMutation;
use tracing::{info, instrument, warn};

/// Valla de validación de clave y valor contra los límites vigentes.
pub fn validate_key_value(
    limits: &RuntimeLimits,
    key: &str,
    value: &str,
) -> Result<(), ApiError> {
    if key.is_empty() {
        return Err(ApiError::bad_request(INVALID_REQUEST, "metadata key must not be empty"));
    }
    if key.len() > limits.max_metadata_key_length {
        return Err(ApiError::bad_request(
            METADATA_KEY_TOO_LONG,
            format!("metadata key exceeds {} characters", limits.max_metadata_key_length),
        ));
    }
    if value.len() > limits.max_metadata_value_bytes {
        return Err(ApiError::bad_request(
            METADATA_VALUE_TOO_LONG,
            format!("metadata value exceeds {} bytes", limits.max_metadata_value_bytes),
        ));
    }
    Ok(())
}

/**
 * Mutación individual: localiza el activo a través de los tópicos y
 * delega en el catálogo bajo el cerrojo del tópico.
 * Devuelve (tópico, id de log).
 */
#[instrument(skip(registry, limits, value, processor, processor_version))]
pub async fn apply_single(
    registry: &TopicRegistry,
    limits: &RuntimeLimits,
    asset_hash: &str,
    op: MetadataOp,
    key: &str,
    value: &str,
    processor: &str,
    processor_version: &str,
) -> Result<(String, i64), ApiError> {
    validate_key_value(limits, key, value)?;

    let (store, _record) = registry
        .locate_asset(asset_hash)
        .await
        .map_err(|fault| ApiError::internal(fault))?
        .ok_or_else(|| ApiError::not_found(ASSET_NOT_FOUND, "asset not found in any topic"))?;

    let mutation = MetadataMutation {
        op,
        key: key.to_string(),
        value: value.to_string(),
        processor: processor.to_string(),
        processor_version: processor_version.to_string(),
    };

    let log_id = store
        .apply_metadata(asset_hash, &mutation)
        .await
        .map_err(|fault| ApiError::new(
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            METADATA_ERROR,
            fault.to_string(),
        ))?;

    Ok((store.name.clone(), log_id))
}

/**
 * Lote multi-activo con aislamiento por activo.
 */
#[instrument(skip(registry, limits, operations, processor, processor_version))]
pub async fn apply_batch(
    registry: &TopicRegistry,
    limits: &RuntimeLimits,
    operations: &[BatchMetadataOperation],
    processor: &str,
    processor_version: &str,
) -> Result<BatchReport, ApiError> {
    if operations.len() > limits.max_batch_operations {
        return Err(ApiError::bad_request(
            BATCH_TOO_MANY_OPERATIONS,
            format!("batch exceeds the maximum of {} operations", limits.max_batch_operations),
        ));
    }

    // Resultado por índice de entrada, rellenado grupo a grupo.
    let mut outcomes: Vec<Option<BatchOperationOutcome>> = vec![None; operations.len()];

    // Agrupación por activo preservando índices de entrada.
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (input_index, operation) in operations.iter().enumerate() {
        groups.entry(operation.asset_id.clone()).or_default().push(input_index);
    }

    for (asset_hash, member_indexes) in groups {
        // 1. RESOLUCIÓN DEL TÓPICO
        let located = registry
            .locate_asset(&asset_hash)
            .await
            .map_err(|fault| ApiError::internal(fault))?;
        let Some((store, _record)) = located else {
            for input_index in &member_indexes {
                outcomes[*input_index] = Some(BatchOperationOutcome {
                    asset_id: asset_hash.clone(),
                    key: operations[*input_index].key.clone(),
                    success: false,
                    error: Some(ASSET_NOT_FOUND.to_string()),
                });
            }
            continue;
        };

        // 2. VALIDACIÓN: un miembro inválido aborta el grupo completo.
        let mut validation_fault: Option<(usize, String)> = None;
        for input_index in &member_indexes {
            let operation = &operations[*input_index];
            if let Err(fault) = validate_key_value(limits, &operation.key, &operation.value) {
                validation_fault = Some((*input_index, fault.message));
                break;
            }
        }
        if let Some((faulty_index, fault_message)) = validation_fault {
            for input_index in &member_indexes {
                let operation = &operations[*input_index];
                outcomes[*input_index] = Some(BatchOperationOutcome {
                    asset_id: asset_hash.clone(),
                    key: operation.key.clone(),
                    success: false,
                    error: Some(if *input_index == faulty_index {
                        fault_message.clone()
                    } else {
                        "sibling operation failed validation".to_string()
                    }),
                });
            }
            continue;
        }

        // 3. TRANSACCIÓN ÚNICA POR ACTIVO
        let mutations: Vec<MetadataMutation> = member_indexes
            .iter()
            .map(|input_index| {
                let operation = &operations[*input_index];
                MetadataMutation {
                    op: operation.op,
                    key: operation.key.clone(),
                    value: operation.value.clone(),
                    processor: processor.to_string(),
                    processor_version: processor_version.to_string(),
                }
            })
            .collect();

        match store.apply_metadata_batch_for_asset(&asset_hash, &mutations).await {
            Ok(_log_ids) => {
                for input_index in &member_indexes {
                    outcomes[*input_index] = Some(BatchOperationOutcome {
                        asset_id: asset_hash.clone(),
                        key: operations[*input_index].key.clone(),
                        success: true,
                        error: None,
                    });
                }
            }
            Err(transaction_fault) => {
                warn!("⚠️ [METADATA_BATCH]: Asset {} group collapsed: {}",
                    &asset_hash[..8.min(asset_hash.len())], transaction_fault);
                for input_index in &member_indexes {
                    outcomes[*input_index] = Some(BatchOperationOutcome {
                        asset_id: asset_hash.clone(),
                        key: operations[*input_index].key.clone(),
                        success: false,
                        error: Some(transaction_fault.to_string()),
                    });
                }
            }
        }
    }

    let resolved: Vec<BatchOperationOutcome> = outcomes
        .into_iter()
        .map(|outcome| outcome.expect("every batch member receives an outcome"))
        .collect();

    let report = BatchReport::from_outcomes(resolved);
    info!("🧾 [METADATA_BATCH]: {} ops -> {} ok / {} failed.",
        report.total, report.succeeded, report.failed);
    Ok(report)
}

/**
 * Apply-from-query: corre el preset y convierte cada fila (columna
 * asset_id) en una operación de lote.
 */
#[instrument(skip(registry, limits, stores, preset, query_params, value, processor, processor_version))]
#[allow(clippy::too_many_arguments)]
pub async fn apply_from_query(
    registry: &TopicRegistry,
    limits: &RuntimeLimits,
    stores: Vec<Arc<crate::services::topic_store::TopicStore>>,
    preset_name: &str,
    preset: &PresetDefinition,
    query_params: &serde_json::Value,
    op: MetadataOp,
    key: &str,
    value: &str,
    processor: &str,
    processor_version: &str,
) -> Result<(BatchReport, usize), ApiError> {
    validate_key_value(limits, key, value)?;

    let execution = preset_engine::execute_fanout(stores, preset_name, preset, query_params).await?;

    let asset_id_column = execution
        .columns
        .iter()
        .position(|column| column == "asset_id")
        .ok_or_else(|| {
            ApiError::bad_request(INVALID_REQUEST, "query result does not expose an asset_id column")
        })?;

    let operations: Vec<BatchMetadataOperation> = execution
        .rows
        .iter()
        .filter_map(|row| row.get(asset_id_column))
        .filter_map(|cell| cell.as_str().map(str::to_string))
        .map(|asset_id| BatchMetadataOperation {
            asset_id,
            op,
            key: key.to_string(),
            value: value.to_string(),
        })
        .collect();

    let report = apply_batch(registry, limits, &operations, processor, processor_version).await?;
    Ok((report, execution.row_count))
}
// FIN DEL ARCHIVO [apps/orchestrator/src/services/metadata_pipeline.rs]
