// [libs/domain/models-rs/src/tests_serialization.rs]
/**
 * =================================================================
 * APARATO: DOMAIN SERIALIZATION TEST (V6.0 - INTEGRATION LEVEL)
 * CLASIFICACIÓN: TRINITY EVIDENCE (ESTRATO L2-MODELS)
 * RESPONSABILIDAD: CERTIFICACIÓN DE PARIDAD JSON DE LOS CONTRATOS VAULT
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. WIRE PARITY: Valida que los tokens textuales de los enums cerrados
 *    (acciones de auditoría, operaciones de metadatos, formatos de
 *    nombre) viajen estables hacia SQLite y el envelope JSON.
 * 2. MANIFEST INTEGRITY: Certifica el roundtrip del manifest.json que
 *    sella cada ZIP de descarga masiva.
 * =================================================================
 */
