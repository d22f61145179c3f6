// [libs/core/segment-engine/src/errors.rs]
/*!
 * =================================================================
 * APARATO: SEGMENT ERROR CATALOG (V9.0)
 * CLASIFICACIÓN: CORE STORAGE (ESTRATO L1)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE SEGMENTO
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegmentError {
    /// Fallo físico de E/S sobre el archivo de segmento.
    #[error("[L1_SEGMENT_IO_FAULT]: {0}")]
    Io(#[from] std::io::Error),

    /// El hash de contenido no es hex minúscula de 64 caracteres.
    #[error("[L1_SEGMENT_FAULT]: MALFORMED_CONTENT_HASH -> {0}")]
    MalformedContentHash(String),

    /// El encabezado no abre con la firma mágica `MSHB`.
    #[error("[L1_SEGMENT_FAULT]: MAGIC_MISMATCH at offset {0}")]
    MagicMismatch(u64),

    /// Versión de formato desconocida para este motor.
    #[error("[L1_SEGMENT_FAULT]: UNSUPPORTED_VERSION {version} at offset {offset}")]
    UnsupportedVersion { version: u16, offset: u64 },

    /// El archivo termina dentro de un encabezado.
    #[error("[L1_SEGMENT_FAULT]: TRUNCATED_HEADER at offset {0}")]
    TruncatedHeader(u64),

    /// El archivo termina dentro de un payload declarado.
    #[error("[L1_SEGMENT_FAULT]: TRUNCATED_PAYLOAD at offset {0}")]
    TruncatedPayload(u64),

    /// El payload releído no reproduce el hash del encabezado.
    #[error("[L1_SEGMENT_FAULT]: PAYLOAD_HASH_MISMATCH for record {record_index}")]
    PayloadHashMismatch { record_index: u64 },

    /// La cadena corrida final no coincide con el valor del ledger.
    #[error("[L1_SEGMENT_FAULT]: CHAIN_MISMATCH expected {expected} computed {computed}")]
    ChainMismatch { expected: String, computed: String },

    /// Una lectura posicionada pidió bytes más allá del final físico.
    #[error("[L1_SEGMENT_FAULT]: RANGE_OUT_OF_BOUNDS offset {offset} length {length}")]
    RangeOutOfBounds { offset: u64, length: u64 },

    /// La trama jamás cabría en un segmento vacío del tamaño configurado.
    #[error("[L1_SEGMENT_FAULT]: RECORD_EXCEEDS_CAPACITY frame {frame_bytes} max {maximum_segment_bytes}")]
    RecordExceedsCapacity { frame_bytes: u64, maximum_segment_bytes: u64 },
}
// FIN DEL ARCHIVO [libs/core/segment-engine/src/errors.rs]
