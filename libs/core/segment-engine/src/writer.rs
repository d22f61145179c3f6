// [libs/core/segment-engine/src/writer.rs]
/*!
 * =================================================================
 * APARATO: SEGMENT APPEND WRITER (V9.3 - ROLL ARITHMETIC)
 * CLASIFICACIÓN: CORE STORAGE (ESTRATO L1)
 * RESPONSABILIDAD: ANEXADO ATÓMICO DE TRAMAS Y RODADO DE SEGMENTOS
 *
 * # Physics:
 * 1. El cursor viaja con el llamador (ledger transaccional); el writer
 *    es puro respecto al estado: recibe cursor, devuelve cursor.
 * 2. Rodado: si la trama no cabe en el segmento activo, se abre el
 *    segmento de secuencia siguiente con cadena en génesis.
 * 3. La trama [header ∥ payload] se escribe con un único write_all
 *    bufferizado; la política de fsync queda delegada al filesystem.
 * =================================================================
 */

use crate::errors::SegmentError;
use crate::header::{RecordHeader, RECORD_HEADER_SIZE};
use crate::{chain_advance, segment_file_name, GENESIS_CHAIN};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Posición de escritura viva de un tópico dentro de su segmento activo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentCursor {
    /// Número de secuencia del segmento activo (1-based).
    pub sequence: u32,
    /// Bytes ya sellados en el segmento activo (headers + payloads).
    pub occupied_bytes: u64,
    /// Registros sellados en el segmento activo.
    pub record_count: u64,
    /// Cadena corrida tras el último registro del segmento activo.
    pub chain: [u8; 32],
}

impl SegmentCursor {
    /// Cursor inicial de un tópico recién forjado: `000001.dat` vacío.
    pub fn genesis() -> Self {
        Self { sequence: 1, occupied_bytes: 0, record_count: 0, chain: GENESIS_CHAIN }
    }

    /// Nombre del archivo de segmento activo.
    pub fn segment_name(&self) -> String {
        segment_file_name(self.sequence)
    }

    /// Cadena corrida en hex para su persistencia en el ledger.
    pub fn chain_hex(&self) -> String {
        hex::encode(self.chain)
    }
}

/// Recibo de un anexado consumado.
#[derive(Debug, Clone)]
pub struct AppendReceipt {
    /// Segmento donde quedó sellado el payload.
    pub dat_file: String,
    /// Offset absoluto del primer byte del payload dentro del segmento.
    pub payload_offset: u64,
    /// Verdadero si el anexado provocó el rodado a un segmento nuevo.
    pub rolled: bool,
    /// Cursor resultante para la actualización transaccional del ledger.
    pub cursor: SegmentCursor,
}

/// Motor de anexado sobre el directorio físico de un tópico.
pub struct SegmentWriter {
    topic_directory: PathBuf,
    maximum_segment_bytes: u64,
}

impl SegmentWriter {
    pub fn new(topic_directory: impl Into<PathBuf>, maximum_segment_bytes: u64) -> Self {
        Self { topic_directory: topic_directory.into(), maximum_segment_bytes }
    }

    /// Verdadero si la trama completa jamás cabría en un segmento vacío.
    /// El llamador debe rechazar el payload antes de intentar el anexado.
    pub fn frame_exceeds_segment_capacity(&self, payload_length: u64) -> bool {
        RECORD_HEADER_SIZE as u64 + payload_length > self.maximum_segment_bytes
    }

    /// Anexa un registro [header ∥ payload] al segmento activo del cursor,
    /// rodando a un segmento nuevo si la trama no cabe.
    pub fn append_record(
        &self,
        cursor: &SegmentCursor,
        payload: &[u8],
        payload_hash_hex: &str,
    ) -> Result<AppendReceipt, SegmentError> {
        let frame_total_bytes = RECORD_HEADER_SIZE as u64 + payload.len() as u64;

        if self.frame_exceeds_segment_capacity(payload.len() as u64) {
            return Err(SegmentError::RecordExceedsCapacity {
                frame_bytes: frame_total_bytes,
                maximum_segment_bytes: self.maximum_segment_bytes,
            });
        }

        // 1. ARITMÉTICA DE RODADO
        let mut active_cursor = cursor.clone();
        let mut rolled = false;
        if active_cursor.occupied_bytes + frame_total_bytes > self.maximum_segment_bytes {
            active_cursor = SegmentCursor {
                sequence: active_cursor.sequence + 1,
                occupied_bytes: 0,
                record_count: 0,
                chain: GENESIS_CHAIN,
            };
            rolled = true;
            debug!("📼 [SEGMENT_ROLL]: Rolling to {}", active_cursor.segment_name());
        }

        // 2. SELLADO DE TRAMA (un único write_all)
        let record_header = RecordHeader::forge(payload.len() as u64, payload_hash_hex)?;
        let segment_path = self.topic_directory.join(active_cursor.segment_name());

        let mut segment_file = OpenOptions::new().create(true).append(true).open(&segment_path)?;
        let mut frame_buffer = Vec::with_capacity(frame_total_bytes as usize);
        frame_buffer.extend_from_slice(&record_header.encode());
        frame_buffer.extend_from_slice(payload);
        segment_file.write_all(&frame_buffer)?;

        // 3. AVANCE DE CADENA Y CURSOR
        let payload_offset = active_cursor.occupied_bytes + RECORD_HEADER_SIZE as u64;
        let advanced_chain = chain_advance(&active_cursor.chain, payload_hash_hex)?;

        let next_cursor = SegmentCursor {
            sequence: active_cursor.sequence,
            occupied_bytes: active_cursor.occupied_bytes + frame_total_bytes,
            record_count: active_cursor.record_count + 1,
            chain: advanced_chain,
        };

        Ok(AppendReceipt {
            dat_file: active_cursor.segment_name(),
            payload_offset,
            rolled,
            cursor: next_cursor,
        })
    }
}

// FIN DEL ARCHIVO [libs/core/segment-engine/src/writer.rs]
