// [libs/core/segment-engine/src/reader.rs]
/*!
 * =================================================================
 * APARATO: SEGMENT READER & SCANNER (V9.2 - TAIL TOLERANT)
 * CLASIFICACIÓN: CORE STORAGE (ESTRATO L1)
 * RESPONSABILIDAD: LECTURA POSICIONADA Y ESCANEO ESTRUCTURAL DE SEGMENTOS
 *
 * # Physics:
 * Los llamadores de descarga nunca leen encabezados: reciben (offset,
 * length) del catálogo y consumen el payload exacto. El escaneo
 * estructural tolera una cola truncada (colapso del proceso durante el
 * último write) reportando el prefijo válido en bytes.
 * =================================================================
 */

use crate::errors::SegmentError;
use crate::header::{RecordHeader, RECORD_HEADER_SIZE};
use crate::{chain_advance, GENESIS_CHAIN};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Registro descubierto por el escaneo estructural.
#[derive(Debug, Clone)]
pub struct ScannedRecord {
    /// Índice del registro dentro del segmento (0-based).
    pub index: u64,
    /// Offset absoluto del encabezado.
    pub header_offset: u64,
    /// Offset absoluto del primer byte del payload.
    pub payload_offset: u64,
    /// Longitud declarada del payload.
    pub payload_length: u64,
    /// Hash del payload según el encabezado.
    pub payload_hash_hex: String,
}

/// Condición de término del escaneo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTermination {
    /// El archivo cierra exactamente al final de un registro.
    Clean,
    /// El archivo cierra dentro de un encabezado o payload de cola.
    TruncatedTail { at_offset: u64 },
}

/// Informe completo del escaneo de un segmento.
#[derive(Debug, Clone)]
pub struct SegmentScanReport {
    pub records: Vec<ScannedRecord>,
    /// Bytes del prefijo estructuralmente válido (frontera de reparación).
    pub valid_prefix_bytes: u64,
    pub termination: ScanTermination,
    /// Cadena corrida recomputada desde los encabezados del prefijo válido.
    pub chain: [u8; 32],
}

/// Lee exactamente `length` bytes desde `offset` dentro de un segmento.
pub fn read_payload_at(segment_path: &Path, offset: u64, length: u64) -> Result<Vec<u8>, SegmentError> {
    let mut segment_file = File::open(segment_path)?;
    let physical_size = segment_file.metadata()?.len();
    if offset.saturating_add(length) > physical_size {
        return Err(SegmentError::RangeOutOfBounds { offset, length });
    }

    segment_file.seek(SeekFrom::Start(offset))?;
    let mut payload_buffer = vec![0u8; length as usize];
    segment_file.read_exact(&mut payload_buffer)?;
    Ok(payload_buffer)
}

/// Escanea un segmento desde el byte 0 validando la estructura de cada
/// registro (magic, versión, longitudes) sin releer los payloads.
///
/// Corrupción estructural en el cuerpo (magic ajeno, versión desconocida)
/// es un error duro; una cola truncada es una condición tolerada que se
/// reporta en `termination`.
pub fn scan_segment(segment_path: &Path) -> Result<SegmentScanReport, SegmentError> {
    let segment_file = File::open(segment_path)?;
    let physical_size = segment_file.metadata()?.len();
    let mut buffered_reader = BufReader::new(segment_file);

    let mut records = Vec::new();
    let mut running_chain = GENESIS_CHAIN;
    let mut read_position: u64 = 0;
    let mut header_frame = [0u8; RECORD_HEADER_SIZE];

    loop {
        if read_position == physical_size {
            return Ok(SegmentScanReport {
                records,
                valid_prefix_bytes: read_position,
                termination: ScanTermination::Clean,
                chain: running_chain,
            });
        }

        // Encabezado de cola incompleto: prefijo válido termina aquí.
        if physical_size - read_position < RECORD_HEADER_SIZE as u64 {
            return Ok(SegmentScanReport {
                records,
                valid_prefix_bytes: read_position,
                termination: ScanTermination::TruncatedTail { at_offset: read_position },
                chain: running_chain,
            });
        }

        buffered_reader.read_exact(&mut header_frame)?;
        let record_header = RecordHeader::decode(&header_frame, read_position)?;

        let payload_offset = read_position + RECORD_HEADER_SIZE as u64;
        let payload_end = payload_offset + record_header.payload_length;

        // Payload de cola incompleto: misma tolerancia.
        if payload_end > physical_size {
            return Ok(SegmentScanReport {
                records,
                valid_prefix_bytes: read_position,
                termination: ScanTermination::TruncatedTail { at_offset: read_position },
                chain: running_chain,
            });
        }

        buffered_reader.seek(SeekFrom::Start(payload_end))?;
        running_chain = chain_advance(&running_chain, &record_header.payload_hash_hex)?;

        records.push(ScannedRecord {
            index: records.len() as u64,
            header_offset: read_position,
            payload_offset,
            payload_length: record_header.payload_length,
            payload_hash_hex: record_header.payload_hash_hex,
        });
        read_position = payload_end;
    }
}

// FIN DEL ARCHIVO [libs/core/segment-engine/src/reader.rs]
