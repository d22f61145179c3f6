// [libs/core/segment-engine/src/verifier.rs]
/*!
 * =================================================================
 * APARATO: SEGMENT INTEGRITY VERIFIER (V9.4 - DEEP REPLAY)
 * CLASIFICACIÓN: CORE STORAGE (ESTRATO L1)
 * RESPONSABILIDAD: REPLAY COMPLETO DE CADENA Y RE-HASH DE PAYLOADS
 *
 * # Physics:
 * La verificación profunda itera desde el byte 0: valida magic y
 * versión, relee el payload completo, recomputa su SHA-256 y avanza la
 * cadena corrida. Al cierre, la cadena computada debe igualar el valor
 * sellado en el ledger. La corrupción se reporta como veredicto
 * estructurado, jamás como pánico.
 * =================================================================
 */

use crate::errors::SegmentError;
use crate::header::{RecordHeader, RECORD_HEADER_SIZE};
use crate::{chain_advance, GENESIS_CHAIN, SEGMENT_MAGIC};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Veredicto estructurado de la verificación de un segmento.
#[derive(Debug, Clone)]
pub struct SegmentVerdict {
    pub valid: bool,
    /// Descripción del fallo; menciona la categoría de corrupción.
    pub error: Option<String>,
    /// Registros íntegros verificados.
    pub record_count: u64,
    /// Cadena corrida recomputada (hex) tras el último registro íntegro.
    pub computed_chain_hex: String,
}

impl SegmentVerdict {
    fn corrupted(category: String, record_count: u64, chain: &[u8; 32]) -> Self {
        Self { valid: false, error: Some(category), record_count, computed_chain_hex: hex::encode(chain) }
    }
}

/// Verifica un segmento completo contra su fila de ledger.
///
/// `expected_chain_hex` es la cadena sellada en `dat_files`;
/// `expected_record_count` el conteo sellado. Una cola truncada solo es
/// corrupción cuando el ledger declara registros que el archivo ya no
/// contiene íntegros.
pub fn verify_segment(
    segment_path: &Path,
    expected_chain_hex: &str,
    expected_record_count: u64,
) -> Result<SegmentVerdict, SegmentError> {
    let segment_file = File::open(segment_path)?;
    let physical_size = segment_file.metadata()?.len();
    let mut buffered_reader = BufReader::new(segment_file);

    let mut running_chain = GENESIS_CHAIN;
    let mut verified_records: u64 = 0;
    let mut read_position: u64 = 0;
    let mut header_frame = [0u8; RECORD_HEADER_SIZE];

    while read_position < physical_size {
        // --- FASE 1: ENCABEZADO ---
        if physical_size - read_position < RECORD_HEADER_SIZE as u64 {
            if verified_records >= expected_record_count {
                break; // Cola truncada más allá del ledger: tolerada.
            }
            return Ok(SegmentVerdict::corrupted(
                format!("truncated header at offset {}", read_position),
                verified_records,
                &running_chain,
            ));
        }
        buffered_reader.read_exact(&mut header_frame)?;

        if header_frame[0..4] != SEGMENT_MAGIC {
            return Ok(SegmentVerdict::corrupted(
                format!("magic mismatch at offset {}", read_position),
                verified_records,
                &running_chain,
            ));
        }

        let record_header = match RecordHeader::decode(&header_frame, read_position) {
            Ok(header) => header,
            Err(SegmentError::UnsupportedVersion { version, offset }) => {
                return Ok(SegmentVerdict::corrupted(
                    format!("unsupported version {} at offset {}", version, offset),
                    verified_records,
                    &running_chain,
                ));
            }
            Err(SegmentError::MalformedContentHash(_)) => {
                return Ok(SegmentVerdict::corrupted(
                    format!("hash mismatch: malformed header hash at offset {}", read_position),
                    verified_records,
                    &running_chain,
                ));
            }
            Err(other_fault) => return Err(other_fault),
        };

        // --- FASE 2: PAYLOAD ---
        let payload_end = read_position + RECORD_HEADER_SIZE as u64 + record_header.payload_length;
        if payload_end > physical_size {
            if verified_records >= expected_record_count {
                break;
            }
            return Ok(SegmentVerdict::corrupted(
                format!("truncated payload at offset {}", read_position),
                verified_records,
                &running_chain,
            ));
        }

        let mut payload_hasher = Sha256::new();
        let mut remaining = record_header.payload_length;
        let mut transfer_buffer = [0u8; 64 * 1024];
        while remaining > 0 {
            let take = remaining.min(transfer_buffer.len() as u64) as usize;
            buffered_reader.read_exact(&mut transfer_buffer[..take])?;
            payload_hasher.update(&transfer_buffer[..take]);
            remaining -= take as u64;
        }
        let recomputed_payload_hash = hex::encode(payload_hasher.finalize());

        if recomputed_payload_hash != record_header.payload_hash_hex {
            return Ok(SegmentVerdict::corrupted(
                format!("hash mismatch on record {}", verified_records),
                verified_records,
                &running_chain,
            ));
        }

        // --- FASE 3: AVANCE DE CADENA ---
        running_chain = chain_advance(&running_chain, &record_header.payload_hash_hex)?;
        verified_records += 1;
        read_position = payload_end;
    }

    // --- FASE 4: SELLO CONTRA EL LEDGER ---
    let computed_chain_hex = hex::encode(running_chain);
    if verified_records != expected_record_count {
        return Ok(SegmentVerdict {
            valid: false,
            error: Some(format!(
                "truncated: ledger declares {} records, segment holds {}",
                expected_record_count, verified_records
            )),
            record_count: verified_records,
            computed_chain_hex,
        });
    }
    if computed_chain_hex != expected_chain_hex {
        return Ok(SegmentVerdict {
            valid: false,
            error: Some("chain mismatch against ledger".to_string()),
            record_count: verified_records,
            computed_chain_hex,
        });
    }

    debug!("🔏 [SEGMENT_VERIFY]: {} records sealed and chain replayed.", verified_records);
    Ok(SegmentVerdict { valid: true, error: None, record_count: verified_records, computed_chain_hex })
}

// FIN DEL ARCHIVO [libs/core/segment-engine/src/verifier.rs]
