// INICIO DEL ARCHIVO [libs/core/segment-engine/src/lib.rs]
/*!
 * =================================================================
 * APARATO: PACKED SEGMENT ENGINE (V9.2 - CHAIN SEALED)
 * CLASIFICACIÓN: CORE STORAGE (ESTRATO L1)
 * RESPONSABILIDAD: FÍSICA DE SEGMENTOS .DAT Y CADENA DE INTEGRIDAD
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. APPEND-ONLY PHYSICS: Cada registro es una trama [header + payload]
 *    inmutable. El motor jamás reescribe bytes ya sellados.
 * 2. RUNNING CHAIN: chain[n] = SHA-256(chain[n-1] ∥ raw_hash[n]) con
 *    chain[0] = 32 bytes cero. La cadena es por segmento y debe
 *    recomputarse bit-idéntica en cada replay.
 * 3. CRASH TOLERANCE: Un colapso del proceso deja como máximo un
 *    registro de cola truncado; el escáner lo detecta y reporta el
 *    prefijo válido para su reparación.
 * =================================================================
 */

pub mod errors;
pub mod header;
pub mod reader;
pub mod verifier;
pub mod writer;

pub use errors::SegmentError;
pub use header::{RecordHeader, RECORD_HEADER_SIZE, SEGMENT_FORMAT_VERSION, SEGMENT_MAGIC};
pub use reader::{read_payload_at, scan_segment, ScanTermination, ScannedRecord, SegmentScanReport};
pub use verifier::{verify_segment, SegmentVerdict};
pub use writer::{AppendReceipt, SegmentCursor, SegmentWriter};

use sha2::{Digest, Sha256};

/// Valor génesis de la cadena corrida: 32 bytes cero.
pub const GENESIS_CHAIN: [u8; 32] = [0u8; 32];

/// Avanza la cadena corrida un eslabón: SHA-256(chain[n-1] ∥ raw_hash[n]).
///
/// El eslabón de entrada es el hash del payload en su forma cruda de 32
/// bytes (hex decodificado), de modo que la cadena sea independiente de
/// la codificación ASCII del encabezado.
pub fn chain_advance(previous_chain: &[u8; 32], payload_hash_hex: &str) -> Result<[u8; 32], SegmentError> {
    let raw_payload_hash = decode_content_hash(payload_hash_hex)?;

    let mut chain_hasher = Sha256::new();
    chain_hasher.update(previous_chain);
    chain_hasher.update(raw_payload_hash);

    let mut advanced_chain = [0u8; 32];
    advanced_chain.copy_from_slice(&chain_hasher.finalize());
    Ok(advanced_chain)
}

/// Decodifica un hash de contenido (64 hex minúsculas) a sus 32 bytes crudos.
pub fn decode_content_hash(payload_hash_hex: &str) -> Result<[u8; 32], SegmentError> {
    if payload_hash_hex.len() != 64 || !payload_hash_hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SegmentError::MalformedContentHash(payload_hash_hex.to_string()));
    }
    let decoded = hex::decode(payload_hash_hex)
        .map_err(|_| SegmentError::MalformedContentHash(payload_hash_hex.to_string()))?;
    let mut raw = [0u8; 32];
    raw.copy_from_slice(&decoded);
    Ok(raw)
}

/// Calcula el hash de contenido canónico (hex minúsculas) de un payload.
pub fn content_hash_hex(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hex::encode(hasher.finalize())
}

/// Nombre canónico de un segmento por número de secuencia: `000001.dat`.
pub fn segment_file_name(sequence_number: u32) -> String {
    format!("{:06}.dat", sequence_number)
}

/// Recupera el número de secuencia desde un nombre `NNNNNN.dat`.
pub fn parse_segment_sequence(segment_name: &str) -> Option<u32> {
    let stem = segment_name.strip_suffix(".dat")?;
    if stem.len() != 6 || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

// FIN DEL ARCHIVO [libs/core/segment-engine/src/lib.rs]
