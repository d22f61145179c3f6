// [libs/core/segment-engine/src/header.rs]
/*!
 * =================================================================
 * APARATO: RECORD HEADER CODEC (V9.1 - LAYOUT FROZEN)
 * CLASIFICACIÓN: CORE STORAGE (ESTRATO L1)
 * RESPONSABILIDAD: CODIFICACIÓN BIT-PERFECTA DEL ENCABEZADO DE 110 BYTES
 *
 * Layout (little-endian):
 *   offset   0: magic 'MSHB'            (4 bytes)
 *   offset   4: format version u16      (2 bytes)
 *   offset   6: payload length u64      (8 bytes)
 *   offset  14: payload hash ASCII hex  (64 bytes)
 *   offset  78: reserved zeros          (32 bytes)
 *   offset 110: payload bytes
 * =================================================================
 */

use crate::errors::SegmentError;

/// Firma mágica que abre cada registro empaquetado.
pub const SEGMENT_MAGIC: [u8; 4] = *b"MSHB";

/// Versión vigente del formato de registro.
pub const SEGMENT_FORMAT_VERSION: u16 = 1;

/// Tamaño constante del encabezado: 4 + 2 + 8 + 64 + 32.
pub const RECORD_HEADER_SIZE: usize = 110;

/// Encabezado decodificado de un registro empaquetado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub format_version: u16,
    pub payload_length: u64,
    pub payload_hash_hex: String,
}

impl RecordHeader {
    /// Forja un encabezado nuevo con la versión de formato vigente.
    pub fn forge(payload_length: u64, payload_hash_hex: &str) -> Result<Self, SegmentError> {
        // El hash viaja verbatim: validamos antes de sellar.
        crate::decode_content_hash(payload_hash_hex)?;
        Ok(Self {
            format_version: SEGMENT_FORMAT_VERSION,
            payload_length,
            payload_hash_hex: payload_hash_hex.to_string(),
        })
    }

    /// Serializa el encabezado a su trama fija de 110 bytes.
    pub fn encode(&self) -> [u8; RECORD_HEADER_SIZE] {
        let mut frame = [0u8; RECORD_HEADER_SIZE];
        frame[0..4].copy_from_slice(&SEGMENT_MAGIC);
        frame[4..6].copy_from_slice(&self.format_version.to_le_bytes());
        frame[6..14].copy_from_slice(&self.payload_length.to_le_bytes());
        frame[14..78].copy_from_slice(self.payload_hash_hex.as_bytes());
        // frame[78..110] queda en cero: banda reservada.
        frame
    }

    /// Decodifica una trama de encabezado leída en la posición `offset`.
    ///
    /// `offset` solo participa en el diagnóstico de los errores.
    pub fn decode(frame: &[u8], offset: u64) -> Result<Self, SegmentError> {
        if frame.len() < RECORD_HEADER_SIZE {
            return Err(SegmentError::TruncatedHeader(offset));
        }
        if frame[0..4] != SEGMENT_MAGIC {
            return Err(SegmentError::MagicMismatch(offset));
        }

        let format_version = u16::from_le_bytes([frame[4], frame[5]]);
        if format_version != SEGMENT_FORMAT_VERSION {
            return Err(SegmentError::UnsupportedVersion { version: format_version, offset });
        }

        let mut length_bytes = [0u8; 8];
        length_bytes.copy_from_slice(&frame[6..14]);
        let payload_length = u64::from_le_bytes(length_bytes);

        let payload_hash_hex = std::str::from_utf8(&frame[14..78])
            .map_err(|_| SegmentError::MalformedContentHash("NON_UTF8_HEADER_HASH".into()))?
            .to_string();
        crate::decode_content_hash(&payload_hash_hex)?;

        Ok(Self { format_version, payload_length, payload_hash_hex })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certify_header_round_trip() {
        let payload_hash = crate::content_hash_hex(b"vault");
        let header = RecordHeader::forge(5, &payload_hash).unwrap();
        let frame = header.encode();

        assert_eq!(frame.len(), RECORD_HEADER_SIZE);
        assert_eq!(&frame[0..4], b"MSHB");
        assert!(frame[78..110].iter().all(|b| *b == 0));

        let decoded = RecordHeader::decode(&frame, 0).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn certify_header_rejects_foreign_magic() {
        let payload_hash = crate::content_hash_hex(b"vault");
        let mut frame = RecordHeader::forge(5, &payload_hash).unwrap().encode();
        frame[0] = b'X';
        assert!(matches!(RecordHeader::decode(&frame, 0), Err(SegmentError::MagicMismatch(0))));
    }

    #[test]
    fn certify_header_rejects_future_version() {
        let payload_hash = crate::content_hash_hex(b"vault");
        let mut frame = RecordHeader::forge(5, &payload_hash).unwrap().encode();
        frame[4] = 9;
        assert!(matches!(
            RecordHeader::decode(&frame, 0),
            Err(SegmentError::UnsupportedVersion { version: 9, .. })
        ));
    }

    #[test]
    fn certify_header_rejects_short_frame() {
        assert!(matches!(
            RecordHeader::decode(&[0u8; 10], 220),
            Err(SegmentError::TruncatedHeader(220))
        ));
    }
}
// FIN DEL ARCHIVO [libs/core/segment-engine/src/header.rs]
