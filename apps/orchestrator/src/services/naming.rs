// [apps/orchestrator/src/services/naming.rs]
/*!
 * =================================================================
 * APARATO: FILENAME SAFETY ENGINE (V10.1 - PATH SHIELD)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: NOMBRES SEGUROS PARA DISPOSITION Y ENTRADAS ZIP
 *
 * # Invariantes:
 * Ningún nombre servido o persistido contiene '/', '\', '..' ni bytes
 * de control bajo 0x20 (salvo espacio). Las colisiones dentro de un
 * ZIP se resuelven con sufijos _2, _3, ... preservando la extensión.
 * =================================================================
 */

use std::collections::HashMap;
use stratavault_domain_models::{AssetRecord, FilenameFormat};

/// Sanea un nombre para Content-Disposition y entradas de archivo.
pub fn sanitize_filename(candidate: &str) -> String {
    let mut sanitized: String = candidate
        .chars()
        .filter(|ch| *ch != '/' && *ch != '\\' && (*ch >= ' '))
        .collect();

    while sanitized.contains("..") {
        sanitized = sanitized.replace("..", ".");
    }

    let trimmed = sanitized.trim().to_string();
    if trimmed.is_empty() {
        "asset".to_string()
    } else {
        trimmed
    }
}

/// Nombre de entrada ZIP para un activo según la política solicitada.
pub fn zip_entry_name(record: &AssetRecord, format: FilenameFormat) -> String {
    let base = match format {
        FilenameFormat::Hash => {
            if record.extension.is_empty() {
                record.hash.clone()
            } else {
                format!("{}.{}", record.hash, record.extension)
            }
        }
        FilenameFormat::Original => record.display_filename(),
        FilenameFormat::HashOriginal => {
            let origin = record.display_filename();
            format!("{}_{}", &record.hash[..16.min(record.hash.len())], origin)
        }
    };
    sanitize_filename(&base)
}

/// Resolutor de colisiones de nombres dentro de un mismo ZIP.
/// En duplicado, anexa _2, _3, ... antes de la extensión.
#[derive(Default)]
pub struct CollisionResolver {
    taken: HashMap<String, u32>,
}

impl CollisionResolver {
    pub fn resolve(&mut self, candidate: String) -> String {
        match self.taken.get_mut(&candidate) {
            None => {
                self.taken.insert(candidate.clone(), 1);
                candidate
            }
            Some(occurrences) => {
                *occurrences += 1;
                let suffixed = Self::with_suffix(&candidate, *occurrences);
                // El sufijado también reserva su propio nombre.
                self.taken.insert(suffixed.clone(), 1);
                suffixed
            }
        }
    }

    fn with_suffix(candidate: &str, occurrence: u32) -> String {
        match candidate.rfind('.') {
            Some(dot_index) if dot_index > 0 => {
                format!("{}_{}{}", &candidate[..dot_index], occurrence, &candidate[dot_index..])
            }
            _ => format!("{}_{}", candidate, occurrence),
        }
    }
}

/// Descompone un nombre de archivo subido en (origen, extensión minúscula).
pub fn split_upload_filename(uploaded_name: &str) -> (String, String) {
    let sanitized = sanitize_filename(uploaded_name);
    match sanitized.rfind('.') {
        Some(dot_index) if dot_index > 0 && dot_index < sanitized.len() - 1 => {
            let origin = sanitized[..dot_index].to_string();
            let extension = sanitized[dot_index + 1..].to_lowercase();
            (origin, extension)
        }
        _ => (sanitized, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_named(origin: &str, extension: &str) -> AssetRecord {
        AssetRecord {
            hash: "ab".repeat(32),
            size: 1,
            extension: extension.into(),
            origin_name: origin.into(),
            parent_hash: None,
            created_at: 0,
            dat_file: "000001.dat".into(),
        }
    }

    #[test]
    fn certify_path_traversal_is_neutralized() {
        assert!(!sanitize_filename("../../etc/passwd").contains(".."));
        assert!(!sanitize_filename("a/b\\c").contains('/'));
        assert!(!sanitize_filename("a/b\\c").contains('\\'));
        assert!(!sanitize_filename("bad\u{0007}name").contains('\u{0007}'));
        assert_eq!(sanitize_filename(""), "asset");
        assert_eq!(sanitize_filename("///"), "asset");
    }

    #[test]
    fn certify_collision_suffixes_preserve_extension() {
        let mut resolver = CollisionResolver::default();
        assert_eq!(resolver.resolve("probe.bin".into()), "probe.bin");
        assert_eq!(resolver.resolve("probe.bin".into()), "probe_2.bin");
        assert_eq!(resolver.resolve("probe.bin".into()), "probe_3.bin");
        assert_eq!(resolver.resolve("readme".into()), "readme");
        assert_eq!(resolver.resolve("readme".into()), "readme_2");
    }

    #[test]
    fn certify_zip_entry_name_formats() {
        let record = record_named("probe", "bin");
        assert_eq!(zip_entry_name(&record, FilenameFormat::Original), "probe.bin");
        assert!(zip_entry_name(&record, FilenameFormat::Hash).ends_with(".bin"));
        assert!(zip_entry_name(&record, FilenameFormat::HashOriginal).contains("probe.bin"));
    }

    #[test]
    fn certify_upload_filename_split() {
        assert_eq!(split_upload_filename("Firmware.BIN"), ("Firmware".into(), "bin".into()));
        assert_eq!(split_upload_filename("noext"), ("noext".into(), String::new()));
        assert_eq!(split_upload_filename(".hidden"), (".hidden".into(), String::new()));
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/services/naming.rs]
