// [tests/mirror/libs/shared/heimdall/heimdall_integrity.test.rs]
/**
 * =================================================================
 * APARATO: HEIMDALL INTEGRITY CERTIFICATION
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L6-MIRROR
 * OBJETIVO: Certificar la materialización de los estratos de logs
 *           por nivel bajo .internal/logs/.
 * =================================================================
 */

use stratavault_shared_heimdall::{arm_file_logging, LOG_LEVEL_DIRECTORIES};

#[test]
fn certify_file_strata_materialization() {
    println!("\n🧪 [PROVING_GROUNDS]: Heimdall file strata audit...");
    let scratch = tempfile::tempdir().expect("scratch dir");

    let logs_root = arm_file_logging(scratch.path()).expect("arming");
    assert!(logs_root.ends_with("logs"));

    for level_directory in LOG_LEVEL_DIRECTORIES {
        let level_path = logs_root.join(level_directory);
        assert!(level_path.is_dir(), "missing level directory '{}'", level_directory);

        // Cada nivel porta exactamente un archivo <unix-ts>.log recién forjado.
        let entries: Vec<_> = std::fs::read_dir(&level_path)
            .unwrap()
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries.len(), 1, "level '{}' should hold one log file", level_directory);
        let file_name = &entries[0];
        assert!(file_name.ends_with(".log"));
        let stem = file_name.strip_suffix(".log").unwrap();
        assert!(stem.bytes().all(|b| b.is_ascii_digit()), "stem must be a unix timestamp");
    }
    println!("   ✅ [SUCCESS]: Four level strata armed.");
}

#[test]
fn certify_rearming_is_idempotent() {
    let scratch = tempfile::tempdir().unwrap();
    let first_root = arm_file_logging(scratch.path()).unwrap();
    // El segundo armado no colapsa ni duplica sumideros globales.
    let second_root = arm_file_logging(scratch.path()).unwrap();
    assert_eq!(first_root, second_root);
}
