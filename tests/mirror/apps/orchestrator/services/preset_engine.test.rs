// [tests/mirror/apps/orchestrator/services/preset_engine.test.rs]
/**
 * =================================================================
 * APARATO: PRESET ENGINE CERTIFICATION
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: Siembra de defaults, binding, compilación :name -> ?N y
 *           fan-out con unión estable de columnas.
 * =================================================================
 */

use std::collections::BTreeMap;
use std::sync::Arc;
use stratavault_orchestrator::services::preset_engine::{
    bind_parameters, compile_statement, execute_fanout, resolve_or_fault, PresetRegistry,
};
use stratavault_orchestrator::services::topic_store::TopicStore;

fn forge_registry() -> (tempfile::TempDir, PresetRegistry) {
    let scratch = tempfile::tempdir().unwrap();
    let registry = PresetRegistry::load(&scratch.path().join("queries")).expect("registry");
    (scratch, registry)
}

#[test]
fn certify_defaults_are_seeded_once() {
    println!("\n🧪 [PROVING_GROUNDS]: Preset seeding audit...");
    let scratch = tempfile::tempdir().unwrap();
    let queries_root = scratch.path().join("queries");

    let first = PresetRegistry::load(&queries_root).unwrap();
    assert!(first.resolve("recent_assets").is_some());
    assert!(first.resolve("extension_breakdown").is_some());

    // Un preset del operador sobrevive a recargas.
    std::fs::write(
        queries_root.join("presets/operator_custom.yaml"),
        "description: custom\nsql: SELECT hash AS asset_id FROM assets\nparameters: []\n",
    )
    .unwrap();
    let second = PresetRegistry::load(&queries_root).unwrap();
    assert!(second.resolve("operator_custom").is_some());
    assert!(second.resolve("recent_assets").is_some());
    println!("   ✅ [SUCCESS]: Seed + operator extension coexist.");
}

#[test]
fn certify_invalid_preset_is_skipped_not_fatal() {
    let scratch = tempfile::tempdir().unwrap();
    let queries_root = scratch.path().join("queries");
    std::fs::create_dir_all(queries_root.join("presets")).unwrap();
    std::fs::write(queries_root.join("presets/broken.yaml"), ":::not yaml at all").unwrap();

    let registry = PresetRegistry::load(&queries_root).expect("startup must survive");
    assert!(registry.resolve("broken").is_none());
    assert!(registry.resolve("recent_assets").is_some());
}

#[test]
fn certify_parameter_binding_contract() {
    let (_scratch, registry) = forge_registry();
    let preset = registry.resolve("assets_by_extension").unwrap();

    // Requerido ausente -> MISSING_PARAM.
    let fault = bind_parameters(preset, &serde_json::json!({})).unwrap_err();
    assert_eq!(fault.code, "MISSING_PARAM");

    // Extra ignorado; default inyectado.
    let recent = registry.resolve("recent_assets").unwrap();
    let bound = bind_parameters(recent, &serde_json::json!({ "noise": 1 })).unwrap();
    assert_eq!(bound.get("limit"), Some(&serde_json::json!(100)));
    assert!(!bound.contains_key("noise"));
}

#[test]
fn certify_statement_compilation() {
    let mut bound = BTreeMap::new();
    bound.insert("limit".to_string(), serde_json::json!(5));
    bound.insert("key".to_string(), serde_json::json!("stage"));

    let (sql, values) =
        compile_statement("SELECT * FROM t WHERE key = :key LIMIT :limit", &bound).unwrap();
    assert_eq!(sql, "SELECT * FROM t WHERE key = ?1 LIMIT ?2");
    assert_eq!(values.len(), 2);

    // Placeholder repetido genera posiciones nuevas en orden.
    let (sql_repeat, values_repeat) =
        compile_statement("SELECT :key, :key", &bound).unwrap();
    assert_eq!(sql_repeat, "SELECT ?1, ?2");
    assert_eq!(values_repeat.len(), 2);

    // Literales de texto quedan intactos.
    let (sql_literal, values_literal) =
        compile_statement("SELECT ':not_a_param', :key", &bound).unwrap();
    assert!(sql_literal.contains("':not_a_param'"));
    assert_eq!(values_literal.len(), 1);

    // Placeholder sin binding: fallo del preset.
    assert!(compile_statement("SELECT :ghost", &bound).is_err());
}

/**
 * Fan-out multi-tópico: recorrido lexicográfico, filas concatenadas y
 * unión de columnas first-seen estable.
 */
#[tokio::test]
async fn certify_multi_topic_fanout_union() {
    let scratch = tempfile::tempdir().unwrap();
    let registry = PresetRegistry::load(&scratch.path().join("queries")).unwrap();

    let alpha = Arc::new(
        TopicStore::open("alpha", &scratch.path().join("alpha"), 1_048_576).await.unwrap(),
    );
    let zulu = Arc::new(
        TopicStore::open("zulu", &scratch.path().join("zulu"), 1_048_576).await.unwrap(),
    );
    alpha.put_asset(b"alpha-one", "bin", "one", None).await.unwrap();
    alpha.put_asset(b"alpha-two", "bin", "two", None).await.unwrap();
    zulu.put_asset(b"zulu-one", "img", "three", None).await.unwrap();

    let preset = resolve_or_fault(&registry, "recent_assets").unwrap().clone();
    let report = execute_fanout(
        vec![alpha.clone(), zulu.clone()],
        "recent_assets",
        &preset,
        &serde_json::json!({}),
    )
    .await
    .expect("fanout");

    assert_eq!(report.preset, "recent_assets");
    assert_eq!(report.row_count, 3);
    assert_eq!(report.columns[0], "asset_id");
    assert_eq!(report.rows.len(), 3);
    // Toda fila queda proyectada sobre la unión completa.
    for row in &report.rows {
        assert_eq!(row.len(), report.columns.len());
    }

    let missing = resolve_or_fault(&registry, "ghost_preset").unwrap_err();
    assert_eq!(missing.code, "PRESET_NOT_FOUND");
}

/**
 * Conjuntos de columnas divergentes entre tópicos: el tópico temprano
 * (menos columnas) también debe proyectarse sobre la unión final —
 * toda fila porta el ancho completo, con null en lo que no conoce.
 */
#[tokio::test]
async fn certify_divergent_column_sets_project_onto_full_union() {
    println!("\n🧪 [PROVING_GROUNDS]: Divergent column union audit...");
    let scratch = tempfile::tempdir().unwrap();
    let queries_root = scratch.path().join("queries");
    std::fs::create_dir_all(queries_root.join("presets")).unwrap();
    std::fs::write(
        queries_root.join("presets/dump_assets.yaml"),
        "description: raw asset dump\nsql: SELECT * FROM assets\nparameters: []\n",
    )
    .unwrap();
    let registry = PresetRegistry::load(&queries_root).unwrap();

    let alpha = Arc::new(
        TopicStore::open("alpha", &scratch.path().join("alpha"), 1_048_576).await.unwrap(),
    );
    let zulu = Arc::new(
        TopicStore::open("zulu", &scratch.path().join("zulu"), 1_048_576).await.unwrap(),
    );

    // Deriva de esquema del operador: zulu porta una columna extra.
    zulu.execute_preset_statement("ALTER TABLE assets ADD COLUMN extra TEXT DEFAULT 'x'", Vec::new())
        .await
        .unwrap();

    alpha.put_asset(b"alpha-narrow", "bin", "narrow", None).await.unwrap();
    zulu.put_asset(b"zulu-wide", "bin", "wide", None).await.unwrap();

    let preset = resolve_or_fault(&registry, "dump_assets").unwrap().clone();
    // alpha (angosto) primero: sus filas ya empujadas deben igualmente
    // terminar con el ancho de la unión completa.
    let report = execute_fanout(
        vec![alpha, zulu],
        "dump_assets",
        &preset,
        &serde_json::json!({}),
    )
    .await
    .expect("fanout");

    let extra_index = report
        .columns
        .iter()
        .position(|column| column == "extra")
        .expect("union must carry the late column");
    assert_eq!(report.row_count, 2);
    for row in &report.rows {
        assert_eq!(row.len(), report.columns.len(), "every row spans the full union");
    }
    // La fila del tópico angosto porta null en la columna ajena.
    assert_eq!(report.rows[0][extra_index], serde_json::Value::Null);
    assert_eq!(report.rows[1][extra_index], serde_json::json!("x"));
    println!("   ✅ [SUCCESS]: Late columns backfill earlier rows with null.");
}
