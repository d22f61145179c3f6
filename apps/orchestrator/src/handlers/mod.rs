// INICIO DEL ARCHIVO [apps/orchestrator/src/handlers/mod.rs]
/*!
 * =================================================================
 * APARATO: HANDLER ORCHESTRATION HUB (V10.0 - COMPLETE MATRIX)
 * CLASIFICACIÓN: APPLICATION ADAPTERS (ESTRATO L4)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE PUNTOS DE ENTRADA (HANDLERS)
 *
 * # Topología de Módulos:
 * - config:     Configuración del workdir y forja del bootstrap.
 * - auth:       Login/logout/me, usuarios, grants, API keys, cuotas.
 * - topics:     Listado, forja, detalle, stats y remoción de tópicos.
 * - assets:     Ingesta multipart, descarga y detalle de activos.
 * - metadata:   Mutaciones single/batch/apply del log de metadatos.
 * - query:      Ejecución de presets SQL multi-tópico.
 * - audit:      Consulta, stream SSE y acciones del rastro.
 * - verify:     Escaneo de integridad SSE.
 * - download:   Descarga masiva síncrona y sesiones SSE.
 * - monitoring: Métricas del proceso y lectura de logs por nivel.
 * - schema:     API autodescriptiva y plantillas de prompts.
 * =================================================================
 */

pub mod assets;
pub mod audit;
pub mod auth;
pub mod config;
pub mod download;
pub mod metadata;
pub mod monitoring;
pub mod query;
pub mod schema;
pub mod topics;
pub mod verify;

// FIN DEL ARCHIVO [apps/orchestrator/src/handlers/mod.rs]
