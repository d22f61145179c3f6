// [libs/domain/authz/src/constraints.rs]
/*!
 * =================================================================
 * APARATO: CONSTRAINT SCHEMA TABLE (V8.1 - SCHEMAS AS DATA)
 * CLASIFICACIÓN: DOMAIN SECURITY (ESTRATO L2)
 * RESPONSABILIDAD: ESQUEMA DECLARATIVO DE CONSTRAINTS POR ACCIÓN
 *
 * # Physics:
 * El esquema por acción es una tabla de datos, no código: cada campo
 * declara nombre y tipo. La validación uniforme rechaza campos
 * desconocidos (defensa contra typos: "daly_count_limit") y tipos
 * ajenos con AUTH_INVALID_CONSTRAINTS.
 * =================================================================
 */

use crate::actions::ActionToken;
use crate::errors::AuthzError;
use serde_json::Value;

/// Tipo admitido para un campo de constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    StringList,
    Integer,
    Boolean,
}

/// Declaración de un campo del esquema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const UPLOAD_SCHEMA: &[FieldSpec] = &[
    FieldSpec { name: "allowed_extensions", kind: FieldKind::StringList },
    FieldSpec { name: "allowed_topics", kind: FieldKind::StringList },
    FieldSpec { name: "max_file_size_bytes", kind: FieldKind::Integer },
    FieldSpec { name: "daily_count_limit", kind: FieldKind::Integer },
    FieldSpec { name: "daily_volume_bytes", kind: FieldKind::Integer },
];

const DOWNLOAD_SCHEMA: &[FieldSpec] = &[
    FieldSpec { name: "daily_count_limit", kind: FieldKind::Integer },
];

const QUERY_SCHEMA: &[FieldSpec] = &[
    FieldSpec { name: "allowed_presets", kind: FieldKind::StringList },
];

const VIEW_AUDIT_SCHEMA: &[FieldSpec] = &[
    FieldSpec { name: "can_view_all", kind: FieldKind::Boolean },
    FieldSpec { name: "can_stream", kind: FieldKind::Boolean },
];

const MANAGE_USERS_SCHEMA: &[FieldSpec] = &[
    FieldSpec { name: "can_create", kind: FieldKind::Boolean },
    FieldSpec { name: "can_edit", kind: FieldKind::Boolean },
    FieldSpec { name: "escalation_allowed", kind: FieldKind::Boolean },
    FieldSpec { name: "can_grant_actions", kind: FieldKind::StringList },
];

const MANAGE_GRANTS_SCHEMA: &[FieldSpec] = &[
    FieldSpec { name: "escalation_allowed", kind: FieldKind::Boolean },
    FieldSpec { name: "can_grant_actions", kind: FieldKind::StringList },
];

/// Tabla declarativa: esquema de constraints por acción.
/// `manage_config` y `manage_topics` no admiten constraint alguna.
pub fn constraint_schema_for(action: ActionToken) -> &'static [FieldSpec] {
    match action {
        ActionToken::Upload => UPLOAD_SCHEMA,
        ActionToken::Download => DOWNLOAD_SCHEMA,
        ActionToken::Query => QUERY_SCHEMA,
        ActionToken::ViewAudit => VIEW_AUDIT_SCHEMA,
        ActionToken::ManageUsers => MANAGE_USERS_SCHEMA,
        ActionToken::ManageGrants => MANAGE_GRANTS_SCHEMA,
        ActionToken::ManageTopics | ActionToken::ManageConfig => &[],
    }
}

/// Valida un blob de constraints contra el esquema de su acción.
///
/// `null` y el objeto vacío equivalen a "sin constraints". Para acciones
/// con esquema vacío, cualquier objeto no vacío se rechaza.
pub fn validate_constraints(action: ActionToken, constraints: &Value) -> Result<(), AuthzError> {
    let fields = match constraints {
        Value::Null => return Ok(()),
        Value::Object(map) => map,
        _ => {
            return Err(AuthzError::InvalidConstraints(
                "constraints must be a JSON object".into(),
            ))
        }
    };

    let schema = constraint_schema_for(action);
    for (field_name, field_value) in fields {
        let spec = schema.iter().find(|spec| spec.name == field_name).ok_or_else(|| {
            AuthzError::InvalidConstraints(format!(
                "unknown field '{}' for action '{}'",
                field_name,
                action.as_str()
            ))
        })?;
        validate_field_kind(spec, field_value)?;
    }
    Ok(())
}

fn validate_field_kind(spec: &FieldSpec, field_value: &Value) -> Result<(), AuthzError> {
    let conforms = match spec.kind {
        FieldKind::StringList => field_value
            .as_array()
            .map(|items| items.iter().all(|item| item.is_string()))
            .unwrap_or(false),
        FieldKind::Integer => field_value.as_i64().map(|v| v >= 0).unwrap_or(false),
        FieldKind::Boolean => field_value.is_boolean(),
    };
    if conforms {
        Ok(())
    } else {
        Err(AuthzError::InvalidConstraints(format!(
            "field '{}' has invalid type",
            spec.name
        )))
    }
}

fn string_list(constraints: &Value, field: &str) -> Option<Vec<String>> {
    constraints.get(field)?.as_array().map(|items| {
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect()
    })
}

/// Vista tipada de las constraints de `upload`.
#[derive(Debug, Clone, Default)]
pub struct UploadConstraints {
    pub allowed_extensions: Option<Vec<String>>,
    pub allowed_topics: Option<Vec<String>>,
    pub max_file_size_bytes: Option<i64>,
    pub daily_count_limit: Option<i64>,
    pub daily_volume_bytes: Option<i64>,
}

impl UploadConstraints {
    pub fn from_json(constraints: &Value) -> Self {
        Self {
            allowed_extensions: string_list(constraints, "allowed_extensions"),
            allowed_topics: string_list(constraints, "allowed_topics"),
            max_file_size_bytes: constraints.get("max_file_size_bytes").and_then(Value::as_i64),
            daily_count_limit: constraints.get("daily_count_limit").and_then(Value::as_i64),
            daily_volume_bytes: constraints.get("daily_volume_bytes").and_then(Value::as_i64),
        }
    }
}

/// Vista tipada de las constraints de `query`.
#[derive(Debug, Clone, Default)]
pub struct QueryConstraints {
    pub allowed_presets: Option<Vec<String>>,
}

impl QueryConstraints {
    pub fn from_json(constraints: &Value) -> Self {
        Self { allowed_presets: string_list(constraints, "allowed_presets") }
    }
}

/// Vista tipada de las constraints de `view_audit`.
/// Campos omitidos degradan a false (visión restringida por defecto).
#[derive(Debug, Clone, Default)]
pub struct ViewAuditConstraints {
    pub can_view_all: bool,
    pub can_stream: bool,
}

impl ViewAuditConstraints {
    pub fn from_json(constraints: &Value) -> Self {
        Self {
            can_view_all: constraints.get("can_view_all").and_then(Value::as_bool).unwrap_or(false),
            can_stream: constraints.get("can_stream").and_then(Value::as_bool).unwrap_or(false),
        }
    }
}

/// Vista tipada de las constraints de `manage_users` / `manage_grants`.
#[derive(Debug, Clone, Default)]
pub struct ManageUsersConstraints {
    pub can_create: bool,
    pub can_edit: bool,
    pub escalation_allowed: bool,
    pub can_grant_actions: Option<Vec<String>>,
}

impl ManageUsersConstraints {
    pub fn from_json(constraints: &Value) -> Self {
        Self {
            can_create: constraints.get("can_create").and_then(Value::as_bool).unwrap_or(true),
            can_edit: constraints.get("can_edit").and_then(Value::as_bool).unwrap_or(true),
            escalation_allowed: constraints
                .get("escalation_allowed")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            can_grant_actions: string_list(constraints, "can_grant_actions"),
        }
    }
}

// FIN DEL ARCHIVO [libs/domain/authz/src/constraints.rs]
