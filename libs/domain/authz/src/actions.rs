// [libs/domain/authz/src/actions.rs]
/*!
 * =================================================================
 * APARATO: ACTION TOKEN REGISTRY (V8.0 - CLOSED SET)
 * CLASIFICACIÓN: DOMAIN SECURITY (ESTRATO L2)
 * RESPONSABILIDAD: ENUMERACIÓN CERRADA DE ACCIONES AUTORIZABLES
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/// Conjunto cerrado de acciones autorizables. Todo token ajeno se
/// rechaza en la capa de grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionToken {
    Upload,
    Download,
    Query,
    ManageTopics,
    ManageUsers,
    ManageGrants,
    ManageConfig,
    ViewAudit,
}

impl ActionToken {
    /// Tabla cerrada completa en orden estable.
    pub const ALL: &'static [ActionToken] = &[
        ActionToken::Upload,
        ActionToken::Download,
        ActionToken::Query,
        ActionToken::ManageTopics,
        ActionToken::ManageUsers,
        ActionToken::ManageGrants,
        ActionToken::ManageConfig,
        ActionToken::ViewAudit,
    ];

    /// Token textual estable hacia SQLite y el envelope JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionToken::Upload => "upload",
            ActionToken::Download => "download",
            ActionToken::Query => "query",
            ActionToken::ManageTopics => "manage_topics",
            ActionToken::ManageUsers => "manage_users",
            ActionToken::ManageGrants => "manage_grants",
            ActionToken::ManageConfig => "manage_config",
            ActionToken::ViewAudit => "view_audit",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|action| action.as_str() == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certify_action_token_round_trip() {
        for action in ActionToken::ALL {
            assert_eq!(ActionToken::parse(action.as_str()), Some(*action));
        }
        assert_eq!(ActionToken::parse("root_access"), None);
    }
}
// FIN DEL ARCHIVO [libs/domain/authz/src/actions.rs]
