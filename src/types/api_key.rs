use serde::{Deserialize, Serialize};

/// The project an API key belongs to, as embedded in key records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One API key record as returned by the key listing.
///
/// The secret itself is only present in mutation responses (`key`), never in
/// listings, which carry the masked prefix instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectRef>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<String>,
}

impl ApiKey {
    /// Whether this key is scoped to the given project.
    pub fn belongs_to(&self, project_id: &str) -> bool {
        self.project.as_ref().is_some_and(|p| p.id == project_id)
    }
}

/// Envelope for `GET /api-keys`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeysResponse {
    pub success: bool,
    pub count: usize,
    pub api_keys: Vec<ApiKey>,
}

/// Derived per-project view consumed by guard components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApiKeyStatus {
    pub has_keys: bool,
    pub is_verified: bool,
}

/// Body for `POST /api-keys`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyRequest {
    pub name: String,
    pub project_id: String,
}

/// Envelope for key mutations (create / revoke / rotate).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyMutationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<ApiKey>,
    /// Full secret, returned exactly once on create/rotate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_listing() {
        let resp: ApiKeysResponse = serde_json::from_value(json!({
            "success": true,
            "count": 2,
            "apiKeys": [
                {
                    "_id": "k1",
                    "name": "ci",
                    "maskedKey": "tfx_****abcd",
                    "project": {"_id": "p1", "name": "Checkout"},
                    "verified": true
                },
                {"_id": "k2", "name": "local", "project": {"_id": "p2"}}
            ]
        }))
        .unwrap();
        assert_eq!(resp.count, 2);
        assert!(resp.api_keys[0].verified);
        assert!(resp.api_keys[0].belongs_to("p1"));
        assert!(!resp.api_keys[1].verified);
        assert!(!resp.api_keys[1].belongs_to("p1"));
    }

    #[test]
    fn key_without_project_belongs_nowhere() {
        let key: ApiKey =
            serde_json::from_value(json!({"_id": "k", "name": "orphan"})).unwrap();
        assert!(!key.belongs_to("p1"));
    }
}
