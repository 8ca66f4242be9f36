use serde::{Deserialize, Serialize};

/// A TestFlowX project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Envelope for `GET /projects/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub success: bool,
    pub project: Project,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_wire_shape() {
        let resp: ProjectResponse = serde_json::from_value(json!({
            "success": true,
            "project": {
                "_id": "p1",
                "name": "Checkout",
                "createdAt": "2026-05-01T09:00:00Z"
            }
        }))
        .unwrap();
        assert!(resp.success);
        assert_eq!(resp.project.id, "p1");
        assert_eq!(resp.project.created_at.as_deref(), Some("2026-05-01T09:00:00Z"));
        assert!(resp.project.description.is_none());
    }

    #[test]
    fn missing_required_fields_fail() {
        let result =
            serde_json::from_value::<ProjectResponse>(json!({"success": true, "project": {}}));
        assert!(result.is_err());
    }
}
