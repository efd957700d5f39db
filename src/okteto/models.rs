/// Control-plane API data models
use serde::Deserialize;

/// Namespace as returned by the namespaces endpoint
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Namespace {
    pub name: String,

    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_ignored() {
        let body = r#"[
            {"name": "alice", "status": "Active", "type": "personal", "members": ["alice"]},
            {"name": "team-a"}
        ]"#;

        let namespaces: Vec<Namespace> = serde_json::from_str(body).unwrap();
        assert_eq!(namespaces.len(), 2);
        assert_eq!(namespaces[0].name, "alice");
        assert_eq!(namespaces[0].status.as_deref(), Some("Active"));
        assert_eq!(namespaces[1].status, None);
    }
}
