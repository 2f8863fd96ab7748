//! Agent registry: the ordered mapping from agent id to display name.
//!
//! Sourced once per invocation from configuration; never cached across
//! invocations. The first entry is the default agent for fresh sessions.

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    entries: Vec<AgentEntry>,
}

impl AgentRegistry {
    pub fn new(entries: Vec<AgentEntry>) -> Self {
        Self { entries }
    }

    /// Parse the `AGENTS_JSON` override. Accepts an object `{id: name}` in
    /// authored order or an array `[{"id": …, "name": …}]`.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        match value {
            serde_json::Value::Object(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (id, name) in map {
                    let name = name
                        .as_str()
                        .ok_or_else(|| anyhow::anyhow!("agent {id:?} name must be a string"))?;
                    entries.push(AgentEntry {
                        id,
                        name: name.to_string(),
                    });
                }
                Ok(Self { entries })
            }
            serde_json::Value::Array(_) => Ok(Self {
                entries: serde_json::from_value(value)?,
            }),
            other => Err(anyhow::anyhow!(
                "AGENTS_JSON must be an object or array, got {other:?}"
            )),
        }
    }

    pub fn from_config(agents_json: Option<&str>) -> Self {
        let Some(raw) = agents_json else {
            return Self::default();
        };
        match Self::from_json(raw) {
            Ok(registry) => registry,
            Err(error) => {
                tracing::warn!(%error, "AGENTS_JSON is invalid; starting with no agents");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentEntry> {
        self.entries.iter()
    }

    pub fn first_id(&self) -> Option<&str> {
        self.entries.first().map(|entry| entry.id.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_form_keeps_authored_order() {
        let registry =
            AgentRegistry::from_json(r#"{"zeta": "Zeta", "alpha": "Alpha"}"#).expect("parse");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.first_id(), Some("zeta"));
        assert_eq!(registry.display_name("alpha"), Some("Alpha"));
    }

    #[test]
    fn array_form_parses() {
        let registry = AgentRegistry::from_json(r#"[{"id":"a1","name":"Helper"}]"#).expect("parse");
        assert_eq!(registry.first_id(), Some("a1"));
        assert!(registry.contains("a1"));
        assert!(!registry.contains("a2"));
    }

    #[test]
    fn invalid_json_falls_back_to_empty_registry() {
        let registry = AgentRegistry::from_config(Some("{not json"));
        assert!(registry.is_empty());
        assert_eq!(registry.first_id(), None);
    }

    #[test]
    fn scalar_json_is_rejected() {
        assert!(AgentRegistry::from_json("42").is_err());
        assert!(AgentRegistry::from_json(r#"{"a1": 7}"#).is_err());
    }
}
