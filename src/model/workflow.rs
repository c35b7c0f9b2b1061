//! Workflow bookkeeping: data updates, signature state, dashboard counts

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DataUpdate {
    #[serde(serialize_with = "update_id")]
    pub id: i64,
    pub target: String,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

impl DataUpdate {
    /// Public identifier, e.g. `upd-3`.
    pub fn label(&self) -> String {
        format!("upd-{}", self.id)
    }
}

fn update_id<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("upd-{id}"))
}

/// Singleton record of the most recent signature.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SignatureState {
    pub last_signed_by: String,
    pub last_signed_at: Option<DateTime<Utc>>,
    pub status: String,
}

impl Default for SignatureState {
    fn default() -> Self {
        Self {
            last_signed_by: String::new(),
            last_signed_at: None,
            status: "valid".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct DashboardSummary {
    pub organizations: usize,
    pub projects: usize,
    pub notes: usize,
    pub revisions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_update_id_is_prefixed() {
        let update = DataUpdate {
            id: 7,
            target: "Experiment log".into(),
            status: "queued".into(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["id"], "upd-7");
        assert_eq!(update.label(), "upd-7");
    }
}
