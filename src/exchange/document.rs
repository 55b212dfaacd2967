//! Exchange document: the versioned export payload.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cards::{Card, CardRepository};

use super::Result;

/// Version written into every exported document.
pub const EXPORT_VERSION: &str = "1.0";

/// The portable wrapper around a card collection.
///
/// On read, `version` and `exportDate` are tolerated when absent; only the
/// `cards` field is load-bearing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeDocument {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "Utc::now")]
    pub export_date: DateTime<Utc>,
    pub cards: Vec<Card>,
}

fn default_version() -> String {
    EXPORT_VERSION.to_string()
}

impl ExchangeDocument {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = self.to_json()?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Snapshot the full collection. Pure: the repository is not touched.
pub fn export_document(repository: &CardRepository) -> ExchangeDocument {
    ExchangeDocument {
        version: EXPORT_VERSION.to_string(),
        export_date: Utc::now(),
        cards: repository.get_all().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDraft, CardKind};

    #[test]
    fn test_export_snapshots_every_card() {
        let mut repo = CardRepository::new();
        repo.create(CardDraft::new("Tavern".to_string(), CardKind::Location));
        repo.create(CardDraft::new("Mira".to_string(), CardKind::Character));

        let document = export_document(&repo);
        assert_eq!(document.version, "1.0");
        assert_eq!(document.cards.len(), 2);
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn test_document_json_carries_wire_field_names() {
        let mut repo = CardRepository::new();
        repo.create(CardDraft::new("Tavern".to_string(), CardKind::Location));

        let json = export_document(&repo).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], "1.0");
        assert!(value["exportDate"].is_string());
        assert_eq!(value["cards"][0]["type"], "location");
        assert!(value["cards"][0]["adjacentLocations"].is_array());
        assert!(value["cards"][0]["presentCharacters"].is_array());
        assert!(value["cards"][0]["createdAt"].is_string());
    }

    #[test]
    fn test_document_tolerates_missing_metadata() {
        let document: ExchangeDocument = serde_json::from_str(r#"{"cards": []}"#).unwrap();
        assert_eq!(document.version, "1.0");
        assert!(document.cards.is_empty());
    }
}
