//! Exchange document import
//!
//! Merging an exported document into a live repository must never collide
//! with existing ids, so every incoming card gets a fresh id. The rewrite is
//! two-pass: all new ids are minted up front, then each card's own id and
//! reference lists are rewritten through the old→new map. A single pass would
//! remap a card's id before later cards' forward references to it could be
//! resolved; minting first removes the ordering sensitivity entirely.
//!
//! References to ids outside the batch are deliberately kept as-is rather
//! than rejected: a document may mention cards it does not contain.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::Utc;

use crate::cards::{Card, CardId, CardRepository};

use super::{ExchangeDocument, ExchangeError, Result};

/// Parse `raw` as an exchange document and merge its cards into the
/// repository. Returns the number of imported cards.
///
/// Atomic: a malformed payload leaves the repository untouched. Strictly
/// additive: no dedup by name or content, and incoming `createdAt`/
/// `updatedAt` values are replaced by the import time.
pub fn import_document(repository: &mut CardRepository, raw: &str) -> Result<usize> {
    let document: ExchangeDocument = serde_json::from_str(raw)
        .map_err(|e| ExchangeError::MalformedDocument(e.to_string()))?;

    let count = merge_cards(repository, document.cards);
    log::info!("Imported {} cards from exchange document", count);
    Ok(count)
}

/// Read an exchange document from disk and import it.
///
/// The read failure surfaces as [`ExchangeError::Io`], distinct from a file
/// that was read but holds an invalid document.
pub fn import_from_file(repository: &mut CardRepository, path: &Path) -> Result<usize> {
    let raw = fs::read_to_string(path)?;
    import_document(repository, &raw)
}

fn merge_cards(repository: &mut CardRepository, cards: Vec<Card>) -> usize {
    let now = Utc::now();

    // Pass 1: mint one fresh id per incoming card.
    let mut id_map: HashMap<CardId, CardId> = HashMap::with_capacity(cards.len());
    for card in &cards {
        let new_id = mint_import_id(repository, &id_map);
        id_map.insert(card.id.clone(), new_id);
    }

    // Pass 2: rewrite ids and references, reset timestamps, append.
    let mut count = 0;
    for mut card in cards {
        if let Some(new_id) = id_map.get(&card.id) {
            card.id = new_id.clone();
        }
        card.details.remap_references(&id_map);
        card.created_at = now;
        card.updated_at = now;
        repository.insert(card);
        count += 1;
    }

    count
}

/// Fresh id colliding with neither the live collection nor the ids already
/// assigned to this batch.
fn mint_import_id(repository: &CardRepository, id_map: &HashMap<CardId, CardId>) -> CardId {
    loop {
        let id = CardId::generate();
        if repository.get(&id).is_none() && !id_map.values().any(|assigned| *assigned == id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::cards::{CardDetails, CardDraft, CardKind, CardPatch, DetailsPatch};
    use crate::exchange::export_document;

    fn linked_pair(repo: &mut CardRepository) -> (Card, Card) {
        let tavern = repo.create(CardDraft::new("Tavern".to_string(), CardKind::Location));
        let market = repo.create(CardDraft::new("Market".to_string(), CardKind::Location));
        let tavern = repo
            .update(
                &tavern.id,
                CardPatch {
                    details: Some(DetailsPatch::Location {
                        adjacent_locations: Some(vec![market.id.clone()]),
                        present_characters: None,
                    }),
                    ..CardPatch::default()
                },
            )
            .unwrap();
        (tavern, market)
    }

    fn adjacent_of<'a>(repo: &'a CardRepository, name: &str) -> &'a [CardId] {
        let card = repo
            .get_all()
            .iter()
            .find(|card| card.name == name)
            .unwrap();
        match &card.details {
            CardDetails::Location(details) => &details.adjacent_locations,
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn test_round_trip_preserves_fields_and_relinks_siblings() {
        let mut source = CardRepository::new();
        linked_pair(&mut source);
        let raw = export_document(&source).to_json().unwrap();

        let mut target = CardRepository::new();
        let count = import_document(&mut target, &raw).unwrap();
        assert_eq!(count, 2);
        assert_eq!(target.len(), 2);

        // The adjacency still points at the renamed sibling, under its new id.
        let market_id = target
            .get_all()
            .iter()
            .find(|card| card.name == "Market")
            .map(|card| card.id.clone())
            .unwrap();
        assert_eq!(adjacent_of(&target, "Tavern"), &[market_id]);

        // New ids, nothing shared with the source repository.
        for card in target.get_all() {
            assert!(source.get(&card.id).is_none());
        }
    }

    #[test]
    fn test_import_into_populated_repository_never_collides() {
        let mut repo = CardRepository::new();
        linked_pair(&mut repo);
        let raw = export_document(&repo).to_json().unwrap();

        let count = import_document(&mut repo, &raw).unwrap();
        assert_eq!(count, 2);
        assert_eq!(repo.len(), 4);

        let mut ids: Vec<&str> = repo.get_all().iter().map(|card| card.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);

        // Duplicate names are allowed; import never upserts.
        let tavern_count = repo
            .get_all()
            .iter()
            .filter(|card| card.name == "Tavern")
            .count();
        assert_eq!(tavern_count, 2);
    }

    #[test]
    fn test_references_outside_the_batch_pass_through() {
        let raw = r#"{
            "version": "1.0",
            "cards": [{
                "id": "old-1",
                "type": "character",
                "name": "Mira",
                "bonds": ["old-1", "elsewhere-99"]
            }]
        }"#;

        let mut repo = CardRepository::new();
        import_document(&mut repo, raw).unwrap();

        let mira = &repo.get_all()[0];
        match &mira.details {
            CardDetails::Character(details) => {
                // Self-bond remapped to the new id, the foreign id untouched.
                assert_eq!(details.bonds[0], mira.id);
                assert_eq!(details.bonds[1], CardId::from("elsewhere-99"));
            }
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn test_import_resets_timestamps() {
        let raw = r#"{
            "cards": [{
                "id": "old-1",
                "type": "event",
                "name": "Coronation",
                "createdAt": "2020-01-01T00:00:00Z",
                "updatedAt": "2020-01-01T00:00:00Z"
            }]
        }"#;

        let mut repo = CardRepository::new();
        import_document(&mut repo, raw).unwrap();

        let card = &repo.get_all()[0];
        assert!(card.created_at.timestamp() > 1_600_000_000);
        assert_eq!(card.created_at, card.updated_at);
    }

    #[test]
    fn test_malformed_documents_leave_repository_untouched() {
        let mut repo = CardRepository::new();
        linked_pair(&mut repo);
        let before: Vec<Card> = repo.get_all().to_vec();

        for raw in ["{}", r#"{"cards": "not-an-array"}"#, "not json at all"] {
            let error = import_document(&mut repo, raw).unwrap_err();
            assert!(
                matches!(error, ExchangeError::MalformedDocument(_)),
                "expected MalformedDocument for {:?}, got {:?}",
                raw,
                error
            );
            assert_eq!(repo.get_all(), before.as_slice());
        }
    }

    #[test]
    fn test_empty_card_list_imports_zero() {
        let mut repo = CardRepository::new();
        assert_eq!(import_document(&mut repo, r#"{"cards": []}"#).unwrap(), 0);
        assert!(repo.is_empty());
    }

    #[test]
    fn test_import_from_file_round_trip() {
        let mut source = CardRepository::new();
        linked_pair(&mut source);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        export_document(&source).write_to_file(&path).unwrap();

        let mut target = CardRepository::new();
        assert_eq!(import_from_file(&mut target, &path).unwrap(), 2);
    }

    #[test]
    fn test_unreadable_file_reports_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = CardRepository::new();
        let error = import_from_file(&mut repo, &dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(error, ExchangeError::Io(_)));
    }

    #[test]
    fn test_invalid_file_reports_malformed_not_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"{\"cards\": 42}").unwrap();

        let mut repo = CardRepository::new();
        let error = import_from_file(&mut repo, &path).unwrap_err();
        assert!(matches!(error, ExchangeError::MalformedDocument(_)));
    }
}
