//! In-memory card repository
//!
//! Owns the card collection and all identity bookkeeping: creation, partial
//! update, deletion with cascading reference cleanup, lookup, filtering,
//! search, and the bounded navigation history. Everything is synchronous and
//! single-actor; the composition root owns the instance and hands it to
//! whatever renders it.

use std::collections::VecDeque;

use chrono::Utc;

use super::models::{Card, CardDraft, CardId, CardKind, CardPatch};

/// Maximum number of entries kept in the navigation history.
const HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Default)]
pub struct CardRepository {
    /// Insertion order is the display fallback order.
    cards: Vec<Card>,
    history: VecDeque<CardId>,
}

impl CardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Card Operations =====

    /// Create a card from the draft, minting a fresh id and stamping both
    /// timestamps. Permissive: the draft is taken as-is, name validation is
    /// the caller's duty.
    pub fn create(&mut self, draft: CardDraft) -> Card {
        let now = Utc::now();
        let card = Card {
            id: self.mint_id(),
            name: draft.name,
            description: draft.description,
            created_at: now,
            updated_at: now,
            image: draft.image,
            image_position_x: draft.image_position_x,
            image_position_y: draft.image_position_y,
            details: draft.details,
        };

        self.cards.push(card.clone());
        card
    }

    /// Append a fully-built card as-is (used by import, which has already
    /// remapped ids and timestamps).
    pub(crate) fn insert(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Fresh id, re-rolled on the astronomically unlikely in-session clash.
    fn mint_id(&self) -> CardId {
        loop {
            let id = CardId::generate();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    /// Shallow-merge the patch into the card and refresh `updated_at`.
    /// Returns `None` when no card has this id.
    pub fn update(&mut self, id: &CardId, patch: CardPatch) -> Option<Card> {
        let card = self.cards.iter_mut().find(|card| card.id == *id)?;
        card.apply_patch(patch);
        card.updated_at = Utc::now();
        Some(card.clone())
    }

    /// Remove the card and strip its id from every remaining card's
    /// reference lists. Returns whether a card was removed.
    ///
    /// The cascade is the repository's only consistency guarantee: without it
    /// a deleted id would linger in `adjacentLocations`, `presentCharacters`,
    /// or `bonds` and break lookups downstream.
    pub fn delete(&mut self, id: &CardId) -> bool {
        let position = match self.cards.iter().position(|card| card.id == *id) {
            Some(position) => position,
            None => return false,
        };
        self.cards.remove(position);

        let mut stripped = 0;
        for card in self.cards.iter_mut() {
            stripped += card.details.strip_reference(id);
        }
        if stripped > 0 {
            log::debug!("Deleted card {}: stripped {} inbound references", id, stripped);
        }

        true
    }

    pub fn get(&self, id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == *id)
    }

    /// All cards of the given kind, in collection order.
    pub fn get_by_kind(&self, kind: CardKind) -> Vec<&Card> {
        self.cards.iter().filter(|card| card.kind() == kind).collect()
    }

    /// All cards, in collection order.
    pub fn get_all(&self) -> &[Card] {
        &self.cards
    }

    /// Case-insensitive substring match against name or description.
    ///
    /// An empty query matches everything here; callers that want "no query
    /// means unfiltered" must short-circuit to [`get_all`](Self::get_all)
    /// themselves.
    pub fn search(&self, query: &str) -> Vec<&Card> {
        let needle = query.to_lowercase();
        self.cards
            .iter()
            .filter(|card| {
                card.name.to_lowercase().contains(&needle)
                    || card
                        .description
                        .as_ref()
                        .is_some_and(|description| description.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    // ===== Navigation History =====

    /// Record a viewed card id. Once over capacity the oldest entry is
    /// discarded first, so the stack always holds the most recent 20.
    pub fn push_history(&mut self, id: CardId) {
        self.history.push_back(id);
        while self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }
    }

    /// Pop the most recently viewed card id, if any.
    pub fn pop_history(&mut self) -> Option<CardId> {
        self.history.pop_back()
    }
}
