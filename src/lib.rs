//! deckforge — card repository and exchange core for a worldbuilding
//! organizer.
//!
//! Narrative content is organized as cards of three kinds (event, location,
//! character) with typed cross-references between them: locations reference
//! adjacent locations and present characters, characters reference bonds to
//! other characters. The crate owns the in-memory collection and its
//! referential integrity, plus the versioned JSON export/import used as the
//! only durability mechanism. Rendering is someone else's problem: a
//! presentation layer calls into [`CardRepository`] and [`exchange`] and
//! draws the results.
//!
//! The repository is a plain owned value, not a global; the composition root
//! decides who holds it. All operations are synchronous and single-actor.

pub mod cards;
pub mod exchange;

pub use cards::{
    Card, CardDetails, CardDraft, CardId, CardKind, CardPatch, CardRepository, CharacterDetails,
    DetailsPatch, EventDetails, LocationDetails,
};
pub use exchange::{export_document, import_document, ExchangeDocument, ExchangeError};
