//! Card data models
//!
//! A card is the single unit of narrative content: an event, a location, or a
//! character. The card kind is fixed at creation and carried as a serde tag so
//! the exported JSON stays flat (`"type": "location"` next to the common
//! fields).

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default focal point for an attached image, in percent.
pub const DEFAULT_IMAGE_POSITION: f64 = 50.0;

/// Opaque card identifier.
///
/// Ids are plain strings rather than UUIDs: imported documents may carry ids
/// minted elsewhere, and references to ids outside an import batch are kept
/// verbatim, so the type cannot assume any particular format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    /// Mint a fresh id: millisecond timestamp prefix plus a random suffix.
    ///
    /// Unique within the process lifetime with overwhelming probability; the
    /// repository still double-checks against its live collection.
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        Self(format!("{:x}-{}", millis, Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CardId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CardId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The closed set of card kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Event,
    Location,
    Character,
}

/// Fields specific to event cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequences: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<String>,
}

/// Fields specific to location cards.
///
/// Reference lists hold raw card ids. The repository never checks that a
/// referenced card has the kind the field name suggests; the delete cascade
/// is the only integrity guarantee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDetails {
    #[serde(default)]
    pub adjacent_locations: Vec<CardId>,
    #[serde(default)]
    pub present_characters: Vec<CardId>,
}

/// Fields specific to character cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appearance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<String>,
    #[serde(default)]
    pub bonds: Vec<CardId>,
}

/// Kind-specific card payload, tagged on `"type"` and flattened into the card
/// object so the wire format matches the exported document shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CardDetails {
    Event(EventDetails),
    Location(LocationDetails),
    Character(CharacterDetails),
}

impl CardDetails {
    /// Empty payload for the given kind.
    pub fn empty(kind: CardKind) -> Self {
        match kind {
            CardKind::Event => Self::Event(EventDetails::default()),
            CardKind::Location => Self::Location(LocationDetails::default()),
            CardKind::Character => Self::Character(CharacterDetails::default()),
        }
    }

    pub fn kind(&self) -> CardKind {
        match self {
            Self::Event(_) => CardKind::Event,
            Self::Location(_) => CardKind::Location,
            Self::Character(_) => CardKind::Character,
        }
    }

    /// All id-bearing reference lists of this payload.
    pub(crate) fn reference_lists_mut(&mut self) -> Vec<&mut Vec<CardId>> {
        match self {
            Self::Event(_) => Vec::new(),
            Self::Location(details) => vec![
                &mut details.adjacent_locations,
                &mut details.present_characters,
            ],
            Self::Character(details) => vec![&mut details.bonds],
        }
    }

    /// Drop every occurrence of `id` from the reference lists. Returns how
    /// many entries were removed.
    pub(crate) fn strip_reference(&mut self, id: &CardId) -> usize {
        let mut removed = 0;
        for list in self.reference_lists_mut() {
            let before = list.len();
            list.retain(|referenced| referenced != id);
            removed += before - list.len();
        }
        removed
    }

    /// Rewrite every reference through the old→new id map. Ids absent from
    /// the map are kept as-is (references to cards outside an import batch
    /// pass through untouched).
    pub(crate) fn remap_references(&mut self, id_map: &HashMap<CardId, CardId>) {
        for list in self.reference_lists_mut() {
            for referenced in list.iter_mut() {
                if let Some(new_id) = id_map.get(referenced) {
                    *referenced = new_id.clone();
                }
            }
        }
    }

    fn apply_patch(&mut self, patch: DetailsPatch) {
        // A patch for another kind never re-types the card; it is ignored.
        match (self, patch) {
            (Self::Event(details), DetailsPatch::Event { consequences, hooks }) => {
                if let Some(consequences) = consequences {
                    details.consequences = Some(consequences);
                }
                if let Some(hooks) = hooks {
                    details.hooks = Some(hooks);
                }
            }
            (
                Self::Location(details),
                DetailsPatch::Location {
                    adjacent_locations,
                    present_characters,
                },
            ) => {
                if let Some(adjacent_locations) = adjacent_locations {
                    details.adjacent_locations = adjacent_locations;
                }
                if let Some(present_characters) = present_characters {
                    details.present_characters = present_characters;
                }
            }
            (
                Self::Character(details),
                DetailsPatch::Character {
                    occupation,
                    age,
                    appearance,
                    personality,
                    history,
                    secrets,
                    bonds,
                },
            ) => {
                if let Some(occupation) = occupation {
                    details.occupation = Some(occupation);
                }
                if let Some(age) = age {
                    details.age = Some(age);
                }
                if let Some(appearance) = appearance {
                    details.appearance = Some(appearance);
                }
                if let Some(personality) = personality {
                    details.personality = Some(personality);
                }
                if let Some(history) = history {
                    details.history = Some(history);
                }
                if let Some(secrets) = secrets {
                    details.secrets = Some(secrets);
                }
                if let Some(bonds) = bonds {
                    details.bonds = bonds;
                }
            }
            _ => {}
        }
    }
}

/// A single card.
///
/// Deserialization goes through [`CardWire`] so legacy documents with the
/// single-axis `imagePosition` field are normalized on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CardWire")]
pub struct Card {
    pub id: CardId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Encoded image payload, carried opaquely; never decoded here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Horizontal focal point of the image, 0–100 percent.
    pub image_position_x: f64,
    /// Vertical focal point of the image, 0–100 percent.
    pub image_position_y: f64,
    #[serde(flatten)]
    pub details: CardDetails,
}

impl Card {
    pub fn kind(&self) -> CardKind {
        self.details.kind()
    }

    pub(crate) fn apply_patch(&mut self, patch: CardPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(image) = patch.image {
            self.image = Some(image);
        }
        if let Some(x) = patch.image_position_x {
            self.image_position_x = x;
        }
        if let Some(y) = patch.image_position_y {
            self.image_position_y = y;
        }
        if let Some(details) = patch.details {
            self.details.apply_patch(details);
        }
    }
}

/// Raw card shape as read from a document, before image-position
/// normalization.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardWire {
    id: CardId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    updated_at: DateTime<Utc>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    image_position_x: Option<f64>,
    #[serde(default)]
    image_position_y: Option<f64>,
    /// Legacy single-axis focal point: `"top"`, `"bottom"`, or a number.
    #[serde(default)]
    image_position: Option<serde_json::Value>,
    #[serde(flatten)]
    details: CardDetails,
}

impl From<CardWire> for Card {
    fn from(wire: CardWire) -> Self {
        let legacy_y = wire.image_position.as_ref().map(legacy_position_y);
        Self {
            id: wire.id,
            name: wire.name,
            description: wire.description,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
            image: wire.image,
            image_position_x: wire.image_position_x.unwrap_or(DEFAULT_IMAGE_POSITION),
            image_position_y: wire
                .image_position_y
                .or(legacy_y)
                .unwrap_or(DEFAULT_IMAGE_POSITION),
            details: wire.details,
        }
    }
}

/// Map the legacy `imagePosition` value onto the vertical axis.
fn legacy_position_y(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::String(text) => match text.as_str() {
            "top" => 0.0,
            "bottom" => 100.0,
            other => other.parse().unwrap_or(DEFAULT_IMAGE_POSITION),
        },
        serde_json::Value::Number(number) => {
            number.as_f64().unwrap_or(DEFAULT_IMAGE_POSITION)
        }
        _ => DEFAULT_IMAGE_POSITION,
    }
}

/// Caller-supplied fields for a new card. The repository fills in the id and
/// timestamps; everything else is taken verbatim, with no validation.
#[derive(Debug, Clone)]
pub struct CardDraft {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub image_position_x: f64,
    pub image_position_y: f64,
    pub details: CardDetails,
}

impl CardDraft {
    pub fn new(name: String, kind: CardKind) -> Self {
        Self {
            name,
            description: None,
            image: None,
            image_position_x: DEFAULT_IMAGE_POSITION,
            image_position_y: DEFAULT_IMAGE_POSITION,
            details: CardDetails::empty(kind),
        }
    }
}

/// Partial update for a card: present fields replace the stored values,
/// absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_position_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_position_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<DetailsPatch>,
}

/// Partial update for the kind-specific payload. The variant must match the
/// card's kind; a mismatched patch leaves the payload untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum DetailsPatch {
    Event {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        consequences: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hooks: Option<String>,
    },
    Location {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        adjacent_locations: Option<Vec<CardId>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        present_characters: Option<Vec<CardId>>,
    },
    Character {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        occupation: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        age: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        appearance: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        personality: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        history: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secrets: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bonds: Option<Vec<CardId>>,
    },
}
