//! Player directory lookups.
//!
//! The board never owns player data. Player markers hold only a
//! [`PlayerId`]; everything drawn next to them (the jersey number) is looked
//! up through a [`PlayerDirectory`] at placement and render time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::element::PlayerId;
use crate::error::TacticsResult;

/// The subset of a player record the board needs for decoration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCard {
    /// Directory identifier.
    pub id: PlayerId,
    /// Jersey number, if one has been assigned.
    #[serde(default)]
    pub display_number: Option<u32>,
    /// Name shown in pickers.
    pub display_name: String,
    /// Path or URI of the player's photo.
    #[serde(default)]
    pub photo_ref: Option<String>,
}

impl PlayerCard {
    /// Label drawn next to the marker: the jersey number, or `?`.
    #[must_use]
    pub fn jersey_label(&self) -> String {
        self.display_number
            .map_or_else(|| "?".to_string(), |n| n.to_string())
    }
}

/// Read access to the club's player records.
pub trait PlayerDirectory {
    /// Look up a player by id.
    fn lookup(&self, id: PlayerId) -> Option<PlayerCard>;
}

impl<T: PlayerDirectory + ?Sized> PlayerDirectory for &T {
    fn lookup(&self, id: PlayerId) -> Option<PlayerCard> {
        (**self).lookup(id)
    }
}

/// A directory backed by a map, for tests and file-based tooling.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    players: HashMap<PlayerId, PlayerCard>,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a player.
    pub fn insert(&mut self, card: PlayerCard) {
        self.players.insert(card.id, card);
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with_player(mut self, id: PlayerId, number: Option<u32>, name: &str) -> Self {
        self.insert(PlayerCard {
            id,
            display_number: number,
            display_name: name.to_string(),
            photo_ref: None,
        });
        self
    }

    /// Number of players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Load a directory from a JSON array of [`PlayerCard`]s.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not an array of player cards.
    pub fn from_json(json: &str) -> TacticsResult<Self> {
        let cards: Vec<PlayerCard> = serde_json::from_str(json)?;
        let mut directory = Self::new();
        for card in cards {
            directory.insert(card);
        }
        Ok(directory)
    }
}

impl PlayerDirectory for InMemoryDirectory {
    fn lookup(&self, id: PlayerId) -> Option<PlayerCard> {
        self.players.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jersey_label() {
        let dir = InMemoryDirectory::new()
            .with_player(1, Some(9), "Striker")
            .with_player(2, None, "Trialist");
        assert_eq!(dir.lookup(1).expect("present").jersey_label(), "9");
        assert_eq!(dir.lookup(2).expect("present").jersey_label(), "?");
        assert!(dir.lookup(3).is_none());
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"id": 4, "display_number": 4, "display_name": "Centre Back"},
            {"id": 7, "display_name": "Winger", "photo_ref": "photos/7.png"}
        ]"#;
        let dir = InMemoryDirectory::from_json(json).expect("parse");
        assert_eq!(dir.len(), 2);
        let winger = dir.lookup(7).expect("present");
        assert_eq!(winger.display_number, None);
        assert_eq!(winger.photo_ref.as_deref(), Some("photos/7.png"));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(InMemoryDirectory::from_json("{\"id\": 1}").is_err());
    }
}
