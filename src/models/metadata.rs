//! Per-game descriptors and the index from games to their diagrams.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::diagram::{DiagramId, DiagramTree};

/// Key of a game inside one [`GamesRepository`]
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The seven-tag roster of a game plus any other tags it carried
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GameMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub black: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl GameMetadata {
    /// Build from PGN tag pairs; a repeated tag keeps its last value
    pub fn from_tags(tags: &[(String, String)]) -> Self {
        let mut metadata = Self::default();
        for (name, value) in tags {
            let value = Some(value.clone());
            match name.as_str() {
                "Event" => metadata.event = value,
                "Site" => metadata.site = value,
                "Date" => metadata.date = value,
                "Round" => metadata.round = value,
                "White" => metadata.white = value,
                "Black" => metadata.black = value,
                "Result" => metadata.result = value,
                _ => {
                    metadata.extra.insert(name.clone(), value.unwrap_or_default());
                }
            }
        }
        metadata
    }

    /// "White - Black", with `?` for a missing name
    pub fn title(&self) -> String {
        format!(
            "{} - {}",
            self.white.as_deref().unwrap_or("?"),
            self.black.as_deref().unwrap_or("?")
        )
    }
}

/// Where one game lives in the tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameRecord {
    pub metadata: GameMetadata,
    /// Diagram reached by the game's last move
    pub terminal: DiagramId,
    /// Diagram whose metadata set currently holds the game
    pub holder: DiagramId,
}

/// Index of every game in a model.
///
/// Ids are handed out in increasing order and never reused.
#[derive(Clone, Debug, Default)]
pub struct GamesRepository {
    games: BTreeMap<GameId, GameRecord>,
    next_id: u64,
}

impl GamesRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a game that is held at its terminal diagram
    pub fn register(&mut self, metadata: GameMetadata, terminal: DiagramId) -> GameId {
        let id = GameId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.games.insert(
            id,
            GameRecord {
                metadata,
                terminal,
                holder: terminal,
            },
        );
        id
    }

    /// Re-insert a game under a known id, as when loading a snapshot.
    ///
    /// Returns `false` and keeps the repository unchanged when no id would be
    /// left to hand out after `id`.
    pub(crate) fn restore(&mut self, id: GameId, record: GameRecord) -> bool {
        let Some(next) = id.0.checked_add(1) else {
            return false;
        };
        self.next_id = self.next_id.max(next);
        self.games.insert(id, record);
        true
    }

    pub fn get(&self, id: GameId) -> Option<&GameRecord> {
        self.games.get(&id)
    }

    pub fn metadata(&self, id: GameId) -> Option<&GameMetadata> {
        self.get(id).map(|record| &record.metadata)
    }

    pub fn terminal_of(&self, id: GameId) -> Option<DiagramId> {
        self.get(id).map(|record| record.terminal)
    }

    pub fn holder_of(&self, id: GameId) -> Option<DiagramId> {
        self.get(id).map(|record| record.holder)
    }

    /// Every game whose metadata equals `metadata`, oldest first
    pub fn find(&self, metadata: &GameMetadata) -> Vec<GameId> {
        self.games
            .iter()
            .filter(|(_, record)| &record.metadata == metadata)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Games whose last move reaches `diagram`
    pub fn ending_at(&self, diagram: DiagramId) -> Vec<GameId> {
        self.games
            .iter()
            .filter(|(_, record)| record.terminal == diagram)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Games whose line from the root runs through `diagram`
    pub fn passing_through(&self, tree: &DiagramTree, diagram: DiagramId) -> Vec<GameId> {
        self.games
            .iter()
            .filter(|(_, record)| tree.is_ancestor(diagram, record.terminal))
            .map(|(&id, _)| id)
            .collect()
    }

    pub(crate) fn relocate(&mut self, id: GameId, holder: DiagramId) {
        if let Some(record) = self.games.get_mut(&id) {
            record.holder = holder;
        }
    }

    pub(crate) fn remove(&mut self, id: GameId) -> Option<GameRecord> {
        self.games.remove(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = GameId> + '_ {
        self.games.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GameId, &GameRecord)> + '_ {
        self.games.iter().map(|(&id, record)| (id, record))
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_tags() {
        let metadata = GameMetadata::from_tags(&tags(&[
            ("Event", "Casual"),
            ("White", "Morphy"),
            ("Black", "Duke"),
            ("Result", "1-0"),
            ("ECO", "C41"),
        ]));
        assert_eq!(metadata.event.as_deref(), Some("Casual"));
        assert_eq!(metadata.result.as_deref(), Some("1-0"));
        assert_eq!(metadata.extra.get("ECO").map(String::as_str), Some("C41"));
        assert_eq!(metadata.site, None);
        assert_eq!(metadata.title(), "Morphy - Duke");
    }

    #[test]
    fn test_register_and_lookup() {
        let mut games = GamesRepository::new();
        let morphy = GameMetadata {
            white: Some("Morphy".into()),
            ..Default::default()
        };
        let a = games.register(morphy.clone(), 3);
        let b = games.register(GameMetadata::default(), 5);
        let c = games.register(morphy.clone(), 3);
        assert_eq!((a, b, c), (GameId(0), GameId(1), GameId(2)));
        assert_eq!(games.find(&morphy), vec![a, c]);
        assert_eq!(games.ending_at(3), vec![a, c]);
        assert_eq!(games.holder_of(b), Some(5));

        games.relocate(b, 2);
        assert_eq!(games.holder_of(b), Some(2));
        assert_eq!(games.terminal_of(b), Some(5));

        games.remove(a);
        let d = games.register(GameMetadata::default(), 1);
        assert_eq!(d, GameId(3));
        assert_eq!(games.len(), 3);
    }

    #[test]
    fn test_metadata_json_skips_missing_tags() {
        let metadata = GameMetadata {
            white: Some("Tal".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&metadata).unwrap(), r#"{"white":"Tal"}"#);
        assert_eq!(GameId(7).to_string(), "#7");
    }
}
