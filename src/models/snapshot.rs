//! Serializable picture of a whole model.
//!
//! Moves are stored in coordinate notation and replayed through the validator
//! on load, so a snapshot that describes an illegal game is rejected instead of
//! being half loaded.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result, bail, ensure};
use schemars::{JsonSchema, Schema, schema_for};
use serde::{Deserialize, Serialize};

use crate::domain::{ChessBoard, RawMove};
use crate::models::annotations::Annotations;
use crate::models::diagram::{DiagramId, DiagramTree, MoveOutcome};
use crate::models::manager::DiagramManager;
use crate::models::metadata::{GameId, GameMetadata, GameRecord, GamesRepository};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelSnapshot {
    /// Position of the root diagram
    pub start_fen: String,
    pub root: NodeSnapshot,
    #[serde(default)]
    pub games: Vec<GameSnapshot>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeSnapshot {
    /// Creating move as `e2e4` / `e7e8q`; absent on the root
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    pub mv: Option<String>,
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
    /// Games held at this diagram
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub held: Vec<GameId>,
    /// Games whose last move reaches this diagram
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ending: Vec<GameId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GameSnapshot {
    pub id: GameId,
    #[serde(default)]
    pub metadata: GameMetadata,
}

impl ModelSnapshot {
    pub fn capture(tree: &DiagramTree, games: &GamesRepository) -> Self {
        Self {
            start_fen: tree.root().board().to_fen(),
            root: capture_node(tree, games, tree.root_id()),
            games: games
                .iter()
                .map(|(id, record)| GameSnapshot {
                    id,
                    metadata: record.metadata.clone(),
                })
                .collect(),
        }
    }

    /// Rebuild tree and repository, replaying every move
    pub fn restore(&self) -> Result<(DiagramTree, GamesRepository)> {
        let board = ChessBoard::from_fen(&self.start_fen)
            .with_context(|| format!("invalid start position `{}`", self.start_fen))?;
        let mut tree = DiagramTree::with_root(board);
        let mut terminals = BTreeMap::new();
        let mut holders = BTreeMap::new();

        let mut pending = vec![(tree.root_id(), &self.root)];
        while let Some((id, node)) = pending.pop() {
            *tree.annotations_mut(id)? = node.annotations.clone();
            for &game in &node.ending {
                ensure!(terminals.insert(game, id).is_none(), "game {game} ends twice");
            }
            for &game in &node.held {
                ensure!(holders.insert(game, id).is_none(), "game {game} is held twice");
            }
            for child in &node.children {
                let notation = child
                    .mv
                    .as_deref()
                    .with_context(|| format!("a child of diagram {id} has no move"))?;
                let mv: RawMove = notation.parse()?;
                let outcome = tree
                    .make_move(id, mv)
                    .with_context(|| format!("cannot replay `{notation}` on diagram {id}"))?;
                let MoveOutcome::Created(child_id) = outcome else {
                    bail!("move `{notation}` appears twice below diagram {id}");
                };
                pending.push((child_id, child));
            }
        }

        let mut games = GamesRepository::new();
        let known: BTreeSet<GameId> = self.games.iter().map(|g| g.id).collect();
        ensure!(known.len() == self.games.len(), "duplicate game ids");
        for game in &self.games {
            let terminal = *terminals
                .get(&game.id)
                .with_context(|| format!("game {} has no terminal diagram", game.id))?;
            let holder = *holders
                .get(&game.id)
                .with_context(|| format!("game {} is not held anywhere", game.id))?;
            ensure!(
                tree.is_ancestor(holder, terminal),
                "game {} is held off its own line",
                game.id
            );
            if let Some(diagram) = tree.get_mut(holder) {
                diagram.metadata.insert(game.id);
            }
            let record = GameRecord {
                metadata: game.metadata.clone(),
                terminal,
                holder,
            };
            ensure!(games.restore(game.id, record), "game id {} is out of range", game.id);
        }
        if let Some(stray) = terminals.keys().chain(holders.keys()).find(|id| !known.contains(id)) {
            bail!("diagram refers to unknown game {stray}");
        }

        let all: Vec<GameId> = games.ids().collect();
        DiagramManager::new().rebalance(&mut tree, &mut games, all);
        Ok((tree, games))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing model snapshot")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("parsing model snapshot")
    }

    pub fn json_schema() -> Schema {
        schema_for!(ModelSnapshot)
    }
}

fn capture_node(tree: &DiagramTree, games: &GamesRepository, id: DiagramId) -> NodeSnapshot {
    let Some(diagram) = tree.get(id) else {
        return NodeSnapshot::default();
    };
    NodeSnapshot {
        mv: diagram.creating_move().map(|mv| mv.raw().to_string()),
        annotations: diagram.annotations().clone(),
        held: diagram.metadata().iter().copied().collect(),
        ending: games.ending_at(id),
        children: diagram
            .children()
            .iter()
            .map(|&child| capture_node(tree, games, child))
            .collect(),
    }
}
