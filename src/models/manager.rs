//! Inserting games into a tree and keeping their metadata in place.
//!
//! A game is held at the top of its exclusive line: start at the diagram its
//! last move reaches and walk towards the root while the parent has exactly
//! one child. Insertion maintains this incrementally, deletion and model
//! merges recompute it for every game.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::domain::RawMove;
use crate::error::{Error, ImportError, MergeError};
use crate::models::diagram::{DiagramId, DiagramTree};
use crate::models::metadata::{GameId, GameMetadata, GamesRepository};

/// What a merge did to the target tree
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Id in the target of every incoming diagram
    pub mapping: BTreeMap<DiagramId, DiagramId>,
    /// Target ids of incoming subtrees attached as new branches
    pub grafted: Vec<DiagramId>,
    /// Incoming diagrams skipped because several target siblings matched
    pub conflicts: usize,
}

/// A game moved from one holding diagram to another
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relocation {
    pub game: GameId,
    pub from: DiagramId,
    pub to: DiagramId,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DiagramManager;

impl DiagramManager {
    pub fn new() -> Self {
        Self
    }

    /// Merge `incoming` into `target` at diagram `at`.
    ///
    /// The incoming root must hold the same position as `at`. Annotations and
    /// metadata are united, matching children are merged recursively, and
    /// children without a match are moved over with their whole subtree.
    pub fn merge(
        &self,
        target: &mut DiagramTree,
        at: DiagramId,
        mut incoming: DiagramTree,
    ) -> Result<MergeReport, MergeError> {
        let target_root = target.get(at).ok_or(MergeError::UnknownDiagram(at))?;
        if !target_root.partially_equals(incoming.root()) {
            return Err(MergeError::RootMismatch);
        }

        let mut report = MergeReport::default();
        let mut pending = vec![(at, incoming.root_id())];
        while let Some((into, from)) = pending.pop() {
            report.mapping.insert(from, into);
            copy_data(target, into, &incoming, from);

            for &child in incoming.children_of(from).to_vec().iter() {
                let Some(incoming_child) = incoming.get(child) else {
                    continue;
                };
                let matching: Vec<DiagramId> = target
                    .children_of(into)
                    .iter()
                    .copied()
                    .filter(|&c| target.get(c).is_some_and(|d| d.partially_equals(incoming_child)))
                    .collect();
                match matching.as_slice() {
                    [] => {
                        if let Some(id) =
                            target.graft(into, &mut incoming, child, &mut report.mapping)
                        {
                            debug!("grafted diagram {child} under {into} as {id}");
                            report.grafted.push(id);
                        }
                    }
                    [existing] => pending.push((*existing, child)),
                    _ => {
                        warn!(
                            "diagram {into} has {} children with the position of incoming \
                             diagram {child}; skipped",
                            matching.len()
                        );
                        report.conflicts += 1;
                    }
                }
            }
        }
        Ok(report)
    }

    /// Insert a game given as raw moves from diagram `at`.
    ///
    /// The moves are validated into a separate line first; the shared tree is
    /// only touched once every move is legal.
    pub fn insert(
        &self,
        tree: &mut DiagramTree,
        games: &mut GamesRepository,
        at: DiagramId,
        moves: &[RawMove],
        metadata: GameMetadata,
    ) -> Result<GameId, ImportError> {
        let start = tree.node(at).map_err(ImportError::at_start)?;
        let mut line = DiagramTree::with_root(start.board().clone());
        let mut cursor = line.root_id();
        for (i, &mv) in moves.iter().enumerate() {
            cursor = line
                .make_move(cursor, mv)
                .map_err(|source| ImportError {
                    ply: i + 1,
                    token: mv.to_string(),
                    source,
                })?
                .id();
        }

        let report = self.merge(tree, at, line).map_err(ImportError::at_start)?;
        let terminal = report.mapping.get(&cursor).copied().unwrap_or(at);
        let id = games.register(metadata, terminal);
        if let Some(diagram) = tree.get_mut(terminal) {
            diagram.metadata.insert(id);
        }
        debug!("inserted game {id} ending at diagram {terminal}");
        self.update_metadata(tree, games, terminal);
        Ok(id)
    }

    /// Restore the holding rule after games were added at `node`.
    ///
    /// While the parent has a single child, everything held at `node` moves
    /// up. At a parent with several children the walk stops, and games held
    /// on the path to the root whose line continues below that parent are
    /// pushed down to the parent's child on their line.
    pub fn update_metadata(
        &self,
        tree: &mut DiagramTree,
        games: &mut GamesRepository,
        node: DiagramId,
    ) -> Vec<Relocation> {
        let mut relocations = Vec::new();
        if tree.get(node).is_none_or(|d| d.metadata().is_empty()) {
            warn!("cannot update metadata of diagram {node} without any");
            return relocations;
        }

        let mut current = node;
        while let Some(parent) = tree.parent_of(current) {
            if tree.children_of(parent).len() == 1 {
                let held: Vec<GameId> = tree
                    .get(current)
                    .map(|d| d.metadata().iter().copied().collect())
                    .unwrap_or_default();
                for game in held {
                    relocations.push(move_game(tree, games, game, current, parent));
                }
                current = parent;
            } else {
                relocations.extend(self.push_down_from_path(tree, games, parent));
                break;
            }
        }
        relocations
    }

    /// The brother rule: `divergence` just gained a sibling branch, so games
    /// held at or above it that end strictly below it must leave the path.
    fn push_down_from_path(
        &self,
        tree: &mut DiagramTree,
        games: &mut GamesRepository,
        divergence: DiagramId,
    ) -> Vec<Relocation> {
        let path = tree.path_to(divergence);
        let mut relocations = Vec::new();
        for &holder in &path {
            let held: Vec<GameId> = tree
                .get(holder)
                .map(|d| d.metadata().iter().copied().collect())
                .unwrap_or_default();
            for game in held {
                let Some(terminal) = games.terminal_of(game) else {
                    continue;
                };
                if terminal == divergence || !tree.is_ancestor(divergence, terminal) {
                    continue;
                }
                let branch = tree
                    .path_to(terminal)
                    .get(path.len())
                    .copied()
                    .unwrap_or(terminal);
                relocations.push(move_game(tree, games, game, holder, branch));
            }
        }
        relocations
    }

    /// Where `terminal`'s game belongs under the holding rule
    pub fn holder_for(&self, tree: &DiagramTree, terminal: DiagramId) -> DiagramId {
        let mut holder = terminal;
        while let Some(parent) = tree.parent_of(holder) {
            if tree.children_of(parent).len() != 1 {
                break;
            }
            holder = parent;
        }
        holder
    }

    /// Move every listed game to the holder the rule gives it
    pub fn rebalance(
        &self,
        tree: &mut DiagramTree,
        games: &mut GamesRepository,
        ids: impl IntoIterator<Item = GameId>,
    ) -> Vec<Relocation> {
        let mut relocations = Vec::new();
        for game in ids {
            let Some(record) = games.get(game) else {
                continue;
            };
            let (from, terminal) = (record.holder, record.terminal);
            let to = self.holder_for(tree, terminal);
            if from != to {
                relocations.push(move_game(tree, games, game, from, to));
            }
        }
        relocations
    }

    /// Delete the subtree at `id` together with the games ending inside it
    pub fn delete(
        &self,
        tree: &mut DiagramTree,
        games: &mut GamesRepository,
        id: DiagramId,
    ) -> Result<Vec<GameId>, Error> {
        let removed = tree.delete(id)?;
        let mut dropped = Vec::new();
        for diagram in &removed {
            for game in games.ending_at(diagram.id()) {
                if let Some(record) = games.remove(game) {
                    if let Some(holder) = tree.get_mut(record.holder) {
                        holder.metadata.remove(&game);
                    }
                    dropped.push(game);
                }
            }
        }
        debug!(
            "deleted {} diagrams from {id} and {} games",
            removed.len(),
            dropped.len()
        );
        let remaining: Vec<GameId> = games.ids().collect();
        self.rebalance(tree, games, remaining);
        Ok(dropped)
    }
}

fn copy_data(target: &mut DiagramTree, into: DiagramId, incoming: &DiagramTree, from: DiagramId) {
    let (Some(source), Some(destination)) = (incoming.get(from), target.get_mut(into)) else {
        return;
    };
    destination.annotations_mut().union(source.annotations());
    destination.metadata.extend(source.metadata().iter().copied());
}

fn move_game(
    tree: &mut DiagramTree,
    games: &mut GamesRepository,
    game: GameId,
    from: DiagramId,
    to: DiagramId,
) -> Relocation {
    if let Some(d) = tree.get_mut(from) {
        d.metadata.remove(&game);
    }
    if let Some(d) = tree.get_mut(to) {
        d.metadata.insert(game);
    }
    games.relocate(game, to);
    debug!("game {game} moved from diagram {from} to {to}");
    Relocation { game, from, to }
}
