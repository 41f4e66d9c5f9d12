//! Game database model - the application layer over the diagram tree.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::config::ImportConfig;
use crate::domain::pgn::{self, PgnGame};
use crate::domain::san;
use crate::domain::{ChessBoard, PendingPromotion, PieceKind, RawMove, ValidMove};
use crate::error::{Error, ImportError, MergeError, MoveError, Result};
use crate::models::diagram::{Diagram, DiagramId, DiagramTree, MoveOutcome};
use crate::models::manager::DiagramManager;
use crate::models::metadata::{GameId, GameMetadata, GamesRepository};
use crate::models::snapshot::ModelSnapshot;

/// Outcome of importing a PGN collection
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<GameId>,
    /// Index of the game in the collection and why it failed
    pub failed: Vec<(usize, ImportError)>,
}

/// The main model: a tree of diagrams, the games in it and a cursor
#[derive(Debug)]
pub struct DataModel {
    tree: DiagramTree,
    games: GamesRepository,
    manager: DiagramManager,
    /// The currently viewed diagram
    current: DiagramId,
    /// A promotion played at the cursor that still needs its piece
    pending: Option<PendingPromotion>,
    config: ImportConfig,
}

impl DataModel {
    pub fn new() -> Self {
        Self::from_parts(DiagramTree::new(), GamesRepository::new())
    }

    /// Empty model whose root is the configured start position
    pub fn with_config(config: ImportConfig) -> anyhow::Result<Self> {
        let tree = DiagramTree::with_root(config.start_board()?);
        Ok(Self {
            config,
            ..Self::from_parts(tree, GamesRepository::new())
        })
    }

    fn from_parts(tree: DiagramTree, games: GamesRepository) -> Self {
        Self {
            current: tree.root_id(),
            tree,
            games,
            manager: DiagramManager::new(),
            pending: None,
            config: ImportConfig::default(),
        }
    }

    pub fn tree(&self) -> &DiagramTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DiagramTree {
        &mut self.tree
    }

    pub fn games(&self) -> &GamesRepository {
        &self.games
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ImportConfig) {
        self.config = config;
    }

    /// Get the current diagram id
    pub fn current_id(&self) -> DiagramId {
        self.current
    }

    /// Get the currently viewed diagram
    pub fn current(&self) -> &Diagram {
        self.tree
            .get(self.current)
            .unwrap_or_else(|| self.tree.root())
    }

    /// Get the currently viewed position
    pub fn current_board(&self) -> &ChessBoard {
        self.current().board()
    }

    /// Check if we're at the root (starting position)
    pub fn is_at_root(&self) -> bool {
        self.current == self.tree.root_id()
    }

    /// Check if we're at a leaf (no continuation yet)
    pub fn is_at_leaf(&self) -> bool {
        !self.current().has_children()
    }

    /// Navigate to a specific diagram
    pub fn go_to(&mut self, id: DiagramId) -> bool {
        if self.tree.contains(id) {
            self.set_current(id);
            true
        } else {
            false
        }
    }

    /// Go to the starting position
    pub fn go_to_root(&mut self) {
        self.set_current(self.tree.root_id());
    }

    /// Go back one move
    pub fn go_back(&mut self) -> bool {
        match self.current().parent() {
            Some(parent) => {
                self.set_current(parent);
                true
            }
            None => false,
        }
    }

    /// Go forward one move (main line)
    pub fn go_forward(&mut self) -> bool {
        match self.current().main_line_child() {
            Some(child) => {
                self.set_current(child);
                true
            }
            None => false,
        }
    }

    /// Go to the end of the main line from the current diagram
    pub fn go_to_end(&mut self) {
        while self.go_forward() {}
    }

    fn set_current(&mut self, id: DiagramId) {
        if id != self.current {
            self.pending = None;
        }
        self.current = id;
    }

    /// Play a move at the cursor and move into the resulting diagram.
    ///
    /// A pawn reaching the last rank without a piece is kept as the pending
    /// promotion and reported as [`MoveError::PromotionPending`]; nothing is
    /// added until [`DataModel::resolve_promotion`] supplies the piece.
    pub fn make_move(&mut self, mv: RawMove) -> Result<MoveOutcome> {
        match self.tree.make_move(self.current, mv) {
            Ok(outcome) => {
                self.set_current(outcome.id());
                self.pending = None;
                Ok(outcome)
            }
            Err(Error::Move(MoveError::PromotionPending(pending))) => {
                self.pending = Some(pending.clone());
                Err(MoveError::PromotionPending(pending).into())
            }
            Err(e) => Err(e),
        }
    }

    /// Parse a short algebraic token against the cursor and play it
    pub fn make_move_san(&mut self, token: &str) -> Result<MoveOutcome> {
        let mv = san::parse(token, self.current_board())?;
        self.make_move(mv)
    }

    pub fn pending_promotion(&self) -> Option<&PendingPromotion> {
        self.pending.as_ref()
    }

    /// Finish the pending promotion with `kind` and play it
    pub fn resolve_promotion(&mut self, kind: PieceKind) -> Result<MoveOutcome> {
        let pending = self.pending.as_ref().ok_or(Error::NoPendingPromotion)?;
        let valid = pending.with_piece_kind(kind)?;
        let outcome = self.tree.play(self.current, valid)?;
        self.pending = None;
        self.set_current(outcome.id());
        Ok(outcome)
    }

    pub fn cancel_promotion(&mut self) -> Option<PendingPromotion> {
        self.pending.take()
    }

    /// Every legal move at the cursor
    pub fn legal_moves(&self) -> Vec<ValidMove> {
        self.current_board().all_possible_valid_moves()
    }

    /// SAN of the moves leading to the cursor
    pub fn history(&self) -> Vec<String> {
        self.tree.san_history(self.current)
    }

    /// End of the single line from `id`; `None` when it branches
    pub fn last_of_line(&self, id: DiagramId) -> Option<DiagramId> {
        self.tree.last_of_line(id)
    }

    /// Games held at `id`
    pub fn games_at(&self, id: DiagramId) -> Vec<GameId> {
        self.tree
            .get(id)
            .map(|d| d.metadata().iter().copied().collect())
            .unwrap_or_default()
    }

    /// Games whose line runs through `id`
    pub fn games_through(&self, id: DiagramId) -> Vec<GameId> {
        self.games.passing_through(&self.tree, id)
    }

    /// Delete the subtree at `id` with the games ending in it.
    ///
    /// A cursor inside the deleted subtree moves to its parent.
    pub fn delete(&mut self, id: DiagramId) -> Result<Vec<GameId>> {
        let parent = self.tree.node(id)?.parent().ok_or(Error::DeleteRoot)?;
        let cursor_inside = self.tree.is_ancestor(id, self.current);
        let dropped = self.manager.delete(&mut self.tree, &mut self.games, id)?;
        if cursor_inside {
            self.set_current(parent);
        }
        Ok(dropped)
    }

    /// Insert a game from the root, given as SAN tokens.
    ///
    /// Tokens are parsed against the position they are played on; a promotion
    /// without a piece takes the configured default.
    pub fn import_moves<S: AsRef<str>>(
        &mut self,
        tokens: &[S],
        metadata: GameMetadata,
    ) -> std::result::Result<GameId, ImportError> {
        let root = self.tree.root_id();
        let mut board = self.tree.root().board().clone();
        let mut moves = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            let token = token.as_ref();
            let fail = |source: Error| ImportError {
                ply: i + 1,
                token: token.to_string(),
                source,
            };
            let raw = san::parse(token, &board).map_err(|e| fail(e.into()))?;
            let valid = match (board.validate(raw), self.config.default_promotion) {
                (Ok(valid), _) => valid,
                (Err(MoveError::PromotionPending(pending)), Some(kind)) => {
                    pending.with_piece_kind(kind).map_err(|e| fail(e.into()))?
                }
                (Err(e), _) => return Err(fail(e.into())),
            };
            board = board.play(&valid).map_err(|e| fail(e.into()))?;
            moves.push(valid.raw());
        }
        let id = self
            .manager
            .insert(&mut self.tree, &mut self.games, root, &moves, metadata)?;
        info!("imported game {id} with {} moves", moves.len());
        Ok(id)
    }

    /// Insert one game read from PGN
    pub fn import_game(&mut self, game: &PgnGame) -> std::result::Result<GameId, ImportError> {
        if let Some(fen) = game.tag("FEN") {
            let board = ChessBoard::from_fen(fen).map_err(ImportError::at_start)?;
            let root = self.tree.root().board();
            let same_start = &board == root
                && board.castling() == root.castling()
                && board.en_passant() == root.en_passant();
            if !same_start {
                return Err(ImportError::at_start(MergeError::RootMismatch));
            }
        }
        self.import_moves(&game.moves, GameMetadata::from_tags(&game.tags))
    }

    /// Insert every game of a PGN collection.
    ///
    /// Failing games are reported and skipped, or abort the import when the
    /// configuration says so; games imported before the failure stay.
    pub fn import_pgn(&mut self, text: &str) -> std::result::Result<ImportReport, ImportError> {
        let mut report = ImportReport::default();
        for (index, game) in pgn::parse_collection(text).iter().enumerate() {
            match self.import_game(game) {
                Ok(id) => report.imported.push(id),
                Err(e) if self.config.skip_failed_games => {
                    let title = GameMetadata::from_tags(&game.tags).title();
                    warn!("skipping game {} ({title}): {e}", index + 1);
                    report.failed.push((index, e));
                }
                Err(e) => return Err(e),
            }
        }
        info!(
            "imported {} games, {} failed",
            report.imported.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Merge another model into this one.
    ///
    /// The other model's games get fresh ids here; the returned map translates
    /// old ids to new ones. Games whose line was skipped as a merge conflict
    /// are dropped.
    pub fn merge_model(
        &mut self,
        other: DataModel,
    ) -> std::result::Result<BTreeMap<GameId, GameId>, MergeError> {
        let DataModel {
            tree: mut incoming,
            games: incoming_games,
            ..
        } = other;
        let ids: Vec<DiagramId> = incoming.iter().map(Diagram::id).collect();
        for id in ids {
            if let Some(diagram) = incoming.get_mut(id) {
                diagram.metadata.clear();
            }
        }

        let root = self.tree.root_id();
        let report = self.manager.merge(&mut self.tree, root, incoming)?;
        let mut rekeyed = BTreeMap::new();
        for (old_id, record) in incoming_games.iter() {
            let Some(&terminal) = report.mapping.get(&record.terminal) else {
                warn!("game {old_id} lost in merge conflict");
                continue;
            };
            let new_id = self.games.register(record.metadata.clone(), terminal);
            if let Some(diagram) = self.tree.get_mut(terminal) {
                diagram.metadata.insert(new_id);
            }
            rekeyed.insert(old_id, new_id);
        }
        let all: Vec<GameId> = self.games.ids().collect();
        self.manager.rebalance(&mut self.tree, &mut self.games, all);
        info!("merged {} games from another model", rekeyed.len());
        Ok(rekeyed)
    }

    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot::capture(&self.tree, &self.games)
    }

    pub fn from_snapshot(snapshot: &ModelSnapshot) -> anyhow::Result<Self> {
        let (tree, games) = snapshot.restore()?;
        Ok(Self::from_parts(tree, games))
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        self.snapshot().to_json()
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Self::from_snapshot(&ModelSnapshot::from_json(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        use anyhow::Context;
        let path = path.as_ref();
        fs::write(path, self.to_json()?).with_context(|| format!("writing {}", path.display()))
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        use anyhow::Context;
        let path = path.as_ref();
        let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("loading {}", path.display()))
    }
}

impl Default for DataModel {
    fn default() -> Self {
        Self::new()
    }
}
