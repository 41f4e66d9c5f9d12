//! Diagram tree: every position reached in the loaded games, with variations.
//!
//! Nodes live in an arena and refer to each other by id, so a parent link is a
//! plain index rather than an ownership edge.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::san::to_san;
use crate::domain::{ChessBoard, RawMove, ValidMove};
use crate::error::{Error, Result};
use crate::models::annotations::Annotations;
use crate::models::metadata::GameId;

/// Unique identifier for a diagram in its tree
pub type DiagramId = usize;

/// A node of the tree: a position plus the move that created it
#[derive(Clone, Debug)]
pub struct Diagram {
    id: DiagramId,
    parent: Option<DiagramId>,
    board: ChessBoard,
    /// None only for the root
    creating_move: Option<ValidMove>,
    /// First child is the main line continuation, rest are variations
    children: Vec<DiagramId>,
    annotations: Annotations,
    /// Games held here; see the manager for where a game is held
    pub(crate) metadata: BTreeSet<GameId>,
}

impl Diagram {
    fn root(board: ChessBoard) -> Self {
        Self {
            id: 0,
            parent: None,
            board,
            creating_move: None,
            children: Vec::new(),
            annotations: Annotations::default(),
            metadata: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> DiagramId {
        self.id
    }

    pub fn parent(&self) -> Option<DiagramId> {
        self.parent
    }

    pub fn board(&self) -> &ChessBoard {
        &self.board
    }

    pub fn creating_move(&self) -> Option<&ValidMove> {
        self.creating_move.as_ref()
    }

    pub fn children(&self) -> &[DiagramId] {
        &self.children
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }

    /// Games held at this diagram
    pub fn metadata(&self) -> &BTreeSet<GameId> {
        &self.metadata
    }

    /// Check if this is the root node
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Check if this node has variations (more than one child)
    pub fn has_variations(&self) -> bool {
        self.children.len() > 1
    }

    /// Get the main line continuation (first child), if any
    pub fn main_line_child(&self) -> Option<DiagramId> {
        self.children.first().copied()
    }

    /// Get variation children (all children except the first)
    pub fn variation_children(&self) -> &[DiagramId] {
        self.children.get(1..).unwrap_or(&[])
    }

    /// Same position, whatever the annotations and games
    pub fn partially_equals(&self, other: &Diagram) -> bool {
        self.board == other.board
    }
}

/// Result of playing a move on a diagram
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    /// A new child was appended
    Created(DiagramId),
    /// The move had been played here before; its child is reused
    Existing(DiagramId),
}

impl MoveOutcome {
    pub fn id(self) -> DiagramId {
        match self {
            MoveOutcome::Created(id) | MoveOutcome::Existing(id) => id,
        }
    }
}

/// The arena holding one tree of diagrams
#[derive(Clone, Debug)]
pub struct DiagramTree {
    /// Indexed by id; deleted diagrams leave a hole so ids stay stable
    nodes: Vec<Option<Diagram>>,
}

impl DiagramTree {
    /// Create a tree whose root is the standard initial position
    pub fn new() -> Self {
        Self::with_root(ChessBoard::new())
    }

    /// Create a tree rooted at an arbitrary position
    pub fn with_root(board: ChessBoard) -> Self {
        Self {
            nodes: vec![Some(Diagram::root(board))],
        }
    }

    pub fn root_id(&self) -> DiagramId {
        0
    }

    pub fn root(&self) -> &Diagram {
        self.get(0).unwrap_or_else(|| unreachable!("the root is never deleted"))
    }

    /// Get a diagram by id
    pub fn get(&self, id: DiagramId) -> Option<&Diagram> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: DiagramId) -> Option<&mut Diagram> {
        self.nodes.get_mut(id).and_then(Option::as_mut)
    }

    /// Like [`DiagramTree::get`], failing with [`Error::UnknownDiagram`]
    pub fn node(&self, id: DiagramId) -> Result<&Diagram> {
        self.get(id).ok_or(Error::UnknownDiagram(id))
    }

    pub fn annotations_mut(&mut self, id: DiagramId) -> Result<&mut Annotations> {
        self.get_mut(id)
            .map(Diagram::annotations_mut)
            .ok_or(Error::UnknownDiagram(id))
    }

    pub fn contains(&self, id: DiagramId) -> bool {
        self.get(id).is_some()
    }

    pub fn parent_of(&self, id: DiagramId) -> Option<DiagramId> {
        self.get(id).and_then(Diagram::parent)
    }

    pub fn children_of(&self, id: DiagramId) -> &[DiagramId] {
        self.get(id).map(Diagram::children).unwrap_or(&[])
    }

    /// Validate `mv` on diagram `at` and move into the child it reaches.
    ///
    /// An existing child with the same resulting position is returned instead
    /// of a duplicate. On failure the tree is unchanged.
    pub fn make_move(&mut self, at: DiagramId, mv: RawMove) -> Result<MoveOutcome> {
        let valid = self.node(at)?.board.validate(mv)?;
        self.play(at, valid)
    }

    /// Append (or reuse) the child reached by a move validated on `at`
    pub fn play(&mut self, at: DiagramId, mv: ValidMove) -> Result<MoveOutcome> {
        let node = self.node(at)?;
        let board = node.board.play(&mv)?;
        if let Some(&existing) = node
            .children
            .iter()
            .find(|&&child| self.get(child).is_some_and(|c| c.board == board))
        {
            return Ok(MoveOutcome::Existing(existing));
        }

        let id = self.nodes.len();
        self.nodes.push(Some(Diagram {
            id,
            parent: Some(at),
            board,
            creating_move: Some(mv),
            children: Vec::new(),
            annotations: Annotations::default(),
            metadata: BTreeSet::new(),
        }));
        if let Some(parent) = self.get_mut(at) {
            parent.children.push(id);
        }
        Ok(MoveOutcome::Created(id))
    }

    /// Move the subtree of `source` at `source_id` under `parent`.
    ///
    /// The nodes are taken out of `source` and renumbered here; the id each
    /// one received is recorded in `mapping`. Returns the new id of
    /// `source_id`.
    pub(crate) fn graft(
        &mut self,
        parent: DiagramId,
        source: &mut DiagramTree,
        source_id: DiagramId,
        mapping: &mut BTreeMap<DiagramId, DiagramId>,
    ) -> Option<DiagramId> {
        let mut pending = vec![(parent, source_id)];
        let mut top = None;
        while let Some((new_parent, old_id)) = pending.pop() {
            let Some(mut diagram) = source.nodes.get_mut(old_id).and_then(Option::take) else {
                continue;
            };
            let id = self.nodes.len();
            mapping.insert(old_id, id);
            top.get_or_insert(id);
            // children are re-added as they arrive, keeping their order
            for &child in diagram.children.iter().rev() {
                pending.push((id, child));
            }
            diagram.id = id;
            diagram.parent = Some(new_parent);
            diagram.children.clear();
            self.nodes.push(Some(diagram));
            if let Some(p) = self.get_mut(new_parent) {
                p.children.push(id);
            }
        }
        top
    }

    /// Detach `id` and its whole subtree, returning the removed diagrams
    pub fn delete(&mut self, id: DiagramId) -> Result<Vec<Diagram>> {
        let parent = self.node(id)?.parent.ok_or(Error::DeleteRoot)?;
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&child| child != id);
        }
        Ok(self
            .subtree(id)
            .into_iter()
            .filter_map(|i| self.nodes.get_mut(i).and_then(Option::take))
            .collect())
    }

    /// `id` and all its descendants, parents before children
    pub fn subtree(&self, id: DiagramId) -> Vec<DiagramId> {
        let mut result = Vec::new();
        if !self.contains(id) {
            return result;
        }
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            result.push(current);
            pending.extend(self.children_of(current).iter().rev());
        }
        result
    }

    /// Whether `ancestor` lies on the path from the root to `id` (inclusive)
    pub fn is_ancestor(&self, ancestor: DiagramId, id: DiagramId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return self.contains(c);
            }
            current = self.parent_of(c);
        }
        false
    }

    /// Get the path from the root to `id`
    pub fn path_to(&self, id: DiagramId) -> Vec<DiagramId> {
        let mut path = Vec::new();
        let mut current = self.get(id).map(Diagram::id);
        while let Some(c) = current {
            path.push(c);
            current = self.parent_of(c);
        }
        path.reverse();
        path
    }

    /// Calculate the half-move number (ply) for a diagram.
    /// Root is ply 0, first move is ply 1, etc.
    pub fn ply(&self, id: DiagramId) -> usize {
        self.path_to(id).len().saturating_sub(1)
    }

    /// Get the move number (1-based, for display).
    /// Returns (move_number, is_black_move); counts from the root position's
    /// full-move number and side to move.
    pub fn move_number(&self, id: DiagramId) -> (u32, bool) {
        let Some(node) = self.get(id) else {
            return (0, false);
        };
        match &node.creating_move {
            None => (0, false),
            Some(mv) => {
                let parent = node.parent.and_then(|p| self.get(p));
                let number = parent.map_or(0, |p| p.board.fullmove_number());
                (number, !mv.color().is_white())
            }
        }
    }

    /// Get the main line as a sequence of diagram ids (from `id` to the end)
    pub fn main_line_from(&self, id: DiagramId) -> Vec<DiagramId> {
        let mut line = Vec::new();
        let mut current = self.get(id);
        while let Some(node) = current {
            line.push(node.id);
            current = node.main_line_child().and_then(|child| self.get(child));
        }
        line
    }

    pub fn main_line(&self) -> Vec<DiagramId> {
        self.main_line_from(self.root_id())
    }

    /// End of the single line starting at `id`; `None` if the line branches
    pub fn last_of_line(&self, id: DiagramId) -> Option<DiagramId> {
        let mut node = self.get(id)?;
        loop {
            match node.children.as_slice() {
                [] => return Some(node.id),
                [only] => node = self.get(*only)?,
                _ => return None,
            }
        }
    }

    /// SAN of the move that created `id`
    pub fn san_of(&self, id: DiagramId) -> Option<String> {
        let node = self.get(id)?;
        let mv = node.creating_move.as_ref()?;
        let parent = self.get(node.parent?)?;
        Some(to_san(&parent.board, mv))
    }

    /// SAN of every move from the root to `id`
    pub fn san_history(&self, id: DiagramId) -> Vec<String> {
        self.path_to(id)
            .into_iter()
            .filter_map(|node| self.san_of(node))
            .collect()
    }

    /// Creating moves from the root to `id`
    pub fn moves_to(&self, id: DiagramId) -> Vec<ValidMove> {
        self.path_to(id)
            .into_iter()
            .filter_map(|node| self.get(node).and_then(|n| n.creating_move.clone()))
            .collect()
    }

    /// Get all diagrams that have variations
    pub fn nodes_with_variations(&self) -> Vec<DiagramId> {
        self.iter()
            .filter(|n| n.has_variations())
            .map(Diagram::id)
            .collect()
    }

    pub fn leaves(&self) -> Vec<DiagramId> {
        self.iter()
            .filter(|n| !n.has_children())
            .map(Diagram::id)
            .collect()
    }

    /// Live diagrams in id order
    pub fn iter(&self) -> impl Iterator<Item = &Diagram> + '_ {
        self.nodes.iter().flatten()
    }

    /// Get the number of live diagrams
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Check if tree is empty (only root)
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }
}

impl Default for DiagramTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fen::START_FEN;
    use crate::error::MoveError;

    fn raw(s: &str) -> RawMove {
        RawMove::from_coordinates(s).unwrap()
    }

    fn line(tree: &mut DiagramTree, from: DiagramId, moves: &[&str]) -> DiagramId {
        moves
            .iter()
            .fold(from, |at, m| tree.make_move(at, raw(m)).unwrap().id())
    }

    #[test]
    fn test_new_tree() {
        let tree = DiagramTree::new();
        assert_eq!(tree.len(), 1);
        assert!(tree.is_empty());
        assert!(tree.root().is_root());
        assert!(!tree.root().has_children());
        assert_eq!(tree.root().board().to_fen(), START_FEN);
    }

    #[test]
    fn test_make_move() {
        let mut tree = DiagramTree::new();
        let e4 = tree.make_move(0, raw("e2e4")).unwrap();
        assert_eq!(e4, MoveOutcome::Created(1));
        let e5 = tree.make_move(1, raw("e7e5")).unwrap();
        assert_eq!(e5, MoveOutcome::Created(2));
        assert_eq!(tree.get(2).unwrap().parent(), Some(1));
        assert_eq!(tree.root().children(), &[1]);
    }

    #[test]
    fn test_same_move_reuses_child() {
        let mut tree = DiagramTree::new();
        let first = tree.make_move(0, raw("e2e4")).unwrap();
        let second = tree.make_move(0, raw("e2e4")).unwrap();
        assert_eq!(first, MoveOutcome::Created(1));
        assert_eq!(second, MoveOutcome::Existing(1));
        assert_eq!(tree.root().children().len(), 1);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_illegal_move_leaves_tree_unchanged() {
        let mut tree = DiagramTree::new();
        let err = tree.make_move(0, raw("e2e5")).unwrap_err();
        assert!(matches!(err, Error::Move(MoveError::Illegal { .. })));
        assert_eq!(tree.len(), 1);
        assert!(matches!(tree.make_move(9, raw("e2e4")), Err(Error::UnknownDiagram(9))));
    }

    #[test]
    fn test_variations() {
        let mut tree = DiagramTree::new();
        line(&mut tree, 0, &["e2e4"]);
        line(&mut tree, 0, &["d2d4"]);

        assert!(tree.root().has_variations());
        assert_eq!(tree.root().children().len(), 2);
        assert_eq!(tree.root().main_line_child(), Some(1)); // e4 is main line
        assert_eq!(tree.root().variation_children(), &[2]); // d4 is variation
        assert_eq!(tree.nodes_with_variations(), vec![0]);
        assert_eq!(tree.last_of_line(0), None);
        assert_eq!(tree.last_of_line(1), Some(1));
    }

    #[test]
    fn test_navigation_helpers() {
        let mut tree = DiagramTree::new();
        let end = line(&mut tree, 0, &["e2e4", "e7e5", "g1f3"]);
        line(&mut tree, 2, &["f1c4"]);
        assert_eq!(tree.path_to(end), vec![0, 1, 2, 3]);
        assert_eq!(tree.ply(end), 3);
        assert_eq!(tree.move_number(end), (2, false));
        assert_eq!(tree.move_number(2), (1, true));
        assert_eq!(tree.main_line(), vec![0, 1, 2, 3]);
        assert_eq!(tree.san_history(end), ["e4", "e5", "Nf3"]);
        assert_eq!(tree.san_of(4).as_deref(), Some("Bc4"));
        assert!(tree.is_ancestor(1, 4));
        assert!(!tree.is_ancestor(3, 4));
        assert_eq!(tree.subtree(2), vec![2, 3, 4]);
        assert_eq!(tree.leaves(), vec![3, 4]);
        assert_eq!(tree.moves_to(end).len(), 3);
    }

    #[test]
    fn test_delete_subtree() {
        let mut tree = DiagramTree::new();
        line(&mut tree, 0, &["e2e4", "e7e5", "g1f3"]);
        line(&mut tree, 1, &["c7c5"]);
        let removed = tree.delete(2).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(tree.children_of(1), &[4]);
        assert!(tree.get(3).is_none());
        assert_eq!(tree.len(), 3);
        assert!(matches!(tree.delete(0), Err(Error::DeleteRoot)));
        // ids are not reused
        assert_eq!(tree.make_move(1, raw("e7e5")).unwrap(), MoveOutcome::Created(5));
    }

    #[test]
    fn test_graft_renumbers_subtree() {
        let mut target = DiagramTree::new();
        line(&mut target, 0, &["d2d4"]);
        let mut source = DiagramTree::new();
        let e4 = line(&mut source, 0, &["e2e4"]);
        line(&mut source, e4, &["e7e5"]);
        line(&mut source, e4, &["c7c5"]);

        let mut mapping = BTreeMap::new();
        let top = target.graft(0, &mut source, e4, &mut mapping).unwrap();
        assert_eq!(top, 2);
        assert_eq!(target.root().children(), &[1, 2]);
        assert_eq!(target.children_of(2), &[3, 4]);
        assert_eq!(mapping.get(&e4), Some(&2));
        assert_eq!(target.san_history(4), ["e4", "c5"]);
        assert!(source.get(e4).is_none());
    }
}
