pub mod annotations;
pub mod diagram;
pub mod game;
pub mod manager;
pub mod metadata;
pub mod snapshot;

pub use annotations::{Annotations, Arrow, Highlight, MarkedField};
pub use diagram::{Diagram, DiagramId, DiagramTree, MoveOutcome};
pub use game::{DataModel, ImportReport};
pub use manager::{DiagramManager, MergeReport, Relocation};
pub use metadata::{GameId, GameMetadata, GameRecord, GamesRepository};
pub use snapshot::ModelSnapshot;
