//! Settings for importing games.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{ChessBoard, PieceKind};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    /// Piece for promotions written without one; `None` makes them fail
    pub default_promotion: Option<PieceKind>,
    /// Skip a game that fails to import instead of stopping the collection
    pub skip_failed_games: bool,
    /// Start position for games without a `FEN` tag
    pub start_fen: Option<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_promotion: None,
            skip_failed_games: true,
            start_fen: None,
        }
    }
}

impl ImportConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ImportConfig = toml::from_str(text).context("invalid import config")?;
        if let Some(fen) = &config.start_fen {
            ChessBoard::from_fen(fen).with_context(|| format!("invalid start_fen `{fen}`"))?;
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("loading {}", path.display()))
    }

    /// Position games without a `FEN` tag start from
    pub fn start_board(&self) -> Result<ChessBoard> {
        match &self.start_fen {
            None => Ok(ChessBoard::new()),
            Some(fen) => Ok(ChessBoard::from_fen(fen)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::from_toml_str("").unwrap();
        assert_eq!(config, ImportConfig::default());
        assert!(config.skip_failed_games);
        assert_eq!(config.start_board().unwrap(), ChessBoard::new());
    }

    #[test]
    fn test_full_config() {
        let config = ImportConfig::from_toml_str(
            r#"
            default_promotion = "queen"
            skip_failed_games = false
            start_fen = "4k3/8/8/8/8/8/8/4K3 w - - 0 1"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_promotion, Some(PieceKind::Queen));
        assert!(!config.skip_failed_games);
        assert_eq!(config.start_board().unwrap().pieces_of(crate::domain::Color::White).len(), 1);
    }

    #[test]
    fn test_rejects_unknown_fields_and_bad_fen() {
        assert!(ImportConfig::from_toml_str("promote = \"queen\"").is_err());
        assert!(ImportConfig::from_toml_str("start_fen = \"nonsense\"").is_err());
        assert!(ImportConfig::from_toml_str("default_promotion = \"emperor\"").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = ImportConfig::load("/nonexistent/import.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/import.toml"));
    }
}
