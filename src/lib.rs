//! Opening repertoire database: a chess rules engine and a tree of diagrams
//! into which games are merged.

pub mod config;
pub mod domain;
pub mod error;
pub mod models;

pub use config::ImportConfig;
pub use error::{Error, ImportError, Result};
pub use models::DataModel;
