//! League data access
//!
//! Repository trait, SQLite storage and the in-memory snapshot that every
//! computation reads from.

pub mod database;
pub mod repository;
pub mod snapshot;

pub use database::{Database, DatabaseStats, ImportSummary, ScoreEntry};
pub use repository::{LeagueRepository, MatchFilter, PlayerStatFilter};
pub use snapshot::LeagueSnapshot;
