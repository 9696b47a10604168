//! Board representation.
//!
//! Contains world geometry ingestion, the territory adjacency graph, the
//! ownership ledger, and the territory/player identity types.

pub mod adjacency;
pub mod ledger;
pub mod territory;
pub mod world;

pub use adjacency::{LinkTable, TerritoryGraph, DEFAULT_LINKS};
pub use ledger::Ledger;
pub use territory::{Player, PlayerId, Seat, TerritoryId};
pub use world::WorldData;
