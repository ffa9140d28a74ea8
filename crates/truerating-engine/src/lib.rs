// Rating and projection engine: pure, synchronous transformations from season
// stat lines and scouting grades to projections on a percentile/star scale.
//
// Pipeline: aggregate -> regression -> scouting -> aging -> ensemble -> percentile.
// `projection::Projector` runs the whole chain for one player or a batch.

pub mod aggregate;
pub mod aging;
pub mod config;
pub mod ensemble;
pub mod league;
pub mod level;
pub mod metrics;
pub mod percentile;
pub mod projection;
pub mod regression;
pub mod scouting;
pub mod types;

pub use config::{ConfigError, EngineConfig};
pub use league::LeagueContext;
pub use projection::{
    InsufficientReason, PlayerInput, PlayerKind, Projection, ProjectionNote, ProjectionOutcome,
    Projector,
};
pub use scouting::{ScoutingBook, ScoutingGrade, ScoutingIndex, ScoutingSource};
