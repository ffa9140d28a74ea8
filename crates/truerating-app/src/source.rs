// Input slices (stat files, scouting files) and their concurrent loading.
//
// Each slice loads independently. A slice that fails is logged and treated
// as empty so the run continues with whatever data did arrive.

use async_trait::async_trait;
use futures_util::future::{join, join_all};
use std::path::PathBuf;
use tracing::{info, warn};
use truerating_engine::types::SeasonStatLine;
use truerating_engine::{PlayerKind, ScoutingBook, ScoutingGrade, ScoutingIndex, ScoutingSource};

use crate::config::DataPaths;
use crate::ingest;

/// Where stat lines and scouting grades come from.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn stat_lines(&self, kind: PlayerKind) -> anyhow::Result<Vec<SeasonStatLine>>;

    async fn scouting(
        &self,
        kind: PlayerKind,
        source: ScoutingSource,
    ) -> anyhow::Result<Vec<ScoutingGrade>>;
}

// ---------------------------------------------------------------------------
// CSV files on disk
// ---------------------------------------------------------------------------

/// Reads the CSV files named in `[data_paths]`. Parsing runs on the
/// blocking pool.
#[derive(Debug, Clone)]
pub struct FileSource {
    paths: DataPaths,
}

impl FileSource {
    pub fn new(paths: DataPaths) -> Self {
        Self { paths }
    }

    fn scouting_path(&self, kind: PlayerKind, source: ScoutingSource) -> PathBuf {
        let p = &self.paths;
        match (kind, source) {
            (PlayerKind::Pitcher, ScoutingSource::Primary) => p.pitcher_scouting_primary.clone(),
            (PlayerKind::Pitcher, ScoutingSource::Fallback) => p.pitcher_scouting_fallback.clone(),
            (PlayerKind::Batter, ScoutingSource::Primary) => p.batter_scouting_primary.clone(),
            (PlayerKind::Batter, ScoutingSource::Fallback) => p.batter_scouting_fallback.clone(),
        }
    }
}

#[async_trait]
impl DataSource for FileSource {
    async fn stat_lines(&self, kind: PlayerKind) -> anyhow::Result<Vec<SeasonStatLine>> {
        let path = match kind {
            PlayerKind::Pitcher => self.paths.pitching_stats.clone(),
            PlayerKind::Batter => self.paths.batting_stats.clone(),
        };
        let lines = tokio::task::spawn_blocking(move || match kind {
            PlayerKind::Pitcher => ingest::load_pitching_stats(&path),
            PlayerKind::Batter => ingest::load_batting_stats(&path),
        })
        .await??;
        Ok(lines)
    }

    async fn scouting(
        &self,
        kind: PlayerKind,
        source: ScoutingSource,
    ) -> anyhow::Result<Vec<ScoutingGrade>> {
        let path = self.scouting_path(kind, source);
        let grades = tokio::task::spawn_blocking(move || match kind {
            PlayerKind::Pitcher => ingest::load_pitcher_scouting(&path, source),
            PlayerKind::Batter => ingest::load_batter_scouting(&path, source),
        })
        .await??;
        Ok(grades)
    }
}

// ---------------------------------------------------------------------------
// Loaded inputs
// ---------------------------------------------------------------------------

/// Everything one run needs, already indexed.
#[derive(Debug, Clone, Default)]
pub struct InputData {
    pub pitching: Vec<SeasonStatLine>,
    pub batting: Vec<SeasonStatLine>,
    pub pitcher_scouting: ScoutingBook,
    pub batter_scouting: ScoutingBook,
}

impl InputData {
    pub fn stat_lines(&self, kind: PlayerKind) -> &[SeasonStatLine] {
        match kind {
            PlayerKind::Pitcher => &self.pitching,
            PlayerKind::Batter => &self.batting,
        }
    }

    pub fn scouting(&self, kind: PlayerKind) -> &ScoutingBook {
        match kind {
            PlayerKind::Pitcher => &self.pitcher_scouting,
            PlayerKind::Batter => &self.batter_scouting,
        }
    }
}

fn or_empty<T>(slice: &str, result: anyhow::Result<Vec<T>>) -> Vec<T> {
    match result {
        Ok(rows) => {
            info!("loaded {} rows from {}", rows.len(), slice);
            rows
        }
        Err(e) => {
            warn!("{} unavailable, continuing without it: {:#}", slice, e);
            Vec::new()
        }
    }
}

fn kind_label(kind: PlayerKind) -> &'static str {
    match kind {
        PlayerKind::Pitcher => "pitcher",
        PlayerKind::Batter => "batter",
    }
}

fn source_label(source: ScoutingSource) -> &'static str {
    match source {
        ScoutingSource::Primary => "primary",
        ScoutingSource::Fallback => "fallback",
    }
}

/// Load all six slices concurrently. Never fails: missing slices are empty.
pub async fn load_inputs(source: &dyn DataSource) -> InputData {
    const SCOUTING_SLICES: [(PlayerKind, ScoutingSource); 4] = [
        (PlayerKind::Pitcher, ScoutingSource::Primary),
        (PlayerKind::Pitcher, ScoutingSource::Fallback),
        (PlayerKind::Batter, ScoutingSource::Primary),
        (PlayerKind::Batter, ScoutingSource::Fallback),
    ];

    let stats = join(
        source.stat_lines(PlayerKind::Pitcher),
        source.stat_lines(PlayerKind::Batter),
    );
    let scouting = join_all(
        SCOUTING_SLICES
            .iter()
            .map(|(kind, src)| source.scouting(*kind, *src)),
    );
    let ((pitching, batting), scouting) = join(stats, scouting).await;

    let mut grades = SCOUTING_SLICES
        .iter()
        .zip(scouting)
        .map(|((kind, src), result)| {
            let label = format!("{} scouting ({})", kind_label(*kind), source_label(*src));
            ScoutingIndex::new(or_empty(&label, result))
        });

    let mut next = || grades.next().unwrap_or_default();
    let pitcher_scouting = ScoutingBook::new(next(), next());
    let batter_scouting = ScoutingBook::new(next(), next());

    InputData {
        pitching: or_empty("pitching stats", pitching),
        batting: or_empty("batting stats", batting),
        pitcher_scouting,
        batter_scouting,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
