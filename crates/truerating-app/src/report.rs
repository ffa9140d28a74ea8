// Run output: the full JSON document and a compact text leaderboard.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::path::Path;
use truerating_engine::projection::ProjectedLine;
use truerating_engine::{PlayerKind, Projection, ProjectionOutcome, ScoutingSource};

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub base_year: i32,
    pub target_year: i32,
    pub outcomes: Vec<ProjectionOutcome>,
}

impl Report {
    pub fn new(base_year: i32, target_year: i32, outcomes: Vec<ProjectionOutcome>) -> Self {
        Self {
            generated_at: Utc::now(),
            base_year,
            target_year,
            outcomes,
        }
    }

    /// Projections of one kind, best WAR first.
    pub fn leaders(&self, kind: PlayerKind) -> Vec<&Projection> {
        let mut rows: Vec<&Projection> = self
            .outcomes
            .iter()
            .filter_map(ProjectionOutcome::projection)
            .filter(|p| p.kind == kind)
            .collect();
        rows.sort_by(|a, b| b.war.total_cmp(&a.war).then(a.player_id.cmp(&b.player_id)));
        rows
    }

    pub fn insufficient(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.projection().is_none())
            .count()
    }
}

/// Write the report as pretty JSON, creating parent directories as needed.
pub fn write_json(path: &Path, report: &Report) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn source_tag(source: Option<ScoutingSource>) -> &'static str {
    match source {
        Some(ScoutingSource::Primary) => "pri",
        Some(ScoutingSource::Fallback) => "fb",
        None => "-",
    }
}

fn age(p: &Projection) -> String {
    p.age.map_or_else(|| "-".to_string(), |a| a.to_string())
}

fn truncate(name: &str, width: usize) -> String {
    name.chars().take(width).collect()
}

/// Leaderboards for both sides of the ball, `top` rows each.
pub fn render_text(report: &Report, top: usize) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "Projections for {} (context year {})",
        report.target_year, report.base_year
    )?;

    writeln!(out, "\nPitchers")?;
    writeln!(
        out,
        "{:<24} {:>3} {:>6} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5} {:>4} {:>3}",
        "Name", "Age", "IP", "K/9", "BB/9", "HR/9", "FIP", "WAR", "Pct", "Star", "Src"
    )?;
    for p in report.leaders(PlayerKind::Pitcher).into_iter().take(top) {
        if let ProjectedLine::Pitching { rates, fip, ip } = &p.line {
            writeln!(
                out,
                "{:<24} {:>3} {:>6.1} {:>5.2} {:>5.2} {:>5.2} {:>5.2} {:>5.1} {:>5.1} {:>4.1} {:>3}",
                truncate(&p.name, 24),
                age(p),
                ip,
                rates.k9,
                rates.bb9,
                rates.hr9,
                fip,
                p.war,
                p.rating.percentile,
                p.rating.display_stars,
                source_tag(p.source),
            )?;
        }
    }

    writeln!(out, "\nBatters")?;
    writeln!(
        out,
        "{:<24} {:>3} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5} {:>4} {:>3}",
        "Name", "Age", "PA", "AVG", "OBP", "SLG", "OPS", "wOBA", "WAR", "Pct", "Star", "Src"
    )?;
    for p in report.leaders(PlayerKind::Batter).into_iter().take(top) {
        if let ProjectedLine::Batting { slash, woba, pa, .. } = &p.line {
            writeln!(
                out,
                "{:<24} {:>3} {:>5.0} {:>5.3} {:>5.3} {:>5.3} {:>5.3} {:>5.3} {:>5.1} {:>5.1} {:>4.1} {:>3}",
                truncate(&p.name, 24),
                age(p),
                pa,
                slash.avg,
                slash.obp,
                slash.slg,
                slash.ops(),
                woba,
                p.war,
                p.rating.percentile,
                p.rating.display_stars,
                source_tag(p.source),
            )?;
        }
    }

    let skipped = report.insufficient();
    if skipped > 0 {
        writeln!(out, "\n{skipped} player(s) had insufficient data")?;
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
