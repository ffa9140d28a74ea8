// Per-year league context: averages, FIP constant, replacement level and the
// empirical distributions used for percentile ranking.
//
// Derived fresh from one year's MLB total lines every time; nothing is cached
// across years.

use std::collections::HashMap;

use tracing::debug;

use crate::config::{LeagueSettings, WobaWeights};
use crate::metrics;
use crate::percentile::Distribution;
use crate::types::{
    BattingCounts, BattingRates, CountingStats, PitchingCounts, PitchingRates, SeasonStatLine,
};

// ---------------------------------------------------------------------------
// Pitching side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PitchingLeague {
    pub averages: PitchingRates,
    pub era: f64,
    pub fip_constant: f64,
    pub replacement_fip: f64,
    pub runs_per_win: f64,
    /// Raw FIP of qualifying pitchers.
    pub fip_distribution: Distribution,
    /// Season WAR of qualifying pitchers.
    pub war_distribution: Distribution,
    pub qualifying: usize,
}

impl PitchingLeague {
    /// League constants with empty distributions, for callers that already
    /// know the year's values.
    pub fn from_constants(
        averages: PitchingRates,
        fip_constant: f64,
        replacement_fip: f64,
        runs_per_win: f64,
    ) -> Self {
        Self {
            averages,
            era: metrics::fip(&averages, fip_constant),
            fip_constant,
            replacement_fip,
            runs_per_win,
            fip_distribution: Distribution::default(),
            war_distribution: Distribution::default(),
            qualifying: 0,
        }
    }

    pub fn fip(&self, rates: &PitchingRates) -> f64 {
        metrics::fip(rates, self.fip_constant)
    }

    pub fn war(&self, fip: f64, ip: f64) -> f64 {
        metrics::pitcher_war(fip, ip, self.replacement_fip, self.runs_per_win)
    }
}

// ---------------------------------------------------------------------------
// Batting side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BattingLeague {
    pub averages: BattingRates,
    pub woba: f64,
    pub woba_weights: WobaWeights,
    pub replacement_runs_per_600: f64,
    pub runs_per_win: f64,
    pub woba_distribution: Distribution,
    pub war_distribution: Distribution,
    pub qualifying: usize,
}

impl BattingLeague {
    pub fn woba(&self, rates: &BattingRates) -> f64 {
        metrics::woba(rates, &self.woba_weights)
    }

    pub fn war(&self, woba: f64, pa: f64) -> f64 {
        metrics::batter_war(
            woba,
            pa,
            self.woba,
            self.woba_weights.scale,
            self.replacement_runs_per_600,
            self.runs_per_win,
        )
    }
}

// ---------------------------------------------------------------------------
// LeagueContext
// ---------------------------------------------------------------------------

/// Year-keyed league constants. Either side is `None` when the year has no
/// MLB volume for it.
#[derive(Debug, Clone)]
pub struct LeagueContext {
    pub year: i32,
    pub pitching: Option<PitchingLeague>,
    pub batting: Option<BattingLeague>,
}

impl LeagueContext {
    /// Derive the context for `year` from MLB total-split lines of that year.
    /// Lines from other years, levels or splits are ignored.
    ///
    /// Averages, league ERA and the FIP constant pool the full league so that
    /// league FIP equals league ERA. Distributions only hold players meeting
    /// the qualifying thresholds.
    pub fn derive(year: i32, lines: &[SeasonStatLine], settings: &LeagueSettings) -> Self {
        let mlb: Vec<&SeasonStatLine> = lines
            .iter()
            .filter(|l| l.year == year && l.level.is_mlb() && l.is_aggregatable())
            .collect();

        let pitching = derive_pitching(&mlb, settings);
        let batting = derive_batting(&mlb, settings);

        debug!(
            "league context {}: {} qualifying pitchers, {} qualifying batters",
            year,
            pitching.as_ref().map_or(0, |p| p.qualifying),
            batting.as_ref().map_or(0, |b| b.qualifying),
        );

        Self {
            year,
            pitching,
            batting,
        }
    }
}

/// Sum each player's lines (traded players have several) into one record.
fn per_player<C: CountingStats>(
    lines: &[&SeasonStatLine],
    pick: impl Fn(&SeasonStatLine) -> Option<C>,
) -> HashMap<u32, C> {
    let mut out: HashMap<u32, C> = HashMap::new();
    for line in lines {
        if let Some(counts) = pick(line) {
            let slot = out.entry(line.player_id).or_default();
            *slot = slot.plus(&counts);
        }
    }
    out
}

fn derive_pitching(lines: &[&SeasonStatLine], settings: &LeagueSettings) -> Option<PitchingLeague> {
    let players = per_player(lines, |l| l.pitching().copied());
    let total = players
        .values()
        .fold(PitchingCounts::default(), |acc, c| acc.plus(c));
    let averages = PitchingRates::from_counts(&total)?;

    let era = total.er * 9.0 / total.ip;
    let fip_constant = metrics::fip_constant(era, total.k, total.bb, total.hr, total.ip);
    let replacement_fip = era + settings.replacement_fip_margin;

    let mut fips = Vec::new();
    let mut wars = Vec::new();
    for counts in players.values().filter(|c| c.ip >= settings.min_ip) {
        if let Some(rates) = PitchingRates::from_counts(counts) {
            let fip = metrics::fip(&rates, fip_constant);
            fips.push(fip);
            wars.push(metrics::pitcher_war(
                fip,
                counts.ip,
                replacement_fip,
                settings.runs_per_win,
            ));
        }
    }

    Some(PitchingLeague {
        averages,
        era,
        fip_constant,
        replacement_fip,
        runs_per_win: settings.runs_per_win,
        qualifying: fips.len(),
        fip_distribution: Distribution::new(fips),
        war_distribution: Distribution::new(wars),
    })
}

fn derive_batting(lines: &[&SeasonStatLine], settings: &LeagueSettings) -> Option<BattingLeague> {
    let players = per_player(lines, |l| l.batting().copied());
    let total = players
        .values()
        .fold(BattingCounts::default(), |acc, c| acc.plus(c));
    let averages = BattingRates::from_counts(&total)?;
    let league_woba = metrics::woba_from_counts(&total, &settings.woba);

    let mut wobas = Vec::new();
    let mut wars = Vec::new();
    for counts in players.values().filter(|c| c.pa >= settings.min_pa) {
        let woba = metrics::woba_from_counts(counts, &settings.woba);
        wobas.push(woba);
        wars.push(metrics::batter_war(
            woba,
            counts.pa,
            league_woba,
            settings.woba.scale,
            settings.replacement_runs_per_600,
            settings.runs_per_win,
        ));
    }

    Some(BattingLeague {
        averages,
        woba: league_woba,
        woba_weights: settings.woba,
        replacement_runs_per_600: settings.replacement_runs_per_600,
        runs_per_win: settings.runs_per_win,
        qualifying: wobas.len(),
        woba_distribution: Distribution::new(wobas),
        war_distribution: Distribution::new(wars),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
