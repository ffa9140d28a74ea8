// End-to-end projection for one player: aggregate, regress, blend with
// scouting, age, build scenarios, then value and rate the result.
//
// Data problems never surface as errors here. A player with nothing to
// project yields `ProjectionOutcome::InsufficientData`, and softer problems
// are carried as `ProjectionNote`s on the projection.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::StatsAggregator;
use crate::aging::{AgingCurveTable, AgingProjector};
use crate::config::{ConfigError, EngineConfig};
use crate::ensemble::{EnsembleProjector, Scenarios};
use crate::league::{BattingLeague, LeagueContext, PitchingLeague};
use crate::level::LevelTranslator;
use crate::metrics::{self, SlashLine};
use crate::percentile::{Direction, PercentileMapper, Rating};
use crate::regression::{RegressionEngine, Tier};
use crate::scouting::{
    scouting_weight, ResolvedScouting, ScoutingGrade, ScoutingMap, ScoutingSource,
};
use crate::types::{
    BatterSkills, BattingRates, Level, PitcherSkills, PitchingRates, SeasonStatLine, SkillSet,
};

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    Pitcher,
    Batter,
}

/// Everything known about one player for one projection request.
#[derive(Debug, Clone)]
pub struct PlayerInput {
    pub player_id: u32,
    pub name: String,
    pub kind: PlayerKind,
    /// Age during the base (context) year, when known.
    pub age: Option<u32>,
    pub lines: Vec<SeasonStatLine>,
    pub scouting: ResolvedScouting,
}

/// Non-fatal conditions met while projecting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "note", rename_all = "snake_case")]
pub enum ProjectionNote {
    /// No scouting grade; stat rates passed through.
    StatsOnly,
    /// No usable stats; rates come from scouting alone.
    ScoutingOnly,
    /// A name lookup matched several players and was discarded.
    AmbiguousScoutingMatch,
    /// A value hit a hard bound and was clamped.
    Clamped { stat: String },
    /// Seasons at this level had no translation offsets.
    NoTranslation { level: Level },
    /// Age unknown, so no aging was applied across years.
    UnknownAge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsufficientReason {
    /// Neither usable stat lines nor a scouting grade.
    NoData,
    /// The context year has no MLB baseline for this side of the ball.
    NoLeagueBaseline,
}

/// Projected line for the target year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectedLine {
    Pitching {
        rates: PitchingRates,
        fip: f64,
        ip: f64,
    },
    Batting {
        rates: BattingRates,
        slash: SlashLine,
        woba: f64,
        pa: f64,
    },
}

/// Value of one scenario: `stat` is FIP for pitchers and wOBA for batters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioValue {
    pub stat: f64,
    pub war: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub player_id: u32,
    pub name: String,
    pub kind: PlayerKind,
    pub base_year: i32,
    pub target_year: i32,
    /// Age during the target year, when known.
    pub age: Option<u32>,
    pub line: ProjectedLine,
    pub war: f64,
    /// Percentile and stars of the FIP (pitchers) or wOBA (batters).
    pub rating: Rating,
    /// Percentile and stars of the projected WAR among qualifying players.
    pub war_rating: Rating,
    pub scenarios: Scenarios<ScenarioValue>,
    pub elite: bool,
    pub tier: Option<Tier>,
    /// Weight given to scouting in the current-ability blend.
    pub scouting_weight: f64,
    pub source: Option<ScoutingSource>,
    /// The other source's grade, for display only.
    pub comparison: Option<ScoutingGrade>,
    pub notes: Vec<ProjectionNote>,
}

impl Projection {
    /// FIP for pitchers, wOBA for batters.
    pub fn rating_stat(&self) -> f64 {
        match &self.line {
            ProjectedLine::Pitching { fip, .. } => *fip,
            ProjectedLine::Batting { woba, .. } => *woba,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProjectionOutcome {
    Projected(Box<Projection>),
    InsufficientData {
        player_id: u32,
        name: String,
        reason: InsufficientReason,
    },
}

impl ProjectionOutcome {
    pub fn projection(&self) -> Option<&Projection> {
        match self {
            ProjectionOutcome::Projected(p) => Some(p),
            ProjectionOutcome::InsufficientData { .. } => None,
        }
    }

    pub fn player_id(&self) -> u32 {
        match self {
            ProjectionOutcome::Projected(p) => p.player_id,
            ProjectionOutcome::InsufficientData { player_id, .. } => *player_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Projector
// ---------------------------------------------------------------------------

/// Owns the validated configuration and the aging tables built from it.
#[derive(Debug, Clone)]
pub struct Projector {
    config: EngineConfig,
    pitcher_aging: AgingCurveTable<PitcherSkills>,
    batter_aging: AgingCurveTable<BatterSkills>,
    stars: PercentileMapper,
}

/// Shared per-player state after the current-ability blend.
struct Current<R> {
    rates: R,
    tier: Option<Tier>,
    weight: f64,
    history: Option<f64>,
    decline: Option<R>,
}

impl Projector {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let pitcher_aging = config.aging.pitcher_table()?;
        let batter_aging = config.aging.batter_table()?;
        let stars = PercentileMapper::new(&config.stars);
        Ok(Self {
            config,
            pitcher_aging,
            batter_aging,
            stars,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// League context for `year` from every loaded line.
    pub fn league_context(&self, year: i32, lines: &[SeasonStatLine]) -> LeagueContext {
        LeagueContext::derive(year, lines, &self.config.league)
    }

    /// Project every input. One player's missing data never stops the batch.
    pub fn project_all(
        &self,
        inputs: &[PlayerInput],
        league: &LeagueContext,
        target_year: i32,
    ) -> Vec<ProjectionOutcome> {
        inputs
            .iter()
            .map(|input| self.project(input, league, target_year))
            .collect()
    }

    pub fn project(
        &self,
        input: &PlayerInput,
        league: &LeagueContext,
        target_year: i32,
    ) -> ProjectionOutcome {
        let insufficient = |reason| ProjectionOutcome::InsufficientData {
            player_id: input.player_id,
            name: input.name.clone(),
            reason,
        };
        let outcome = match input.kind {
            PlayerKind::Pitcher => match &league.pitching {
                Some(lg) => self.project_pitcher(input, lg, league.year, target_year),
                None => Err(InsufficientReason::NoLeagueBaseline),
            },
            PlayerKind::Batter => match &league.batting {
                Some(lg) => self.project_batter(input, lg, league.year, target_year),
                None => Err(InsufficientReason::NoLeagueBaseline),
            },
        };
        match outcome {
            Ok(projection) => ProjectionOutcome::Projected(Box::new(projection)),
            Err(reason) => {
                debug!("no projection for player {}: {:?}", input.player_id, reason);
                insufficient(reason)
            }
        }
    }

    fn aggregator(&self) -> StatsAggregator<'_> {
        StatsAggregator::new(&self.config.aggregation, LevelTranslator::new(&self.config.level))
    }

    fn ages(&self, input: &PlayerInput, base_year: i32, target_year: i32) -> Option<(u32, u32)> {
        let base_age = input
            .age
            .or_else(|| input.scouting.active.as_ref().and_then(|g| g.age))?;
        let target_age = (base_age as i64 + (target_year - base_year) as i64).max(0) as u32;
        Some((base_age, target_age))
    }

    // -- pitchers ----------------------------------------------------------

    fn project_pitcher(
        &self,
        input: &PlayerInput,
        lg: &PitchingLeague,
        base_year: i32,
        target_year: i32,
    ) -> Result<Projection, InsufficientReason> {
        let cfg = &self.config;
        let map = ScoutingMap::new(&cfg.scouting);
        let ensemble = EnsembleProjector::new(&cfg.ensemble);
        let mut notes = scouting_notes(&input.scouting);

        let aggregate = self.aggregator().aggregate_pitching(&input.lines);
        let grade = input.scouting.active.as_ref().filter(|g| g.pitcher_skills().is_some());
        let skills = grade.and_then(|g| g.pitcher_skills());

        let current = match (&aggregate, skills) {
            (None, None) => return Err(InsufficientReason::NoData),
            (Some(agg), _) => {
                notes.extend(untranslated_notes(&agg.untranslated_levels));
                let regressed = RegressionEngine::new(&cfg.regression).regress_pitching(
                    &agg.rates,
                    agg.raw_volume,
                    lg,
                );
                notes.extend(clamp_notes(&regressed.clamped));
                let (rates, weight) = match (grade, skills) {
                    (Some(g), Some(s)) => {
                        let w = scouting_weight(
                            &cfg.scouting.blend,
                            agg.raw_volume,
                            cfg.scouting.blend.pitcher_sample_constant,
                            input.age.or(g.age),
                            g.star_gap(),
                        );
                        (regressed.rates.lerp(&map.pitching_rates(s), w), w)
                    }
                    _ => {
                        notes.push(ProjectionNote::StatsOnly);
                        (regressed.rates, 0.0)
                    }
                };
                Current {
                    rates,
                    tier: Some(regressed.tier),
                    weight,
                    history: Some(agg.volume_per_season()),
                    decline: ensemble.trend(Some(agg), cfg.ensemble.min_trend_ip),
                }
            }
            (None, Some(s)) => {
                notes.push(ProjectionNote::ScoutingOnly);
                Current {
                    rates: map.pitching_rates(s),
                    tier: None,
                    weight: 1.0,
                    history: None,
                    decline: None,
                }
            }
        };

        let stamina = skills.map_or(cfg.volume.pitcher.default_stamina, |s| s.stamina);
        let ages = self.ages(input, base_year, target_year);
        let aged = match ages {
            Some((from, to)) => {
                let (rates, clamped) = self.age_pitching(&map, &current.rates, stamina, from, to);
                if clamped {
                    notes.push(ProjectionNote::Clamped {
                        stat: "aging".into(),
                    });
                }
                rates
            }
            None => {
                if target_year != base_year {
                    notes.push(ProjectionNote::UnknownAge);
                }
                current.rates
            }
        };

        let scenarios = ensemble.scenarios(&current.rates, &aged, current.decline.as_ref());
        let blended = ensemble.blend(&scenarios);
        let fip = lg.fip(&blended);
        let rating = self
            .stars
            .rate(fip, &lg.fip_distribution, Direction::LowerIsBetter);
        let elite = ensemble.is_elite(rating.percentile);

        let vol = &cfg.volume.pitcher;
        let stamina_ip = vol.stamina_slope * stamina + vol.stamina_intercept;
        let mut ip = match current.history {
            Some(hist) => vol.history_weight * hist + (1.0 - vol.history_weight) * stamina_ip,
            None => stamina_ip,
        };
        let mut war_multiplier = 1.0;
        if elite {
            ip *= cfg.ensemble.elite.ip_ratio;
            war_multiplier = cfg.ensemble.elite.war_multiplier;
        }
        let ip = vol.bounds.clamp(ip);

        let values = scenarios.map(|r| {
            let stat = lg.fip(r);
            ScenarioValue {
                stat,
                war: lg.war(stat, ip) * war_multiplier,
            }
        });

        let war = lg.war(fip, ip) * war_multiplier;
        let war_rating = self
            .stars
            .rate(war, &lg.war_distribution, Direction::HigherIsBetter);

        Ok(Projection {
            player_id: input.player_id,
            name: input.name.clone(),
            kind: PlayerKind::Pitcher,
            base_year,
            target_year,
            age: ages.map(|(_, to)| to),
            line: ProjectedLine::Pitching {
                rates: blended,
                fip,
                ip,
            },
            war,
            rating,
            war_rating,
            scenarios: values,
            elite,
            tier: current.tier,
            scouting_weight: current.weight,
            source: grade.map(|g| g.source),
            comparison: input.scouting.comparison.clone(),
            notes,
        })
    }

    /// Age pitching rates by moving the implied skills along the curve and
    /// applying the resulting rate change.
    fn age_pitching(
        &self,
        map: &ScoutingMap<'_>,
        rates: &PitchingRates,
        stamina: f64,
        from: u32,
        to: u32,
    ) -> (PitchingRates, bool) {
        let (lo, hi) = (self.config.aging.skill_min, self.config.aging.skill_max);
        let (implied, _) = map
            .pitcher_skills(rates, stamina)
            .step(&PitcherSkills::default(), 0.0, lo, hi);
        let aged = AgingProjector::new(lo, hi).project(&self.pitcher_aging, &implied, from, to);
        let before = map.pitching_rates(&implied);
        let after = map.pitching_rates(&aged.skills);
        let out = PitchingRates {
            k9: (rates.k9 + after.k9 - before.k9).max(0.0),
            bb9: (rates.bb9 + after.bb9 - before.bb9).max(0.0),
            hr9: (rates.hr9 + after.hr9 - before.hr9).max(0.0),
        };
        (out, aged.clamped)
    }

    // -- batters -----------------------------------------------------------

    fn project_batter(
        &self,
        input: &PlayerInput,
        lg: &BattingLeague,
        base_year: i32,
        target_year: i32,
    ) -> Result<Projection, InsufficientReason> {
        let cfg = &self.config;
        let map = ScoutingMap::new(&cfg.scouting);
        let ensemble = EnsembleProjector::new(&cfg.ensemble);
        let mut notes = scouting_notes(&input.scouting);

        let aggregate = self.aggregator().aggregate_batting(&input.lines);
        let grade = input.scouting.active.as_ref().filter(|g| g.batter_skills().is_some());
        let skills = grade.and_then(|g| g.batter_skills());

        let current = match (&aggregate, skills) {
            (None, None) => return Err(InsufficientReason::NoData),
            (Some(agg), _) => {
                notes.extend(untranslated_notes(&agg.untranslated_levels));
                let regressed = RegressionEngine::new(&cfg.regression).regress_batting(
                    &agg.rates,
                    agg.raw_volume,
                    lg,
                );
                notes.extend(clamp_notes(&regressed.clamped));
                let (rates, weight) = match (grade, skills) {
                    (Some(g), Some(s)) => {
                        let w = scouting_weight(
                            &cfg.scouting.blend,
                            agg.raw_volume,
                            cfg.scouting.blend.batter_sample_constant,
                            input.age.or(g.age),
                            g.star_gap(),
                        );
                        let scouted = map.batting_rates(s, &regressed.rates);
                        (regressed.rates.lerp(&scouted, w), w)
                    }
                    _ => {
                        notes.push(ProjectionNote::StatsOnly);
                        (regressed.rates, 0.0)
                    }
                };
                Current {
                    rates,
                    tier: Some(regressed.tier),
                    weight,
                    history: Some(agg.volume_per_season()),
                    decline: ensemble.trend(Some(agg), cfg.ensemble.min_trend_pa),
                }
            }
            (None, Some(s)) => {
                notes.push(ProjectionNote::ScoutingOnly);
                Current {
                    rates: map.batting_rates(s, &lg.averages),
                    tier: None,
                    weight: 1.0,
                    history: None,
                    decline: None,
                }
            }
        };

        let ages = self.ages(input, base_year, target_year);
        let aged = match ages {
            Some((from, to)) => {
                let (rates, clamped) = self.age_batting(&map, &current.rates, from, to);
                if clamped {
                    notes.push(ProjectionNote::Clamped {
                        stat: "aging".into(),
                    });
                }
                rates
            }
            None => {
                if target_year != base_year {
                    notes.push(ProjectionNote::UnknownAge);
                }
                current.rates
            }
        };

        let scenarios = ensemble.scenarios(&current.rates, &aged, current.decline.as_ref());
        let blended = ensemble.blend(&scenarios);
        let woba = lg.woba(&blended);
        let rating = self
            .stars
            .rate(woba, &lg.woba_distribution, Direction::HigherIsBetter);
        let elite = ensemble.is_elite(rating.percentile);

        let vol = &cfg.volume.batter;
        let mut pa = match current.history {
            Some(hist) => vol.history_weight * hist + (1.0 - vol.history_weight) * vol.default_pa,
            None => vol.default_pa,
        };
        let mut war_multiplier = 1.0;
        if elite {
            pa *= cfg.ensemble.elite.pa_ratio;
            war_multiplier = cfg.ensemble.elite.war_multiplier;
        }
        let pa = vol.bounds.clamp(pa);

        let values = scenarios.map(|r| {
            let stat = lg.woba(r);
            ScenarioValue {
                stat,
                war: lg.war(stat, pa) * war_multiplier,
            }
        });

        let war = lg.war(woba, pa) * war_multiplier;
        let war_rating = self
            .stars
            .rate(war, &lg.war_distribution, Direction::HigherIsBetter);

        Ok(Projection {
            player_id: input.player_id,
            name: input.name.clone(),
            kind: PlayerKind::Batter,
            base_year,
            target_year,
            age: ages.map(|(_, to)| to),
            line: ProjectedLine::Batting {
                rates: blended,
                slash: metrics::slash_line(&blended),
                woba,
                pa,
            },
            war,
            rating,
            war_rating,
            scenarios: values,
            elite,
            tier: current.tier,
            scouting_weight: current.weight,
            source: grade.map(|g| g.source),
            comparison: input.scouting.comparison.clone(),
            notes,
        })
    }

    fn age_batting(
        &self,
        map: &ScoutingMap<'_>,
        rates: &BattingRates,
        from: u32,
        to: u32,
    ) -> (BattingRates, bool) {
        let (lo, hi) = (self.config.aging.skill_min, self.config.aging.skill_max);
        let (implied, _) = map
            .batter_skills(rates)
            .step(&BatterSkills::default(), 0.0, lo, hi);
        let aged = AgingProjector::new(lo, hi).project(&self.batter_aging, &implied, from, to);
        let before = map.batting_rates(&implied, rates);
        let after = map.batting_rates(&aged.skills, rates);
        let shift = |v: f64, b: f64, a: f64| (v + a - b).max(0.0);
        let out = BattingRates {
            bb_pct: shift(rates.bb_pct, before.bb_pct, after.bb_pct),
            k_pct: shift(rates.k_pct, before.k_pct, after.k_pct),
            hr_pct: shift(rates.hr_pct, before.hr_pct, after.hr_pct),
            avg: shift(rates.avg, before.avg, after.avg),
            doubles_rate: rates.doubles_rate,
            triples_rate: rates.triples_rate,
            sb_rate: shift(rates.sb_rate, before.sb_rate, after.sb_rate),
        };
        (out, aged.clamped)
    }
}

fn scouting_notes(scouting: &ResolvedScouting) -> Vec<ProjectionNote> {
    if scouting.ambiguous {
        vec![ProjectionNote::AmbiguousScoutingMatch]
    } else {
        Vec::new()
    }
}

fn untranslated_notes(levels: &[Level]) -> impl Iterator<Item = ProjectionNote> + '_ {
    levels
        .iter()
        .map(|level| ProjectionNote::NoTranslation { level: *level })
}

fn clamp_notes<'a>(stats: &'a [&'static str]) -> impl Iterator<Item = ProjectionNote> + 'a {
    stats.iter().map(|s| ProjectionNote::Clamped {
        stat: (*s).to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
