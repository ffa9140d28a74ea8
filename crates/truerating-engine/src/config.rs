// Engine configuration (engine.toml): every tuned constant the engine consumes.
//
// Constants are calibrated offline and loaded once at startup. Validation is
// strict: a malformed table is a startup failure, never a per-call error.

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::aging::{AgeBand, AgingCurveTable};
use crate::types::{BatterSkills, PitcherSkills};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub level: LevelConfig,
    pub aggregation: AggregationConfig,
    pub regression: RegressionConfig,
    pub scouting: ScoutingConfig,
    pub aging: AgingConfig,
    pub ensemble: EnsembleConfig,
    pub stars: StarConfig,
    pub league: LeagueSettings,
    pub volume: VolumeConfig,
}

// ---------------------------------------------------------------------------
// [level]
// ---------------------------------------------------------------------------

/// Additive MLB-equivalence offsets for one minor-league level.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LevelOffsets {
    pub k9: f64,
    pub bb9: f64,
    pub hr9: f64,
    pub bb_pct: f64,
    pub k_pct: f64,
    pub hr_pct: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LevelConfig {
    pub aaa: LevelOffsets,
    pub aa: LevelOffsets,
    pub a: LevelOffsets,
    pub rookie: LevelOffsets,
}

// ---------------------------------------------------------------------------
// [aggregation]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    /// Weight per season, most recent first. Seasons older than the schedule
    /// are not aggregated.
    pub recency_weights: Vec<f64>,
}

// ---------------------------------------------------------------------------
// [regression]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.min, self.max)
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegressionConfig {
    pub pitching: PitchingRegression,
    pub batting: BattingRegression,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PitchingRegression {
    /// Stabilization points in innings pitched.
    pub stabilization: PitchingStats<f64>,
    pub bounds: PitchingStats<Bounds>,
    pub tiers: PitchingTiers,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BattingRegression {
    /// Stabilization points in plate appearances.
    pub stabilization: BattingStats<f64>,
    pub bounds: BattingStats<Bounds>,
    pub tiers: BattingTiers,
}

/// One value per pitching rate stat.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PitchingStats<T> {
    pub k9: T,
    pub bb9: T,
    pub hr9: T,
}

/// One value per batting rate stat.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BattingStats<T> {
    pub bb_pct: T,
    pub k_pct: T,
    pub hr_pct: T,
    pub avg: T,
    pub doubles_rate: T,
    pub triples_rate: T,
    pub sb_rate: T,
}

/// Regression target for a pitching tier, as offsets from league average.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PitchingTierTarget {
    /// Multiplier on the stabilization constant. Below 1.0 regresses less.
    pub strength: f64,
    pub k9: f64,
    pub bb9: f64,
    pub hr9: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PitchingTiers {
    /// Raw FIP at or below this is elite.
    pub elite_max_fip: f64,
    /// Raw FIP at or above this is replacement level.
    pub replacement_min_fip: f64,
    pub elite: PitchingTierTarget,
    pub middle: PitchingTierTarget,
    pub replacement: PitchingTierTarget,
}

/// Regression target for a batting tier, as offsets from league average.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BattingTierTarget {
    pub strength: f64,
    pub bb_pct: f64,
    pub k_pct: f64,
    pub hr_pct: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BattingTiers {
    /// Raw wOBA at or above this is elite.
    pub elite_min_woba: f64,
    /// Raw wOBA at or below this is replacement level.
    pub replacement_max_woba: f64,
    pub elite: BattingTierTarget,
    pub middle: BattingTierTarget,
    pub replacement: BattingTierTarget,
}

// ---------------------------------------------------------------------------
// [scouting]
// ---------------------------------------------------------------------------

/// `value = intercept + slope * grade`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Linear {
    pub intercept: f64,
    pub slope: f64,
}

impl Linear {
    pub fn eval(&self, grade: f64) -> f64 {
        self.intercept + self.slope * grade
    }

    /// Grade that maps to `value`. A flat line has no inverse; the midpoint
    /// grade is returned instead.
    pub fn invert(&self, value: f64) -> f64 {
        if self.slope.abs() < f64::EPSILON {
            return 50.0;
        }
        (value - self.intercept) / self.slope
    }
}

/// Two-segment line joined at `breakpoint`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Piecewise {
    pub breakpoint: f64,
    pub value_at_breakpoint: f64,
    pub slope_below: f64,
    pub slope_above: f64,
}

impl Piecewise {
    pub fn eval(&self, grade: f64) -> f64 {
        let slope = if grade < self.breakpoint {
            self.slope_below
        } else {
            self.slope_above
        };
        self.value_at_breakpoint + slope * (grade - self.breakpoint)
    }

    pub fn invert(&self, value: f64) -> f64 {
        let slope = if value < self.value_at_breakpoint {
            self.slope_below
        } else {
            self.slope_above
        };
        if slope.abs() < f64::EPSILON {
            return self.breakpoint;
        }
        self.breakpoint + (value - self.value_at_breakpoint) / slope
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PitchingCoefficients {
    /// K/9 from stuff.
    pub k9: Linear,
    /// BB/9 from control.
    pub bb9: Linear,
    /// HR/9 from HR avoidance.
    pub hr9: Linear,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BattingCoefficients {
    /// BB% from eye.
    pub bb_pct: Linear,
    /// K% from avoid-strikeouts.
    pub k_pct: Linear,
    /// HR% from power.
    pub hr_pct: Piecewise,
    /// AVG from avoid-strikeouts.
    pub avg: Linear,
    /// SB per PA from speed.
    pub sb_rate: Linear,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlendConfig {
    /// Scouting weight for a veteran with a huge sample.
    pub floor_weight: f64,
    /// Extra scouting weight at zero sample, decaying as `K / (K + N)`.
    pub sample_bonus: f64,
    pub pitcher_sample_constant: f64,
    pub batter_sample_constant: f64,
    /// Players younger than this get extra scouting weight per year.
    pub young_age: f64,
    pub age_bonus_per_year: f64,
    /// Extra scouting weight for a four-star potential/overall gap.
    pub gap_bonus: f64,
    pub max_weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoutingConfig {
    pub pitching: PitchingCoefficients,
    pub batting: BattingCoefficients,
    pub blend: BlendConfig,
}

// ---------------------------------------------------------------------------
// [aging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AgingConfig {
    pub skill_min: f64,
    pub skill_max: f64,
    pub pitcher: Vec<AgeBand<PitcherSkills>>,
    pub batter: Vec<AgeBand<BatterSkills>>,
}

impl AgingConfig {
    pub fn pitcher_table(&self) -> Result<AgingCurveTable<PitcherSkills>, ConfigError> {
        AgingCurveTable::new("aging.pitcher", self.pitcher.clone())
    }

    pub fn batter_table(&self) -> Result<AgingCurveTable<BatterSkills>, ConfigError> {
        AgingCurveTable::new("aging.batter", self.batter.clone())
    }
}

// ---------------------------------------------------------------------------
// [ensemble]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScenarioWeights {
    pub optimistic: f64,
    pub neutral: f64,
    pub pessimistic: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EliteConfig {
    /// Percentile of the projected FIP (pitchers) or wOBA (batters) at or
    /// above which a player is elite.
    pub percentile: f64,
    pub ip_ratio: f64,
    pub pa_ratio: f64,
    pub war_multiplier: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnsembleConfig {
    pub weights: ScenarioWeights,
    /// Share of the aging effect the neutral model keeps.
    pub neutral_aging_share: f64,
    /// Fraction of a detected year-over-year decline the pessimistic model extrapolates.
    pub trend_weight: f64,
    /// Minimum innings in each of the last two seasons for a pitching trend.
    pub min_trend_ip: f64,
    /// Minimum plate appearances in each of the last two seasons for a batting trend.
    pub min_trend_pa: f64,
    pub elite: EliteConfig,
}

// ---------------------------------------------------------------------------
// [stars]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StarConfig {
    pub low_percentile: f64,
    pub mid_percentile: f64,
    pub high_percentile: f64,
    pub low_stars: f64,
    pub mid_stars: f64,
    pub high_stars: f64,
}

// ---------------------------------------------------------------------------
// [league]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WobaWeights {
    pub bb: f64,
    pub single: f64,
    pub double: f64,
    pub triple: f64,
    pub hr: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueSettings {
    /// Minimum innings for a pitcher to enter the percentile distributions.
    pub min_ip: f64,
    /// Minimum plate appearances for a batter to enter the percentile distributions.
    pub min_pa: f64,
    /// Replacement FIP = league ERA + margin.
    pub replacement_fip_margin: f64,
    pub runs_per_win: f64,
    pub replacement_runs_per_600: f64,
    pub woba: WobaWeights,
}

// ---------------------------------------------------------------------------
// [volume]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PitcherVolume {
    /// Weight on per-season innings history when history exists.
    pub history_weight: f64,
    pub stamina_slope: f64,
    pub stamina_intercept: f64,
    pub default_stamina: f64,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatterVolume {
    pub history_weight: f64,
    pub default_pa: f64,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VolumeConfig {
    pub pitcher: PitcherVolume,
    pub batter: BatterVolume,
}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

impl EngineConfig {
    /// Parse and validate an engine.toml document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_recency(&self.aggregation)?;
        validate_stabilization(&self.regression)?;
        validate_tiers(&self.regression)?;
        validate_ensemble(&self.ensemble)?;
        validate_stars(&self.stars)?;

        if self.aging.skill_min >= self.aging.skill_max {
            return Err(ConfigError::invalid(
                "aging.skill_min",
                format!(
                    "must be below skill_max ({} >= {})",
                    self.aging.skill_min, self.aging.skill_max
                ),
            ));
        }
        self.aging.pitcher_table()?;
        self.aging.batter_table()?;

        if self.league.runs_per_win <= 0.0 {
            return Err(ConfigError::invalid(
                "league.runs_per_win",
                format!("must be > 0, got {}", self.league.runs_per_win),
            ));
        }
        if self.league.woba.scale <= 0.0 {
            return Err(ConfigError::invalid(
                "league.woba.scale",
                format!("must be > 0, got {}", self.league.woba.scale),
            ));
        }

        let blend = &self.scouting.blend;
        if !(0.0..=1.0).contains(&blend.floor_weight) || !(0.0..=1.0).contains(&blend.max_weight)
        {
            return Err(ConfigError::invalid(
                "scouting.blend",
                "floor_weight and max_weight must be within 0.0..=1.0",
            ));
        }
        if blend.pitcher_sample_constant <= 0.0 || blend.batter_sample_constant <= 0.0 {
            return Err(ConfigError::invalid(
                "scouting.blend",
                "sample constants must be > 0",
            ));
        }

        warn_if_not_monotonic(&self.level);
        Ok(())
    }
}

fn validate_recency(agg: &AggregationConfig) -> Result<(), ConfigError> {
    let weights = &agg.recency_weights;
    let Some(&first) = weights.first() else {
        return Err(ConfigError::invalid(
            "aggregation.recency_weights",
            "must contain at least one weight",
        ));
    };
    if (first - 1.0).abs() > 1e-9 {
        return Err(ConfigError::invalid(
            "aggregation.recency_weights",
            format!("most recent season must weigh 1.0, got {first}"),
        ));
    }
    for pair in weights.windows(2) {
        if pair[1] > pair[0] || pair[1] < 0.0 {
            return Err(ConfigError::invalid(
                "aggregation.recency_weights",
                "weights must be non-negative and non-increasing",
            ));
        }
    }
    Ok(())
}

fn validate_stabilization(reg: &RegressionConfig) -> Result<(), ConfigError> {
    let p = &reg.pitching.stabilization;
    let b = &reg.batting.stabilization;
    let fields: &[(&str, f64)] = &[
        ("regression.pitching.stabilization.k9", p.k9),
        ("regression.pitching.stabilization.bb9", p.bb9),
        ("regression.pitching.stabilization.hr9", p.hr9),
        ("regression.batting.stabilization.bb_pct", b.bb_pct),
        ("regression.batting.stabilization.k_pct", b.k_pct),
        ("regression.batting.stabilization.hr_pct", b.hr_pct),
        ("regression.batting.stabilization.avg", b.avg),
        ("regression.batting.stabilization.doubles_rate", b.doubles_rate),
        ("regression.batting.stabilization.triples_rate", b.triples_rate),
        ("regression.batting.stabilization.sb_rate", b.sb_rate),
    ];
    for (name, val) in fields {
        if *val <= 0.0 {
            return Err(ConfigError::invalid(*name, format!("must be > 0, got {val}")));
        }
    }
    Ok(())
}

fn validate_tiers(reg: &RegressionConfig) -> Result<(), ConfigError> {
    let p = &reg.pitching.tiers;
    if p.elite_max_fip >= p.replacement_min_fip {
        return Err(ConfigError::invalid(
            "regression.pitching.tiers",
            "elite_max_fip must be below replacement_min_fip",
        ));
    }
    let b = &reg.batting.tiers;
    if b.elite_min_woba <= b.replacement_max_woba {
        return Err(ConfigError::invalid(
            "regression.batting.tiers",
            "elite_min_woba must be above replacement_max_woba",
        ));
    }
    let strengths = [
        p.elite.strength,
        p.middle.strength,
        p.replacement.strength,
        b.elite.strength,
        b.middle.strength,
        b.replacement.strength,
    ];
    if strengths.iter().any(|s| *s <= 0.0) {
        return Err(ConfigError::invalid(
            "regression.tiers.strength",
            "tier strength multipliers must be > 0",
        ));
    }
    Ok(())
}

fn validate_ensemble(ens: &EnsembleConfig) -> Result<(), ConfigError> {
    let w = &ens.weights;
    for (name, val) in [
        ("ensemble.weights.optimistic", w.optimistic),
        ("ensemble.weights.neutral", w.neutral),
        ("ensemble.weights.pessimistic", w.pessimistic),
    ] {
        if val < 0.0 {
            return Err(ConfigError::invalid(name, format!("must be >= 0, got {val}")));
        }
    }
    let sum = w.optimistic + w.neutral + w.pessimistic;
    if (sum - 1.0).abs() > 1e-6 {
        return Err(ConfigError::invalid(
            "ensemble.weights",
            format!("must sum to 1.0, got {sum}"),
        ));
    }
    if !(0.0..=1.0).contains(&ens.neutral_aging_share) {
        return Err(ConfigError::invalid(
            "ensemble.neutral_aging_share",
            "must be within 0.0..=1.0",
        ));
    }
    if !(0.0..=100.0).contains(&ens.elite.percentile) {
        return Err(ConfigError::invalid(
            "ensemble.elite.percentile",
            "must be within 0..=100",
        ));
    }
    Ok(())
}

fn validate_stars(stars: &StarConfig) -> Result<(), ConfigError> {
    let pcts = [stars.low_percentile, stars.mid_percentile, stars.high_percentile];
    if pcts.iter().any(|p| *p <= 0.0 || *p >= 100.0) {
        return Err(ConfigError::invalid(
            "stars",
            "anchor percentiles must lie strictly between 0 and 100",
        ));
    }
    if !(pcts[0] < pcts[1] && pcts[1] < pcts[2]) {
        return Err(ConfigError::invalid(
            "stars",
            "anchor percentiles must be strictly increasing",
        ));
    }
    if !(stars.low_stars < stars.mid_stars && stars.mid_stars < stars.high_stars) {
        return Err(ConfigError::invalid(
            "stars",
            "anchor star values must be strictly increasing",
        ));
    }
    Ok(())
}

/// Offsets should grow in magnitude from AAA down to Rookie. Calibration runs
/// occasionally produce a crossing, which is allowed but worth a warning.
fn warn_if_not_monotonic(level: &LevelConfig) {
    let chain = [&level.aaa, &level.aa, &level.a, &level.rookie];
    let checks: [(&str, fn(&LevelOffsets) -> f64); 7] = [
        ("k9", |o| o.k9),
        ("bb9", |o| o.bb9),
        ("hr9", |o| o.hr9),
        ("bb_pct", |o| o.bb_pct),
        ("k_pct", |o| o.k_pct),
        ("hr_pct", |o| o.hr_pct),
        ("avg", |o| o.avg),
    ];
    for (name, get) in checks {
        let monotonic = chain
            .windows(2)
            .all(|pair| get(pair[1]).abs() >= get(pair[0]).abs());
        if !monotonic {
            warn!("level offsets for {} are not monotonic from AAA to Rookie", name);
        }
    }
}

/// Parsed copy of the shipped defaults, for tests across the crate.
#[cfg(test)]
pub(crate) fn test_config() -> EngineConfig {
    EngineConfig::from_toml_str(include_str!("../../../defaults/engine.toml"))
        .expect("defaults/engine.toml should be valid")
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: &str = include_str!("../../../defaults/engine.toml");

    #[test]
    fn shipped_defaults_are_valid() {
        let config = test_config();
        assert_eq!(config.aggregation.recency_weights[0], 1.0);
        assert!((config.scouting.pitching.k9.slope - 0.074).abs() < f64::EPSILON);
        assert!((config.stars.mid_stars - 3.0).abs() < f64::EPSILON);
        assert!(config.aging.pitcher.len() <= 8);
    }

    #[test]
    fn rejects_ensemble_weights_not_summing_to_one() {
        let modified = DEFAULTS.replace("optimistic = 0.25", "optimistic = 0.40");
        let err = EngineConfig::from_toml_str(&modified).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "ensemble.weights"),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn rejects_recency_weights_not_starting_at_one() {
        let modified = DEFAULTS.replace(
            "recency_weights = [1.0, 0.6, 0.4]",
            "recency_weights = [0.9, 0.6, 0.4]",
        );
        let err = EngineConfig::from_toml_str(&modified).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "aggregation.recency_weights")
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn rejects_zero_stabilization() {
        let modified = DEFAULTS.replace("k9 = 50.0", "k9 = 0.0");
        let err = EngineConfig::from_toml_str(&modified).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "regression.pitching.stabilization.k9")
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn rejects_aging_table_with_gap() {
        // The second pitcher band starts one year late, leaving age 22 uncovered.
        let modified = DEFAULTS.replacen("min_age = 22", "min_age = 23", 1);
        let err = EngineConfig::from_toml_str(&modified).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, message } => {
                assert_eq!(field, "aging.pitcher");
                assert!(message.contains("gap"), "unexpected message: {message}");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let err = EngineConfig::from_toml_str("this is not [[[ toml").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn linear_inverts() {
        let line = Linear {
            intercept: 2.07,
            slope: 0.074,
        };
        let grade = line.invert(line.eval(63.0));
        assert!((grade - 63.0).abs() < 1e-9);
    }

    #[test]
    fn piecewise_inverts_on_both_segments() {
        let p = Piecewise {
            breakpoint: 50.0,
            value_at_breakpoint: 0.028,
            slope_below: 0.0007,
            slope_above: 0.0012,
        };
        for grade in [25.0, 50.0, 72.0] {
            assert!((p.invert(p.eval(grade)) - grade).abs() < 1e-9);
        }
        // Steeper above the breakpoint.
        assert!(p.eval(60.0) - p.eval(50.0) > p.eval(50.0) - p.eval(40.0));
    }
}
