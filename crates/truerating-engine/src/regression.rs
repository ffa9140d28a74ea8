// Sample-size-aware regression toward a tiered population target.
//
// regressed = (raw * N + target * K) / (N + K), where K is the stat's
// stabilization constant scaled by the tier's strength multiplier.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{BattingTierTarget, Bounds, PitchingTierTarget, RegressionConfig};
use crate::league::{BattingLeague, PitchingLeague};
use crate::types::{BattingRates, PitchingRates};

/// Population tier a player regresses toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Elite,
    Middle,
    Replacement,
}

/// Regressed rates plus the names of any stats that hit a hard bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Regressed<R> {
    pub rates: R,
    pub tier: Tier,
    pub clamped: Vec<&'static str>,
}

/// Weighted shrinkage of `raw` toward `target`. With no sample the target is
/// returned; as `n` grows the result approaches `raw`.
pub fn shrink(raw: f64, target: f64, n: f64, k: f64) -> f64 {
    let n = n.max(0.0);
    if n + k <= 0.0 {
        return raw;
    }
    (raw * n + target * k) / (n + k)
}

#[derive(Debug, Clone, Copy)]
pub struct RegressionEngine<'a> {
    config: &'a RegressionConfig,
}

impl<'a> RegressionEngine<'a> {
    pub fn new(config: &'a RegressionConfig) -> Self {
        Self { config }
    }

    pub fn pitching_tier(&self, raw_fip: f64) -> Tier {
        let t = &self.config.pitching.tiers;
        if raw_fip <= t.elite_max_fip {
            Tier::Elite
        } else if raw_fip >= t.replacement_min_fip {
            Tier::Replacement
        } else {
            Tier::Middle
        }
    }

    pub fn batting_tier(&self, raw_woba: f64) -> Tier {
        let t = &self.config.batting.tiers;
        if raw_woba >= t.elite_min_woba {
            Tier::Elite
        } else if raw_woba <= t.replacement_max_woba {
            Tier::Replacement
        } else {
            Tier::Middle
        }
    }

    fn pitching_target(&self, tier: Tier) -> &PitchingTierTarget {
        let t = &self.config.pitching.tiers;
        match tier {
            Tier::Elite => &t.elite,
            Tier::Middle => &t.middle,
            Tier::Replacement => &t.replacement,
        }
    }

    fn batting_target(&self, tier: Tier) -> &BattingTierTarget {
        let t = &self.config.batting.tiers;
        match tier {
            Tier::Elite => &t.elite,
            Tier::Middle => &t.middle,
            Tier::Replacement => &t.replacement,
        }
    }

    /// Regress aggregated pitching rates over `ip` (weighted) innings.
    pub fn regress_pitching(
        &self,
        raw: &PitchingRates,
        ip: f64,
        league: &PitchingLeague,
    ) -> Regressed<PitchingRates> {
        let tier = self.pitching_tier(league.fip(raw));
        let target = self.pitching_target(tier);
        let cfg = &self.config.pitching;
        let avg = &league.averages;
        let s = target.strength;
        let mut clamped = Vec::new();

        let rates = PitchingRates {
            k9: bounded(
                "k9",
                shrink(raw.k9, avg.k9 + target.k9, ip, cfg.stabilization.k9 * s),
                &cfg.bounds.k9,
                &mut clamped,
            ),
            bb9: bounded(
                "bb9",
                shrink(raw.bb9, avg.bb9 + target.bb9, ip, cfg.stabilization.bb9 * s),
                &cfg.bounds.bb9,
                &mut clamped,
            ),
            hr9: bounded(
                "hr9",
                shrink(raw.hr9, avg.hr9 + target.hr9, ip, cfg.stabilization.hr9 * s),
                &cfg.bounds.hr9,
                &mut clamped,
            ),
        };
        Regressed {
            rates,
            tier,
            clamped,
        }
    }

    /// Regress aggregated batting rates over `pa` (weighted) plate appearances.
    /// Doubles, triples and steals regress to the league average regardless of tier.
    pub fn regress_batting(
        &self,
        raw: &BattingRates,
        pa: f64,
        league: &BattingLeague,
    ) -> Regressed<BattingRates> {
        let tier = self.batting_tier(league.woba(raw));
        let target = self.batting_target(tier);
        let cfg = &self.config.batting;
        let k = &cfg.stabilization;
        let b = &cfg.bounds;
        let avg = &league.averages;
        let s = target.strength;
        let mut c = Vec::new();

        let rates = BattingRates {
            bb_pct: bounded(
                "bb_pct",
                shrink(raw.bb_pct, avg.bb_pct + target.bb_pct, pa, k.bb_pct * s),
                &b.bb_pct,
                &mut c,
            ),
            k_pct: bounded(
                "k_pct",
                shrink(raw.k_pct, avg.k_pct + target.k_pct, pa, k.k_pct * s),
                &b.k_pct,
                &mut c,
            ),
            hr_pct: bounded(
                "hr_pct",
                shrink(raw.hr_pct, avg.hr_pct + target.hr_pct, pa, k.hr_pct * s),
                &b.hr_pct,
                &mut c,
            ),
            avg: bounded(
                "avg",
                shrink(raw.avg, avg.avg + target.avg, pa, k.avg * s),
                &b.avg,
                &mut c,
            ),
            doubles_rate: bounded(
                "doubles_rate",
                shrink(raw.doubles_rate, avg.doubles_rate, pa, k.doubles_rate),
                &b.doubles_rate,
                &mut c,
            ),
            triples_rate: bounded(
                "triples_rate",
                shrink(raw.triples_rate, avg.triples_rate, pa, k.triples_rate),
                &b.triples_rate,
                &mut c,
            ),
            sb_rate: bounded(
                "sb_rate",
                shrink(raw.sb_rate, avg.sb_rate, pa, k.sb_rate),
                &b.sb_rate,
                &mut c,
            ),
        };
        Regressed {
            rates,
            tier,
            clamped: c,
        }
    }
}

fn bounded(stat: &'static str, value: f64, bounds: &Bounds, clamped: &mut Vec<&'static str>) -> f64 {
    if bounds.contains(value) {
        return value;
    }
    debug!(
        "regressed {} = {:.4} outside [{}, {}], clamping",
        stat, value, bounds.min, bounds.max
    );
    clamped.push(stat);
    bounds.clamp(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
