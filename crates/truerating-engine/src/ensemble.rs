// Optimistic / neutral / pessimistic scenarios and their weighted blend.

use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::config::{EnsembleConfig, ScenarioWeights};
use crate::types::{BattingRates, PitchingRates};

/// One value per scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scenarios<T> {
    pub optimistic: T,
    pub neutral: T,
    pub pessimistic: T,
}

impl<T> Scenarios<T> {
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Scenarios<U> {
        Scenarios {
            optimistic: f(&self.optimistic),
            neutral: f(&self.neutral),
            pessimistic: f(&self.pessimistic),
        }
    }
}

impl Scenarios<f64> {
    pub fn weighted(&self, w: &ScenarioWeights) -> f64 {
        self.optimistic * w.optimistic + self.neutral * w.neutral + self.pessimistic * w.pessimistic
    }
}

/// Rate lines the ensemble can combine. "Worse" is per stat: fewer strikeouts
/// for a pitcher, more strikeouts for a batter, and so on.
pub trait ScenarioRates: Copy {
    fn lerp(&self, other: &Self, w: f64) -> Self;

    /// Per stat, the worse of the two lines.
    fn worse_of(&self, other: &Self) -> Self;

    /// Per-stat change from `prev` to `last`, keeping only the stats that got
    /// worse; improvements are zeroed.
    fn decline(prev: &Self, last: &Self) -> Self;

    /// `self + delta * w`, floored at zero per stat.
    fn shifted(&self, delta: &Self, w: f64) -> Self;

    /// Weighted combination of three lines with weights summing to 1.
    fn weighted(s: &Scenarios<Self>, w: &ScenarioWeights) -> Self;
}

impl ScenarioRates for PitchingRates {
    fn lerp(&self, other: &Self, w: f64) -> Self {
        PitchingRates::lerp(self, other, w)
    }

    fn worse_of(&self, other: &Self) -> Self {
        PitchingRates {
            k9: self.k9.min(other.k9),
            bb9: self.bb9.max(other.bb9),
            hr9: self.hr9.max(other.hr9),
        }
    }

    fn decline(prev: &Self, last: &Self) -> Self {
        PitchingRates {
            k9: (last.k9 - prev.k9).min(0.0),
            bb9: (last.bb9 - prev.bb9).max(0.0),
            hr9: (last.hr9 - prev.hr9).max(0.0),
        }
    }

    fn shifted(&self, delta: &Self, w: f64) -> Self {
        PitchingRates {
            k9: (self.k9 + delta.k9 * w).max(0.0),
            bb9: (self.bb9 + delta.bb9 * w).max(0.0),
            hr9: (self.hr9 + delta.hr9 * w).max(0.0),
        }
    }

    fn weighted(s: &Scenarios<Self>, w: &ScenarioWeights) -> Self {
        PitchingRates {
            k9: s.map(|r| r.k9).weighted(w),
            bb9: s.map(|r| r.bb9).weighted(w),
            hr9: s.map(|r| r.hr9).weighted(w),
        }
    }
}

impl ScenarioRates for BattingRates {
    fn lerp(&self, other: &Self, w: f64) -> Self {
        BattingRates::lerp(self, other, w)
    }

    fn worse_of(&self, other: &Self) -> Self {
        BattingRates {
            bb_pct: self.bb_pct.min(other.bb_pct),
            k_pct: self.k_pct.max(other.k_pct),
            hr_pct: self.hr_pct.min(other.hr_pct),
            avg: self.avg.min(other.avg),
            doubles_rate: self.doubles_rate.min(other.doubles_rate),
            triples_rate: self.triples_rate.min(other.triples_rate),
            sb_rate: self.sb_rate.min(other.sb_rate),
        }
    }

    fn decline(prev: &Self, last: &Self) -> Self {
        let drop = |p: f64, l: f64| (l - p).min(0.0);
        BattingRates {
            bb_pct: drop(prev.bb_pct, last.bb_pct),
            k_pct: (last.k_pct - prev.k_pct).max(0.0),
            hr_pct: drop(prev.hr_pct, last.hr_pct),
            avg: drop(prev.avg, last.avg),
            doubles_rate: drop(prev.doubles_rate, last.doubles_rate),
            triples_rate: drop(prev.triples_rate, last.triples_rate),
            sb_rate: drop(prev.sb_rate, last.sb_rate),
        }
    }

    fn shifted(&self, delta: &Self, w: f64) -> Self {
        let add = |v: f64, d: f64| (v + d * w).max(0.0);
        BattingRates {
            bb_pct: add(self.bb_pct, delta.bb_pct),
            k_pct: add(self.k_pct, delta.k_pct),
            hr_pct: add(self.hr_pct, delta.hr_pct),
            avg: add(self.avg, delta.avg),
            doubles_rate: add(self.doubles_rate, delta.doubles_rate),
            triples_rate: add(self.triples_rate, delta.triples_rate),
            sb_rate: add(self.sb_rate, delta.sb_rate),
        }
    }

    fn weighted(s: &Scenarios<Self>, w: &ScenarioWeights) -> Self {
        BattingRates {
            bb_pct: s.map(|r| r.bb_pct).weighted(w),
            k_pct: s.map(|r| r.k_pct).weighted(w),
            hr_pct: s.map(|r| r.hr_pct).weighted(w),
            avg: s.map(|r| r.avg).weighted(w),
            doubles_rate: s.map(|r| r.doubles_rate).weighted(w),
            triples_rate: s.map(|r| r.triples_rate).weighted(w),
            sb_rate: s.map(|r| r.sb_rate).weighted(w),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnsembleProjector<'a> {
    config: &'a EnsembleConfig,
}

impl<'a> EnsembleProjector<'a> {
    pub fn new(config: &'a EnsembleConfig) -> Self {
        Self { config }
    }

    /// Decline between the last two observed seasons, when both carry at
    /// least `min_volume`.
    pub fn trend<R: ScenarioRates>(
        &self,
        aggregate: Option<&Aggregate<R>>,
        min_volume: f64,
    ) -> Option<R> {
        let (prev, last) = aggregate?.last_two()?;
        if prev.volume < min_volume || last.volume < min_volume || last.year != prev.year + 1 {
            return None;
        }
        Some(R::decline(&prev.rates, &last.rates))
    }

    /// Build the three scenarios from current rates and fully aged rates.
    ///
    /// - optimistic: the aging curve holds in full
    /// - neutral: only `neutral_aging_share` of the aging effect
    /// - pessimistic: the worse of current and aged per stat, then
    ///   `trend_weight` of any recent decline extrapolated one more year
    pub fn scenarios<R: ScenarioRates>(
        &self,
        current: &R,
        aged: &R,
        decline: Option<&R>,
    ) -> Scenarios<R> {
        let floor = current.worse_of(aged);
        let pessimistic = match decline {
            Some(d) => floor.shifted(d, self.config.trend_weight),
            None => floor,
        };
        Scenarios {
            optimistic: *aged,
            neutral: current.lerp(aged, self.config.neutral_aging_share),
            pessimistic,
        }
    }

    pub fn blend<R: ScenarioRates>(&self, scenarios: &Scenarios<R>) -> R {
        R::weighted(scenarios, &self.config.weights)
    }

    /// Whether a percentile of the projected rating stat is elite.
    pub fn is_elite(&self, percentile: f64) -> bool {
        percentile >= self.config.elite.percentile
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
