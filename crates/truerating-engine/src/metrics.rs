// Derived value metrics: FIP and pitcher WAR, wOBA, slash line and batter WAR.
//
// All league constants are passed in explicitly; `LeagueContext` wraps these
// functions with its own per-year values.

use serde::{Deserialize, Serialize};

use crate::config::WobaWeights;
use crate::types::{BattingCounts, BattingRates, PitchingRates};

/// `FIP = (13·HR9 + 3·BB9 − 2·K9) / 9 + constant`
pub fn fip(rates: &PitchingRates, fip_constant: f64) -> f64 {
    (13.0 * rates.hr9 + 3.0 * rates.bb9 - 2.0 * rates.k9) / 9.0 + fip_constant
}

/// `WAR = ((replacement FIP − FIP) / runs per win) × (IP / 9)`
pub fn pitcher_war(fip: f64, ip: f64, replacement_fip: f64, runs_per_win: f64) -> f64 {
    if runs_per_win <= 0.0 {
        return 0.0;
    }
    (replacement_fip - fip) / runs_per_win * (ip / 9.0)
}

/// The FIP constant that makes league FIP equal league ERA:
/// `ERA − (13·HR + 3·BB − 2·K) / IP`.
pub fn fip_constant(era: f64, k: f64, bb: f64, hr: f64, ip: f64) -> f64 {
    if ip <= 0.0 {
        return era;
    }
    era - (13.0 * hr + 3.0 * bb - 2.0 * k) / ip
}

/// AVG / OBP / SLG.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlashLine {
    pub avg: f64,
    pub obp: f64,
    pub slg: f64,
}

impl SlashLine {
    pub fn ops(&self) -> f64 {
        self.obp + self.slg
    }
}

/// Per-plate-appearance event frequencies implied by a rate line.
#[derive(Debug, Clone, Copy)]
struct PerPa {
    bb: f64,
    single: f64,
    double: f64,
    triple: f64,
    hr: f64,
    ab: f64,
}

fn per_pa(rates: &BattingRates) -> PerPa {
    let ab = rates.ab_per_pa();
    let hits = rates.avg * ab;
    let double = rates.doubles_rate * ab;
    let triple = rates.triples_rate * ab;
    let hr = rates.hr_pct;
    PerPa {
        bb: rates.bb_pct,
        single: (hits - double - triple - hr).max(0.0),
        double,
        triple,
        hr,
        ab,
    }
}

pub fn slash_line(rates: &BattingRates) -> SlashLine {
    let e = per_pa(rates);
    let hits = e.single + e.double + e.triple + e.hr;
    let total_bases = e.single + 2.0 * e.double + 3.0 * e.triple + 4.0 * e.hr;
    SlashLine {
        avg: rates.avg,
        obp: hits + e.bb,
        slg: if e.ab > 0.0 { total_bases / e.ab } else { 0.0 },
    }
}

/// Linear-weights wOBA for a rate line.
pub fn woba(rates: &BattingRates, w: &WobaWeights) -> f64 {
    let e = per_pa(rates);
    w.bb * e.bb + w.single * e.single + w.double * e.double + w.triple * e.triple + w.hr * e.hr
}

/// Linear-weights wOBA straight from counting stats.
pub fn woba_from_counts(c: &BattingCounts, w: &WobaWeights) -> f64 {
    if c.pa <= 0.0 {
        return 0.0;
    }
    (w.bb * c.bb + w.single * c.singles() + w.double * c.doubles + w.triple * c.triples + w.hr * c.hr)
        / c.pa
}

/// Batting runs above average plus replacement runs, in wins.
pub fn batter_war(
    woba: f64,
    pa: f64,
    league_woba: f64,
    woba_scale: f64,
    replacement_runs_per_600: f64,
    runs_per_win: f64,
) -> f64 {
    if runs_per_win <= 0.0 || woba_scale <= 0.0 {
        return 0.0;
    }
    let batting_runs = (woba - league_woba) / woba_scale * pa;
    let replacement_runs = replacement_runs_per_600 * pa / 600.0;
    (batting_runs + replacement_runs) / runs_per_win
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
