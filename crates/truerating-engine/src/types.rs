// Core value types: season stat lines, counting stats, rate stats, skill grades.
//
// Every type here is an immutable value object. Transformations elsewhere in the
// engine take these by reference and return new values.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Level of competition
// ---------------------------------------------------------------------------

/// Level of competition a season was played at.
///
/// Codes follow the league export format: MLB=1, AAA=2, AA=3, A=4, Rookie=6.
/// Any other code is carried through as `Other` and left untranslated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Mlb,
    Aaa,
    Aa,
    A,
    Rookie,
    Other(u8),
}

impl Level {
    /// Map a numeric level code to a `Level`.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Level::Mlb,
            2 => Level::Aaa,
            3 => Level::Aa,
            4 => Level::A,
            6 => Level::Rookie,
            other => Level::Other(other),
        }
    }

    /// Parse either a numeric code ("2") or a label ("AAA", "Rookie", "R").
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u8>() {
            return Some(Level::from_code(code));
        }
        match trimmed.to_uppercase().as_str() {
            "MLB" | "ML" => Some(Level::Mlb),
            "AAA" => Some(Level::Aaa),
            "AA" => Some(Level::Aa),
            "A" => Some(Level::A),
            "R" | "ROK" | "ROOKIE" => Some(Level::Rookie),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Level::Mlb => 1,
            Level::Aaa => 2,
            Level::Aa => 3,
            Level::A => 4,
            Level::Rookie => 6,
            Level::Other(code) => *code,
        }
    }

    pub fn is_mlb(&self) -> bool {
        matches!(self, Level::Mlb)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Mlb => write!(f, "MLB"),
            Level::Aaa => write!(f, "AAA"),
            Level::Aa => write!(f, "AA"),
            Level::A => write!(f, "A"),
            Level::Rookie => write!(f, "R"),
            Level::Other(code) => write!(f, "L{code}"),
        }
    }
}

/// Which split of a season a stat line covers. Only `Total` lines are aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Split {
    Total,
    Partial(String),
}

impl Split {
    /// Parse a split label. Empty, "total" and the export's split id "1" mean total.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "1" || trimmed.eq_ignore_ascii_case("total") {
            Split::Total
        } else {
            Split::Partial(trimmed.to_string())
        }
    }

    pub fn is_total(&self) -> bool {
        matches!(self, Split::Total)
    }
}

// ---------------------------------------------------------------------------
// Counting stats
// ---------------------------------------------------------------------------

/// Pitching counting stats for one season line. Fractional values are allowed
/// because recency weighting scales counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PitchingCounts {
    pub ip: f64,
    pub k: f64,
    pub bb: f64,
    pub hr: f64,
    pub er: f64,
}

/// Batting counting stats for one season line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BattingCounts {
    pub pa: f64,
    pub ab: f64,
    pub h: f64,
    pub doubles: f64,
    pub triples: f64,
    pub hr: f64,
    pub bb: f64,
    pub k: f64,
    pub sb: f64,
}

impl BattingCounts {
    pub fn singles(&self) -> f64 {
        (self.h - self.doubles - self.triples - self.hr).max(0.0)
    }
}

/// Shared arithmetic over counting-stat records, used by the aggregator to pool
/// weighted seasons without caring whether the player pitches or hits.
pub trait CountingStats: Copy + Default {
    /// Innings pitched or plate appearances.
    fn volume(&self) -> f64;
    fn scaled(&self, factor: f64) -> Self;
    fn plus(&self, other: &Self) -> Self;
}

impl CountingStats for PitchingCounts {
    fn volume(&self) -> f64 {
        self.ip
    }

    fn scaled(&self, factor: f64) -> Self {
        PitchingCounts {
            ip: self.ip * factor,
            k: self.k * factor,
            bb: self.bb * factor,
            hr: self.hr * factor,
            er: self.er * factor,
        }
    }

    fn plus(&self, other: &Self) -> Self {
        PitchingCounts {
            ip: self.ip + other.ip,
            k: self.k + other.k,
            bb: self.bb + other.bb,
            hr: self.hr + other.hr,
            er: self.er + other.er,
        }
    }
}

impl CountingStats for BattingCounts {
    fn volume(&self) -> f64 {
        self.pa
    }

    fn scaled(&self, factor: f64) -> Self {
        BattingCounts {
            pa: self.pa * factor,
            ab: self.ab * factor,
            h: self.h * factor,
            doubles: self.doubles * factor,
            triples: self.triples * factor,
            hr: self.hr * factor,
            bb: self.bb * factor,
            k: self.k * factor,
            sb: self.sb * factor,
        }
    }

    fn plus(&self, other: &Self) -> Self {
        BattingCounts {
            pa: self.pa + other.pa,
            ab: self.ab + other.ab,
            h: self.h + other.h,
            doubles: self.doubles + other.doubles,
            triples: self.triples + other.triples,
            hr: self.hr + other.hr,
            bb: self.bb + other.bb,
            k: self.k + other.k,
            sb: self.sb + other.sb,
        }
    }
}

// ---------------------------------------------------------------------------
// Rate stats
// ---------------------------------------------------------------------------

/// Per-nine-innings pitching rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchingRates {
    pub k9: f64,
    pub bb9: f64,
    pub hr9: f64,
}

impl PitchingRates {
    /// Rates from counts. Returns `None` when there are no innings.
    pub fn from_counts(c: &PitchingCounts) -> Option<Self> {
        if c.ip <= 0.0 {
            return None;
        }
        Some(PitchingRates {
            k9: c.k * 9.0 / c.ip,
            bb9: c.bb * 9.0 / c.ip,
            hr9: c.hr * 9.0 / c.ip,
        })
    }

    /// Rebuild counting stats for `ip` innings at these rates. Earned runs are
    /// not rate-derived and are carried from `er`. A negative rate (a level
    /// offset larger than the raw rate) rebuilds as zero.
    pub fn to_counts(&self, ip: f64, er: f64) -> PitchingCounts {
        let count = |rate: f64| (rate * ip / 9.0).max(0.0);
        PitchingCounts {
            ip,
            k: count(self.k9),
            bb: count(self.bb9),
            hr: count(self.hr9),
            er,
        }
    }

    /// Per-stat weighted average: `self * (1 - w) + other * w`.
    pub fn lerp(&self, other: &Self, w: f64) -> Self {
        PitchingRates {
            k9: self.k9 + (other.k9 - self.k9) * w,
            bb9: self.bb9 + (other.bb9 - self.bb9) * w,
            hr9: self.hr9 + (other.hr9 - self.hr9) * w,
        }
    }
}

/// Per-plate-appearance batting rates. `avg`, `doubles_rate` and
/// `triples_rate` are per at-bat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattingRates {
    pub bb_pct: f64,
    pub k_pct: f64,
    pub hr_pct: f64,
    pub avg: f64,
    pub doubles_rate: f64,
    pub triples_rate: f64,
    pub sb_rate: f64,
}

impl BattingRates {
    pub fn from_counts(c: &BattingCounts) -> Option<Self> {
        if c.pa <= 0.0 {
            return None;
        }
        let per_ab = |v: f64| if c.ab > 0.0 { v / c.ab } else { 0.0 };
        Some(BattingRates {
            bb_pct: c.bb / c.pa,
            k_pct: c.k / c.pa,
            hr_pct: c.hr / c.pa,
            avg: per_ab(c.h),
            doubles_rate: per_ab(c.doubles),
            triples_rate: per_ab(c.triples),
            sb_rate: c.sb / c.pa,
        })
    }

    /// At-bats per plate appearance implied by these rates, assuming every
    /// non-walk plate appearance is an at-bat.
    pub fn ab_per_pa(&self) -> f64 {
        (1.0 - self.bb_pct).max(0.0)
    }

    /// Rebuild counting stats for `pa` plate appearances at these rates.
    /// Negative rates rebuild as zero.
    pub fn to_counts(&self, pa: f64, ab: f64) -> BattingCounts {
        let per_ab = |rate: f64| (rate * ab).max(0.0);
        let per_pa = |rate: f64| (rate * pa).max(0.0);
        BattingCounts {
            pa,
            ab,
            h: per_ab(self.avg),
            doubles: per_ab(self.doubles_rate),
            triples: per_ab(self.triples_rate),
            hr: per_pa(self.hr_pct),
            bb: per_pa(self.bb_pct),
            k: per_pa(self.k_pct),
            sb: per_pa(self.sb_rate),
        }
    }

    pub fn lerp(&self, other: &Self, w: f64) -> Self {
        let mix = |a: f64, b: f64| a + (b - a) * w;
        BattingRates {
            bb_pct: mix(self.bb_pct, other.bb_pct),
            k_pct: mix(self.k_pct, other.k_pct),
            hr_pct: mix(self.hr_pct, other.hr_pct),
            avg: mix(self.avg, other.avg),
            doubles_rate: mix(self.doubles_rate, other.doubles_rate),
            triples_rate: mix(self.triples_rate, other.triples_rate),
            sb_rate: mix(self.sb_rate, other.sb_rate),
        }
    }
}

// ---------------------------------------------------------------------------
// Season stat line
// ---------------------------------------------------------------------------

/// Counting stats for either a pitcher or a batter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StatCounts {
    Pitching(PitchingCounts),
    Batting(BattingCounts),
}

/// One ingested season row for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonStatLine {
    pub player_id: u32,
    pub name: String,
    pub year: i32,
    pub level: Level,
    pub split: Split,
    pub counts: StatCounts,
}

impl SeasonStatLine {
    pub fn volume(&self) -> f64 {
        match &self.counts {
            StatCounts::Pitching(c) => c.volume(),
            StatCounts::Batting(c) => c.volume(),
        }
    }

    pub fn pitching(&self) -> Option<&PitchingCounts> {
        match &self.counts {
            StatCounts::Pitching(c) => Some(c),
            StatCounts::Batting(_) => None,
        }
    }

    pub fn batting(&self) -> Option<&BattingCounts> {
        match &self.counts {
            StatCounts::Batting(c) => Some(c),
            StatCounts::Pitching(_) => None,
        }
    }

    /// Total split with positive volume.
    pub fn is_aggregatable(&self) -> bool {
        self.split.is_total() && self.volume() > 0.0
    }
}

// ---------------------------------------------------------------------------
// Skill grades
// ---------------------------------------------------------------------------

/// Pitcher scouting skills on the 20-80 scale. Also used for aging deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PitcherSkills {
    pub stuff: f64,
    pub control: f64,
    pub hra: f64,
    pub stamina: f64,
}

/// Batter scouting skills on the 20-80 scale. Also used for aging deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatterSkills {
    pub power: f64,
    pub eye: f64,
    pub avoid_k: f64,
    pub speed: f64,
}

/// Either side of the ball's skill vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SkillGrades {
    Pitcher(PitcherSkills),
    Batter(BatterSkills),
}

/// Per-skill operations the aging projector needs.
pub trait SkillSet: Copy {
    /// Apply `self + delta * sign`, clamping every skill to `[lo, hi]`.
    /// Returns the new vector and whether any skill hit a bound.
    fn step(&self, delta: &Self, sign: f64, lo: f64, hi: f64) -> (Self, bool);
}

fn clamp_skill(v: f64, lo: f64, hi: f64, hit: &mut bool) -> f64 {
    if v < lo {
        *hit = true;
        lo
    } else if v > hi {
        *hit = true;
        hi
    } else {
        v
    }
}

impl SkillSet for PitcherSkills {
    fn step(&self, delta: &Self, sign: f64, lo: f64, hi: f64) -> (Self, bool) {
        let mut hit = false;
        let next = PitcherSkills {
            stuff: clamp_skill(self.stuff + delta.stuff * sign, lo, hi, &mut hit),
            control: clamp_skill(self.control + delta.control * sign, lo, hi, &mut hit),
            hra: clamp_skill(self.hra + delta.hra * sign, lo, hi, &mut hit),
            stamina: clamp_skill(self.stamina + delta.stamina * sign, lo, hi, &mut hit),
        };
        (next, hit)
    }
}

impl SkillSet for BatterSkills {
    fn step(&self, delta: &Self, sign: f64, lo: f64, hi: f64) -> (Self, bool) {
        let mut hit = false;
        let next = BatterSkills {
            power: clamp_skill(self.power + delta.power * sign, lo, hi, &mut hit),
            eye: clamp_skill(self.eye + delta.eye * sign, lo, hi, &mut hit),
            avoid_k: clamp_skill(self.avoid_k + delta.avoid_k * sign, lo, hi, &mut hit),
            speed: clamp_skill(self.speed + delta.speed * sign, lo, hi, &mut hit),
        };
        (next, hit)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
