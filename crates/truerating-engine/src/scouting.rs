// Scouting grades: source resolution, name matching, grade-to-rate mapping
// and the stats/scouting blend.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{BlendConfig, ScoutingConfig};
use crate::types::{BatterSkills, BattingRates, PitcherSkills, PitchingRates, SkillGrades};

// ---------------------------------------------------------------------------
// Grades
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoutingSource {
    /// User-submitted scouting.
    Primary,
    /// League-wide aggregate.
    Fallback,
}

/// One versioned set of scouting grades for one player from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoutingGrade {
    /// 0 when the source carries no id.
    pub player_id: u32,
    pub name: Option<String>,
    pub skills: SkillGrades,
    pub overall_stars: Option<f64>,
    pub potential_stars: Option<f64>,
    pub age: Option<u32>,
    pub source: ScoutingSource,
    pub as_of: Option<NaiveDate>,
}

impl ScoutingGrade {
    pub fn pitcher_skills(&self) -> Option<&PitcherSkills> {
        match &self.skills {
            SkillGrades::Pitcher(s) => Some(s),
            SkillGrades::Batter(_) => None,
        }
    }

    pub fn batter_skills(&self) -> Option<&BatterSkills> {
        match &self.skills {
            SkillGrades::Batter(s) => Some(s),
            SkillGrades::Pitcher(_) => None,
        }
    }

    /// Potential minus overall, in stars. Zero when either is missing.
    pub fn star_gap(&self) -> f64 {
        match (self.overall_stars, self.potential_stars) {
            (Some(ovr), Some(pot)) => (pot - ovr).max(0.0),
            _ => 0.0,
        }
    }
}

/// Lowercase, strip punctuation, drop generational suffixes, collapse spaces.
pub fn normalize_name(name: &str) -> String {
    const SUFFIXES: [&str; 5] = ["jr", "sr", "ii", "iii", "iv"];
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c.to_ascii_lowercase()
            } else if c == '-' {
                ' '
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect();
    cleaned
        .split_whitespace()
        .filter(|token| !SUFFIXES.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Per-source index
// ---------------------------------------------------------------------------

/// Outcome of a name lookup. Ambiguity is a distinct result, never a guess.
#[derive(Debug, Clone, PartialEq)]
pub enum NameMatch<'a> {
    Found(&'a ScoutingGrade),
    Ambiguous { candidates: Vec<u32> },
    NotFound,
}

/// All grade versions from one source, indexed by id and normalized name.
#[derive(Debug, Clone, Default)]
pub struct ScoutingIndex {
    grades: Vec<ScoutingGrade>,
    by_id: HashMap<u32, Vec<usize>>,
    by_name: HashMap<String, Vec<usize>>,
}

impl ScoutingIndex {
    /// Build an index. A later grade with the same (player, as-of date)
    /// replaces an earlier one.
    pub fn new(grades: Vec<ScoutingGrade>) -> Self {
        let mut deduped: Vec<ScoutingGrade> = Vec::with_capacity(grades.len());
        let mut seen: HashMap<(u32, String, Option<NaiveDate>), usize> = HashMap::new();
        for grade in grades {
            let name_key = grade.name.as_deref().map(normalize_name).unwrap_or_default();
            let key = if grade.player_id != 0 {
                (grade.player_id, String::new(), grade.as_of)
            } else {
                (0, name_key, grade.as_of)
            };
            match seen.get(&key) {
                Some(&i) => {
                    debug!("duplicate scouting grade for {:?}, keeping the later row", key);
                    deduped[i] = grade;
                }
                None => {
                    seen.insert(key, deduped.len());
                    deduped.push(grade);
                }
            }
        }

        let mut by_id: HashMap<u32, Vec<usize>> = HashMap::new();
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, grade) in deduped.iter().enumerate() {
            if grade.player_id != 0 {
                by_id.entry(grade.player_id).or_default().push(i);
            }
            if let Some(name) = &grade.name {
                let key = normalize_name(name);
                if !key.is_empty() {
                    by_name.entry(key).or_default().push(i);
                }
            }
        }

        Self {
            grades: deduped,
            by_id,
            by_name,
        }
    }

    pub fn len(&self) -> usize {
        self.grades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }

    pub fn grades(&self) -> &[ScoutingGrade] {
        &self.grades
    }

    /// Latest grade for `player_id` as of `year`, else its most recent grade.
    pub fn by_id(&self, player_id: u32, year: i32) -> Option<&ScoutingGrade> {
        if player_id == 0 {
            return None;
        }
        self.by_id
            .get(&player_id)
            .and_then(|idx| self.latest_as_of(idx, year))
    }

    /// Match `player_id` on normalized name. Accepted only when exactly one
    /// player carries the name, and that grade has no id or the same id.
    /// A grade filed under another player's id is never taken by name.
    pub fn by_name(&self, name: &str, player_id: u32, year: i32) -> NameMatch<'_> {
        let Some(idx) = self.by_name.get(&normalize_name(name)) else {
            return NameMatch::NotFound;
        };
        let mut ids: Vec<u32> = idx.iter().map(|i| self.grades[*i].player_id).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() > 1 {
            return NameMatch::Ambiguous { candidates: ids };
        }
        let owner = ids.first().copied().unwrap_or(0);
        if owner != 0 && player_id != 0 && owner != player_id {
            return NameMatch::NotFound;
        }
        match self.latest_as_of(idx, year) {
            Some(grade) => NameMatch::Found(grade),
            None => NameMatch::NotFound,
        }
    }

    fn latest_as_of(&self, idx: &[usize], year: i32) -> Option<&ScoutingGrade> {
        let versions = idx.iter().map(|i| &self.grades[*i]);
        versions
            .clone()
            .filter(|g| g.as_of.map_or(true, |d| d.year() <= year))
            .max_by_key(|g| g.as_of)
            .or_else(|| versions.max_by_key(|g| g.as_of))
    }
}

// ---------------------------------------------------------------------------
// Source resolution
// ---------------------------------------------------------------------------

/// The grade to use for a player plus, when both sources cover the player,
/// the other grade for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedScouting {
    pub active: Option<ScoutingGrade>,
    pub comparison: Option<ScoutingGrade>,
    /// A name lookup hit several players in some source.
    pub ambiguous: bool,
}

/// Primary and fallback indexes for one side of the ball.
#[derive(Debug, Clone, Default)]
pub struct ScoutingBook {
    pub primary: ScoutingIndex,
    pub fallback: ScoutingIndex,
}

impl ScoutingBook {
    pub fn new(primary: ScoutingIndex, fallback: ScoutingIndex) -> Self {
        Self { primary, fallback }
    }

    /// Primary by id, then primary by unique name, then the same for fallback.
    pub fn resolve(&self, player_id: u32, name: Option<&str>, year: i32) -> ResolvedScouting {
        let mut ambiguous = false;
        let mut find = |index: &ScoutingIndex| -> Option<ScoutingGrade> {
            if let Some(grade) = index.by_id(player_id, year) {
                return Some(grade.clone());
            }
            match name.map(|n| index.by_name(n, player_id, year)) {
                Some(NameMatch::Found(grade)) => Some(grade.clone()),
                Some(NameMatch::Ambiguous { candidates }) => {
                    debug!(
                        "ambiguous scouting name match for player {} ({:?}): {:?}",
                        player_id, name, candidates
                    );
                    ambiguous = true;
                    None
                }
                Some(NameMatch::NotFound) | None => None,
            }
        };

        let primary = find(&self.primary);
        let fallback = find(&self.fallback);
        let (active, comparison) = match (primary, fallback) {
            (Some(p), f) => (Some(p), f),
            (None, f) => (f, None),
        };
        ResolvedScouting {
            active,
            comparison,
            ambiguous,
        }
    }
}

// ---------------------------------------------------------------------------
// Grade <-> rate mapping
// ---------------------------------------------------------------------------

/// Fixed linear maps between 20-80 grades and rate stats, with inverses.
#[derive(Debug, Clone, Copy)]
pub struct ScoutingMap<'a> {
    config: &'a ScoutingConfig,
}

impl<'a> ScoutingMap<'a> {
    pub fn new(config: &'a ScoutingConfig) -> Self {
        Self { config }
    }

    pub fn pitching_rates(&self, skills: &PitcherSkills) -> PitchingRates {
        let c = &self.config.pitching;
        PitchingRates {
            k9: c.k9.eval(skills.stuff).max(0.0),
            bb9: c.bb9.eval(skills.control).max(0.0),
            hr9: c.hr9.eval(skills.hra).max(0.0),
        }
    }

    /// Skills implied by observed rates. Stamina has no rate and is passed in.
    pub fn pitcher_skills(&self, rates: &PitchingRates, stamina: f64) -> PitcherSkills {
        let c = &self.config.pitching;
        PitcherSkills {
            stuff: c.k9.invert(rates.k9),
            control: c.bb9.invert(rates.bb9),
            hra: c.hr9.invert(rates.hr9),
            stamina,
        }
    }

    /// Batting rates from grades. Grades carry no gap skill, so doubles and
    /// triples come from `baseline`.
    pub fn batting_rates(&self, skills: &BatterSkills, baseline: &BattingRates) -> BattingRates {
        let c = &self.config.batting;
        BattingRates {
            bb_pct: c.bb_pct.eval(skills.eye).max(0.0),
            k_pct: c.k_pct.eval(skills.avoid_k).max(0.0),
            hr_pct: c.hr_pct.eval(skills.power).max(0.0),
            avg: c.avg.eval(skills.avoid_k).max(0.0),
            doubles_rate: baseline.doubles_rate,
            triples_rate: baseline.triples_rate,
            sb_rate: c.sb_rate.eval(skills.speed).max(0.0),
        }
    }

    pub fn batter_skills(&self, rates: &BattingRates) -> BatterSkills {
        let c = &self.config.batting;
        BatterSkills {
            power: c.hr_pct.invert(rates.hr_pct),
            eye: c.bb_pct.invert(rates.bb_pct),
            avoid_k: c.k_pct.invert(rates.k_pct),
            speed: c.sb_rate.invert(rates.sb_rate),
        }
    }
}

// ---------------------------------------------------------------------------
// Blend
// ---------------------------------------------------------------------------

/// Weight on the scouting estimate: high for small samples, young players
/// and large potential gaps; capped at `max_weight`.
pub fn scouting_weight(
    blend: &BlendConfig,
    sample: f64,
    sample_constant: f64,
    age: Option<u32>,
    star_gap: f64,
) -> f64 {
    let sample = sample.max(0.0);
    let sample_factor = if sample_constant + sample > 0.0 {
        sample_constant / (sample_constant + sample)
    } else {
        0.0
    };
    let age_bonus = age
        .map(|a| ((blend.young_age - a as f64) * blend.age_bonus_per_year).max(0.0))
        .unwrap_or(0.0);
    let gap_bonus = star_gap.max(0.0) / 4.0 * blend.gap_bonus;

    (blend.floor_weight + blend.sample_bonus * sample_factor + age_bonus + gap_bonus)
        .min(blend.max_weight)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
