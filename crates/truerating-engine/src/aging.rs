// Age-indexed aging curves applied year by year to a skill vector.

use serde::Deserialize;
use tracing::debug;

use crate::config::ConfigError;
use crate::types::SkillSet;

const MAX_BANDS: usize = 8;

/// One age band: the per-skill change for a year spent at any age in
/// `min_age..max_age`. `max_age = None` means open-ended.
#[derive(Debug, Clone, Deserialize)]
pub struct AgeBand<S> {
    pub min_age: u32,
    pub max_age: Option<u32>,
    pub deltas: S,
}

/// Validated, ordered age bands partitioning `[0, inf)`.
#[derive(Debug, Clone)]
pub struct AgingCurveTable<S> {
    bands: Vec<AgeBand<S>>,
}

impl<S> AgingCurveTable<S> {
    /// Validate and build a table. `field` names the config table in errors.
    pub fn new(field: &str, mut bands: Vec<AgeBand<S>>) -> Result<Self, ConfigError> {
        if bands.is_empty() {
            return Err(ConfigError::invalid(field, "must contain at least one age band"));
        }
        if bands.len() > MAX_BANDS {
            return Err(ConfigError::invalid(
                field,
                format!("at most {MAX_BANDS} age bands allowed, got {}", bands.len()),
            ));
        }
        bands.sort_by_key(|b| b.min_age);

        if bands[0].min_age != 0 {
            return Err(ConfigError::invalid(
                field,
                format!("first band must start at age 0, starts at {}", bands[0].min_age),
            ));
        }
        for pair in bands.windows(2) {
            let (cur, next) = (&pair[0], &pair[1]);
            let Some(end) = cur.max_age else {
                return Err(ConfigError::invalid(
                    field,
                    format!("band starting at {} is open-ended but is not last", cur.min_age),
                ));
            };
            if end <= cur.min_age {
                return Err(ConfigError::invalid(
                    field,
                    format!("band {}..{} is empty", cur.min_age, end),
                ));
            }
            if end < next.min_age {
                return Err(ConfigError::invalid(
                    field,
                    format!("gap between ages {} and {}", end, next.min_age),
                ));
            }
            if end > next.min_age {
                return Err(ConfigError::invalid(
                    field,
                    format!("bands overlap between ages {} and {}", next.min_age, end),
                ));
            }
        }
        if let Some(last) = bands.last() {
            if last.max_age.is_some() {
                return Err(ConfigError::invalid(field, "last band must be open-ended"));
            }
        }
        Ok(Self { bands })
    }

    /// Deltas for one year spent at `age`. Bands are sorted, contiguous and
    /// start at 0, so the last band starting at or below `age` covers it.
    pub fn deltas_at(&self, age: u32) -> &S {
        let idx = self
            .bands
            .iter()
            .rposition(|b| b.min_age <= age)
            .unwrap_or(0);
        &self.bands[idx].deltas
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

/// Result of moving a skill vector through a span of years.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aged<S> {
    pub skills: S,
    /// Whether any step hit a scale bound.
    pub clamped: bool,
}

/// Walks a skill vector from one age to another, one year at a time.
#[derive(Debug, Clone, Copy)]
pub struct AgingProjector {
    skill_min: f64,
    skill_max: f64,
}

impl AgingProjector {
    pub fn new(skill_min: f64, skill_max: f64) -> Self {
        Self {
            skill_min,
            skill_max,
        }
    }

    /// Project `skills` from `from_age` to `to_age`. Forward steps add the
    /// delta of each age passed through; backward steps subtract it, so a
    /// round trip is not guaranteed to be symmetric once a bound is hit.
    pub fn project<S: SkillSet>(
        &self,
        table: &AgingCurveTable<S>,
        skills: &S,
        from_age: u32,
        to_age: u32,
    ) -> Aged<S> {
        let mut current = *skills;
        let mut clamped = false;

        let (ages, sign): (Vec<u32>, f64) = if to_age >= from_age {
            ((from_age..to_age).collect(), 1.0)
        } else {
            ((to_age..from_age).rev().collect(), -1.0)
        };

        for age in ages {
            let (next, hit) =
                current.step(table.deltas_at(age), sign, self.skill_min, self.skill_max);
            current = next;
            clamped |= hit;
        }

        if clamped {
            debug!("aging {} -> {} hit a skill bound", from_age, to_age);
        }
        Aged {
            skills: current,
            clamped,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
