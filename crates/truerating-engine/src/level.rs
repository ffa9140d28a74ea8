// Minor-league to MLB-equivalent level translation.
//
// Pure lookup-and-add: offsets come from engine.toml, nothing is estimated here.
// Results are not floored, so a translation always inverts exactly; counts
// rebuilt from a translated rate are floored at zero by the aggregator.

use crate::config::{LevelConfig, LevelOffsets};
use crate::types::{BattingRates, Level, PitchingRates};

/// Translates rate stats between a minor-league level and the MLB scale.
#[derive(Debug, Clone, Copy)]
pub struct LevelTranslator<'a> {
    config: &'a LevelConfig,
}

impl<'a> LevelTranslator<'a> {
    pub fn new(config: &'a LevelConfig) -> Self {
        Self { config }
    }

    /// Offsets for a level, or `None` for MLB and unrecognized levels.
    pub fn offsets(&self, level: Level) -> Option<&'a LevelOffsets> {
        match level {
            Level::Aaa => Some(&self.config.aaa),
            Level::Aa => Some(&self.config.aa),
            Level::A => Some(&self.config.a),
            Level::Rookie => Some(&self.config.rookie),
            Level::Mlb | Level::Other(_) => None,
        }
    }

    /// MLB-equivalent pitching rates. MLB and unknown levels pass through.
    pub fn translate_pitching(&self, level: Level, rates: &PitchingRates) -> PitchingRates {
        self.shift_pitching(level, rates, 1.0)
    }

    /// Undo `translate_pitching`.
    pub fn untranslate_pitching(&self, level: Level, rates: &PitchingRates) -> PitchingRates {
        self.shift_pitching(level, rates, -1.0)
    }

    /// MLB-equivalent batting rates. Only BB%, K%, HR% and AVG are adjusted.
    pub fn translate_batting(&self, level: Level, rates: &BattingRates) -> BattingRates {
        self.shift_batting(level, rates, 1.0)
    }

    pub fn untranslate_batting(&self, level: Level, rates: &BattingRates) -> BattingRates {
        self.shift_batting(level, rates, -1.0)
    }

    fn shift_pitching(&self, level: Level, rates: &PitchingRates, sign: f64) -> PitchingRates {
        let Some(o) = self.offsets(level) else {
            return *rates;
        };
        PitchingRates {
            k9: rates.k9 + sign * o.k9,
            bb9: rates.bb9 + sign * o.bb9,
            hr9: rates.hr9 + sign * o.hr9,
        }
    }

    fn shift_batting(&self, level: Level, rates: &BattingRates, sign: f64) -> BattingRates {
        let Some(o) = self.offsets(level) else {
            return *rates;
        };
        BattingRates {
            bb_pct: rates.bb_pct + sign * o.bb_pct,
            k_pct: rates.k_pct + sign * o.k_pct,
            hr_pct: rates.hr_pct + sign * o.hr_pct,
            avg: rates.avg + sign * o.avg,
            ..*rates
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    fn sample_pitching() -> PitchingRates {
        PitchingRates {
            k9: 8.1,
            bb9: 3.4,
            hr9: 0.95,
        }
    }

    fn sample_batting() -> BattingRates {
        BattingRates {
            bb_pct: 0.09,
            k_pct: 0.21,
            hr_pct: 0.03,
            avg: 0.275,
            doubles_rate: 0.05,
            triples_rate: 0.005,
            sb_rate: 0.02,
        }
    }

    #[test]
    fn mlb_and_unknown_levels_pass_through() {
        let config = test_config();
        let t = LevelTranslator::new(&config.level);
        let raw = sample_pitching();
        assert_eq!(t.translate_pitching(Level::Mlb, &raw), raw);
        assert_eq!(t.translate_pitching(Level::Other(5), &raw), raw);
        assert_eq!(t.translate_batting(Level::Mlb, &sample_batting()), sample_batting());
    }

    #[test]
    fn aaa_adds_configured_offsets() {
        let config = test_config();
        let t = LevelTranslator::new(&config.level);
        let out = t.translate_pitching(Level::Aaa, &sample_pitching());
        assert!((out.k9 - (8.1 + config.level.aaa.k9)).abs() < 1e-12);
        assert!((out.bb9 - (3.4 + config.level.aaa.bb9)).abs() < 1e-12);
        assert!((out.hr9 - (0.95 + config.level.aaa.hr9)).abs() < 1e-12);
    }

    #[test]
    fn rookie_adjustment_is_largest() {
        let config = test_config();
        let t = LevelTranslator::new(&config.level);
        let raw = sample_pitching();
        let shifts: Vec<f64> = [Level::Aaa, Level::Aa, Level::A, Level::Rookie]
            .iter()
            .map(|l| (t.translate_pitching(*l, &raw).k9 - raw.k9).abs())
            .collect();
        assert!(shifts.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn translate_then_inverse_round_trips() {
        let config = test_config();
        let t = LevelTranslator::new(&config.level);
        for level in [Level::Aaa, Level::Aa, Level::A, Level::Rookie] {
            let p = t.untranslate_pitching(level, &t.translate_pitching(level, &sample_pitching()));
            assert!((p.k9 - 8.1).abs() < 1e-9);
            assert!((p.bb9 - 3.4).abs() < 1e-9);
            assert!((p.hr9 - 0.95).abs() < 1e-9);

            let b = t.untranslate_batting(level, &t.translate_batting(level, &sample_batting()));
            assert!((b.bb_pct - 0.09).abs() < 1e-9);
            assert!((b.k_pct - 0.21).abs() < 1e-9);
            assert!((b.hr_pct - 0.03).abs() < 1e-9);
            assert!((b.avg - 0.275).abs() < 1e-9);
        }
    }

    #[test]
    fn rates_below_the_offset_still_round_trip() {
        let config = test_config();
        let t = LevelTranslator::new(&config.level);
        let stingy = PitchingRates {
            k9: 0.1,
            bb9: 0.3,
            hr9: 0.0,
        };
        for level in [Level::Aaa, Level::Aa, Level::A, Level::Rookie] {
            let back = t.untranslate_pitching(level, &t.translate_pitching(level, &stingy));
            assert!((back.k9 - stingy.k9).abs() < 1e-12);
            assert!((back.bb9 - stingy.bb9).abs() < 1e-12);
            assert!((back.hr9 - stingy.hr9).abs() < 1e-12);
        }
        let translated = t.translate_pitching(Level::Aaa, &stingy);
        assert!((translated.bb9 - (0.3 + config.level.aaa.bb9)).abs() < 1e-12);
    }

    #[test]
    fn batting_translation_leaves_speed_and_gap_rates() {
        let config = test_config();
        let t = LevelTranslator::new(&config.level);
        let out = t.translate_batting(Level::Aa, &sample_batting());
        assert_eq!(out.sb_rate, 0.02);
        assert_eq!(out.doubles_rate, 0.05);
        assert!(out.k_pct > 0.21);
    }
}
