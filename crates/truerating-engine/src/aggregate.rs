// Multi-season stat aggregation with recency weighting and level translation.
//
// Counting stats, not rates, are weighted and pooled: a short outlier season
// then moves the aggregate in proportion to its innings/PA.

use std::collections::BTreeMap;

use crate::config::AggregationConfig;
use crate::level::LevelTranslator;
use crate::types::{
    BattingCounts, BattingRates, CountingStats, Level, PitchingCounts, PitchingRates,
    SeasonStatLine,
};

/// One season's translated, unweighted rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearRates<R> {
    pub year: i32,
    pub volume: f64,
    pub rates: R,
}

/// Pooled result of a player's qualifying seasons.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate<R> {
    /// MLB-equivalent rates from the weighted pool.
    pub rates: R,
    /// Recency-weighted innings or plate appearances (playing-time history).
    pub weighted_volume: f64,
    /// Unweighted innings or plate appearances across used seasons. This is
    /// the observed sample the regression and scouting blend are sized by.
    pub raw_volume: f64,
    /// Sum of recency weights over the distinct seasons used.
    pub weight_sum: f64,
    /// Per-season rates, oldest first.
    pub yearly: Vec<YearRates<R>>,
    /// Levels that had no translation offsets and were pooled as-is, from
    /// seasons inside the recency schedule only.
    pub untranslated_levels: Vec<Level>,
}

impl<R> Aggregate<R> {
    pub fn seasons(&self) -> usize {
        self.yearly.len()
    }

    /// Weighted average volume per season, for playing-time projection.
    pub fn volume_per_season(&self) -> f64 {
        if self.weight_sum <= 0.0 {
            return 0.0;
        }
        self.weighted_volume / self.weight_sum
    }

    /// The last two seasons as (previous, latest), if both exist.
    pub fn last_two(&self) -> Option<(&YearRates<R>, &YearRates<R>)> {
        match self.yearly.as_slice() {
            [.., prev, last] => Some((prev, last)),
            _ => None,
        }
    }
}

pub type PitchingAggregate = Aggregate<PitchingRates>;
pub type BattingAggregate = Aggregate<BattingRates>;

/// Merges a player's season lines into one recency-weighted aggregate.
#[derive(Debug, Clone, Copy)]
pub struct StatsAggregator<'a> {
    config: &'a AggregationConfig,
    translator: LevelTranslator<'a>,
}

impl<'a> StatsAggregator<'a> {
    pub fn new(config: &'a AggregationConfig, translator: LevelTranslator<'a>) -> Self {
        Self { config, translator }
    }

    /// Aggregate pitching lines. Returns `None` when no total-split line with
    /// innings survives filtering; callers must not regress that player.
    pub fn aggregate_pitching(&self, lines: &[SeasonStatLine]) -> Option<PitchingAggregate> {
        let entries: Vec<Entry<PitchingCounts>> = lines
            .iter()
            .filter(|l| l.is_aggregatable())
            .filter_map(|line| {
                let counts = line.pitching()?;
                let raw = PitchingRates::from_counts(counts)?;
                let translated = self.translator.translate_pitching(line.level, &raw);
                Some(Entry {
                    year: line.year,
                    level: line.level,
                    counts: translated.to_counts(counts.ip, counts.er),
                })
            })
            .collect();
        pool(entries, &self.config.recency_weights, |c| {
            PitchingRates::from_counts(c)
        })
    }

    /// Aggregate batting lines.
    pub fn aggregate_batting(&self, lines: &[SeasonStatLine]) -> Option<BattingAggregate> {
        let entries: Vec<Entry<BattingCounts>> = lines
            .iter()
            .filter(|l| l.is_aggregatable())
            .filter_map(|line| {
                let counts = line.batting()?;
                let raw = BattingRates::from_counts(counts)?;
                let translated = self.translator.translate_batting(line.level, &raw);
                Some(Entry {
                    year: line.year,
                    level: line.level,
                    counts: translated.to_counts(counts.pa, counts.ab),
                })
            })
            .collect();
        pool(entries, &self.config.recency_weights, |c| {
            BattingRates::from_counts(c)
        })
    }
}

/// One translated season line.
struct Entry<C> {
    year: i32,
    level: Level,
    counts: C,
}

/// Weight and pool translated counts. Seasons older than the weight schedule
/// (relative to the most recent season present) are dropped.
fn pool<C, R>(
    entries: Vec<Entry<C>>,
    weights: &[f64],
    to_rates: impl Fn(&C) -> Option<R>,
) -> Option<Aggregate<R>>
where
    C: CountingStats,
{
    let latest_year = entries.iter().map(|e| e.year).max()?;
    let in_schedule = |year: i32| {
        weights
            .get((latest_year - year) as usize)
            .is_some_and(|w| *w > 0.0)
    };

    // Promotions and trades leave several total lines in one year.
    let mut per_year: BTreeMap<i32, C> = BTreeMap::new();
    let mut untranslated_levels = Vec::new();
    for entry in entries {
        if matches!(entry.level, Level::Other(_))
            && in_schedule(entry.year)
            && !untranslated_levels.contains(&entry.level)
        {
            untranslated_levels.push(entry.level);
        }
        let slot = per_year.entry(entry.year).or_default();
        *slot = slot.plus(&entry.counts);
    }

    let mut pooled = C::default();
    let mut raw_volume = 0.0;
    let mut weight_sum = 0.0;
    let mut yearly = Vec::new();

    for (year, counts) in &per_year {
        let age = (latest_year - year) as usize;
        let Some(&weight) = weights.get(age) else {
            continue;
        };
        if weight <= 0.0 || counts.volume() <= 0.0 {
            continue;
        }
        pooled = pooled.plus(&counts.scaled(weight));
        raw_volume += counts.volume();
        weight_sum += weight;
        if let Some(rates) = to_rates(counts) {
            yearly.push(YearRates {
                year: *year,
                volume: counts.volume(),
                rates,
            });
        }
    }

    if pooled.volume() <= 0.0 {
        return None;
    }
    let rates = to_rates(&pooled)?;

    Some(Aggregate {
        rates,
        weighted_volume: pooled.volume(),
        raw_volume,
        weight_sum,
        yearly,
        untranslated_levels,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::types::{Split, StatCounts};

    fn pitching_line(year: i32, level: Level, ip: f64, k: f64, bb: f64, hr: f64) -> SeasonStatLine {
        SeasonStatLine {
            player_id: 7,
            name: "Test Pitcher".into(),
            year,
            level,
            split: Split::Total,
            counts: StatCounts::Pitching(PitchingCounts {
                ip,
                k,
                bb,
                hr,
                er: ip * 4.0 / 9.0,
            }),
        }
    }

    #[test]
    fn single_mlb_season_returns_its_rates() {
        let config = test_config();
        let agg = StatsAggregator::new(&config.aggregation, LevelTranslator::new(&config.level));
        let lines = vec![pitching_line(2024, Level::Mlb, 180.0, 190.0, 50.0, 18.0)];
        let out = agg.aggregate_pitching(&lines).unwrap();
        assert!((out.rates.k9 - 9.5).abs() < 1e-9);
        assert!((out.rates.bb9 - 2.5).abs() < 1e-9);
        assert!((out.rates.hr9 - 0.9).abs() < 1e-9);
        assert_eq!(out.seasons(), 1);
        assert!((out.weighted_volume - 180.0).abs() < 1e-9);
    }

    #[test]
    fn single_minor_league_season_returns_translated_rates() {
        let config = test_config();
        let agg = StatsAggregator::new(&config.aggregation, LevelTranslator::new(&config.level));
        let lines = vec![pitching_line(2024, Level::Aa, 90.0, 80.0, 40.0, 10.0)];
        let out = agg.aggregate_pitching(&lines).unwrap();
        let expected_k9 = 80.0 * 9.0 / 90.0 + config.level.aa.k9;
        assert!((out.rates.k9 - expected_k9).abs() < 1e-9);
    }

    #[test]
    fn translated_rates_below_zero_pool_as_zero_counts() {
        let config = test_config();
        let agg = StatsAggregator::new(&config.aggregation, LevelTranslator::new(&config.level));
        assert!(config.level.aaa.bb9 < 0.0);
        // No walks at AAA: the negative walk offset must not pool negative walks.
        let lines = vec![pitching_line(2024, Level::Aaa, 60.0, 50.0, 0.0, 4.0)];
        let out = agg.aggregate_pitching(&lines).unwrap();
        assert_eq!(out.rates.bb9, 0.0);
        assert!(out.rates.k9 > 0.0);
    }

    #[test]
    fn counts_are_weighted_not_rates() {
        let config = test_config();
        let agg = StatsAggregator::new(&config.aggregation, LevelTranslator::new(&config.level));
        // 2023: 20 IP at 18 K/9 (outlier); 2024: 180 IP at 9 K/9.
        let lines = vec![
            pitching_line(2023, Level::Mlb, 20.0, 40.0, 8.0, 2.0),
            pitching_line(2024, Level::Mlb, 180.0, 180.0, 50.0, 18.0),
        ];
        let out = agg.aggregate_pitching(&lines).unwrap();
        let w = config.aggregation.recency_weights[1];
        let expected = (180.0 + 40.0 * w) * 9.0 / (180.0 + 20.0 * w);
        assert!((out.rates.k9 - expected).abs() < 1e-9);
        // Naive rate averaging would land far higher.
        let naive = (9.0 + 18.0 * w) / (1.0 + w);
        assert!(out.rates.k9 < naive);
        assert!((out.weight_sum - (1.0 + w)).abs() < 1e-12);
    }

    #[test]
    fn non_total_splits_and_zero_innings_are_excluded() {
        let config = test_config();
        let agg = StatsAggregator::new(&config.aggregation, LevelTranslator::new(&config.level));
        let mut split = pitching_line(2024, Level::Mlb, 60.0, 90.0, 10.0, 2.0);
        split.split = Split::Partial("vsL".into());
        let lines = vec![
            split,
            pitching_line(2024, Level::Mlb, 0.0, 0.0, 0.0, 0.0),
            pitching_line(2024, Level::Mlb, 100.0, 100.0, 30.0, 10.0),
        ];
        let out = agg.aggregate_pitching(&lines).unwrap();
        assert!((out.rates.k9 - 9.0).abs() < 1e-9);
        assert!((out.raw_volume - 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_volume_everywhere_is_no_data() {
        let config = test_config();
        let agg = StatsAggregator::new(&config.aggregation, LevelTranslator::new(&config.level));
        let lines = vec![pitching_line(2024, Level::Mlb, 0.0, 3.0, 1.0, 0.0)];
        assert!(agg.aggregate_pitching(&lines).is_none());
        assert!(agg.aggregate_pitching(&[]).is_none());
    }

    #[test]
    fn seasons_beyond_schedule_are_dropped() {
        let config = test_config();
        let agg = StatsAggregator::new(&config.aggregation, LevelTranslator::new(&config.level));
        let depth = config.aggregation.recency_weights.len() as i32;
        let lines = vec![
            pitching_line(2024 - depth, Level::Mlb, 200.0, 300.0, 20.0, 5.0),
            pitching_line(2024, Level::Mlb, 100.0, 100.0, 30.0, 10.0),
        ];
        let out = agg.aggregate_pitching(&lines).unwrap();
        assert_eq!(out.seasons(), 1);
        assert!((out.rates.k9 - 9.0).abs() < 1e-9);
    }

    #[test]
    fn same_year_lines_merge_into_one_season() {
        let config = test_config();
        let agg = StatsAggregator::new(&config.aggregation, LevelTranslator::new(&config.level));
        let lines = vec![
            pitching_line(2024, Level::Mlb, 50.0, 50.0, 20.0, 5.0),
            pitching_line(2024, Level::Mlb, 50.0, 70.0, 10.0, 5.0),
        ];
        let out = agg.aggregate_pitching(&lines).unwrap();
        assert_eq!(out.seasons(), 1);
        assert!((out.rates.k9 - 10.8).abs() < 1e-9);
    }

    #[test]
    fn unknown_levels_are_reported() {
        let config = test_config();
        let agg = StatsAggregator::new(&config.aggregation, LevelTranslator::new(&config.level));
        let lines = vec![pitching_line(2024, Level::Other(5), 50.0, 50.0, 20.0, 5.0)];
        let out = agg.aggregate_pitching(&lines).unwrap();
        assert_eq!(out.untranslated_levels, vec![Level::Other(5)]);
    }

    #[test]
    fn levels_outside_the_schedule_are_not_reported() {
        let config = test_config();
        let agg = StatsAggregator::new(&config.aggregation, LevelTranslator::new(&config.level));
        let depth = config.aggregation.recency_weights.len() as i32;
        let lines = vec![
            pitching_line(2024 - depth, Level::Other(5), 80.0, 70.0, 30.0, 8.0),
            pitching_line(2024, Level::Mlb, 100.0, 100.0, 30.0, 10.0),
        ];
        let out = agg.aggregate_pitching(&lines).unwrap();
        assert_eq!(out.seasons(), 1);
        assert!(out.untranslated_levels.is_empty());
    }

    #[test]
    fn raw_volume_is_unweighted() {
        let config = test_config();
        let agg = StatsAggregator::new(&config.aggregation, LevelTranslator::new(&config.level));
        let w = config.aggregation.recency_weights[1];
        assert!(w < 1.0);
        let lines = vec![
            pitching_line(2023, Level::Mlb, 100.0, 90.0, 30.0, 10.0),
            pitching_line(2024, Level::Mlb, 100.0, 90.0, 30.0, 10.0),
        ];
        let out = agg.aggregate_pitching(&lines).unwrap();
        assert!((out.raw_volume - 200.0).abs() < 1e-9);
        assert!((out.weighted_volume - 100.0 * (1.0 + w)).abs() < 1e-9);
    }

    #[test]
    fn batting_lines_aggregate() {
        let config = test_config();
        let agg = StatsAggregator::new(&config.aggregation, LevelTranslator::new(&config.level));
        let line = SeasonStatLine {
            player_id: 9,
            name: "Test Batter".into(),
            year: 2024,
            level: Level::Mlb,
            split: Split::Total,
            counts: StatCounts::Batting(BattingCounts {
                pa: 600.0,
                ab: 540.0,
                h: 150.0,
                doubles: 30.0,
                triples: 3.0,
                hr: 24.0,
                bb: 54.0,
                k: 120.0,
                sb: 12.0,
            }),
        };
        let out = agg.aggregate_batting(&[line]).unwrap();
        assert!((out.rates.bb_pct - 0.09).abs() < 1e-9);
        assert!((out.rates.k_pct - 0.2).abs() < 1e-9);
        assert!((out.rates.hr_pct - 0.04).abs() < 1e-9);
        assert!((out.rates.avg - 150.0 / 540.0).abs() < 1e-9);
        assert!(agg.aggregate_pitching(&[]).is_none());
    }

    #[test]
    fn last_two_orders_previous_then_latest() {
        let config = test_config();
        let agg = StatsAggregator::new(&config.aggregation, LevelTranslator::new(&config.level));
        let lines = vec![
            pitching_line(2024, Level::Mlb, 100.0, 80.0, 30.0, 10.0),
            pitching_line(2023, Level::Mlb, 100.0, 110.0, 30.0, 10.0),
        ];
        let out = agg.aggregate_pitching(&lines).unwrap();
        let (prev, last) = out.last_two().unwrap();
        assert_eq!(prev.year, 2023);
        assert_eq!(last.year, 2024);
    }
}
