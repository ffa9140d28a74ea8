// Percentile ranking against a league distribution and percentile-to-star mapping.

use serde::{Deserialize, Serialize};

use crate::config::StarConfig;

/// Whether a bigger raw value is a better player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// Sorted empirical distribution of one stat across qualifying players.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution {
    sorted: Vec<f64>,
}

impl Distribution {
    /// Build from raw values. Non-finite values are dropped; the rest are
    /// sorted by value, so ranks never depend on insertion order.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Self { sorted }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.sorted
    }

    /// Percentile (0-100) of `value`, where 100 is best. Tied values share
    /// the mid-rank. Returns `None` for an empty distribution.
    pub fn percentile(&self, value: f64, direction: Direction) -> Option<f64> {
        if self.sorted.is_empty() || !value.is_finite() {
            return None;
        }
        let n = self.sorted.len() as f64;
        let below = self.sorted.partition_point(|v| *v < value) as f64;
        let not_above = self.sorted.partition_point(|v| *v <= value) as f64;
        let equal = not_above - below;
        let higher_pct = (below + 0.5 * equal) / n * 100.0;
        Some(match direction {
            Direction::HigherIsBetter => higher_pct,
            Direction::LowerIsBetter => 100.0 - higher_pct,
        })
    }
}

/// Percentile and star rating for one projected value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub percentile: f64,
    /// Continuous star value within the configured bounds.
    pub stars: f64,
    /// Stars rounded to the nearest half star, for display.
    pub display_stars: f64,
}

/// Maps percentiles to stars through z-space, anchored at the configured
/// low / mid / high percentiles.
#[derive(Debug, Clone, Copy)]
pub struct PercentileMapper {
    config: StarConfig,
    z_low: f64,
    z_mid: f64,
    z_high: f64,
}

impl PercentileMapper {
    pub fn new(config: &StarConfig) -> Self {
        Self {
            config: *config,
            z_low: inverse_normal_cdf(config.low_percentile / 100.0),
            z_mid: inverse_normal_cdf(config.mid_percentile / 100.0),
            z_high: inverse_normal_cdf(config.high_percentile / 100.0),
        }
    }

    /// Star value for a percentile.
    pub fn stars(&self, percentile: f64) -> f64 {
        let c = &self.config;
        if percentile <= c.low_percentile {
            return c.low_stars;
        }
        if percentile >= c.high_percentile {
            return c.high_stars;
        }
        if percentile == c.mid_percentile {
            return c.mid_stars;
        }
        let z = inverse_normal_cdf(percentile / 100.0);
        let stars = if z < self.z_mid {
            c.low_stars + (z - self.z_low) / (self.z_mid - self.z_low) * (c.mid_stars - c.low_stars)
        } else {
            c.mid_stars + (z - self.z_mid) / (self.z_high - self.z_mid) * (c.high_stars - c.mid_stars)
        };
        stars.clamp(c.low_stars, c.high_stars)
    }

    /// Rate `value` against `distribution`. An empty distribution rates at the
    /// middle anchor.
    pub fn rate(&self, value: f64, distribution: &Distribution, direction: Direction) -> Rating {
        let percentile = distribution
            .percentile(value, direction)
            .unwrap_or(self.config.mid_percentile);
        let stars = self.stars(percentile);
        Rating {
            percentile,
            stars,
            display_stars: round_to_half(stars),
        }
    }
}

pub fn round_to_half(stars: f64) -> f64 {
    (stars * 2.0).round() / 2.0
}

/// Inverse of the standard normal CDF (Acklam's rational approximation,
/// relative error below 1.2e-9). Returns exactly 0.0 at p = 0.5.
pub fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    fn mapper() -> PercentileMapper {
        PercentileMapper::new(&test_config().stars)
    }

    #[test]
    fn fiftieth_percentile_is_exactly_three_stars() {
        assert_eq!(mapper().stars(50.0), 3.0);
    }

    #[test]
    fn tails_clamp_to_bounds() {
        let m = mapper();
        assert_eq!(m.stars(2.3), 0.5);
        assert_eq!(m.stars(0.0), 0.5);
        assert_eq!(m.stars(97.7), 5.0);
        assert_eq!(m.stars(100.0), 5.0);
    }

    #[test]
    fn stars_are_monotonic_in_percentile() {
        let m = mapper();
        let mut prev = m.stars(2.3);
        for i in 1..=200 {
            let p = 2.3 + (97.7 - 2.3) * i as f64 / 200.0;
            let s = m.stars(p);
            assert!(s >= prev, "stars decreased at p={p}: {s} < {prev}");
            assert!((0.5..=5.0).contains(&s));
            prev = s;
        }
    }

    #[test]
    fn one_sigma_lands_between_anchors() {
        let m = mapper();
        let above = m.stars(84.13);
        let below = m.stars(15.87);
        assert!(above > 3.0 && above < 5.0);
        assert!(below > 0.5 && below < 3.0);
        // Roughly halfway in z-space on either side.
        assert!((above - 4.0).abs() < 0.05);
        assert!((below - 1.75).abs() < 0.05);
    }

    #[test]
    fn inverse_cdf_reference_points() {
        assert_eq!(inverse_normal_cdf(0.5), 0.0);
        assert!((inverse_normal_cdf(0.975) - 1.959964).abs() < 1e-5);
        assert!((inverse_normal_cdf(0.023) + 1.995393).abs() < 1e-4);
        assert!((inverse_normal_cdf(0.001) + 3.090232).abs() < 1e-5);
    }

    #[test]
    fn percentile_ranks_with_direction() {
        let d = Distribution::new(vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(d.percentile(4.5, Direction::HigherIsBetter), Some(50.0));
        assert_eq!(d.percentile(4.5, Direction::LowerIsBetter), Some(50.0));
        assert_eq!(d.percentile(2.0, Direction::LowerIsBetter), Some(100.0));
        assert_eq!(d.percentile(7.0, Direction::HigherIsBetter), Some(100.0));
    }

    #[test]
    fn ties_share_mid_rank_regardless_of_order() {
        let a = Distribution::new(vec![1.0, 2.0, 2.0, 2.0, 3.0]);
        let b = Distribution::new(vec![2.0, 3.0, 2.0, 1.0, 2.0]);
        assert_eq!(a, b);
        assert_eq!(a.percentile(2.0, Direction::HigherIsBetter), Some(50.0));
    }

    #[test]
    fn rating_is_idempotent() {
        let m = mapper();
        let d = Distribution::new((0..120).map(|i| 2.5 + i as f64 * 0.025));
        let first = m.rate(3.61, &d, Direction::LowerIsBetter);
        let second = m.rate(3.61, &d, Direction::LowerIsBetter);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_distribution_rates_at_middle() {
        let r = mapper().rate(4.0, &Distribution::default(), Direction::LowerIsBetter);
        assert_eq!(r.percentile, 50.0);
        assert_eq!(r.stars, 3.0);
    }

    #[test]
    fn non_finite_values_are_dropped() {
        let d = Distribution::new(vec![1.0, f64::NAN, 2.0, f64::INFINITY]);
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn display_stars_round_to_half() {
        assert_eq!(round_to_half(3.24), 3.0);
        assert_eq!(round_to_half(3.26), 3.5);
        assert_eq!(round_to_half(4.76), 5.0);
    }
}
