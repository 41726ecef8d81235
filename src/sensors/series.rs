//! Append-only sample series owned by one logical sensor.
//!
//! Statistics come in two flavours.  The *exclusive* form (`avg`, `min`,
//! ...) drops the most recent sample, because at a record boundary that
//! sample already belongs to the next reporting window.  The `*_inclusive`
//! form covers every sample.
//!
//! NaN marks "no data".  NaN samples are counted by [`SensorSeries::count`]
//! but never contribute to a statistic.

use statrs::statistics::Statistics;

/// Minimum number of valid samples for a standard deviation.
const MIN_STDDEV_SAMPLES: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct SensorSeries {
    samples: Vec<f64>,
}

impl SensorSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, value: f64) {
        self.samples.push(value);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Keep only the final sample.  No-op on an empty series.
    pub fn clear_except_last(&mut self) {
        if let Some(&last) = self.samples.last() {
            self.samples.clear();
            self.samples.push(last);
        }
    }

    /// Most recent sample, NaN if empty.
    pub fn last(&self) -> f64 {
        self.samples.last().copied().unwrap_or(f64::NAN)
    }

    /// Sample before the most recent one, NaN if fewer than two.
    pub fn previous(&self) -> f64 {
        self.samples
            .len()
            .checked_sub(2)
            .map_or(f64::NAN, |i| self.samples[i])
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn count_except_last(&self) -> usize {
        self.samples.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    // ── Exclusive statistics ──────────────────────────────────

    pub fn avg(&self) -> f64 {
        mean(self.window())
    }

    pub fn min(&self) -> f64 {
        minimum(self.window())
    }

    pub fn max(&self) -> f64 {
        maximum(self.window())
    }

    pub fn stddev(&self) -> f64 {
        stddev(self.window())
    }

    pub fn range(&self) -> f64 {
        self.max() - self.min()
    }

    // ── Inclusive statistics ──────────────────────────────────

    pub fn avg_inclusive(&self) -> f64 {
        mean(&self.samples)
    }

    pub fn min_inclusive(&self) -> f64 {
        minimum(&self.samples)
    }

    pub fn max_inclusive(&self) -> f64 {
        maximum(&self.samples)
    }

    pub fn stddev_inclusive(&self) -> f64 {
        stddev(&self.samples)
    }

    pub fn range_inclusive(&self) -> f64 {
        self.max_inclusive() - self.min_inclusive()
    }

    /// All samples but the last.
    fn window(&self) -> &[f64] {
        &self.samples[..self.count_except_last()]
    }
}

fn valid(samples: &[f64]) -> Vec<f64> {
    samples.iter().copied().filter(|v| !v.is_nan()).collect()
}

fn mean(samples: &[f64]) -> f64 {
    let v = valid(samples);
    if v.is_empty() { f64::NAN } else { Statistics::mean(&v) }
}

fn minimum(samples: &[f64]) -> f64 {
    let v = valid(samples);
    if v.is_empty() { f64::NAN } else { Statistics::min(&v) }
}

fn maximum(samples: &[f64]) -> f64 {
    let v = valid(samples);
    if v.is_empty() { f64::NAN } else { Statistics::max(&v) }
}

fn stddev(samples: &[f64]) -> f64 {
    let v = valid(samples);
    if v.len() < MIN_STDDEV_SAMPLES {
        f64::NAN
    } else {
        Statistics::std_dev(&v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> SensorSeries {
        let mut s = SensorSeries::new();
        for &v in values {
            s.append(v);
        }
        s
    }

    #[test]
    fn empty_series_stats_are_nan() {
        let s = SensorSeries::new();
        assert!(s.last().is_nan());
        assert!(s.previous().is_nan());
        assert!(s.avg().is_nan());
        assert!(s.min_inclusive().is_nan());
        assert!(s.max().is_nan());
        assert!(s.stddev_inclusive().is_nan());
        assert_eq!(s.count(), 0);
        assert_eq!(s.count_except_last(), 0);
    }

    #[test]
    fn single_sample() {
        let s = series(&[42.0]);
        assert_eq!(s.last(), 42.0);
        assert!(s.previous().is_nan());
        assert!(s.avg().is_nan(), "exclusive stats over one sample are NaN");
        assert_eq!(s.avg_inclusive(), 42.0);
        assert_eq!(s.min_inclusive(), 42.0);
        assert_eq!(s.max_inclusive(), 42.0);
    }

    #[test]
    fn exclusive_drops_last() {
        let s = series(&[1.0, 2.0, 3.0, 100.0]);
        assert_eq!(s.avg(), 2.0);
        assert_eq!(s.min(), 1.0);
        assert_eq!(s.max(), 3.0);
        assert_eq!(s.range(), 2.0);
        assert_eq!(s.max_inclusive(), 100.0);
        assert_eq!(s.previous(), 3.0);
    }

    #[test]
    fn stddev_needs_three_samples() {
        let s = series(&[1.0, 3.0]);
        assert!(s.stddev_inclusive().is_nan());
        let s = series(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        // Sample standard deviation.
        assert!((s.stddev_inclusive() - 2.138_089_935).abs() < 1e-6);
    }

    #[test]
    fn nan_is_counted_but_excluded() {
        let s = series(&[10.0, f64::NAN, 20.0, f64::NAN]);
        assert_eq!(s.count(), 4);
        assert_eq!(s.avg_inclusive(), 15.0);
        assert_eq!(s.avg(), 15.0);
        assert!(s.last().is_nan());
        assert!(s.stddev_inclusive().is_nan());
    }

    #[test]
    fn clear_except_last_keeps_seed() {
        let mut s = series(&[1.0, 2.0, 3.0]);
        s.clear_except_last();
        assert_eq!(s.count(), 1);
        assert_eq!(s.last(), 3.0);

        let mut empty = SensorSeries::new();
        empty.clear_except_last();
        assert!(empty.is_empty());
    }

    #[test]
    fn clear_empties() {
        let mut s = series(&[1.0, 2.0]);
        s.clear();
        assert!(s.is_empty());
        assert!(s.last().is_nan());
    }
}
