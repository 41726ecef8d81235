//! Oversampled differential-pressure read.
//!
//! The DLVR refreshes roughly every 6 ms.  One scan takes a burst of reads
//! spaced just over that interval and averages the valid ones, which
//! smooths flue-draft flutter without a longer window.

use std::time::Duration;

use super::Sensor;

/// Average `samples` reads of `sensor`, `interval` apart.  NaN reads are
/// dropped; NaN if none are valid.
pub fn oversample(sensor: &mut Sensor, samples: u16, interval: Duration) -> f64 {
    oversample_with(|| sensor.read(), samples, interval)
}

pub(crate) fn oversample_with(
    mut read: impl FnMut() -> f64,
    samples: u16,
    interval: Duration,
) -> f64 {
    let mut sum = 0.0;
    let mut valid = 0u16;
    for i in 0..samples {
        let value = read();
        if !value.is_nan() {
            sum += value;
            valid += 1;
        }
        if i + 1 < samples && !interval.is_zero() {
            std::thread::sleep(interval);
        }
    }
    if valid == 0 {
        f64::NAN
    } else {
        sum / f64::from(valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_valid_reads() {
        let mut values = [1.0, f64::NAN, 3.0, 5.0].into_iter();
        let avg = oversample_with(|| values.next().unwrap_or(f64::NAN), 4, Duration::ZERO);
        assert_eq!(avg, 3.0);
    }

    #[test]
    fn all_invalid_is_nan() {
        assert!(oversample_with(|| f64::NAN, 25, Duration::ZERO).is_nan());
    }
}
