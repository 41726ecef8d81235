//! Raw-to-engineering-unit conversions.

/// inH2O to pascal.
pub const PA_PER_INH2O: f64 = 249.0889;

/// DLVR-L01D full-scale span factor (±1 inH2O part, 4x range).
const DLVR_SPAN_INH2O: f64 = 1.25 * 4.0;
/// DLVR output count at zero differential pressure.
const DLVR_OFFSET_COUNTS: f64 = 8192.0;
const DLVR_FULL_COUNTS: f64 = 16384.0;

/// XBee 10-bit ADC, 1.2 V reference.
const XBEE_AIN_VOLTS_PER_COUNT: f64 = 1.2 / 1023.0;
const XBEE_SUPPLY_VOLTS_PER_COUNT: f64 = 1.2 / 1024.0;

/// Strategy turning a channel's raw value into engineering units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Converter {
    /// Pass the raw value through.
    Identity,
    /// `scale * raw + offset`.
    Linear { scale: f64, offset: f64 },
    /// AD8495 amplifier, 5 mV/°C, reported in °F.  Some channels carry a
    /// 0.5 V output bias.
    Thermocouple { bias_v: f64 },
    /// Electrochemical CO cell through its transimpedance amplifier.
    Co { calibration: f64 },
    /// DLVR status/count word to pascal.  Non-zero status bits give NaN.
    Dlvr,
    /// XBee analog input counts to volts.
    XbeeAnalog,
    /// XBee supply-voltage counts to volts.
    XbeeSupply,
}

impl Converter {
    pub fn apply(self, raw: f64) -> f64 {
        if raw.is_nan() {
            return f64::NAN;
        }
        match self {
            Self::Identity => raw,
            Self::Linear { scale, offset } => scale * raw + offset,
            Self::Thermocouple { bias_v } => 360.0 * (raw - bias_v) + 32.0,
            Self::Co { calibration } => (raw * 0.5 * 2.326e6) / calibration,
            Self::Dlvr => dlvr_to_pa(raw as u16),
            Self::XbeeAnalog => raw * XBEE_AIN_VOLTS_PER_COUNT,
            Self::XbeeSupply => raw * XBEE_SUPPLY_VOLTS_PER_COUNT,
        }
    }
}

/// Decode the first two DLVR bytes, packed big-endian into one word.
pub fn dlvr_to_pa(word: u16) -> f64 {
    let status = word >> 14;
    if status != 0 {
        return f64::NAN;
    }
    let counts = f64::from(word & 0x3FFF);
    let in_h2o = DLVR_SPAN_INH2O * ((counts - DLVR_OFFSET_COUNTS) / DLVR_FULL_COUNTS);
    in_h2o * PA_PER_INH2O
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thermocouple_conversion() {
        let tc = Converter::Thermocouple { bias_v: 0.0 };
        assert!((tc.apply(0.0) - 32.0).abs() < 1e-9);
        assert!((tc.apply(1.0) - 392.0).abs() < 1e-9);
        let biased = Converter::Thermocouple { bias_v: 0.5 };
        assert!((biased.apply(0.5) - 32.0).abs() < 1e-9);
    }

    #[test]
    fn co_conversion() {
        let co = Converter::Co {
            calibration: 1658.0,
        };
        let ppm = co.apply(0.1);
        assert!((ppm - 70.144_752).abs() < 1e-3);
    }

    #[test]
    fn dlvr_zero_and_status() {
        assert_eq!(dlvr_to_pa(8192), 0.0);
        // Status bits set: stale or fault.
        assert!(dlvr_to_pa(0x4000 | 8192).is_nan());
        assert!(dlvr_to_pa(0xC000).is_nan());
        let full = dlvr_to_pa(0x3FFF);
        assert!((full - 5.0 * (8191.0 / 16384.0) * PA_PER_INH2O).abs() < 1e-9);
    }

    #[test]
    fn nan_passes_through() {
        assert!(Converter::Linear { scale: 2.0, offset: 1.0 }.apply(f64::NAN).is_nan());
    }

    #[test]
    fn xbee_scaling() {
        assert!((Converter::XbeeAnalog.apply(1023.0) - 1.2).abs() < 1e-12);
        assert!((Converter::XbeeSupply.apply(2816.0) - 3.3).abs() < 1e-12);
    }
}
