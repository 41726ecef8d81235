//! Record formatting and the per-second record decision.
//!
//! ```text
//!   ParameterRegistry ──▶ columns (header / units / values)
//!          │
//!          ▼
//!   FieldSource (series bank + scalar snapshot) ──▶ render(kind) ──▶ CSV line
//! ```
//!
//! A record is one comma-joined line.  Every parameter contributes one
//! column, except sampled parameters which contribute their value plus
//! `_min`, `_max` and `_sd` columns (pressure adds `_rng`).

pub mod accumulator;
pub mod registry;

use chrono::DateTime;

use crate::sensors::SensorSeries;
pub use accumulator::{RecordAccumulator, RecordMeta, RecordPlan, SeriesBank, SeriesId};
pub use registry::{Parameter, ParameterRegistry, Scalar, Source};

/// The four record line types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Header,
    Units,
    /// Last values of a one-second record.
    SingleScan,
    /// Statistics over an accumulation window.
    MultiScan,
}

/// Value category; drives precision, clamping and default units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Temperature,
    Count,
    Ppm,
    Pressure,
    /// Fraction open, 0..=1.
    Position,
    Generic,
}

impl ParameterKind {
    /// Decimal places.
    pub const fn precision(self) -> usize {
        match self {
            Self::Temperature => 1,
            Self::Count | Self::Ppm => 0,
            Self::Pressure | Self::Position | Self::Generic => 2,
        }
    }

    pub const fn default_units(self) -> &'static str {
        match self {
            Self::Temperature => "deg. F",
            Self::Count => "integer",
            Self::Ppm => "ppm",
            Self::Pressure => "Pa",
            Self::Position => "fraction",
            Self::Generic => "",
        }
    }

    /// Physical bounds for measured values.  NaN passes through.
    pub fn clamp(self, value: f64) -> f64 {
        if value.is_nan() {
            return value;
        }
        match self {
            Self::Ppm => value.max(0.0),
            Self::Position => value.clamp(0.0, 1.0),
            _ => value,
        }
    }

    /// Render `value` at this kind's precision, `NAN` for no data.
    pub fn format(self, value: f64) -> String {
        format_number(value, self.precision())
    }
}

pub fn format_number(value: f64, precision: usize) -> String {
    if value.is_nan() {
        "NAN".to_owned()
    } else {
        format!("{value:.precision$}")
    }
}

/// Quoted UTC timestamp, e.g. `"2024-01-15 10:30:00"`.
pub fn format_time(epoch_secs: i64) -> String {
    match DateTime::from_timestamp(epoch_secs, 0) {
        Some(t) => format!("\"{}\"", t.format("%Y-%m-%d %H:%M:%S")),
        None => "\"NAN\"".to_owned(),
    }
}

/// Everything a record line is rendered from.
pub trait FieldSource {
    fn site(&self) -> &str;
    fn time(&self) -> i64;
    fn rec_num(&self) -> u64;
    fn series(&self, id: SeriesId) -> Option<&SensorSeries>;
    fn scalar(&self, id: Scalar) -> f64;
}

/// Render one record line of `kind` for every parameter in `registry`.
pub fn render(registry: &ParameterRegistry, kind: RecordKind, src: &impl FieldSource) -> String {
    let mut fields: Vec<String> = Vec::with_capacity(registry.column_count());
    for param in registry.params() {
        match kind {
            RecordKind::Header => fields.extend(param.column_names()),
            RecordKind::Units => {
                let n = param.column_count();
                fields.extend(std::iter::repeat_n(param.units().to_owned(), n));
            }
            RecordKind::SingleScan | RecordKind::MultiScan => {
                render_values(param, kind, src, &mut fields);
            }
        }
    }
    fields.join(",")
}

fn render_values(param: &Parameter, kind: RecordKind, src: &impl FieldSource, out: &mut Vec<String>) {
    let pk = param.kind();
    match param.source() {
        Source::Site => out.push(src.site().to_owned()),
        Source::Time => out.push(format_time(src.time())),
        Source::RecNum => out.push(src.rec_num().to_string()),
        Source::Scalar(id) => out.push(pk.format(src.scalar(id))),
        Source::Series(id) => {
            let empty = SensorSeries::new();
            let series = src.series(id).unwrap_or(&empty);
            let (value, min, max, sd, rng) = match kind {
                RecordKind::MultiScan if id.is_per_scan() => (
                    series.avg(),
                    series.min(),
                    series.max(),
                    series.stddev(),
                    series.range(),
                ),
                RecordKind::MultiScan => (
                    series.avg_inclusive(),
                    series.min_inclusive(),
                    series.max_inclusive(),
                    series.stddev_inclusive(),
                    series.range_inclusive(),
                ),
                _ => {
                    let last = series.last();
                    let rng = if last.is_nan() { f64::NAN } else { 0.0 };
                    (last, last, last, f64::NAN, rng)
                }
            };
            out.push(pk.format(pk.clamp(value)));
            out.push(pk.format(pk.clamp(min)));
            out.push(pk.format(pk.clamp(max)));
            out.push(pk.format(sd));
            if param.has_range() {
                out.push(pk.format(rng));
            }
        }
    }
}
