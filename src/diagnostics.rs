//! Runtime diagnostics.
//!
//! [`DiagnosticCounters`] is updated by the service on every tick and every
//! record write.  When the housekeeping timer fires, the counters are frozen
//! into a [`RuntimeMetrics`] snapshot together with the radio and disk
//! figures and rendered as one line of the `_scanInfo.csv` stream.

use crate::record::{FieldSource, Scalar, SeriesId};
use crate::sensors::SensorSeries;

/// Live counters, owned by the service.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCounters {
    started_at: Option<i64>,
    diag_num: u64,
    ticks: u64,
    records: u64,
    nan_reads: u64,
    clock_anomalies: u64,
}

impl DiagnosticCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one processed tick.  The first tick fixes the uptime origin.
    pub fn record_tick(&mut self, now: i64) {
        self.started_at.get_or_insert(now);
        self.ticks += 1;
    }

    pub fn record_written(&mut self) {
        self.records += 1;
    }

    /// Count a read that came back NaN.
    pub fn record_nan(&mut self) {
        self.nan_reads += 1;
    }

    pub fn record_clock_anomaly(&mut self) {
        self.clock_anomalies += 1;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn nan_reads(&self) -> u64 {
        self.nan_reads
    }

    pub fn clock_anomalies(&self) -> u64 {
        self.clock_anomalies
    }

    pub fn uptime_secs(&self, now: i64) -> i64 {
        self.started_at.map_or(0, |t| (now - t).max(0))
    }

    /// Freeze the counters for one diagnostics record.  Bumps the
    /// diagnostics sequence number.
    pub fn collect(&mut self, now: i64, external: ExternalMetrics) -> RuntimeMetrics {
        self.diag_num += 1;
        RuntimeMetrics {
            diag_num: self.diag_num,
            uptime_secs: self.uptime_secs(now),
            ticks: self.ticks,
            records: self.records,
            nan_reads: self.nan_reads,
            clock_anomalies: self.clock_anomalies,
            radio_rx: external.radio_rx,
            radio_err: external.radio_err,
            radio_drop: external.radio_drop,
            disk_free_bytes: external.disk_free_bytes,
            data_file_bytes: external.data_file_bytes,
        }
    }
}

/// Figures owned by other subsystems, gathered at collection time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalMetrics {
    pub radio_rx: u64,
    pub radio_err: u64,
    pub radio_drop: u64,
    /// `None` when the free-space query failed.
    pub disk_free_bytes: Option<u64>,
    pub data_file_bytes: u64,
}

/// Diagnostics snapshot, one per diagnostics record.
#[derive(Debug, Clone)]
pub struct RuntimeMetrics {
    pub diag_num: u64,
    pub uptime_secs: i64,
    pub ticks: u64,
    pub records: u64,
    pub nan_reads: u64,
    pub clock_anomalies: u64,
    pub radio_rx: u64,
    pub radio_err: u64,
    pub radio_drop: u64,
    pub disk_free_bytes: Option<u64>,
    pub data_file_bytes: u64,
}

impl RuntimeMetrics {
    /// Value of a diagnostics column.  Data-record scalars read as NaN.
    pub fn scalar(&self, id: Scalar) -> f64 {
        match id {
            Scalar::DiagNum => self.diag_num as f64,
            Scalar::UptimeSec => self.uptime_secs as f64,
            Scalar::Ticks => self.ticks as f64,
            Scalar::Records => self.records as f64,
            Scalar::NanReads => self.nan_reads as f64,
            Scalar::RadioRx => self.radio_rx as f64,
            Scalar::RadioErr => self.radio_err as f64,
            Scalar::RadioDrop => self.radio_drop as f64,
            Scalar::DiskFreeMb => self
                .disk_free_bytes
                .map_or(f64::NAN, |b| b as f64 / 1_000_000.0),
            Scalar::DataFileKb => (self.data_file_bytes / 1_000) as f64,
            Scalar::ClockAnomalies => self.clock_anomalies as f64,
            _ => f64::NAN,
        }
    }
}

/// A [`RuntimeMetrics`] snapshot bound to the site and time it describes.
pub struct DiagnosticsView<'a> {
    pub site: &'a str,
    pub time: i64,
    pub metrics: &'a RuntimeMetrics,
}

impl FieldSource for DiagnosticsView<'_> {
    fn site(&self) -> &str {
        self.site
    }

    fn time(&self) -> i64 {
        self.time
    }

    fn rec_num(&self) -> u64 {
        self.metrics.diag_num
    }

    fn series(&self, _id: SeriesId) -> Option<&SensorSeries> {
        None
    }

    fn scalar(&self, id: Scalar) -> f64 {
        self.metrics.scalar(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ParameterRegistry, RecordKind, render};

    #[test]
    fn counters_accumulate() {
        let mut c = DiagnosticCounters::new();
        c.record_tick(1_000);
        c.record_tick(1_001);
        c.record_nan();
        c.record_written();
        c.record_clock_anomaly();
        assert_eq!(c.ticks(), 2);
        assert_eq!(c.nan_reads(), 1);
        assert_eq!(c.records(), 1);
        assert_eq!(c.clock_anomalies(), 1);
        assert_eq!(c.uptime_secs(1_061), 61);
    }

    #[test]
    fn uptime_never_negative() {
        let mut c = DiagnosticCounters::new();
        assert_eq!(c.uptime_secs(5), 0);
        c.record_tick(100);
        assert_eq!(c.uptime_secs(90), 0);
    }

    #[test]
    fn collect_numbers_snapshots() {
        let mut c = DiagnosticCounters::new();
        c.record_tick(0);
        let first = c.collect(10, ExternalMetrics::default());
        let second = c.collect(20, ExternalMetrics::default());
        assert_eq!(first.diag_num, 1);
        assert_eq!(second.diag_num, 2);
        assert_eq!(second.uptime_secs, 20);
    }

    #[test]
    fn disk_figures_scale() {
        let mut c = DiagnosticCounters::new();
        let m = c.collect(
            0,
            ExternalMetrics {
                disk_free_bytes: Some(2_500_000),
                data_file_bytes: 12_345,
                ..ExternalMetrics::default()
            },
        );
        assert_eq!(m.scalar(Scalar::DiskFreeMb), 2.5);
        assert_eq!(m.scalar(Scalar::DataFileKb), 12.0);
        assert!(m.scalar(Scalar::SecP).is_nan());

        let unknown = c.collect(0, ExternalMetrics::default());
        assert!(unknown.scalar(Scalar::DiskFreeMb).is_nan());
    }

    #[test]
    fn renders_diagnostics_line() {
        let mut c = DiagnosticCounters::new();
        c.record_tick(1_705_314_600);
        let m = c.collect(
            1_705_314_600,
            ExternalMetrics {
                radio_rx: 4,
                disk_free_bytes: Some(8_000_000),
                ..ExternalMetrics::default()
            },
        );
        let view = DiagnosticsView {
            site: "bbbMPLS",
            time: 1_705_314_600,
            metrics: &m,
        };
        let line = render(&ParameterRegistry::diagnostics_record(), RecordKind::SingleScan, &view);
        assert_eq!(
            line,
            "bbbMPLS,\"2024-01-15 10:30:00\",1,0,1,0,0,4,0,0,8.00,0,0"
        );
    }
}
