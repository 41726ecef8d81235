//! Ordered parameter registry for the data and diagnostics records.
//!
//! Registration order is column order, so the header, units and value lines
//! always line up.

use super::{ParameterKind, SeriesId};
use crate::config::SystemConfig;
use crate::sensors::{AnalogInput, DigitalInput, TcChannel};
use crate::valves::{Co2Valve, PressureValve};

/// Thermocouple column names, indexed by channel.
pub const TC_NAMES: [&str; TcChannel::COUNT as usize] = [
    "t_whburner",
    "t_whspill1",
    "t_whspill2",
    "t_whspill3",
    "t_whspill4",
    "t_whvent",
    "t_fburner",
    "t_fspill1",
    "t_fspill2",
    "t_fspill3",
    "t_fspill4",
    "t_fvent",
    "t_zonehi",
    "t_zonelow",
    "t_outdoor",
    "t_extra",
];

/// Single-column values taken from the service's per-tick snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    LocCo2,
    SecCo2,
    LocP,
    SecP,
    WhStatus,
    WhMode,
    FStatus,
    FMode,
    SysState,
    ScansAccum,
    SecWhRun,
    SecFRun,
    SecWhCooldown,
    SecFCooldown,
    SecCount,
    /// Samples received from radio node `n` since the last record.
    RadioCount(usize),

    // Diagnostics record
    DiagNum,
    UptimeSec,
    Ticks,
    Records,
    NanReads,
    RadioRx,
    RadioErr,
    RadioDrop,
    DiskFreeMb,
    DataFileKb,
    ClockAnomalies,
}

/// Where a parameter's values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Site,
    Time,
    RecNum,
    Series(SeriesId),
    Scalar(Scalar),
}

#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    units: String,
    kind: ParameterKind,
    source: Source,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind, source: Source) -> Self {
        Self {
            name: name.into(),
            units: kind.default_units().to_owned(),
            kind,
            source,
        }
    }

    #[must_use]
    pub fn with_units(mut self, units: &str) -> Self {
        self.units = units.to_owned();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn is_sampled(&self) -> bool {
        matches!(self.source, Source::Series(_))
    }

    pub fn has_range(&self) -> bool {
        self.is_sampled() && self.kind == ParameterKind::Pressure
    }

    pub fn column_count(&self) -> usize {
        match (self.is_sampled(), self.has_range()) {
            (false, _) => 1,
            (true, false) => 4,
            (true, true) => 5,
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        if !self.is_sampled() {
            return vec![self.name.clone()];
        }
        let mut cols = vec![
            self.name.clone(),
            format!("{}_min", self.name),
            format!("{}_max", self.name),
            format!("{}_sd", self.name),
        ];
        if self.has_range() {
            cols.push(format!("{}_rng", self.name));
        }
        cols
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParameterRegistry {
    params: Vec<Parameter>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, param: Parameter) -> &mut Self {
        self.params.push(param);
        self
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn column_count(&self) -> usize {
        self.params.iter().map(Parameter::column_count).sum()
    }

    pub fn find(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Parameters of the one-second data record.
    pub fn data_record(config: &SystemConfig) -> Self {
        use ParameterKind::{Count, Generic, Position, Ppm, Pressure, Temperature};

        let mut reg = Self::new();
        reg.register(Parameter::new("site", Generic, Source::Site))
            .register(Parameter::new("time", Generic, Source::Time).with_units("UTC"))
            .register(Parameter::new("rec_num", Count, Source::RecNum));

        for tc in TcChannel::all() {
            reg.register(Parameter::new(
                TC_NAMES[tc.index()],
                Temperature,
                Source::Series(SeriesId::Tc(tc)),
            ));
        }

        reg.register(Parameter::new(
            "pos_door1",
            Position,
            Source::Series(SeriesId::Analog(AnalogInput::Door1)),
        ))
        .register(
            Parameter::new("i_fan1", Generic, Source::Series(SeriesId::Analog(AnalogInput::Fan1)))
                .with_units("A"),
        )
        .register(
            Parameter::new("i_fan2", Generic, Source::Series(SeriesId::Analog(AnalogInput::Fan2)))
                .with_units("A"),
        )
        .register(Parameter::new(
            "ppm_co",
            Ppm,
            Source::Series(SeriesId::Analog(AnalogInput::Co)),
        ))
        .register(Parameter::new(
            "pos_sw1",
            Position,
            Source::Series(SeriesId::Switch(DigitalInput::Switch1)),
        ))
        .register(Parameter::new(
            "pos_sw2",
            Position,
            Source::Series(SeriesId::Switch(DigitalInput::Switch2)),
        ));

        reg.register(Parameter::new("loc_co2", Count, Source::Scalar(Scalar::LocCo2)))
            .register(Parameter::new("sec_co2", Count, Source::Scalar(Scalar::SecCo2)));
        for valve in Co2Valve::ALL {
            reg.register(Parameter::new(
                format!("ppm_co2_{}", valve.name()),
                Ppm,
                Source::Series(SeriesId::Co2(valve)),
            ));
        }

        reg.register(Parameter::new("loc_p", Count, Source::Scalar(Scalar::LocP)))
            .register(Parameter::new("sec_p", Count, Source::Scalar(Scalar::SecP)));
        for valve in PressureValve::ALL {
            reg.register(Parameter::new(
                format!("p_{}", valve.name()),
                Pressure,
                Source::Series(SeriesId::Pressure(valve)),
            ));
        }

        for (name, scalar) in [
            ("wh_status", Scalar::WhStatus),
            ("wh_mode", Scalar::WhMode),
            ("f_status", Scalar::FStatus),
            ("f_mode", Scalar::FMode),
            ("sys_state", Scalar::SysState),
            ("scans_accum", Scalar::ScansAccum),
            ("sec_whrun", Scalar::SecWhRun),
            ("sec_frun", Scalar::SecFRun),
            ("sec_whcooldown", Scalar::SecWhCooldown),
            ("sec_fcooldown", Scalar::SecFCooldown),
            ("sec_count", Scalar::SecCount),
        ] {
            reg.register(Parameter::new(name, Count, Source::Scalar(scalar)));
        }

        for (i, node) in config.radio.nodes.iter().enumerate() {
            reg.register(
                Parameter::new(
                    format!("{}_batt", node.name),
                    Generic,
                    Source::Series(SeriesId::RadioSupply(i)),
                )
                .with_units("V"),
            )
            .register(
                Parameter::new(
                    format!("{}_ain", node.name),
                    Generic,
                    Source::Series(SeriesId::RadioAnalog(i)),
                )
                .with_units("V"),
            )
            .register(Parameter::new(
                format!("{}_n", node.name),
                Count,
                Source::Scalar(Scalar::RadioCount(i)),
            ));
        }
        reg
    }

    /// Parameters of the diagnostics record.
    pub fn diagnostics_record() -> Self {
        use ParameterKind::{Count, Generic};

        let mut reg = Self::new();
        reg.register(Parameter::new("site", Generic, Source::Site))
            .register(Parameter::new("time", Generic, Source::Time).with_units("UTC"));
        for (name, kind, scalar, units) in [
            ("diag_num", Count, Scalar::DiagNum, "integer"),
            ("uptime_sec", Count, Scalar::UptimeSec, "s"),
            ("ticks", Count, Scalar::Ticks, "integer"),
            ("records", Count, Scalar::Records, "integer"),
            ("nan_reads", Count, Scalar::NanReads, "integer"),
            ("radio_rx", Count, Scalar::RadioRx, "integer"),
            ("radio_err", Count, Scalar::RadioErr, "integer"),
            ("radio_drop", Count, Scalar::RadioDrop, "integer"),
            ("disk_free_mb", Generic, Scalar::DiskFreeMb, "MB"),
            ("data_file_kb", Count, Scalar::DataFileKb, "kB"),
            ("clock_anomalies", Count, Scalar::ClockAnomalies, "integer"),
        ] {
            reg.register(Parameter::new(name, kind, Source::Scalar(scalar)).with_units(units));
        }
        reg
    }
}
