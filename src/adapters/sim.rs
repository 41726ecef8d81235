//! Simulated logger cape for bench runs without hardware.
//!
//! Temperatures follow a scripted duty cycle per burner: a first-order rise
//! toward the flame temperature while firing, then an exponential decay back
//! to ambient.  Pressure and CO2 respond to whichever selector valve is
//! energised, so the valve schedulers see distinct values per location.

use std::collections::HashMap;

use crate::app::ports::{ActuatorPort, DigitalOutput, SensorPort};
use crate::sensors::{AnalogInput, DigitalInput, TcChannel};
use crate::valves::{Co2Valve, PressureValve};

const AMBIENT_F: f64 = 70.0;
const FLUE_PEAK_F: f64 = 380.0;
const HEAT_TAU_SECS: f64 = 45.0;
const COOL_TAU_SECS: f64 = 90.0;
const BACKGROUND_CO2_PPM: f64 = 450.0;

/// Firing schedule of one simulated burner.
#[derive(Debug, Clone, Copy)]
pub struct BurnerProfile {
    pub tc: TcChannel,
    pub period_secs: i64,
    pub on_secs: i64,
    /// Epoch second at which a firing begins.
    pub phase_origin: i64,
}

impl BurnerProfile {
    fn phase(&self, now: i64) -> i64 {
        (now - self.phase_origin).rem_euclid(self.period_secs)
    }

    pub fn is_firing(&self, now: i64) -> bool {
        self.phase(now) < self.on_secs
    }

    pub fn temperature(&self, now: i64) -> f64 {
        let rise = |secs: f64| AMBIENT_F + (FLUE_PEAK_F - AMBIENT_F) * (1.0 - (-secs / HEAT_TAU_SECS).exp());
        let phase = self.phase(now);
        if phase < self.on_secs {
            rise(phase as f64)
        } else {
            let top = rise(self.on_secs as f64);
            let cooling = (phase - self.on_secs) as f64;
            AMBIENT_F + (top - AMBIENT_F) * (-cooling / COOL_TAU_SECS).exp()
        }
    }
}

/// [`SensorPort`] + [`ActuatorPort`] over scripted signals.
pub struct SimulatedHardware {
    now: i64,
    burners: Vec<BurnerProfile>,
    outputs: HashMap<DigitalOutput, bool>,
    writes: u64,
}

impl SimulatedHardware {
    pub fn new(burners: Vec<BurnerProfile>) -> Self {
        Self {
            now: 0,
            burners,
            outputs: HashMap::new(),
            writes: 0,
        }
    }

    /// Water heater on TC1 firing 10 min of every 40, furnace on TC7 firing
    /// 15 min of every hour.
    pub fn default_profiles(start: i64) -> Self {
        Self::new(vec![
            BurnerProfile {
                tc: TcChannel(0),
                period_secs: 2_400,
                on_secs: 600,
                phase_origin: start + 300,
            },
            BurnerProfile {
                tc: TcChannel(6),
                period_secs: 3_600,
                on_secs: 900,
                phase_origin: start + 1_200,
            },
        ])
    }

    /// Set the time the next scan is taken at.
    pub fn set_time(&mut self, now: i64) {
        self.now = now;
    }

    pub fn output(&self, output: DigitalOutput) -> bool {
        self.outputs.get(&output).copied().unwrap_or(false)
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    fn any_firing(&self) -> bool {
        self.burners.iter().any(|b| b.is_firing(self.now))
    }
}

impl SensorPort for SimulatedHardware {
    fn read_temperature(&mut self, channel: TcChannel) -> f64 {
        self.burners
            .iter()
            .find(|b| b.tc == channel)
            .map_or(AMBIENT_F + f64::from(channel.0) * 0.1, |b| {
                b.temperature(self.now)
            })
    }

    fn read_analog(&mut self, input: AnalogInput) -> f64 {
        match input {
            AnalogInput::Door1 => 0.5,
            AnalogInput::Fan1 | AnalogInput::Fan2 => {
                if self.any_firing() {
                    0.8
                } else {
                    0.0
                }
            }
            AnalogInput::Co => 1.0,
        }
    }

    fn read_pressure(&mut self) -> f64 {
        let draft = if self.any_firing() { -4.0 } else { -1.0 };
        let at = |v| self.output(DigitalOutput::PressureValve(v));
        if at(PressureValve::Zero) {
            0.3
        } else if at(PressureValve::WhVent) || at(PressureValve::FVent) {
            0.3 + draft
        } else {
            0.3 - 0.5
        }
    }

    fn read_co2_raw(&mut self) -> f64 {
        let vent = self.output(DigitalOutput::Co2Valve(Co2Valve::WhVent))
            || self.output(DigitalOutput::Co2Valve(Co2Valve::FVent));
        if vent && self.any_firing() {
            8_000.0
        } else {
            BACKGROUND_CO2_PPM
        }
    }

    fn read_digital_input(&mut self, _input: DigitalInput) -> bool {
        false
    }
}

impl ActuatorPort for SimulatedHardware {
    fn write_digital_output(&mut self, output: DigitalOutput, on: bool) {
        self.writes += 1;
        self.outputs.insert(output, on);
    }
}
