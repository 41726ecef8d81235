//! Linux hardware adapter: bridges the logger cape to the domain ports.
//!
//! Owns one [`Sensor`] per physical input and one [`SwitchedOutput`] per
//! solenoid, exposing them through [`SensorPort`] and [`ActuatorPort`].
//! This is the only module that touches real hardware.

use std::collections::HashMap;
use std::time::Duration;

use embedded_hal::digital::InputPin;
use log::{info, warn};

use crate::app::ports::{ActuatorPort, DigitalOutput, SensorPort};
use crate::config::SystemConfig;
use crate::drivers::dlvr::DlvrChannel;
use crate::drivers::gpio::{PinDirection, SysfsPin};
use crate::drivers::iio::IioChannel;
use crate::drivers::output::SwitchedOutput;
use crate::error::Result;
use crate::pins;
use crate::sensors::pressure::oversample;
use crate::sensors::{AnalogInput, Converter, DigitalInput, Sensor, TcChannel};

/// Thermocouples wired through the biased amplifier inputs (TC15, TC16).
const BIASED_TCS: [TcChannel; 2] = [TcChannel(14), TcChannel(15)];
const TC_BIAS_V: f64 = 0.5;
/// Electrochemical cell calibration of the CO channel.
const CO_CALIBRATION: f64 = 1658.0;

/// Concrete adapter that combines all cape hardware behind port traits.
pub struct LinuxHardware {
    tcs: Vec<Sensor>,
    analog: HashMap<AnalogInput, Sensor>,
    pressure: Option<Sensor>,
    co2: Sensor,
    switches: HashMap<DigitalInput, SysfsPin>,
    outputs: HashMap<DigitalOutput, SwitchedOutput<SysfsPin>>,
    oversample: u16,
    oversample_interval: Duration,
}

impl LinuxHardware {
    /// Bind every channel named in `config.hardware`.  A missing GPIO is
    /// fatal; a missing pressure sensor only logs and reads NaN.
    pub fn open(config: &SystemConfig) -> Result<Self> {
        let hw = &config.hardware;
        let iio = |(dev, ch): (u8, u8)| Box::new(IioChannel::new(&hw.iio_root, dev, ch));

        let tcs = TcChannel::all()
            .map(|tc| {
                let dev = hw.tc_devices[tc.index() / 4];
                let ch = (tc.index() % 4) as u8;
                let bias_v = if BIASED_TCS.contains(&tc) { TC_BIAS_V } else { 0.0 };
                Sensor::new(
                    format!("TC{}@iio{}", tc.0 + 1, dev),
                    iio((dev, ch)),
                    Converter::Thermocouple { bias_v },
                )
            })
            .collect();

        let mut analog = HashMap::new();
        analog.insert(
            AnalogInput::Door1,
            Sensor::new("door1", iio(hw.door_channel), Converter::Identity),
        );
        analog.insert(
            AnalogInput::Fan1,
            Sensor::new("fan1", iio(hw.fan_channels[0]), Converter::Identity),
        );
        analog.insert(
            AnalogInput::Fan2,
            Sensor::new("fan2", iio(hw.fan_channels[1]), Converter::Identity),
        );
        analog.insert(
            AnalogInput::Co,
            Sensor::new(
                "co",
                iio(hw.co_channel),
                Converter::Co {
                    calibration: CO_CALIBRATION,
                },
            ),
        );

        let co2 = Sensor::new(
            "co2",
            iio(hw.co2_channel),
            Converter::Linear {
                scale: hw.co2_ppm_per_volt,
                offset: 0.0,
            },
        );

        let pressure = match DlvrChannel::open(&hw.i2c_bus, hw.dlvr_address) {
            Ok(ch) => Some(Sensor::new("dlvr", Box::new(ch), Converter::Dlvr)),
            Err(e) => {
                warn!("pressure sensor unavailable: {}", e);
                None
            }
        };

        let mut switches = HashMap::new();
        for input in DigitalInput::ALL {
            let pin = SysfsPin::open(&hw.gpio_root, pins::input_gpio(input), PinDirection::Input)?;
            switches.insert(input, pin);
        }

        let mut outputs = HashMap::new();
        for output in DigitalOutput::all() {
            let pin = SysfsPin::open(
                &hw.gpio_root,
                pins::output_gpio(output),
                PinDirection::Output,
            )?;
            outputs.insert(output, SwitchedOutput::new(output_name(output), pin));
        }

        info!(
            "LinuxHardware: {} inputs, {} outputs",
            TcChannel::COUNT as usize + analog.len() + switches.len() + 2,
            outputs.len()
        );
        Ok(Self {
            tcs,
            analog,
            pressure,
            co2,
            switches,
            outputs,
            oversample: config.pressure_oversample,
            oversample_interval: Duration::from_micros(u64::from(
                config.pressure_oversample_interval_us,
            )),
        })
    }
}

fn output_name(output: DigitalOutput) -> &'static str {
    use crate::valves::{Co2Valve, PressureValve};
    match output {
        DigitalOutput::PressureValve(PressureValve::Zero) => "S01",
        DigitalOutput::PressureValve(PressureValve::WhVent) => "S02",
        DigitalOutput::PressureValve(PressureValve::FVent) => "S03",
        DigitalOutput::PressureValve(PressureValve::Zone) => "S04",
        DigitalOutput::Co2Valve(Co2Valve::WhVent) => "S05",
        DigitalOutput::Co2Valve(Co2Valve::FVent) => "S06",
        DigitalOutput::Co2Valve(Co2Valve::Zone) => "S07",
        DigitalOutput::Pump => "S08",
        DigitalOutput::Power24V => "24V",
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for LinuxHardware {
    fn read_temperature(&mut self, channel: TcChannel) -> f64 {
        self.tcs
            .get_mut(channel.index())
            .map_or(f64::NAN, Sensor::read)
    }

    fn read_analog(&mut self, input: AnalogInput) -> f64 {
        self.analog.get_mut(&input).map_or(f64::NAN, Sensor::read)
    }

    fn read_pressure(&mut self) -> f64 {
        match &mut self.pressure {
            Some(sensor) => oversample(sensor, self.oversample, self.oversample_interval),
            None => f64::NAN,
        }
    }

    fn read_co2_raw(&mut self) -> f64 {
        self.co2.read()
    }

    fn read_digital_input(&mut self, input: DigitalInput) -> bool {
        self.switches
            .get_mut(&input)
            .is_some_and(|pin| pin.is_high().unwrap_or(false))
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for LinuxHardware {
    fn write_digital_output(&mut self, output: DigitalOutput, on: bool) {
        if let Some(out) = self.outputs.get_mut(&output) {
            out.set(on);
        }
    }
}
