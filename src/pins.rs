//! GPIO assignments for the logger cape on a BeagleBone Black.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Values are Linux sysfs GPIO numbers
//! (`32 * bank + bit`); the header pin is given alongside.

use crate::app::ports::DigitalOutput;
use crate::sensors::DigitalInput;
use crate::valves::{Co2Valve, PressureValve};

// ---------------------------------------------------------------------------
// Pressure selector solenoids (S01-S04)
// ---------------------------------------------------------------------------

/// S01, P8_7: pressure reference (zero).
pub const PRESSURE_ZERO_GPIO: u32 = 66;
/// S02, P8_8: water heater vent.
pub const PRESSURE_WHVENT_GPIO: u32 = 67;
/// S03, P8_9: furnace vent.
pub const PRESSURE_FVENT_GPIO: u32 = 69;
/// S04, P8_10: combustion zone.
pub const PRESSURE_ZONE_GPIO: u32 = 68;

// ---------------------------------------------------------------------------
// CO2 selector solenoids (S05-S07) and sample pump (S08)
// ---------------------------------------------------------------------------

/// S05, P8_11
pub const CO2_WHVENT_GPIO: u32 = 45;
/// S06, P8_12
pub const CO2_FVENT_GPIO: u32 = 44;
/// S07, P8_13
pub const CO2_ZONE_GPIO: u32 = 23;
/// S08, P8_14
pub const PUMP_GPIO: u32 = 26;

// ---------------------------------------------------------------------------
// Power and door switches
// ---------------------------------------------------------------------------

/// P8_15: 24 V rail enable for all solenoids and the pump.
pub const POWER_24V_GPIO: u32 = 47;
/// P8_16: door switch 1.
pub const SWITCH1_GPIO: u32 = 46;
/// P8_17: door switch 2.
pub const SWITCH2_GPIO: u32 = 27;

/// GPIO driving an output.
pub const fn output_gpio(output: DigitalOutput) -> u32 {
    match output {
        DigitalOutput::PressureValve(PressureValve::Zero) => PRESSURE_ZERO_GPIO,
        DigitalOutput::PressureValve(PressureValve::WhVent) => PRESSURE_WHVENT_GPIO,
        DigitalOutput::PressureValve(PressureValve::FVent) => PRESSURE_FVENT_GPIO,
        DigitalOutput::PressureValve(PressureValve::Zone) => PRESSURE_ZONE_GPIO,
        DigitalOutput::Co2Valve(Co2Valve::WhVent) => CO2_WHVENT_GPIO,
        DigitalOutput::Co2Valve(Co2Valve::FVent) => CO2_FVENT_GPIO,
        DigitalOutput::Co2Valve(Co2Valve::Zone) => CO2_ZONE_GPIO,
        DigitalOutput::Pump => PUMP_GPIO,
        DigitalOutput::Power24V => POWER_24V_GPIO,
    }
}

pub const fn input_gpio(input: DigitalInput) -> u32 {
    match input {
        DigitalInput::Switch1 => SWITCH1_GPIO,
        DigitalInput::Switch2 => SWITCH2_GPIO,
    }
}
