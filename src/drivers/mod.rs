//! Linux peripheral drivers: ADC and pressure channels, GPIO, switched
//! outputs and the hardware watchdog.

pub mod dlvr;
pub mod gpio;
pub mod iio;
pub mod output;
pub mod watchdog;
