//! Combustion-safety logger library.
//!
//! Exposes the domain core and its adapters for the binary, integration
//! tests and fuzzing.  Everything hardware-specific sits behind the port
//! traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod burner;
pub mod config;
pub mod diagnostics;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod housekeeping;
pub mod monitor;
pub mod pins;
pub mod radio;
pub mod record;
pub mod sensors;
pub mod valves;
