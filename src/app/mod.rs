//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the per-second pipeline of the logger: burner
//! classification, monitor state, valve sequencing and the record decision.
//! All interaction with hardware, files and the clock happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
