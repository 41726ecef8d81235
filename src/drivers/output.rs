//! Switched output driver (solenoid valves, sample pump, 24 V enable).
//!
//! Wraps any embedded-hal [`OutputPin`] and remembers the commanded state.
//!
//! ## Safety contract
//!
//! Valve interlocks (one pressure valve at a time, pump only with a CO2
//! valve open) are the service's job; this driver is a dumb actuator.  A
//! failed write is logged and the remembered state left unchanged, so the
//! next command retries it.

use embedded_hal::digital::OutputPin;
use log::warn;

pub struct SwitchedOutput<P> {
    name: &'static str,
    pin: P,
    on: bool,
}

impl<P: OutputPin> SwitchedOutput<P> {
    /// Wrap `pin`, driving it low.
    pub fn new(name: &'static str, pin: P) -> Self {
        let mut out = Self {
            name,
            pin,
            on: true,
        };
        out.set(false);
        out
    }

    pub fn set(&mut self, on: bool) {
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => self.on = on,
            Err(e) => warn!("{}: write failed ({:?})", self.name, e),
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
