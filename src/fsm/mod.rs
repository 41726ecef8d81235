//! Function-pointer state machine engine for burner modes.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  ModeTable                                                 │
//! │  ┌─────────────┬───────────┬────────────────────────────┐  │
//! │  │ BurnerMode  │ on_enter  │ on_update                  │  │
//! │  ├─────────────┼───────────┼────────────────────────────┤  │
//! │  │ NotPresent  │ fn(ctx)   │ fn(ctx) -> Option<mode>    │  │
//! │  │ JustStarted │ fn(ctx)   │ fn(ctx) -> Option<mode>    │  │
//! │  │ On          │ -         │ fn(ctx) -> Option<mode>    │  │
//! │  │ JustStopped │ -         │ fn(ctx) -> Option<mode>    │  │
//! │  │ Cooling     │ fn(ctx)   │ fn(ctx) -> Option<mode>    │  │
//! │  │ Off         │ fn(ctx)   │ fn(ctx) -> Option<mode>    │  │
//! │  └─────────────┴───────────┴────────────────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** mode.  If it
//! returns `Some(next)`, the engine moves the pointer and runs `on_enter`
//! for the next mode.  At most one transition happens per tick, so a burner
//! walks JustStarted → On → JustStopped → Cooling → Off one second at a
//! time.  Handlers receive `&mut BurnerContext`, which carries the freshly
//! computed status, the tick timestamp and the start/stop bookkeeping.

pub mod context;
pub mod states;

use context::BurnerContext;
use log::debug;

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

/// Lifecycle mode of one burner.  Discriminants are the codes written to
/// records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BurnerMode {
    NotPresent = 0,
    JustStarted = 1,
    On = 2,
    JustStopped = 3,
    Cooling = 4,
    Off = 5,
}

impl BurnerMode {
    /// Total number of modes, used to size the table array.
    pub const COUNT: usize = 6;

    /// Convert a table index back to `BurnerMode`.  Out-of-range indices
    /// map to `Off`.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::NotPresent,
            1 => Self::JustStarted,
            2 => Self::On,
            3 => Self::JustStopped,
            4 => Self::Cooling,
            5 => Self::Off,
            _ => {
                debug_assert!(false, "invalid mode index: {idx}");
                Self::Off
            }
        }
    }

    /// Record code.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Runs once when a mode is entered.
pub type ModeActionFn = fn(&mut BurnerContext);

/// Per-tick handler.  Returns `Some(next)` to transition, `None` to stay.
pub type ModeUpdateFn = fn(&mut BurnerContext) -> Option<BurnerMode>;

/// Static descriptor for a single mode.
pub struct ModeDescriptor {
    pub id: BurnerMode,
    pub name: &'static str,
    pub on_enter: Option<ModeActionFn>,
    pub on_update: ModeUpdateFn,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Mode machine for one burner.
pub struct ModeMachine {
    /// Fixed-size table indexed by `BurnerMode as usize`.
    table: [ModeDescriptor; BurnerMode::COUNT],
    current: usize,
    /// Ticks spent in the current mode.
    ticks_in_mode: u64,
}

impl ModeMachine {
    pub fn new(table: [ModeDescriptor; BurnerMode::COUNT], initial: BurnerMode) -> Self {
        Self {
            table,
            current: initial as usize,
            ticks_in_mode: 0,
        }
    }

    /// Advance one tick.  Returns the mode that was current before the call.
    pub fn tick(&mut self, ctx: &mut BurnerContext) -> BurnerMode {
        let from = self.current_mode();
        self.ticks_in_mode += 1;

        if let Some(next) = (self.table[self.current].on_update)(ctx) {
            self.transition(next, ctx);
        }
        from
    }

    /// Jump straight to `next`, running its `on_enter`.
    pub fn force(&mut self, next: BurnerMode, ctx: &mut BurnerContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_mode(&self) -> BurnerMode {
        BurnerMode::from_index(self.current)
    }

    pub fn ticks_in_mode(&self) -> u64 {
        self.ticks_in_mode
    }

    fn transition(&mut self, next: BurnerMode, ctx: &mut BurnerContext) {
        let next_idx = next as usize;
        debug!(
            "{}: {} -> {}",
            ctx.label, self.table[self.current].name, self.table[next_idx].name
        );

        self.current = next_idx;
        self.ticks_in_mode = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
