//! Mode handler implementations and the mode-table builder.
//!
//! Each mode has an optional `on_enter` and a mandatory `on_update`.  The
//! table is built once per burner and handed to [`ModeMachine`](super::ModeMachine).

use log::{info, warn};

use super::context::BurnerContext;
use super::{BurnerMode, ModeDescriptor};

/// Build the mode table.  Order must match the `BurnerMode` discriminants.
pub fn build_mode_table() -> [ModeDescriptor; BurnerMode::COUNT] {
    [
        // Index 0: NotPresent
        ModeDescriptor {
            id: BurnerMode::NotPresent,
            name: "NotPresent",
            on_enter: Some(not_present_enter),
            on_update: not_present_update,
        },
        // Index 1: JustStarted
        ModeDescriptor {
            id: BurnerMode::JustStarted,
            name: "JustStarted",
            on_enter: Some(just_started_enter),
            on_update: just_started_update,
        },
        // Index 2: On
        ModeDescriptor {
            id: BurnerMode::On,
            name: "On",
            on_enter: None,
            on_update,
        },
        // Index 3: JustStopped
        ModeDescriptor {
            id: BurnerMode::JustStopped,
            name: "JustStopped",
            on_enter: None,
            on_update: just_stopped_update,
        },
        // Index 4: Cooling
        ModeDescriptor {
            id: BurnerMode::Cooling,
            name: "Cooling",
            on_enter: Some(cooling_enter),
            on_update: cooling_update,
        },
        // Index 5: Off
        ModeDescriptor {
            id: BurnerMode::Off,
            name: "Off",
            on_enter: Some(off_enter),
            on_update: off_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  NOT PRESENT: appliance not instrumented, pinned forever
// ═══════════════════════════════════════════════════════════════════════════

fn not_present_enter(ctx: &mut BurnerContext) {
    ctx.time_on = 0;
    ctx.time_cooling = 0;
}

fn not_present_update(ctx: &mut BurnerContext) -> Option<BurnerMode> {
    ctx.time_on = 0;
    ctx.time_cooling = 0;
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  JUST STARTED: first tick of a run
// ═══════════════════════════════════════════════════════════════════════════

fn just_started_enter(ctx: &mut BurnerContext) {
    ctx.time_on = ctx.now - ctx.start_time;
    ctx.time_cooling = 0;
    info!("{}: burner started", ctx.label);
}

fn just_started_update(ctx: &mut BurnerContext) -> Option<BurnerMode> {
    if ctx.is_on() {
        ctx.time_on = ctx.now - ctx.start_time;
        return Some(BurnerMode::On);
    }

    // Went out again straight away.
    ctx.stop_time = ctx.now;
    Some(BurnerMode::Cooling)
}

// ═══════════════════════════════════════════════════════════════════════════
//  ON: steady firing
// ═══════════════════════════════════════════════════════════════════════════

fn on_update(ctx: &mut BurnerContext) -> Option<BurnerMode> {
    ctx.time_on = ctx.now - ctx.start_time;

    if !ctx.is_on() {
        ctx.stop_time = ctx.now;
        info!("{}: burner stopped after {}s", ctx.label, ctx.time_on);
        return Some(BurnerMode::JustStopped);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  JUST STOPPED: first tick after a run
// ═══════════════════════════════════════════════════════════════════════════

fn just_stopped_update(ctx: &mut BurnerContext) -> Option<BurnerMode> {
    if ctx.is_on() {
        ctx.start_time = ctx.now - 1;
        return Some(BurnerMode::JustStarted);
    }

    ctx.time_cooling = ctx.now - ctx.stop_time;
    Some(BurnerMode::Cooling)
}

// ═══════════════════════════════════════════════════════════════════════════
//  COOLING: post-run flue cool-down
// ═══════════════════════════════════════════════════════════════════════════

fn cooling_enter(ctx: &mut BurnerContext) {
    ctx.time_on = 0;
    ctx.time_cooling = ctx.now - ctx.stop_time;
}

fn cooling_update(ctx: &mut BurnerContext) -> Option<BurnerMode> {
    ctx.time_cooling = ctx.now - ctx.stop_time;

    if ctx.is_on() {
        ctx.start_time = ctx.now - 1;
        return Some(BurnerMode::JustStarted);
    }

    let limits = ctx.limits;
    if ctx.time_cooling <= limits.skew_floor_secs {
        warn!(
            "{}: cooling time {}s is negative, clock moved backwards",
            ctx.label, ctx.time_cooling
        );
        return Some(BurnerMode::Off);
    }
    if ctx.time_cooling >= limits.max_secs
        || (ctx.time_cooling >= limits.min_secs && ctx.at_top_of_minute())
    {
        return Some(BurnerMode::Off);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  OFF: idle
// ═══════════════════════════════════════════════════════════════════════════

fn off_enter(ctx: &mut BurnerContext) {
    ctx.time_on = 0;
    ctx.time_cooling = 0;
}

fn off_update(ctx: &mut BurnerContext) -> Option<BurnerMode> {
    if ctx.is_on() {
        ctx.start_time = ctx.now - 1;
        return Some(BurnerMode::JustStarted);
    }
    None
}
