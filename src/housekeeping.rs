//! Housekeeping timer engine.
//!
//! Runs alongside the per-second record pipeline.  Each task has a period in
//! wall-clock seconds; when one comes due the timer notifies a
//! [`HousekeepingDelegate`], which in the service writes the diagnostics
//! record, checks free disk space or rotates oversize files.
//!
//! ```text
//!   ┌──────────────┬───────────┬───────────┐
//!   │ task         │ period    │ last run  │
//!   ├──────────────┼───────────┼───────────┤
//!   │ diagnostics  │ 86 400 s  │ t0        │──┐
//!   │ disk-check   │     60 s  │ t0        │──┼──▶ HousekeepingDelegate
//!   │ rotate       │     60 s  │ t0        │──┘
//!   └──────────────┴───────────┴───────────┘
//! ```

use log::{info, warn};

use crate::app::ports::HousekeepingDelegate;

/// Housekeeping jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HousekeepingTask {
    /// Append a record to the diagnostics file.
    Diagnostics,
    /// Stop logging if free disk space is below the floor.
    DiskCheck,
    /// Start a new file once the active one is oversize.
    Rotate,
}

impl HousekeepingTask {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Diagnostics => "diagnostics",
            Self::DiskCheck => "disk-check",
            Self::Rotate => "rotate",
        }
    }
}

/// Maximum number of tasks (stack-allocated).
pub const MAX_TASKS: usize = 4;

#[derive(Debug, Clone, Copy)]
struct TaskEntry {
    task: HousekeepingTask,
    period_secs: i64,
    last_run: Option<i64>,
    enabled: bool,
}

pub struct Housekeeping {
    tasks: heapless::Vec<TaskEntry, MAX_TASKS>,
}

impl Default for Housekeeping {
    fn default() -> Self {
        Self::new()
    }
}

impl Housekeeping {
    pub fn new() -> Self {
        Self {
            tasks: heapless::Vec::new(),
        }
    }

    /// Standard task set from the configured periods.
    pub fn with_periods(diagnostics_secs: u32, disk_check_secs: u32, rotate_secs: u32) -> Self {
        let mut hk = Self::new();
        hk.add(HousekeepingTask::Diagnostics, diagnostics_secs);
        hk.add(HousekeepingTask::DiskCheck, disk_check_secs);
        hk.add(HousekeepingTask::Rotate, rotate_secs);
        hk
    }

    /// Register a task.  Returns `false` if the table is full or the period
    /// is zero.
    pub fn add(&mut self, task: HousekeepingTask, period_secs: u32) -> bool {
        if period_secs == 0 {
            warn!("Housekeeping: '{}' has a zero period, not scheduled", task.label());
            return false;
        }
        let entry = TaskEntry {
            task,
            period_secs: i64::from(period_secs),
            last_run: None,
            enabled: true,
        };
        if self.tasks.push(entry).is_err() {
            return false;
        }
        info!("Housekeeping: '{}' every {}s", task.label(), period_secs);
        true
    }

    pub fn set_enabled(&mut self, task: HousekeepingTask, enabled: bool) {
        for entry in self.tasks.iter_mut().filter(|e| e.task == task) {
            entry.enabled = enabled;
        }
    }

    /// Check every task against `now` and notify the delegate of those due.
    ///
    /// The first call only starts the clocks.  A clock that moved backwards
    /// restarts the affected periods from `now`.
    pub fn tick(&mut self, now: i64, delegate: &mut dyn HousekeepingDelegate) {
        for entry in self.tasks.iter_mut() {
            let Some(last) = entry.last_run else {
                entry.last_run = Some(now);
                continue;
            };
            if now < last {
                entry.last_run = Some(now);
                continue;
            }
            if entry.enabled && now - last >= entry.period_secs {
                entry.last_run = Some(now);
                delegate.on_task_due(entry.task, now);
            }
        }
    }

    /// Number of enabled tasks.
    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|e| e.enabled).count()
    }
}
