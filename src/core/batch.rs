//! Bounded fan-out/fan-in over independent units of work.
//!
//! Units are split into groups of `workers`. A group is launched onto the
//! blocking pool and fully joined before the next group starts, so at most
//! `workers` units ever run at once. There is no persistent pool and no
//! work stealing; one slow unit holds up the rest of its group.

use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Why a single unit did not produce a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitFailure {
    /// The unit returned an error
    Failed(String),

    /// The unit panicked or its task was lost
    Panicked(String),
}

impl Display for UnitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitFailure::Failed(msg) => write!(f, "failed: {}", msg),
            UnitFailure::Panicked(msg) => write!(f, "panicked: {}", msg),
        }
    }
}

/// Result of one unit, tagged with its position in the submitted list
#[derive(Debug)]
pub struct UnitOutcome<T> {
    /// Index of the unit in the submitted list
    pub index: usize,

    pub result: Result<T, UnitFailure>,
}

/// Counts from a fire-and-forget batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub succeeded: usize,
    pub failed: usize,
    pub groups: usize,
}

impl BatchStats {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Runs units of work with bounded parallelism
#[derive(Debug, Clone)]
pub struct BatchExecutor {
    workers: usize,

    /// Progress bar label; no bar is drawn when unset
    progress: Option<String>,
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new(default_workers())
    }
}

/// Available parallelism, or 1 when it cannot be determined
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl BatchExecutor {
    /// Create an executor; a worker count of 0 is treated as 1
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            progress: None,
        }
    }

    /// Draw a progress bar, ticked once per finished group
    pub fn with_progress(mut self, label: impl Into<String>) -> Self {
        self.progress = Some(label.into());
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn progress_bar(&self, groups: usize) -> Option<ProgressBar> {
        let label = self.progress.as_ref()?;
        let bar = ProgressBar::new(groups as u64);
        bar.set_style(
            ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len} groups")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(label.clone());
        Some(bar)
    }

    /// Run every unit and gather the values it returns.
    ///
    /// Outcomes arrive in completion order, not submission order; use
    /// [`UnitOutcome::index`] to line them back up.
    pub async fn collect<T, E, F>(&self, units: Vec<F>) -> Vec<UnitOutcome<T>>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let total = units.len();
        let group_count = total.div_ceil(self.workers);
        let bar = self.progress_bar(group_count);
        let mut outcomes = Vec::with_capacity(total);
        let mut pending = units.into_iter().enumerate().peekable();
        let mut group = 0;

        while pending.peek().is_some() {
            let mut set = JoinSet::new();
            let mut launched = Vec::with_capacity(self.workers);

            for (index, unit) in pending.by_ref().take(self.workers) {
                launched.push(index);
                set.spawn_blocking(move || {
                    let result = match catch_unwind(AssertUnwindSafe(unit)) {
                        Ok(Ok(value)) => Ok(value),
                        Ok(Err(e)) => Err(UnitFailure::Failed(e.to_string())),
                        Err(payload) => Err(UnitFailure::Panicked(panic_message(payload))),
                    };
                    UnitOutcome { index, result }
                });
            }

            let mut finished = Vec::with_capacity(launched.len());
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(outcome) => {
                        if let Err(failure) = &outcome.result {
                            warn!(unit = outcome.index, %failure, "Batch unit did not complete");
                        }
                        finished.push(outcome.index);
                        outcomes.push(outcome);
                    }
                    Err(e) => warn!(error = %e, "Batch task was lost"),
                }
            }

            // Tasks lost to the runtime never reported their index
            for index in launched.into_iter().filter(|i| !finished.contains(i)) {
                outcomes.push(UnitOutcome {
                    index,
                    result: Err(UnitFailure::Panicked("task was cancelled".to_string())),
                });
            }

            group += 1;
            debug!(group, of = group_count, "Batch group finished");
            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }

        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
        outcomes
    }

    /// Run every unit for its side effect, discarding returned values
    pub async fn run_all<E, F>(&self, units: Vec<F>) -> BatchStats
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: Display + Send + 'static,
    {
        let groups = units.len().div_ceil(self.workers);
        let outcomes = self.collect(units).await;
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();

        BatchStats {
            succeeded: outcomes.len() - failed,
            failed,
            groups,
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
