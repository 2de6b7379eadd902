//! Progress reporting for update steps
//!
//! Progress flows through a plain callback ([`ProgressFn`]) taking a step name and
//! a completion fraction. [`StepProgress`] sits between the producers (download,
//! extraction, launch) and that callback and guarantees what every consumer relies
//! on: the fraction is finite, clamped to `[0, 1]` and never goes backwards within a
//! step.
//!
//! [`terminal_progress`] builds a callback that renders the steps as indicatif bars
//! for interactive callers.
//!
//! # Environment Variables
//!
//! - `UPDATE_HELPER_NO_PROGRESS`: Set to any value to hide the terminal bars
//!
//! # Examples
//!
//! ```rust
//! use update_helper::utils::progress::StepProgress;
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! let mut step = StepProgress::new(
//!     "downloading update helper",
//!     Arc::new(move |_, f| sink.lock().unwrap().push(f)),
//! );
//!
//! step.start();
//! step.ratio(512, Some(1024));
//! step.ratio(256, Some(1024)); // ignored, would go backwards
//! step.finish();
//!
//! assert_eq!(*seen.lock().unwrap(), vec![0.0, 0.5, 1.0]);
//! ```

use crate::constants::NO_PROGRESS_ENV;
use crate::models::ProgressFn;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};

/// Returns `true` when progress bars should be hidden.
#[must_use]
pub fn progress_disabled() -> bool {
    std::env::var_os(NO_PROGRESS_ENV).is_some()
}

/// Monotonic, clamped reporter for a single named step.
pub struct StepProgress {
    step: &'static str,
    callback: ProgressFn,
    last: f64,
}

impl StepProgress {
    /// Create a reporter for `step`.
    #[must_use]
    pub fn new(step: &'static str, callback: ProgressFn) -> Self {
        Self {
            step,
            callback,
            last: 0.0,
        }
    }

    /// Report the start of the step (`0.0`).
    pub fn start(&mut self) {
        self.last = 0.0;
        (self.callback)(self.step, 0.0);
    }

    /// Report `fraction`, clamped to `[0, 1]`.
    ///
    /// Non-finite values count as `0`; values below the last reported fraction are
    /// dropped.
    pub fn report(&mut self, fraction: f64) {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if fraction > self.last {
            self.last = fraction;
            (self.callback)(self.step, fraction);
        }
    }

    /// Report `done / total`; an unknown or zero total reports nothing beyond `0`.
    pub fn ratio(&mut self, done: u64, total: Option<u64>) {
        match total {
            Some(total) if total > 0 => self.report(done as f64 / total as f64),
            _ => self.report(0.0),
        }
    }

    /// Report the end of the step (`1.0`), unless it was already reported.
    pub fn finish(&mut self) {
        if self.last < 1.0 {
            self.last = 1.0;
            (self.callback)(self.step, 1.0);
        }
    }
}

fn step_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {percent:>3}%")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

/// Build a [`ProgressFn`] that draws one indicatif bar per step.
///
/// A new step name finishes the previous bar and starts a fresh one. The bars are
/// hidden when `UPDATE_HELPER_NO_PROGRESS` is set.
#[must_use]
pub fn terminal_progress() -> ProgressFn {
    let hidden = progress_disabled();
    let current: Mutex<Option<(String, ProgressBar)>> = Mutex::new(None);

    Arc::new(move |step: &str, fraction: f64| {
        let Ok(mut current) = current.lock() else {
            return;
        };

        let is_new_step = current.as_ref().is_none_or(|(name, _)| name != step);
        if is_new_step {
            if let Some((_, bar)) = current.take() {
                bar.finish();
            }
            let bar = if hidden {
                ProgressBar::hidden()
            } else {
                let bar = ProgressBar::new(100);
                bar.set_style(step_style());
                bar
            };
            bar.set_prefix(step.to_string());
            *current = Some((step.to_string(), bar));
        }

        if let Some((_, bar)) = current.as_ref() {
            bar.set_position((fraction.clamp(0.0, 1.0) * 100.0).round() as u64);
        }
    })
}
