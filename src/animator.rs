//! Timed playback of a resolved path.
//!
//! Each step is its own task with a deadline of `start + index * step_delay`.
//! Steps are not chained: a slow callback does not push later steps back.
//! There is no cancellation; callers must not start a second playback until
//! the first has finished.

use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};

use crate::catalog::RegimeId;

pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(500);

/// Handle to an in-flight playback.
#[derive(Debug)]
pub struct Playback {
    path: Vec<RegimeId>,
    step_delay: Duration,
    steps: Vec<JoinHandle<()>>,
}

impl Playback {
    /// `(len - 1) * step_delay`
    pub fn total_duration(&self) -> Duration {
        let steps = self.path.len().saturating_sub(1) as u32;
        self.step_delay.saturating_mul(steps)
    }

    /// Resolves once every step callback has run.
    pub async fn finished(self) -> Result<()> {
        for step in self.steps {
            step.await?;
        }
        Ok(())
    }
}

/// Schedule `on_step(regime, index)` for every element of `path`.
///
/// Must be called from within a tokio runtime.
pub fn play<F>(path: Vec<RegimeId>, on_step: F, step_delay: Duration) -> Playback
where
    F: Fn(RegimeId, usize) + Send + Sync + 'static,
{
    let on_step = Arc::new(on_step);
    let started = Instant::now();

    let steps = path
        .iter()
        .copied()
        .enumerate()
        .map(|(index, regime)| {
            let on_step = Arc::clone(&on_step);
            let deadline = started + step_delay.saturating_mul(index as u32);
            tokio::spawn(async move {
                sleep_until(deadline).await;
                on_step(regime, index);
            })
        })
        .collect();

    Playback {
        path,
        step_delay,
        steps,
    }
}
