//! Periodic re-generation against a live registry.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::diagnostic::GeneratorError;
use crate::registry::RegistryConnector;
use crate::{GenerateReport, Generator};

/// Re-runs the pipeline on a fixed interval.
///
/// Runs never overlap: each tick executes the pipeline inline, and slots
/// that elapse while a run is still in flight are skipped. The
/// configuration captured at construction is reused unchanged on every
/// tick, and each tick starts from a fresh scaffold and registry snapshot.
/// A failed tick does not stop the timer; the next slot fires as scheduled.
pub struct RefreshScheduler<C> {
    generator: Generator,
    connector: C,
    every: Duration,
    ticker: Option<Interval>,
}

impl<C: RegistryConnector> RefreshScheduler<C> {
    pub fn new(generator: Generator, connector: C, every: Duration) -> Self {
        Self {
            generator,
            connector,
            every,
            ticker: None,
        }
    }

    /// The interval between tick slots.
    pub fn every(&self) -> Duration {
        self.every
    }

    /// Runs the pipeline immediately, outside the timer cadence. Meant for
    /// the unconditional first run.
    pub async fn run_now(&self) -> Result<GenerateReport, GeneratorError> {
        self.generator.run_once(&self.connector).await
    }

    /// Waits for the next slot, then runs one full pipeline pass. The
    /// first slot opens one interval after the first call.
    pub async fn tick(&mut self) -> Result<GenerateReport, GeneratorError> {
        let every = self.every;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = time::interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });
        ticker.tick().await;

        self.generator.run_once(&self.connector).await
    }
}
