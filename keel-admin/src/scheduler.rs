use dashmap::DashMap;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

pub type ScheduledAction = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Trigger source for periodic jobs.
pub trait Scheduler: Send + Sync {
    /// Runs `action` after `initial_delay`, then every `interval`. A task
    /// registered under an existing name replaces it.
    fn run_periodically(
        &self,
        name: &str,
        action: ScheduledAction,
        initial_delay: Duration,
        interval: Duration,
    );

    /// Returns false when no task of that name was running.
    fn stop(&self, name: &str) -> bool;

    fn shutdown(&self);
}

/// Schedules each task on its own tokio interval. A run that outlasts the
/// interval delays the next one instead of overlapping it.
#[derive(Debug, Default)]
pub struct TokioScheduler {
    tasks: DashMap<String, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.tasks
            .get(name)
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Scheduler for TokioScheduler {
    fn run_periodically(
        &self,
        name: &str,
        action: ScheduledAction,
        initial_delay: Duration,
        interval: Duration,
    ) {
        if interval.is_zero() {
            warn!(task = %name, "refusing to schedule a task with a zero interval");
            return;
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(initial_delay).await;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                action().await;
            }
        });

        if let Some(previous) = self.tasks.insert(name.to_string(), handle) {
            previous.abort();
        }
        info!(task = %name, ?initial_delay, ?interval, "scheduled periodic task");
    }

    fn stop(&self, name: &str) -> bool {
        match self.tasks.remove(name) {
            Some((_, handle)) => {
                handle.abort();
                info!(task = %name, "stopped periodic task");
                true
            }
            None => false,
        }
    }

    fn shutdown(&self) {
        let names: Vec<String> = self.tasks.iter().map(|e| e.key().clone()).collect();
        for name in names {
            self.stop(&name);
        }
    }
}
