// src/watch/debounce.rs

//! Trailing-edge debouncing of task triggers.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::types::TaskName;

/// Coalesces bursts of changes into one trigger per task.
///
/// Every recorded change (re)starts the task's window; the task becomes due
/// once a full window passes without another change.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadlines: HashMap<TaskName, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadlines: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_idle(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Record a change for `task` observed at `now`.
    pub fn record(&mut self, task: &str, now: Instant) {
        self.deadlines.insert(task.to_string(), now + self.window);
    }

    /// Earliest instant at which some task becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every task whose window has elapsed, sorted by name.
    pub fn take_due(&mut self, now: Instant) -> Vec<TaskName> {
        let mut due: Vec<TaskName> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(task, _)| task.clone())
            .collect();
        for task in &due {
            self.deadlines.remove(task);
        }
        due.sort();
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(200);

    #[tokio::test(start_paused = true)]
    async fn burst_fires_once_after_quiet_period() {
        let mut d = Debouncer::new(WINDOW);
        let start = Instant::now();

        for i in 0..5 {
            d.record("sass", start + Duration::from_millis(i * 50));
        }

        // Last change at +200ms, so nothing is due until +400ms.
        assert!(d.take_due(start + Duration::from_millis(399)).is_empty());
        assert_eq!(d.next_deadline(), Some(start + Duration::from_millis(400)));
        assert_eq!(d.take_due(start + Duration::from_millis(400)), vec!["sass"]);
        assert!(d.is_idle());
        assert!(d.take_due(start + Duration::from_secs(10)).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn tasks_have_independent_windows() {
        let mut d = Debouncer::new(WINDOW);
        let start = Instant::now();

        d.record("js", start);
        d.record("sass", start + Duration::from_millis(150));

        assert_eq!(d.take_due(start + WINDOW), vec!["js"]);
        assert_eq!(d.take_due(start + Duration::from_millis(350)), vec!["sass"]);
    }

    #[tokio::test(start_paused = true)]
    async fn due_tasks_are_sorted() {
        let mut d = Debouncer::new(WINDOW);
        let now = Instant::now();
        d.record("sass", now);
        d.record("img", now);
        d.record("js", now);
        assert_eq!(d.take_due(now + WINDOW), vec!["img", "js", "sass"]);
    }
}
