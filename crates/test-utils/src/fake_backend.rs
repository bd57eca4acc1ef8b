use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sitepipe::dag::ScheduledTask;
use sitepipe::exec::{RunResult, TaskBackend};

/// A fake backend that:
/// - records which tasks were "run", in order
/// - fails the tasks it was told to fail
/// - optionally takes `delay` per task, so triggers can arrive mid-run
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    executed: Arc<Mutex<Vec<String>>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared log of executed task names; stays valid after the backend is
    /// moved into an executor.
    pub fn log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.executed)
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl TaskBackend for FakeBackend {
    fn execute<'a>(
        &'a self,
        task: &'a ScheduledTask,
    ) -> Pin<Box<dyn Future<Output = RunResult> + Send + 'a>> {
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            self.executed.lock().unwrap().push(task.name.clone());

            if self.failing.contains(&task.name) {
                RunResult::failed(&task.name, vec!["fake failure".to_string()], Duration::ZERO)
            } else {
                RunResult::succeeded(&task.name, Vec::new(), Duration::ZERO)
            }
        })
    }
}
