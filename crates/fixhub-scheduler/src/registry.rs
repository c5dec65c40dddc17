//! Named-task registry — at most one live handle per task name.
//!
//! An explicit value owned by the process lifetime object: constructed at
//! startup, passed by reference, torn down with `stop()` at shutdown. Not a
//! module-level singleton. A task body that errors is logged and the timer
//! re-arms for the next period regardless.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use fixhub_core::clock::Clock;
use fixhub_core::error::{FixHubError, Result};

use crate::rules::ScheduleRule;

/// Boxed task body future: resolves to a one-line summary for the log.
pub type TaskFuture = Pin<Box<dyn Future<Output = Result<String>> + Send>>;

/// Factory producing one run of a task body.
pub type TaskRunner = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

struct RegisteredTask {
    runner: TaskRunner,
    handle: JoinHandle<()>,
}

/// Registry of named recurring tasks.
pub struct SchedulerRegistry {
    tasks: Mutex<HashMap<String, RegisteredTask>>,
    clock: Arc<dyn Clock>,
}

impl SchedulerRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Start a task: sleep until the rule's next fire, run the body, then
    /// re-fire on the rule's fixed period. A task name is only ever started
    /// once per process lifetime; a second start is refused.
    pub fn start(&self, name: &str, rule: ScheduleRule, runner: TaskRunner) -> bool {
        let mut tasks = self.tasks.lock().unwrap();
        if tasks.contains_key(name) {
            tracing::warn!("⚠️ Task '{name}' already started — ignoring");
            return false;
        }

        let now = self.clock.now();
        let delay = rule
            .delay_until_next(now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        let period = rule
            .period()
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(1));

        tracing::info!(
            "⏰ Task '{name}' scheduled: first fire at {}",
            rule.next_fire(now).format("%Y-%m-%d %H:%M UTC")
        );

        let task_name = name.to_string();
        let body = runner.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            run_body(&task_name, &body).await;

            let mut interval = tokio::time::interval(period);
            interval.tick().await; // first tick resolves immediately
            loop {
                interval.tick().await;
                run_body(&task_name, &body).await;
            }
        });

        tasks.insert(name.to_string(), RegisteredTask { runner, handle });
        true
    }

    /// Run a task body immediately, independent of its schedule. For
    /// operational testing.
    pub async fn trigger(&self, name: &str) -> Result<String> {
        let runner = self
            .tasks
            .lock()
            .unwrap()
            .get(name)
            .map(|t| t.runner.clone())
            .ok_or_else(|| FixHubError::Scheduler(format!("unknown task '{name}'")))?;
        tracing::info!("🔔 Manual trigger: '{name}'");
        runner().await
    }

    /// Registered task names.
    pub fn task_names(&self) -> Vec<String> {
        self.tasks.lock().unwrap().keys().cloned().collect()
    }

    /// Cancel every handle and clear the registry. Process shutdown only.
    pub fn stop(&self) {
        let mut tasks = self.tasks.lock().unwrap();
        for (name, task) in tasks.drain() {
            task.handle.abort();
            tracing::info!("⏹ Task '{name}' stopped");
        }
    }
}

async fn run_body(name: &str, runner: &TaskRunner) {
    match runner().await {
        Ok(summary) => tracing::info!("✅ Task '{name}': {summary}"),
        // Errors are logged only; the interval re-arms regardless.
        Err(e) => tracing::warn!("⚠️ Task '{name}' failed: {e}"),
    }
}
