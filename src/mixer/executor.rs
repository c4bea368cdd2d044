use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

use crate::foundation::error::{PlayoutError, PlayoutResult};

type Task<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// Scheduling lane of a submitted task.
///
/// The worker always drains `High` before taking the next `Normal` task. Tasks within one
/// lane run in submission order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Priority {
    /// Control operations that must not wait behind queued compositions.
    High,
    /// Regular work.
    #[default]
    Normal,
}

struct Queue<S> {
    high: VecDeque<Task<S>>,
    normal: VecDeque<Task<S>>,
    closed: bool,
}

struct Shared<S> {
    queue: Mutex<Queue<S>>,
    available: Condvar,
}

/// Single worker thread owning a state value `S`.
///
/// Every access to the state runs as a task on the worker, so the state needs no locking.
/// A panicking task is logged and the worker keeps serving. Dropping the executor runs every
/// task already queued, then joins the thread.
pub struct Executor<S: Send + 'static> {
    shared: Arc<Shared<S>>,
    worker: Option<JoinHandle<()>>,
    name: String,
}

impl<S: Send + 'static> Executor<S> {
    /// Spawn a worker thread called `name` that owns `state`.
    pub fn new(name: impl Into<String>, state: S) -> PlayoutResult<Self> {
        let name = name.into();
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                high: VecDeque::new(),
                normal: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        });
        let worker = {
            let shared = Arc::clone(&shared);
            let thread_name = name.clone();
            std::thread::Builder::new()
                .name(name.clone())
                .spawn(move || run(&thread_name, &shared, state))
                .map_err(|e| {
                    PlayoutError::configuration(format!("failed to spawn executor '{name}': {e}"))
                })?
        };
        Ok(Self {
            shared,
            worker: Some(worker),
            name,
        })
    }

    /// Name of the worker thread.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of tasks waiting in both lanes.
    pub fn pending(&self) -> usize {
        let q = self.shared.queue.lock();
        q.high.len() + q.normal.len()
    }

    /// Queue `task` without waiting for it.
    pub fn begin_invoke<F>(&self, priority: Priority, task: F) -> PlayoutResult<()>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        let mut q = self.shared.queue.lock();
        if q.closed {
            return Err(PlayoutError::invalid_operation(format!(
                "executor '{}' is shut down",
                self.name
            )));
        }
        match priority {
            Priority::High => q.high.push_back(Box::new(task)),
            Priority::Normal => q.normal.push_back(Box::new(task)),
        }
        drop(q);
        self.shared.available.notify_one();
        Ok(())
    }

    /// Run `task` on the worker and block for its result.
    ///
    /// Calling this from the worker thread itself deadlocks.
    pub fn invoke<R, F>(&self, priority: Priority, task: F) -> PlayoutResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> R + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.begin_invoke(priority, move |state| {
            let _ = tx.send(task(state));
        })?;
        // A panicking task drops the sender before replying.
        rx.recv().map_err(|_| {
            PlayoutError::invalid_operation(format!(
                "executor '{}' task panicked before replying",
                self.name
            ))
        })
    }
}

impl<S: Send + 'static> Drop for Executor<S> {
    fn drop(&mut self) {
        self.shared.queue.lock().closed = true;
        self.shared.available.notify_all();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::error!(executor = %self.name, "executor worker panicked");
        }
    }
}

fn run<S>(name: &str, shared: &Shared<S>, mut state: S) {
    tracing::debug!(executor = name, "executor started");
    loop {
        let task = {
            let mut q = shared.queue.lock();
            loop {
                if let Some(t) = q.high.pop_front() {
                    break Some(t);
                }
                if let Some(t) = q.normal.pop_front() {
                    break Some(t);
                }
                if q.closed {
                    break None;
                }
                shared.available.wait(&mut q);
            }
        };
        let Some(task) = task else { break };
        if catch_unwind(AssertUnwindSafe(|| task(&mut state))).is_err() {
            tracing::error!(executor = name, "executor task panicked");
        }
    }
    tracing::debug!(executor = name, "executor stopped");
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/executor.rs"]
mod tests;
