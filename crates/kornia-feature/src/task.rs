use std::thread::JoinHandle;

/// A unit of work with a `start` / `wait` lifecycle.
///
/// Every pipeline strategy implements this contract. A task is started at most
/// once; failures inside the task are reported through `log` and are not
/// visible to the caller of [`Task::wait`].
pub trait Task: Send {
    /// Begins the execution of the task and returns once it is scheduled.
    ///
    /// Calling `start` on a task that was already started does nothing.
    fn start(&mut self);

    /// Blocks until the task has finished.
    ///
    /// Returns immediately if the task was never started or already finished.
    fn wait(&mut self);
}

/// The lifecycle state of a [`ThreadTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Constructed but not started.
    Constructed,
    /// Running on its worker thread.
    Running,
    /// Finished, successfully or not.
    Finished,
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A task that runs a closure on a worker thread it owns.
///
/// # Example
///
/// ```
/// use kornia_feature::task::{Task, TaskState, ThreadTask};
///
/// let mut task = ThreadTask::new("hello", || println!("hello from the worker"));
/// task.start();
/// task.wait();
/// assert_eq!(task.state(), TaskState::Finished);
/// ```
pub struct ThreadTask {
    name: String,
    job: Option<Job>,
    handle: Option<JoinHandle<()>>,
    state: TaskState,
}

impl ThreadTask {
    /// Creates a new task from a name, used for the worker thread, and a closure.
    pub fn new(name: impl Into<String>, job: impl FnOnce() + Send + 'static) -> Self {
        Self {
            name: name.into(),
            job: Some(Box::new(job)),
            handle: None,
            state: TaskState::Constructed,
        }
    }

    /// The name of the task.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.state
    }
}

impl Task for ThreadTask {
    fn start(&mut self) {
        let Some(job) = self.job.take() else {
            return;
        };

        match std::thread::Builder::new().name(self.name.clone()).spawn(job) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.state = TaskState::Running;
            }
            Err(e) => {
                log::error!("Failed to spawn the worker thread of `{}`: {e}", self.name);
                self.state = TaskState::Finished;
            }
        }
    }

    fn wait(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        if handle.join().is_err() {
            log::error!("Task `{}` panicked", self.name);
        }

        self.state = TaskState::Finished;
    }
}

impl Drop for ThreadTask {
    fn drop(&mut self) {
        self.wait();
    }
}

impl std::fmt::Debug for ThreadTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadTask")
            .field("name", &self.name)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn test_lifecycle() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut task = ThreadTask::new("count", {
            let counter = counter.clone();
            move || {
                std::thread::sleep(std::time::Duration::from_millis(10));
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        assert_eq!(task.state(), TaskState::Constructed);

        task.start();
        assert_eq!(task.state(), TaskState::Running);

        task.wait();
        assert_eq!(task.state(), TaskState::Finished);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_never_restarted() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut task = ThreadTask::new("once", {
            let counter = counter.clone();
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        task.start();
        task.wait();
        task.start();
        task.wait();
        task.wait();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(task.state(), TaskState::Finished);
    }

    #[test]
    fn test_wait_before_start() {
        let mut task = ThreadTask::new("idle", || {});
        assert_eq!(task.name(), "idle");
        task.wait();
        assert_eq!(task.state(), TaskState::Constructed);
    }

    #[test]
    fn test_panic_is_contained() {
        let mut task = ThreadTask::new("boom", || panic!("boom"));
        task.start();
        task.wait();
        assert_eq!(task.state(), TaskState::Finished);
    }
}
