use std::{marker::PhantomData, sync::OnceLock, thread::ThreadId};

use crate::{error::PipelineError, task::Task};

/// Environment variable that disables GPU execution when set to anything but `0`.
pub const DISABLE_GPU_ENV: &str = "KORNIA_FEATURE_DISABLE_GPU";

/// Whether a value of [`DISABLE_GPU_ENV`] turns GPU execution off.
fn disabled_by(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty() && v != "0")
}

/// Process wide capability flag telling whether GPU execution is allowed.
///
/// The flag is resolved once with [`GpuSupport::detect`] and handed to the
/// dispatcher, which only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuSupport {
    enabled: bool,
}

impl GpuSupport {
    /// Creates a capability flag with an explicit value.
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// GPU execution is never used.
    pub const fn disabled() -> Self {
        Self::new(false)
    }

    /// Resolves the flag from the build and the environment.
    ///
    /// GPU execution requires the `opengl` feature and is turned off by
    /// setting [`DISABLE_GPU_ENV`]. The value is computed on first call and
    /// cached for the lifetime of the process.
    pub fn detect() -> Self {
        static GPU_SUPPORT: OnceLock<GpuSupport> = OnceLock::new();
        *GPU_SUPPORT.get_or_init(|| {
            let value = std::env::var(DISABLE_GPU_ENV).ok();
            let support = Self::new(cfg!(feature = "opengl") && !disabled_by(value.as_deref()));
            log::debug!("GPU execution enabled: {}", support.enabled);
            support
        })
    }

    /// Whether GPU execution is allowed.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Creates rendering contexts on the thread that will own them.
///
/// The returned context is released when dropped. Contexts are bound to the
/// thread that acquired them and are not required to be `Send`.
pub trait ContextProvider: Sync {
    /// The rendering context type.
    type Context;

    /// Acquires a rendering context and makes it current on the calling thread.
    fn acquire(&self) -> Result<Self::Context, PipelineError>;
}

/// A rendering context without a window surface.
///
/// It records the thread that created it and must be released on that same
/// thread.
#[derive(Debug)]
pub struct HeadlessContext {
    owner: ThreadId,
    // keeps the context on its thread
    _not_send: PhantomData<*const ()>,
}

impl HeadlessContext {
    /// The thread owning the context.
    pub fn owner(&self) -> ThreadId {
        self.owner
    }
}

impl Drop for HeadlessContext {
    fn drop(&mut self) {
        debug_assert_eq!(std::thread::current().id(), self.owner);
        log::debug!("Released rendering context on {:?}", self.owner);
    }
}

/// The default [`ContextProvider`], creating [`HeadlessContext`] objects.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessContextProvider;

impl ContextProvider for HeadlessContextProvider {
    type Context = HeadlessContext;

    fn acquire(&self) -> Result<Self::Context, PipelineError> {
        let owner = std::thread::current().id();
        log::debug!("Acquired rendering context on {owner:?}");
        Ok(HeadlessContext {
            owner,
            _not_send: PhantomData,
        })
    }
}

/// Runs a [`Task`] on a dedicated thread that owns a rendering context.
///
/// The context is acquired on the runner thread before the task starts and is
/// released on the same thread after the task finished, also when the task
/// panics.
pub struct GpuContextRunner<'a, P: ContextProvider> {
    provider: &'a P,
}

impl<'a, P: ContextProvider> GpuContextRunner<'a, P> {
    /// Creates a new runner using the given context provider.
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Runs the full lifecycle of the task inside a rendering context.
    ///
    /// # Arguments
    ///
    /// * `task` - A task that was not started yet.
    ///
    /// # Returns
    ///
    /// An error if the thread could not be spawned or the context could not be
    /// acquired, in which case the task was not started. A panic on the runner
    /// thread is resumed on the calling thread.
    pub fn run(&self, task: &mut dyn Task) -> Result<(), PipelineError> {
        let provider = self.provider;
        std::thread::scope(|s| {
            let handle = std::thread::Builder::new()
                .name("render-context".to_string())
                .spawn_scoped(s, move || -> Result<(), PipelineError> {
                    let _context = provider.acquire()?;
                    task.start();
                    task.wait();
                    Ok(())
                })
                .map_err(|e| PipelineError::RenderContext(e.to_string()))?;

            match handle.join() {
                Ok(result) => result,
                Err(payload) => std::panic::resume_unwind(payload),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingProvider;

    impl ContextProvider for FailingProvider {
        type Context = ();

        fn acquire(&self) -> Result<(), PipelineError> {
            Err(PipelineError::RenderContext("no display".to_string()))
        }
    }

    #[derive(Default)]
    struct FlagTask {
        started: bool,
        waited: bool,
    }

    impl Task for FlagTask {
        fn start(&mut self) {
            self.started = true;
        }

        fn wait(&mut self) {
            self.waited = true;
        }
    }

    #[test]
    fn test_gpu_support() {
        assert!(!GpuSupport::disabled().is_enabled());
        assert!(GpuSupport::new(true).is_enabled());
        assert_eq!(GpuSupport::detect(), GpuSupport::detect());
    }

    #[test]
    fn test_disabled_by_env_value() {
        assert!(!disabled_by(None));
        assert!(!disabled_by(Some("")));
        assert!(!disabled_by(Some("0")));
        assert!(disabled_by(Some("1")));
        assert!(disabled_by(Some("true")));
    }

    #[test]
    fn test_headless_runner() -> Result<(), PipelineError> {
        let mut task = FlagTask::default();
        GpuContextRunner::new(&HeadlessContextProvider).run(&mut task)?;
        assert!(task.started && task.waited);
        Ok(())
    }

    #[test]
    fn test_headless_context_owner() -> Result<(), PipelineError> {
        let context = HeadlessContextProvider.acquire()?;
        assert_eq!(context.owner(), std::thread::current().id());

        let owner = std::thread::spawn(|| {
            HeadlessContextProvider
                .acquire()
                .map(|context| context.owner())
        })
        .join()
        .expect("context thread panicked")?;
        assert_ne!(owner, context.owner());
        Ok(())
    }

    #[test]
    fn test_acquire_failure_skips_task() {
        let mut task = FlagTask::default();
        let res = GpuContextRunner::new(&FailingProvider).run(&mut task);
        assert!(matches!(res, Err(PipelineError::RenderContext(_))));
        assert!(!task.started && !task.waited);
    }
}
