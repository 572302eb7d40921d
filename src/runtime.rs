//! Process-scoped engine lifecycle.
//!
//! A [`Runtime`] owns one engine and its init/term window. Animations hold a clone of their
//! runtime, so their lifetimes always nest inside that window: the engine is terminated when
//! the last clone is dropped, or earlier through [`Runtime::term`] once no animation is alive.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::engine::{DefaultEngine, Engine};
use crate::foundation::core::RowOrder;
use crate::foundation::error::{TvgError, TvgResult};

/// Runtime configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RuntimeOpts {
    /// Engine worker threads. `0` lets the engine decide.
    pub threads: u32,
    /// Row order of rendered buffers.
    pub row_order: RowOrder,
}

impl RuntimeOpts {
    /// Return options with a configured worker thread count.
    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = threads;
        self
    }

    /// Return options with a configured row order.
    pub fn with_row_order(mut self, row_order: RowOrder) -> Self {
        self.row_order = row_order;
        self
    }

    /// Defaults overlaid with `TVG_THREADS` and `TVG_ROW_ORDER` from the environment.
    pub fn from_env() -> Self {
        Self::default().overlay(
            std::env::var("TVG_THREADS").ok().as_deref(),
            std::env::var("TVG_ROW_ORDER").ok().as_deref(),
        )
    }

    fn overlay(mut self, threads: Option<&str>, row_order: Option<&str>) -> Self {
        if let Some(v) = threads {
            match v.trim().parse::<u32>() {
                Ok(n) => self.threads = n,
                Err(_) => tracing::warn!(value = v, "ignoring unparsable TVG_THREADS"),
            }
        }
        if let Some(v) = row_order {
            match RowOrder::parse(v) {
                Some(order) => self.row_order = order,
                None => tracing::warn!(value = v, "ignoring unparsable TVG_ROW_ORDER"),
            }
        }
        self
    }
}

/// Lifecycle state of a runtime's engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// `init` has not run, or `term` has run since.
    Uninitialized,
    /// The engine accepts calls (once ready).
    Initialized,
}

struct Shared<E: Engine> {
    engine: Mutex<E>,
    state: Mutex<LifecycleState>,
    live: AtomicUsize,
    opts: RuntimeOpts,
}

impl<E: Engine> Drop for Shared<E> {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if *state != LifecycleState::Initialized {
            return;
        }
        let engine = self
            .engine
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        match engine.terminate() {
            Ok(()) => tracing::debug!(engine = engine.name(), "engine terminated at teardown"),
            Err(e) => tracing::warn!(engine = engine.name(), error = %e, "engine teardown failed"),
        }
        *state = LifecycleState::Uninitialized;
    }
}

/// Shared handle to one engine and its lifecycle. Cloning is cheap.
pub struct Runtime<E: Engine = DefaultEngine> {
    shared: Arc<Shared<E>>,
}

impl<E: Engine> Clone for Runtime<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E: Engine + Default> Default for Runtime<E> {
    fn default() -> Self {
        Self::new(E::default(), RuntimeOpts::default())
    }
}

impl<E: Engine> Runtime<E> {
    /// Wrap `engine`. Nothing is initialized until [`Runtime::init`].
    pub fn new(engine: E, opts: RuntimeOpts) -> Self {
        Self {
            shared: Arc::new(Shared {
                engine: Mutex::new(engine),
                state: Mutex::new(LifecycleState::Uninitialized),
                live: AtomicUsize::new(0),
                opts,
            }),
        }
    }

    /// Runtime configuration.
    pub fn opts(&self) -> &RuntimeOpts {
        &self.shared.opts
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.lock_state()
    }

    /// `true` after a successful [`Runtime::init`] and before [`Runtime::term`].
    pub fn is_initialized(&self) -> bool {
        self.state() == LifecycleState::Initialized
    }

    /// Initialize the engine. Repeated calls are no-ops.
    pub fn init(&self) -> TvgResult<()> {
        let mut state = self.lock_state();
        if *state == LifecycleState::Initialized {
            return Ok(());
        }
        let threads = self.shared.opts.threads;
        self.with_engine(|e| {
            e.init(threads)?;
            tracing::info!(engine = e.name(), threads, "engine initialized");
            Ok::<_, TvgError>(())
        })?;
        *state = LifecycleState::Initialized;
        Ok(())
    }

    /// Terminate the engine. No-op when not initialized; rejected while animations are alive.
    pub fn term(&self) -> TvgResult<()> {
        let mut state = self.lock_state();
        if *state != LifecycleState::Initialized {
            return Ok(());
        }
        let live = self.live_animations();
        if live > 0 {
            return Err(TvgError::lifecycle(format!(
                "cannot terminate engine with {live} live animation(s)"
            )));
        }
        // The state flips even if the engine reports a failure: a second terminate would be
        // worse than a leaked engine.
        *state = LifecycleState::Uninitialized;
        self.with_engine(|e| {
            tracing::info!(engine = e.name(), "engine terminating");
            e.terminate()
        })
    }

    /// `false` when uninitialized; otherwise the engine's own readiness.
    ///
    /// Remote engines load asynchronously; hosts poll this (e.g. once per tick) and create
    /// animations only after it returns `true`.
    pub fn is_ready(&self) -> TvgResult<bool> {
        if !self.is_initialized() {
            return Ok(false);
        }
        self.with_engine(|e| e.is_ready())
    }

    /// Number of animations currently holding engine resources.
    pub fn live_animations(&self) -> usize {
        self.shared.live.load(Ordering::Acquire)
    }

    /// Run `f` with exclusive access to the engine.
    pub(crate) fn with_engine<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        let mut engine = self
            .shared
            .engine
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut engine)
    }

    /// Create an animation with `create` and count it as live, all inside the init/term window.
    ///
    /// The lifecycle lock is held throughout, so a concurrent [`Runtime::term`] either runs
    /// before (and this fails) or sees the new animation and refuses.
    pub(crate) fn create_registered<H>(
        &self,
        create: impl FnOnce(&mut E) -> TvgResult<H>,
    ) -> TvgResult<H> {
        let state = self.lock_state();
        if *state != LifecycleState::Initialized {
            return Err(TvgError::lifecycle("engine is not initialized"));
        }
        let handle = self.with_engine(|e| {
            if !e.is_ready()? {
                return Err(TvgError::lifecycle("engine runtime is not ready yet"));
            }
            create(e)
        })?;
        self.shared.live.fetch_add(1, Ordering::AcqRel);
        drop(state);
        Ok(handle)
    }

    pub(crate) fn unregister_animation(&self) {
        self.shared.live.fetch_sub(1, Ordering::AcqRel);
    }

    fn lock_state(&self) -> MutexGuard<'_, LifecycleState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
