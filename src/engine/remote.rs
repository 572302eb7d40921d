//! Backend for engines living in a sandboxed runtime.
//!
//! All canvas/animation/picture state stays on the runtime side, named by one integer ID.
//! The runtime loads asynchronously relative to process start, so callers poll
//! [`Engine::is_ready`] before issuing anything else. Pixels are copied out by ID into the
//! buffer bound with [`Engine::bind_target`].

use std::collections::HashMap;

use crate::engine::{AnimId, Engine, EngineHandle, RenderTarget};
use crate::foundation::error::{ErrorCategory, TvgError, TvgResult, check};

/// Integer-handle RPC surface of a sandboxed engine runtime.
///
/// Methods mirror the runtime's exported functions: results are raw engine result codes,
/// values come back through `&mut` out-parameters.
pub trait RemoteRuntime: Send + 'static {
    /// Initialize the engine inside the runtime.
    fn init(&mut self, threads: u32) -> i32;
    /// Tear the engine down.
    fn term(&mut self) -> i32;
    /// Load state: negative when loading failed, zero while loading, positive when ready.
    fn ready_state(&self) -> i32;
    /// Create an animation from `payload`. Returns 0 on failure.
    fn create(&mut self, payload: &[u8]) -> u32;
    /// Destroy all state behind `id`.
    fn destroy(&mut self, id: u32) -> i32;
    /// Natural size.
    fn size(&self, id: u32, width: &mut f32, height: &mut f32) -> i32;
    /// Duration in seconds.
    fn duration(&self, id: u32, duration: &mut f32) -> i32;
    /// Total frame count.
    fn total_frames(&self, id: u32, total: &mut f32) -> i32;
    /// Position playback.
    fn set_frame(&mut self, id: u32, frame: f32) -> i32;
    /// Set the rasterization size. Negative height means bottom-up rows.
    fn resize(&mut self, id: u32, width: f32, height: f32) -> i32;
    /// Rasterize the current frame into the runtime-side buffer.
    fn draw(&mut self, id: u32) -> i32;
    /// Copy the last rasterized frame into `dst` (`width * height` ABGR8888 pixels).
    fn copy_pixels(&mut self, id: u32, dst: &mut [u32], width: u32, height: u32) -> i32;
}

/// [`Engine`] over a [`RemoteRuntime`], using [`AnimId`] handles.
pub struct RemoteEngine<R> {
    runtime: R,
    targets: HashMap<AnimId, RenderTarget>,
}

impl<R: RemoteRuntime> RemoteEngine<R> {
    /// Wrap a runtime connection.
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            targets: HashMap::new(),
        }
    }

    /// Borrow the underlying runtime.
    pub fn runtime(&self) -> &R {
        &self.runtime
    }
}

impl<R: RemoteRuntime + Default> Default for RemoteEngine<R> {
    fn default() -> Self {
        Self::new(R::default())
    }
}

impl<R: RemoteRuntime> Engine for RemoteEngine<R> {
    type Handle = AnimId;

    fn name(&self) -> &'static str {
        "remote"
    }

    fn init(&mut self, threads: u32) -> TvgResult<()> {
        check(self.runtime.init(threads), "Engine Init")
    }

    fn terminate(&mut self) -> TvgResult<()> {
        self.targets.clear();
        check(self.runtime.term(), "Engine Term")
    }

    fn is_ready(&self) -> TvgResult<bool> {
        let state = self.runtime.ready_state();
        if state < 0 {
            return Err(TvgError::lifecycle(format!(
                "remote engine runtime failed to load (state {state})"
            )));
        }
        Ok(state > 0)
    }

    fn create_animation(&mut self, payload: &[u8]) -> TvgResult<AnimId> {
        match self.runtime.create(payload) {
            0 => Err(TvgError::creation("remote runtime rejected the payload")),
            id => Ok(AnimId(id)),
        }
    }

    fn destroy_animation(&mut self, handle: AnimId) -> TvgResult<()> {
        if handle.is_null() {
            return Ok(());
        }
        self.targets.remove(&handle);
        check(self.runtime.destroy(handle.0), "Animation Destroy")
    }

    fn size(&self, handle: AnimId) -> TvgResult<(f32, f32)> {
        let (mut w, mut h) = (0.0, 0.0);
        check(self.runtime.size(handle.0, &mut w, &mut h), "Get Size")?;
        Ok((w, h))
    }

    fn duration(&self, handle: AnimId) -> TvgResult<f32> {
        let mut d = 0.0;
        check(self.runtime.duration(handle.0, &mut d), "Get Duration")?;
        Ok(d)
    }

    fn total_frames(&self, handle: AnimId) -> TvgResult<f32> {
        let mut t = 0.0;
        check(
            self.runtime.total_frames(handle.0, &mut t),
            "Get Total Frame",
        )?;
        Ok(t)
    }

    fn set_frame(&mut self, handle: AnimId, frame: f32) -> TvgResult<()> {
        check(self.runtime.set_frame(handle.0, frame), "Set Frame")
    }

    fn resize(&mut self, handle: AnimId, width: f32, height: f32) -> TvgResult<()> {
        check(self.runtime.resize(handle.0, width, height), "Resize")
    }

    unsafe fn bind_target(&mut self, handle: AnimId, target: RenderTarget) -> TvgResult<()> {
        if handle.is_null() {
            return Err(TvgError::engine(
                "Set Target",
                ErrorCategory::InvalidArguments,
            ));
        }
        self.targets.insert(handle, target);
        Ok(())
    }

    fn draw(&mut self, handle: AnimId) -> TvgResult<()> {
        let target = *self.targets.get(&handle).ok_or_else(|| {
            TvgError::engine("Draw", ErrorCategory::PreconditionNotMet)
        })?;
        check(self.runtime.draw(handle.0), "Draw")?;
        let size = target.size();
        // SAFETY: bind_target's contract keeps the memory valid and unaliased while bound.
        let dst = unsafe { target.pixels_mut() };
        check(
            self.runtime
                .copy_pixels(handle.0, dst, size.width, size.height),
            "Copy Pixels",
        )
    }
}
