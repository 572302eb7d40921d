//! Engine bindings.
//!
//! [`Engine`] is the narrow call surface the playback core needs from a vector-graphics engine.
//! Every backend reproduces it identically; which one a build uses is decided at compile time
//! through [`DefaultEngine`]:
//!
//! - feature `thorvg`: [`native::NativeEngine`], direct calls into the ThorVG C library.
//! - `wasm32` targets: [`remote::RemoteEngine`] over [`wasm::WasmBridge`], a sandboxed runtime
//!   reached by integer animation IDs.
//! - otherwise: [`software::SoftwareEngine`], in-process SVG rasterization with `resvg`.

use std::fmt;
use std::ptr::NonNull;

use crate::foundation::core::PixelSize;
use crate::foundation::error::TvgResult;

#[cfg(feature = "thorvg")]
pub mod native;
pub mod remote;
pub mod software;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

/// Engine selected for this build.
#[cfg(feature = "thorvg")]
pub type DefaultEngine = native::NativeEngine;
/// Engine selected for this build.
#[cfg(all(not(feature = "thorvg"), target_arch = "wasm32"))]
pub type DefaultEngine = remote::RemoteEngine<wasm::WasmBridge>;
/// Engine selected for this build.
#[cfg(all(not(feature = "thorvg"), not(target_arch = "wasm32")))]
pub type DefaultEngine = software::SoftwareEngine;

/// Opaque identity of one loaded resource group inside an engine.
pub trait EngineHandle: Copy + Eq + fmt::Debug + Send + 'static {
    /// The "not created" handle. Destroying it is a no-op.
    const NULL: Self;

    /// `true` for [`EngineHandle::NULL`].
    fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

/// Single-ID handle form: one integer naming all engine-side state of an animation.
///
/// `AnimId(0)` is the null handle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AnimId(pub u32);

impl EngineHandle for AnimId {
    const NULL: Self = AnimId(0);
}

/// A caller-owned pixel region bound as render destination.
///
/// Layout is fixed: packed ABGR8888 `u32` pixels (bytes R, G, B, A in memory, premultiplied),
/// row-major, stride equal to width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTarget {
    ptr: NonNull<u32>,
    size: PixelSize,
}

// The target is only an address; the bind_target contract makes the caller responsible for
// keeping the memory alive and unaliased while it is bound.
unsafe impl Send for RenderTarget {}

impl RenderTarget {
    /// Describe `size.pixel_count()` pixels starting at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `size.pixel_count()` `u32`s for as long as
    /// the target stays bound to an engine handle.
    pub unsafe fn new(ptr: NonNull<u32>, size: PixelSize) -> Self {
        Self { ptr, size }
    }

    /// First pixel address.
    pub fn as_ptr(&self) -> *mut u32 {
        self.ptr.as_ptr()
    }

    /// Target dimensions.
    pub fn size(&self) -> PixelSize {
        self.size
    }

    /// Stride in pixels. Always equal to the width.
    pub fn stride(&self) -> u32 {
        self.size.width
    }

    /// View the bound memory as a mutable slice.
    ///
    /// # Safety
    ///
    /// The memory must still satisfy the contract of [`RenderTarget::new`] and no other
    /// reference to it may be live.
    pub(crate) unsafe fn pixels_mut<'a>(self) -> &'a mut [u32] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.size.pixel_count()) }
    }
}

/// Call surface of a vector-graphics engine.
///
/// Calls for one handle come from one logical owner; the runtime serializes all calls into
/// an engine. Values are in engine units: sizes and frames are `f32`.
pub trait Engine: Send + 'static {
    /// Handle form used by this backend.
    type Handle: EngineHandle;

    /// Short backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Process-wide initialization. `threads = 0` lets the engine decide.
    fn init(&mut self, threads: u32) -> TvgResult<()>;

    /// Process-wide teardown.
    fn terminate(&mut self) -> TvgResult<()>;

    /// Whether the engine accepts calls. In-process engines are ready once initialized.
    fn is_ready(&self) -> TvgResult<bool> {
        Ok(true)
    }

    /// Create render target and animation objects and load `payload` into them.
    ///
    /// The payload format is detected from content.
    fn create_animation(&mut self, payload: &[u8]) -> TvgResult<Self::Handle>;

    /// Release every resource behind `handle`. No-op for [`EngineHandle::NULL`].
    fn destroy_animation(&mut self, handle: Self::Handle) -> TvgResult<()>;

    /// Natural (intrinsic) size.
    fn size(&self, handle: Self::Handle) -> TvgResult<(f32, f32)>;

    /// Duration in seconds.
    fn duration(&self, handle: Self::Handle) -> TvgResult<f32>;

    /// Total frame count; may be fractional.
    fn total_frames(&self, handle: Self::Handle) -> TvgResult<f32>;

    /// Position playback. `frame` must already be wrapped into `[0, total_frames)`.
    fn set_frame(&mut self, handle: Self::Handle, frame: f32) -> TvgResult<()>;

    /// Set the rasterization size. A negative `height` requests bottom-up rows.
    fn resize(&mut self, handle: Self::Handle, width: f32, height: f32) -> TvgResult<()>;

    /// Bind `target` as the render destination of `handle`.
    ///
    /// # Safety
    ///
    /// The memory behind `target` must stay valid and must not be accessed by anyone else
    /// during [`Engine::draw`] until the handle is rebound or destroyed.
    unsafe fn bind_target(&mut self, handle: Self::Handle, target: RenderTarget) -> TvgResult<()>;

    /// Update, clear, rasterize and sync the bound target.
    fn draw(&mut self, handle: Self::Handle) -> TvgResult<()>;
}
