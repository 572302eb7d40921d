//! In-process backend calling the ThorVG C API.
//!
//! Each animation is a triple of native objects: a software canvas (render target), an
//! animation object, and the picture owned by that animation. The picture is pushed onto the
//! canvas; the canvas never owns the animation, so teardown releases the animation first and
//! the canvas second.

use std::ffi::c_char;
use std::ptr;

use crate::engine::{Engine, EngineHandle, RenderTarget};
use crate::foundation::error::{ResultCode, TvgError, TvgResult, check};

mod sys {
    use std::ffi::{c_char, c_int};

    pub type TvgCanvas = *mut std::ffi::c_void;
    pub type TvgAnimation = *mut std::ffi::c_void;
    pub type TvgPaint = *mut std::ffi::c_void;

    /// `TVG_COLORSPACE_ABGR8888`
    pub const COLORSPACE_ABGR8888: c_int = 0;
    /// `TVG_ENGINE_OPTION_NONE`
    pub const ENGINE_OPTION_NONE: c_int = 0;

    #[link(name = "thorvg")]
    unsafe extern "C" {
        pub fn tvg_engine_init(threads: u32) -> c_int;
        pub fn tvg_engine_term() -> c_int;

        pub fn tvg_swcanvas_create(option: c_int) -> TvgCanvas;
        pub fn tvg_swcanvas_set_target(
            canvas: TvgCanvas,
            buffer: *mut u32,
            stride: u32,
            w: u32,
            h: u32,
            colorspace: c_int,
        ) -> c_int;
        pub fn tvg_canvas_destroy(canvas: TvgCanvas) -> c_int;
        pub fn tvg_canvas_push(canvas: TvgCanvas, paint: TvgPaint) -> c_int;
        pub fn tvg_canvas_update(canvas: TvgCanvas) -> c_int;
        pub fn tvg_canvas_draw(canvas: TvgCanvas, clear: bool) -> c_int;
        pub fn tvg_canvas_sync(canvas: TvgCanvas) -> c_int;

        pub fn tvg_animation_new() -> TvgAnimation;
        pub fn tvg_animation_del(animation: TvgAnimation) -> c_int;
        pub fn tvg_animation_get_picture(animation: TvgAnimation) -> TvgPaint;
        pub fn tvg_animation_set_frame(animation: TvgAnimation, frame: f32) -> c_int;
        pub fn tvg_animation_get_total_frame(animation: TvgAnimation, total: *mut f32) -> c_int;
        pub fn tvg_animation_get_duration(animation: TvgAnimation, duration: *mut f32) -> c_int;

        pub fn tvg_picture_load_data(
            picture: TvgPaint,
            data: *const c_char,
            size: u32,
            mimetype: *const c_char,
            rpath: *const c_char,
            copy: bool,
        ) -> c_int;
        pub fn tvg_picture_set_size(picture: TvgPaint, w: f32, h: f32) -> c_int;
        pub fn tvg_picture_get_size(picture: TvgPaint, w: *mut f32, h: *mut f32) -> c_int;
        pub fn tvg_picture_set_origin(picture: TvgPaint, x: f32, y: f32) -> c_int;
    }
}

/// Triple-handle form: canvas, animation and the animation's picture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NativeHandle {
    canvas: sys::TvgCanvas,
    animation: sys::TvgAnimation,
    picture: sys::TvgPaint,
}

// Native objects are plain heap objects without thread affinity. The runtime serializes
// calls, and a handle is driven by a single owner.
unsafe impl Send for NativeHandle {}

impl EngineHandle for NativeHandle {
    const NULL: Self = NativeHandle {
        canvas: ptr::null_mut(),
        animation: ptr::null_mut(),
        picture: ptr::null_mut(),
    };

    fn is_null(&self) -> bool {
        self.canvas.is_null() && self.animation.is_null()
    }
}

/// ThorVG called directly through FFI.
#[derive(Debug, Default)]
pub struct NativeEngine {
    _priv: (),
}

impl NativeEngine {
    /// Create the binding. The library is initialized by [`Engine::init`].
    pub fn new() -> Self {
        Self::default()
    }

    fn release(handle: NativeHandle) -> TvgResult<()> {
        let mut first_err = None;
        if !handle.animation.is_null() {
            // Also frees the picture.
            if let Err(e) = check(
                unsafe { sys::tvg_animation_del(handle.animation) },
                "Animation Del",
            ) {
                first_err.get_or_insert(e);
            }
        }
        if !handle.canvas.is_null() {
            if let Err(e) = check(
                unsafe { sys::tvg_canvas_destroy(handle.canvas) },
                "Canvas Destroy",
            ) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn load(handle: NativeHandle, payload: &[u8]) -> TvgResult<()> {
        let len = u32::try_from(payload.len())
            .map_err(|_| TvgError::creation("payload larger than 4 GiB"))?;
        let empty = c"".as_ptr();
        // `copy = true`: the engine keeps its own copy of the payload.
        check(
            unsafe {
                sys::tvg_picture_load_data(
                    handle.picture,
                    payload.as_ptr().cast::<c_char>(),
                    len,
                    empty,
                    empty,
                    true,
                )
            },
            "Picture Load",
        )?;
        check(
            unsafe { sys::tvg_canvas_push(handle.canvas, handle.picture) },
            "Canvas Push",
        )
    }
}

impl Engine for NativeEngine {
    type Handle = NativeHandle;

    fn name(&self) -> &'static str {
        "thorvg"
    }

    fn init(&mut self, threads: u32) -> TvgResult<()> {
        check(unsafe { sys::tvg_engine_init(threads) }, "Engine Init")
    }

    fn terminate(&mut self) -> TvgResult<()> {
        check(unsafe { sys::tvg_engine_term() }, "Engine Term")
    }

    fn create_animation(&mut self, payload: &[u8]) -> TvgResult<NativeHandle> {
        let canvas = unsafe { sys::tvg_swcanvas_create(sys::ENGINE_OPTION_NONE) };
        if canvas.is_null() {
            return Err(TvgError::creation("failed to allocate canvas"));
        }
        let animation = unsafe { sys::tvg_animation_new() };
        if animation.is_null() {
            let _ = Self::release(NativeHandle {
                canvas,
                ..NativeHandle::NULL
            });
            return Err(TvgError::creation("failed to allocate animation"));
        }
        let handle = NativeHandle {
            canvas,
            animation,
            picture: unsafe { sys::tvg_animation_get_picture(animation) },
        };
        if handle.picture.is_null() {
            let _ = Self::release(handle);
            return Err(TvgError::creation("animation has no picture"));
        }

        if let Err(e) = Self::load(handle, payload) {
            let _ = Self::release(handle);
            return Err(TvgError::creation(format!("payload rejected: {e}")));
        }
        Ok(handle)
    }

    fn destroy_animation(&mut self, handle: NativeHandle) -> TvgResult<()> {
        Self::release(handle)
    }

    fn size(&self, handle: NativeHandle) -> TvgResult<(f32, f32)> {
        let (mut w, mut h) = (0.0f32, 0.0f32);
        check(
            unsafe { sys::tvg_picture_get_size(handle.picture, &mut w, &mut h) },
            "Picture Get Size",
        )?;
        Ok((w, h))
    }

    fn duration(&self, handle: NativeHandle) -> TvgResult<f32> {
        let mut d = 0.0f32;
        check(
            unsafe { sys::tvg_animation_get_duration(handle.animation, &mut d) },
            "Animation Get Duration",
        )?;
        Ok(d)
    }

    fn total_frames(&self, handle: NativeHandle) -> TvgResult<f32> {
        let mut t = 0.0f32;
        check(
            unsafe { sys::tvg_animation_get_total_frame(handle.animation, &mut t) },
            "Animation Get Total Frame",
        )?;
        Ok(t)
    }

    fn set_frame(&mut self, handle: NativeHandle, frame: f32) -> TvgResult<()> {
        let code = unsafe { sys::tvg_animation_set_frame(handle.animation, frame) };
        // ThorVG reports an unchanged frame as an insufficient condition.
        if ResultCode::from_raw(code) == ResultCode::InsufficientCondition {
            return Ok(());
        }
        check(code, "Animation Set Frame")
    }

    fn resize(&mut self, handle: NativeHandle, width: f32, height: f32) -> TvgResult<()> {
        // A negative height mirrors the picture around its origin, so the origin moves to the
        // bottom edge to keep the content inside the target.
        let origin_y = if height < 0.0 { 1.0 } else { 0.0 };
        check(
            unsafe { sys::tvg_picture_set_origin(handle.picture, 0.0, origin_y) },
            "Picture Set Origin",
        )?;
        check(
            unsafe { sys::tvg_picture_set_size(handle.picture, width, height) },
            "Picture Set Size",
        )
    }

    unsafe fn bind_target(&mut self, handle: NativeHandle, target: RenderTarget) -> TvgResult<()> {
        let size = target.size();
        check(
            unsafe {
                sys::tvg_swcanvas_set_target(
                    handle.canvas,
                    target.as_ptr(),
                    target.stride(),
                    size.width,
                    size.height,
                    sys::COLORSPACE_ABGR8888,
                )
            },
            "Canvas Set Target",
        )?;
        check(unsafe { sys::tvg_canvas_sync(handle.canvas) }, "Canvas Sync")
    }

    fn draw(&mut self, handle: NativeHandle) -> TvgResult<()> {
        check(unsafe { sys::tvg_canvas_update(handle.canvas) }, "Canvas Update")?;
        check(
            unsafe { sys::tvg_canvas_draw(handle.canvas, true) },
            "Canvas Draw",
        )?;
        check(unsafe { sys::tvg_canvas_sync(handle.canvas) }, "Canvas Sync")
    }
}
