//! [`RemoteRuntime`] for `wasm32` hosts: the ThorVG module runs on the JS side and is reached
//! through imported functions keyed by animation ID.

use crate::engine::remote::RemoteRuntime;

#[link(wasm_import_module = "thorvg")]
unsafe extern "C" {
    fn tvg_remote_init(threads: u32) -> i32;
    fn tvg_remote_term() -> i32;
    fn tvg_remote_is_ready() -> i32;
    fn tvg_remote_create(data: *const u8, len: u32) -> u32;
    fn tvg_remote_destroy(id: u32) -> i32;
    fn tvg_remote_get_size(id: u32, w: *mut f32, h: *mut f32) -> i32;
    fn tvg_remote_get_duration(id: u32, d: *mut f32) -> i32;
    fn tvg_remote_get_total_frame(id: u32, t: *mut f32) -> i32;
    fn tvg_remote_set_frame(id: u32, frame: f32) -> i32;
    fn tvg_remote_resize(id: u32, w: f32, h: f32) -> i32;
    fn tvg_remote_draw(id: u32) -> i32;
    fn tvg_remote_copy_pixels(id: u32, dst: *mut u32, w: u32, h: u32) -> i32;
}

/// Connection to the JS-side engine module.
#[derive(Debug, Default)]
pub struct WasmBridge {
    _priv: (),
}

impl RemoteRuntime for WasmBridge {
    fn init(&mut self, threads: u32) -> i32 {
        unsafe { tvg_remote_init(threads) }
    }

    fn term(&mut self) -> i32 {
        unsafe { tvg_remote_term() }
    }

    fn ready_state(&self) -> i32 {
        unsafe { tvg_remote_is_ready() }
    }

    fn create(&mut self, payload: &[u8]) -> u32 {
        let Ok(len) = u32::try_from(payload.len()) else {
            return 0;
        };
        unsafe { tvg_remote_create(payload.as_ptr(), len) }
    }

    fn destroy(&mut self, id: u32) -> i32 {
        unsafe { tvg_remote_destroy(id) }
    }

    fn size(&self, id: u32, width: &mut f32, height: &mut f32) -> i32 {
        unsafe { tvg_remote_get_size(id, width, height) }
    }

    fn duration(&self, id: u32, duration: &mut f32) -> i32 {
        unsafe { tvg_remote_get_duration(id, duration) }
    }

    fn total_frames(&self, id: u32, total: &mut f32) -> i32 {
        unsafe { tvg_remote_get_total_frame(id, total) }
    }

    fn set_frame(&mut self, id: u32, frame: f32) -> i32 {
        unsafe { tvg_remote_set_frame(id, frame) }
    }

    fn resize(&mut self, id: u32, width: f32, height: f32) -> i32 {
        unsafe { tvg_remote_resize(id, width, height) }
    }

    fn draw(&mut self, id: u32) -> i32 {
        unsafe { tvg_remote_draw(id) }
    }

    fn copy_pixels(&mut self, id: u32, dst: &mut [u32], width: u32, height: u32) -> i32 {
        if dst.len() < (width as usize) * (height as usize) {
            // TVG_RESULT_INVALID_ARGUMENT
            return 1;
        }
        unsafe { tvg_remote_copy_pixels(id, dst.as_mut_ptr(), width, height) }
    }
}
