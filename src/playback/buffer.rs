use std::ptr::NonNull;

use crate::engine::RenderTarget;
use crate::foundation::core::PixelSize;

/// Heap pixel buffer with a fixed address for its whole lifetime.
///
/// The allocation is never moved or resized; a new size means a new buffer. Dropping the
/// buffer frees ("unpins") the memory, so it must be unbound from the engine first.
pub struct PinnedBuffer {
    ptr: NonNull<u32>,
    len: usize,
    size: PixelSize,
}

// The buffer exclusively owns its allocation.
unsafe impl Send for PinnedBuffer {}

impl PinnedBuffer {
    /// Allocate a zeroed buffer of `size.pixel_count()` pixels.
    pub fn new(size: PixelSize) -> Self {
        let pixels: Box<[u32]> = vec![0u32; size.pixel_count()].into_boxed_slice();
        let len = pixels.len();
        let raw = Box::into_raw(pixels).cast::<u32>();
        // SAFETY: Box::into_raw never returns null.
        let ptr = unsafe { NonNull::new_unchecked(raw) };
        Self { ptr, len, size }
    }

    /// Buffer dimensions.
    pub fn size(&self) -> PixelSize {
        self.size
    }

    /// Stable address of the first pixel.
    pub fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Describe this buffer as a render target.
    ///
    /// The target stays valid until this buffer is dropped.
    pub fn target(&mut self) -> RenderTarget {
        // SAFETY: `ptr` is valid for `len == size.pixel_count()` pixels until drop.
        unsafe { RenderTarget::new(self.ptr, self.size) }
    }

    /// Read the pixels.
    pub fn pixels(&self) -> &[u32] {
        // SAFETY: the allocation is live and was initialized in `new`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for PinnedBuffer {
    fn drop(&mut self) {
        let slice = std::ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len);
        // SAFETY: reconstructs the Box leaked in `new`, exactly once.
        drop(unsafe { Box::from_raw(slice) });
    }
}

impl std::fmt::Debug for PinnedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinnedBuffer")
            .field("width", &self.size.width)
            .field("height", &self.size.height)
            .field("addr", &format_args!("{:#x}", self.addr()))
            .finish()
    }
}
