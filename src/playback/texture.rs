use crate::foundation::core::PixelSize;
use crate::foundation::error::{TvgError, TvgResult};

/// Host-side image fed from an animation's pixel buffer.
///
/// The host's resource system owns the texture. [`Texture::release`] may touch UI resources and
/// is only ever invoked on the thread that created the animation.
pub trait Texture {
    /// Reallocate storage for `size`. Previous contents are discarded.
    fn reinitialize(&mut self, size: PixelSize) -> TvgResult<()>;

    /// Replace the contents with `pixels` (ABGR8888, row-major, stride = width).
    fn upload(&mut self, pixels: &[u32]) -> TvgResult<()>;

    /// Current storage size.
    fn size(&self) -> PixelSize;

    /// Free host resources. Called at most once, from the owning thread.
    fn release(&mut self) {}
}

/// RGBA8 premultiplied texture kept in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuTexture {
    size: PixelSize,
    data: Vec<u8>,
    uploads: u64,
    released: bool,
}

impl CpuTexture {
    /// Create a transparent texture of `size`.
    pub fn new(size: PixelSize) -> Self {
        Self {
            size,
            data: vec![0; size.pixel_count() * 4],
            uploads: 0,
            released: false,
        }
    }

    /// Create a texture filled with one RGBA8 color.
    pub fn filled(size: PixelSize, rgba: [u8; 4]) -> Self {
        let mut t = Self::new(size);
        for px in t.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        t
    }

    /// Texture width in pixels.
    pub fn width(&self) -> u32 {
        self.size.width
    }

    /// Texture height in pixels.
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// RGBA8 premultiplied bytes, tightly packed, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// RGBA8 bytes of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let i = ((y as usize) * (self.size.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Number of uploads since creation.
    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    /// Whether [`Texture::release`] has run.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Convert to a straight-alpha image, e.g. for PNG encoding.
    pub fn to_rgba_image(&self) -> TvgResult<image::RgbaImage> {
        let mut straight = self.data.clone();
        unpremultiply_rgba8_in_place(&mut straight);
        image::RgbaImage::from_raw(self.size.width, self.size.height, straight)
            .ok_or_else(|| TvgError::validation("texture data does not match its size"))
    }
}

impl Texture for CpuTexture {
    fn reinitialize(&mut self, size: PixelSize) -> TvgResult<()> {
        self.size = size;
        self.data.clear();
        self.data.resize(size.pixel_count() * 4, 0);
        Ok(())
    }

    fn upload(&mut self, pixels: &[u32]) -> TvgResult<()> {
        if pixels.len() != self.size.pixel_count() {
            return Err(TvgError::validation(format!(
                "upload of {} pixels into {}x{} texture",
                pixels.len(),
                self.size.width,
                self.size.height
            )));
        }
        // ABGR8888 little-endian is byte-for-byte RGBA8.
        for (dst, px) in self.data.chunks_exact_mut(4).zip(pixels) {
            dst.copy_from_slice(&px.to_le_bytes());
        }
        self.uploads += 1;
        Ok(())
    }

    fn size(&self) -> PixelSize {
        self.size
    }

    fn release(&mut self) {
        self.data = Vec::new();
        self.released = true;
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_reinterprets_abgr_as_rgba_bytes() {
        let mut t = CpuTexture::new(PixelSize::new(2, 1).unwrap());
        let red = u32::from_le_bytes([255, 0, 0, 255]);
        let clear = 0;
        t.upload(&[red, clear]).unwrap();
        assert_eq!(t.data(), &[255, 0, 0, 255, 0, 0, 0, 0]);
        assert_eq!(t.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(t.pixel(2, 0), None);
        assert_eq!(t.uploads(), 1);
    }

    #[test]
    fn upload_size_mismatch_is_rejected() {
        let mut t = CpuTexture::new(PixelSize::new(2, 2).unwrap());
        assert!(t.upload(&[0; 3]).is_err());
        t.reinitialize(PixelSize::new(1, 3).unwrap()).unwrap();
        t.upload(&[0; 3]).unwrap();
        assert_eq!(t.data().len(), 12);
    }

    #[test]
    fn rgba_image_is_straight_alpha() {
        let mut t = CpuTexture::new(PixelSize::new(1, 1).unwrap());
        t.upload(&[u32::from_le_bytes([64, 0, 0, 128])]).unwrap();
        let img = t.to_rgba_image().unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [128, 0, 0, 128]);
    }

    #[test]
    fn release_drops_storage() {
        let mut t = CpuTexture::filled(PixelSize::new(2, 2).unwrap(), [1, 2, 3, 4]);
        assert_eq!(t.pixel(1, 1), Some([1, 2, 3, 4]));
        t.release();
        assert!(t.is_released());
        assert!(t.data().is_empty());
    }
}
