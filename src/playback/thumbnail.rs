//! One-shot rendering of a payload into a detached texture.

use crate::engine::Engine;
use crate::foundation::core::PixelSize;
use crate::foundation::error::{TvgError, TvgResult};
use crate::playback::animation::Animation;
use crate::playback::texture::CpuTexture;
use crate::runtime::Runtime;

const PLACEHOLDER_GREY: [u8; 4] = [128, 128, 128, 255];

/// Render the first frame of `payload`, scaled by `scale`, into a standalone texture.
///
/// The temporary animation is disposed before returning.
pub fn render_thumbnail<E: Engine>(
    runtime: &Runtime<E>,
    payload: &[u8],
    scale: f32,
) -> TvgResult<CpuTexture> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(TvgError::validation(format!(
            "thumbnail scale must be positive, got {scale}"
        )));
    }
    let mut anim: Animation<E, CpuTexture> = Animation::new(runtime, payload)?;
    let result = render_scaled(&mut anim, scale);
    let disposed = anim.dispose();
    let texture = result?;
    disposed?;
    Ok(texture)
}

fn render_scaled<E: Engine>(
    anim: &mut Animation<E, CpuTexture>,
    scale: f32,
) -> TvgResult<CpuTexture> {
    if (scale - 1.0).abs() > 1e-6 {
        let natural = anim.info().natural;
        let w = (natural.width as f32 * scale).round().max(1.0) as u32;
        let h = (natural.height as f32 * scale).round().max(1.0) as u32;
        anim.resize(w, h)?;
    }
    Ok(anim.materialize()?.clone())
}

/// Like [`render_thumbnail`], but falls back to a 2×2 grey placeholder on failure.
pub fn render_thumbnail_or_placeholder<E: Engine>(
    runtime: &Runtime<E>,
    payload: &[u8],
    scale: f32,
) -> CpuTexture {
    match render_thumbnail(runtime, payload, scale) {
        Ok(texture) => texture,
        Err(e) => {
            tracing::warn!(error = %e, "thumbnail render failed; using placeholder");
            CpuTexture::filled(
                PixelSize {
                    width: 2,
                    height: 2,
                },
                PLACEHOLDER_GREY,
            )
        }
    }
}
