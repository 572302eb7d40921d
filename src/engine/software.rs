//! In-process pure-Rust backend: SVG rasterization with `usvg`/`resvg`.
//!
//! SVG content is static, so every animation reports zero frames and zero duration. Lottie
//! payloads are recognized and rejected as unsupported.

use std::sync::Arc;

use resvg::tiny_skia;

use crate::engine::{AnimId, Engine, EngineHandle, RenderTarget};
use crate::foundation::core::PayloadKind;
use crate::foundation::error::{ErrorCategory, TvgError, TvgResult};

struct Scene {
    tree: Arc<usvg::Tree>,
    /// Picture size set by `resize`; `None` renders at natural size.
    picture: Option<(f32, f32)>,
    flip_rows: bool,
    target: Option<RenderTarget>,
}

/// SVG-only engine backed by `resvg`.
///
/// Handles are slot indices offset by one so that `AnimId(0)` stays the null handle.
#[derive(Default)]
pub struct SoftwareEngine {
    slots: Vec<Option<Scene>>,
    free: Vec<usize>,
}

impl SoftwareEngine {
    /// Create an engine with default `usvg` parsing options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live animations.
    pub fn live_animations(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn scene(&self, handle: AnimId, op: &'static str) -> TvgResult<&Scene> {
        handle
            .0
            .checked_sub(1)
            .and_then(|i| self.slots.get(i as usize))
            .and_then(Option::as_ref)
            .ok_or_else(|| TvgError::engine(op, ErrorCategory::InvalidArguments))
    }

    fn scene_mut(&mut self, handle: AnimId, op: &'static str) -> TvgResult<&mut Scene> {
        handle
            .0
            .checked_sub(1)
            .and_then(|i| self.slots.get_mut(i as usize))
            .and_then(Option::as_mut)
            .ok_or_else(|| TvgError::engine(op, ErrorCategory::InvalidArguments))
    }
}

impl Engine for SoftwareEngine {
    type Handle = AnimId;

    fn name(&self) -> &'static str {
        "software"
    }

    fn init(&mut self, _threads: u32) -> TvgResult<()> {
        Ok(())
    }

    fn terminate(&mut self) -> TvgResult<()> {
        self.slots.clear();
        self.free.clear();
        Ok(())
    }

    fn create_animation(&mut self, payload: &[u8]) -> TvgResult<AnimId> {
        match PayloadKind::sniff(payload) {
            PayloadKind::Svg => {}
            PayloadKind::Lottie => {
                return Err(TvgError::creation(
                    "lottie payloads are not supported by the software engine",
                ));
            }
            PayloadKind::Unknown => {
                return Err(TvgError::creation("payload is neither svg nor lottie"));
            }
        }
        let opts = usvg::Options::default();
        let tree = usvg::Tree::from_data(payload, &opts)
            .map_err(|e| TvgError::creation(format!("parse svg: {e}")))?;

        let scene = Scene {
            tree: Arc::new(tree),
            picture: None,
            flip_rows: false,
            target: None,
        };
        let idx = match self.free.pop() {
            Some(i) => {
                self.slots[i] = Some(scene);
                i
            }
            None => {
                self.slots.push(Some(scene));
                self.slots.len() - 1
            }
        };
        let id = u32::try_from(idx + 1)
            .map_err(|_| TvgError::engine("Animation New", ErrorCategory::AllocationFailure))?;
        Ok(AnimId(id))
    }

    fn destroy_animation(&mut self, handle: AnimId) -> TvgResult<()> {
        if handle.is_null() {
            return Ok(());
        }
        self.scene(handle, "Animation Del")?;
        let idx = (handle.0 - 1) as usize;
        self.slots[idx] = None;
        self.free.push(idx);
        Ok(())
    }

    fn size(&self, handle: AnimId) -> TvgResult<(f32, f32)> {
        let size = self.scene(handle, "Picture Get Size")?.tree.size();
        Ok((size.width(), size.height()))
    }

    fn duration(&self, handle: AnimId) -> TvgResult<f32> {
        self.scene(handle, "Animation Get Duration")?;
        Ok(0.0)
    }

    fn total_frames(&self, handle: AnimId) -> TvgResult<f32> {
        self.scene(handle, "Animation Get Total Frame")?;
        Ok(0.0)
    }

    fn set_frame(&mut self, handle: AnimId, _frame: f32) -> TvgResult<()> {
        self.scene(handle, "Animation Set Frame")?;
        Ok(())
    }

    fn resize(&mut self, handle: AnimId, width: f32, height: f32) -> TvgResult<()> {
        let scene = self.scene_mut(handle, "Picture Set Size")?;
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height == 0.0 {
            return Err(TvgError::engine(
                "Picture Set Size",
                ErrorCategory::InvalidArguments,
            ));
        }
        scene.picture = Some((width, height.abs()));
        scene.flip_rows = height < 0.0;
        Ok(())
    }

    unsafe fn bind_target(&mut self, handle: AnimId, target: RenderTarget) -> TvgResult<()> {
        self.scene_mut(handle, "Canvas Set Target")?.target = Some(target);
        Ok(())
    }

    fn draw(&mut self, handle: AnimId) -> TvgResult<()> {
        let scene = self.scene(handle, "Canvas Draw")?;
        let target = scene
            .target
            .ok_or_else(|| TvgError::engine("Canvas Draw", ErrorCategory::PreconditionNotMet))?;
        let size = target.size();

        let mut pixmap = tiny_skia::Pixmap::new(size.width, size.height)
            .ok_or_else(|| TvgError::engine("Canvas Draw", ErrorCategory::AllocationFailure))?;

        let natural = scene.tree.size();
        let (pw, ph) = scene
            .picture
            .unwrap_or((natural.width(), natural.height()));
        let sx = pw / natural.width();
        let sy = ph / natural.height();
        let xform = if scene.flip_rows {
            tiny_skia::Transform::from_row(sx, 0.0, 0.0, -sy, 0.0, ph)
        } else {
            tiny_skia::Transform::from_scale(sx, sy)
        };
        resvg::render(&scene.tree, xform, &mut pixmap.as_mut());

        // SAFETY: bind_target's contract keeps the memory valid and unaliased while bound.
        let dst = unsafe { target.pixels_mut() };
        for (px, rgba) in dst.iter_mut().zip(pixmap.data().chunks_exact(4)) {
            *px = u32::from_le_bytes([rgba[0], rgba[1], rgba[2], rgba[3]]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::ptr::NonNull;

    use super::*;
    use crate::foundation::core::PixelSize;

    const HALF_RED: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4">
        <rect x="0" y="0" width="4" height="2" fill="#ff0000"/>
    </svg>"##;

    fn render(engine: &mut SoftwareEngine, id: AnimId, height: f32) -> Vec<u32> {
        let mut px = vec![0u32; 16];
        engine.resize(id, 4.0, height).unwrap();
        let target = unsafe {
            RenderTarget::new(
                NonNull::new(px.as_mut_ptr()).unwrap(),
                PixelSize::new(4, 4).unwrap(),
            )
        };
        unsafe { engine.bind_target(id, target).unwrap() };
        engine.draw(id).unwrap();
        px
    }

    #[test]
    fn draws_abgr_top_down() {
        let mut e = SoftwareEngine::new();
        let id = e.create_animation(HALF_RED).unwrap();
        assert_eq!(e.size(id).unwrap(), (4.0, 4.0));
        assert_eq!(e.total_frames(id).unwrap(), 0.0);

        let px = render(&mut e, id, 4.0);
        assert_eq!(px[0].to_le_bytes(), [255, 0, 0, 255]);
        assert_eq!(px[15], 0);
    }

    #[test]
    fn negative_height_flips_rows() {
        let mut e = SoftwareEngine::new();
        let id = e.create_animation(HALF_RED).unwrap();
        let px = render(&mut e, id, -4.0);
        assert_eq!(px[0], 0);
        assert_eq!(px[15].to_le_bytes(), [255, 0, 0, 255]);
    }

    #[test]
    fn rejects_lottie_and_garbage() {
        let mut e = SoftwareEngine::new();
        let lottie = br#"{"v":"5.7.0","fr":30,"ip":0,"op":30,"w":10,"h":10,"layers":[]}"#;
        assert!(matches!(
            e.create_animation(lottie),
            Err(TvgError::Creation(_))
        ));
        assert!(matches!(
            e.create_animation(b"<svg"),
            Err(TvgError::Creation(_))
        ));
        assert!(e.create_animation(b"hello").is_err());
        assert_eq!(e.live_animations(), 0);
    }

    #[test]
    fn slots_are_reused_and_null_destroy_is_noop() {
        let mut e = SoftwareEngine::new();
        let a = e.create_animation(HALF_RED).unwrap();
        assert_eq!(a, AnimId(1));
        e.destroy_animation(a).unwrap();
        e.destroy_animation(AnimId::NULL).unwrap();
        assert!(e.size(a).is_err());
        let b = e.create_animation(HALF_RED).unwrap();
        assert_eq!(b, AnimId(1));
        assert_eq!(e.live_animations(), 1);
    }

    #[test]
    fn draw_without_target_is_precondition_error() {
        let mut e = SoftwareEngine::new();
        let id = e.create_animation(HALF_RED).unwrap();
        let err = e.draw(id).unwrap_err();
        assert_eq!(err.category(), Some(ErrorCategory::PreconditionNotMet));
    }
}
