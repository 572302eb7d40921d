use std::thread::{self, ThreadId};

use crate::engine::{DefaultEngine, Engine, EngineHandle};
use crate::foundation::core::{AnimationInfo, FRAME_EPSILON, PixelSize, wrap_frame};
use crate::foundation::error::{ErrorCategory, TvgError, TvgResult};
use crate::playback::buffer::PinnedBuffer;
use crate::playback::texture::{CpuTexture, Texture};
use crate::runtime::Runtime;

/// Counters describing the work an animation has done.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    /// Engine draw sequences issued by `materialize`.
    pub draws: u64,
    /// Pixel buffers pinned.
    pub pins: u64,
    /// Pixel buffers released.
    pub unpins: u64,
    /// Sequence number of the latest pin. Pins and unpins share one counter starting at 1.
    pub last_pin_seq: u64,
    /// Sequence number of the latest unpin, `0` before the first one.
    pub last_unpin_seq: u64,
}

impl PlaybackStats {
    /// Buffers currently pinned; never more than one.
    pub fn pinned(&self) -> u64 {
        self.pins - self.unpins
    }

    fn next_seq(&self) -> u64 {
        self.pins + self.unpins + 1
    }

    fn record_pin(&mut self) {
        self.last_pin_seq = self.next_seq();
        self.pins += 1;
    }

    fn record_unpin(&mut self) {
        self.last_unpin_seq = self.next_seq();
        self.unpins += 1;
    }
}

/// One loaded vector asset bound to one pinned pixel buffer and one texture.
///
/// The current frame is rasterized lazily: state changes only mark the animation dirty and
/// [`Animation::materialize`] redraws at most once per change.
///
/// Call [`Animation::dispose`] from the owning thread when done. Dropping without disposing
/// still releases the engine handle and the pixel buffer, but leaves the texture alone.
pub struct Animation<E: Engine = DefaultEngine, T: Texture = CpuTexture> {
    runtime: Runtime<E>,
    handle: E::Handle,
    buffer: Option<PinnedBuffer>,
    texture: T,
    info: AnimationInfo,
    size: PixelSize,
    frame: f32,
    dirty: bool,
    disposed: bool,
    registered: bool,
    owner: ThreadId,
    stats: PlaybackStats,
}

impl<E: Engine, T: Texture + Default> Animation<E, T> {
    /// Load `payload` (SVG or Lottie, detected by the engine) with a default texture.
    pub fn new(runtime: &Runtime<E>, payload: impl AsRef<[u8]>) -> TvgResult<Self> {
        Self::with_texture(runtime, payload, T::default())
    }
}

impl<E: Engine, T: Texture> Animation<E, T> {
    /// Load `payload` and feed `texture` from it.
    ///
    /// The texture is reinitialized to the natural size of the content. On failure every
    /// engine resource created so far is released before the error is returned.
    #[tracing::instrument(skip_all, fields(bytes = payload.as_ref().len()))]
    pub fn with_texture(
        runtime: &Runtime<E>,
        payload: impl AsRef<[u8]>,
        texture: T,
    ) -> TvgResult<Self> {
        runtime.init().map_err(|e| TvgError::load("engine init", e))?;
        let handle = runtime
            .create_registered(|e| e.create_animation(payload.as_ref()))
            .map_err(|e| TvgError::load("create animation", e))?;

        // From here on, Drop releases the handle if any later step fails.
        let mut anim = Self {
            runtime: runtime.clone(),
            handle,
            buffer: None,
            texture,
            info: AnimationInfo::from_raw(PixelSize::default(), 0.0, 0.0),
            size: PixelSize::default(),
            frame: 0.0,
            dirty: true,
            disposed: false,
            registered: true,
            owner: thread::current().id(),
            stats: PlaybackStats::default(),
        };

        anim.info = anim
            .read_info()
            .map_err(|e| TvgError::load("read metadata", e))?;
        let natural = anim.info.natural;
        anim.texture
            .reinitialize(natural)
            .map_err(|e| TvgError::load("allocate texture", e))?;
        anim.resize(natural.width, natural.height)
            .map_err(|e| TvgError::load("initial resize", e))?;

        tracing::debug!(
            width = natural.width,
            height = natural.height,
            total_frames = anim.info.total_frames,
            duration = anim.info.duration,
            "animation loaded"
        );
        Ok(anim)
    }

    fn read_info(&self) -> TvgResult<AnimationInfo> {
        let handle = self.handle;
        let (w, h, duration, total) = self.runtime.with_engine(|e| {
            let (w, h) = e.size(handle)?;
            Ok::<_, TvgError>((w, h, e.duration(handle)?, e.total_frames(handle)?))
        })?;
        Ok(AnimationInfo::from_raw(
            PixelSize::from_natural(w, h)?,
            duration,
            total,
        ))
    }

    /// Change the render resolution.
    ///
    /// The previous pixel buffer is released before the new one is pinned, so addresses from
    /// before the call are invalid afterwards. Always marks the animation dirty.
    ///
    /// A failure after the old buffer is gone releases the engine handle: the engine may still
    /// point at the freed buffer, so the instance is unusable until disposed.
    pub fn resize(&mut self, width: u32, height: u32) -> TvgResult<()> {
        self.ensure_live("resize")?;
        let size = PixelSize::new(width, height)?;
        let handle = self.handle;
        let signed_height = self.runtime.opts().row_order.signed_height(height);

        self.runtime
            .with_engine(|e| e.resize(handle, width as f32, signed_height))?;

        self.dirty = true;
        if let Err(e) = self.repin(size) {
            tracing::warn!(error = %e, width, height, "rebinding failed; releasing engine handle");
            if let Err(release) = self.release_native() {
                tracing::warn!(error = %release, "failed to release engine resources");
            }
            return Err(e);
        }

        self.size = size;
        tracing::debug!(width, height, "animation resized");
        Ok(())
    }

    /// Swap the pinned buffer for one of `size` and bind it.
    fn repin(&mut self, size: PixelSize) -> TvgResult<()> {
        self.release_buffer();
        let buffer = self.buffer.insert(PinnedBuffer::new(size));
        self.stats.record_pin();
        let target = buffer.target();

        self.texture.reinitialize(size)?;
        let handle = self.handle;
        // SAFETY: the buffer lives in `self.buffer` until it is replaced or released. Both
        // paths run only after the engine is done with it: a successful rebind, or a failed
        // one followed by destroying the handle.
        self.runtime
            .with_engine(|e| unsafe { e.bind_target(handle, target) })
    }

    /// Last requested frame, unwrapped.
    pub fn frame(&self) -> f32 {
        self.frame
    }

    /// Last requested frame, wrapped into `[0, total_frames)`. Zero for static content.
    pub fn wrapped_frame(&self) -> f32 {
        if self.info.is_animated() {
            wrap_frame(self.frame, self.info.total_frames)
        } else {
            0.0
        }
    }

    /// Request a frame.
    ///
    /// Values within [`FRAME_EPSILON`] of the current request are ignored. Static content
    /// (`total_frames <= 1`) stores the request but never reaches the engine. Otherwise the
    /// request is wrapped into the engine's frame range and the animation becomes dirty.
    /// Returns whether the engine frame changed.
    pub fn set_frame(&mut self, frame: f32) -> TvgResult<bool> {
        if !frame.is_finite() {
            return Err(TvgError::validation(format!("frame must be finite, got {frame}")));
        }
        self.ensure_live("set frame")?;
        if (frame - self.frame).abs() < FRAME_EPSILON {
            return Ok(false);
        }
        self.frame = frame;
        if !self.info.is_animated() {
            return Ok(false);
        }

        let wrapped = wrap_frame(frame, self.info.total_frames);
        let handle = self.handle;
        self.runtime.with_engine(|e| e.set_frame(handle, wrapped))?;
        self.dirty = true;
        Ok(true)
    }

    /// Texture holding the current frame, redrawing first if anything changed.
    pub fn materialize(&mut self) -> TvgResult<&T> {
        self.ensure_live("materialize")?;
        if !self.dirty {
            return Ok(&self.texture);
        }
        let Some(buffer) = self.buffer.as_ref() else {
            return Err(TvgError::engine("Canvas Draw", ErrorCategory::PreconditionNotMet));
        };

        let handle = self.handle;
        self.runtime.with_engine(|e| e.draw(handle))?;
        self.stats.draws += 1;
        self.texture.upload(buffer.pixels())?;
        self.dirty = false;
        Ok(&self.texture)
    }

    /// Release engine resources, the pixel buffer, and (on the owning thread) the texture.
    ///
    /// Idempotent. On another thread the texture is left for its owner to release. An engine
    /// failure while destroying the handle is returned, but everything is released anyway.
    pub fn dispose(&mut self) -> TvgResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        let result = self.release_native();
        if thread::current().id() == self.owner {
            self.texture.release();
        } else {
            tracing::warn!("animation disposed off its owning thread; texture left to its owner");
        }
        result
    }

    /// `true` once [`Animation::dispose`] has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether the texture is stale.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// `true` when the content has a frame axis (`total_frames > 1`).
    pub fn is_animated(&self) -> bool {
        self.info.is_animated()
    }

    /// Natural size and timing.
    pub fn info(&self) -> &AnimationInfo {
        &self.info
    }

    /// Current render width.
    pub fn width(&self) -> u32 {
        self.size.width
    }

    /// Current render height.
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Duration in seconds; zero for static content.
    pub fn duration(&self) -> f32 {
        self.info.duration
    }

    /// Engine frame count; may be fractional.
    pub fn total_frames(&self) -> f32 {
        self.info.total_frames
    }

    /// Frames per second, derived from `total_frames / duration`.
    pub fn fps(&self) -> f32 {
        self.info.fps
    }

    /// Texture as of the last materialization.
    pub fn texture(&self) -> &T {
        &self.texture
    }

    /// Raw pixels of the last draw (ABGR8888), if a buffer is pinned.
    pub fn pixels(&self) -> Option<&[u32]> {
        self.buffer.as_ref().map(PinnedBuffer::pixels)
    }

    /// Address of the pinned buffer, if any. Changes on every resize.
    pub fn buffer_addr(&self) -> Option<usize> {
        self.buffer.as_ref().map(PinnedBuffer::addr)
    }

    /// Draw and buffer counters.
    pub fn stats(&self) -> PlaybackStats {
        self.stats
    }

    /// Runtime this animation was loaded in.
    pub fn runtime(&self) -> &Runtime<E> {
        &self.runtime
    }

    fn ensure_live(&self, op: &str) -> TvgResult<()> {
        if self.disposed || self.handle.is_null() {
            return Err(TvgError::validation(format!("{op} on a released animation")));
        }
        Ok(())
    }

    fn release_buffer(&mut self) {
        if self.buffer.take().is_some() {
            self.stats.record_unpin();
        }
    }

    /// Destroy the engine handle, then unpin the buffer it rendered into.
    fn release_native(&mut self) -> TvgResult<()> {
        let handle = std::mem::replace(&mut self.handle, E::Handle::NULL);
        let result = if handle.is_null() {
            Ok(())
        } else {
            self.runtime.with_engine(|e| e.destroy_animation(handle))
        };
        self.release_buffer();
        if self.registered {
            self.registered = false;
            self.runtime.unregister_animation();
        }
        result
    }
}

impl<E: Engine, T: Texture> Drop for Animation<E, T> {
    fn drop(&mut self) {
        if self.disposed {
            return;
        }
        tracing::debug!("animation dropped without dispose; releasing engine resources");
        if let Err(e) = self.release_native() {
            tracing::warn!(error = %e, "failed to release engine resources");
        }
    }
}

impl<E: Engine, T: Texture> std::fmt::Debug for Animation<E, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animation")
            .field("handle", &self.handle)
            .field("size", &self.size)
            .field("info", &self.info)
            .field("frame", &self.frame)
            .field("dirty", &self.dirty)
            .field("disposed", &self.disposed)
            .finish()
    }
}
