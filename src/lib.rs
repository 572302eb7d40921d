//! Vector animation playback core.
//!
//! Loads SVG or Lottie payloads into a vector-graphics engine, binds each animation to a
//! pinned pixel buffer, and rasterizes frames lazily into a host texture.
//!
//! ```no_run
//! use tvg_playback::{Animation, CpuTexture, Runtime};
//!
//! # fn main() -> tvg_playback::TvgResult<()> {
//! let runtime: Runtime = Runtime::default();
//! let svg = std::fs::read("icon.svg").map_err(anyhow::Error::from)?;
//! let mut anim: Animation = Animation::new(&runtime, &svg)?;
//! anim.resize(256, 256)?;
//! let texture: &CpuTexture = anim.materialize()?;
//! assert_eq!(texture.width(), 256);
//! anim.dispose()?;
//! # Ok(())
//! # }
//! ```

mod foundation;

pub mod engine;
pub mod playback;
pub mod runtime;

pub use engine::{AnimId, DefaultEngine, Engine, EngineHandle, RenderTarget};
pub use foundation::core::{
    AnimationInfo, FRAME_EPSILON, MAX_DIM, PayloadKind, PixelSize, RowOrder, wrap_frame,
};
pub use foundation::error::{ErrorCategory, ResultCode, TvgError, TvgResult, check};
pub use playback::{
    Animation, CpuTexture, PinnedBuffer, PlaybackStats, Player, Texture, render_thumbnail,
    render_thumbnail_or_placeholder,
};
pub use runtime::{LifecycleState, Runtime, RuntimeOpts};
