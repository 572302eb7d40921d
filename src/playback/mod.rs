//! Playback core: pinned buffers, textures, and lazily materialized animations.

pub mod animation;
pub mod buffer;
pub mod player;
pub mod texture;
pub mod thumbnail;

pub use animation::{Animation, PlaybackStats};
pub use buffer::PinnedBuffer;
pub use player::Player;
pub use texture::{CpuTexture, Texture};
pub use thumbnail::{render_thumbnail, render_thumbnail_or_placeholder};
