use crate::engine::{DefaultEngine, Engine};
use crate::foundation::error::TvgResult;
use crate::playback::animation::Animation;
use crate::playback::texture::{CpuTexture, Texture};
use crate::runtime::Runtime;

/// Time-driven wrapper around at most one [`Animation`].
///
/// Hosts call [`Player::tick`] once per display frame with the elapsed seconds.
pub struct Player<E: Engine = DefaultEngine, T: Texture + Default = CpuTexture> {
    runtime: Runtime<E>,
    animation: Option<Animation<E, T>>,
    speed: f32,
}

impl<E: Engine, T: Texture + Default> Player<E, T> {
    /// Empty player at normal speed.
    pub fn new(runtime: Runtime<E>) -> Self {
        Self {
            runtime,
            animation: None,
            speed: 1.0,
        }
    }

    /// Replace the current animation with one loaded from `payload`.
    ///
    /// The old animation is disposed first. An empty payload just clears the player. A failed
    /// load is logged, leaves the player empty, and is returned.
    pub fn load(&mut self, payload: &[u8]) -> TvgResult<()> {
        self.clear()?;
        if payload.is_empty() {
            return Ok(());
        }
        match Animation::new(&self.runtime, payload) {
            Ok(anim) => {
                self.animation = Some(anim);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "player failed to load animation");
                Err(e)
            }
        }
    }

    /// Dispose the current animation, if any.
    pub fn clear(&mut self) -> TvgResult<()> {
        match self.animation.take() {
            Some(mut anim) => anim.dispose(),
            None => Ok(()),
        }
    }

    /// Advance by `dt` seconds and return the current frame's texture.
    ///
    /// The frame only moves for animated content at a non-zero speed. Returns `None` when
    /// nothing is loaded.
    pub fn tick(&mut self, dt: f32) -> TvgResult<Option<&T>> {
        let speed = self.speed;
        let Some(anim) = self.animation.as_mut() else {
            return Ok(None);
        };
        if anim.is_animated() && speed != 0.0 {
            let next = anim.frame() + dt * anim.fps() * speed;
            anim.set_frame(next)?;
        }
        anim.materialize().map(Some)
    }

    /// Playback speed multiplier. Negative values play backwards.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn animation(&self) -> Option<&Animation<E, T>> {
        self.animation.as_ref()
    }

    pub fn animation_mut(&mut self) -> Option<&mut Animation<E, T>> {
        self.animation.as_mut()
    }

    pub fn is_loaded(&self) -> bool {
        self.animation.is_some()
    }
}

impl<E: Engine, T: Texture + Default> Drop for Player<E, T> {
    fn drop(&mut self) {
        if let Err(e) = self.clear() {
            tracing::warn!(error = %e, "player failed to dispose its animation");
        }
    }
}
