use crate::foundation::error::{TvgError, TvgResult};

/// Two frame requests closer than this are treated as the same frame.
pub const FRAME_EPSILON: f32 = 1e-6;

/// Largest accepted render target edge, in pixels.
pub const MAX_DIM: u32 = 16_384;

/// Normalize `requested` into `[0, total)` with floored modulo.
///
/// Negative and overshooting requests both wrap, e.g. with `total = 30`, `35 -> 5` and
/// `-5 -> 25`. `f32::rem_euclid` is not used because it may round up to `total` for tiny
/// negative inputs.
pub fn wrap_frame(requested: f32, total: f32) -> f32 {
    ((requested % total) + total) % total
}

/// Render target dimensions in pixels. Both edges are in `1..=MAX_DIM`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelSize {
    /// Create a validated size.
    pub fn new(width: u32, height: u32) -> TvgResult<Self> {
        if width == 0 || height == 0 {
            return Err(TvgError::validation(format!(
                "pixel size must be non-zero, got {width}x{height}"
            )));
        }
        if width > MAX_DIM || height > MAX_DIM {
            return Err(TvgError::validation(format!(
                "pixel size too large: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"
            )));
        }
        Ok(Self { width, height })
    }

    /// Convert an engine-reported float size, rounding partial pixels up.
    pub fn from_natural(width: f32, height: f32) -> TvgResult<Self> {
        fn to_px(v: f32) -> TvgResult<u32> {
            if !v.is_finite() || v <= 0.0 {
                return Err(TvgError::validation(format!(
                    "natural size must be positive, got {v}"
                )));
            }
            Ok((v.ceil() as u32).max(1))
        }
        Self::new(to_px(width)?, to_px(height)?)
    }

    /// Number of pixels (`width * height`).
    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// Row order of rendered pixel buffers.
///
/// The engine rasterizes top-down. Hosts whose images have a bottom-left origin ask for
/// `BottomUp`; the flip is requested from the engine with a negative resize height.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum RowOrder {
    /// First row in memory is the top of the image.
    #[default]
    TopDown,
    /// First row in memory is the bottom of the image.
    BottomUp,
}

impl RowOrder {
    /// Height as passed to `Engine::resize`: negated for bottom-up rows.
    pub fn signed_height(self, height: u32) -> f32 {
        match self {
            Self::TopDown => height as f32,
            Self::BottomUp => -(height as f32),
        }
    }

    /// Parse `top-down` / `bottom-up` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top-down" | "topdown" => Some(Self::TopDown),
            "bottom-up" | "bottomup" => Some(Self::BottomUp),
            _ => None,
        }
    }
}

/// Natural size and timing metadata of a loaded animation.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnimationInfo {
    /// Natural size as reported by the engine.
    pub natural: PixelSize,
    /// Duration in seconds. Zero for static content.
    pub duration: f32,
    /// Total frame count. May be fractional; `<= 1` means static content.
    pub total_frames: f32,
    /// `total_frames / duration`, or zero when `duration` is zero.
    pub fps: f32,
}

impl AnimationInfo {
    /// Build metadata from raw engine values, deriving `fps`.
    pub fn from_raw(natural: PixelSize, duration: f32, total_frames: f32) -> Self {
        let fps = if duration > 0.0 {
            total_frames / duration
        } else {
            0.0
        };
        Self {
            natural,
            duration,
            total_frames,
            fps,
        }
    }

    /// `true` when the content has a frame axis.
    pub fn is_animated(&self) -> bool {
        self.total_frames > 1.0
    }
}

/// Payload format hint.
///
/// Engines detect the format from content on their own; this is for hosts that want to offer
/// the right payload type or reject obvious mismatches early.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PayloadKind {
    /// SVG markup.
    Svg,
    /// Lottie JSON animation.
    Lottie,
    /// Anything else.
    Unknown,
}

impl PayloadKind {
    /// Sniff the payload's first significant byte (after a UTF-8 BOM and whitespace).
    pub fn sniff(bytes: &[u8]) -> Self {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'<') => Self::Svg,
            Some(b'{') => Self::Lottie,
            _ => Self::Unknown,
        }
    }

    /// Guess from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "svg" => Self::Svg,
            "json" | "lot" | "lottie" => Self::Lottie,
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_frame_handles_overshoot_and_negative() {
        assert_eq!(wrap_frame(35.0, 30.0), 5.0);
        assert_eq!(wrap_frame(-5.0, 30.0), 25.0);
        assert_eq!(wrap_frame(30.0, 30.0), 0.0);
        assert_eq!(wrap_frame(0.0, 30.0), 0.0);
        assert_eq!(wrap_frame(12.5, 30.0), 12.5);
    }

    #[test]
    fn wrap_frame_stays_in_range_and_is_periodic() {
        for total in [2.0f32, 7.5, 30.0, 120.0] {
            for i in -400..400 {
                let f = i as f32 * 0.75;
                let w = wrap_frame(f, total);
                assert!((0.0..total).contains(&w), "f={f} total={total} w={w}");
            }
        }
        for k in -5..=5 {
            let shifted = 5.0 + (k as f32) * 30.0;
            assert_eq!(wrap_frame(shifted, 30.0), 5.0, "k={k}");
        }
    }

    #[test]
    fn wrap_frame_tiny_negative_does_not_reach_total() {
        let w = wrap_frame(-1e-9, 30.0);
        assert!(w < 30.0);
    }

    #[test]
    fn pixel_size_rejects_zero_and_huge() {
        assert!(PixelSize::new(0, 10).is_err());
        assert!(PixelSize::new(10, 0).is_err());
        assert!(PixelSize::new(MAX_DIM + 1, 1).is_err());
        assert_eq!(PixelSize::new(4, 3).unwrap().pixel_count(), 12);
    }

    #[test]
    fn natural_size_rounds_up() {
        let s = PixelSize::from_natural(99.2, 100.0).unwrap();
        assert_eq!((s.width, s.height), (100, 100));
        assert!(PixelSize::from_natural(f32::NAN, 1.0).is_err());
        assert!(PixelSize::from_natural(-3.0, 1.0).is_err());
    }

    #[test]
    fn fps_derivation() {
        let size = PixelSize::new(1, 1).unwrap();
        assert_eq!(AnimationInfo::from_raw(size, 1.0, 30.0).fps, 30.0);
        assert_eq!(AnimationInfo::from_raw(size, 2.0, 30.0).fps, 15.0);
        let still = AnimationInfo::from_raw(size, 0.0, 0.0);
        assert_eq!(still.fps, 0.0);
        assert!(!still.is_animated());
    }

    #[test]
    fn row_order_signs_height() {
        assert_eq!(RowOrder::TopDown.signed_height(8), 8.0);
        assert_eq!(RowOrder::BottomUp.signed_height(8), -8.0);
        assert_eq!(RowOrder::parse(" Bottom-Up "), Some(RowOrder::BottomUp));
        assert_eq!(RowOrder::parse("sideways"), None);
    }

    #[test]
    fn payload_sniffing() {
        assert_eq!(PayloadKind::sniff(b"  \n<svg/>"), PayloadKind::Svg);
        assert_eq!(PayloadKind::sniff(b"\xEF\xBB\xBF<?xml"), PayloadKind::Svg);
        assert_eq!(PayloadKind::sniff(b"{\"v\":\"5.7\"}"), PayloadKind::Lottie);
        assert_eq!(PayloadKind::sniff(b""), PayloadKind::Unknown);
        assert_eq!(PayloadKind::from_extension("SVG"), PayloadKind::Svg);
        assert_eq!(PayloadKind::from_extension("json"), PayloadKind::Lottie);
        assert_eq!(PayloadKind::from_extension("png"), PayloadKind::Unknown);
    }
}
