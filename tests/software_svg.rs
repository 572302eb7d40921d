use tvg_playback::engine::software::SoftwareEngine;
use tvg_playback::{Animation, CpuTexture, RowOrder, Runtime, RuntimeOpts, TvgError};

const SQUARE: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
  <rect x="0" y="0" width="100" height="50" fill="#00ff00"/>
</svg>"##;

fn runtime(row_order: RowOrder) -> Runtime<SoftwareEngine> {
    Runtime::new(
        SoftwareEngine::new(),
        RuntimeOpts::default().with_row_order(row_order),
    )
}

#[test]
fn static_svg_renders_once_at_natural_size() {
    let rt = runtime(RowOrder::TopDown);
    let mut anim: Animation<SoftwareEngine> = Animation::new(&rt, SQUARE).unwrap();

    assert_eq!(anim.info().natural.width, 100);
    assert_eq!(anim.info().natural.height, 100);
    assert!(anim.total_frames() <= 1.0);
    assert_eq!(anim.duration(), 0.0);

    assert!(!anim.set_frame(5.0).unwrap());
    let tex = anim.materialize().unwrap();
    assert_eq!((tex.width(), tex.height()), (100, 100));
    assert_eq!(tex.pixel(50, 10), Some([0, 255, 0, 255]));
    assert_eq!(tex.pixel(50, 90), Some([0, 0, 0, 0]));

    anim.materialize().unwrap();
    assert_eq!(anim.stats().draws, 1);
    anim.dispose().unwrap();
    rt.term().unwrap();
}

#[test]
fn resized_render_scales_content() {
    let rt = runtime(RowOrder::TopDown);
    let mut anim: Animation<SoftwareEngine> = Animation::new(&rt, SQUARE).unwrap();
    anim.resize(20, 20).unwrap();
    let tex = anim.materialize().unwrap();
    assert_eq!(tex.data().len(), 20 * 20 * 4);
    assert_eq!(tex.pixel(10, 2), Some([0, 255, 0, 255]));
    assert_eq!(tex.pixel(10, 18), Some([0, 0, 0, 0]));
}

#[test]
fn bottom_up_runtime_flips_rows() {
    let rt = runtime(RowOrder::BottomUp);
    let mut anim: Animation<SoftwareEngine> = Animation::new(&rt, SQUARE).unwrap();
    let tex: &CpuTexture = anim.materialize().unwrap();
    assert_eq!(tex.pixel(50, 10), Some([0, 0, 0, 0]));
    assert_eq!(tex.pixel(50, 90), Some([0, 255, 0, 255]));
}

#[test]
fn lottie_is_rejected_without_leaking() {
    let rt = runtime(RowOrder::TopDown);
    let lottie = br#"{"v":"5.7.0","fr":30,"ip":0,"op":60,"w":64,"h":64,"layers":[]}"#;
    let err = Animation::<SoftwareEngine, CpuTexture>::new(&rt, lottie).unwrap_err();
    assert!(matches!(err, TvgError::Load { .. }));
    assert_eq!(rt.live_animations(), 0);
}
