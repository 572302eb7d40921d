use std::path::PathBuf;

const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="48" height="24">
  <rect width="48" height="24" fill="#ff3366"/>
</svg>"##;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_tvg-render"))
}

fn fixture(name: &str) -> (PathBuf, PathBuf) {
    let dir = PathBuf::from("target").join("cli_smoke").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    let svg_path = dir.join("in.svg");
    std::fs::write(&svg_path, SVG).unwrap();
    (dir, svg_path)
}

#[test]
fn cli_frame_writes_png() {
    let (dir, svg_path) = fixture("frame");
    let out_path = dir.join("out.png");
    let _ = std::fs::remove_file(&out_path);

    let status = std::process::Command::new(bin())
        .args(["frame", "--in"])
        .arg(&svg_path)
        .args(["--frame", "3", "--width", "24", "--height", "12", "--out"])
        .arg(&out_path)
        .status()
        .unwrap();
    assert!(status.success());

    let img = image::open(&out_path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (24, 12));
    assert_eq!(img.get_pixel(3, 3).0, [0xff, 0x33, 0x66, 0xff]);
}

#[test]
fn cli_info_prints_json() {
    let (_dir, svg_path) = fixture("info");
    let output = std::process::Command::new(bin())
        .args(["info", "--in"])
        .arg(&svg_path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["natural"]["width"], 48);
    assert_eq!(v["natural"]["height"], 24);
    assert_eq!(v["total_frames"], 0.0);
}

#[test]
fn cli_rejects_missing_input() {
    let status = std::process::Command::new(bin())
        .args(["info", "--in", "target/cli_smoke/does-not-exist.svg"])
        .status()
        .unwrap();
    assert!(!status.success());
}
