use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tvg_playback::{Animation, DefaultEngine, PayloadKind, Runtime, RuntimeOpts};

#[derive(Parser, Debug)]
#[command(name = "tvg-render", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Print natural size and timing as JSON.
    Info(InfoArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input SVG or Lottie file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame to render. Wrapped into the animation's frame range.
    #[arg(long, default_value_t = 0.0)]
    frame: f32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Render width; defaults to the natural width.
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Render height; defaults to the natural height.
    #[arg(long, requires = "width")]
    height: Option<u32>,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input SVG or Lottie file.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let runtime = Runtime::new(DefaultEngine::default(), RuntimeOpts::from_env());
    match cli.cmd {
        Command::Frame(args) => cmd_frame(&runtime, args),
        Command::Info(args) => cmd_info(&runtime, args),
    }
}

fn read_payload(path: &Path) -> anyhow::Result<Vec<u8>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read payload '{}'", path.display()))?;
    let by_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(PayloadKind::from_extension)
        .unwrap_or(PayloadKind::Unknown);
    let by_content = PayloadKind::sniff(&bytes);
    if by_ext != PayloadKind::Unknown && by_ext != by_content {
        eprintln!(
            "warning: '{}' looks like {by_content:?} despite its extension",
            path.display()
        );
    }
    Ok(bytes)
}

fn cmd_frame(runtime: &Runtime, args: FrameArgs) -> anyhow::Result<()> {
    let payload = read_payload(&args.in_path)?;
    let mut anim: Animation = Animation::new(runtime, &payload)
        .with_context(|| format!("load '{}'", args.in_path.display()))?;

    if let (Some(w), Some(h)) = (args.width, args.height) {
        anim.resize(w, h).context("resize")?;
    }
    anim.set_frame(args.frame).context("set frame")?;
    let image = anim
        .materialize()
        .context("render frame")?
        .to_rgba_image()?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    anim.dispose()?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_info(runtime: &Runtime, args: InfoArgs) -> anyhow::Result<()> {
    let payload = read_payload(&args.in_path)?;
    let mut anim: Animation = Animation::new(runtime, &payload)
        .with_context(|| format!("load '{}'", args.in_path.display()))?;
    let json = serde_json::to_string_pretty(anim.info())?;
    anim.dispose()?;
    println!("{json}");
    Ok(())
}
