use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context as _;
use chromakey::{
    CompositorConfig, CompositorState, Frame, FrameLoop, FrameSource, Size, TickOutcome,
    rgb_to_hsv, sample_background,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "chromakey", version)]
struct Cli {
    /// Log filter used when `RUST_LOG` is not set (e.g. "info", "chromakey=debug").
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Key a sequence of frames as one stream and write the presented surfaces as PNGs.
    Key(KeyArgs),
    /// Print the dominant (background) color of an image.
    Sample(SampleArgs),
    /// Print the default configuration as JSON.
    Config,
}

#[derive(Parser, Debug)]
struct KeyArgs {
    /// Input images or directories (directories are expanded and sorted by file name).
    #[arg(long = "in", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Output directory for `frame_NNNNN.png`.
    #[arg(long)]
    out: PathBuf,

    /// Configuration JSON. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Container bounding box as WIDTHxHEIGHT. Required with an explicit canvas size; frames keep
    /// their native size unconstrained when omitted.
    #[arg(long)]
    container: Option<ContainerArg>,

    #[arg(long)]
    tolerance: Option<f64>,

    /// Edge smoothing strength (0 disables).
    #[arg(long)]
    smoothing: Option<f64>,

    /// Target canvas width (<= 0 uses the native width).
    #[arg(long, allow_hyphen_values = true)]
    width: Option<i64>,

    /// Target canvas height (<= 0 uses the native height).
    #[arg(long, allow_hyphen_values = true)]
    height: Option<i64>,

    /// Derive height from width and the source aspect ratio.
    #[arg(long)]
    aspect_lock: bool,

    #[arg(long, allow_hyphen_values = true)]
    offset_x: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    offset_y: Option<f64>,

    /// Run keying and smoothing on a rayon pool.
    #[arg(long)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct SampleArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug)]
struct ContainerArg(Size);

impl FromStr for ContainerArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
        let w: f64 = w.trim().parse().map_err(|e| format!("width: {e}"))?;
        let h: f64 = h.trim().parse().map_err(|e| format!("height: {e}"))?;
        Ok(Self(Size::new(w, h)))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json);
    match cli.cmd {
        Command::Key(args) => cmd_key(args),
        Command::Sample(args) => cmd_sample(args),
        Command::Config => cmd_config(),
    }
}

fn init_logging(level: &str, json: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish()).ok();
    } else {
        tracing::subscriber::set_global_default(builder.with_target(true).finish()).ok();
    }
}

fn cmd_key(args: KeyArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => CompositorConfig::from_path(path)?,
        None => CompositorConfig::default(),
    };
    if args.parallel {
        config.threading.parallel = true;
    }
    if args.threads.is_some() {
        config.threading.threads = args.threads;
    }

    let mut state = CompositorState::from_config(&config)?;
    if let Some(t) = args.tolerance {
        state.set_tolerance(t)?;
    }
    if let Some(s) = args.smoothing {
        state.set_smoothing(s)?;
    }
    if args.width.is_some() || args.height.is_some() {
        state.set_target_size(
            args.width.unwrap_or(config.geometry.width),
            args.height.unwrap_or(config.geometry.height),
        );
    }
    if args.aspect_lock {
        state.set_aspect_locked(true);
    }
    if args.offset_x.is_some() || args.offset_y.is_some() {
        state.set_offset(
            args.offset_x.unwrap_or(config.geometry.offset_x),
            args.offset_y.unwrap_or(config.geometry.offset_y),
        )?;
    }

    let geometry = state.geometry();
    let explicit_size = geometry.canvas_width > 0 && geometry.canvas_height > 0;
    if explicit_size && args.container.is_none() {
        anyhow::bail!(
            "an explicit canvas size ({}x{}) needs --container to bound it",
            geometry.canvas_width,
            geometry.canvas_height
        );
    }

    let paths = collect_inputs(&args.inputs)?;
    if paths.is_empty() {
        anyhow::bail!("no input images found");
    }
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;

    let container = args.container.map(|c| c.0).unwrap_or(Size::ZERO);
    let mut source = ImageSequence::new(paths);
    let mut frame_loop = FrameLoop::with_threading(state, &config.threading)?;
    frame_loop.start();

    let mut written = 0usize;
    loop {
        match frame_loop.tick(&mut source, &container)? {
            TickOutcome::Presented(p) => {
                let out_path = args.out.join(format!("frame_{written:05}.png"));
                let img = frame_loop.surface().frame().clone().into_rgba_image()?;
                img.save_with_format(&out_path, image::ImageFormat::Png)
                    .with_context(|| format!("write png '{}'", out_path.display()))?;
                eprintln!(
                    "wrote {} ({}x{} at {},{}{}; keyed {}, softened {})",
                    out_path.display(),
                    p.geometry.width,
                    p.geometry.height,
                    p.geometry.offset.x,
                    p.geometry.offset.y,
                    if p.geometry.clamped { ", clamped" } else { "" },
                    p.stats.keyed_pixels,
                    p.stats.softened_pixels,
                );
                written += 1;
            }
            TickOutcome::Skipped => continue,
            TickOutcome::Idle => break,
        }
    }

    if let Some(bg) = frame_loop.background() {
        eprintln!("background: rgb({}, {}, {})", bg.r, bg.g, bg.b);
    }
    eprintln!("{written} frame(s) written to {}", args.out.display());
    Ok(())
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    let frame = load_frame(&args.in_path)?;
    let Some(bg) = sample_background(&frame) else {
        anyhow::bail!("image '{}' has no pixels", args.in_path.display());
    };
    let hsv = rgb_to_hsv(bg);
    println!("rgb: {}, {}, {}", bg.r, bg.g, bg.b);
    println!("hex: #{:02x}{:02x}{:02x}", bg.r, bg.g, bg.b);
    println!("hsv: {:.1}, {:.1}, {:.1}", hsv.h, hsv.s, hsv.v);
    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    println!("{}", CompositorConfig::default().to_json_pretty()?);
    Ok(())
}

fn load_frame(path: &Path) -> anyhow::Result<Frame> {
    let img = image::open(path).with_context(|| format!("decode image '{}'", path.display()))?;
    Ok(Frame::from_rgba_image(img.to_rgba8()))
}

fn collect_inputs(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries = Vec::new();
            for entry in std::fs::read_dir(input)
                .with_context(|| format!("read dir '{}'", input.display()))?
            {
                let path = entry?.path();
                if path.is_file() && image::ImageFormat::from_path(&path).is_ok() {
                    entries.push(path);
                }
            }
            entries.sort();
            out.extend(entries);
        } else {
            out.push(input.clone());
        }
    }
    Ok(out)
}

/// Decodes one image per tick. Undecodable files count as stalls, not failures.
struct ImageSequence {
    paths: VecDeque<PathBuf>,
}

impl ImageSequence {
    fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths: paths.into(),
        }
    }
}

impl FrameSource for ImageSequence {
    fn latest_frame(&mut self) -> Option<Frame> {
        let path = self.paths.pop_front()?;
        match load_frame(&path) {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::warn!("skipping '{}': {e:#}", path.display());
                None
            }
        }
    }

    fn is_active(&self) -> bool {
        !self.paths.is_empty()
    }
}
