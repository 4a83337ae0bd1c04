use std::time::{Duration, Instant};

use serde_json::json;
use sha2::Digest as _;

use chromakey::{
    CompositorState, Frame, FrameLoop, PipelineThreading, Rgb8, Rgba8, SequenceSource, Size,
    key_frame, resolve_geometry, sample_background, smooth_edges,
};

#[derive(Clone, Debug)]
struct BenchArgs {
    width: u32,
    height: u32,
    frames: u32,
    warmup: u32,
    repeats: u32,
    tolerance: f64,
    smoothing: f64,
    container: Size,
    parallel: bool,
    threads: Option<usize>,
    json: bool,
}

#[derive(Clone, Debug, Default)]
struct RunMetrics {
    sample: Duration,
    key_total: Duration,
    smooth_total: Duration,
    geometry_total: Duration,
    loop_total: Duration,
    wall_total: Duration,
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = parse_args()?;

    if args.width == 0 || args.height == 0 {
        anyhow::bail!("--width/--height must be > 0");
    }
    if args.frames == 0 {
        anyhow::bail!("--frames must be > 0");
    }
    if let Some(n) = args.threads
        && n == 0
    {
        anyhow::bail!("--threads must be >= 1 when set");
    }

    let frames = (0..args.frames)
        .map(|i| synthetic_frame(args.width, args.height, i))
        .collect::<anyhow::Result<Vec<_>>>()?;

    if args.warmup > 0 {
        eprintln!("warmup: {} run(s)", args.warmup);
        for _ in 0..args.warmup {
            let _ = run_once(&args, &frames)?;
        }
    }

    eprintln!(
        "bench: {repeats} run(s) ({profile} build), {n} frames/run at {w}x{h}, tolerance={tol}, smoothing={smooth}, mode={mode}, threads={threads}",
        repeats = args.repeats,
        profile = if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
        n = args.frames,
        w = args.width,
        h = args.height,
        tol = args.tolerance,
        smooth = args.smoothing,
        mode = if args.parallel {
            "parallel"
        } else {
            "sequential"
        },
        threads = args
            .threads
            .map(|n| n.to_string())
            .unwrap_or_else(|| "auto".to_string()),
    );

    let mut runs = Vec::<RunMetrics>::with_capacity(args.repeats as usize);
    let mut digest = String::new();
    for _ in 0..args.repeats {
        let (m, d) = run_once(&args, &frames)?;
        runs.push(m);
        digest = d;
    }

    report_percentiles(&runs, args.frames);
    eprintln!("\nlast surface sha256: {digest}");

    if args.json {
        let wall = runs.iter().map(|m| m.wall_total.as_secs_f64()).collect::<Vec<_>>();
        let report = json!({
            "width": args.width,
            "height": args.height,
            "frames": args.frames,
            "repeats": args.repeats,
            "parallel": args.parallel,
            "wall_secs": wall,
            "surface_sha256": digest,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

/// Flat green backdrop with a moving, anti-aliased disc as the subject.
fn synthetic_frame(width: u32, height: u32, index: u32) -> anyhow::Result<Frame> {
    let mut f = Frame::solid(width, height, Rgba8::new(0, 177, 64, 255))?;
    let r = f64::from(width.min(height)) * 0.3;
    let cx = f64::from(width) * 0.5 + f64::from(index % 17) * 2.0;
    let cy = f64::from(height) * 0.5;
    for y in 0..height {
        for x in 0..width {
            let d = ((f64::from(x) - cx).powi(2) + (f64::from(y) - cy).powi(2)).sqrt();
            if d < r {
                let shade = (200.0 - d).clamp(40.0, 200.0) as u8;
                f.set_pixel(x, y, Rgba8::new(shade, shade / 2, shade / 3, 255));
            }
        }
    }
    Ok(f)
}

fn run_once(args: &BenchArgs, frames: &[Frame]) -> anyhow::Result<(RunMetrics, String)> {
    let mut m = RunMetrics::default();
    let wall = Instant::now();

    // Stage-by-stage timings.
    let t = Instant::now();
    let bg = sample_background(&frames[0]).unwrap_or(Rgb8::new(0, 177, 64));
    m.sample = t.elapsed();

    let mut state = CompositorState::default();
    state.set_tolerance(args.tolerance)?;
    state.set_smoothing(args.smoothing)?;

    for frame in frames {
        let mut f = frame.clone();
        let t = Instant::now();
        key_frame(&mut f, bg, args.tolerance, args.parallel);
        m.key_total += t.elapsed();

        let t = Instant::now();
        let (smoothed, _) = smooth_edges(&f, args.smoothing, args.parallel);
        m.smooth_total += t.elapsed();

        let t = Instant::now();
        let _ = resolve_geometry(
            state.geometry(),
            smoothed.size(),
            args.container,
            state.max_container_fraction(),
        );
        m.geometry_total += t.elapsed();
    }

    // Whole loop, including presentation.
    let threading = PipelineThreading {
        parallel: args.parallel,
        threads: args.threads,
    };
    let mut frame_loop = FrameLoop::with_threading(state, &threading)?;
    frame_loop.start();
    let mut source = SequenceSource::new(frames.iter().cloned());
    let t = Instant::now();
    frame_loop.run(&mut source, &args.container, &mut || true, |_, _| {})?;
    m.loop_total = t.elapsed();

    let digest = sha256_hex(frame_loop.surface().frame().as_bytes());
    m.wall_total = wall.elapsed();
    Ok((m, digest))
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", sha2::Sha256::digest(bytes))
}

fn parse_args() -> anyhow::Result<BenchArgs> {
    let mut args = std::env::args().skip(1);

    let mut out = BenchArgs {
        width: 1280,
        height: 720,
        frames: 60,
        warmup: 1,
        repeats: 10,
        tolerance: 30.0,
        smoothing: 15.0,
        container: Size::new(1920.0, 1080.0),
        parallel: false,
        threads: None,
        json: false,
    };

    while let Some(a) = args.next() {
        match a.as_str() {
            "--width" => out.width = parse_num(args.next(), "--width")?,
            "--height" => out.height = parse_num(args.next(), "--height")?,
            "--frames" => out.frames = parse_num(args.next(), "--frames")?,
            "--warmup" => out.warmup = parse_num(args.next(), "--warmup")?,
            "--repeats" => out.repeats = parse_num(args.next(), "--repeats")?,
            "--tolerance" => out.tolerance = parse_num(args.next(), "--tolerance")?,
            "--smoothing" => out.smoothing = parse_num(args.next(), "--smoothing")?,
            "--container-width" => {
                out.container.width = parse_num(args.next(), "--container-width")?
            }
            "--container-height" => {
                out.container.height = parse_num(args.next(), "--container-height")?
            }
            "--parallel" => out.parallel = true,
            "--threads" => out.threads = Some(parse_num(args.next(), "--threads")?),
            "--json" => out.json = true,
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => anyhow::bail!("unknown arg '{a}' (try --help)"),
        }
    }

    Ok(out)
}

fn parse_num<T>(v: Option<String>, flag: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let v = v.ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))?;
    v.parse::<T>()
        .map_err(|e| anyhow::anyhow!("invalid value for {flag} ('{v}'): {e}"))
}

fn print_help() {
    eprintln!(
        r#"chromakey-bench

Keys a synthetic green-screen sequence repeatedly and reports p50/p90/p99 per stage.

Usage:
  cargo run -q -p chromakey-bench --release
  cargo run -q -p chromakey-bench --release -- --frames 120 --width 1920 --height 1080
  cargo run -q -p chromakey-bench --release -- --parallel --threads 4 --json

Args:
  --width N              (default 1280)
  --height N             (default 720)
  --frames N             (default 60)
  --warmup N             (default 1)
  --repeats N            (default 10)
  --tolerance T          (default 30)
  --smoothing S          (default 15; 0 disables)
  --container-width W    (default 1920)
  --container-height H   (default 1080)
  --parallel             fan keying/smoothing out on rayon
  --threads N            worker threads (parallel only)
  --json                 print a JSON report on stdout
"#
    );
}

/// Nearest-rank percentiles over one stage's per-run totals.
#[derive(Clone, Copy, Debug)]
struct StageSpread {
    p50: Duration,
    p90: Duration,
    p99: Duration,
}

impl StageSpread {
    fn of(mut samples: Vec<Duration>) -> Self {
        samples.sort_unstable();
        let rank = |q: f64| -> Duration {
            if samples.is_empty() {
                return Duration::ZERO;
            }
            let idx = ((q * samples.len() as f64).ceil() as usize).clamp(1, samples.len());
            samples[idx - 1]
        };
        Self {
            p50: rank(0.50),
            p90: rank(0.90),
            p99: rank(0.99),
        }
    }
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn report_percentiles(runs: &[RunMetrics], frames: u32) {
    let stages: [(&str, fn(&RunMetrics) -> Duration); 6] = [
        ("sample", |m| m.sample),
        ("key", |m| m.key_total),
        ("smooth", |m| m.smooth_total),
        ("geometry", |m| m.geometry_total),
        ("loop", |m| m.loop_total),
        ("wall", |m| m.wall_total),
    ];

    eprintln!("\nper-run totals across {} run(s):", runs.len());
    let mut loop_p50 = Duration::ZERO;
    for (name, get) in stages {
        let spread = StageSpread::of(runs.iter().map(get).collect());
        if name == "loop" {
            loop_p50 = spread.p50;
        }
        eprintln!(
            "  {name:9} p50 {:>9.3}ms   p90 {:>9.3}ms   p99 {:>9.3}ms",
            ms(spread.p50),
            ms(spread.p90),
            ms(spread.p99),
        );
    }
    eprintln!(
        "  loop p50 per frame: {:.3}ms",
        ms(loop_p50) / f64::from(frames.max(1))
    );
}
