use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "preload", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the flattened preload queue of a manifest.
    List(ListArgs),
    /// Preload a project's manifest through a simulated frame loop.
    Run(RunArgs),
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// Manifest JSON file.
    #[arg(long)]
    manifest: PathBuf,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Project root holding `data/` and `img/`.
    #[arg(long, default_value = ".")]
    project: PathBuf,

    /// Options JSON file; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Manifest document name inside `data/` (without `.json`).
    #[arg(long)]
    manifest_name: Option<String>,

    /// Ticks to wait after each settled fetch.
    #[arg(long)]
    interval: Option<u32>,

    /// Do not wait for decodes; wait the interval only.
    #[arg(long, default_value_t = false)]
    no_await_decode: bool,

    /// Log every dispatch.
    #[arg(long, default_value_t = false)]
    log_dispatches: bool,

    /// Where image decodes run.
    #[arg(long, value_enum, default_value_t = DecodeChoice::Background)]
    decode: DecodeChoice,

    /// Give up after this many ticks.
    #[arg(long, default_value_t = 100_000)]
    max_ticks: u64,

    /// Simulated frame duration in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecodeChoice {
    Inline,
    Background,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::List(args) => cmd_list(args),
        Command::Run(args) => cmd_run(args, cli.verbose),
    }
}

fn init_tracing(verbose: u8, log_dispatches: bool) {
    let level = match verbose {
        0 if log_dispatches => tracing::Level::INFO,
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let manifest = parallel_preload::Manifest::from_path(&args.manifest)
        .with_context(|| format!("load manifest '{}'", args.manifest.display()))?;
    for item in manifest.into_queue().iter() {
        let known = parallel_preload::Category::from_key(item.category()).is_some();
        if known {
            println!("{}/{}", item.category(), item.name());
        } else {
            println!("{}/{} (skipped: unknown category)", item.category(), item.name());
        }
    }
    Ok(())
}

fn load_opts(args: &RunArgs) -> anyhow::Result<parallel_preload::PreloadOpts> {
    let mut opts = match &args.config {
        Some(path) => parallel_preload::PreloadOpts::from_path(path)?,
        None => parallel_preload::PreloadOpts::default(),
    };
    if let Some(name) = &args.manifest_name {
        opts.manifest_resource_name = name.clone();
    }
    if let Some(interval) = args.interval {
        opts.load_interval_ticks = interval;
    }
    if args.no_await_decode {
        opts.await_decode = false;
    }
    if args.log_dispatches {
        opts.log_dispatches = true;
    }
    opts.validate()?;
    Ok(opts)
}

fn cmd_run(args: RunArgs, verbose: u8) -> anyhow::Result<()> {
    let opts = load_opts(&args)?;
    init_tracing(verbose, opts.log_dispatches);
    let mode = match args.decode {
        DecodeChoice::Inline => parallel_preload::DecodeMode::Inline,
        DecodeChoice::Background => parallel_preload::DecodeMode::Background,
    };
    let manifest_path = opts.manifest_path(args.project.join(parallel_preload::DATA_DIR));
    if !manifest_path.is_file() {
        eprintln!(
            "manifest '{}' not found; nothing to preload",
            manifest_path.display()
        );
    }

    let session = Rc::new(RefCell::new(parallel_preload::PreloadSession::open(
        &args.project,
        opts,
        mode,
    )?));
    let mut frame_loop = parallel_preload::FrameLoop::new();
    let step = Rc::clone(&session);
    frame_loop.add_step(move || step.borrow_mut().tick());

    let frame = Duration::from_millis(args.frame_ms);
    while !session.borrow().is_complete() {
        if frame_loop.frames() >= args.max_ticks {
            let s = session.borrow();
            let waiting = s
                .preloader()
                .awaiting()
                .map(|w| w.label().to_string())
                .unwrap_or_else(|| "-".to_string());
            anyhow::bail!(
                "preload did not finish within {} ticks ({} items left, waiting on {waiting})",
                args.max_ticks,
                s.preloader().remaining()
            );
        }
        frame_loop.tick()?;
        session.borrow().wait_for_io(frame);
    }

    report(&session.borrow(), frame_loop.frames(), &args.project);
    Ok(())
}

fn report(session: &parallel_preload::PreloadSession, frames: u64, project: &Path) {
    let st = session.stats();
    let cache = session.cache().borrow().stats();
    println!("project:    {}", project.display());
    println!("frames:     {frames}");
    println!("dispatched: {}", st.dispatched);
    println!("skipped:    {}", st.skipped);
    println!("ready_now:  {}", st.ready_now);
    println!("pending:    {}", st.pending);
    println!("decoded:    {}", cache.decoded);
    println!("failed:     {}", cache.failed);
}
