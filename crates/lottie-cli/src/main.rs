//! # lottie-inspect
//!
//! Loads a Lottie document with `lottie-runtime` and reports on it without
//! rendering pixels.
//!
//! ## Commands
//! - `info`: document metadata, markers, assets and the layer tree
//! - `play`: run the playback state machine headless and log its events
//! - `frame`: evaluate one frame and summarize the render tree

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lottie_runtime::layer::{Layer, LayerContent};
use lottie_runtime::renderer::{NodeContent, RenderNode};
use lottie_runtime::{AnimationEvent, AnimationGroup, Composition, PlayOptions};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "lottie-inspect")]
#[command(about = "Inspect and dry-run Lottie animations")]
#[command(version)]
struct Cli {
    /// Log runtime internals at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show document metadata and the layer tree
    Info {
        /// Path to the Lottie JSON file
        file: PathBuf,
    },

    /// Run playback without rendering and print its events
    Play {
        file: PathBuf,

        /// Playback options as inline JSON or a path to a JSON file
        #[arg(short, long)]
        options: Option<String>,

        /// Wall-clock seconds to simulate
        #[arg(short, long, default_value_t = 5.0)]
        seconds: f32,

        /// Ticks per simulated second
        #[arg(long, default_value_t = 60.0)]
        tick_rate: f32,

        /// Print a playhead summary every N ticks (0 to disable)
        #[arg(long, default_value_t = 0)]
        every: usize,

        /// Treat pending image assets as loaded
        #[arg(long)]
        skip_assets: bool,
    },

    /// Evaluate a single frame and print the render tree
    Frame {
        file: PathBuf,

        /// Document frame to evaluate
        #[arg(short, long, default_value_t = 0.0)]
        frame: f32,

        /// Segment to clamp into: a marker name or `begin,end`
        #[arg(long)]
        segment: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "lottie_runtime=debug,lottie_inspect=debug"
    } else {
        "lottie_runtime=warn,lottie_inspect=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Info { file } => cmd_info(&file),
        Commands::Play {
            file,
            options,
            seconds,
            tick_rate,
            every,
            skip_assets,
        } => cmd_play(
            &file,
            options.as_deref(),
            seconds,
            tick_rate,
            every,
            skip_assets,
        ),
        Commands::Frame {
            file,
            frame,
            segment,
        } => cmd_frame(&file, frame, segment.as_deref()),
    }
}

fn load(file: &Path, options: PlayOptions) -> Result<AnimationGroup> {
    let text =
        fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    AnimationGroup::from_json(&text, options)
        .with_context(|| format!("loading {}", file.display()))
}

/// Inline JSON when it looks like an object, a file path otherwise.
fn parse_options(source: Option<&str>) -> Result<PlayOptions> {
    let Some(source) = source else {
        return Ok(PlayOptions::default());
    };
    let text = if source.trim_start().starts_with('{') {
        source.to_string()
    } else {
        fs::read_to_string(source).with_context(|| format!("reading options file {source}"))?
    };
    serde_json::from_str(&text).context("parsing playback options")
}

fn parse_segment(source: &str) -> Result<lottie_runtime::SegmentSpec> {
    match source.split_once(',') {
        Some((begin, end)) => {
            let begin: f32 = begin.trim().parse().context("segment begin")?;
            let end: f32 = end.trim().parse().context("segment end")?;
            Ok([begin, end].into())
        }
        None if source.is_empty() => bail!("empty segment"),
        None => Ok(source.into()),
    }
}

fn cmd_info(file: &Path) -> Result<()> {
    let group = load(
        file,
        PlayOptions {
            autoplay: false,
            ..Default::default()
        },
    )?;
    let doc = group.document();

    println!("Document: {}", doc.nm.as_deref().unwrap_or("(unnamed)"));
    println!("=========");
    println!("  version:    {}", doc.v.as_deref().unwrap_or("?"));
    println!("  size:       {} x {}", doc.w, doc.h);
    println!("  frames:     {} .. {} @ {} fps", doc.ip, doc.op, doc.fr);
    println!("  duration:   {:.2}s", doc.duration() / doc.fr);
    println!("  3d:         {}", doc.ddd == Some(1));

    if !doc.markers.is_empty() {
        println!("\nMarkers:");
        for marker in &doc.markers {
            println!(
                "  • {} at {} for {}",
                marker.cm.as_deref().unwrap_or("?"),
                marker.tm.unwrap_or(0.0),
                marker.dr.unwrap_or(0.0)
            );
        }
    }

    let assets = group.assets();
    if assets.total() > 0 {
        println!(
            "\nImages ({} received, {} pending, {} failed):",
            assets.received(),
            assets.pending(),
            assets.failed()
        );
        for image in assets.images() {
            println!(
                "  • {} {}x{} {:?} {}",
                image.id,
                image.width,
                image.height,
                image.state,
                image.path.as_deref().unwrap_or("(embedded)")
            );
        }
    }

    println!("\nLayers (top first):");
    print_layers(group.composition(), 1);
    Ok(())
}

fn print_layers(composition: &Composition, depth: usize) {
    let indent = "  ".repeat(depth);
    for layer in composition.layers() {
        let timing = layer.timing();
        println!(
            "{indent}• {} [{}] {}..{}{}",
            layer.name().unwrap_or("(unnamed)"),
            layer_kind(layer),
            timing.in_point,
            timing.out_point,
            layer
                .parent()
                .map(|p| format!(" parent={p}"))
                .unwrap_or_default()
        );
        if let Some(shapes) = layer.shapes() {
            for repeater in shapes.repeaters() {
                println!(
                    "{indent}    repeater {} ({} copies built)",
                    repeater.name.as_deref().unwrap_or("(unnamed)"),
                    repeater.built
                );
            }
        }
        if let Some(inner) = layer.precomp() {
            print_layers(inner, depth + 1);
        }
    }
}

fn layer_kind(layer: &Layer) -> &'static str {
    match layer.content() {
        LayerContent::Shapes(_) => "shape",
        LayerContent::Precomp { .. } => "precomp",
        LayerContent::Image { .. } => "image",
        LayerContent::Solid { .. } => "solid",
        LayerContent::Empty => "empty",
    }
}

fn cmd_play(
    file: &Path,
    options: Option<&str>,
    seconds: f32,
    tick_rate: f32,
    every: usize,
    skip_assets: bool,
) -> Result<()> {
    if !(tick_rate.is_finite() && tick_rate > 0.0) {
        bail!("tick rate must be positive, got {tick_rate}");
    }
    let options = parse_options(options)?;
    let mut group = load(file, options)?;
    if skip_assets {
        group.assets_mut().skip_pending();
    }
    let (begin, end) = group.segment();
    info!(begin, end, state = ?group.state(), "starting playback");

    let dt = 1.0 / tick_rate;
    let ticks = (seconds * tick_rate).ceil().max(0.0) as usize;
    let mut loops = 0;
    let mut completions = 0;
    let mut changed_ticks = 0;
    for tick in 0..ticks {
        if group.tick(dt) {
            changed_ticks += 1;
        }
        for event in group.drain_events() {
            match event {
                AnimationEvent::EnterFrame(_) => {}
                AnimationEvent::LoopComplete => {
                    loops += 1;
                    println!(
                        "[{:>6.3}s] loop complete (frame {:.2})",
                        tick as f32 * dt,
                        group.current_frame()
                    );
                }
                AnimationEvent::Complete => {
                    completions += 1;
                    println!(
                        "[{:>6.3}s] complete (frame {:.2})",
                        tick as f32 * dt,
                        group.current_frame()
                    );
                }
                AnimationEvent::SegmentStart { begin, end } => {
                    println!("[{:>6.3}s] segment {begin} -> {end}", tick as f32 * dt);
                }
            }
        }
        if every > 0 && tick % every == 0 {
            println!(
                "[{:>6.3}s] frame {:>8.2} dir {:>2} state {:?}",
                tick as f32 * dt,
                group.current_frame(),
                group.direction(),
                group.state()
            );
        }
    }

    println!("\nSummary:");
    println!("  ticks:        {ticks} ({changed_ticks} changed the tree)");
    println!("  loops:        {loops}");
    println!("  completions:  {completions}");
    println!("  final frame:  {:.2}", group.current_frame());
    println!("  state:        {:?}", group.state());
    Ok(())
}

fn cmd_frame(file: &Path, frame: f32, segment: Option<&str>) -> Result<()> {
    let mut options = PlayOptions {
        autoplay: false,
        ..Default::default()
    };
    if let Some(segment) = segment {
        options.segment = Some(parse_segment(segment)?);
    }
    let mut group = load(file, options)?;
    group.go_to_frame(frame);
    let tree = group.render_tree();

    println!("Frame {:.2} ({} x {})", tree.frame, tree.width, tree.height);
    for child in tree.root.children().iter().rev() {
        print_node(child, 1);
    }
    Ok(())
}

fn print_node(node: &RenderNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let origin = node.matrix.transform_point2(Default::default());
    let summary = match &node.content {
        NodeContent::Group(children) => format!("group of {}", children.len()),
        NodeContent::Shapes(draws) => {
            let paths: usize = draws.iter().map(|d| d.paths.len()).sum();
            format!("{} draws, {paths} paths", draws.len())
        }
        NodeContent::Image(image) => format!(
            "image {} ({})",
            image.asset_id,
            if image.data.is_some() { "loaded" } else { "no data" }
        ),
        NodeContent::Solid { width, height, .. } => format!("solid {width}x{height}"),
        NodeContent::Empty => "empty".to_string(),
    };
    println!(
        "{indent}• {} {}{} at ({:.1}, {:.1}) opacity {:.2}{}",
        node.name.as_deref().unwrap_or("(unnamed)"),
        summary,
        if node.visible { "" } else { " [hidden]" },
        origin.x,
        origin.y,
        node.opacity,
        if node.masks.is_empty() {
            String::new()
        } else {
            format!(" masks {}", node.masks.len())
        }
    );
    // top first, like `info`
    for child in node.children().iter().rev() {
        print_node(child, depth + 1);
    }
}
