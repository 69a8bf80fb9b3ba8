// ============================================================================
// InkFill CLI: headless colouring via command-line arguments
// ============================================================================
//
// Usage examples:
//   inkfill -i outline.png --fill 50,50 --color '#ff0000' -o colored.png
//   inkfill -i outline.png --fill 10,10 --fill 80,40 --stroke '5,5;60,5' -r 3
//   inkfill -i outline.png --fill 50,50 --erase '40,40;60,60' --project work.ifp
//   inkfill -i work.ifp --undo 1 --data-url
//
// Operations run in a fixed order: fills, brush strokes, eraser strokes,
// then undos. Everything runs synchronously on the current thread.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::assets::EngineSettings;
use crate::canvas::{Point, parse_hex_color};
use crate::io;
use crate::ops::brush::BrushMode;
use crate::project::ColoringSession;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// InkFill headless colouring tool.
///
/// Load a line-art template, apply fills and strokes, and save the result.
#[derive(Parser, Debug)]
#[command(
    name = "inkfill",
    about = "InkFill headless line-art colouring",
    long_about = "Fill enclosed regions of line art, paint or erase freehand strokes,\n\
                  and save the result as PNG, a data URL, or an .ifp project.\n\n\
                  Example:\n  \
                  inkfill -i outline.png --fill 50,50 --color '#ff0000' -o colored.png"
)]
pub struct CliArgs {
    /// Template image (PNG, JPEG, BMP, WEBP), a file holding a data URL,
    /// or an .ifp project saved earlier.
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output PNG path. Defaults to `<stem>_colored.png` next to the input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Flood-fill seed point `X,Y`. Repeatable.
    #[arg(long, value_name = "X,Y")]
    pub fill: Vec<String>,

    /// Brush stroke as `X,Y;X,Y;...`. Repeatable.
    #[arg(long, value_name = "PATH")]
    pub stroke: Vec<String>,

    /// Eraser stroke as `X,Y;X,Y;...`. Repeatable.
    #[arg(long, value_name = "PATH")]
    pub erase: Vec<String>,

    /// Paint colour for fills and strokes (`#RRGGBB`).
    #[arg(short, long, default_value = "#ff0000", value_name = "HEX")]
    pub color: String,

    /// Brush / eraser radius in pixels (default from settings).
    #[arg(short, long, value_name = "PX")]
    pub radius: Option<u32>,

    /// Flood-fill per-channel tolerance (default from settings).
    #[arg(short, long, value_name = "0-255")]
    pub tolerance: Option<u8>,

    /// Undo this many steps after all operations.
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub undo: usize,

    /// Also save an .ifp project (template + coloured image).
    #[arg(long, value_name = "FILE.ifp")]
    pub project: Option<PathBuf>,

    /// Print the result as a `data:image/png;base64,` URL on stdout.
    #[arg(long)]
    pub data_url: bool,

    /// Settings file to use instead of the user config.
    #[arg(long, value_name = "FILE.cfg")]
    pub settings: Option<PathBuf>,

    /// Write the session log here.
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Print per-operation results and timing, and echo the log to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the CLI and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    match &args.log {
        Some(path) => crate::logger::init_at(path),
        None => crate::logger::init(),
    };
    crate::logger::set_echo(args.verbose);

    match run_session(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            crate::log_err!("cli: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_session(args: &CliArgs) -> Result<(), String> {
    let start = Instant::now();

    let mut settings = match &args.settings {
        Some(p) => EngineSettings::load_from(p),
        None => EngineSettings::load(),
    };
    if let Some(t) = args.tolerance {
        settings.fill_tolerance = t;
    }
    let radius = args.radius.unwrap_or(settings.brush_radius);
    let color = parse_hex_color(&args.color)
        .ok_or_else(|| format!("invalid colour '{}'", args.color))?;

    let fills = args
        .fill
        .iter()
        .map(|s| parse_point(s))
        .collect::<Result<Vec<_>, _>>()?;
    let strokes = args
        .stroke
        .iter()
        .map(|s| parse_path(s))
        .collect::<Result<Vec<_>, _>>()?;
    let erases = args
        .erase
        .iter()
        .map(|s| parse_path(s))
        .collect::<Result<Vec<_>, _>>()?;

    // -- Step 1: Load ----------------------------------------------------
    let mut session = load_session(&args.input, settings)?;

    // -- Step 2: Apply operations ----------------------------------------
    for p in &fills {
        let n = session.flood_fill(p.x, p.y, color);
        if args.verbose {
            println!("  fill ({}, {}): {} px", p.x, p.y, n);
        }
    }
    for path in &strokes {
        apply_stroke(&mut session, path, BrushMode::Paint(color), radius);
    }
    for path in &erases {
        apply_stroke(&mut session, path, BrushMode::Erase, radius);
    }
    for _ in 0..args.undo {
        if !session.undo() {
            break;
        }
    }

    // -- Step 3: Save ----------------------------------------------------
    let png = session.current_image();
    let output = build_output_path(&args.input, args.output.as_deref());
    std::fs::write(&output, &png)
        .map_err(|e| format!("could not write '{}': {}", output.display(), e))?;

    if let Some(project) = &args.project {
        session
            .save_project(project)
            .map_err(|e| format!("project save failed: {}", e))?;
    }

    if args.data_url {
        println!("{}", io::to_data_url(&png));
    }

    if args.verbose {
        println!(
            "  → {} ({:.0}ms)",
            output.display(),
            start.elapsed().as_secs_f64() * 1000.0
        );
    }
    Ok(())
}

/// Open an .ifp project or decode an image template. Undecodable templates
/// still yield a usable session (with the fallback outline) plus a warning.
fn load_session(input: &Path, settings: EngineSettings) -> Result<ColoringSession, String> {
    let is_project = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ifp"));

    if is_project {
        let project = io::read_project(input).map_err(|e| format!("load failed: {}", e))?;
        return ColoringSession::from_project(settings, project)
            .map_err(|e| format!("load failed: {}", e));
    }

    let bytes = std::fs::read(input)
        .map_err(|e| format!("could not read '{}': {}", input.display(), e))?;
    let mut session = ColoringSession::new(settings);
    if let Err(e) = session.load_template(&bytes) {
        eprintln!("warning: {}; using a generated outline instead", e);
    }
    Ok(session)
}

fn apply_stroke(session: &mut ColoringSession, path: &[Point], mode: BrushMode, radius: u32) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    session.begin_stroke(first.x, first.y, mode, radius);
    for p in rest {
        session.extend_stroke(p.x, p.y);
    }
    session.end_stroke();
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse `X,Y` (whitespace tolerated).
pub fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", s))?;
    let x = x.trim().parse::<i32>().map_err(|e| format!("bad x in '{}': {}", s, e))?;
    let y = y.trim().parse::<i32>().map_err(|e| format!("bad y in '{}': {}", s, e))?;
    Ok(Point::new(x, y))
}

/// Parse `X,Y;X,Y;...` into a non-empty point list.
pub fn parse_path(s: &str) -> Result<Vec<Point>, String> {
    let points = s
        .split(';')
        .filter(|p| !p.trim().is_empty())
        .map(parse_point)
        .collect::<Result<Vec<_>, _>>()?;
    if points.is_empty() {
        return Err(format!("empty stroke '{}'", s));
    }
    Ok(points)
}

/// Explicit `--output`, else `<stem>_colored.png` beside the input.
fn build_output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    if let Some(out) = output {
        return out.to_path_buf();
    }
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{}_colored.png", stem))
}
