use anyhow::{anyhow, bail, Context, Result};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::env;
use std::process;
use track_forge::cli::CliOverrides;
use track_forge::document::TrackDocument;
use track_forge::{CurveKind, TemplateLibrary, Track};

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        };
        eprintln!("[{tag}] {}", record.args());
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:?}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = CliOverrides::parse(env::args().skip(1))?;
    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }

    let mut positional = cli.positional.iter();
    let Some(command) = positional.next() else {
        print_usage();
        return Ok(());
    };
    match command.as_str() {
        "info" => {
            let track_path =
                positional.next().ok_or_else(|| anyhow!("info requires a path: track_tool info <track.json>"))?;
            cmd_info(&cli, track_path)
        }
        "build" => {
            let track_path = positional
                .next()
                .ok_or_else(|| anyhow!("build requires arguments: track_tool build <track.json> <templates.json>"))?;
            let manifest_path = positional.next().ok_or_else(|| anyhow!("build missing template manifest argument"))?;
            cmd_build(&cli, track_path, manifest_path)
        }
        "validate" => {
            let track_path = positional
                .next()
                .ok_or_else(|| anyhow!("validate requires a path: track_tool validate <track.json>"))?;
            cmd_validate(&cli, track_path)
        }
        "help" => {
            print_usage();
            Ok(())
        }
        other => Err(anyhow!("unknown command '{other}'")),
    }
}

fn print_usage() {
    eprintln!(
        "Track Tool
Usage:
  track_tool info <track.json>
  track_tool build <track.json> <templates.json>
  track_tool validate <track.json>
Flags:
  --segment-length <f32>  override the segment length
  --overrun <extrapolate|loop>
  --bank <linear|bezier>
  --verbose               log rebuild progress"
    );
}

fn load_track(cli: &CliOverrides, path: &str) -> Result<Track> {
    let mut document = TrackDocument::load_from_path(path)?;
    let overrides = cli.config_overrides();
    if !overrides.is_empty() {
        log::debug!("applying overrides: {}", overrides.applied_fields().join(", "));
        document.config.apply_overrides(&overrides);
    }
    document.config.validate().with_context(|| format!("Invalid config in {path}"))?;
    Ok(Track::from_document(&document))
}

fn cmd_info(cli: &CliOverrides, path: &str) -> Result<()> {
    let mut track = load_track(cli, path)?;
    track.update_segments()?;
    let segments = track.segment_path();
    println!("Track: {path}");
    println!("  curves: {}", track.curve_count());
    println!("  segments: {} ({} units each)", segments.len(), segments.segment_length());
    println!("  length: {:.3}", segments.length());
    for (index, info) in track.runtime_info().iter().enumerate() {
        let p = info.respawn_position;
        println!(
            "  curve {index}: z {:.3}, respawn ({:.2}, {:.2}, {:.2}){}{}",
            info.z_offset,
            p.x,
            p.y,
            p.z,
            if info.is_jump { ", jump" } else { "" },
            if info.can_respawn { "" } else { ", no respawn" },
        );
    }
    Ok(())
}

fn cmd_build(cli: &CliOverrides, path: &str, manifest: &str) -> Result<()> {
    let mut track = load_track(cli, path)?;
    let templates = TemplateLibrary::load_manifest(manifest)?;
    track.set_templates(templates);
    let report = track.rebuild_all()?;
    for index in report.range.clone() {
        let Some(geometry) = track.geometry(index) else {
            continue;
        };
        let vertices: usize = geometry.surfaces.iter().map(|s| s.mesh.vertices.len()).sum();
        println!(
            "curve {index}: {} surfaces ({vertices} vertices), {} placements",
            geometry.surfaces.len(),
            geometry.placements.len()
        );
    }
    if report.diagnostics.is_empty() {
        println!("Build OK");
    } else {
        println!("{} diagnostics:", report.diagnostics.len());
        for diagnostic in &report.diagnostics {
            match diagnostic.curve {
                Some(curve) => println!("  curve {curve}: {}", diagnostic.message),
                None => println!("  {}", diagnostic.message),
            }
        }
    }
    Ok(())
}

fn cmd_validate(cli: &CliOverrides, path: &str) -> Result<()> {
    let track = load_track(cli, path)?;
    let mut problems = Vec::new();
    for curve in track.curves() {
        let values = [curve.length, curve.angles.x, curve.angles.y, curve.angles.z];
        if values.iter().any(|v| !v.is_finite()) {
            problems.push(format!("curve {} has non-finite values", curve.index));
        }
        match curve.kind {
            CurveKind::Arc if curve.length < 0.0 => {
                problems.push(format!("curve {} has negative length {}", curve.index, curve.length));
            }
            CurveKind::Bezier if curve.start_control_distance < 0.0 || curve.end_control_distance < 0.0 => {
                problems.push(format!("curve {} has negative control distances", curve.index));
            }
            _ => {}
        }
    }
    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("  {problem}");
        }
        bail!("{} problems found in {path}", problems.len());
    }
    println!("{path}: {} curves OK", track.curve_count());
    Ok(())
}
