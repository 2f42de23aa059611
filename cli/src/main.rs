//! Run the flow calibration pipeline from the command line.

use clap::{value_parser, Arg, ArgAction, Command};
use flow_calibration_core_rs::orchestrator::{Pipeline, PipelineConfig, PipelineReport};
use std::fmt::Write as _;
use std::process::ExitCode;
use tracing::{debug, error};

/// Output format of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

/// Command line arguments parsed from user input
struct Arguments {
    config_path: Option<String>,
    seed: Option<u64>,
    rebounds: Option<u32>,
    format: Format,
    verbose: bool,
}

fn main() -> ExitCode {
    let args = parse_arguments();

    // Initialize logging
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config_path {
        Some(path) => match PipelineConfig::from_path(path) {
            Ok(config) => config,
            Err(e) => {
                error!(path = %path, "failed to load config");
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => PipelineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_master_seed(seed);
    }
    if let Some(rebounds) = args.rebounds {
        config.rebound_goal = Some(rebounds);
    }

    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    debug!(config_hash = pipeline.config_hash(), "running pipeline");
    let report = pipeline.run();

    match args.format {
        Format::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: report serialization failed: {}", e);
                return ExitCode::FAILURE;
            }
        },
        Format::Text => match render_text(&report) {
            Ok(text) => print!("{}", text),
            Err(e) => {
                eprintln!("error: report formatting failed: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }
    ExitCode::SUCCESS
}

/// Parse command line arguments and return structured data
fn parse_arguments() -> Arguments {
    let matches = Command::new("flowcal")
        .about("Calibrate expiry scale factors of a deterministic flow simulation")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .help("JSON configuration file (missing fields take defaults)"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("U64")
                .value_parser(value_parser!(u64))
                .help("Master seed; derives the shape, timeline and flow seeds"),
        )
        .arg(
            Arg::new("rebounds")
                .long("rebounds")
                .short('r')
                .value_name("R")
                .value_parser(value_parser!(u32))
                .help("Rebound goal driving the overlay and read window"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_parser(["text", "json"])
                .default_value("text")
                .help("Report format"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue)
                .help("Log pipeline stages and search probes to stderr"),
        )
        .get_matches();

    let format = match matches.get_one::<String>("format").map(String::as_str) {
        Some("json") => Format::Json,
        _ => Format::Text,
    };

    Arguments {
        config_path: matches.get_one::<String>("config").cloned(),
        seed: matches.get_one::<u64>("seed").copied(),
        rebounds: matches.get_one::<u32>("rebounds").copied(),
        format,
        verbose: matches.get_flag("verbose"),
    }
}

/// Human-readable report
fn render_text(report: &PipelineReport) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_report(&mut out, report)?;
    Ok(out)
}

fn write_report(out: &mut String, report: &PipelineReport) -> std::fmt::Result {
    writeln!(out, "run {}  config {}", report.run_id, report.config_hash)?;

    writeln!(out, "\n=== SHAPE ===")?;
    writeln!(out, "seed                = {:#x}", report.shape.seed)?;
    writeln!(out, "depth r             = {}", report.shape.depth)?;
    writeln!(out, "vertices N          = {}", report.shape.total_vertices)?;
    writeln!(out, "segments            = {}", report.shape.segments)?;
    writeln!(out, "max vertices (r)    = {}", report.shape.theoretical_max_vertices)?;

    writeln!(out, "\n=== TIMELINE ===")?;
    writeln!(out, "seed                = {:#x}", report.timeline.seed)?;
    writeln!(out, "replicas k          = {}", report.timeline.effective_replicas)?;
    writeln!(out, "min gap             = {:.6}", report.timeline.min_gap)?;
    writeln!(out, "tau                 = {:.6}", report.timeline.tau)?;
    match report.ratio.ratio {
        Some(ratio) => writeln!(out, "T = N/k             = {:.6}", ratio)?,
        None => writeln!(out, "T = N/k             = inf")?,
    }
    writeln!(out, "inverse(T)          = {:.6}", report.ratio.inverse)?;
    writeln!(out, "floor(T)            = {}", report.ratio.whole_part)?;

    let baseline = &report.baseline;
    writeln!(out, "\n=== FLOW (baseline) ===")?;
    writeln!(out, "items               = {}", baseline.total_items)?;
    writeln!(out, "passage dimension   = {:.6}", baseline.passage_dimension)?;
    writeln!(out, "throughput          = {:.6}", baseline.throughput)?;
    writeln!(out, "service time        = {:.6}", baseline.service_time)?;
    writeln!(out, "kept                = {}", baseline.kept_count)?;
    writeln!(out, "lost                = {}", baseline.lost_count)?;
    writeln!(out, "kept rate           = {:.6}", baseline.kept_rate)?;
    writeln!(out, "mean finish (kept)  = {:.6}", baseline.mean_finish_time_of_kept)?;
    for item in &baseline.sample {
        writeln!(
            out,
            "  #{:<4} expiry={:.6} wait={:.6} service={:.6} finish={:.6} -> {}",
            item.index,
            item.expiry,
            item.wait,
            item.service,
            item.finish,
            if item.kept { "kept" } else { "lost" }
        )?;
    }

    let targets = &report.targets;
    writeln!(out, "\n=== TARGETS ===")?;
    writeln!(
        out,
        "lost now {} -> target lost {} (retention {}, remainder {})",
        targets.lost_now, targets.target_lost, targets.retention_factor, targets.lost_remainder
    )?;
    writeln!(out, "target kept min     = {} / {}", targets.target_kept_min, baseline.total_items)?;

    let calibration = &report.calibration;
    writeln!(out, "\n=== CALIBRATION ===")?;
    writeln!(out, "kept percentage     = {:.6}", calibration.kept_percentage)?;
    writeln!(
        out,
        "factor (min kept)   = {:.6}{}",
        calibration.factor_for_min_kept,
        unreachable_note(calibration.min_kept_search.reached_ceiling)
    )?;
    writeln!(
        out,
        "factor (target)     = {:.6}{}",
        calibration.factor_for_target,
        unreachable_note(calibration.target_search.reached_ceiling)
    )?;
    writeln!(out, "projected capacity  = {}", calibration.projected_capacity)?;
    writeln!(out, "flow duration       = {:.6}", calibration.flow_duration_metric)?;
    writeln!(out, "simulations         = {}", report.search_evaluations)?;

    let projection = &report.projection;
    let readable = &report.readable;
    writeln!(out, "\n=== PROJECTION (target factor) ===")?;
    writeln!(
        out,
        "kept={} lost={} service_time={:.6} ({:.6} s)",
        projection.kept, projection.lost, projection.service_time, projection.service_time_seconds
    )?;
    writeln!(
        out,
        "read window={:.6} -> readable capacity={} center share={:.2} readable effective={}",
        readable.read_window,
        readable.readable_capacity,
        readable.center_share,
        readable.readable_effective
    )?;

    let overlay = &report.overlay.result;
    writeln!(out, "\n=== OVERLAY ===")?;
    writeln!(
        out,
        "subdivisions={} capacity={} target={} active={} disappeared={}",
        report.overlay_inputs.subdivision_count,
        overlay.capacity,
        overlay.target,
        overlay.active,
        overlay.disappeared
    )?;
    writeln!(
        out,
        "offset step={:.6} recover tag={}",
        report.overlay.offset_step, report.overlay.recover_tag
    )?;
    for slot in &report.overlay.slots {
        writeln!(
            out,
            "  slot {} offset={:.6} persistence={:.6}",
            slot.slot, slot.offset, slot.persistence
        )?;
    }
    Ok(())
}

fn unreachable_note(reached_ceiling: bool) -> &'static str {
    if reached_ceiling {
        "  (target not reachable, upper bound)"
    } else {
        ""
    }
}
