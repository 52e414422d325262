// Fux Counterpoint Engine: CLI entry point.
//
// Reads a JSON array of jobs, runs them in parallel, and prints one summary
// line per job. A job with a `counterpoint` is validated; a job without one
// gets a counterpoint generated. Ctrl+C cancels running searches, which then
// report as cancelled rather than killing the process mid-write.
//
// Usage:
//   counterpoint <jobs.json> [OPTIONS]
//     --config <PATH>       Engine config JSON (default: built-in)
//     --max-steps <N>       Search step budget per job
//     --report <PATH>       Write all job reports as JSON
//     --midi-dir <DIR>      Write one .mid per generated exercise
//
// Diagnostics go to stderr at the level named by LOG_LEVEL
// (ERROR, WARN, INFO, DEBUG, TRACE; default INFO).

use fux_counterpoint::batch::{Job, JobReport, Outcome, run_batch};
use fux_counterpoint::config::EngineConfig;
use fux_counterpoint::line::format_line;
use fux_counterpoint::midi::write_exercise;
use fux_counterpoint::search::CancelFlag;
use log::{LevelFilter, Log, Metadata, Record, error, info};
use std::path::{Path, PathBuf};

struct Args {
    jobs: PathBuf,
    config: Option<PathBuf>,
    max_steps: Option<u64>,
    report: Option<PathBuf>,
    midi_dir: Option<PathBuf>,
}

/// Minimal stderr logger.
struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logging() {
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    let logger = Box::leak(Box::new(StderrLogger { level }));
    if log::set_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}

fn main() {
    init_logging();
    let args = parse_args();

    let mut config = match &args.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };
    if args.max_steps.is_some() {
        config.max_steps = args.max_steps;
    }

    let jobs = match load_jobs(&args.jobs) {
        Ok(jobs) => jobs,
        Err(e) => {
            eprintln!("Failed to read jobs from {}: {e}", args.jobs.display());
            std::process::exit(1);
        }
    };

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_flag.cancel()) {
        error!("could not install Ctrl+C handler: {e}");
    }

    println!("=== Fux Counterpoint ===");
    println!("Jobs: {} ({})", jobs.len(), args.jobs.display());
    println!();

    let reports = run_batch(&jobs, &config, &cancel);
    for (job, report) in jobs.iter().zip(&reports) {
        print_report(job, report);
    }

    if let Some(path) = &args.report {
        if let Err(e) = write_report(&reports, path) {
            eprintln!("Failed to write report {}: {e}", path.display());
            std::process::exit(1);
        }
        info!("report written to {}", path.display());
    }

    if let Some(dir) = &args.midi_dir {
        if let Err(e) = write_midi_files(&jobs, &reports, dir) {
            eprintln!("Failed to write MIDI to {}: {e}", dir.display());
            std::process::exit(1);
        }
    }

    let failed = reports.iter().filter(|r| !r.succeeded()).count();
    println!();
    println!("{} succeeded, {failed} failed", reports.len() - failed);
    if failed > 0 {
        std::process::exit(2);
    }
}

fn load_jobs(path: &Path) -> Result<Vec<Job>, Box<dyn std::error::Error>> {
    let data = std::fs::read_to_string(path)?;
    let jobs: Vec<Job> = serde_json::from_str(&data)?;
    Ok(jobs)
}

fn write_report(reports: &[JobReport], path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(reports)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn write_midi_files(
    jobs: &[Job],
    reports: &[JobReport],
    dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;
    for (job, report) in jobs.iter().zip(reports) {
        if let Outcome::Generated { counterpoint } = &report.outcome {
            let path = dir.join(format!("{}.mid", job.name));
            write_exercise(&job.cantus, counterpoint, job.position, &path)?;
            info!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn print_report(job: &Job, report: &JobReport) {
    let analysis = match (report.mode, report.species) {
        (Some(mode), Some(species)) => format!("{mode} {species}"),
        _ => "no mode".to_string(),
    };
    println!("{} [{analysis}]", job.name);
    println!("  cantus:       {}", format_line(job.cantus.notes()));
    match &report.outcome {
        Outcome::Generated { counterpoint } => {
            println!("  counterpoint: {} ({})", format_line(counterpoint.notes()), job.position);
        }
        Outcome::Valid => println!("  valid"),
        Outcome::Invalid { violations } => {
            println!("  {} violation(s):", violations.len());
            for violation in violations {
                println!("    {violation}");
            }
        }
        Outcome::Failed { error } => println!("  failed: {error}"),
    }
}

/// Parse command-line arguments. Uses simple `std::env::args()` matching.
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut jobs = None;
    let mut parsed = Args {
        jobs: PathBuf::new(),
        config: None,
        max_steps: None,
        report: None,
        midi_dir: None,
    };
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                parsed.config = Some(require_path(&args, i, "--config"));
            }
            "--max-steps" => {
                i += 1;
                parsed.max_steps =
                    Some(args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                        eprintln!("--max-steps requires a valid number");
                        std::process::exit(1);
                    }));
            }
            "--report" => {
                i += 1;
                parsed.report = Some(require_path(&args, i, "--report"));
            }
            "--midi-dir" => {
                i += 1;
                parsed.midi_dir = Some(require_path(&args, i, "--midi-dir"));
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other if !other.starts_with("--") && jobs.is_none() => {
                jobs = Some(PathBuf::from(other));
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed.jobs = jobs.unwrap_or_else(|| {
        print_usage();
        std::process::exit(1);
    });
    parsed
}

fn require_path(args: &[String], i: usize, flag: &str) -> PathBuf {
    args.get(i).map(PathBuf::from).unwrap_or_else(|| {
        eprintln!("{flag} requires a path");
        std::process::exit(1);
    })
}

fn print_usage() {
    println!("Usage: counterpoint <jobs.json> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <PATH>       Engine config JSON (default: built-in)");
    println!("  --max-steps <N>       Search step budget per job (default: unlimited)");
    println!("  --report <PATH>       Write job reports as JSON");
    println!("  --midi-dir <DIR>      Write one .mid file per generated exercise");
    println!("  --help, -h            Show this help");
}
