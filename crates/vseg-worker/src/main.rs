//! Segmentation worker binary.
//!
//! ```text
//! vseg-worker [--config <config.json>] <job.json> <result.json>
//! vseg-worker --schema
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vseg_engine::EngineConfig;
use vseg_worker::{JobResult, JobRunner};

/// Exit status for a run suspended at its deadline (EX_TEMPFAIL).
const EXIT_SUSPENDED: i32 = 75;

enum Command {
    Schema,
    Run {
        config: Option<PathBuf>,
        input: PathBuf,
        output: PathBuf,
    },
}

fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {:#}", e);
        std::process::exit(1);
    }

    match run() {
        Ok(Some(JobResult::Suspended { .. })) => std::process::exit(EXIT_SUSPENDED),
        Ok(_) => {}
        Err(e) => {
            error!("Worker failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vseg_engine=info".parse()?)
        .add_directive("vseg_worker=info".parse()?);

    // Logs go to stderr so `--schema` output stays clean.
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Command> {
    let mut config = None;
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--schema" => return Ok(Command::Schema),
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => bail!("unknown flag {}", flag),
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    match <[PathBuf; 2]>::try_from(positional) {
        Ok([input, output]) => Ok(Command::Run {
            config,
            input,
            output,
        }),
        Err(_) => bail!("usage: vseg-worker [--config <config.json>] <job.json> <result.json>"),
    }
}

fn run() -> anyhow::Result<Option<JobResult>> {
    match parse_args(std::env::args().skip(1))? {
        Command::Schema => {
            let schema = serde_json::to_string_pretty(&vseg_models::output_schema())?;
            println!("{}", schema);
            Ok(None)
        }
        Command::Run {
            config,
            input,
            output,
        } => {
            let runner = match config {
                Some(path) => {
                    let json = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading config {}", path.display()))?;
                    let config = EngineConfig::from_json(&json)
                        .with_context(|| format!("parsing config {}", path.display()))?;
                    JobRunner::new(config)
                }
                None => JobRunner::from_env(),
            };
            info!(config = ?runner.config(), "Starting vseg-worker");

            let result = runner
                .run_file(&input, &output)
                .with_context(|| format!("running job {}", input.display()))?;
            info!(output = %output.display(), complete = result.is_complete(), "Result written");
            Ok(Some(result))
        }
    }
}
