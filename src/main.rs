use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use postflight::checks::{default_assertion_set, AssertionSet};
use postflight::config::{Environment, FileConfig, Settings};
use postflight::engine::{CancelToken, Engine, EngineConfig};
use postflight::error::{HarnessError, HARNESS_FAULT_EXIT_CODE};
use postflight::models::PlanType;
use postflight::probe::HttpTransport;
use postflight::report::render::print_report;
use postflight::validation::clap_email_validator;

const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Colored narrative for a human at a terminal
    Human,
    /// One JSON document on stdout
    Json,
}

#[derive(Parser)]
#[command(name = "postflight")]
#[command(about = "Post-deployment verification for a subscription billing stack", long_about = None)]
#[command(version)]
struct Cli {
    /// Base URL of the data store and functions host
    #[arg(long, env = "POSTFLIGHT_BASE_URL")]
    base_url: Option<String>,

    /// Privileged credential for the data store
    #[arg(long, env = "POSTFLIGHT_SERVICE_KEY", hide_env_values = true)]
    service_key: Option<String>,

    /// Public credential used for function calls
    #[arg(long, env = "POSTFLIGHT_ANON_KEY", hide_env_values = true)]
    anon_key: Option<String>,

    /// URL the frontend bundle is served from
    #[arg(long, env = "POSTFLIGHT_FRONTEND_URL")]
    frontend_url: Option<String>,

    /// Per-call timeout in seconds (1-120, default 20)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Maximum checks in flight at once (1 runs sequentially)
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Email address sent with the subscription-creation probe
    #[arg(long, value_parser = clap_email_validator)]
    probe_email: Option<String>,

    /// Plan requested by the subscription-creation probe
    #[arg(long)]
    plan_type: Option<PlanType>,

    /// Event type posted to the payment webhook
    #[arg(long)]
    webhook_event_type: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Also write the JSON report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Leave out checks that create records or trigger side effects
    #[arg(long)]
    skip_mutating: bool,

    /// Exit non-zero when any check warns
    #[arg(long)]
    fail_on_warn: bool,

    /// Skip the initial reachability check of the data store
    #[arg(long)]
    no_preflight: bool,

    /// TOML file with non-secret settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("{} {e:#}", "harness fault:".red().bold());
            ExitCode::from(fault_exit_code(&e) as u8)
        }
    }
}

fn fault_exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<HarnessError>()
        .map(HarnessError::exit_code)
        .unwrap_or(HARNESS_FAULT_EXIT_CODE)
}

/// How a resolved run is carried out and reported
struct RunOptions {
    preflight: bool,
    fail_on_warn: bool,
    format: OutputFormat,
    output: Option<PathBuf>,
}

/// Logs go to stderr so stdout stays clean for `--format json`
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("POSTFLIGHT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let env = Settings {
        base_url: cli.base_url,
        frontend_url: cli.frontend_url,
        service_key: cli.service_key,
        anon_key: cli.anon_key,
        probe_email: cli.probe_email,
        plan_type: cli.plan_type,
        webhook_event_type: cli.webhook_event_type,
    }
    .with_file(&file)
    .resolve()?;
    let env = Arc::new(env);

    let timeout = Duration::from_secs(
        cli.timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    );
    let mut config = EngineConfig::with_timeout(timeout);
    if let Some(workers) = cli.concurrency.or(file.concurrency) {
        config = config.workers(workers);
    }

    let mut set = default_assertion_set(&env);
    if cli.skip_mutating {
        let (kept, skipped) = set.without_mutating();
        warn!(skipped = %skipped.join(", "), "skipping checks with side effects");
        set = kept;
    }

    let transport = HttpTransport::new(config.probe_timeout)?;
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        if handler_token.is_cancelled() {
            std::process::exit(130);
        }
        eprintln!("{}", "Interrupted, finishing with a partial report...".yellow());
        handler_token.cancel();
    })
    .context("Failed to set Ctrl+C handler")?;

    let mut engine = Engine::new(config, Arc::new(transport)).with_cancel_token(cancel);
    let options = RunOptions {
        preflight: !cli.no_preflight,
        fail_on_warn: cli.fail_on_warn,
        format: cli.format,
        output: cli.output,
    };
    execute(&mut engine, set, env, &options)
}

fn execute(
    engine: &mut Engine,
    set: AssertionSet,
    env: Arc<Environment>,
    options: &RunOptions,
) -> Result<i32> {
    if options.preflight {
        engine.preflight(&env)?;
    }
    info!(base_url = %env.base_url, frontend_url = %env.frontend_url, "verifying deployment");
    let report = engine.run(set, Arc::clone(&env))?;

    let json = report
        .to_json(options.fail_on_warn)
        .context("Failed to serialize report")?;
    if let Some(path) = &options.output {
        fs::write(path, &json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    match options.format {
        OutputFormat::Human => print_report(&report),
        OutputFormat::Json => println!("{json}"),
    }

    Ok(report.exit_code(options.fail_on_warn))
}
