//! Application driver.
//! Merges config (defaults < XML < CLI), initializes logging, installs the
//! interrupt handler, validates paths and runs (or plans) the sort.

use anyhow::{Context, Result, anyhow, bail};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, error};
use tracing_appender::non_blocking::WorkerGuard;

use sortdir::cli::Args;
use sortdir::config::{create_template_config, load_config_from_xml};
use sortdir::output as out;
use sortdir::{
    Config, ShutdownFlag, SortError, Sorter, config_path_from_env, default_config_path,
    validate_and_normalize,
};

use crate::logging::init_tracing;

fn active_config_path() -> Option<PathBuf> {
    config_path_from_env().or_else(default_config_path)
}

fn print_config_location() {
    if let Some(p) = config_path_from_env() {
        out::print_info(&format!("Using SORTDIR_CONFIG (explicit):\n  {}", p.display()));
        return;
    }
    match default_config_path() {
        Some(p) => {
            out::print_info(&format!("Default sortdir config path:\n  {}", p.display()));
            if p.exists() {
                out::print_info("A config file exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run with --init-config to create a template.");
            }
        }
        None => out::print_error("Could not determine a default config path"),
    }
}

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    if args.print_config {
        print_config_location();
        return Ok(());
    }
    if args.init_config {
        let path = active_config_path()
            .ok_or_else(|| anyhow!("Could not determine a config path; set SORTDIR_CONFIG"))?;
        create_template_config(&path)?;
        out::print_success(&format!("Wrote template config to {}", path.display()));
        return Ok(());
    }

    let mut cfg = Config::default();
    let overrides = load_config_from_xml()?;
    if let Some(o) = &overrides {
        o.apply_to(&mut cfg);
    }
    args.apply_overrides(&mut cfg);

    let guard = init_tracing(cfg.log_level, cfg.log_file.as_deref(), args.json).inspect_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e:#}"));
    })?;

    // Dropping the guard flushes the file appender.
    let guard_slot: Arc<Mutex<Option<WorkerGuard>>> = Arc::new(Mutex::new(guard));
    let shutdown = ShutdownFlag::new();
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            if shutdown.is_requested() {
                // Second interrupt: stop waiting for in-flight moves.
                std::process::exit(130);
            }
            shutdown.request();
            out::print_warn("Received interrupt; finishing in-flight moves...");
        })
        .context("Failed to install signal handler")?;
    }

    if let Some(o) = &overrides {
        debug!(path = %o.path.display(), "applied config file");
    }
    debug!(?args, "starting sortdir");

    let result = execute(cfg, shutdown);

    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }
    result
}

fn execute(mut cfg: Config, shutdown: ShutdownFlag) -> Result<()> {
    if cfg.source.as_os_str().is_empty() {
        bail!("No source directory given; pass --source DIR or set <source> in the config file");
    }

    if let Err(e) = validate_and_normalize(&mut cfg) {
        log_error("setup failed", &e);
        return Err(e);
    }

    let dry_run = cfg.dry_run;
    let sorter = Sorter::new(cfg).with_shutdown(shutdown);

    if dry_run {
        let plan = sorter.plan()?;
        out::print_plan(&plan);
        if !plan.discovery_errors.is_empty() {
            bail!(
                "{} path(s) could not be read; the plan is incomplete",
                plan.discovery_errors.len()
            );
        }
        return Ok(());
    }

    let report = sorter.run()?;
    out::print_summary(&report);

    if report.is_success() {
        return Ok(());
    }
    if report.interrupted() {
        return Err(SortError::Interrupted.into());
    }
    for f in &report.failures {
        log_error("move failed", &f.error);
    }
    Err(anyhow!(
        "{} file(s) failed, {} path(s) unreadable; {}",
        report.failures.len(),
        report.discovery_errors.len(),
        report.cleanup
    ))
}

/// Structured error line; typed errors carry their code.
fn log_error(what: &str, e: &anyhow::Error) {
    match e.downcast_ref::<SortError>() {
        Some(se) => error!(code = se.code(), setup = se.is_setup(), error = %se, "{what}"),
        None => error!(error = %format!("{e:#}"), "{what}"),
    }
}
