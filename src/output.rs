//! User-facing terminal output.
//! Colored prefixes when stdout is a TTY; plain text otherwise so output can be scripted.

use owo_colors::OwoColorize;

use crate::sorter::{CleanupOutcome, Plan, RunReport};

#[derive(Debug, Clone, Copy)]
enum Tone {
    Info,
    Warn,
    Error,
    Ok,
}

fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn prefixed(tone: Tone, msg: &str) {
    let label = match tone {
        Tone::Info => "info:",
        Tone::Warn => "warn:",
        Tone::Error => "error:",
        Tone::Ok => "ok:",
    };
    let to_stderr = matches!(tone, Tone::Warn | Tone::Error);
    let line = if is_tty() {
        let styled = match tone {
            Tone::Info => label.cyan().bold().to_string(),
            Tone::Warn => label.yellow().bold().to_string(),
            Tone::Error => label.red().bold().to_string(),
            Tone::Ok => label.green().bold().to_string(),
        };
        format!("{styled} {msg}")
    } else {
        format!("{label} {msg}")
    };
    if to_stderr {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

pub fn print_info(msg: &str) {
    prefixed(Tone::Info, msg);
}

pub fn print_warn(msg: &str) {
    prefixed(Tone::Warn, msg);
}

pub fn print_error(msg: &str) {
    prefixed(Tone::Error, msg);
}

pub fn print_success(msg: &str) {
    prefixed(Tone::Ok, msg);
}

/// Plain line, no prefix.
pub fn print_user(msg: &str) {
    println!("{msg}");
}

/// One summary line, then each failure and any cleanup problem.
pub fn print_summary(report: &RunReport) {
    let line = format!(
        "moved {} of {} file(s) in {:.2?}; {} conflict(s) resolved; {}",
        report.moved.len(),
        report.discovered,
        report.elapsed,
        report.conflicts.len(),
        report.cleanup
    );
    if report.is_success() {
        print_success(&line);
    } else {
        print_warn(&line);
    }

    for c in &report.conflicts {
        print_info(&format!(
            "relocated '{}' -> '{}'",
            c.old.display(),
            c.new.display()
        ));
    }
    for f in &report.failures {
        print_error(&format!("{}: {:#}", f.path.display(), f.error));
    }
    for d in &report.discovery_errors {
        print_error(&format!("could not read {}: {}", d.path.display(), d.error));
    }
    if let CleanupOutcome::Blocked { remaining } = &report.cleanup {
        for p in remaining.iter().take(20) {
            print_warn(&format!("still in source: {}", p.display()));
        }
        if remaining.len() > 20 {
            print_warn(&format!("... and {} more", remaining.len() - 20));
        }
    }
}

/// Dry-run output: one "from -> to" line per file.
pub fn print_plan(plan: &Plan) {
    for c in &plan.conflicts {
        print_user(&format!(
            "relocate '{}' -> '{}'",
            c.old.display(),
            c.new.display()
        ));
    }
    for m in &plan.moves {
        print_user(&format!("'{}' -> '{}'", m.from.display(), m.to.display()));
    }
    for d in &plan.discovery_errors {
        print_error(&format!("could not read {}: {}", d.path.display(), d.error));
    }
    print_info(&format!(
        "Dry-run: {} file(s) into {} folder(s); nothing was changed",
        plan.moves.len(),
        plan.folders().len()
    ));
}
