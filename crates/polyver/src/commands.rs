//! Subcommand execution and terminal output.

use std::ffi::OsString;
use std::path::Path;

use log::error;

use polyver_adapter::VersionDescriptor;
use polyver_core::{CoreError, Orchestrator, Outcome};

use crate::bootstrap::Engine;
use crate::cli::{Command, PrefsCommand};

/// Exit code for a shim whose target could not be resolved, matching
/// the shell convention for "command not found".
const EXIT_UNRESOLVED: i32 = 127;

pub async fn dispatch(command: Command, engine: &Engine) -> i32 {
    match command {
        Command::List => list(&engine.orchestrator),
        Command::Available { app } => available(&engine.orchestrator, &app).await,
        Command::Install { app, version } => {
            report(engine.orchestrator.install(&app, version.as_deref()).await)
        }
        Command::Uninstall { app, version } => {
            report(engine.orchestrator.uninstall(&app, version.as_deref()).await)
        }
        Command::Use { app, version } => report(engine.orchestrator.switch_version(&app, &version)),
        Command::Run { app, alias, args } => run(&engine.orchestrator, &app, &alias, args),
        Command::Prefs { action } => prefs(engine, action),
    }
}

fn list(orchestrator: &Orchestrator) -> i32 {
    let applications = orchestrator.list_applications();
    if applications.is_empty() {
        println!("no applications registered");
        return 0;
    }
    for info in applications {
        let status = match (&info.active_version, info.installed, info.managed) {
            (Some(version), _, _) => format!("active {version}"),
            (None, true, false) => "installed".to_string(),
            (None, true, true) => "installed, no active version".to_string(),
            (None, false, _) => "not installed".to_string(),
        };
        println!("{:<12} {:<22} {status}", info.name, info.display_name);
    }
    0
}

async fn available(orchestrator: &Orchestrator, app: &str) -> i32 {
    match orchestrator.available_versions(app).await {
        Ok(available) if available.is_empty() => {
            println!("no versions available for {app}");
            0
        }
        Ok(available) => {
            print_listing(orchestrator, app, &available);
            0
        }
        Err(error) => fail(&error),
    }
}

fn print_listing(orchestrator: &Orchestrator, app: &str, available: &[VersionDescriptor]) {
    let snapshot = orchestrator.snapshot(app);
    for descriptor in available {
        let marker = if snapshot.active_version() == Some(descriptor.real_name.as_str()) {
            "*"
        } else if snapshot.contains(&descriptor.real_name) {
            "+"
        } else {
            " "
        };
        println!("{marker} {}", descriptor.display_name);
    }
}

fn report(result: Result<Outcome, CoreError>) -> i32 {
    match result {
        Ok(Outcome::SelectionRequired { available }) => {
            println!("pick a version and run install again with it:");
            for descriptor in &available {
                println!("  {}", descriptor.display_name);
            }
            0
        }
        Ok(outcome) => {
            println!("{outcome}");
            0
        }
        Err(error) => fail(&error),
    }
}

fn run(orchestrator: &Orchestrator, app: &str, alias: &str, args: Vec<OsString>) -> i32 {
    match orchestrator.resolve_executable(app, alias) {
        Ok(executable) => exec(&executable, args),
        Err(error) => {
            eprintln!("polyver: {error}");
            EXIT_UNRESOLVED
        }
    }
}

#[cfg(unix)]
fn exec(executable: &Path, args: Vec<OsString>) -> i32 {
    use std::os::unix::process::CommandExt;

    // Only returns on failure.
    let error = std::process::Command::new(executable).args(args).exec();
    eprintln!("polyver: could not launch {}: {error}", executable.display());
    EXIT_UNRESOLVED
}

#[cfg(not(unix))]
fn exec(executable: &Path, args: Vec<OsString>) -> i32 {
    match std::process::Command::new(executable).args(args).status() {
        Ok(status) => status.code().unwrap_or(1),
        Err(error) => {
            eprintln!("polyver: could not launch {}: {error}", executable.display());
            EXIT_UNRESOLVED
        }
    }
}

fn prefs(engine: &Engine, action: Option<PrefsCommand>) -> i32 {
    match action {
        None => {
            let preferences = engine.preferences.load();
            println!("theme: {}", format!("{:?}", preferences.theme).to_lowercase());
            0
        }
        Some(PrefsCommand::Theme { theme }) => match engine.preferences.set_theme(theme.into()) {
            Ok(()) => 0,
            Err(error) => fail(&error),
        },
    }
}

fn fail(error: &dyn std::error::Error) -> i32 {
    error!("{error}");
    eprintln!("error: {error}");
    1
}
