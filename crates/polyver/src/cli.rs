//! Command-line argument definitions.

use std::ffi::OsString;

use clap::{Parser, Subcommand, ValueEnum};
use polyver_core::Theme;

#[derive(Parser)]
#[command(
    name = "polyver",
    version,
    about = "Install, switch, and shim versions of development runtimes"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging to the terminal and log file.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List registered applications and their installed state.
    List,

    /// Show the versions available for an application.
    Available {
        /// Application name, as shown by `list`.
        app: String,
    },

    /// Install a version of an application.
    ///
    /// Without a version, the available listing is shown so one can
    /// be picked explicitly.
    Install {
        app: String,
        /// Exact version id from the `available` listing.
        version: Option<String>,
    },

    /// Uninstall one version, or the whole application when no
    /// version is given.
    Uninstall {
        app: String,
        #[arg(long)]
        version: Option<String>,
    },

    /// Make an installed version the active one.
    Use { app: String, version: String },

    /// Launch the active version of an application's executable.
    ///
    /// Generated shims call this; it resolves the alias against the
    /// current active version at invocation time.
    #[command(hide = true)]
    Run {
        app: String,
        alias: String,
        /// Arguments forwarded to the executable.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },

    /// Show or change preferences.
    Prefs {
        #[command(subcommand)]
        action: Option<PrefsCommand>,
    },
}

#[derive(Subcommand)]
pub enum PrefsCommand {
    /// Set the display theme.
    Theme {
        #[arg(value_enum)]
        theme: ThemeArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ThemeArg {
    System,
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::System => Self::System,
            ThemeArg::Light => Self::Light,
            ThemeArg::Dark => Self::Dark,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn install_accepts_optional_version() {
        let cli = Cli::parse_from(["polyver", "install", "nodejs"]);
        match cli.command {
            Command::Install { app, version } => {
                assert_eq!(app, "nodejs");
                assert!(version.is_none());
            }
            _ => panic!("expected install command"),
        }

        let cli = Cli::parse_from(["polyver", "install", "nodejs", "v22.12.0"]);
        match cli.command {
            Command::Install { version, .. } => {
                assert_eq!(version.as_deref(), Some("v22.12.0"));
            }
            _ => panic!("expected install command"),
        }
    }

    #[test]
    fn run_forwards_hyphenated_arguments() {
        let cli = Cli::parse_from(["polyver", "run", "nodejs", "node", "--version"]);
        match cli.command {
            Command::Run { app, alias, args } => {
                assert_eq!(app, "nodejs");
                assert_eq!(alias, "node");
                assert_eq!(args, vec!["--version"]);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn uninstall_version_is_a_flag() {
        let cli = Cli::parse_from(["polyver", "uninstall", "bun", "--version", "1.2.8"]);
        match cli.command {
            Command::Uninstall { app, version } => {
                assert_eq!(app, "bun");
                assert_eq!(version.as_deref(), Some("1.2.8"));
            }
            _ => panic!("expected uninstall command"),
        }
    }
}
