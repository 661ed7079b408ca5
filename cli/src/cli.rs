// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, ffi::OsString, path::PathBuf, process::ExitCode};

use clap::{ArgMatches, Command, ValueHint, arg, builder::styling, crate_version, value_parser};
use colored::Colorize;
use davgate_core::{APP_NAME, Gateway};
use futures::{FutureExt, future::LocalBoxFuture};
use tracing_subscriber::EnvFilter;

use crate::cmd_contact::{CmdContactCreate, CmdContactDelete, CmdContactGet, CmdContactUpdate};
use crate::cmd_event::{CmdEventCreate, CmdEventDelete, CmdEventGet, CmdEventUpdate};
use crate::cmd_generate_completion::CmdGenerateCompletion;
use crate::cmd_reminder::{CmdReminderDecode, CmdReminderEncode};
use crate::config::parse_config;

/// Run the davgate command-line interface.
pub async fn run() -> ExitCode {
    init_tracing();
    let result = match Cli::parse() {
        Ok(cli) => cli.run().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so that stdout only carries JSON.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Command-line interface
#[derive(Debug)]
pub struct Cli {
    /// Path to the configuration file
    pub config: Option<PathBuf>,

    /// The command to execute
    pub command: Commands,
}

impl Cli {
    /// Create the command-line interface
    pub fn command() -> Command {
        const STYLES: styling::Styles = styling::Styles::styled()
            .header(styling::AnsiColor::Green.on_default().bold())
            .usage(styling::AnsiColor::Green.on_default().bold())
            .literal(styling::AnsiColor::Blue.on_default().bold())
            .placeholder(styling::AnsiColor::Cyan.on_default());

        Command::new(APP_NAME)
            .about("Contacts and events on a CardDAV/CalDAV server, with optimistic locking.")
            .author("Zexin Yuan <aim@yzx9.xyz>")
            .version(crate_version!())
            .styles(STYLES)
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                arg!(-c --config [CONFIG] "Path to the configuration file")
                    .long_help(
                        "\
Path to the configuration file. Defaults to $DAVGATE_CONFIG, then \
$XDG_CONFIG_HOME/davgate/config.toml on Linux and MacOS, \
%APPDATA%/davgate/config.toml on Windows.",
                    )
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath)
                    .global(true),
            )
            .subcommand(
                Command::new("contact")
                    .alias("c")
                    .about("Read and write contacts")
                    .arg_required_else_help(true)
                    .subcommand_required(true)
                    .subcommand(CmdContactGet::command())
                    .subcommand(CmdContactCreate::command())
                    .subcommand(CmdContactUpdate::command())
                    .subcommand(CmdContactDelete::command()),
            )
            .subcommand(
                Command::new("event")
                    .alias("e")
                    .about("Read and write events")
                    .arg_required_else_help(true)
                    .subcommand_required(true)
                    .subcommand(CmdEventGet::command())
                    .subcommand(CmdEventCreate::command())
                    .subcommand(CmdEventUpdate::command())
                    .subcommand(CmdEventDelete::command()),
            )
            .subcommand(
                Command::new("reminder")
                    .alias("r")
                    .about("Convert between reminder JSON and alarm triggers")
                    .arg_required_else_help(true)
                    .subcommand_required(true)
                    .subcommand(CmdReminderDecode::command())
                    .subcommand(CmdReminderEncode::command()),
            )
            .subcommand(CmdGenerateCompletion::command())
    }

    /// Parse the command-line arguments
    pub fn parse() -> Result<Self, Box<dyn Error>> {
        let commands = Self::command();
        let matches = commands.get_matches();
        Self::from(&matches)
    }

    /// Parse the specified arguments
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, Box<dyn Error>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let commands = Self::command();
        let matches = commands.try_get_matches_from(args)?;
        Self::from(&matches)
    }

    /// Create a CLI instance from the `ArgMatches`
    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        use Commands::*;

        let unknown = || -> Box<dyn Error> { "unknown command".into() };
        let command = match matches.subcommand() {
            Some(("contact", matches)) => match matches.subcommand() {
                Some((CmdContactGet::NAME, m)) => ContactGet(CmdContactGet::from(m)?),
                Some((CmdContactCreate::NAME, m)) => ContactCreate(CmdContactCreate::from(m)),
                Some((CmdContactUpdate::NAME, m)) => ContactUpdate(CmdContactUpdate::from(m)?),
                Some((CmdContactDelete::NAME, m)) => ContactDelete(CmdContactDelete::from(m)?),
                _ => return Err(unknown()),
            },
            Some(("event", matches)) => match matches.subcommand() {
                Some((CmdEventGet::NAME, m)) => EventGet(CmdEventGet::from(m)?),
                Some((CmdEventCreate::NAME, m)) => EventCreate(CmdEventCreate::from(m)),
                Some((CmdEventUpdate::NAME, m)) => EventUpdate(CmdEventUpdate::from(m)?),
                Some((CmdEventDelete::NAME, m)) => EventDelete(CmdEventDelete::from(m)?),
                _ => return Err(unknown()),
            },
            Some(("reminder", matches)) => match matches.subcommand() {
                Some((CmdReminderDecode::NAME, m)) => ReminderDecode(CmdReminderDecode::from(m)?),
                Some((CmdReminderEncode::NAME, m)) => ReminderEncode(CmdReminderEncode::from(m)),
                _ => return Err(unknown()),
            },
            Some((CmdGenerateCompletion::NAME, m)) => {
                GenerateCompletion(CmdGenerateCompletion::from(m)?)
            }
            _ => return Err(unknown()),
        };

        let config = matches.get_one("config").cloned();
        Ok(Cli { config, command })
    }

    /// Run the command
    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        self.command.run(self.config).await
    }
}

/// The commands available in the CLI
#[derive(Debug, Clone)]
pub enum Commands {
    /// Show a contact
    ContactGet(CmdContactGet),

    /// Create a contact
    ContactCreate(CmdContactCreate),

    /// Update a contact
    ContactUpdate(CmdContactUpdate),

    /// Delete a contact
    ContactDelete(CmdContactDelete),

    /// Show an event
    EventGet(CmdEventGet),

    /// Create an event
    EventCreate(CmdEventCreate),

    /// Update an event
    EventUpdate(CmdEventUpdate),

    /// Delete an event
    EventDelete(CmdEventDelete),

    /// Decode a trigger into reminder JSON
    ReminderDecode(CmdReminderDecode),

    /// Encode reminder JSON into a trigger
    ReminderEncode(CmdReminderEncode),

    /// Generate shell completion
    GenerateCompletion(CmdGenerateCompletion),
}

impl Commands {
    /// Run the command with the given configuration
    #[rustfmt::skip]
    pub async fn run(self, config: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
        use Commands::*;
        match self {
            ContactGet(a)    => Self::run_with(config, |x| a.run(x).boxed_local()).await,
            ContactCreate(a) => Self::run_with(config, |x| a.run(x).boxed_local()).await,
            ContactUpdate(a) => Self::run_with(config, |x| a.run(x).boxed_local()).await,
            ContactDelete(a) => Self::run_with(config, |x| a.run(x).boxed_local()).await,
            EventGet(a)      => Self::run_with(config, |x| a.run(x).boxed_local()).await,
            EventCreate(a)   => Self::run_with(config, |x| a.run(x).boxed_local()).await,
            EventUpdate(a)   => Self::run_with(config, |x| a.run(x).boxed_local()).await,
            EventDelete(a)   => Self::run_with(config, |x| a.run(x).boxed_local()).await,
            ReminderDecode(a) => a.run(),
            ReminderEncode(a) => a.run().await,
            GenerateCompletion(a) => a.run(),
        }
    }

    async fn run_with<F>(config: Option<PathBuf>, f: F) -> Result<(), Box<dyn Error>>
    where
        F: for<'a> FnOnce(&'a Gateway) -> LocalBoxFuture<'a, Result<(), Box<dyn Error>>>,
    {
        tracing::debug!("parsing configuration...");
        let config = parse_config(config).await?;
        let gateway = Gateway::new(config)?;

        let result = f(&gateway).await;
        gateway.shutdown().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use davgate_core::dav::ETag;

    use super::*;
    use crate::cmd_generate_completion::Shell;
    use crate::util::PayloadSource;

    #[test]
    fn test_parse_config() {
        let args = ["test", "-c", "/tmp/config.toml", "contact", "get", "c-1"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.toml")));
        assert!(matches!(cli.command, Commands::ContactGet(_)));
    }

    #[test]
    fn test_parse_config_after_subcommand() {
        let args = ["test", "event", "get", "e-1", "--config", "/tmp/config.toml"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.toml")));
    }

    #[test]
    fn test_parse_requires_subcommand() {
        assert!(Cli::try_parse_from(["test"]).is_err());
        assert!(Cli::try_parse_from(["test", "contact"]).is_err());
    }

    #[test]
    fn test_parse_contact_get() {
        let cli = Cli::try_parse_from(["test", "contact", "get", "c-1"]).unwrap();
        match cli.command {
            Commands::ContactGet(cmd) => {
                assert_eq!(cmd.uid, "c-1");
                assert_eq!(cmd.addressbook, None);
            }
            _ => panic!("Expected ContactGet command"),
        }
    }

    #[test]
    fn test_parse_contact_update() {
        let args = ["test", "c", "update", "c-1", "--etag", "1", "-d", "{}"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::ContactUpdate(cmd) => {
                assert_eq!(cmd.uid, "c-1");
                assert_eq!(cmd.etag, Some(ETag::from("1")));
                assert_eq!(cmd.data, PayloadSource::Inline("{}".to_string()));
            }
            _ => panic!("Expected ContactUpdate command"),
        }
    }

    #[test]
    fn test_parse_contact_delete() {
        let cli = Cli::try_parse_from(["test", "contact", "delete", "c-1"]).unwrap();
        assert!(matches!(cli.command, Commands::ContactDelete(_)));
    }

    #[test]
    fn test_parse_event_create() {
        let args = ["test", "e", "create", "--calendar", "work", "-f", "event.json"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::EventCreate(cmd) => {
                assert_eq!(cmd.calendar.as_deref(), Some("work"));
                assert_eq!(cmd.data, PayloadSource::File("event.json".into()));
            }
            _ => panic!("Expected EventCreate command"),
        }
    }

    #[test]
    fn test_parse_event_update_and_delete() {
        let cli = Cli::try_parse_from(["test", "event", "update", "e-1"]).unwrap();
        assert!(matches!(cli.command, Commands::EventUpdate(_)));

        let cli = Cli::try_parse_from(["test", "event", "delete", "e-1", "--etag", "2"]).unwrap();
        assert!(matches!(cli.command, Commands::EventDelete(_)));
    }

    #[test]
    fn test_parse_reminder_decode() {
        let args = ["test", "reminder", "decode", "-PT15M", "--related", "END"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::ReminderDecode(cmd) => {
                assert_eq!(cmd.value, "-PT15M");
                assert_eq!(cmd.related.as_deref(), Some("END"));
            }
            _ => panic!("Expected ReminderDecode command"),
        }
    }

    #[test]
    fn test_parse_reminder_encode() {
        let args = ["test", "r", "encode", "-d", r#"{"type":"DISPLAY","offset":"-PT5M"}"#];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Commands::ReminderEncode(_)));
    }

    #[test]
    fn test_parse_generate_completions() {
        let args = ["test", "generate-completion", "zsh"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::GenerateCompletion(cmd) => {
                assert_eq!(cmd.shell, Shell::Zsh);
            }
            _ => panic!("Expected GenerateCompletion command"),
        }
    }
}
