// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, io};

use clap::{ArgMatches, Command, ValueEnum, arg, value_parser};
use clap_complete::Generator;

use crate::Cli;

/// Prints a completion script for `davgate` on stdout.
#[derive(Debug, Clone, Copy)]
pub struct CmdGenerateCompletion {
    pub shell: Shell,
}

impl CmdGenerateCompletion {
    pub const NAME: &str = "generate-completion";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Print a completion script covering the contact, event and reminder commands")
            .hide(true)
            .arg(
                arg!(shell: <SHELL> "Shell to write the script for")
                    .value_parser(value_parser!(Shell)),
            )
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let shell = matches
            .get_one::<Shell>("shell")
            .copied()
            .ok_or("a shell name is required")?;
        Ok(Self { shell })
    }

    pub fn run(self) -> Result<(), Box<dyn Error>> {
        tracing::debug!(shell = ?self.shell, "writing completion script");
        self.write_script(&mut io::stdout());
        Ok(())
    }

    /// Writes the script for the whole `davgate` command tree.
    pub fn write_script(self, out: &mut impl io::Write) {
        let mut cmd = Cli::command();
        let bin = cmd.get_name().to_string();
        match self.shell.builtin() {
            Some(shell) => emit(shell, &mut cmd, &bin, out),
            None => emit(clap_complete_nushell::Nushell {}, &mut cmd, &bin, out),
        }
    }
}

fn emit(generator: impl Generator, cmd: &mut Command, bin: &str, out: &mut impl io::Write) {
    clap_complete::generate(generator, cmd, bin, out);
}

/// Shells a script can be written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Elvish,
    Fish,
    Nushell,
    #[clap(name = "powershell")]
    #[allow(clippy::enum_variant_names)]
    PowerShell,
    Zsh,
}

impl Shell {
    /// The `clap_complete` generator, or `None` for Nushell, which lives in
    /// its own crate.
    fn builtin(self) -> Option<clap_complete::Shell> {
        use clap_complete::Shell as Builtin;

        match self {
            Self::Bash => Some(Builtin::Bash),
            Self::Elvish => Some(Builtin::Elvish),
            Self::Fish => Some(Builtin::Fish),
            Self::PowerShell => Some(Builtin::PowerShell),
            Self::Zsh => Some(Builtin::Zsh),
            Self::Nushell => None,
        }
    }
}
