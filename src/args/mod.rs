use clap::{CommandFactory, Parser, Subcommand, error::ErrorKind};

use crate::processes::paste::PasteArgs;

/// Top-level command line interface.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Paste(PasteArgs),
}

/// Aborts clap with a given error `message` due to a custom parsing error.
///
/// The subcommand should be specified as a lowercase string with `subcommand`
/// if available. This ensures the help message is as informative as possible.
/// If an invalid subcommand is passed, it will be ignored.
pub(crate) fn abort_clap(kind: ErrorKind, message: impl std::fmt::Display, subcommand: Option<&str>) -> ! {
    let mut command = Cli::command();

    if let Some(subcommand) = subcommand
        && let Some(c) = command.get_subcommands_mut().find(|c| c.get_name() == subcommand)
    {
        c.error(kind, message).exit();
    } else {
        command.error(kind, message).exit()
    }
}
