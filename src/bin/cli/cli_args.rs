//! The thin clap surface: `--help`, `--version`, and `--completions`.
//! Everything after the leading `--completions` check is handed to
//! [`crate::cli::args::parse`] for the 7-Zip-style switch grammar clap's
//! derive macros don't model.

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "radyx", version, about = "Multi-threaded archiver producing LZMA2-compressed 7z containers")]
pub struct Cli {
    /// Print a shell completion script and exit.
    #[arg(long, value_enum, exclusive = true)]
    pub completions: Option<Shell>,

    /// Command letter, archive path, inputs, and switches (e.g. `a out.7z file.txt -mx9`).
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

pub fn command() -> clap::Command {
    Cli::command()
}
