//! Command-line configuration.

use std::path::PathBuf;

#[derive(Debug, clap::Parser)]
#[command(version, about, long_about = None)]
pub struct Main {
    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Generate a client SDK and server adapters from an analyzed
    /// model.
    Generate(GenerateCommand),
}

#[derive(Debug, clap::Args)]
pub struct GenerateCommand {
    /// The path to the analyzed model (`.json`), as produced by the
    /// model parser.
    pub input: PathBuf,

    /// The output directory for the generated files.
    pub output: PathBuf,

    #[command(subcommand)]
    pub language: LanguageCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum LanguageCommand {
    /// Generate a Go SDK and server adapters.
    Go(GoCommand),
}

#[derive(Debug, clap::Args)]
#[command(next_help_heading = "Generated code options")]
pub struct GoCommand {
    /// The base import path of the generated packages, e.g.
    /// `github.com/acme/sdk`.
    #[arg(long)]
    pub base: String,
}
