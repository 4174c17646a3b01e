use clap::Parser;
use miette::{Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use metagen_codegen_go::{
    GeneratorBuilder, NamesCalculator, PackagesCalculator, TypesCalculator,
};
use metagen_core::model::Model;
use metagen_core::reporter::{Level, Reporter};

mod config;

use config::{Command, GenerateCommand, LanguageCommand, Main};

fn main() -> Result<()> {
    let main = Main::parse();

    let default_filter = if main.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match main.command {
        Command::Generate(command) => generate(command),
    }
}

fn generate(command: GenerateCommand) -> Result<()> {
    let source = std::fs::read_to_string(&command.input)
        .into_diagnostic()
        .with_context(|| format!("Failed to read `{}`", command.input.display()))?;

    let mut deserializer = serde_json::Deserializer::from_str(&source);
    let model: Model = serde_path_to_error::deserialize(&mut deserializer)
        .into_diagnostic()
        .context("Failed to parse the analyzed model")?;

    let services = model.services().len();
    let versions: usize = model
        .services()
        .iter()
        .map(|service| service.versions().len())
        .sum();
    println!("Model: {services} services, {versions} versions");

    match command.language {
        LanguageCommand::Go(go) => {
            let reporter = Reporter::new();
            let names = NamesCalculator::new();
            let result = GeneratorBuilder::new()
                .reporter(&reporter)
                .model(&model)
                .output(&command.output)
                .names(names)
                .packages(PackagesCalculator::new(&go.base))
                .types(TypesCalculator::new(names))
                .build()
                .into_diagnostic()?
                .run();

            for record in reporter.records() {
                match record.level {
                    Level::Error => eprintln!("error: {}: {}", record.component, record.message),
                    Level::Warn => eprintln!("warning: {}: {}", record.component, record.message),
                    Level::Info => {}
                }
            }
            result?;

            println!(
                "Writing generated code to `{}`... done",
                command.output.display()
            );
        }
    }

    Ok(())
}
