use std::process::ExitCode;

use clap::{Parser, Subcommand};
use trustpipe::command;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Split(command::SplitCmd),
    Assemble(command::AssembleCmd),
    Annotate(command::AnnotateCmd),
    Merge(command::MergeCmd),
    Report(command::ReportCmd),
    Run(command::RunCmd),
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Split(mut cmd) => cmd.try_execute(),
        Commands::Assemble(mut cmd) => cmd.try_execute(),
        Commands::Annotate(mut cmd) => cmd.try_execute(),
        Commands::Merge(mut cmd) => cmd.try_execute(),
        Commands::Report(mut cmd) => cmd.try_execute(),
        Commands::Run(mut cmd) => cmd.try_execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    return ExitCode::SUCCESS;
}
