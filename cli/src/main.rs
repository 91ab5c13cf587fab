mod commands;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, Commands, patterns, run};

#[tokio::main]
async fn main() -> ExitCode {
    let commands = CommandLine::parse_args();

    match commands.into_command() {
        Commands::Run(args) => run::run(args).await,
        Commands::Patterns => {
            patterns::patterns();
            ExitCode::SUCCESS
        }
    }
}
