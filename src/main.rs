//! Archscope CLI entry point.

use archscope::cli::{self, Cli, Commands, EXIT_ERROR};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    cli::init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Analyze(args) => cli::run_analyze(args).await,
        Commands::History(args) => cli::run_history(args).await,
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
