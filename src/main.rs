use clap::Parser;
use rapids_autotuner::app::{handle_fatal_error, init_logging, AppConfig};
use rapids_autotuner::cli::{execute_command, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let app_config = AppConfig::new(cli.verbose);
    init_logging(&app_config);

    match execute_command(cli.command, cli.config).await {
        Ok(output) => print!("{output}"),
        Err(e) => handle_fatal_error(e, cli.verbose),
    }
}
