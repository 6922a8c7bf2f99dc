use std::process::ExitCode;

use clap::Parser;

use skuforge_cli::Cli;
use skuforge_observability::LogFormat;

#[tokio::main]
async fn main() -> ExitCode {
    skuforge_observability::init_with(LogFormat::Pretty, "warn");

    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();

    match skuforge_cli::run(cli, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
