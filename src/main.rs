//! Simple Audio Record CLI entry point

use std::process::ExitCode;

use clap::Parser;

use simple_audio_record::cli::{
    app::{run_devices, run_play, run_record, EXIT_ERROR},
    args::{init_logging, Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use simple_audio_record::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match cli.command {
        Commands::Record(args) => run_record(args).await,
        Commands::Play { output } => run_play(output).await,
        Commands::Devices => run_devices(),
        Commands::Config { action } => {
            let presenter = Presenter::new();
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
    }
}
