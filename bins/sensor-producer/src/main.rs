mod cmd;

use clap::Parser;
use cmd::config::{Cli, Commands, Effective};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Invoke(args) => match Effective::new(&args.common) {
            Ok(eff) => cmd::invoke::run(&eff, args).await,
            Err(e) => Err(e),
        },
        Commands::Fleet(args) => match Effective::new(&args.common) {
            Ok(eff) => cmd::fleet::run(&eff, args).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
