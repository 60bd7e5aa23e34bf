use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gleaner::app::AppContext;
use gleaner::cli::{commands, Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gleaner=info")))
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => {
            commands::run(ctx, args).await?;
        }
        Commands::Targets => {
            commands::list_targets(&ctx)?;
        }
        Commands::Ping => {
            commands::ping(&ctx).await?;
        }
    }

    Ok(())
}
