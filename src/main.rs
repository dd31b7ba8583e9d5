use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vibecheck::{app, cli, Config};

#[derive(Parser)]
#[command(name = "vibecheck")]
#[command(about = "VibeCheck - describe a vibe, get one movie back")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Load the seed movies into the vector index
    Ingest,
    /// Ask for recommendations interactively
    Chat {
        /// Candidates retrieved per query (defaults to CHAT_TOP_K)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vibecheck=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let application = app::Application::build(config).await?;
            application.run().await
        }
        Command::Ingest => {
            let total = app::run_ingestion(&config).await?;
            println!(
                "Indexed {} movies into '{}'",
                total,
                config.index_path.display()
            );
            Ok(())
        }
        Command::Chat { top_k } => {
            let k = top_k.unwrap_or(config.chat_top_k);
            anyhow::ensure!(k > 0, "--top-k must be positive");

            let index = app::open_index(&config).await?;
            let pipeline = app::build_pipeline(&config, index)?;

            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            cli::run_repl(&pipeline, k, stdin, tokio::io::stdout()).await?;
            Ok(())
        }
    }
}
