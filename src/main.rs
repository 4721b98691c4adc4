use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    bookrecs::logging::init().context("init logging")?;

    let cli = bookrecs::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        bookrecs::cli::Command::Crawl(args) => {
            bookrecs::crawl::run(args).await.context("crawl")?;
        }
        bookrecs::cli::Command::Book(args) => {
            bookrecs::crawl::book(args).await.context("book")?;
        }
    }

    Ok(())
}
