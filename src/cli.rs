use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use url::Url;

use crate::config::{DEFAULT_BASE_URL, DEFAULT_CATALOG_PATH, DEFAULT_TIMEOUT_SECS, SiteConfig};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Crawl every catalog page and append the books to a CSV file.
    Crawl(CrawlArgs),
    /// Extract a single book page and print it as CSV.
    Book(BookArgs),
}

#[derive(Debug, Args)]
pub struct SiteArgs {
    /// Site root that book and bookstore links are resolved against.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Path of the recommendations catalog under the site root.
    #[arg(long, default_value = DEFAULT_CATALOG_PATH)]
    pub catalog_path: String,

    /// Per-request timeout.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl SiteArgs {
    pub fn site_config(&self) -> anyhow::Result<SiteConfig> {
        let base_url = Url::parse(&self.base_url).context("parse --base-url")?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            anyhow::bail!("--base-url must be http/https: {base_url}");
        }

        let mut config = SiteConfig::new(base_url);
        config.catalog_path = self.catalog_path.clone();
        config.timeout = Duration::from_secs(self.timeout_secs.max(1));
        Ok(config)
    }
}

#[derive(Debug, Args)]
pub struct CrawlArgs {
    /// Destination CSV file; created with a header row if missing, appended to otherwise.
    #[arg(long)]
    pub out: String,

    #[command(flatten)]
    pub site: SiteArgs,
}

#[derive(Debug, Args)]
pub struct BookArgs {
    /// Book detail page URL.
    #[arg(long)]
    pub url: String,

    /// Per-request timeout.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl BookArgs {
    pub fn site_config(&self) -> anyhow::Result<(Url, SiteConfig)> {
        let url = Url::parse(&self.url).context("parse --url")?;
        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!("--url must be http/https: {url}");
        }

        let mut config = SiteConfig::new(url.join("/").context("derive site root from --url")?);
        config.timeout = Duration::from_secs(self.timeout_secs.max(1));
        Ok((url, config))
    }
}
