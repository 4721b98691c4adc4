use std::path::PathBuf;

use anyhow::Context as _;
use scraper::Html;
use url::Url;

use crate::cli::{BookArgs, CrawlArgs};
use crate::config::{Selectors, SiteConfig};
use crate::csv_store::{BatchSink, CsvAppender};
use crate::extract::extract_book;
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::formats::BookRecord;
use crate::listing::list_books;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoundError {
    #[error("expected at least 2 pagination controls, found {found}")]
    TooFewControls { found: usize },
    #[error("last-page control has no usable target")]
    MissingTarget,
    #[error("last-page target {target:?} has no {param:?} parameter")]
    MissingPageParam { target: String, param: String },
    #[error("last-page target {target:?} has invalid page number {value:?}")]
    InvalidPageNumber { target: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub bound: u32,
    pub pages_written: u32,
    pub pages_empty: u32,
    pub pages_failed: u32,
    pub books_written: usize,
    pub books_skipped: usize,
}

pub struct Crawler<F> {
    config: SiteConfig,
    selectors: Selectors,
    fetcher: F,
}

impl<F: PageFetcher> Crawler<F> {
    pub fn new(config: SiteConfig, fetcher: F) -> anyhow::Result<Self> {
        let selectors = config.layout.compile().context("compile site layout")?;
        Ok(Self {
            config,
            selectors,
            fetcher,
        })
    }

    /// Failing to fetch the catalog or to resolve its bound aborts the run, as
    /// does a sink error. A listing page that cannot be fetched is abandoned
    /// and a book that cannot be fetched or parsed is skipped.
    pub async fn run(&self, sink: &mut dyn BatchSink) -> anyhow::Result<CrawlSummary> {
        let catalog_url = self.config.catalog_url()?;
        tracing::info!(url = %catalog_url, "parsing catalog");
        let catalog_html = self
            .fetcher
            .fetch(&catalog_url)
            .await
            .context("fetch catalog root")?;

        let bound = resolve_bound(
            &catalog_html,
            &catalog_url,
            &self.config.page_param,
            &self.selectors,
        )
        .context("resolve catalog page count")?;
        tracing::info!(bound, "catalog page count resolved");

        let mut summary = CrawlSummary {
            bound,
            ..CrawlSummary::default()
        };

        for page in 1..=bound {
            let listing_url = self.config.listing_url(&catalog_url, page);
            tracing::info!(page, url = %listing_url, "parsing page");

            let listing_html = match self.fetcher.fetch(&listing_url).await {
                Ok(html) => html,
                Err(err) => {
                    tracing::warn!(page, error = %err, "listing page fetch failed; abandoning page");
                    summary.pages_failed += 1;
                    continue;
                }
            };

            let book_urls = list_books(&listing_html, &self.config.base_url, &self.selectors);
            let (batch, skipped) = self.collect_page(page, &book_urls).await;
            summary.books_skipped += skipped;

            if batch.is_empty() {
                tracing::warn!(page, listed = book_urls.len(), "page produced no records");
                summary.pages_empty += 1;
                continue;
            }

            sink.accept(page, &batch)
                .with_context(|| format!("store page {page}"))?;
            summary.pages_written += 1;
            summary.books_written += batch.len();
            tracing::info!(page, books = batch.len(), "page parsing completed");
        }

        tracing::info!(?summary, "parsing completed");
        Ok(summary)
    }

    async fn collect_page(&self, page: u32, book_urls: &[Url]) -> (Vec<BookRecord>, usize) {
        let mut batch = Vec::with_capacity(book_urls.len());
        let mut skipped = 0;

        for url in book_urls {
            tracing::info!(page, %url, "parsing book");
            let html = match self.fetcher.fetch(url).await {
                Ok(html) => html,
                Err(err) => {
                    tracing::warn!(page, %url, error = %err, "book fetch failed; skipping");
                    skipped += 1;
                    continue;
                }
            };

            match extract_book(&html, &self.selectors) {
                Ok(record) => {
                    tracing::debug!(page, ?record, "parsed book");
                    batch.push(record);
                }
                Err(err) => {
                    tracing::warn!(page, %url, error = %err, "book page unusable; skipping");
                    skipped += 1;
                }
            }
        }

        (batch, skipped)
    }

    pub async fn book(&self, url: &Url) -> anyhow::Result<BookRecord> {
        let html = self.fetcher.fetch(url).await?;
        let record = extract_book(&html, &self.selectors).with_context(|| format!("parse {url}"))?;
        Ok(record)
    }
}

pub fn resolve_bound(
    html: &str,
    catalog_url: &Url,
    page_param: &str,
    selectors: &Selectors,
) -> Result<u32, BoundError> {
    let document = Html::parse_document(html);
    let controls: Vec<_> = document.select(&selectors.pagination_control).collect();
    if controls.len() < 2 {
        return Err(BoundError::TooFewControls {
            found: controls.len(),
        });
    }

    let target = controls[1]
        .value()
        .attr("href")
        .ok_or(BoundError::MissingTarget)?;
    let target_url = catalog_url
        .join(target)
        .map_err(|_| BoundError::MissingTarget)?;

    let value = target_url
        .query_pairs()
        .find(|(key, _)| key == page_param)
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| BoundError::MissingPageParam {
            target: target.to_owned(),
            param: page_param.to_owned(),
        })?;

    match value.trim().parse::<u32>() {
        Ok(bound) if bound > 0 => Ok(bound),
        _ => Err(BoundError::InvalidPageNumber {
            target: target.to_owned(),
            value,
        }),
    }
}

pub async fn run(args: CrawlArgs) -> anyhow::Result<()> {
    let config = args.site.site_config()?;
    let fetcher = HttpFetcher::new(&config.user_agent, config.timeout)?;
    let crawler = Crawler::new(config, fetcher)?;

    let mut appender = CsvAppender::new(PathBuf::from(&args.out));
    let summary = crawler.run(&mut appender).await?;

    println!(
        "Crawled {} pages ({} written, {} empty, {} failed): {} rows appended to {}, {} books skipped.",
        summary.bound,
        summary.pages_written,
        summary.pages_empty,
        summary.pages_failed,
        summary.books_written,
        appender.path().display(),
        summary.books_skipped,
    );
    Ok(())
}

pub async fn book(args: BookArgs) -> anyhow::Result<()> {
    let (url, config) = args.site_config()?;
    let fetcher = HttpFetcher::new(&config.user_agent, config.timeout)?;
    let crawler = Crawler::new(config, fetcher)?;

    let record = crawler.book(&url).await?;

    let mut writer = csv::Writer::from_writer(std::io::stdout().lock());
    writer.serialize(&record).context("write record")?;
    writer.flush().context("flush stdout")?;
    Ok(())
}
