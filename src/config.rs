use std::time::Duration;

use anyhow::Context as _;
use regex::Regex;
use scraper::Selector;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.bookdealer.it/";
pub const DEFAULT_CATALOG_PATH: &str = "/i-consigli-dei-librai";
pub const DEFAULT_PAGE_PARAM: &str = "pag";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything the crawler needs to know about the target site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub base_url: Url,
    pub catalog_path: String,
    pub page_param: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub layout: Layout,
}

impl SiteConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            catalog_path: DEFAULT_CATALOG_PATH.to_owned(),
            page_param: DEFAULT_PAGE_PARAM.to_owned(),
            user_agent: format!("bookrecs/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            layout: Layout::default(),
        }
    }

    pub fn catalog_url(&self) -> anyhow::Result<Url> {
        self.base_url.join(&self.catalog_path).with_context(|| {
            format!(
                "join catalog path {:?} onto {}",
                self.catalog_path, self.base_url
            )
        })
    }

    pub fn listing_url(&self, catalog_url: &Url, page: u32) -> Url {
        let mut url = catalog_url.clone();
        url.set_query(None);
        url.query_pairs_mut().append_pair(&self.page_param, &page.to_string());
        url
    }
}

/// CSS markers locating each piece of the catalog and book pages.
#[derive(Debug, Clone)]
pub struct Layout {
    pub container: String,
    pub title: String,
    pub price: String,
    /// Regex over the price text; capture group 1 is the whole-unit amount.
    pub price_pattern: String,
    pub labeled_block: String,
    pub labeled_item: String,
    pub endorsements: String,
    pub retailer_link: String,
    pub retailer_path: String,
    pub synopsis: String,
    pub listing_header: String,
    pub book_link: String,
    pub pagination_control: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            container: "div.product-details-info".to_owned(),
            title: "h3.product-title".to_owned(),
            price: "span.price-new".to_owned(),
            price_pattern: r"(\d+),\d{2}\s*€".to_owned(),
            labeled_block: "ul.list-unstyled".to_owned(),
            labeled_item: "li".to_owned(),
            endorsements: "div.w-consigliato-da".to_owned(),
            retailer_link: r#"a[href*="/libreria/"]"#.to_owned(),
            retailer_path: "/libreria/".to_owned(),
            synopsis: "article.review-article".to_owned(),
            listing_header: "div.product-header".to_owned(),
            book_link: r#"a[href*="/libro/"]"#.to_owned(),
            pagination_control: "a.next-btn".to_owned(),
        }
    }
}

impl Layout {
    pub fn compile(&self) -> anyhow::Result<Selectors> {
        Ok(Selectors {
            container: parse_selector("container", &self.container)?,
            title: parse_selector("title", &self.title)?,
            price: parse_selector("price", &self.price)?,
            price_pattern: Regex::new(&self.price_pattern)
                .with_context(|| format!("invalid price pattern {:?}", self.price_pattern))?,
            labeled_block: parse_selector("labeled block", &self.labeled_block)?,
            labeled_item: parse_selector("labeled item", &self.labeled_item)?,
            endorsements: parse_selector("endorsements", &self.endorsements)?,
            retailer_link: parse_selector("retailer link", &self.retailer_link)?,
            retailer_path: self.retailer_path.clone(),
            synopsis: parse_selector("synopsis", &self.synopsis)?,
            listing_header: parse_selector("listing header", &self.listing_header)?,
            book_link: parse_selector("book link", &self.book_link)?,
            pagination_control: parse_selector("pagination control", &self.pagination_control)?,
        })
    }
}

fn parse_selector(name: &str, css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow::anyhow!("invalid {name} selector {css:?}: {err}"))
}

/// Compiled form of [`Layout`].
#[derive(Debug, Clone)]
pub struct Selectors {
    pub container: Selector,
    pub title: Selector,
    pub price: Selector,
    pub price_pattern: Regex,
    pub labeled_block: Selector,
    pub labeled_item: Selector,
    pub endorsements: Selector,
    pub retailer_link: Selector,
    pub retailer_path: String,
    pub synopsis: Selector,
    pub listing_header: Selector,
    pub book_link: Selector,
    pub pagination_control: Selector,
}
