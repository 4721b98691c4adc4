use scraper::Html;
use url::Url;

use crate::config::Selectors;

pub fn list_books(html: &str, base_url: &Url, selectors: &Selectors) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut urls = Vec::new();

    for (index, header) in document.select(&selectors.listing_header).enumerate() {
        let Some(href) = header
            .select(&selectors.book_link)
            .find_map(|link| link.value().attr("href"))
        else {
            tracing::warn!(entry = index + 1, "listing entry has no book link; skipping");
            continue;
        };

        match base_url.join(href) {
            Ok(url) => urls.push(url),
            Err(err) => {
                tracing::warn!(entry = index + 1, href, %err, "unresolvable book link; skipping");
            }
        }
    }

    urls
}
