use scraper::{ElementRef, Html};

use crate::config::Selectors;
use crate::formats::{BookRecord, Price};
use crate::labels::{Attribute, LabeledBlock};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("book details container not found")]
    MissingContainer,
    #[error("book title not found")]
    MissingTitle,
}

/// Only a missing details container or title fails the record; every other
/// field falls back to `None` (or to raw text, for the price) on its own.
pub fn extract_book(html: &str, selectors: &Selectors) -> Result<BookRecord, ExtractError> {
    let document = Html::parse_document(html);

    let container = document
        .select(&selectors.container)
        .next()
        .ok_or(ExtractError::MissingContainer)?;

    let title = container
        .select(&selectors.title)
        .next()
        .and_then(text_of)
        .ok_or(ExtractError::MissingTitle)?;

    let price = container
        .select(&selectors.price)
        .next()
        .and_then(text_of)
        .map(|raw| parse_price(&raw, selectors));
    if price.is_none() {
        tracing::debug!(%title, "price missing");
    }

    let labels = container
        .select(&selectors.labeled_block)
        .next()
        .map(|block| LabeledBlock::from_element(block, &selectors.labeled_item))
        .unwrap_or_default();
    let missing = labels.missing();
    if !missing.is_empty() {
        let missing: Vec<&str> = missing.into_iter().map(Attribute::label).collect();
        tracing::debug!(%title, ?missing, "labels missing");
    }

    let bookstores = endorsing_bookstores(&document, selectors);
    if bookstores.is_none() {
        tracing::debug!(%title, "no bookstores found");
    }

    let synopsis = document
        .select(&selectors.synopsis)
        .next()
        .and_then(text_of);
    if synopsis.is_none() {
        tracing::debug!(%title, "no synopsis found");
    }

    Ok(BookRecord {
        price,
        author: labels.attribute(Attribute::Author),
        publisher: labels.attribute(Attribute::Publisher),
        isbn: labels.attribute(Attribute::Isbn),
        category: labels.attribute(Attribute::Category),
        translator: labels.attribute(Attribute::Translator),
        pages: labels.attribute(Attribute::Pages),
        date: labels.attribute(Attribute::Date),
        series: labels.attribute(Attribute::Series),
        recommendations: bookstores.as_ref().map(Vec::len),
        bookstores,
        synopsis,
        title,
    })
}

pub fn parse_price(raw: &str, selectors: &Selectors) -> Price {
    let amount = selectors
        .price_pattern
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|units| units.as_str().parse::<u32>().ok());

    match amount {
        Some(amount) => Price::Amount(amount),
        None => {
            tracing::debug!(price = raw, "cannot convert price");
            Price::Raw(raw.to_owned())
        }
    }
}

// An absent block and a block without retailer links are both `None`.
fn endorsing_bookstores(document: &Html, selectors: &Selectors) -> Option<Vec<String>> {
    let block = document.select(&selectors.endorsements).next()?;

    let ids: Vec<String> = block
        .select(&selectors.retailer_link)
        .map(|link| {
            let href = link.value().attr("href").unwrap_or_default();
            retailer_id(href, &selectors.retailer_path)
        })
        .collect();

    (!ids.is_empty()).then_some(ids)
}

fn retailer_id(href: &str, retailer_path: &str) -> String {
    let suffix = match href.find(retailer_path) {
        Some(start) => &href[start + retailer_path.len()..],
        None => "",
    };
    suffix.trim_end_matches('/').to_owned()
}

fn text_of(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Layout;

    const FULL_BOOK: &str = r#"<!doctype html>
<html><body>
  <div class="product-details-info">
    <h3 class="product-title">La breve favolosa vita di Oscar Wao</h3>
    <span class="price-new">12,50 €</span>
    <ul class="list-unstyled">
      <li><strong>Editore:</strong> Mondadori</li>
      <li><strong>Autore:</strong> Junot Díaz</li>
      <li><strong>Isbn:</strong> 9788804586890</li>
      <li><strong>Categoria:</strong> Narrativa</li>
      <li><strong>Traduttore:</strong> Silvia Pareschi</li>
      <li><strong>Numero pagine:</strong> 320</li>
      <li><strong>Data di Uscita:</strong> 01/01/2009</li>
      <li><strong>Collana:</strong> Oscar</li>
    </ul>
  </div>
  <div class="w-consigliato-da">
    <a href="/libreria/libreria-a">A</a>
    <a href="/autore/somebody">not a bookstore</a>
    <a href="/libreria/libreria-b/">B</a>
    <a href="/libreria/libreria-a">A again</a>
  </div>
  <article class="review-article">
    A novel about Oscar.
  </article>
</body></html>"#;

    fn selectors() -> Selectors {
        Layout::default()
            .compile()
            .expect("default layout compiles")
    }

    #[test]
    fn extracts_every_field_from_full_page() -> anyhow::Result<()> {
        let record = extract_book(FULL_BOOK, &selectors())?;

        assert_eq!(record.title, "La breve favolosa vita di Oscar Wao");
        assert_eq!(record.price, Some(Price::Amount(12)));
        assert_eq!(record.author.as_deref(), Some("Junot Díaz"));
        assert_eq!(record.publisher.as_deref(), Some("Mondadori"));
        assert_eq!(record.isbn.as_deref(), Some("9788804586890"));
        assert_eq!(record.category.as_deref(), Some("Narrativa"));
        assert_eq!(record.translator.as_deref(), Some("Silvia Pareschi"));
        assert_eq!(record.pages.as_deref(), Some("320"));
        assert_eq!(record.date.as_deref(), Some("01/01/2009"));
        assert_eq!(record.series.as_deref(), Some("Oscar"));
        assert_eq!(record.synopsis.as_deref(), Some("A novel about Oscar."));
        Ok(())
    }

    #[test]
    fn bookstores_keep_document_order_and_duplicates() -> anyhow::Result<()> {
        let record = extract_book(FULL_BOOK, &selectors())?;

        assert_eq!(record.recommendations, Some(3));
        assert_eq!(
            record.bookstores,
            Some(vec![
                "libreria-a".to_owned(),
                "libreria-b".to_owned(),
                "libreria-a".to_owned(),
            ])
        );
        Ok(())
    }

    #[test]
    fn price_falls_back_to_raw_text() {
        let selectors = selectors();
        assert_eq!(parse_price("12,50 €", &selectors), Price::Amount(12));
        assert_eq!(parse_price("€ 9,90 €", &selectors), Price::Amount(9));

        let raw = parse_price("gratis", &selectors);
        assert_eq!(raw, Price::Raw("gratis".to_owned()));
        assert!(raw.is_fallback());
    }

    #[test]
    fn missing_container_fails_record() {
        let html = r#"<html><body><h3 class="product-title">Orphan</h3></body></html>"#;
        assert_eq!(
            extract_book(html, &selectors()),
            Err(ExtractError::MissingContainer)
        );
    }

    #[test]
    fn missing_or_blank_title_fails_record() {
        let missing = r#"<div class="product-details-info"><span class="price-new">5,00 €</span></div>"#;
        assert_eq!(
            extract_book(missing, &selectors()),
            Err(ExtractError::MissingTitle)
        );

        let blank = r#"<div class="product-details-info"><h3 class="product-title">  </h3></div>"#;
        assert_eq!(
            extract_book(blank, &selectors()),
            Err(ExtractError::MissingTitle)
        );
    }

    #[test]
    fn optional_sections_degrade_to_none() -> anyhow::Result<()> {
        let html = r#"<div class="product-details-info">
            <h3 class="product-title">Bare</h3>
            <ul class="list-unstyled"><li>Autore: Someone</li></ul>
        </div>"#;
        let record = extract_book(html, &selectors())?;

        assert_eq!(record.title, "Bare");
        assert_eq!(record.price, None);
        assert_eq!(record.author.as_deref(), Some("Someone"));
        assert_eq!(record.publisher, None);
        assert_eq!(record.recommendations, None);
        assert_eq!(record.bookstores, None);
        assert_eq!(record.synopsis, None);
        Ok(())
    }

    #[test]
    fn endorsement_block_without_bookstore_links_is_null() -> anyhow::Result<()> {
        let html = r#"<div class="product-details-info">
            <h3 class="product-title">Lonely</h3>
        </div>
        <div class="w-consigliato-da"><a href="/autore/x">x</a></div>"#;
        let record = extract_book(html, &selectors())?;

        assert_eq!(record.recommendations, None);
        assert_eq!(record.bookstores, None);
        Ok(())
    }

    #[test]
    fn every_retailer_link_counts_even_without_suffix() -> anyhow::Result<()> {
        let html = r#"<div class="product-details-info">
            <h3 class="product-title">Bare links</h3>
        </div>
        <div class="w-consigliato-da">
            <a href="/libreria/a">A</a>
            <a href="/libreria/">?</a>
        </div>"#;
        let record = extract_book(html, &selectors())?;
        assert_eq!(record.recommendations, Some(2));
        assert_eq!(record.bookstores, Some(vec!["a".to_owned(), String::new()]));

        let only_bare = r#"<div class="product-details-info">
            <h3 class="product-title">Only bare</h3>
        </div>
        <div class="w-consigliato-da"><a href="/libreria/">?</a></div>"#;
        let record = extract_book(only_bare, &selectors())?;
        assert_eq!(record.recommendations, Some(1));
        assert_eq!(record.bookstores, Some(vec![String::new()]));
        Ok(())
    }

    #[test]
    fn retailer_id_takes_path_suffix() {
        assert_eq!(
            retailer_id("https://shop.example/libreria/verso", "/libreria/"),
            "verso"
        );
        assert_eq!(retailer_id("/libreria/verso/", "/libreria/"), "verso");
        assert_eq!(retailer_id("/libreria/", "/libreria/"), "");
    }
}
