use serde::{Serialize, Serializer};

// Field order is the column order of the destination file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookRecord {
    pub title: String,
    pub price: Option<Price>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub translator: Option<String>,
    pub pages: Option<String>,
    pub date: Option<String>,
    pub series: Option<String>,
    pub recommendations: Option<usize>,
    #[serde(serialize_with = "serialize_bookstores")]
    pub bookstores: Option<Vec<String>>,
    pub synopsis: Option<String>,
}

/// `Raw` keeps the source text when it does not look like a euro amount, so an
/// unexpected format is still distinguishable from a missing price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Price {
    Amount(u32),
    Raw(String),
}

impl Price {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Price::Raw(_))
    }
}

pub const BOOKSTORE_SEPARATOR: &str = ", ";

fn serialize_bookstores<S>(value: &Option<Vec<String>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(ids) => serializer.serialize_some(&ids.join(BOOKSTORE_SEPARATOR)),
        None => serializer.serialize_none(),
    }
}

pub const COLUMNS: [&str; 13] = [
    "title",
    "price",
    "author",
    "publisher",
    "isbn",
    "category",
    "translator",
    "pages",
    "date",
    "series",
    "recommendations",
    "bookstores",
    "synopsis",
];
