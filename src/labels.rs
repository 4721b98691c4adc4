use scraper::{ElementRef, Selector};

/// Attributes published as `Label: value` lines in the book details block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Author,
    Publisher,
    Isbn,
    Category,
    Translator,
    Pages,
    Date,
    Series,
}

impl Attribute {
    pub const ALL: [Attribute; 8] = [
        Attribute::Author,
        Attribute::Publisher,
        Attribute::Isbn,
        Attribute::Category,
        Attribute::Translator,
        Attribute::Pages,
        Attribute::Date,
        Attribute::Series,
    ];

    /// Label text as printed on the site.
    pub fn label(self) -> &'static str {
        match self {
            Attribute::Author => "Autore",
            Attribute::Publisher => "Editore",
            Attribute::Isbn => "Isbn",
            Attribute::Category => "Categoria",
            Attribute::Translator => "Traduttore",
            Attribute::Pages => "Numero pagine",
            Attribute::Date => "Data di Uscita",
            Attribute::Series => "Collana",
        }
    }
}

/// Free-text block of `Label: value` lines, in no particular order.
#[derive(Debug, Default, Clone)]
pub struct LabeledBlock {
    lines: Vec<String>,
}

impl LabeledBlock {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(normalize_line).collect(),
        }
    }

    /// One line per `item` child, or the raw text lines if there are none.
    pub fn from_element(block: ElementRef<'_>, item: &Selector) -> Self {
        let lines: Vec<String> = block
            .select(item)
            .map(|li| normalize_line(&li.text().collect::<String>()))
            .collect();

        if lines.is_empty() {
            return Self::from_text(&block.text().collect::<String>());
        }
        Self { lines }
    }

    /// Value of the first line starting with `label:`; empty values count as absent.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| {
            let rest = line.strip_prefix(label)?.strip_prefix(':')?;
            let value = rest.trim();
            (!value.is_empty()).then_some(value)
        })
    }

    pub fn attribute(&self, attribute: Attribute) -> Option<String> {
        self.get(attribute.label()).map(str::to_owned)
    }

    pub fn missing(&self) -> Vec<Attribute> {
        Attribute::ALL
            .into_iter()
            .filter(|attribute| self.get(attribute.label()).is_none())
            .collect()
    }
}

fn normalize_line(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}
