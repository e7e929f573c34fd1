/// How much an extraction strategy knows about each listing. Ordered richest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExtractionKind {
    /// Items come with attributes from embedded structured data
    Structured,
    /// Ids taken from listing links
    Link,
    /// Ids pattern-matched out of arbitrary markup
    Pattern,
}

/// A listing candidate before normalization. The id is not yet validated.
#[derive(Debug, Clone, PartialEq)]
pub struct RawListing {
    pub id: String,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub city: Option<String>,
    pub bedrooms: Option<u32>,
    pub surface: Option<f64>,
}

impl RawListing {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            price: None,
            city: None,
            bedrooms: None,
            surface: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawItem {
    Id(String),
    Listing(RawListing),
}

/// Output of one extraction strategy over one page
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub strategy: &'static str,
    pub kind: ExtractionKind,
    pub items: Vec<RawItem>,
}

impl Extraction {
    pub fn new(strategy: &'static str, kind: ExtractionKind, items: Vec<RawItem>) -> Self {
        Self { strategy, kind, items }
    }
}
