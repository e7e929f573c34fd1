use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

static CANONICAL_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

static EMBEDDED_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
});

/// Candidate string that does not have the canonical listing id shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a canonical listing id: {0:?}")]
pub struct InvalidListingId(pub String);

/// Canonical listing identity: a lowercase hex UUID string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ListingId(String);

impl ListingId {
    /// Canonicalize a raw candidate. Surrounding whitespace and upper case hex
    /// are accepted; anything else that is not exactly UUID shaped is rejected.
    pub fn parse(raw: &str) -> Result<Self, InvalidListingId> {
        let candidate = raw.trim().to_ascii_lowercase();
        if CANONICAL_ID.is_match(&candidate) {
            Ok(Self(candidate))
        } else {
            Err(InvalidListingId(raw.to_string()))
        }
    }

    /// First UUID-shaped substring of `text`, e.g. the id inside an href.
    pub fn find_in(text: &str) -> Option<Self> {
        EMBEDDED_ID
            .find(text)
            .and_then(|m| Self::parse(m.as_str()).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ListingId {
    type Error = InvalidListingId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ListingId> for String {
    fn from(id: ListingId) -> Self {
        id.0
    }
}

/// A listing as observed on the source page. Everything but the id is best effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: ListingId,
    pub title: Option<String>,
    /// Monthly rent as shown on the source
    pub price: Option<f64>,
    pub city: Option<String>,
    pub bedrooms: Option<u32>,
    /// Living area in m²
    pub surface: Option<f64>,
}

impl ListingRecord {
    pub fn bare(id: ListingId) -> Self {
        Self {
            id,
            title: None,
            price: None,
            city: None,
            bedrooms: None,
            surface: None,
        }
    }

    /// Fill attributes this record lacks from `other`.
    pub fn merge(&mut self, other: ListingRecord) {
        self.title = self.title.take().or(other.title);
        self.price = self.price.or(other.price);
        self.city = self.city.take().or(other.city);
        self.bedrooms = self.bedrooms.or(other.bedrooms);
        self.surface = self.surface.or(other.surface);
    }
}

/// Every listing id observed in one successful fetch cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeSet<ListingId>);

impl Snapshot {
    pub fn new(ids: BTreeSet<ListingId>) -> Self {
        Self(ids)
    }

    pub fn ids(&self) -> &BTreeSet<ListingId> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ListingId> for Snapshot {
    fn from_iter<I: IntoIterator<Item = ListingId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Set difference between two snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub added: BTreeSet<ListingId>,
    pub removed: BTreeSet<ListingId>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
