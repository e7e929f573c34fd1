use crate::models::{ListingId, ListingRecord, Snapshot};
use crate::scrapers::types::{Extraction, RawItem};
use std::collections::BTreeMap;
use tracing::debug;

/// Canonical listings from the strategy that won.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// `None` when no strategy produced a valid id
    pub strategy: Option<&'static str>,
    pub records: BTreeMap<ListingId, ListingRecord>,
}

impl Normalized {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.records.keys().cloned().collect()
    }

    /// Records for `ids`, falling back to a bare record for ids not seen here.
    pub fn records_for<'a, I>(&self, ids: I) -> Vec<ListingRecord>
    where
        I: IntoIterator<Item = &'a ListingId>,
    {
        ids.into_iter()
            .map(|id| {
                self.records
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| ListingRecord::bare(id.clone()))
            })
            .collect()
    }
}

/// Pick the richest extraction that yields at least one valid id and
/// canonicalize its items.
///
/// Extractions are ranked by kind (structured, then links, then patterns),
/// keeping the given order within a kind. A poorer strategy is only used when
/// every richer one produced nothing valid.
pub fn normalize(mut extractions: Vec<Extraction>) -> Normalized {
    extractions.sort_by_key(|e| e.kind);

    for extraction in extractions {
        let records = canonicalize(&extraction);
        debug!(
            strategy = extraction.strategy,
            candidates = extraction.items.len(),
            valid = records.len(),
            "extraction strategy evaluated"
        );
        if !records.is_empty() {
            return Normalized {
                strategy: Some(extraction.strategy),
                records,
            };
        }
    }

    Normalized::default()
}

fn canonicalize(extraction: &Extraction) -> BTreeMap<ListingId, ListingRecord> {
    let mut records: BTreeMap<ListingId, ListingRecord> = BTreeMap::new();

    for item in &extraction.items {
        let record = match item {
            RawItem::Id(raw) => ListingId::parse(raw).map(ListingRecord::bare),
            RawItem::Listing(raw) => ListingId::parse(&raw.id).map(|id| ListingRecord {
                id,
                title: clean(raw.title.as_deref()),
                price: raw.price.filter(|p| p.is_finite() && *p > 0.0),
                city: clean(raw.city.as_deref()),
                bedrooms: raw.bedrooms,
                surface: raw.surface.filter(|s| s.is_finite() && *s > 0.0),
            }),
        };

        match record {
            Ok(record) => match records.get_mut(&record.id) {
                Some(existing) => existing.merge(record),
                None => {
                    records.insert(record.id.clone(), record);
                }
            },
            Err(rejected) => {
                debug!(strategy = extraction.strategy, %rejected, "dropping candidate");
            }
        }
    }

    records
}

fn clean(value: Option<&str>) -> Option<String> {
    let text = value?.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::types::{ExtractionKind, RawListing};

    const A: &str = "aaaaaaaa-0000-0000-0000-000000000001";
    const B: &str = "bbbbbbbb-0000-0000-0000-000000000002";
    const C: &str = "cccccccc-0000-0000-0000-000000000003";

    fn id(raw: &str) -> ListingId {
        ListingId::parse(raw).unwrap()
    }

    fn ids(strategy: &'static str, kind: ExtractionKind, raw: &[&str]) -> Extraction {
        Extraction::new(
            strategy,
            kind,
            raw.iter().map(|r| RawItem::Id(r.to_string())).collect(),
        )
    }

    #[test]
    fn prefers_structured_over_links_regardless_of_order() {
        let structured = Extraction::new(
            "json-ld",
            ExtractionKind::Structured,
            vec![RawItem::Listing(RawListing {
                title: Some("  Studio\n in  Utrecht ".into()),
                price: Some(1250.0),
                ..RawListing::with_id(A)
            })],
        );
        let links = ids("listing-links", ExtractionKind::Link, &[A, B]);

        let normalized = normalize(vec![links, structured]);

        assert_eq!(normalized.strategy, Some("json-ld"));
        assert_eq!(normalized.len(), 1);
        let record = &normalized.records[&id(A)];
        assert_eq!(record.title.as_deref(), Some("Studio in Utrecht"));
        assert_eq!(record.price, Some(1250.0));
    }

    #[test]
    fn falls_back_only_when_richer_strategies_yield_nothing() {
        let normalized = normalize(vec![
            ids("json-ld", ExtractionKind::Structured, &[]),
            ids("listing-links", ExtractionKind::Link, &["/listing/latest", "not-a-uuid"]),
            ids("nuxt-links", ExtractionKind::Link, &[B]),
            ids("property-cards", ExtractionKind::Pattern, &[A, B, C]),
        ]);

        assert_eq!(normalized.strategy, Some("nuxt-links"));
        assert_eq!(normalized.snapshot(), [id(B)].into_iter().collect::<Snapshot>());
    }

    #[test]
    fn deduplicates_and_canonicalizes_case() {
        let normalized = normalize(vec![ids(
            "listing-links",
            ExtractionKind::Link,
            &[A, &A.to_uppercase(), &format!(" {B} "), B],
        )]);

        assert_eq!(normalized.len(), 2);
        assert!(normalized.records.contains_key(&id(A)));
        assert!(normalized.records.contains_key(&id(B)));
    }

    #[test]
    fn duplicate_structured_items_merge_attributes() {
        let normalized = normalize(vec![Extraction::new(
            "json-ld",
            ExtractionKind::Structured,
            vec![
                RawItem::Listing(RawListing {
                    city: Some("Amsterdam".into()),
                    ..RawListing::with_id(A)
                }),
                RawItem::Listing(RawListing {
                    city: Some("Rotterdam".into()),
                    bedrooms: Some(2),
                    ..RawListing::with_id(A)
                }),
            ],
        )]);

        let record = &normalized.records[&id(A)];
        assert_eq!(record.city.as_deref(), Some("Amsterdam"));
        assert_eq!(record.bedrooms, Some(2));
    }

    #[test]
    fn nonsense_attributes_are_dropped() {
        let normalized = normalize(vec![Extraction::new(
            "json-ld",
            ExtractionKind::Structured,
            vec![RawItem::Listing(RawListing {
                title: Some("   ".into()),
                price: Some(f64::NAN),
                surface: Some(-3.0),
                ..RawListing::with_id(C)
            })],
        )]);

        assert_eq!(normalized.records[&id(C)], ListingRecord::bare(id(C)));
    }

    #[test]
    fn nothing_valid_yields_empty_result() {
        let normalized = normalize(vec![ids("listing-links", ExtractionKind::Link, &["x", "y"])]);
        assert!(normalized.is_empty());
        assert_eq!(normalized.strategy, None);
        assert!(normalize(Vec::new()).is_empty());
    }

    #[test]
    fn records_for_unknown_ids_are_bare() {
        let normalized = normalize(vec![ids("listing-links", ExtractionKind::Link, &[A])]);
        let records = normalized.records_for([id(A), id(B)].iter());
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], ListingRecord::bare(id(B)));
    }
}
