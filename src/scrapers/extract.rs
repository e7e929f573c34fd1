use crate::models::ListingId;
use crate::scrapers::types::{Extraction, ExtractionKind, RawItem, RawListing};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use tracing::debug;

static LISTING_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/listing/([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})").unwrap()
});

static JSON_LD: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static LISTING_LINKS: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"a[href*="/listing/"]"#).unwrap());
static NUXT_LINKS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[href*="listing"], [to*="listing"]"#).unwrap());
static CARDS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[class*="property"], [class*="listing"], [class*="card"]"#).unwrap()
});

/// Run every extraction strategy over a rendered page, richest first.
pub fn extract_listings(html: &str) -> Vec<Extraction> {
    let document = Html::parse_document(html);

    let extractions = vec![
        Extraction::new("json-ld", ExtractionKind::Structured, json_ld(&document)),
        Extraction::new("listing-links", ExtractionKind::Link, listing_links(&document)),
        Extraction::new("nuxt-links", ExtractionKind::Link, nuxt_links(&document)),
        Extraction::new("property-cards", ExtractionKind::Pattern, property_cards(&document)),
    ];

    for extraction in &extractions {
        debug!(strategy = extraction.strategy, found = extraction.items.len(), "extracted");
    }
    extractions
}

fn json_ld(document: &Html) -> Vec<RawItem> {
    let mut items = Vec::new();
    for script in document.select(&JSON_LD) {
        let text = script.text().collect::<String>();
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => walk_ld(&value, &mut items),
            Err(e) => debug!(error = %e, "skipping unparsable ld+json block"),
        }
    }
    items
}

fn walk_ld(value: &Value, out: &mut Vec<RawItem>) {
    match value {
        Value::Array(values) => values.iter().for_each(|v| walk_ld(v, out)),
        Value::Object(map) => {
            if let Some(listing) = ld_listing(map) {
                out.push(RawItem::Listing(listing));
            }
            for key in ["@graph", "itemListElement", "item", "mainEntity"] {
                if let Some(nested) = map.get(key) {
                    walk_ld(nested, out);
                }
            }
        }
        _ => {}
    }
}

fn ld_listing(map: &Map<String, Value>) -> Option<RawListing> {
    let id = ["url", "@id"]
        .iter()
        .filter_map(|key| map.get(*key)?.as_str())
        .find_map(|url| LISTING_HREF.captures(url).map(|c| c[1].to_string()))
        .or_else(|| {
            map.get("identifier")?
                .as_str()
                .and_then(ListingId::find_in)
                .map(String::from)
        })?;

    let price = map
        .get("offers")
        .and_then(|offers| offers.get("price"))
        .or_else(|| map.get("price"))
        .and_then(number);
    let city = map
        .get("address")
        .and_then(|a| a.get("addressLocality"))
        .and_then(Value::as_str)
        .map(String::from);
    let bedrooms = map
        .get("numberOfBedrooms")
        .or_else(|| map.get("numberOfRooms"))
        .and_then(number)
        .filter(|n| *n >= 0.0 && *n < 100.0)
        .map(|n| n as u32);
    let surface = map
        .get("floorSize")
        .and_then(|size| size.get("value").or(Some(size)))
        .and_then(number);

    Some(RawListing {
        id,
        title: map.get("name").and_then(Value::as_str).map(String::from),
        price,
        city,
        bedrooms,
        surface,
    })
}

/// Numbers show up both as JSON numbers and as strings like "€ 1250.00",
/// "€ 1.250" or "1.250,50".
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_localized(s),
        _ => None,
    }
}

/// The last separator is decimal when both `.` and `,` appear. A lone
/// separator is a thousands mark when it repeats or groups exactly three
/// trailing digits.
fn parse_localized(text: &str) -> Option<f64> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let kept = kept.trim_matches(|c| c == '.' || c == ',');

    let decimal = match (kept.rfind('.'), kept.rfind(',')) {
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (Some(at), None) | (None, Some(at)) => {
            let sep = if kept[at..].starts_with('.') { '.' } else { ',' };
            let repeated = kept.matches(sep).count() > 1;
            let grouped = kept.len() - at - 1 == 3;
            (!repeated && !grouped).then_some(sep)
        }
        (None, None) => None,
    };

    let normalized: String = kept
        .chars()
        .filter_map(|c| match c {
            '.' | ',' if Some(c) == decimal => Some('.'),
            '.' | ',' => None,
            digit => Some(digit),
        })
        .collect();
    normalized.parse().ok()
}

fn listing_links(document: &Html) -> Vec<RawItem> {
    document
        .select(&LISTING_LINKS)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            let id = LISTING_HREF.captures(href)?[1].to_string();
            let title = link
                .value()
                .attr("aria-label")
                .map(String::from)
                .or_else(|| Some(text_of(&link)))
                .filter(|t| !t.trim().is_empty());
            Some(RawItem::Listing(RawListing {
                title,
                ..RawListing::with_id(id)
            }))
        })
        .collect()
}

fn nuxt_links(document: &Html) -> Vec<RawItem> {
    document
        .select(&NUXT_LINKS)
        .filter_map(|el| {
            let target = el.value().attr("href").or_else(|| el.value().attr("to"))?;
            ListingId::find_in(target).map(|id| RawItem::Id(id.to_string()))
        })
        .collect()
}

/// First UUID inside each card-ish element.
fn property_cards(document: &Html) -> Vec<RawItem> {
    document
        .select(&CARDS)
        .filter_map(|card| ListingId::find_in(&card.html()).map(|id| RawItem::Id(id.to_string())))
        .collect()
}

fn text_of(el: &ElementRef<'_>) -> String {
    el.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}
