//! Field extractors over a parsed thing response.
//!
//! Every extractor is a pure first-match-wins policy function: "field not
//! found" is a normal absent value, and malformed numerics degrade to the
//! documented defaults. Each policy stands alone so a future refinement
//! (true per-edition publisher disambiguation, say) replaces one function
//! without touching the others.

use crate::common::constants::{ITEM_KIND, LINK_DESIGNER, LINK_PUBLISHER, LINK_SERIES};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Trailing digit run, optionally followed by non-digits, at the end of a
/// series code. The last number in the code is taken as the series index.
static SERIES_INDEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\D*$").unwrap());

fn attr_value(element: ElementRef<'_>) -> Option<String> {
    element.value().attr("value").map(|v| v.to_string())
}

fn first_value(doc: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).unwrap();
    doc.select(&selector).next().and_then(attr_value)
}

/// The item record of the expected kind, or None when the response holds
/// some other kind (skipped silently, not an error).
pub fn item_of_expected_kind(doc: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse(&format!(r#"item[type="{ITEM_KIND}"]"#)).unwrap();
    doc.select(&selector).next()
}

/// Primary display title.
pub fn title(doc: &Html) -> Option<String> {
    first_value(doc, r#"name[type="primary"]"#)
}

/// Designer credits in document order. May legitimately be empty.
pub fn authors(doc: &Html) -> Vec<String> {
    let selector = Selector::parse(&format!(r#"link[type="{LINK_DESIGNER}"]"#)).unwrap();
    doc.select(&selector).filter_map(attr_value).collect()
}

/// Publication year truncated to January 1; the API carries no finer
/// granularity. Absent or non-positive years yield None.
pub fn pub_date(doc: &Html) -> Option<NaiveDate> {
    let year = first_value(doc, "yearpublished")?.parse::<i32>().ok()?;
    if year <= 0 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, 1, 1)
}

/// First publisher credit. The API lists every publisher across all
/// editions; narrowing to the actual edition would need a version scrape
/// that is not implemented here.
pub fn publisher(doc: &Html) -> Option<String> {
    first_value(doc, &format!(r#"link[type="{LINK_PUBLISHER}"]"#))
}

/// Series name and index. The name comes from the first series link, the
/// index from the trailing number of the series code; the two are read
/// independently and can refer to different series (known approximation).
pub fn series(doc: &Html) -> (String, u32) {
    let series = first_value(doc, &format!(r#"link[type="{LINK_SERIES}"]"#)).unwrap_or_default();
    let index = first_value(doc, "seriescode")
        .and_then(|code| {
            let captures = SERIES_INDEX_RE.captures(&code)?;
            captures.get(1)?.as_str().parse::<u32>().ok()
        })
        .unwrap_or(0);
    (series, index)
}

/// Description text, first node verbatim. No trimming is applied.
pub fn comments(doc: &Html) -> Option<String> {
    let selector = Selector::parse("description").unwrap();
    let text = doc.select(&selector).next()?.text().next()?;
    Some(text.to_string())
}

/// Cover image reference. Unused downstream for now; carried on the
/// record for future cover-art support.
pub fn cover(doc: &Html) -> Option<String> {
    // The HTML tree builder rewrites image tags to img.
    first_value(doc, "img")
}
