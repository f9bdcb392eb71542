//! Listing-page parsing and lookup-key resolution
//!
//! The listing markup carries one anchor element per job card. Each card's
//! reference attribute embeds the key the detail API needs, shaped like
//! `/job/<key>?...`. A card missing the attribute still yields a stub (with
//! an empty reference) so the failure surfaces where it can be attributed to
//! a specific job, not silently dropped during parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use thiserror::Error;

/// CSS selector matching one element per job card on a listing page
const JOB_CARD_SELECTOR: &str = ".SerpJob-link";

/// Attribute on a job card carrying the detail reference
const REFERENCE_ATTR: &str = "data-mdref";

/// Pattern extracting the detail-API lookup key from a card reference
static KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/job/(.*)\?").expect("key pattern is valid"));

/// A job discovered on a listing page, prior to detail resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStub {
    /// Opaque reference from the card's attribute; may be empty if the
    /// listing markup did not carry the expected attribute
    pub reference: String,
    /// Display title from the card text (the detail API's title is the
    /// authoritative one for output filenames)
    pub title: String,
}

/// A job reference that does not contain a lookup key
#[derive(Debug, Error)]
#[error("job reference '{0}' does not contain a lookup key")]
pub struct MalformedReference(pub String);

/// Parse a listing page into job stubs, preserving document order.
///
/// Zero matching cards is an empty vector, not an error.
pub fn parse_listing(html: &str) -> Vec<JobStub> {
    let document = Html::parse_document(html);

    let selector = match Selector::parse(JOB_CARD_SELECTOR) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .map(|card| JobStub {
            reference: card
                .value()
                .attr(REFERENCE_ATTR)
                .unwrap_or_default()
                .to_string(),
            title: card.text().collect::<String>().trim().to_string(),
        })
        .collect()
}

/// Extract the detail-API lookup key from a stub reference.
pub fn resolve_job_key(reference: &str) -> Result<String, MalformedReference> {
    KEY_PATTERN
        .captures(reference)
        .and_then(|caps| caps.get(1))
        .map(|key| key.as_str().to_string())
        .ok_or_else(|| MalformedReference(reference.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(reference: &str, title: &str) -> String {
        format!(
            r#"<a class="SerpJob-link" data-mdref="{}">{}</a>"#,
            reference, title
        )
    }

    #[test]
    fn parses_cards_in_document_order() {
        let html = format!(
            "<html><body><div>{}{}{}</div></body></html>",
            card("/job/aaa?x=1", "First Job"),
            card("/job/bbb?x=2", "Second Job"),
            card("/job/ccc?x=3", "Third Job"),
        );

        let stubs = parse_listing(&html);
        assert_eq!(stubs.len(), 3);
        assert_eq!(stubs[0].title, "First Job");
        assert_eq!(stubs[1].reference, "/job/bbb?x=2");
        assert_eq!(stubs[2].title, "Third Job");
    }

    #[test]
    fn zero_cards_is_empty_not_error() {
        let html = "<html><body><p>No results found</p></body></html>";
        assert!(parse_listing(html).is_empty());
    }

    #[test]
    fn card_without_reference_attr_yields_empty_reference() {
        let html = r#"<html><body><a class="SerpJob-link">Orphan Job</a></body></html>"#;
        let stubs = parse_listing(html);
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].reference, "");
        assert_eq!(stubs[0].title, "Orphan Job");
    }

    #[test]
    fn non_card_anchors_are_ignored() {
        let html = format!(
            r#"<html><body><a href="/about">About</a>{}</body></html>"#,
            card("/job/abc?x=1", "Real Job"),
        );
        let stubs = parse_listing(&html);
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].title, "Real Job");
    }

    #[test]
    fn resolves_key_from_reference() {
        let key = resolve_job_key("/job/abc123?utm=x").unwrap();
        assert_eq!(key, "abc123");
    }

    #[test]
    fn empty_reference_is_malformed() {
        let err = resolve_job_key("").unwrap_err();
        assert_eq!(err.to_string(), "job reference '' does not contain a lookup key");
    }

    #[test]
    fn reference_without_job_path_is_malformed() {
        assert!(resolve_job_key("/company/acme?ref=1").is_err());
        assert!(resolve_job_key("/job/no-query-string").is_err());
    }
}
