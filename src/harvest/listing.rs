//! Listing page discovery: candidate identifiers plus the card metadata shown
//! next to them.

use std::collections::HashSet;

use super::markup::Document;
use super::text::{capability_words, collapse_whitespace, parse_pulls, strip_capabilities};
use crate::model::{CandidateRecord, HarvestMode};
use crate::traits::ExtractError;

const LISTING_LINKS: &str = r#"a[href*="/library/"]"#;

/// Path segment under `/library/` that a link points to.
///
/// Accepts site-relative and absolute links; query strings, fragments and
/// trailing slashes are dropped.
pub(crate) fn library_suffix(href: &str) -> Option<&str> {
    let path = match href.find("://") {
        Some(scheme_end) => {
            let rest = &href[scheme_end + 3..];
            &rest[rest.find('/')?..]
        }
        None => href,
    };
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let suffix = path.strip_prefix("/library/")?.trim_end_matches('/');
    (!suffix.is_empty()).then_some(suffix)
}

/// Extracts candidates from the listing page.
///
/// Candidates come back in discovery order, one per identifier, restricted
/// to the identifiers `mode` admits.
pub fn parse_listing(markup: &str, mode: HarvestMode) -> Result<Vec<CandidateRecord>, ExtractError> {
    let page = Document::parse(markup);
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for link in page.links(LISTING_LINKS)? {
        let Some(identifier) = library_suffix(&link.href) else {
            continue;
        };
        // variant links (`name:tag`) are not catalog entries
        if identifier.contains(':') || !mode.admits(identifier) {
            continue;
        }
        if !seen.insert(identifier.to_string()) {
            continue;
        }
        candidates.push(candidate_from_card(identifier, &link.text));
    }

    Ok(candidates)
}

fn candidate_from_card(identifier: &str, card_text: &str) -> CandidateRecord {
    let capability_tags = capability_words(card_text);
    let pulls = parse_pulls(card_text);

    let mut summary = card_text.to_string();
    if let Some(count) = &pulls {
        summary = summary.replace(&count.raw, "");
    }
    let summary = strip_capabilities(&summary, &capability_tags);
    let summary = collapse_whitespace(
        &summary
            .split_whitespace()
            .filter(|word| !word.eq_ignore_ascii_case(identifier))
            .collect::<Vec<_>>()
            .join(" "),
    );

    CandidateRecord {
        identifier: identifier.to_string(),
        capability_tags,
        popularity_count: pulls.as_ref().map(|c| c.value),
        popularity_raw_text: pulls.map(|c| c.raw),
        summary_text: (!summary.is_empty()).then_some(summary),
    }
}
