//! Variant listing stage: one [`VariantRecord`] per distinct tag link.

use std::collections::HashSet;

use super::listing::library_suffix;
use super::markup::Document;
use super::text::{parse_context, parse_modality, parse_size};
use super::traits::{ArtifactBuilder, HarvestStage};
use crate::model::VariantRecord;
use crate::traits::ExtractError;

const TAG_LINKS: &str = r#"a[href*=":"]"#;

#[derive(Debug, Default, Clone, Copy)]
pub struct VariantExtractor;

impl HarvestStage for VariantExtractor {
    fn apply(&self, page: &Document, record: &mut ArtifactBuilder) -> Result<(), ExtractError> {
        let prefix = format!("{}:", record.identifier());
        let mut seen = HashSet::new();
        let mut variants = Vec::new();

        for link in page.links(TAG_LINKS)? {
            let Some(tag) = library_suffix(&link.href) else {
                continue;
            };
            if !tag.starts_with(&prefix) || !seen.insert(tag.to_string()) {
                continue;
            }

            // the tag name itself must not feed the row tokens
            let row = link.row_text.replacen(&link.text, " ", 1);
            let size = parse_size(&row);
            variants.push(VariantRecord {
                variant_tag: tag.to_string(),
                size_bytes: size.as_ref().map(|s| s.bytes),
                size_raw_text: size.map(|s| s.raw),
                context_length: parse_context(&row),
                input_modality: parse_modality(&row),
            });
        }

        record.set_variants(variants);
        Ok(())
    }

    fn stage_name(&self) -> &'static str {
        "variants"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArtifactRecord, CandidateRecord};

    const TAGS: &str = r#"<html><body>
        <nav><a href="/library/alphabet:latest">alphabet:latest</a></nav>
        <table>
          <tr><td><a href="/library/alpha:8b">alpha:8b</a></td><td>4.7GB</td><td>8K</td><td>Text</td></tr>
          <tr><td><a href="/library/alpha:70b-q4">alpha:70b-q4</a></td><td>40GB</td><td>128K</td><td>text, image</td></tr>
          <tr><td><a href="/library/alpha:8b">alpha:8b duplicate</a></td><td>9.9GB</td></tr>
          <tr><td><a href="/library/beta:1b">beta:1b</a></td><td>1GB</td></tr>
          <tr><td><a href="/library/alpha:latest">alpha:latest</a></td><td>updated 2 weeks ago</td></tr>
        </table></body></html>"#;

    fn run(identifier: &str, markup: &str) -> ArtifactRecord {
        let mut builder = ArtifactBuilder::new(CandidateRecord {
            identifier: identifier.to_string(),
            ..Default::default()
        });
        VariantExtractor
            .apply(&Document::parse(markup), &mut builder)
            .unwrap();
        builder.finish()
    }

    #[test]
    fn test_variant_row_scenario() {
        let record = run("alpha", TAGS);
        assert_eq!(
            record.variants[0],
            VariantRecord {
                variant_tag: "alpha:8b".to_string(),
                size_bytes: Some((4.7 * 1024f64.powi(3)).round() as u64),
                size_raw_text: Some("4.7GB".to_string()),
                context_length: Some("8K".to_string()),
                input_modality: Some("Text".to_string()),
            }
        );
    }

    #[test]
    fn test_dedupes_preserving_first_seen_order() {
        let record = run("alpha", TAGS);
        let tags: Vec<&str> = record.variants.iter().map(|v| v.variant_tag.as_str()).collect();
        assert_eq!(tags, vec!["alpha:8b", "alpha:70b-q4", "alpha:latest"]);
        assert_eq!(record.variant_count, Some(3));
        // first occurrence wins
        assert_eq!(record.variants[0].size_raw_text.as_deref(), Some("4.7GB"));
    }

    #[test]
    fn test_unrelated_and_prefix_sharing_links_ignored() {
        let record = run("alpha", TAGS);
        assert!(record.variants.iter().all(|v| v.variant_tag.starts_with("alpha:")));
        assert!(!record.variants.iter().any(|v| v.variant_tag.starts_with("alphabet")));
    }

    #[test]
    fn test_missing_tokens_are_absent() {
        let record = run("alpha", TAGS);
        let latest = &record.variants[2];
        assert_eq!(latest.size_bytes, None);
        assert_eq!(latest.context_length, None);
        assert_eq!(latest.input_modality, None);
    }

    #[test]
    fn test_community_identifier() {
        let page = r#"<ul><li><a href="/library/someone/gamma:q8">someone/gamma:q8</a> 2.1GB</li></ul>"#;
        let record = run("someone/gamma", page);
        assert_eq!(record.variants.len(), 1);
        assert_eq!(record.variants[0].size_raw_text.as_deref(), Some("2.1GB"));
    }

    #[test]
    fn test_rows_nested_in_one_list_item() {
        let page = r#"<ul><li>
            <div><a href="/library/alpha:8b">alpha:8b</a> 4.7GB 8K</div>
            <div><a href="/library/alpha:70b">alpha:70b</a> 40GB 128K</div>
            </li></ul>"#;
        let record = run("alpha", page);
        let sizes: Vec<Option<&str>> = record
            .variants
            .iter()
            .map(|v| v.size_raw_text.as_deref())
            .collect();
        assert_eq!(sizes, vec![Some("4.7GB"), Some("40GB")]);
        assert_eq!(record.variants[1].context_length.as_deref(), Some("128K"));
    }

    #[test]
    fn test_reapplying_to_same_page_is_stable() {
        let page = Document::parse(TAGS);
        let mut builder = ArtifactBuilder::new(CandidateRecord {
            identifier: "alpha".to_string(),
            ..Default::default()
        });
        VariantExtractor.apply(&page, &mut builder).unwrap();
        let once = builder.clone().finish();
        VariantExtractor.apply(&page, &mut builder).unwrap();
        assert_eq!(builder.finish(), once);
    }

    #[test]
    fn test_page_without_variants_sets_zero_count() {
        let record = run("alpha", "<html><body><p>nothing</p></body></html>");
        assert!(record.variants.is_empty());
        assert_eq!(record.variant_count, Some(0));
    }
}
