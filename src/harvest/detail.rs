//! Detail page stage: display name, download count, capability mentions and
//! description.

use super::markup::Document;
use super::text::{capability_mentions, parse_downloads};
use super::traits::{ArtifactBuilder, HarvestStage};
use crate::traits::ExtractError;

#[derive(Debug, Default, Clone, Copy)]
pub struct DetailExtractor;

impl HarvestStage for DetailExtractor {
    fn apply(&self, page: &Document, record: &mut ArtifactBuilder) -> Result<(), ExtractError> {
        if let Some(name) = page.first_heading()? {
            record.set_display_name(name);
        }

        let text = page.visible_text();
        if let Some(downloads) = parse_downloads(&text) {
            record.set_popularity(downloads);
        }
        record.add_capabilities(capability_mentions(&text));

        let description = match page.readme_text()? {
            Some(readme) => Some(readme),
            None => page.meta_description()?,
        };
        if let Some(description) = description {
            record.set_description(&description);
        }

        Ok(())
    }

    fn stage_name(&self) -> &'static str {
        "detail"
    }
}
