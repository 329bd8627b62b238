//! Harvest module - catalog discovery and per-artifact extraction.
//!
//! This module provides the extraction side of the harvester:
//! - **Markup**: a queryable [`Document`] over raw page markup
//! - **Stages**: [`HarvestStage`] implementations for detail and variant pages
//! - **Listing**: candidate discovery via [`parse_listing`]
//! - **Pipeline**: the per-artifact task via [`pipeline::HarvestPipeline`]

pub mod detail;
pub mod listing;
pub mod markup;
pub mod pipeline;
pub mod text;
pub mod traits;
pub mod variants;

// Re-export commonly used types
pub use detail::DetailExtractor;
pub use listing::parse_listing;
pub use markup::{Document, Link};
pub use pipeline::HarvestPipeline;
pub use traits::{ArtifactBuilder, HarvestStage};
pub use variants::VariantExtractor;
