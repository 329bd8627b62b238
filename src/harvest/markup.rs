//! Queryable view over raw page markup.
//!
//! Extractors only talk to [`Document`]; the markup library stays behind this
//! module so parsing rules can be exercised against small synthetic pages.

use scraper::{ElementRef, Html, Node, Selector};

use super::text::collapse_whitespace;
use crate::traits::ExtractError;

/// Elements whose text is never rendered.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "template"];

/// Elements that delimit one row of a listing or table.
const ROW_ELEMENTS: &[&str] = &["tr", "li"];

/// A hyperlink together with the text around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    /// Collapsed visible text of the link itself
    pub text: String,
    /// Collapsed visible text of the enclosing row
    pub row_text: String,
}

/// Parsed page.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Hyperlinks matching `css`, in document order.
    pub fn links(&self, css: &str) -> Result<Vec<Link>, ExtractError> {
        let selector = compile(css)?;
        let links = self
            .html
            .select(&selector)
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?.trim().to_string();
                Some(Link {
                    href,
                    text: visible_text(anchor),
                    row_text: enclosing_row(anchor).map(visible_text).unwrap_or_default(),
                })
            })
            .collect();
        Ok(links)
    }

    /// Text of the first `h1`/`h2` in document order.
    pub fn first_heading(&self) -> Result<Option<String>, ExtractError> {
        let selector = compile("h1, h2")?;
        Ok(self
            .html
            .select(&selector)
            .map(visible_text)
            .find(|text| !text.is_empty()))
    }

    /// Collapsed visible text of the whole page.
    pub fn visible_text(&self) -> String {
        visible_text(self.html.root_element())
    }

    /// Text of the first element whose `id` mentions "readme", if non-empty.
    pub fn readme_text(&self) -> Result<Option<String>, ExtractError> {
        let selector = compile("[id]")?;
        Ok(self
            .html
            .select(&selector)
            .find(|el| {
                el.value()
                    .id()
                    .is_some_and(|id| id.to_ascii_lowercase().contains("readme"))
            })
            .map(visible_text)
            .filter(|text| !text.is_empty()))
    }

    /// Content of `<meta name="description">`, if non-empty.
    pub fn meta_description(&self) -> Result<Option<String>, ExtractError> {
        let selector = compile(r#"meta[name="description"]"#)?;
        Ok(self
            .html
            .select(&selector)
            .filter_map(|meta| meta.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
            .map(str::to_string))
    }
}

fn compile(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

fn visible_text(element: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in element.descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
            });
            if !hidden {
                parts.push(&**text);
            }
        }
    }
    collapse_whitespace(&parts.join(" "))
}

/// Row of markup that belongs to `anchor` alone.
///
/// Walks up to the nearest row-like ancestor, but never past an element that
/// also holds a link to a different target. When the walk is cut short that
/// way, the widest ancestor seen so far is the row; a lone link with no row
/// around it falls back to its direct parent.
fn enclosing_row(anchor: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let href = anchor.value().attr("href").map(str::trim);
    let mut parents = anchor.ancestors().filter_map(ElementRef::wrap).peekable();
    let parent = parents.peek().copied();

    let mut widest = None;
    for el in parents {
        if links_elsewhere(el, href) {
            return widest.or(parent);
        }
        if ROW_ELEMENTS.contains(&el.value().name()) {
            return Some(el);
        }
        widest = Some(el);
    }
    parent
}

fn links_elsewhere(element: ElementRef<'_>, href: Option<&str>) -> bool {
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "a")
        .filter_map(|el| el.value().attr("href"))
        .any(|other| Some(other.trim()) != href)
}
