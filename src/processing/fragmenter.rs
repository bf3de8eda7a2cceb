//! Heading-bounded fragmentation of post HTML.
//!
//! The post HTML is parsed and its top-level nodes are grouped into sections. A new section
//! opens at every top-level `<h2>` and `<h3>` element, so markup inside comments or raw-text
//! elements such as `<script>` never creates a boundary. Fragments keep the full post
//! metadata plus:
//!
//! - `objectID` of the form `{post_id}_{position}`, stable across re-syncs so repeated
//!   webhooks overwrite the same records;
//! - the opening `heading` and its `anchor` (the heading `id`, or a slug of its text);
//! - `headings`, the list of every heading in the post;
//! - `customRanking` values consumed by the index's ranking settings.

use scraper::{ElementRef, Html, Node, Selector};

use super::types::{CustomRanking, FragmentError, SearchableFragment, SearchablePost};

const HEADING_SELECTOR: &str = "h2, h3";

/// Ranking weight of the untitled introduction before the first heading.
const INTRO_WEIGHT: u32 = 100;
const H2_WEIGHT: u32 = 80;
const H3_WEIGHT: u32 = 60;

/// Splits a normalized post into index-ready fragments.
pub trait Fragmenter: Send + Sync {
    /// Produce one or more fragments for `post`, each carrying the post identity.
    fn fragment(&self, post: SearchablePost) -> Result<Vec<SearchableFragment>, FragmentError>;
}

/// [`Fragmenter`] that cuts post HTML at top-level `<h2>`/`<h3>` elements.
pub struct HeadingFragmenter {
    heading: Selector,
}

/// One heading-bounded run of top-level nodes, re-serialized as HTML.
#[derive(Default)]
struct Section {
    html: String,
    level: Option<u8>,
    heading: Option<String>,
    anchor: Option<String>,
}

impl HeadingFragmenter {
    /// Compile the heading selector.
    pub fn new() -> Result<Self, FragmentError> {
        let heading = Selector::parse(HEADING_SELECTOR).map_err(|err| FragmentError::Selector {
            selector: HEADING_SELECTOR.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self { heading })
    }

    fn sections(&self, html: &str) -> Vec<Section> {
        let document = Html::parse_fragment(html);
        let mut sections = vec![Section::default()];

        for node in document.root_element().children() {
            let element = ElementRef::wrap(node);
            if let Some(heading) = element
                && self.heading.matches(&heading)
            {
                sections.push(open_section(heading));
            }
            let Some(section) = sections.last_mut() else {
                continue;
            };
            // Comments and doctypes carry no searchable content.
            match (element, node.value()) {
                (Some(element), _) => section.html.push_str(&element.html()),
                (None, Node::Text(text)) => escape_text(&mut section.html, text),
                _ => {}
            }
        }

        sections.retain(|section| !section.html.trim().is_empty());
        sections
    }
}

fn open_section(element: ElementRef<'_>) -> Section {
    let level = if element.value().name().eq_ignore_ascii_case("h2") {
        2
    } else {
        3
    };
    let text = collapse_whitespace(&element.text().collect::<String>());
    let (heading, anchor) = if text.is_empty() {
        (None, None)
    } else {
        let anchor = element
            .value()
            .attr("id")
            .map(str::to_string)
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| slugify(&text));
        (Some(text), Some(anchor))
    };
    Section {
        html: String::new(),
        level: Some(level),
        heading,
        anchor,
    }
}

fn escape_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

impl Fragmenter for HeadingFragmenter {
    fn fragment(&self, post: SearchablePost) -> Result<Vec<SearchableFragment>, FragmentError> {
        let mut sections = self.sections(&post.html);
        if sections.is_empty() {
            sections.push(Section::default());
        }

        let headings: Vec<String> = sections
            .iter()
            .filter_map(|section| section.heading.clone())
            .collect();

        let fragments = sections
            .into_iter()
            .enumerate()
            .map(|(position, section)| SearchableFragment {
                object_id: format!("{}_{}", post.id, position),
                post_id: post.id.clone(),
                slug: post.slug.clone(),
                url: post.url.clone(),
                html: section.html,
                image: post.image.clone(),
                image_alt: post.image_alt.clone(),
                title: post.title.clone(),
                excerpt: post.excerpt.clone(),
                published_at: post.published_at.clone(),
                reading_time: post.reading_time,
                tags: post.tags.clone(),
                authors: post.authors.clone(),
                heading: section.heading,
                anchor: section.anchor,
                headings: headings.clone(),
                custom_ranking: CustomRanking {
                    position,
                    heading: heading_weight(section.level),
                },
            })
            .collect();

        Ok(fragments)
    }
}

fn heading_weight(level: Option<u8>) -> u32 {
    match level {
        None => INTRO_WEIGHT,
        Some(2) => H2_WEIGHT,
        Some(_) => H3_WEIGHT,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase `text`, keep alphanumerics, and join the remaining words with `-`.
pub(crate) fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
