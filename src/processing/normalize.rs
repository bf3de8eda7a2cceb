//! Mapping of raw CMS posts into canonical [`SearchablePost`] records.

use std::collections::HashSet;

use super::types::{RawPost, RawTaxonomy, SearchablePost, Taxonomy};

/// Reading time assumed when the CMS reports none.
pub const DEFAULT_READING_TIME: u32 = 3;

/// Set of post slugs excluded from indexing.
pub type IgnoreList = HashSet<String>;

/// Normalize a sequence of raw posts, dropping any whose slug is in `ignore_slugs`.
///
/// Output preserves input order; dropped posts leave no trace and raise no error.
pub fn normalize<I>(posts: I, ignore_slugs: Option<&IgnoreList>) -> Vec<SearchablePost>
where
    I: IntoIterator<Item = RawPost>,
{
    posts
        .into_iter()
        .filter(|post| !is_ignored(post, ignore_slugs))
        .map(normalize_post)
        .collect()
}

/// Whether the post's slug appears on the ignore list.
pub fn is_ignored(post: &RawPost, ignore_slugs: Option<&IgnoreList>) -> bool {
    match (ignore_slugs, post.slug.as_deref()) {
        (Some(ignored), Some(slug)) => ignored.contains(slug),
        _ => false,
    }
}

/// Map a single raw post into its canonical form.
pub fn normalize_post(post: RawPost) -> SearchablePost {
    let RawPost {
        id,
        slug,
        url,
        html,
        feature_image,
        feature_image_alt,
        title,
        excerpt,
        published_at,
        reading_time,
        tags,
        authors,
    } = post;

    SearchablePost {
        id,
        slug: slug.unwrap_or_default(),
        url: url.unwrap_or_default(),
        html: html.unwrap_or_default(),
        image: non_empty(feature_image),
        image_alt: non_empty(feature_image_alt),
        title: title.unwrap_or_default(),
        excerpt: non_empty(excerpt),
        published_at: non_empty(published_at),
        reading_time: resolve_reading_time(reading_time),
        tags: flatten_taxonomy(tags),
        authors: flatten_taxonomy(authors),
    }
}

/// Absent and zero reading times both fall back to [`DEFAULT_READING_TIME`].
pub fn resolve_reading_time(value: Option<u32>) -> u32 {
    value
        .filter(|minutes| *minutes > 0)
        .unwrap_or(DEFAULT_READING_TIME)
}

fn flatten_taxonomy(values: Option<Vec<RawTaxonomy>>) -> Vec<Taxonomy> {
    values
        .unwrap_or_default()
        .into_iter()
        .map(|entry| Taxonomy {
            name: entry.name.unwrap_or_default(),
            slug: entry.slug.unwrap_or_default(),
        })
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|inner| !inner.trim().is_empty())
}
