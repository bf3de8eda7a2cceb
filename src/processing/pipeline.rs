//! Fragment pipeline: fragmentation followed by per-fragment text extraction.

use super::{
    fragmenter::{Fragmenter, HeadingFragmenter},
    text::{HtmlTextExtractor, TextExtractor},
    types::{FragmentError, SearchableFragment, SearchablePost, SyncError},
};

/// Turns a normalized post into finalized, index-ready fragments.
pub struct FragmentPipeline {
    fragmenter: Box<dyn Fragmenter>,
    extractor: Box<dyn TextExtractor>,
}

impl FragmentPipeline {
    /// Build a pipeline from explicit collaborators.
    pub fn new(fragmenter: Box<dyn Fragmenter>, extractor: Box<dyn TextExtractor>) -> Self {
        Self {
            fragmenter,
            extractor,
        }
    }

    /// Pipeline using [`HeadingFragmenter`] and [`HtmlTextExtractor`].
    pub fn with_defaults() -> Result<Self, FragmentError> {
        Ok(Self::new(
            Box::new(HeadingFragmenter::new()?),
            Box::new(HtmlTextExtractor),
        ))
    }

    /// Fragment `post` and replace each fragment's `html` with its plain-text rendering.
    ///
    /// Fragment order is preserved. A fragmenter error aborts the run with no partial output.
    pub fn run(&self, post: SearchablePost) -> Result<Vec<SearchableFragment>, SyncError> {
        let post_id = post.id.clone();
        let fragments = self.fragmenter.fragment(post)?;
        tracing::debug!(post_id = %post_id, fragments = fragments.len(), "Post fragmented");

        Ok(fragments
            .into_iter()
            .map(|mut fragment| {
                fragment.html = self.extractor.to_plain_text(&fragment.html);
                fragment
            })
            .collect())
    }
}
