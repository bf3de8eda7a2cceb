//! Post sync pipeline: normalization, fragmentation, text extraction, and index orchestration.

pub mod fragmenter;
pub mod normalize;
mod orchestrator;
pub mod pipeline;
mod service;
pub mod text;
pub mod types;

pub use fragmenter::{Fragmenter, HeadingFragmenter};
pub use normalize::{IgnoreList, normalize, normalize_post};
pub use orchestrator::index_fragments;
pub use pipeline::FragmentPipeline;
pub use service::{SyncApi, SyncService};
pub use text::{HtmlTextExtractor, TextExtractor};
pub use types::{
    ContentEvent, CustomRanking, FragmentError, RawPost, SearchableFragment, SearchablePost,
    SyncError, SyncOutcome, Taxonomy, UpsertSummary, WebhookRequest,
};
