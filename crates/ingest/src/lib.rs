//! Feed fetching, record transformation and the change-gated pipeline.

pub mod error;
pub mod feed;
pub mod pipeline;
pub mod transform;

pub use error::{ErrorKind, IngestError};
pub use feed::{FeedError, FeedSource, HttpFeed};
pub use pipeline::{Outcome, Pipeline};
