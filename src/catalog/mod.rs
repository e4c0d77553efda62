// Catalog domain logic.
// Query building, featured ordering, readme header parsing, and response shapes.

pub mod featured;
pub mod metadata;
pub mod query;
pub mod types;

pub use featured::FeaturedList;
pub use metadata::extract_headers;
pub use query::{ListParams, ListRequest};
pub use types::{ChangelogEntry, FALLBACK_BRANCH, PluginDetail};
