//! Table fragment stitching and learned-format recognition.
//!
//! Extraction backends hand over raw [`model::TableFragment`]s; the
//! [`stitch::FragmentStitcher`] regroups them into canonical tables, and the
//! [`recognize::FormatRecognizer`] looks the resulting layout up among the
//! formats previously confirmed for an owner scope.

pub mod config;
pub mod fingerprint;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod profile;
pub mod recognize;
pub mod signature;
pub mod similarity;
pub mod stitch;
pub mod store;
pub mod validate;

pub use config::ReconcileConfig;
pub use matcher::{FormatMatch, FormatMatcher};
pub use model::{FormatProfile, MergedTable, StructureDescriptor, TableFragment};
pub use normalize::HeaderNormalizer;
pub use recognize::{FormatRecognizer, Recognition};
pub use stitch::FragmentStitcher;
pub use store::{MemoryProfileStore, ProfileStore, SqliteProfileStore};
