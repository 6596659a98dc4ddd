//! Hierarchy aggregation and sunburst layout for thesis download statistics.
//!
//! Records are grouped by degree level, degree name and year, summed
//! bottom-up, rebalanced so no ring gets crowded, and laid out as a zoomable
//! sunburst. Rendering is left to the caller.

pub mod config;
pub mod dataset;
pub mod error;
pub mod hierarchy;
pub mod layout;
pub mod snapshot;
pub mod util;

pub use config::EngineConfig;
pub use dataset::{GroupField, Record, load_records, parse_records};
pub use error::{Result, SunburstError};
pub use hierarchy::{Query, SortOrder, TreeNode, build_tree};
pub use layout::{NodeId, Sector, Sunburst, View};
pub use snapshot::Snapshot;
