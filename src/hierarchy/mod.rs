//! Flat records to an aggregated, rebalanced tree.
//!
//! Each stage consumes the previous stage's value and returns a new one:
//! filter -> nest -> normalize -> aggregate -> rebalance. Layout lives in
//! [`crate::layout`] and runs separately so zooming never re-aggregates.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::dataset::{GroupField, Record};
use crate::error::{Result, SunburstError};

mod aggregate;
mod filter;
mod nest;
mod normalize;
mod rebalance;

pub use aggregate::aggregate;
pub use filter::{filter_key, filter_options, filter_records, suggest_filters};
pub use nest::{RawGroup, nest};
pub use normalize::normalize;
pub use rebalance::{ChildScaling, OverflowChunking, RebalanceConfig, RebalanceReport, rebalance};

/// Field ordering of the hierarchy levels above the titles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    LevelCategoryYear,
    LevelYearCategory,
    YearLevelCategory,
}

impl SortOrder {
    /// Grouping fields in nesting order. A degree-name filter pins the
    /// category, so that level is dropped.
    pub fn fields(self, filtered: bool) -> Vec<GroupField> {
        let all: &[GroupField] = match self {
            Self::LevelCategoryYear => &[GroupField::Level, GroupField::Category, GroupField::Year],
            Self::LevelYearCategory => &[GroupField::Level, GroupField::Year, GroupField::Category],
            Self::YearLevelCategory => &[GroupField::Year, GroupField::Level, GroupField::Category],
        };

        all.iter()
            .copied()
            .filter(|field| !filtered || *field != GroupField::Category)
            .collect()
    }

    pub fn label(self) -> String {
        self.fields(false)
            .into_iter()
            .map(GroupField::label)
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

/// The user-selected sort and filter a tree is built for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub sort: SortOrder,
    pub filter: Option<String>,
}

impl Query {
    pub fn new(sort: SortOrder, filter: Option<String>) -> Self {
        Self { sort, filter }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum NodeKind {
    Leaf(Record),
    Branch(Vec<TreeNode>),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreeNode {
    pub name: String,
    pub kind: NodeKind,
    /// True downloads over all descendant leaves.
    pub metric_sum: u64,
    /// Weight used for angular sizing; diverges from `metric_sum` after rebalancing.
    pub display_weight: f64,
    pub leaf_count: usize,
    /// Synthetic node created by the rebalancer.
    pub overflow: bool,
}

impl TreeNode {
    pub fn leaf(name: impl Into<String>, record: Record) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Leaf(record),
            metric_sum: 0,
            display_weight: 0.0,
            leaf_count: 0,
            overflow: false,
        }
    }

    pub fn branch(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Branch(children),
            metric_sum: 0,
            display_weight: 0.0,
            leaf_count: 0,
            overflow: false,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn payload(&self) -> Option<&Record> {
        match &self.kind {
            NodeKind::Leaf(record) => Some(record),
            NodeKind::Branch(_) => None,
        }
    }

    pub fn children(&self) -> &[TreeNode] {
        match &self.kind {
            NodeKind::Leaf(_) => &[],
            NodeKind::Branch(children) => children,
        }
    }

    pub fn find_child(&self, name: &str) -> Option<&TreeNode> {
        self.children().iter().find(|child| child.name == name)
    }

    pub(crate) fn take_children(&mut self) -> Vec<TreeNode> {
        match &mut self.kind {
            NodeKind::Leaf(_) => Vec::new(),
            NodeKind::Branch(children) => std::mem::take(children),
        }
    }

    /// Sets this node's display weight and scales its subtree by the same
    /// factor, keeping children summing to their parent.
    pub(crate) fn rescale(&mut self, weight: f64) {
        let current = self.display_weight;
        self.display_weight = weight;
        if current <= 0.0 {
            return;
        }

        let factor = weight / current;
        if let NodeKind::Branch(children) = &mut self.kind {
            for child in children {
                child.scale_by(factor);
            }
        }
    }

    fn scale_by(&mut self, factor: f64) {
        self.display_weight *= factor;
        if let NodeKind::Branch(children) = &mut self.kind {
            for child in children {
                child.scale_by(factor);
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct BuiltTree {
    pub root: TreeNode,
    pub report: RebalanceReport,
}

/// Runs filter, nest, normalize, aggregate and rebalance for one query.
///
/// A filter that matches nothing is not an error: the result is a root
/// without children whose sums are zero. Settings that `EngineConfig::validate`
/// rejects fail with [`SunburstError::InvalidConfig`] before any work is done.
pub fn build_tree(records: &[Record], query: &Query, config: &EngineConfig) -> Result<BuiltTree> {
    config.validate()?;
    validate_records(records)?;

    let filter = query.filter.as_deref();
    let selected = filter_records(records, filter, config.filter_key_len);
    let fields = query.sort.fields(filter.is_some());
    debug!(
        selected = selected.len(),
        total = records.len(),
        sort = %query.sort.label(),
        "filtered thesis records"
    );

    let root_name = filter.unwrap_or(config.root_label.as_str()).to_string();
    let groups = nest(&selected, &fields);
    let root = aggregate(normalize(root_name, groups));
    let (root, report) = rebalance(root, &config.rebalance);

    if root.leaf_count == 0 {
        info!(filter = ?filter, "query matched no theses; returning empty tree");
    }

    Ok(BuiltTree { root, report })
}

fn validate_records(records: &[Record]) -> Result<()> {
    for (index, record) in records.iter().enumerate() {
        let missing = [
            ("degree_name_1", &record.level),
            ("degree_name_2", &record.category),
            ("year", &record.year),
            ("title", &record.title),
        ]
        .into_iter()
        .find(|(_, value)| value.is_empty());

        if let Some((field, _)) = missing {
            return Err(SunburstError::MalformedRecord { index, field });
        }
    }
    Ok(())
}
