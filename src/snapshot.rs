//! Immutable chart state: the laid-out tree for one query plus the current
//! zoom center. Every change of sort, filter or zoom produces a new snapshot.

use std::sync::Arc;

use tracing::debug;

use crate::config::EngineConfig;
use crate::dataset::Record;
use crate::error::Result;
use crate::hierarchy::{Query, RebalanceReport, build_tree};
use crate::layout::{NodeId, NodeSummary, Sunburst, View};

#[derive(Clone, Debug)]
pub struct Snapshot {
    sunburst: Arc<Sunburst>,
    center: NodeId,
    query: Query,
    report: RebalanceReport,
}

impl Snapshot {
    /// Runs the full pipeline for `query` and centers the chart on the root.
    pub fn build(records: &[Record], query: Query, config: &EngineConfig) -> Result<Self> {
        let built = build_tree(records, &query, config)?;
        let sunburst = Sunburst::build(built.root, config.max_visible_depth);
        debug!(nodes = sunburst.len(), "laid out sunburst");

        Ok(Self {
            sunburst: Arc::new(sunburst),
            center: NodeId::ROOT,
            query,
            report: built.report,
        })
    }

    pub fn sunburst(&self) -> &Sunburst {
        &self.sunburst
    }

    pub fn center(&self) -> NodeId {
        self.center
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn report(&self) -> RebalanceReport {
        self.report
    }

    pub fn view(&self) -> Result<View> {
        self.sunburst.view(self.center)
    }

    pub fn center_summary(&self) -> Result<NodeSummary> {
        self.sunburst.summary(self.center)
    }

    /// Zoom in response to a click on `target`.
    ///
    /// A click on the outer ring zooms to the clicked node's parent, so the
    /// new center stays adjacent to the old one. Clicking a leaf changes
    /// nothing.
    pub fn zoom_in(&self, target: NodeId) -> Result<Self> {
        let center_depth = self.sunburst.node(self.center)?.depth;
        let mut node = self.sunburst.node(target)?;

        if node.depth.saturating_sub(center_depth) > 1
            && let Some(parent) = node.parent
        {
            node = self.sunburst.node(parent)?;
        }

        if node.children.is_empty() {
            return Ok(self.clone());
        }

        Ok(self.with_center(node.id))
    }

    /// Moves the center to its parent; a no-op at the root.
    pub fn zoom_out(&self) -> Result<Self> {
        let center = self.sunburst.node(self.center)?;
        Ok(match center.parent {
            Some(parent) => self.with_center(parent),
            None => self.clone(),
        })
    }

    /// Centers directly on `target` if it has children.
    pub fn focus(&self, target: NodeId) -> Result<Self> {
        let node = self.sunburst.node(target)?;
        if node.children.is_empty() {
            return Ok(self.clone());
        }
        Ok(self.with_center(target))
    }

    fn with_center(&self, center: NodeId) -> Self {
        debug!(center = center.index(), "re-rooted view");
        Self {
            sunburst: Arc::clone(&self.sunburst),
            center,
            query: self.query.clone(),
            report: self.report,
        }
    }
}
