//! Sunburst partition layout.
//!
//! The aggregated tree is moved into an arena once per query. Geometry for the
//! full tree is computed at build time; zooming only recomputes angles for the
//! chosen center's subtree (see [`Sunburst::view`]).

use std::collections::HashMap;
use std::f64::consts::TAU;

use serde::Serialize;
use tracing::debug;

use crate::dataset::Record;
use crate::error::{Result, SunburstError};
use crate::hierarchy::{NodeKind, TreeNode};

mod view;

pub use view::{Sector, View};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SunburstNode {
    pub id: NodeId,
    pub name: String,
    /// Ancestor names below the root joined with `.`; empty for the root.
    pub path: String,
    pub depth: usize,
    pub parent: Option<NodeId>,
    /// Ordered by descending display weight, then name.
    pub children: Vec<NodeId>,
    pub payload: Option<Record>,
    pub metric_sum: u64,
    pub display_weight: f64,
    pub leaf_count: usize,
    pub overflow: bool,
    pub angle_start: f64,
    pub angle_span: f64,
    pub depth_band: usize,
}

impl SunburstNode {
    pub fn is_leaf(&self) -> bool {
        self.payload.is_some()
    }
}

/// Center-panel and breadcrumb information for one node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeSummary {
    pub name: String,
    pub path: String,
    pub downloads: u64,
    pub theses: usize,
    pub is_leaf: bool,
    pub url: Option<String>,
    pub breadcrumbs: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct Sunburst {
    nodes: Vec<SunburstNode>,
    index_by_path: HashMap<String, NodeId>,
    max_visible_depth: usize,
}

impl Sunburst {
    pub fn build(root: TreeNode, max_visible_depth: usize) -> Self {
        let mut nodes = Vec::with_capacity(root.leaf_count.saturating_mul(2).max(1));
        insert_node(&mut nodes, root, None, 0, String::new());

        // paths are dot-joined names, so a title containing '.' can shadow a
        // deeper node; the first node in pre-order keeps the path
        let mut index_by_path = HashMap::with_capacity(nodes.len());
        for node in &nodes {
            if let Some(&first) = index_by_path.get(&node.path) {
                debug!(
                    path = %node.path,
                    kept = ?first,
                    shadowed = ?node.id,
                    "duplicate node path"
                );
                continue;
            }
            index_by_path.insert(node.path.clone(), node.id);
        }

        let mut sunburst = Self {
            nodes,
            index_by_path,
            max_visible_depth: max_visible_depth.max(1),
        };
        sunburst.assign_geometry();
        sunburst
    }

    pub fn root(&self) -> &SunburstNode {
        &self.nodes[NodeId::ROOT.0]
    }

    pub fn nodes(&self) -> &[SunburstNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Result<&SunburstNode> {
        self.nodes.get(id.0).ok_or(SunburstError::UnknownNode(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the query selected no theses.
    pub fn is_empty(&self) -> bool {
        self.root().children.is_empty()
    }

    pub fn max_visible_depth(&self) -> usize {
        self.max_visible_depth
    }

    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        self.index_by_path.get(path).copied()
    }

    /// Nodes from just below the root down to `id`, highest first.
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut chain = Vec::new();
        let mut cursor = self.node(id)?;
        while let Some(parent) = cursor.parent {
            chain.push(cursor.id);
            cursor = &self.nodes[parent.0];
        }
        chain.reverse();
        Ok(chain)
    }

    pub fn summary(&self, id: NodeId) -> Result<NodeSummary> {
        let node = self.node(id)?;
        let breadcrumbs = self
            .ancestors(id)?
            .into_iter()
            .map(|ancestor| self.nodes[ancestor.0].name.clone())
            .collect();

        Ok(NodeSummary {
            name: node.name.clone(),
            path: node.path.clone(),
            downloads: node.metric_sum,
            theses: node.leaf_count,
            is_leaf: node.is_leaf(),
            url: node.payload.as_ref().and_then(|record| record.url.clone()),
            breadcrumbs,
        })
    }

    /// Splits `span` starting at `start` among the children of `id` in
    /// proportion to their display weights.
    fn partition(&self, id: NodeId, start: f64, span: f64) -> Vec<(NodeId, f64, f64)> {
        let node = &self.nodes[id.0];
        let total = node
            .children
            .iter()
            .map(|child| self.nodes[child.0].display_weight)
            .sum::<f64>();

        let mut cursor = start;
        node.children
            .iter()
            .map(|&child| {
                let child_span = if total > 0.0 {
                    span * self.nodes[child.0].display_weight / total
                } else {
                    0.0
                };
                let slot = (child, cursor, child_span);
                cursor += child_span;
                slot
            })
            .collect()
    }

    fn assign_geometry(&mut self) {
        let mut stack = vec![(NodeId::ROOT, 0.0, TAU)];

        while let Some((id, start, span)) = stack.pop() {
            let slots = self.partition(id, start, span);
            let node = &mut self.nodes[id.0];
            node.angle_start = start;
            node.angle_span = span;
            node.depth_band = node.depth;
            stack.extend(slots);
        }
    }
}

fn insert_node(
    nodes: &mut Vec<SunburstNode>,
    tree: TreeNode,
    parent: Option<NodeId>,
    depth: usize,
    path: String,
) -> NodeId {
    let id = NodeId(nodes.len());
    let TreeNode {
        name,
        kind,
        metric_sum,
        display_weight,
        leaf_count,
        overflow,
    } = tree;

    let (payload, mut children) = match kind {
        NodeKind::Leaf(record) => (Some(record), Vec::new()),
        NodeKind::Branch(children) => (None, children),
    };
    children.sort_by(|a, b| {
        b.display_weight
            .total_cmp(&a.display_weight)
            .then_with(|| a.name.cmp(&b.name))
    });

    nodes.push(SunburstNode {
        id,
        name,
        path,
        depth,
        parent,
        children: Vec::with_capacity(children.len()),
        payload,
        metric_sum,
        display_weight,
        leaf_count,
        overflow,
        angle_start: 0.0,
        angle_span: 0.0,
        depth_band: 0,
    });

    for child in children {
        let child_path = if depth == 0 {
            child.name.clone()
        } else {
            format!("{}.{}", nodes[id.0].path, child.name)
        };
        let child_id = insert_node(nodes, child, Some(id), depth + 1, child_path);
        nodes[id.0].children.push(child_id);
    }

    id
}
