use std::f64::consts::TAU;

use serde::Serialize;

use super::{NodeId, Sunburst};
use crate::error::Result;

/// One visible arc of a zoomed view.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sector {
    pub node: NodeId,
    pub name: String,
    pub path: String,
    pub metric_sum: u64,
    pub display_weight: f64,
    pub leaf_count: usize,
    pub is_leaf: bool,
    pub overflow: bool,
    pub angle_start: f64,
    pub angle_span: f64,
    /// Ring index counted from the view center (center = 0).
    pub depth_band: usize,
}

/// Geometry of the rings around one center node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct View {
    pub center: NodeId,
    pub max_depth: usize,
    /// Visible sectors in pre-order, center excluded.
    pub sectors: Vec<Sector>,
}

impl View {
    pub fn sector(&self, id: NodeId) -> Option<&Sector> {
        self.sectors.iter().find(|sector| sector.node == id)
    }

    /// Inner and outer radius of a sector's ring for a chart of `radius`.
    pub fn ring(&self, sector: &Sector, radius: f64) -> (f64, f64) {
        let band = radius / (self.max_depth + 1) as f64;
        (band * sector.depth_band as f64, band * (sector.depth_band + 1) as f64)
    }
}

impl Sunburst {
    /// Re-roots the layout at `center`: the center takes the full circle and
    /// its descendants down to the visible depth are re-partitioned. The
    /// aggregated weights are reused as-is.
    pub fn view(&self, center: NodeId) -> Result<View> {
        self.node(center)?;

        let max_depth = self.max_visible_depth;
        let mut sectors = Vec::new();
        let mut stack = vec![(center, 0.0, TAU, 0usize)];

        while let Some((id, start, span, band)) = stack.pop() {
            let node = &self.nodes[id.0];
            if id != center {
                sectors.push(Sector {
                    node: id,
                    name: node.name.clone(),
                    path: node.path.clone(),
                    metric_sum: node.metric_sum,
                    display_weight: node.display_weight,
                    leaf_count: node.leaf_count,
                    is_leaf: node.is_leaf(),
                    overflow: node.overflow,
                    angle_start: start,
                    angle_span: span,
                    depth_band: band,
                });
            }

            if band < max_depth {
                let slots = self.partition(id, start, span);
                stack.extend(slots.into_iter().rev().map(|(child, child_start, child_span)| {
                    (child, child_start, child_span, band + 1)
                }));
            }
        }

        Ok(View {
            center,
            max_depth,
            sectors,
        })
    }
}
