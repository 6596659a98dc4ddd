//! Child-count rebalancing.
//!
//! A node with more than `threshold` children keeps its `threshold - 1`
//! largest children and moves the rest into a synthetic overflow child. The
//! overflow block is pinned to the weight of the smallest kept sibling so it
//! never dominates the ring; the weight it gives up is handed back to the kept
//! children in proportion to their downloads.
//!
//! Only `display_weight` changes. Download totals and thesis counts of
//! existing nodes are untouched, and any node whose weight changes rescales
//! its subtree so children keep summing to their parent.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{NodeKind, TreeNode};
use crate::error::{Result, SunburstError};

/// How the children moved into an overflow block are scaled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildScaling {
    /// By `overflow weight / moved download total`; the moved children tile
    /// the overflow block exactly.
    #[default]
    OverflowShare,
    /// By `overflow weight / parent download total`, as the ETD sunburst did.
    /// Moved children then cover only part of the overflow block.
    ParentShare,
}

/// Optional splitting of very wide overflow blocks into sub-groups.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OverflowChunking {
    #[default]
    Disabled,
    /// Overflow nodes with more than `trigger` children are split into runs of
    /// at most `size` children, each run getting an equal share of the block.
    Chunks { trigger: usize, size: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceConfig {
    /// Maximum direct children before overflow grouping.
    pub threshold: usize,
    /// Overflow nodes are named `"{overflow_prefix} {parent name}"`.
    pub overflow_prefix: String,
    pub child_scaling: ChildScaling,
    pub chunking: OverflowChunking,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            threshold: 10,
            overflow_prefix: "Other".to_string(),
            child_scaling: ChildScaling::default(),
            chunking: OverflowChunking::default(),
        }
    }
}

impl RebalanceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threshold < 2 {
            return Err(SunburstError::InvalidConfig(format!(
                "rebalance threshold must be at least 2, got {}",
                self.threshold
            )));
        }

        if let OverflowChunking::Chunks { trigger, size } = self.chunking
            && (size == 0 || size > trigger)
        {
            return Err(SunburstError::InvalidConfig(format!(
                "overflow chunk size must be between 1 and the trigger ({trigger}), got {size}"
            )));
        }

        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RebalanceReport {
    pub rebalanced_nodes: usize,
    pub moved_children: usize,
    pub chunked_overflows: usize,
    /// Redistributions or scalings skipped because a divisor was zero.
    pub fallbacks: usize,
}

/// Applies overflow grouping top-down over the whole tree.
pub fn rebalance(root: TreeNode, config: &RebalanceConfig) -> (TreeNode, RebalanceReport) {
    let mut report = RebalanceReport::default();
    let root = rebalance_node(root, config, &mut report);

    debug!(
        rebalanced = report.rebalanced_nodes,
        moved = report.moved_children,
        chunked = report.chunked_overflows,
        fallbacks = report.fallbacks,
        "rebalanced tree"
    );

    (root, report)
}

fn rebalance_node(
    mut node: TreeNode,
    config: &RebalanceConfig,
    report: &mut RebalanceReport,
) -> TreeNode {
    if node.is_leaf() {
        return node;
    }

    let children = node.take_children();
    let children = if node.overflow {
        chunk_overflow(&node, children, config.chunking, report)
    } else if children.len() > config.threshold.max(2) {
        split_overflow(&node, children, config, report)
    } else {
        children
    };

    let children = children
        .into_iter()
        .map(|child| rebalance_node(child, config, report))
        .collect();
    node.kind = NodeKind::Branch(children);
    node
}

fn split_overflow(
    parent: &TreeNode,
    mut children: Vec<TreeNode>,
    config: &RebalanceConfig,
    report: &mut RebalanceReport,
) -> Vec<TreeNode> {
    children.sort_by(|a, b| b.metric_sum.cmp(&a.metric_sum));
    let mut moved = children.split_off(config.threshold.max(2) - 1);
    let mut kept = children;

    let overflow_metric = moved.iter().map(|child| child.metric_sum).sum::<u64>();
    let overflow_leaves = moved.iter().map(|child| child.leaf_count).sum::<usize>();
    let moved_weight = moved.iter().map(|child| child.display_weight).sum::<f64>();
    let pinned = kept.last().map(|child| child.display_weight).unwrap_or(0.0);
    let remainder = moved_weight - pinned;

    let kept_metric = kept.iter().map(|child| child.metric_sum).sum::<u64>();
    if kept_metric == 0 {
        report.fallbacks += 1;
        debug!(node = %parent.name, "kept children have no downloads; skipping redistribution");
    } else {
        for child in &mut kept {
            let share = (remainder * child.metric_sum as f64 / kept_metric as f64).round();
            child.rescale((child.display_weight + share).max(0.0));
        }
    }

    let scale_base = match config.child_scaling {
        ChildScaling::OverflowShare => moved_weight,
        ChildScaling::ParentShare => parent.metric_sum as f64,
    };
    if scale_base > 0.0 {
        let factor = pinned / scale_base;
        for child in &mut moved {
            child.rescale(child.display_weight * factor);
        }
    } else {
        report.fallbacks += 1;
        debug!(
            node = %parent.name,
            "overflow block has no weight; leaving moved children unscaled"
        );
    }

    debug!(
        node = %parent.name,
        kept = kept.len(),
        moved = moved.len(),
        overflow_downloads = overflow_metric,
        pinned_weight = pinned,
        "grouped excess children into overflow block"
    );
    report.rebalanced_nodes += 1;
    report.moved_children += moved.len();

    let name = overflow_name(&config.overflow_prefix, &parent.name, &kept);
    let mut overflow = TreeNode::branch(name, moved);
    overflow.metric_sum = overflow_metric;
    overflow.leaf_count = overflow_leaves;
    overflow.display_weight = pinned;
    overflow.overflow = true;

    kept.push(overflow);
    kept
}

/// `"{prefix} {parent}"`, suffixed with a counter when a kept sibling already
/// carries that name.
fn overflow_name(prefix: &str, parent: &str, kept: &[TreeNode]) -> String {
    let base = format!("{prefix} {parent}");
    let taken = |name: &str| kept.iter().any(|child| child.name == name);
    if !taken(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base} ({n})");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn chunk_overflow(
    block: &TreeNode,
    mut children: Vec<TreeNode>,
    chunking: OverflowChunking,
    report: &mut RebalanceReport,
) -> Vec<TreeNode> {
    let OverflowChunking::Chunks { trigger, size } = chunking else {
        return children;
    };
    if children.len() <= trigger || size == 0 || size > trigger {
        return children;
    }

    // a single group would be chunked again on the next pass
    let group_count = children.len().div_ceil(size);
    if group_count <= 1 {
        return children;
    }
    let group_weight = (block.display_weight / group_count as f64).round();
    let mut groups = Vec::with_capacity(group_count);

    while !children.is_empty() {
        let rest = children.split_off(size.min(children.len()));
        let mut members = std::mem::replace(&mut children, rest);

        let member_weight = (group_weight / members.len() as f64).round();
        for member in &mut members {
            member.rescale(member_weight);
        }

        let metric_sum = members.iter().map(|member| member.metric_sum).sum();
        let leaf_count = members.iter().map(|member| member.leaf_count).sum();
        let name = format!("{} Group {}", block.name, groups.len() + 1);
        let mut group = TreeNode::branch(name, members);
        group.metric_sum = metric_sum;
        group.leaf_count = leaf_count;
        group.display_weight = group_weight;
        group.overflow = true;
        groups.push(group);
    }

    debug!(node = %block.name, groups = groups.len(), "split wide overflow block");
    report.chunked_overflows += 1;
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::record::sample;
    use crate::hierarchy::aggregate;

    fn category(name: &str, downloads: &[u64]) -> TreeNode {
        TreeNode::branch(
            name,
            downloads
                .iter()
                .enumerate()
                .map(|(index, &count)| {
                    let title = format!("{name} thesis {index}");
                    TreeNode::leaf(title.clone(), sample(name, &title, count))
                })
                .collect(),
        )
    }

    fn assert_display_sums(node: &TreeNode) {
        let children = node.children();
        if children.is_empty() {
            return;
        }
        let sum = children.iter().map(|child| child.display_weight).sum::<f64>();
        let tolerance = children.len() as f64 + 1e-6;
        assert!(
            (sum - node.display_weight).abs() <= tolerance,
            "{}: children sum {sum} vs {}",
            node.name,
            node.display_weight
        );
        children.iter().for_each(assert_display_sums);
    }

    fn assert_child_bound(node: &TreeNode, threshold: usize) {
        if !node.overflow {
            assert!(node.children().len() <= threshold, "{} is too wide", node.name);
        }
        for child in node.children() {
            assert_child_bound(child, threshold);
        }
    }

    #[test]
    fn test_twelve_children_collapse_into_overflow() {
        let tree = aggregate(TreeNode::branch(
            "All Theses",
            vec![category("A", &[10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 1, 1])],
        ));
        assert_eq!(tree.children()[0].children().len(), 12);

        let (root, report) = rebalance(tree, &RebalanceConfig::default());
        let a = root.find_child("A").unwrap();
        assert_eq!(a.children().len(), 10);
        assert_eq!(a.metric_sum, 57);

        let overflow = a.find_child("Other A").unwrap();
        assert!(overflow.overflow);
        assert_eq!(overflow.display_weight, 2.0);
        assert_eq!(overflow.metric_sum, 3);
        assert_eq!(overflow.leaf_count, 3);
        assert_eq!(overflow.children().len(), 3);

        let kept = a.children().iter().filter(|c| !c.overflow).collect::<Vec<_>>();
        assert_eq!(kept.len(), 9);
        assert_eq!(kept[8].metric_sum, 2);
        assert_eq!(kept.iter().map(|c| c.metric_sum).sum::<u64>(), 54);

        assert_eq!(report.rebalanced_nodes, 1);
        assert_eq!(report.moved_children, 3);
        assert_display_sums(&root);
    }

    #[test]
    fn test_remainder_goes_to_kept_children_by_share() {
        let mut downloads = vec![100, 90, 80, 70, 60, 50, 40, 30, 20];
        downloads.extend([15, 15, 15, 15, 15]);
        let tree = aggregate(category("B", &downloads));

        let (root, _) = rebalance(tree, &RebalanceConfig::default());
        let overflow = root.find_child("Other B").unwrap();
        assert_eq!(overflow.display_weight, 20.0);
        assert_eq!(overflow.metric_sum, 75);

        // remainder 55 over a kept total of 540
        let top = &root.children()[0];
        assert_eq!(top.metric_sum, 100);
        assert_eq!(top.display_weight, 100.0 + (55.0_f64 * 100.0 / 540.0).round());

        let moved_weight = overflow.children().iter().map(|c| c.display_weight).sum::<f64>();
        assert!((moved_weight - 20.0).abs() < 1e-9);
        assert_display_sums(&root);
    }

    #[test]
    fn test_parent_share_scaling() {
        let tree = aggregate(category("C", &[10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 1, 1]));
        let config = RebalanceConfig {
            child_scaling: ChildScaling::ParentShare,
            ..RebalanceConfig::default()
        };

        let (root, _) = rebalance(tree, &config);
        let overflow = root.find_child("Other C").unwrap();
        for child in overflow.children() {
            assert!((child.display_weight - 2.0 / 57.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_small_tree_is_unchanged() {
        let tree = aggregate(TreeNode::branch(
            "All Theses",
            vec![category("A", &[3, 2]), category("B", &[7]), category("C", &[1, 1, 1])],
        ));

        let (root, report) = rebalance(tree.clone(), &RebalanceConfig::default());
        assert_eq!(root, tree);
        assert_eq!(report, RebalanceReport::default());
    }

    #[test]
    fn test_zero_download_children_fall_back() {
        let tree = aggregate(category("Z", &[0; 12]));

        let (root, report) = rebalance(tree, &RebalanceConfig::default());
        assert_eq!(root.children().len(), 10);
        assert_eq!(report.fallbacks, 2);
        for child in root.children() {
            assert!(child.display_weight.is_finite());
            assert_eq!(child.display_weight, 0.0);
        }
    }

    #[test]
    fn test_bound_holds_at_every_depth() {
        let wide_children = (0..25)
            .map(|index| category(&format!("D{index}"), &vec![index as u64 + 1; 14]))
            .collect();
        let tree = aggregate(TreeNode::branch("All Theses", wide_children));

        let (root, report) = rebalance(tree, &RebalanceConfig::default());
        assert_child_bound(&root, 10);
        assert_display_sums(&root);
        assert_eq!(root.leaf_count, 25 * 14);
        // the root and each of the 25 categories
        assert_eq!(report.rebalanced_nodes, 26);

        let overflow = root.find_child("Other All Theses").unwrap();
        assert_eq!(overflow.children().len(), 16);
    }

    #[test]
    fn test_overflow_chunking() {
        let tree = aggregate(category("E", &[5; 40]));
        let config = RebalanceConfig {
            chunking: OverflowChunking::Chunks { trigger: 20, size: 16 },
            ..RebalanceConfig::default()
        };

        let (root, report) = rebalance(tree, &config);
        let overflow = root.find_child("Other E").unwrap();
        assert_eq!(overflow.metric_sum, 155);

        let sizes = overflow.children().iter().map(|g| g.children().len()).collect::<Vec<_>>();
        assert_eq!(sizes, vec![16, 15]);
        assert_eq!(overflow.children()[0].name, "Other E Group 1");
        assert!(overflow.children().iter().all(|g| g.overflow));
        assert_eq!(
            overflow.children().iter().map(|g| g.metric_sum).sum::<u64>(),
            overflow.metric_sum
        );
        assert_eq!(report.chunked_overflows, 1);
        assert_display_sums(&root);
    }

    #[test]
    fn test_category_named_other_is_still_rebalanced() {
        let tree = aggregate(category("Other Studies", &[1; 11]));

        let (root, _) = rebalance(tree, &RebalanceConfig::default());
        assert_eq!(root.children().len(), 10);
    }

    #[test]
    fn test_oversized_chunks_leave_overflow_flat() {
        let tree = aggregate(category("F", &[5; 40]));
        let config = RebalanceConfig {
            chunking: OverflowChunking::Chunks { trigger: 20, size: 40 },
            ..RebalanceConfig::default()
        };

        let (root, report) = rebalance(tree, &config);
        let overflow = root.find_child("Other F").unwrap();
        assert_eq!(overflow.children().len(), 31);
        assert!(overflow.children().iter().all(|c| c.is_leaf()));
        assert_eq!(report.chunked_overflows, 0);
    }

    #[test]
    fn test_tiny_threshold_keeps_one_child() {
        let tree = aggregate(category("G", &[10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 1, 1]));
        let config = RebalanceConfig {
            threshold: 0,
            ..RebalanceConfig::default()
        };

        let (root, report) = rebalance(tree, &config);
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[0].metric_sum, 10);
        assert_eq!(report.moved_children, 11);
        assert_display_sums(&root);
    }

    #[test]
    fn test_overflow_name_avoids_kept_sibling() {
        let mut children = vec![TreeNode::leaf("Other H", sample("H", "Other H", 100))];
        children.extend((0..10).map(|index| {
            let title = format!("H thesis {index}");
            TreeNode::leaf(title.clone(), sample("H", &title, 1))
        }));
        let tree = aggregate(TreeNode::branch("H", children));

        let (root, _) = rebalance(tree, &RebalanceConfig::default());
        let names = root.children().iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
        assert!(names.contains(&"Other H"));
        assert!(names.contains(&"Other H (2)"));
        assert!(root.find_child("Other H (2)").unwrap().overflow);
        assert!(!root.find_child("Other H").unwrap().overflow);
    }

    #[test]
    fn test_validate_config() {
        assert!(RebalanceConfig::default().validate().is_ok());

        let bad_chunks = RebalanceConfig {
            chunking: OverflowChunking::Chunks { trigger: 5, size: 16 },
            ..RebalanceConfig::default()
        };
        assert!(bad_chunks.validate().is_err());

        let zero_threshold = RebalanceConfig {
            threshold: 0,
            ..RebalanceConfig::default()
        };
        assert!(matches!(
            zero_threshold.validate(),
            Err(SunburstError::InvalidConfig(_))
        ));
    }
}
