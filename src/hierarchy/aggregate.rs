use super::{NodeKind, TreeNode};

/// Bottom-up download and thesis totals; display weight starts equal to the
/// download total.
pub fn aggregate(node: TreeNode) -> TreeNode {
    let TreeNode { name, kind, overflow, .. } = node;

    match kind {
        NodeKind::Leaf(record) => TreeNode {
            name,
            metric_sum: record.downloads,
            display_weight: record.downloads as f64,
            leaf_count: 1,
            kind: NodeKind::Leaf(record),
            overflow,
        },
        NodeKind::Branch(children) => {
            let children = children.into_iter().map(aggregate).collect::<Vec<_>>();
            let metric_sum = children.iter().map(|child| child.metric_sum).sum::<u64>();
            let leaf_count = children.iter().map(|child| child.leaf_count).sum();

            TreeNode {
                name,
                metric_sum,
                display_weight: metric_sum as f64,
                leaf_count,
                kind: NodeKind::Branch(children),
                overflow,
            }
        }
    }
}
