use super::TreeNode;
use super::nest::RawGroup;

/// Converts a raw grouping into canonical tree nodes.
///
/// A title group holding one record becomes a leaf. A title group holding
/// several records becomes a branch of numbered leaves, so sibling paths stay
/// unique.
pub fn normalize(name: String, group: RawGroup<'_>) -> TreeNode {
    match group {
        RawGroup::Keyed(entries) => TreeNode::branch(
            name,
            entries
                .into_iter()
                .map(|(key, child)| normalize(key.to_string(), child))
                .collect(),
        ),
        RawGroup::Records(records) => match records.as_slice() {
            [record] => TreeNode::leaf(name, (*record).clone()),
            _ => {
                let leaves = records
                    .iter()
                    .enumerate()
                    .map(|(index, record)| {
                        TreeNode::leaf(format!("{name} ({})", index + 1), (*record).clone())
                    })
                    .collect();
                TreeNode::branch(name, leaves)
            }
        },
    }
}
