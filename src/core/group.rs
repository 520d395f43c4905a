//! The group tree: an append-only namespace attached to nodes for display
//! and emission grouping. Groups do not affect semantics.

use super::defs::{GROUP_DELIMITER, GROUP_ROOT};
use super::node::GroupId;

/// A named group in the tree.
#[derive(Debug, Clone)]
pub struct NodeGroup {
    /// The last path segment.
    pub name: String,
    /// The full path from the root, without the root segment.
    pub full_name: String,
    pub parent: Option<GroupId>,
    pub children: Vec<GroupId>,
}

impl NodeGroup {
    pub(crate) fn root() -> Self {
        NodeGroup {
            name: GROUP_ROOT.to_string(),
            full_name: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// The tree itself. Index 0 is always the root.
#[derive(Debug, Clone)]
pub struct GroupTree {
    groups: Vec<NodeGroup>,
}

impl Default for GroupTree {
    fn default() -> Self {
        GroupTree {
            groups: vec![NodeGroup::root()],
        }
    }
}

impl GroupTree {
    pub const ROOT: GroupId = GroupId(0);

    pub fn get(&self, id: GroupId) -> &NodeGroup {
        &self.groups[id.0]
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &NodeGroup)> {
        self.groups.iter().enumerate().map(|(i, g)| (GroupId(i), g))
    }

    /// Returns the group at `full_name`, creating intermediate groups on
    /// demand. Empty segments are ignored, so `get_or_create("")` is the
    /// root.
    pub fn get_or_create(&mut self, full_name: &str) -> GroupId {
        let mut current = Self::ROOT;
        for segment in full_name.split(GROUP_DELIMITER) {
            if segment.is_empty() || segment == GROUP_ROOT {
                continue;
            }
            let found = self.groups[current.0]
                .children
                .iter()
                .copied()
                .find(|&c| self.groups[c.0].name == segment);
            current = match found {
                Some(id) => id,
                None => {
                    let full = if self.groups[current.0].full_name.is_empty() {
                        segment.to_string()
                    } else {
                        format!(
                            "{}{}{}",
                            self.groups[current.0].full_name, GROUP_DELIMITER, segment
                        )
                    };
                    let id = GroupId(self.groups.len());
                    self.groups.push(NodeGroup {
                        name: segment.to_string(),
                        full_name: full,
                        parent: Some(current),
                        children: Vec::new(),
                    });
                    self.groups[current.0].children.push(id);
                    id
                }
            };
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_intermediate_groups() {
        let mut tree = GroupTree::default();
        let leaf = tree.get_or_create("layers/layer1");
        assert_eq!(tree.get(leaf).full_name, "layers/layer1");
        assert_eq!(tree.len(), 3);

        // Re-resolving does not duplicate.
        assert_eq!(tree.get_or_create("layers/layer1"), leaf);
        assert_eq!(tree.len(), 3);

        let sibling = tree.get_or_create("layers/layer2");
        assert_eq!(tree.get(sibling).parent, tree.get(leaf).parent);
    }

    #[test]
    fn root_resolution() {
        let mut tree = GroupTree::default();
        assert_eq!(tree.get_or_create(""), GroupTree::ROOT);
        assert_eq!(tree.get_or_create("_root"), GroupTree::ROOT);
    }
}
