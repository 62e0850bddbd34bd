//! FILENAME: core/report-engine/src/grouping.rs
//! Hierarchical grouping of records into an encounter-ordered tree.
//!
//! Algorithm:
//! 1. Partition the records by the first grouping field. Distinct values keep
//!    the order in which they are first seen; records keep their relative order.
//! 2. Group every partition again by the remaining fields.
//! Nothing is ever sorted.

use crate::value::{GroupValue, OrderedMap, Path, Record};

// ============================================================================
// GROUPED TREE
// ============================================================================

/// Records partitioned by the grouping fields.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupedTree<'a> {
    /// Records sharing all ancestor group values, in input order.
    Leaf(Vec<&'a Record>),
    /// Group value to sub-tree, in first-encounter order.
    Node(OrderedMap<GroupValue, GroupedTree<'a>>),
}

impl<'a> Default for GroupedTree<'a> {
    fn default() -> Self {
        GroupedTree::Leaf(Vec::new())
    }
}

impl<'a> GroupedTree<'a> {
    pub fn is_leaf(&self) -> bool {
        matches!(self, GroupedTree::Leaf(_))
    }

    /// True when the tree holds no records at all.
    pub fn is_empty(&self) -> bool {
        match self {
            GroupedTree::Leaf(records) => records.is_empty(),
            GroupedTree::Node(children) => children.values().all(GroupedTree::is_empty),
        }
    }

    /// Number of nesting levels below this node.
    pub fn depth(&self) -> usize {
        match self {
            GroupedTree::Leaf(_) => 0,
            GroupedTree::Node(children) => {
                1 + children.values().map(GroupedTree::depth).max().unwrap_or(0)
            }
        }
    }

    /// Total number of records.
    pub fn record_count(&self) -> usize {
        match self {
            GroupedTree::Leaf(records) => records.len(),
            GroupedTree::Node(children) => children.values().map(GroupedTree::record_count).sum(),
        }
    }

    /// Number of leaf groups.
    pub fn leaf_count(&self) -> usize {
        match self {
            GroupedTree::Leaf(_) => 1,
            GroupedTree::Node(children) => children.values().map(GroupedTree::leaf_count).sum(),
        }
    }

    /// All records, leaves concatenated depth-first.
    pub fn flatten(&self) -> Vec<&'a Record> {
        let mut out = Vec::with_capacity(self.record_count());
        self.collect_records(&mut out);
        out
    }

    fn collect_records(&self, out: &mut Vec<&'a Record>) {
        match self {
            GroupedTree::Leaf(records) => out.extend(records.iter().copied()),
            GroupedTree::Node(children) => {
                for child in children.values() {
                    child.collect_records(out);
                }
            }
        }
    }

    /// Every leaf with its full path, depth-first.
    pub fn leaves(&self) -> Vec<(Path, &[&'a Record])> {
        let mut out = Vec::new();
        let mut path = Path::new();
        self.collect_leaves(&mut path, &mut out);
        out
    }

    fn collect_leaves<'t>(&'t self, path: &mut Path, out: &mut Vec<(Path, &'t [&'a Record])>) {
        match self {
            GroupedTree::Leaf(records) => out.push((path.clone(), records.as_slice())),
            GroupedTree::Node(children) => {
                for (key, child) in children {
                    path.push(key.clone());
                    child.collect_leaves(path, out);
                    path.pop();
                }
            }
        }
    }

    /// Looks up the sub-tree at `path`.
    pub fn get(&self, path: &[GroupValue]) -> Option<&GroupedTree<'a>> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => match self {
                GroupedTree::Node(children) => children.get(head)?.get(rest),
                GroupedTree::Leaf(_) => None,
            },
        }
    }

    /// Child groups of an internal node; empty for a leaf.
    pub fn children(&self) -> impl Iterator<Item = (&GroupValue, &GroupedTree<'a>)> {
        let children = match self {
            GroupedTree::Node(children) => Some(children),
            GroupedTree::Leaf(_) => None,
        };
        children.into_iter().flat_map(|c| c.iter())
    }

    /// Records of a leaf; empty for an internal node.
    pub fn records(&self) -> &[&'a Record] {
        match self {
            GroupedTree::Leaf(records) => records,
            GroupedTree::Node(_) => &[],
        }
    }
}

// ============================================================================
// GROUPING
// ============================================================================

/// Groups `records` by `fields`, outermost first.
///
/// No fields gives a single leaf with every record; an empty input gives an
/// empty leaf regardless of the fields.
pub fn group<'a>(records: &[&'a Record], fields: &[&str]) -> GroupedTree<'a> {
    if records.is_empty() {
        return GroupedTree::default();
    }
    group_level(records.to_vec(), fields)
}

/// Convenience over an owned record slice.
pub fn group_records<'a>(records: &'a [Record], fields: &[&str]) -> GroupedTree<'a> {
    let refs: Vec<&'a Record> = records.iter().collect();
    group(&refs, fields)
}

fn group_level<'a>(records: Vec<&'a Record>, fields: &[&str]) -> GroupedTree<'a> {
    let Some((field, rest)) = fields.split_first() else {
        return GroupedTree::Leaf(records);
    };

    let mut partitions: OrderedMap<GroupValue, Vec<&'a Record>> = OrderedMap::default();
    for record in records {
        partitions
            .entry(GroupValue::from(record.get(field)))
            .or_default()
            .push(record);
    }

    GroupedTree::Node(
        partitions
            .into_iter()
            .map(|(key, members)| (key, group_level(members, rest)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::path;

    fn characters() -> Vec<Record> {
        vec![
            Record::new().with("name", "Luke Skywalker").with("class", "Jedi Knight").with("world", "Star Wars"),
            Record::new().with("name", "Emporer Palpatine").with("class", "Sith Lord").with("world", "Star Wars"),
            Record::new().with("name", "Mithrander").with("class", "Wizard").with("world", "Middle Earth"),
            Record::new().with("name", "Aragorn").with("class", "Ranger").with("world", "Middle Earth"),
        ]
    }

    #[test]
    fn test_single_level_keeps_encounter_order() {
        let records = characters();
        let tree = group_records(&records, &["world"]);

        let keys: Vec<String> = tree.children().map(|(k, _)| k.label()).collect();
        assert_eq!(keys, vec!["Star Wars", "Middle Earth"]);

        let star_wars = tree.get(&path(["Star Wars"])).unwrap();
        assert_eq!(star_wars.records().len(), 2);
        assert_eq!(star_wars.records()[0].get("name").to_string(), "Luke Skywalker");
    }

    #[test]
    fn test_no_fields_is_one_leaf() {
        let records = characters();
        let tree = group_records(&records, &[]);
        assert!(tree.is_leaf());
        assert_eq!(tree.records().len(), 4);
    }

    #[test]
    fn test_empty_input_is_empty_leaf() {
        let tree = group_records(&[], &["world", "class"]);
        assert_eq!(tree, GroupedTree::Leaf(Vec::new()));
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_nested_levels_and_leaves() {
        let records = characters();
        let tree = group_records(&records, &["world", "class"]);

        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.leaf_count(), 4);

        let leaf_paths: Vec<Path> = tree.leaves().into_iter().map(|(p, _)| p).collect();
        assert_eq!(leaf_paths[0], path(["Star Wars", "Jedi Knight"]));
        assert_eq!(leaf_paths[3], path(["Middle Earth", "Ranger"]));
        assert!(tree.get(&path(["Middle Earth", "Wizard"])).unwrap().is_leaf());
        assert!(tree.get(&path(["Narnia"])).is_none());
    }

    #[test]
    fn test_flatten_follows_group_order() {
        let records = vec![
            Record::new().with("k", "b").with("i", 0),
            Record::new().with("k", "a").with("i", 1),
            Record::new().with("k", "b").with("i", 2),
            Record::new().with("k", "a").with("i", 3),
        ];
        let tree = group_records(&records, &["k"]);
        let order: Vec<String> = tree.flatten().iter().map(|r| r.get("i").to_string()).collect();

        // Leaf concatenation follows group order, so input order survives only
        // within each group.
        assert_eq!(order, vec!["0", "2", "1", "3"]);
    }

    #[test]
    fn test_missing_field_groups_under_empty() {
        let records = vec![
            Record::new().with("world", "Star Wars"),
            Record::new(),
        ];
        let tree = group_records(&records, &["world"]);
        assert!(tree.get(&[GroupValue::Empty]).is_some());
    }
}
