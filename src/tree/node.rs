//! Tree node types and construction from listing snapshots.

use std::collections::BTreeMap;

use crate::types::ListingEntry;

/// A node in the listing tree. Directories map child names to nodes; files
/// carry their size and a fully-qualified reference to the original object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    File { size: u64, reference: String },
    Directory(BTreeMap<String, TreeNode>),
}

impl TreeNode {
    pub fn is_file(&self) -> bool {
        matches!(self, TreeNode::File { .. })
    }

    pub fn children(&self) -> Option<&BTreeMap<String, TreeNode>> {
        match self {
            TreeNode::Directory(children) => Some(children),
            TreeNode::File { .. } => None,
        }
    }
}

/// A frozen tree plus the totals accumulated while building it.
#[derive(Debug, Clone)]
pub struct BuiltTree {
    pub root: TreeNode,
    pub total_size: u64,
    pub file_count: u64,
}

impl BuiltTree {
    pub fn root_children(&self) -> &BTreeMap<String, TreeNode> {
        match &self.root {
            TreeNode::Directory(children) => children,
            // Root is always constructed as a directory.
            TreeNode::File { .. } => unreachable!("tree root is always a directory"),
        }
    }
}

/// Build a tree from a listing snapshot.
///
/// `prefix_to_strip` is removed from each entry path before splitting on `/`;
/// entries outside the prefix are taken as already relative. Directory
/// markers (paths ending in `/`) and entries that reduce to an empty relative
/// path are skipped. `reference_for` receives the original absolute key and
/// produces the locator stored on the file node.
pub fn build_tree<F>(entries: &[ListingEntry], prefix_to_strip: &str, mut reference_for: F) -> BuiltTree
where
    F: FnMut(&str) -> String,
{
    let mut root = BTreeMap::new();
    let mut total_size = 0u64;
    let mut file_count = 0u64;

    for entry in entries {
        if entry.path.ends_with('/') {
            continue;
        }
        let relative = entry
            .path
            .strip_prefix(prefix_to_strip)
            .unwrap_or(&entry.path);
        if relative.is_empty() {
            continue;
        }

        let segments: Vec<&str> = relative.split('/').collect();
        insert(&mut root, &segments, entry.size, reference_for(&entry.path));
        total_size += entry.size;
        file_count += 1;
    }

    BuiltTree {
        root: TreeNode::Directory(root),
        total_size,
        file_count,
    }
}

fn insert(map: &mut BTreeMap<String, TreeNode>, segments: &[&str], size: u64, reference: String) {
    let (first, rest) = match segments.split_first() {
        Some(split) => split,
        None => return,
    };

    if rest.is_empty() {
        map.insert(first.to_string(), TreeNode::File { size, reference });
        return;
    }

    let child = map
        .entry(first.to_string())
        .or_insert_with(|| TreeNode::Directory(BTreeMap::new()));
    // A file and a directory may not share a name at one level; when a
    // key arrives both as an object and as an intermediate segment, the
    // directory wins.
    if child.is_file() {
        *child = TreeNode::Directory(BTreeMap::new());
    }
    if let TreeNode::Directory(children) = child {
        insert(children, rest, size, reference);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, size: u64) -> ListingEntry {
        ListingEntry::new(path, size)
    }

    fn s3_ref(key: &str) -> String {
        format!("s3://bucket/{}", key)
    }

    #[test]
    fn test_build_nests_intermediate_directories() {
        let entries = vec![
            entry("acct/prod/README.md", 10),
            entry("acct/prod/data/a.parquet", 20),
            entry("acct/prod/data/sub/b.parquet", 30),
        ];
        let tree = build_tree(&entries, "acct/prod/", s3_ref);

        assert_eq!(tree.file_count, 3);
        assert_eq!(tree.total_size, 60);

        let root = tree.root_children();
        assert!(root.get("README.md").unwrap().is_file());
        let data = root.get("data").unwrap().children().unwrap();
        assert!(data.get("a.parquet").unwrap().is_file());
        let sub = data.get("sub").unwrap().children().unwrap();
        match sub.get("b.parquet").unwrap() {
            TreeNode::File { size, reference } => {
                assert_eq!(*size, 30);
                assert_eq!(reference, "s3://bucket/acct/prod/data/sub/b.parquet");
            }
            other => panic!("expected file, got {:?}", other),
        }
    }

    #[test]
    fn test_build_skips_directory_markers_and_empty_paths() {
        let entries = vec![
            entry("acct/prod/data/", 0),
            entry("acct/prod/", 0),
            entry("acct/prod/file.txt", 5),
        ];
        let tree = build_tree(&entries, "acct/prod/", s3_ref);

        assert_eq!(tree.file_count, 1);
        assert_eq!(tree.total_size, 5);
        assert_eq!(tree.root_children().len(), 1);
    }

    #[test]
    fn test_build_insertion_order_is_irrelevant() {
        let forward = vec![entry("p/a.txt", 1), entry("p/d/b.txt", 2), entry("p/c.txt", 3)];
        let mut reversed = forward.clone();
        reversed.reverse();

        let left = build_tree(&forward, "p/", s3_ref);
        let right = build_tree(&reversed, "p/", s3_ref);
        assert_eq!(left.root, right.root);
    }

    #[test]
    fn test_build_revisiting_directory_reuses_it() {
        let entries = vec![entry("p/d/a.txt", 1), entry("p/d/b.txt", 2)];
        let tree = build_tree(&entries, "p/", s3_ref);
        let d = tree.root_children().get("d").unwrap().children().unwrap();
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn test_build_directory_wins_name_collision() {
        let entries = vec![entry("p/x", 1), entry("p/x/y.txt", 2)];
        let tree = build_tree(&entries, "p/", s3_ref);
        let x = tree.root_children().get("x").unwrap();
        assert!(!x.is_file());
        assert!(x.children().unwrap().get("y.txt").unwrap().is_file());
    }
}
