//! Pattern-aware rendering of listing trees.
//!
//! Depth-first, pre-order walk over directory nodes. At each level the
//! detectors run in fixed priority order (numbered runs, date snapshots,
//! filename families, partitions); the first match collapses the level into
//! a summary line, and plain enumeration is the fallback. Every level is
//! guaranteed to render something for a non-empty tree.

use std::collections::BTreeMap;

use serde::Serialize;

use super::node::{BuiltTree, TreeNode};
use super::patterns::{
    detect_date_directories, detect_general_pattern, detect_numbered_run, detect_partitions,
    elide_values,
};

const DATE_ELIDE_AFTER: usize = 5;

/// Aggregate statistics for one rendered listing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TreeStats {
    pub total_files: u64,
    pub total_directories: u64,
    #[serde(rename = "total_size_bytes")]
    pub total_size: u64,
    pub total_size_human: String,
    pub truncated: bool,
}

/// One directory discovered in the tree, with its fully-qualified locator.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub reference: String,
}

/// The rendered tree: display lines, the directory inventory, and stats.
#[derive(Debug, Clone)]
pub struct RenderedTree {
    pub lines: Vec<String>,
    pub directories: Vec<DirectoryEntry>,
    pub stats: TreeStats,
}

impl RenderedTree {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Convert bytes to a human-readable size with one decimal place.
pub fn human_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if value < 1024.0 {
            return format!("{:.1} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1} PB", value)
}

/// Renders a [`BuiltTree`] under a fully-qualified root locator.
pub struct TreeRenderer<'a> {
    /// Root locator with trailing slash, e.g. `s3://bucket/acct/prod/`.
    root_reference: &'a str,
    /// Bucket-relative key prefix used for directory paths.
    key_prefix: &'a str,
}

impl<'a> TreeRenderer<'a> {
    pub fn new(root_reference: &'a str, key_prefix: &'a str) -> Self {
        Self {
            root_reference,
            key_prefix,
        }
    }

    /// Render the tree. The first line is the root locator itself.
    pub fn render(&self, tree: &BuiltTree, truncated: bool) -> RenderedTree {
        let children = tree.root_children();

        let mut lines = vec![self.root_reference.to_string()];
        self.render_level(children, "", "", &mut lines);

        let mut directories = Vec::new();
        self.collect_directories(children, "", &mut directories);

        RenderedTree {
            lines,
            stats: TreeStats {
                total_files: tree.file_count,
                total_directories: directories.len() as u64,
                total_size: tree.total_size,
                total_size_human: human_size(tree.total_size),
                truncated,
            },
            directories,
        }
    }

    fn dir_reference(&self, rel_path: &str) -> String {
        if rel_path.is_empty() {
            self.root_reference.to_string()
        } else {
            format!("{}{}/", self.root_reference, rel_path)
        }
    }

    fn render_level(
        &self,
        children: &BTreeMap<String, TreeNode>,
        indent: &str,
        rel_path: &str,
        lines: &mut Vec<String>,
    ) {
        if children.is_empty() {
            return;
        }

        if let Some(run) = detect_numbered_run(children) {
            let leftover = without(children, &run.matched);
            let (connector, _) = branch_glyphs(leftover.is_empty());
            let dot_ext = dot_extension(&run.extension);
            lines.push(format!(
                "{}{}[{}-{}]{} ({} files, {} - {}, total: {}) → {}",
                indent,
                connector,
                run.min,
                run.max,
                dot_ext,
                run.sizes.count,
                human_size(run.sizes.min),
                human_size(run.sizes.max),
                human_size(run.sizes.total),
                self.dir_reference(rel_path),
            ));
            self.render_entries(&leftover, indent, rel_path, lines);
            return;
        }

        if let Some(run) = detect_date_directories(children) {
            let leftover = without(children, &run.dates);
            let (connector, extension) = branch_glyphs(leftover.is_empty());
            let listing = if run.dates.len() > DATE_ELIDE_AFTER {
                format!(
                    "{{{}, {}, ..., {}}} ({} temporal snapshots)",
                    run.dates[0],
                    run.dates[1],
                    run.dates[run.dates.len() - 1],
                    run.dates.len()
                )
            } else {
                format!("{{{}}}", run.dates.join(", "))
            };
            lines.push(format!(
                "{}{}{} → {}",
                indent,
                connector,
                listing,
                self.dir_reference(rel_path),
            ));

            // Illustrate structure with the earliest snapshot only.
            let earliest = &run.dates[0];
            let child_rel = join_rel(rel_path, earliest);
            lines.push(format!(
                "{}{}└── {}/ (earliest snapshot, siblings share this structure) → {}",
                indent,
                extension,
                earliest,
                self.dir_reference(&child_rel),
            ));
            if let Some(TreeNode::Directory(sub)) = children.get(earliest.as_str()) {
                let child_indent = format!("{}{}    ", indent, extension);
                self.render_level(sub, &child_indent, &child_rel, lines);
            }
            self.render_entries(&leftover, indent, rel_path, lines);
            return;
        }

        if let Some(pattern) = detect_general_pattern(children) {
            let leftover = without(children, &pattern.matched);
            let (connector, extension) = branch_glyphs(leftover.is_empty());
            let dot_ext = dot_extension(&pattern.extension);
            let stats = format!(
                "{} files, {} - {}, total: {}",
                pattern.sizes.count,
                human_size(pattern.sizes.min),
                human_size(pattern.sizes.max),
                human_size(pattern.sizes.total),
            );
            if pattern.degenerate {
                // No usable common affix; fall back to raw samples.
                lines.push(format!(
                    "{}{}*{} ({}) → {}",
                    indent,
                    connector,
                    dot_ext,
                    stats,
                    self.dir_reference(rel_path),
                ));
            } else {
                let variants = if pattern.variants.len() <= 3 {
                    pattern.variants.join(",")
                } else {
                    format!(
                        "{},{},...,{} ({} variants)",
                        pattern.variants[0],
                        pattern.variants[1],
                        pattern.variants[pattern.variants.len() - 1],
                        pattern.variants.len()
                    )
                };
                lines.push(format!(
                    "{}{}{}{{{}}}{}{} ({}) → {}",
                    indent,
                    connector,
                    pattern.prefix,
                    variants,
                    pattern.suffix,
                    dot_ext,
                    stats,
                    self.dir_reference(rel_path),
                ));
            }
            for sample in &pattern.samples {
                lines.push(format!("{}{}e.g. {}", indent, extension, sample));
            }
            self.render_entries(&leftover, indent, rel_path, lines);
            return;
        }

        if let Some(partitions) = detect_partitions(children) {
            let summary = partitions
                .segments
                .iter()
                .map(|(key, values)| format!("{}={{{}}}", key, elide_values(values)))
                .collect::<Vec<_>>()
                .join("/");
            lines.push(format!(
                "{}├── {}/ [partitioned] → {}",
                indent,
                summary,
                self.dir_reference(rel_path),
            ));
            // Sibling partitions are assumed structurally identical; only
            // the first sorted value is expanded.
            if let Some(TreeNode::Directory(sub)) = children.get(&partitions.first_child) {
                let child_rel = join_rel(rel_path, &partitions.first_child);
                let child_indent = format!("{}│   ", indent);
                self.render_level(sub, &child_indent, &child_rel, lines);
            }
            return;
        }

        let all: Vec<(&String, &TreeNode)> = children.iter().collect();
        self.render_entries(&all, indent, rel_path, lines);
    }

    fn render_entries(
        &self,
        entries: &[(&String, &TreeNode)],
        indent: &str,
        rel_path: &str,
        lines: &mut Vec<String>,
    ) {
        for (i, (name, node)) in entries.iter().enumerate() {
            let (connector, extension) = branch_glyphs(i == entries.len() - 1);
            match node {
                TreeNode::File { size, reference } => {
                    lines.push(format!(
                        "{}{}{} ({}) → {}",
                        indent,
                        connector,
                        name,
                        human_size(*size),
                        reference,
                    ));
                }
                TreeNode::Directory(sub) => {
                    let child_rel = join_rel(rel_path, name);
                    lines.push(format!(
                        "{}{}{}/ → {}",
                        indent,
                        connector,
                        name,
                        self.dir_reference(&child_rel),
                    ));
                    let child_indent = format!("{}{}", indent, extension);
                    self.render_level(sub, &child_indent, &child_rel, lines);
                }
            }
        }
    }

    fn collect_directories(
        &self,
        children: &BTreeMap<String, TreeNode>,
        rel_path: &str,
        out: &mut Vec<DirectoryEntry>,
    ) {
        for (name, node) in children {
            if let TreeNode::Directory(sub) = node {
                let child_rel = join_rel(rel_path, name);
                out.push(DirectoryEntry {
                    name: name.clone(),
                    path: format!("{}{}/", self.key_prefix, child_rel),
                    reference: self.dir_reference(&child_rel),
                });
                self.collect_directories(sub, &child_rel, out);
            }
        }
    }
}

fn branch_glyphs(is_last: bool) -> (&'static str, &'static str) {
    if is_last {
        ("└── ", "    ")
    } else {
        ("├── ", "│   ")
    }
}

fn dot_extension(extension: &str) -> String {
    if extension.is_empty() {
        String::new()
    } else {
        format!(".{}", extension)
    }
}

fn join_rel(rel_path: &str, name: &str) -> String {
    if rel_path.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", rel_path, name)
    }
}

fn without<'t>(
    children: &'t BTreeMap<String, TreeNode>,
    matched: &[String],
) -> Vec<(&'t String, &'t TreeNode)> {
    children
        .iter()
        .filter(|&(name, _)| !matched.contains(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::build_tree;
    use crate::types::ListingEntry;

    fn render(paths: &[(&str, u64)]) -> RenderedTree {
        let entries: Vec<ListingEntry> = paths
            .iter()
            .map(|(p, s)| ListingEntry::new(format!("acct/prod/{}", p), *s))
            .collect();
        let tree = build_tree(&entries, "acct/prod/", |key| format!("s3://bucket/{}", key));
        TreeRenderer::new("s3://bucket/acct/prod/", "acct/prod/").render(&tree, false)
    }

    #[test]
    fn test_human_size_boundaries() {
        assert_eq!(human_size(1023), "1023.0 B");
        assert_eq!(human_size(1024), "1.0 KB");
        assert_eq!(human_size(1_048_576), "1.0 MB");
    }

    #[test]
    fn test_fallback_enumeration_lists_everything() {
        let rendered = render(&[("README.md", 100), ("data/a.parquet", 200)]);
        let text = rendered.text();
        assert!(text.starts_with("s3://bucket/acct/prod/"));
        assert!(text.contains("├── README.md (100.0 B) → s3://bucket/acct/prod/README.md"));
        assert!(text.contains("└── data/ → s3://bucket/acct/prod/data/"));
        assert!(text.contains("└── a.parquet (200.0 B) → s3://bucket/acct/prod/data/a.parquet"));
        assert_eq!(rendered.stats.total_files, 2);
        assert_eq!(rendered.stats.total_directories, 1);
        assert_eq!(rendered.stats.total_size, 300);
    }

    #[test]
    fn test_numbered_run_renders_one_summary_line() {
        let paths: Vec<(String, u64)> = (0..10)
            .map(|i| (format!("chunks/{}.parquet", i), 1024))
            .collect();
        let borrowed: Vec<(&str, u64)> = paths.iter().map(|(p, s)| (p.as_str(), *s)).collect();
        let rendered = render(&borrowed);
        let text = rendered.text();
        assert!(text.contains("[0-9].parquet (10 files, 1.0 KB - 1.0 KB, total: 10.0 KB)"));
        assert!(!text.contains("├── 0.parquet"));
        assert!(!text.contains("└── 9.parquet"));
    }

    #[test]
    fn test_partition_elision_and_first_child_recursion() {
        let mut paths: Vec<(String, u64)> = Vec::new();
        for year in 1995..=2007 {
            paths.push((format!("year={}/data.parquet", year), 5));
        }
        let borrowed: Vec<(&str, u64)> = paths.iter().map(|(p, s)| (p.as_str(), *s)).collect();
        let rendered = render(&borrowed);
        let text = rendered.text();
        assert!(text.contains("year={1995,1996,...,2007 (13 total)}/ [partitioned]"));
        // Only the first partition's subtree is expanded.
        assert_eq!(text.matches("data.parquet (5.0 B)").count(), 1);
        // The directory inventory still covers every partition.
        assert_eq!(rendered.stats.total_directories, 13);
    }

    #[test]
    fn test_date_snapshots_recurse_into_earliest_only() {
        let paths = vec![
            ("2024-01-01/dump.csv", 10u64),
            ("2024-01-02/dump.csv", 10),
            ("2024-01-03/dump.csv", 10),
        ];
        let rendered = render(&paths);
        let text = rendered.text();
        assert!(text.contains("{2024-01-01, 2024-01-02, 2024-01-03}"));
        assert!(text.contains("2024-01-01/ (earliest snapshot"));
        assert_eq!(text.matches("dump.csv (10.0 B)").count(), 1);
        assert_eq!(rendered.stats.total_files, 3);
        assert_eq!(rendered.stats.total_size, 30);
    }

    #[test]
    fn test_date_snapshots_elide_beyond_five() {
        let paths: Vec<(String, u64)> = (1..=8)
            .map(|d| (format!("2024-01-{:02}/x.bin", d), 1))
            .collect();
        let borrowed: Vec<(&str, u64)> = paths.iter().map(|(p, s)| (p.as_str(), *s)).collect();
        let text = render(&borrowed).text();
        assert!(text.contains("{2024-01-01, 2024-01-02, ..., 2024-01-08} (8 temporal snapshots)"));
    }

    #[test]
    fn test_general_pattern_summary_with_samples() {
        let paths: Vec<(String, u64)> = (0..15)
            .map(|i| (format!("granules/scene_{:03}_l2.tif", i), 2048))
            .collect();
        let borrowed: Vec<(&str, u64)> = paths.iter().map(|(p, s)| (p.as_str(), *s)).collect();
        let text = render(&borrowed).text();
        assert!(text.contains("scene_0{00,01,...,14 (15 variants)}_l2.tif (15 files"));
        assert_eq!(text.matches("e.g. s3://bucket/acct/prod/granules/scene_").count(), 2);
    }

    #[test]
    fn test_two_children_below_thresholds_use_fallback() {
        let rendered = render(&[("a.csv", 1), ("b.csv", 2)]);
        let text = rendered.text();
        assert!(text.contains("├── a.csv (1.0 B)"));
        assert!(text.contains("└── b.csv (2.0 B)"));
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let paths = vec![("x/1.csv", 1u64), ("x/2.csv", 2), ("y.md", 3)];
        let first = render(&paths).text();
        let second = render(&paths).text();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_tree_renders_root_only() {
        let rendered = render(&[]);
        assert_eq!(rendered.lines, vec!["s3://bucket/acct/prod/".to_string()]);
        assert_eq!(rendered.stats.total_files, 0);
        assert_eq!(rendered.stats.total_size, 0);
    }
}
