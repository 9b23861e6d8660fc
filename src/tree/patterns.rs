//! Pattern detectors for directory levels.
//!
//! Each detector is a pure predicate+summarizer over one directory's
//! children. Detectors return `None` rather than failing: any level a
//! detector cannot summarize confidently falls through to plain enumeration
//! in the renderer.

use std::collections::BTreeMap;

use super::node::TreeNode;

const NUMBERED_MIN_CHILDREN: usize = 3;
const NUMBERED_RATIO: f64 = 0.7;
const NUMBERED_DENSITY: f64 = 0.8;
const DATE_MIN_CHILDREN: usize = 2;
const DATE_RATIO: f64 = 0.7;
const GENERAL_MIN_CHILDREN: usize = 10;
const GENERAL_MIN_GROUP: usize = 10;
const GENERAL_GROUP_RATIO: f64 = 0.6;
const GENERAL_MIN_VARIANTS: usize = 3;
const GENERAL_MAX_SAMPLES: usize = 2;
const PARTITION_MIN_CHILDREN: usize = 2;
const PARTITION_RATIO: f64 = 0.5;
const VALUES_ELIDE_AFTER: usize = 10;

/// Size statistics over the files consumed by one summary line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeAggregate {
    pub min: u64,
    pub max: u64,
    pub total: u64,
    pub count: usize,
}

impl SizeAggregate {
    fn from_sizes(sizes: &[u64]) -> Option<Self> {
        // Zero-children guard: aggregates over nothing are a no-match.
        let (first, rest) = sizes.split_first()?;
        let mut agg = SizeAggregate {
            min: *first,
            max: *first,
            total: *first,
            count: 1,
        };
        for size in rest {
            agg.min = agg.min.min(*size);
            agg.max = agg.max.max(*size);
            agg.total += *size;
            agg.count += 1;
        }
        Some(agg)
    }
}

/// A contiguous-enough run of digit-named files sharing one extension.
#[derive(Debug, Clone)]
pub struct NumberedRun {
    pub min: u64,
    pub max: u64,
    /// Extension without the dot; empty when the files have none.
    pub extension: String,
    pub sizes: SizeAggregate,
    /// Child names consumed by the summary line.
    pub matched: Vec<String>,
}

/// Date-named snapshot directories at one level.
#[derive(Debug, Clone)]
pub struct DateRun {
    /// Matching directory names, lexicographically sorted (earliest first).
    pub dates: Vec<String>,
}

/// A family of files sharing an extension and a common name affix.
#[derive(Debug, Clone)]
pub struct GeneralPattern {
    pub extension: String,
    pub prefix: String,
    pub suffix: String,
    /// Distinct varying middles, sorted.
    pub variants: Vec<String>,
    /// True when affix stripping produced an empty varying segment; the
    /// renderer shows raw samples instead of a `{...}` listing.
    pub degenerate: bool,
    pub sizes: SizeAggregate,
    /// Up to two file references illustrating the family.
    pub samples: Vec<String>,
    pub matched: Vec<String>,
}

/// Hive-style `key=value` partition structure at one level.
#[derive(Debug, Clone)]
pub struct PartitionSummary {
    /// Per-key sorted value sets, ordered by key.
    pub segments: Vec<(String, Vec<String>)>,
    /// First child by name; the renderer recurses only into this subtree.
    pub first_child: String,
}

fn split_name(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (name, ""),
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Literal `YYYY-MM-DD` check, no calendar validation.
pub fn is_date_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
}

/// Elide a sorted value list: all values when short, otherwise
/// `first,second,...,last (N total)`.
pub fn elide_values(values: &[String]) -> String {
    if values.len() <= VALUES_ELIDE_AFTER {
        values.join(",")
    } else {
        format!(
            "{},{},...,{} ({} total)",
            values[0],
            values[1],
            values[values.len() - 1],
            values.len()
        )
    }
}

/// Detect a run of digit-named files (rule 1).
///
/// Requires at least three children, with >=70% of them digit-stemmed files
/// of one extension, and the collected numbers covering >=80% of their span
/// (small gaps tolerated).
pub fn detect_numbered_run(children: &BTreeMap<String, TreeNode>) -> Option<NumberedRun> {
    if children.len() < NUMBERED_MIN_CHILDREN {
        return None;
    }

    // Digit-stemmed files, grouped by extension; the dominant extension is
    // the candidate run.
    let mut groups: BTreeMap<&str, Vec<(&String, u64, u64)>> = BTreeMap::new();
    for (name, node) in children {
        if let TreeNode::File { size, .. } = node {
            let (stem, ext) = split_name(name);
            if is_digits(stem) {
                if let Ok(number) = stem.parse::<u64>() {
                    groups.entry(ext).or_default().push((name, number, *size));
                }
            }
        }
    }
    let group = groups.into_values().max_by_key(|g| g.len())?;

    if (group.len() as f64) < NUMBERED_RATIO * children.len() as f64 {
        return None;
    }

    let mut numbers: Vec<u64> = group.iter().map(|(_, n, _)| *n).collect();
    numbers.sort_unstable();
    numbers.dedup();
    let min = *numbers.first()?;
    let max = *numbers.last()?;
    let span = max - min + 1;
    if (numbers.len() as f64) < NUMBERED_DENSITY * span as f64 {
        return None;
    }

    let sizes: Vec<u64> = group.iter().map(|(_, _, s)| *s).collect();
    Some(NumberedRun {
        min,
        max,
        extension: split_name(group[0].0).1.to_string(),
        sizes: SizeAggregate::from_sizes(&sizes)?,
        matched: group.iter().map(|(name, _, _)| (*name).clone()).collect(),
    })
}

/// Detect date-stamped snapshot directories (rule 2).
pub fn detect_date_directories(children: &BTreeMap<String, TreeNode>) -> Option<DateRun> {
    if children.len() < DATE_MIN_CHILDREN {
        return None;
    }

    let dates: Vec<String> = children
        .iter()
        .filter(|(name, node)| !node.is_file() && is_date_name(name))
        .map(|(name, _)| name.clone())
        .collect();

    if dates.len() < DATE_MIN_CHILDREN {
        return None;
    }
    if (dates.len() as f64) < DATE_RATIO * children.len() as f64 {
        return None;
    }

    // BTreeMap iteration already yields lexicographic order.
    Some(DateRun { dates })
}

fn common_prefix_len(strings: &[&str]) -> usize {
    let first: Vec<char> = strings[0].chars().collect();
    let mut len = first.len();
    for s in &strings[1..] {
        let matched = s
            .chars()
            .zip(first.iter())
            .take_while(|(a, b)| a == *b)
            .count();
        len = len.min(matched);
    }
    len
}

fn common_suffix_len(strings: &[&str], reserved: usize) -> usize {
    let first: Vec<char> = strings[0].chars().collect();
    let mut len = first.len().saturating_sub(reserved);
    for s in &strings[1..] {
        let chars: Vec<char> = s.chars().collect();
        let budget = chars.len().saturating_sub(reserved);
        let matched = chars
            .iter()
            .rev()
            .zip(first.iter().rev())
            .take_while(|(a, b)| a == b)
            .count();
        len = len.min(matched).min(budget);
    }
    len
}

fn slice_chars(s: &str, from: usize, drop_tail: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    chars[from..chars.len() - drop_tail].iter().collect()
}

/// Detect a repetitive filename family (rule 3).
///
/// The largest extension group must hold at least ten files and more than
/// 60% of the level; the varying middles (after stripping the longest
/// common prefix and suffix) must take at least three distinct values.
pub fn detect_general_pattern(children: &BTreeMap<String, TreeNode>) -> Option<GeneralPattern> {
    if children.len() < GENERAL_MIN_CHILDREN {
        return None;
    }

    let mut groups: BTreeMap<&str, Vec<(&String, u64, &str)>> = BTreeMap::new();
    for (name, node) in children {
        if let TreeNode::File { size, reference } = node {
            let (_, ext) = split_name(name);
            groups.entry(ext).or_default().push((name, *size, reference.as_str()));
        }
    }
    let (extension, group) = groups.into_iter().max_by_key(|(_, g)| g.len())?;

    if group.len() < GENERAL_MIN_GROUP {
        return None;
    }
    if (group.len() as f64) <= GENERAL_GROUP_RATIO * children.len() as f64 {
        return None;
    }

    let stems: Vec<&str> = group.iter().map(|(name, _, _)| split_name(name).0).collect();
    let prefix_len = common_prefix_len(&stems);
    let suffix_len = common_suffix_len(&stems, prefix_len);

    let mut variants: Vec<String> = stems
        .iter()
        .map(|stem| slice_chars(stem, prefix_len, suffix_len))
        .collect();
    variants.sort();
    variants.dedup();
    if variants.len() < GENERAL_MIN_VARIANTS {
        return None;
    }

    let degenerate = variants.iter().any(|v| v.is_empty());
    let sizes: Vec<u64> = group.iter().map(|(_, size, _)| *size).collect();
    Some(GeneralPattern {
        extension: extension.to_string(),
        prefix: slice_chars(stems[0], 0, stems[0].chars().count() - prefix_len),
        suffix: {
            let chars: Vec<char> = stems[0].chars().collect();
            chars[chars.len() - suffix_len..].iter().collect()
        },
        variants,
        degenerate,
        sizes: SizeAggregate::from_sizes(&sizes)?,
        samples: group
            .iter()
            .take(GENERAL_MAX_SAMPLES)
            .map(|(_, _, reference)| (*reference).to_string())
            .collect(),
        matched: group.iter().map(|(name, _, _)| (*name).clone()).collect(),
    })
}

/// Detect Hive-style partition directories (rule 4).
pub fn detect_partitions(children: &BTreeMap<String, TreeNode>) -> Option<PartitionSummary> {
    if children.len() < PARTITION_MIN_CHILDREN {
        return None;
    }

    let mut keys: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut partitioned = 0usize;
    for name in children.keys() {
        if let Some((key, value)) = name.split_once('=') {
            if !key.is_empty() {
                keys.entry(key).or_default().push(value.to_string());
                partitioned += 1;
            }
        }
    }

    if partitioned < PARTITION_MIN_CHILDREN {
        return None;
    }
    if (partitioned as f64) <= PARTITION_RATIO * children.len() as f64 {
        return None;
    }

    let segments = keys
        .into_iter()
        .map(|(key, mut values)| {
            values.sort();
            values.dedup();
            (key.to_string(), values)
        })
        .collect();

    Some(PartitionSummary {
        segments,
        first_child: children.keys().next()?.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(size: u64) -> TreeNode {
        TreeNode::File {
            size,
            reference: "s3://bucket/x".to_string(),
        }
    }

    fn dir() -> TreeNode {
        TreeNode::Directory(BTreeMap::new())
    }

    fn level(names: &[(&str, TreeNode)]) -> BTreeMap<String, TreeNode> {
        names
            .iter()
            .map(|(name, node)| (name.to_string(), node.clone()))
            .collect()
    }

    #[test]
    fn test_numbered_run_contiguous() {
        let children: BTreeMap<String, TreeNode> = (0..10)
            .map(|i| (format!("{}.parquet", i), file(100 + i)))
            .collect();
        let run = detect_numbered_run(&children).unwrap();
        assert_eq!(run.min, 0);
        assert_eq!(run.max, 9);
        assert_eq!(run.extension, "parquet");
        assert_eq!(run.sizes.count, 10);
        assert_eq!(run.matched.len(), 10);
    }

    #[test]
    fn test_numbered_run_tolerates_small_gaps() {
        // 0..=9 minus one: 9 numbers over a span of 10 is exactly 90%.
        let children: BTreeMap<String, TreeNode> = (0..10)
            .filter(|i| *i != 5)
            .map(|i| (format!("{}.csv", i), file(1)))
            .collect();
        assert!(detect_numbered_run(&children).is_some());
    }

    #[test]
    fn test_numbered_run_rejects_sparse_numbers() {
        let children = level(&[
            ("1.csv", file(1)),
            ("50.csv", file(1)),
            ("900.csv", file(1)),
        ]);
        assert!(detect_numbered_run(&children).is_none());
    }

    #[test]
    fn test_numbered_run_rejects_low_ratio() {
        let children = level(&[
            ("1.csv", file(1)),
            ("2.csv", file(1)),
            ("alpha.csv", file(1)),
            ("beta.csv", file(1)),
        ]);
        assert!(detect_numbered_run(&children).is_none());
    }

    #[test]
    fn test_numbered_run_ignores_directories() {
        let children = level(&[("1", dir()), ("2", dir()), ("3", dir())]);
        assert!(detect_numbered_run(&children).is_none());
    }

    #[test]
    fn test_date_directories_detected() {
        let children = level(&[
            ("2024-01-01", dir()),
            ("2024-01-02", dir()),
            ("2024-01-03", dir()),
        ]);
        let run = detect_date_directories(&children).unwrap();
        assert_eq!(run.dates[0], "2024-01-01");
        assert_eq!(run.dates.len(), 3);
    }

    #[test]
    fn test_date_directories_rejects_files_and_low_ratio() {
        let files = level(&[("2024-01-01", file(1)), ("2024-01-02", file(1))]);
        assert!(detect_date_directories(&files).is_none());

        let mixed = level(&[
            ("2024-01-01", dir()),
            ("2024-01-02", dir()),
            ("a", dir()),
            ("b", dir()),
        ]);
        assert!(detect_date_directories(&mixed).is_none());
    }

    #[test]
    fn test_is_date_name() {
        assert!(is_date_name("1995-12-31"));
        assert!(!is_date_name("1995-1-31"));
        assert!(!is_date_name("19951231"));
        assert!(!is_date_name("1995-12-31x"));
    }

    #[test]
    fn test_general_pattern_affix_extraction() {
        let children: BTreeMap<String, TreeNode> = (0..12)
            .map(|i| (format!("tile_r{:02}_final.tif", i), file(10)))
            .collect();
        let pattern = detect_general_pattern(&children).unwrap();
        assert_eq!(pattern.extension, "tif");
        assert_eq!(pattern.prefix, "tile_r");
        assert_eq!(pattern.suffix, "_final");
        assert_eq!(pattern.variants.len(), 12);
        assert!(!pattern.degenerate);
        assert_eq!(pattern.samples.len(), 2);
    }

    #[test]
    fn test_general_pattern_requires_group_dominance() {
        let mut children: BTreeMap<String, TreeNode> = (0..10)
            .map(|i| (format!("a{}.tif", i), file(1)))
            .collect();
        for i in 0..8 {
            children.insert(format!("b{}.csv", i), file(1));
        }
        // 10 of 18 is under the 60% dominance bar.
        assert!(detect_general_pattern(&children).is_none());
    }

    #[test]
    fn test_general_pattern_degenerate_empty_variant() {
        let mut children: BTreeMap<String, TreeNode> = (1..12)
            .map(|i| (format!("data{}.csv", i), file(1)))
            .collect();
        children.insert("data.csv".to_string(), file(1));
        let pattern = detect_general_pattern(&children).unwrap();
        assert!(pattern.degenerate);
    }

    #[test]
    fn test_partition_grouping_and_values() {
        let children = level(&[
            ("year=1995", dir()),
            ("year=1996", dir()),
            ("year=1997", dir()),
        ]);
        let summary = detect_partitions(&children).unwrap();
        assert_eq!(summary.segments.len(), 1);
        assert_eq!(summary.segments[0].0, "year");
        assert_eq!(summary.segments[0].1, vec!["1995", "1996", "1997"]);
        assert_eq!(summary.first_child, "year=1995");
    }

    #[test]
    fn test_partition_rejects_minority() {
        let children = level(&[
            ("year=1995", dir()),
            ("year=1996", dir()),
            ("a", dir()),
            ("b", dir()),
        ]);
        assert!(detect_partitions(&children).is_none());
    }

    #[test]
    fn test_elide_values_boundary() {
        let ten: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(elide_values(&ten), "0,1,2,3,4,5,6,7,8,9");

        let years: Vec<String> = (1995..=2007).map(|y| y.to_string()).collect();
        assert_eq!(elide_values(&years), "1995,1996,...,2007 (13 total)");
    }

    #[test]
    fn test_detectors_handle_empty_level() {
        let empty = BTreeMap::new();
        assert!(detect_numbered_run(&empty).is_none());
        assert!(detect_date_directories(&empty).is_none());
        assert!(detect_general_pattern(&empty).is_none());
        assert!(detect_partitions(&empty).is_none());
    }
}
