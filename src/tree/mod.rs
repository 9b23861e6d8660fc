//! File-tree summarization engine.
//!
//! Converts a flat listing snapshot into a nested tree and renders it with
//! automatic pattern compression: numbered file runs, date-stamped snapshot
//! directories, repetitive filename families, and Hive-style partitions are
//! each collapsed into one summary line instead of being enumerated.

pub mod node;
pub mod patterns;
pub mod render;

pub use node::{build_tree, BuiltTree, TreeNode};
pub use render::{human_size, DirectoryEntry, RenderedTree, TreeRenderer, TreeStats};
