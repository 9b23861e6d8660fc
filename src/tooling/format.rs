//! Format discovery results as human-readable text.

use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

use crate::catalog::Product;
use crate::discovery::{FileInfo, FlatStats, S3Product};
use crate::search::SearchHit;
use crate::tree::{human_size, DirectoryEntry, TreeStats};

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_accounts_text(accounts: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Accounts")));
    for account in accounts {
        out.push_str(&format!("  {}\n", account));
    }
    out.push_str(&format!("\nTotal: {} accounts.\n", accounts.len()));
    out
}

pub fn format_products_text(products: &[Product]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Products")));
    if products.is_empty() {
        out.push_str("No products found.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Product", "Account", "Title", "Featured"]);
    for product in products {
        table.add_row(vec![
            product.product_id.clone(),
            product.account_id.clone().unwrap_or_else(|| "-".to_string()),
            product.title.clone().unwrap_or_else(|| "-".to_string()),
            if product.is_featured() { "yes" } else { "" }.to_string(),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));
    out.push_str(&format!("Total: {} products.\n", products.len()));
    out
}

pub fn format_s3_products_text(products: &[S3Product]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading("Products (bucket scan)")
    ));
    if products.is_empty() {
        out.push_str("No products found.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Product", "Files", "Prefix"]);
    for product in products {
        let files = product
            .file_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            product.product_id.clone(),
            files,
            product.s3_prefix.clone(),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));
    out.push_str(&format!("Total: {} products.\n", products.len()));
    out
}

pub fn format_tree_stats_text(stats: &TreeStats) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", format_section_heading("Stats")));
    out.push_str(&format!("  Files: {}\n", stats.total_files));
    out.push_str(&format!("  Directories: {}\n", stats.total_directories));
    out.push_str(&format!(
        "  Total size: {} ({} bytes)\n",
        stats.total_size_human, stats.total_size
    ));
    if stats.truncated {
        out.push_str("  Listing truncated at the file cap.\n");
    }
    out
}

pub fn format_flat_listing_text(
    files: &[FileInfo],
    directories: &[DirectoryEntry],
    stats: &FlatStats,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Directories")));
    for dir in directories {
        out.push_str(&format!("  {}/ → {}\n", dir.name, dir.reference));
    }
    if directories.is_empty() {
        out.push_str("  (none)\n");
    }
    out.push_str(&format!("\n{}\n\n", format_section_heading("Files")));
    for file in files {
        out.push_str(&format!(
            "  {} ({}) → {}\n",
            file.key,
            human_size(file.size),
            file.s3_uri
        ));
    }
    if files.is_empty() {
        out.push_str("  (none)\n");
    }
    out.push_str(&format!(
        "\nTotal: {} files, {} directories.\n",
        stats.total_files, stats.total_directories
    ));
    out
}

pub fn format_file_info_text(info: &FileInfo) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Object")));
    out.push_str(&format!("  Key: {}\n", info.key));
    out.push_str(&format!("  S3 URI: {}\n", info.s3_uri));
    out.push_str(&format!("  HTTP URL: {}\n", info.http_url));
    out.push_str(&format!(
        "  Size: {} ({} bytes)\n",
        human_size(info.size),
        info.size
    ));
    if let Some(modified) = &info.last_modified {
        out.push_str(&format!("  Last modified: {}\n", modified.to_rfc3339()));
    }
    if let Some(etag) = &info.etag {
        out.push_str(&format!("  ETag: {}\n", etag));
    }
    out
}

pub fn format_search_text(hits: &[SearchHit]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Search results")));
    if hits.is_empty() {
        out.push_str("No matching products.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Product", "Score", "Similarity", "Matched", "Title"]);
    for hit in hits {
        table.add_row(vec![
            hit.product.product_id.clone(),
            format!("{:.2}", hit.search_score),
            format!("{:.2}", hit.similarity),
            hit.matched_fields.join(","),
            hit.product.title.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));
    out.push_str(&format!("Total: {} matches.\n", hits.len()));
    out
}
