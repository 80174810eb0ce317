//! Human-readable output for CLI commands.

use crate::cache::{CacheEvent, CacheRecord, DescendantSnapshot, RebuildReport, VerifyReport};
use crate::store::Node;
use crate::types::NodeID;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn short_hash(hash: &str) -> &str {
    match hash.char_indices().nth(12) {
        Some((end, _)) => &hash[..end],
        None => hash,
    }
}

fn parent_label(parent: Option<NodeID>) -> String {
    parent.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string())
}

/// One line summarizing what a save or delete rippled into
pub fn format_ripple_summary(events: &[CacheEvent]) -> String {
    let updated = events
        .iter()
        .filter(|e| matches!(e, CacheEvent::AncestorUpdated { .. }))
        .count();
    let mut out = format!("  ancestors updated: {}", updated);
    for event in events.iter().filter(|e| e.is_warning()) {
        out.push_str(&format!(
            "\n  {} {}",
            "warning:".yellow(),
            serde_json::to_string(event).unwrap_or_else(|_| event.name().to_string())
        ));
    }
    out
}

pub fn format_node_text(node: &Node, record: &CacheRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        format_section_heading(&format!("Node {}", node.id.unwrap_or_default()))
    ));
    out.push_str(&format!("  Title: {}\n", node.title));
    out.push_str(&format!("  Alias: {}\n", node.alias));
    out.push_str(&format!("  Parent: {}\n", parent_label(node.parent)));
    out.push_str(&format!("  Position: {}\n", node.position));
    out.push_str(&format!(
        "  Published: {}\n\n",
        if node.published { "yes" } else { "no" }
    ));
    out.push_str(&format!("{}\n", format_section_heading("Cache")));
    out.push_str(&format!(
        "  Fingerprint: {}\n",
        record.fingerprint.as_deref().map(short_hash).unwrap_or("(unsettled)")
    ));
    out.push_str(&format!(
        "  Previous parent: {}\n",
        parent_label(record.previous_parent)
    ));
    out.push_str(&format!("  Children: {}\n", record.descendants.len()));
    out.push_str(&format!("  Descendants: {}\n", record.index.len()));
    out
}

/// Flat table of a snapshot, depth-first in listing order
pub fn format_descendant_table(snapshot: &DescendantSnapshot) -> String {
    fn walk(snapshot: &DescendantSnapshot, depth: usize, table: &mut Table) {
        for (id, entry) in snapshot.ordered() {
            table.add_row(vec![
                id.to_string(),
                format!("{}{}", "  ".repeat(depth), entry.title),
                entry.alias.clone(),
                depth.to_string(),
                if entry.published { "yes" } else { "no" }.to_string(),
            ]);
            walk(&entry.children, depth + 1, table);
        }
    }

    if snapshot.is_empty() {
        return "No descendants".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["ID", "Title", "Alias", "Depth", "Published"]);
    walk(snapshot, 0, &mut table);
    table.to_string()
}

/// Indented tree rendering rooted at `node`
pub fn format_tree(node: &Node, snapshot: &DescendantSnapshot) -> String {
    fn walk(snapshot: &DescendantSnapshot, prefix: &str, out: &mut String) {
        let children = snapshot.ordered();
        let last = children.len().saturating_sub(1);
        for (i, (id, entry)) in children.into_iter().enumerate() {
            let (branch, next) = if i == last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            let label = format!("{} #{}", entry.title, id);
            if entry.published {
                out.push_str(&format!("{}{}{}\n", prefix, branch, label));
            } else {
                out.push_str(&format!("{}{}{}\n", prefix, branch, label.dimmed()));
            }
            walk(&entry.children, &format!("{}{}", prefix, next), out);
        }
    }

    let mut out = format!("{} #{}\n", node.title.bold(), node.id.unwrap_or_default());
    walk(snapshot, "", &mut out);
    out
}

pub fn format_verify_text(report: &VerifyReport) -> String {
    let mut out = format!(
        "{}\n\n  Checked nodes: {}\n",
        format_section_heading("Hierarchy Cache"),
        report.checked
    );
    if report.is_clean() {
        out.push_str(&format!("  Status: {}\n", "consistent".green()));
        return out;
    }
    out.push_str(&format!(
        "  Status: {} ({} issues, {} violations)\n\n",
        "inconsistent".red(),
        report.issues.len(),
        report.violations()
    ));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Node", "Issue"]);
    for issue in &report.issues {
        table.add_row(vec![
            issue.node_id.to_string(),
            serde_json::to_string(&issue.kind).unwrap_or_default(),
        ]);
    }
    out.push_str(&format!("{}\n\nRun `canopy rebuild` to recompute every record.\n", table));
    out
}

pub fn format_rebuild_text(report: &RebuildReport) -> String {
    let mut out = format!(
        "{}\n\n  Nodes: {}\n  Records rewritten: {}\n",
        format_section_heading("Rebuild"),
        report.nodes,
        report.rewritten
    );
    if !report.orphans.is_empty() {
        out.push_str(&format!("  Orphans (cached as top level): {:?}\n", report.orphans));
    }
    if !report.unreachable.is_empty() {
        out.push_str(&format!(
            "  {} {:?}\n",
            "Skipped, parent cycle:".red(),
            report.unreachable
        ));
    }
    out
}
