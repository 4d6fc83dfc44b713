//! Table reconciliation: give pipe tables the header separator renderers require.

use super::fence::{self, FenceTracker};

/// Number of `|` characters not escaped with a backslash.
fn unescaped_pipes(s: &str) -> usize {
    let mut count = 0;
    let mut prev = None;
    for c in s.chars() {
        if c == '|' && prev != Some('\\') {
            count += 1;
        }
        prev = Some(c);
    }
    count
}

/// A table row starts and ends with `|` and has at least two unescaped pipes.
pub(super) fn is_table_row(line: &str) -> bool {
    let t = line.trim();
    t.starts_with('|') && t.ends_with('|') && !t.ends_with("\\|") && unescaped_pipes(t) >= 2
}

/// A header separator: only pipes, dashes, colons and blanks, with at least one dash.
fn is_separator(line: &str) -> bool {
    let t = line.trim();
    t.contains('-')
        && t.contains('|')
        && t.chars().all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

fn separator_for(header: &str) -> String {
    let indent = &header[..fence::indent_len(header)];
    let columns = unescaped_pipes(header.trim()).saturating_sub(1).max(1);
    format!("{}|{}", indent, " --- |".repeat(columns))
}

/// Insert a `| --- | … |` separator after the first row of every table run that lacks one.
///
/// Runs whose second line is already a separator are left untouched, as are lines inside
/// fenced code and runs that start with a separator.
pub fn reconcile_tables(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut fences = FenceTracker::default();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if fences.observe(line) || !is_table_row(line) {
            out.push(line.to_string());
            i += 1;
            continue;
        }
        let end = (i..lines.len())
            .find(|&j| !is_table_row(lines[j]))
            .unwrap_or(lines.len());
        let run = &lines[i..end];
        out.push(run[0].to_string());
        let has_separator = run.get(1).is_some_and(|l| is_separator(l));
        if !has_separator && !is_separator(run[0]) {
            log::debug!("table run at line {} missing header separator", i + 1);
            out.push(separator_for(run[0]));
        }
        out.extend(run[1..].iter().map(|l| l.to_string()));
        i = end;
    }
    out.join("\n")
}
