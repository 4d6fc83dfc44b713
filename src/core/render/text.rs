//! Plain-text projection of the display tree for terminals.

use super::sanitize::html_text;
use super::{Alignment, Block, Inline, inline_text};

const MIN_WIDTH: usize = 20;

/// Lay blocks out as wrapped plain text, `width` columns wide.
pub fn to_plain_text(blocks: &[Block], width: usize) -> String {
    render_blocks(blocks, width.max(MIN_WIDTH)).join("\n\n")
}

/// One string per block; callers join with blank lines.
fn render_blocks(blocks: &[Block], width: usize) -> Vec<String> {
    blocks
        .iter()
        .map(|b| render_block(b, width))
        .filter(|s| !s.is_empty())
        .collect()
}

fn render_block(block: &Block, width: usize) -> String {
    match block {
        Block::Heading { level, content } => {
            let text = textwrap::fill(&inline_plain(content), width);
            let underline = if *level == 1 { '=' } else { '-' };
            let len = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
            format!("{}\n{}", text, underline.to_string().repeat(len))
        }
        Block::Paragraph(content) => textwrap::fill(&inline_plain(content), width),
        Block::List { start, items, .. } => render_list(*start, items, width),
        Block::Table {
            alignments,
            header,
            rows,
        } => render_table(alignments, header, rows),
        Block::CodeBlock { code, .. } => code
            .trim_end_matches('\n')
            .lines()
            .map(|l| format!("    {}", l))
            .collect::<Vec<_>>()
            .join("\n"),
        Block::BlockQuote(inner) => render_blocks(inner, width.saturating_sub(2).max(MIN_WIDTH))
            .join("\n\n")
            .lines()
            .map(|l| if l.is_empty() { ">".to_string() } else { format!("> {}", l) })
            .collect::<Vec<_>>()
            .join("\n"),
        Block::Rule => "─".repeat(width.min(40)),
        Block::Html(html) => textwrap::fill(html_text(html).trim(), width),
    }
}

fn render_list(start: Option<u64>, items: &[Vec<Block>], width: usize) -> String {
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let marker = match start {
            Some(n) => format!("{}. ", n + i as u64),
            None => "- ".to_string(),
        };
        let pad = " ".repeat(marker.chars().count());
        let inner_width = width.saturating_sub(pad.len()).max(MIN_WIDTH);
        let body = render_blocks(item, inner_width).join("\n");
        let mut lines = body.lines();
        let first = lines.next().unwrap_or("");
        let mut rendered = format!("{}{}", marker, first);
        for line in lines {
            rendered.push('\n');
            if !line.is_empty() {
                rendered.push_str(&pad);
                rendered.push_str(line);
            }
        }
        out.push(rendered);
    }
    out.join("\n")
}

fn render_table(
    alignments: &[Alignment],
    header: &[Vec<Inline>],
    rows: &[Vec<Vec<Inline>>],
) -> String {
    let cells = |row: &[Vec<Inline>]| -> Vec<String> {
        row.iter()
            .map(|c| inline_plain(c).replace('\n', " "))
            .collect()
    };
    let header = cells(header);
    let rows: Vec<Vec<String>> = rows.iter().map(|r| cells(r.as_slice())).collect();
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain([header.len()])
        .max()
        .unwrap_or(0);
    let mut widths = vec![0; columns];
    for row in std::iter::once(&header).chain(rows.iter()) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |row: &[String]| -> String {
        (0..columns)
            .map(|i| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let w = widths[i];
                match alignments.get(i).copied().unwrap_or(Alignment::None) {
                    Alignment::Right => format!("{:>w$}", cell),
                    Alignment::Center => format!("{:^w$}", cell),
                    Alignment::Left | Alignment::None => format!("{:<w$}", cell),
                }
            })
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(header.as_slice())];
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat((*w).max(1)))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.extend(rows.iter().map(|r| line(r.as_slice())));
    out.join("\n")
}

/// Inline text with link targets spelled out for external links.
fn inline_plain(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Code(code) => {
                out.push('`');
                out.push_str(code);
                out.push('`');
            }
            Inline::Emphasis(c) | Inline::Strong(c) | Inline::Strikethrough(c) => {
                out.push_str(&inline_plain(c))
            }
            Inline::Link(link) => {
                let text = inline_plain(&link.content);
                out.push_str(&text);
                if link.opens_new_context() && text != link.href {
                    out.push_str(&format!(" <{}>", link.href));
                }
            }
            Inline::Image { alt, .. } => out.push_str(&format!("[image: {}]", alt)),
            other => out.push_str(&inline_text(std::slice::from_ref(other))),
        }
    }
    out
}
