//! Line classification into typed blocks, and their canonical re-serialization.

use std::collections::VecDeque;

use super::fence;
use super::inline::normalize_inline;
use super::tables::is_table_row;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ListMarker {
    Bullet,
    /// Ordered marker; the number is kept as written.
    Ordered(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Block {
    Blank,
    Fence {
        indent: String,
        run: usize,
        info: String,
        /// Lines between the fences, verbatim.
        body: Vec<String>,
        /// `None` when the fence is never closed.
        closing: Option<String>,
    },
    Heading {
        level: usize,
        text: String,
    },
    ListItem {
        indent: String,
        marker: ListMarker,
        text: String,
    },
    Quote(String),
    TableRow(String),
    Rule(String),
    Paragraph(String),
}

/// Split text (with `\n` line endings) into blocks.
///
/// Lines may be split while lexing (prose before an opening fence, code on a fence line), so
/// the lexer works from a queue rather than a plain iterator.
pub(super) fn lex(text: &str) -> Vec<Block> {
    let mut pending: VecDeque<String> = text.split('\n').map(str::to_string).collect();
    let mut blocks = Vec::new();
    while let Some(line) = pending.pop_front() {
        if let Some(open) = fence::opening(&line) {
            let block = lex_fence(open, &mut pending);
            blocks.push(block);
            continue;
        }
        if let Some((prose, fence_start)) = split_before_fence(&line) {
            pending.push_front(fence_start);
            pending.push_front(prose);
            continue;
        }
        blocks.push(classify(&line));
    }
    blocks
}

fn lex_fence(open: fence::Opening<'_>, pending: &mut VecDeque<String>) -> Block {
    let indent = open.indent.to_string();
    let ticks = "`".repeat(open.run);

    // ```code``` on a single line: give the code a line of its own.
    if let Some((pos, len)) = fence::find_run(open.rest, 3) {
        let code = open.rest[..pos].trim();
        let after = open.rest[pos + len..].trim();
        if !after.is_empty() {
            pending.push_front(after.to_string());
        }
        return Block::Fence {
            closing: Some(format!("{}{}", indent, ticks)),
            indent,
            run: open.run,
            info: String::new(),
            body: if code.is_empty() {
                Vec::new()
            } else {
                vec![code.to_string()]
            },
        };
    }

    let info = open.rest.trim().to_string();
    let mut body = Vec::new();
    while let Some(line) = pending.pop_front() {
        if fence::is_closing(&line, open.run) {
            return Block::Fence {
                indent,
                run: open.run,
                info,
                body,
                closing: Some(line.trim_end().to_string()),
            };
        }
        if let Some(code) = code_before_closing(&line, open.run) {
            body.push(code);
            return Block::Fence {
                closing: Some(format!("{}{}", indent, ticks)),
                indent,
                run: open.run,
                info,
                body,
            };
        }
        body.push(line);
    }
    Block::Fence {
        indent,
        run: open.run,
        info,
        body,
        closing: None,
    }
}

/// `let x = 1;```` → `let x = 1;` when the trailing run can close a fence of length `run`.
fn code_before_closing(line: &str, run: usize) -> Option<String> {
    let t = line.trim_end();
    let code = t.trim_end_matches('`');
    let ticks = t.len() - code.len();
    if ticks < run || code.trim().is_empty() {
        return None;
    }
    let (_, unmatched) = fence::pair_runs(code);
    if unmatched.iter().any(|&(_, len)| len >= 3) {
        return None;
    }
    Some(code.trim_end().to_string())
}

/// Prose followed by an opening fence on the same line: `Example: ```python`.
fn split_before_fence(line: &str) -> Option<(String, String)> {
    let (_, unmatched) = fence::pair_runs(line);
    let &(pos, _) = unmatched.iter().rev().find(|&&(_, len)| len >= 3)?;
    let prose = line[..pos].trim_end();
    if prose.trim().is_empty() {
        return None;
    }
    Some((prose.to_string(), line[pos..].to_string()))
}

fn classify(line: &str) -> Block {
    let line = line.trim_end();
    if line.is_empty() {
        return Block::Blank;
    }
    let indent_len = fence::indent_len(line);
    let indent = &line[..indent_len];
    let body = &line[indent_len..];

    if indent_len <= 3 {
        if let Some(heading) = heading(body) {
            return heading;
        }
        if let Some(rest) = body.strip_prefix('>') {
            return Block::Quote(rest.trim_start().to_string());
        }
    }
    if is_rule(body) {
        return Block::Rule(line.to_string());
    }
    if is_table_row(line) {
        return Block::TableRow(line.to_string());
    }
    if let Some((marker, text)) = list_item(body) {
        return Block::ListItem {
            indent: indent.to_string(),
            marker,
            text: text.to_string(),
        };
    }
    Block::Paragraph(line.to_string())
}

fn heading(body: &str) -> Option<Block> {
    let level = body.bytes().take_while(|&b| b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    Some(Block::Heading {
        level,
        text: body[level..].trim().to_string(),
    })
}

/// `---`, `***`, `___`, with optional spaces between the characters.
fn is_rule(body: &str) -> bool {
    let mut marks = body.chars().filter(|c| !matches!(c, ' ' | '\t'));
    let Some(first) = marks.next() else {
        return false;
    };
    if !matches!(first, '-' | '*' | '_') {
        return false;
    }
    let mut count = 1;
    for c in marks {
        if c != first {
            return false;
        }
        count += 1;
    }
    count >= 3
}

fn list_item(body: &str) -> Option<(ListMarker, &str)> {
    let first = body.chars().next()?;
    let after = &body[first.len_utf8()..];
    let text = match first {
        '-' | '+' | '*' => {
            if !after.starts_with([' ', '\t']) {
                return None;
            }
            after.trim_start()
        }
        '•' | '·' | '○' | '◦' => after.trim_start(),
        c if c.is_ascii_digit() => {
            let digits = body.bytes().take_while(u8::is_ascii_digit).count();
            if digits > 9 {
                return None;
            }
            let rest = body[digits..].strip_prefix('.')?;
            // 3.14 is a number, not an item.
            if rest.chars().next().is_none_or(|c| c.is_ascii_digit()) {
                return None;
            }
            let text = rest.trim_start();
            if text.is_empty() {
                return None;
            }
            return Some((ListMarker::Ordered(body[..digits].to_string()), text));
        }
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    Some((ListMarker::Bullet, text))
}

impl Block {
    fn render_into(&self, out: &mut Vec<String>) {
        match self {
            Block::Blank => out.push(String::new()),
            Block::Fence {
                indent,
                run,
                info,
                body,
                closing,
            } => {
                out.push(format!("{}{}{}", indent, "`".repeat(*run), info));
                out.extend(body.iter().cloned());
                if let Some(closing) = closing {
                    out.push(closing.clone());
                }
            }
            Block::Heading { level, text } => {
                let hashes = "#".repeat(*level);
                if text.is_empty() {
                    out.push(hashes);
                } else {
                    out.push(format!("{} {}", hashes, normalize_inline(text)));
                }
            }
            Block::ListItem {
                indent,
                marker,
                text,
            } => {
                let marker = match marker {
                    ListMarker::Bullet => "-".to_string(),
                    ListMarker::Ordered(n) => format!("{}.", n),
                };
                let text = normalize_inline(text);
                let mut item = format!("{} {}", marker, text);
                // `- --` would read back as a thematic break.
                if is_rule(&item) {
                    item = format!("{} \\{}", marker, text);
                }
                out.push(format!("{}{}", indent, item));
            }
            Block::Quote(text) => {
                if text.is_empty() {
                    out.push(">".to_string());
                } else {
                    out.push(format!("> {}", normalize_inline(text)));
                }
            }
            Block::TableRow(line) | Block::Rule(line) => out.push(line.clone()),
            Block::Paragraph(line) => out.push(normalize_inline(line)),
        }
    }
}

/// Serialize blocks back to text, enforcing the blank-line layout: runs of blank lines become
/// one, headings and table runs are surrounded by blank lines, and a quote run is separated
/// from preceding prose. Leading and trailing blank lines are dropped.
pub(super) fn serialize(blocks: &[Block]) -> String {
    let mut out: Vec<String> = Vec::with_capacity(blocks.len());
    let mut prev: Option<&Block> = None;
    let mut saw_blank = false;
    for block in blocks {
        if matches!(block, Block::Blank) {
            saw_blank = true;
            continue;
        }
        if let Some(prev) = prev {
            let is_row = |b: &Block| matches!(b, Block::TableRow(_));
            let separate = saw_blank
                || matches!(prev, Block::Heading { .. })
                || matches!(block, Block::Heading { .. })
                || (matches!(block, Block::Quote(_)) && !matches!(prev, Block::Quote(_)))
                || is_row(prev) != is_row(block);
            if separate {
                Block::Blank.render_into(&mut out);
            }
        }
        saw_blank = false;
        block.render_into(&mut out);
        prev = Some(block);
    }
    out.join("\n")
}
