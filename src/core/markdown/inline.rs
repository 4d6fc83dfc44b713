//! Inline rewrites: emphasis spacing and pipe escaping, with code spans held aside.

use super::fence;

const OPEN: char = '\u{E000}';
const CLOSE: char = '\u{E001}';

/// Text with inline code spans swapped for placeholder tokens.
struct Protected {
    text: String,
    spans: Vec<String>,
}

impl Protected {
    /// Returns `None` when the input already contains placeholder characters; such text is
    /// left untouched rather than risking a wrong restore.
    fn new(s: &str) -> Option<Self> {
        if s.contains(OPEN) || s.contains(CLOSE) {
            return None;
        }
        let (ranges, _) = fence::pair_runs(s);
        let mut text = String::with_capacity(s.len());
        let mut spans = Vec::with_capacity(ranges.len());
        let mut last = 0;
        for range in ranges {
            text.push_str(&s[last..range.start]);
            text.push(OPEN);
            text.push_str(&spans.len().to_string());
            text.push(CLOSE);
            spans.push(s[range.clone()].to_string());
            last = range.end;
        }
        text.push_str(&s[last..]);
        Some(Protected { text, spans })
    }

    fn restore(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut rest = s;
        while let Some(pos) = rest.find(OPEN) {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + OPEN.len_utf8()..];
            let token = after
                .find(CLOSE)
                .and_then(|end| after[..end].parse::<usize>().ok().map(|n| (n, end)));
            match token {
                Some((n, end)) if n < self.spans.len() => {
                    out.push_str(&self.spans[n]);
                    rest = &after[end + CLOSE.len_utf8()..];
                }
                _ => {
                    out.push(OPEN);
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Apply the inline rules to one line of prose. Code spans come back byte-identical.
pub(super) fn normalize_inline(s: &str) -> String {
    let Some(protected) = Protected::new(s) else {
        return s.to_string();
    };
    let fixed = escape_pipes(&tighten_emphasis(&protected.text));
    protected.restore(&fixed)
}

#[derive(Debug, Clone, Copy)]
struct StarRun {
    start: usize,
    len: usize,
}

fn star_runs(s: &str) -> Vec<StarRun> {
    let bytes = s.as_bytes();
    let mut runs = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'*' {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i] == b'*' {
            i += 1;
        }
        let escaped = start > 0 && bytes[start - 1] == b'\\';
        if !escaped {
            runs.push(StarRun {
                start,
                len: i - start,
            });
        }
    }
    runs
}

/// Remove whitespace between `**`/`*` markers and the text they wrap.
///
/// Markers are paired left to right; an odd number of markers of a kind leaves that kind
/// alone. Runs of three or more stars are never touched. A single-star pair with whitespace
/// on both inner sides reads as arithmetic (`2 * 3 * 4`) and is kept.
pub(super) fn tighten_emphasis(s: &str) -> String {
    let runs = star_runs(s);
    let mut drop = vec![false; s.len()];
    let mut changed = false;
    for len in [2, 1] {
        let markers: Vec<StarRun> = runs
            .iter()
            .copied()
            .filter(|r| r.len == len)
            .collect();
        if markers.len() < 2 || markers.len() % 2 != 0 {
            continue;
        }
        for pair in markers.chunks(2) {
            let inner_start = pair[0].start + len;
            let inner_end = pair[1].start;
            let inner = &s[inner_start..inner_end];
            let trimmed = inner.trim();
            if trimmed.is_empty()
                || trimmed.len() == inner.len()
                || trimmed.starts_with('*')
                || trimmed.ends_with('*')
            {
                continue;
            }
            let lead = inner.len() - inner.trim_start().len();
            let trail = inner.len() - inner.trim_end().len();
            if len == 1 && lead > 0 && trail > 0 {
                continue;
            }
            drop[inner_start..inner_start + lead].fill(true);
            drop[inner_end - trail..inner_end].fill(true);
            changed = true;
        }
    }
    if !changed {
        return s.to_string();
    }
    s.char_indices()
        .filter(|(i, _)| !drop[*i])
        .map(|(_, c)| c)
        .collect()
}

/// Escape every `|` not already preceded by a backslash.
pub(super) fn escape_pipes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev = None;
    for c in s.chars() {
        if c == '|' && prev != Some('\\') {
            out.push('\\');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}
