//! Backtick fence recognition shared by the normalizer and the table reconciler.

use std::ops::Range;

/// An opening fence line split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Opening<'a> {
    pub indent: &'a str,
    /// Length of the backtick run (3 or more).
    pub run: usize,
    /// Everything after the backtick run.
    pub rest: &'a str,
}

impl Opening<'_> {
    /// True when the rest of the line closes the fence again (```` ```code``` ````).
    pub fn closes_inline(&self) -> bool {
        find_run(self.rest, 3).is_some()
    }
}

/// Length of the leading whitespace of `line`, in bytes.
pub(super) fn indent_len(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Recognize a line whose first non-blank characters are three or more backticks.
///
/// The info string of a backtick fence cannot contain a backtick, so such lines are not
/// openings unless the rest of the line closes the fence again.
pub(super) fn opening(line: &str) -> Option<Opening<'_>> {
    let indent = &line[..indent_len(line)];
    let body = &line[indent.len()..];
    let run = body.bytes().take_while(|&b| b == b'`').count();
    if run < 3 {
        return None;
    }
    let open = Opening {
        indent,
        run,
        rest: &body[run..],
    };
    if open.rest.contains('`') && !open.closes_inline() {
        return None;
    }
    Some(open)
}

/// A closing fence is a line made only of at least `run` backticks (plus surrounding blanks).
pub(super) fn is_closing(line: &str, run: usize) -> bool {
    let t = line.trim();
    t.len() >= run && t.bytes().all(|b| b == b'`')
}

/// Fence state for scanners that only need to know whether a line is code.
#[derive(Debug, Default)]
pub(super) struct FenceTracker {
    open: Option<usize>,
}

impl FenceTracker {
    /// Feed one line; returns true when the line belongs to a fence (markers included).
    pub fn observe(&mut self, line: &str) -> bool {
        match self.open {
            Some(run) => {
                if is_closing(line, run) {
                    self.open = None;
                }
                true
            }
            None => match opening(line) {
                Some(o) if !o.closes_inline() => {
                    self.open = Some(o.run);
                    true
                }
                _ => false,
            },
        }
    }
}

/// Byte offset of the first run of at least `min` backticks in `s`, with its length.
pub(super) fn find_run(s: &str, min: usize) -> Option<(usize, usize)> {
    runs(s).find(|&(_, len)| len >= min)
}

/// Pair backtick runs into code spans the way inline parsing does: a run closes at the next
/// run of the same length. Returns the spans as byte ranges and the runs left unmatched.
pub(super) fn pair_runs(s: &str) -> (Vec<Range<usize>>, Vec<(usize, usize)>) {
    let runs: Vec<(usize, usize)> = runs(s).collect();
    let mut spans = Vec::new();
    let mut unmatched = Vec::new();
    let mut i = 0;
    while i < runs.len() {
        let (start, len) = runs[i];
        match (i + 1..runs.len()).find(|&j| runs[j].1 == len) {
            Some(j) => {
                spans.push(start..runs[j].0 + len);
                i = j + 1;
            }
            None => {
                unmatched.push(runs[i]);
                i += 1;
            }
        }
    }
    (spans, unmatched)
}

/// All maximal backtick runs in `s` as `(offset, length)`.
pub(super) fn runs(s: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    let bytes = s.as_bytes();
    let mut i = 0;
    std::iter::from_fn(move || {
        while i < bytes.len() {
            if bytes[i] == b'`' {
                let start = i;
                while i < bytes.len() && bytes[i] == b'`' {
                    i += 1;
                }
                return Some((start, i - start));
            }
            i += 1;
        }
        None
    })
}
