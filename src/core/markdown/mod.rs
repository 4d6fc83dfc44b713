//! Markdown repair for model output.
//!
//! Language-model replies arrive with inconsistent Markdown: headings without a space after
//! the hashes, exotic bullet glyphs, code fences glued to prose, tables with no header
//! separator. [`normalize`] classifies each line into a typed block, applies inline fixes with
//! code spans held aside, and serializes the blocks back in a canonical layout. Fenced code is
//! carried through byte-for-byte.
//!
//! Both [`normalize`] and [`reconcile_tables`] are total and idempotent.

mod blocks;
mod fence;
mod inline;
mod tables;

pub use tables::reconcile_tables;

/// Canonicalize Markdown. See the module docs for the rules applied.
pub fn normalize(input: &str) -> String {
    if input.trim().is_empty() {
        return String::new();
    }
    let unified = input.replace("\r\n", "\n").replace('\r', "\n");
    blocks::serialize(&blocks::lex(&unified))
}

/// Full pipeline applied to bot replies: [`normalize`] followed by [`reconcile_tables`].
pub fn normalize_response(input: &str) -> String {
    reconcile_tables(&normalize(input))
}
