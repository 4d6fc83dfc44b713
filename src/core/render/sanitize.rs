//! Raw HTML filtering against a tag allowlist.

use std::sync::LazyLock;

use regex::Regex;

/// Formatting tags kept (without attributes).
const ALLOWED: &[&str] = &[
    "b", "strong", "i", "em", "u", "s", "del", "ins", "sub", "sup", "mark", "small", "code", "kbd",
    "pre", "br", "hr", "p", "span", "div", "blockquote", "ul", "ol", "li", "h1", "h2", "h3", "h4",
    "h5", "h6", "table", "thead", "tbody", "tr", "th", "td",
];

/// Tags removed together with everything up to their closing tag.
const DROP_WITH_CONTENT: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "form", "input", "button", "textarea",
    "select", "link", "meta", "base", "svg", "math", "template", "noscript",
];

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<(/?)([A-Za-z][A-Za-z0-9-]*)(?:\s[^>]*?)?(/?)>").expect("static tag regex")
});

/// Streaming sanitizer. Inline HTML arrives one tag at a time, so the "inside a dropped
/// element" state is carried between calls to [`HtmlSanitizer::feed`].
#[derive(Debug, Default)]
pub(super) struct HtmlSanitizer {
    skipping: Option<String>,
}

impl HtmlSanitizer {
    /// True while inside an element whose content is being dropped.
    pub(super) fn is_skipping(&self) -> bool {
        self.skipping.is_some()
    }

    pub(super) fn feed(&mut self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut rest = html;
        loop {
            if let Some(name) = &self.skipping {
                match closing_tag_end(rest, name) {
                    Some(end) => {
                        rest = &rest[end..];
                        self.skipping = None;
                    }
                    None => return out,
                }
            }
            let Some(lt) = rest.find('<') else {
                out.push_str(rest);
                return out;
            };
            out.push_str(&rest[..lt]);
            rest = &rest[lt..];

            if let Some(after) = rest.strip_prefix("<!--") {
                rest = after.find("-->").map_or("", |end| &after[end + 3..]);
                continue;
            }
            let Some(caps) = TAG.captures(rest) else {
                out.push_str("&lt;");
                rest = &rest[1..];
                continue;
            };
            let whole = caps.get(0).map_or(1, |m| m.end());
            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let self_closing = caps.get(3).is_some_and(|m| !m.as_str().is_empty());
            let name = caps
                .get(2)
                .map(|m| m.as_str().to_ascii_lowercase())
                .unwrap_or_default();
            rest = &rest[whole..];

            if DROP_WITH_CONTENT.contains(&name.as_str()) {
                if !closing && !self_closing {
                    log::debug!("dropping <{}> element from rendered HTML", name);
                    self.skipping = Some(name);
                }
            } else if ALLOWED.contains(&name.as_str()) {
                out.push('<');
                if closing {
                    out.push('/');
                }
                out.push_str(&name);
                out.push('>');
            }
        }
    }
}

/// Sanitize a complete HTML fragment.
pub(super) fn sanitize_html(html: &str) -> String {
    HtmlSanitizer::default().feed(html)
}

/// Byte offset just past `</name>` (case-insensitive), if present.
fn closing_tag_end(s: &str, name: &str) -> Option<usize> {
    let lower = s.to_ascii_lowercase();
    let needle = format!("</{}", name);
    let mut from = 0;
    while let Some(pos) = lower[from..].find(&needle) {
        let after = from + pos + needle.len();
        let tail = &lower[after..];
        let trimmed = tail.trim_start();
        if trimmed.starts_with('>') {
            return Some(after + (tail.len() - trimmed.len()) + 1);
        }
        from = after;
    }
    None
}

/// Visible text of sanitized HTML, for the plain-text projection.
pub(super) fn html_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&lt;", "<")
}
