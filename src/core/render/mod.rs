//! Normalized Markdown → typed display tree.
//!
//! Raw HTML is filtered, unsafe link targets are neutralized, and every link is tagged
//! [`LinkKind::Internal`] or [`LinkKind::External`] so a front end can open external targets
//! in an isolated context.

mod links;
mod sanitize;
mod text;

pub use links::LinkKind;
pub use text::to_plain_text;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

use sanitize::{HtmlSanitizer, sanitize_html};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    None,
    Left,
    Center,
    Right,
}

impl From<pulldown_cmark::Alignment> for Alignment {
    fn from(a: pulldown_cmark::Alignment) -> Self {
        match a {
            pulldown_cmark::Alignment::None => Alignment::None,
            pulldown_cmark::Alignment::Left => Alignment::Left,
            pulldown_cmark::Alignment::Center => Alignment::Center,
            pulldown_cmark::Alignment::Right => Alignment::Right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    Paragraph(Vec<Inline>),
    List {
        /// First number of an ordered list; `None` for bullets.
        start: Option<u64>,
        /// Nesting depth, 0 for a top-level list.
        depth: usize,
        items: Vec<Vec<Block>>,
    },
    Table {
        alignments: Vec<Alignment>,
        header: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    BlockQuote(Vec<Block>),
    Rule,
    /// Sanitized raw HTML.
    Html(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Code(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Link(Link),
    Image {
        src: String,
        alt: String,
        title: String,
    },
    SoftBreak,
    HardBreak,
    /// Sanitized inline HTML.
    Html(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub title: String,
    pub kind: LinkKind,
    pub content: Vec<Inline>,
}

impl Link {
    /// External links open in a new browsing context.
    pub fn opens_new_context(&self) -> bool {
        self.rel().is_some()
    }

    /// `rel` attribute a front end should set on the anchor.
    pub fn rel(&self) -> Option<&'static str> {
        match self.kind {
            LinkKind::External => Some("noopener noreferrer"),
            LinkKind::Internal => None,
        }
    }
}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Parse Markdown into display blocks. `site_host` decides which absolute links are internal.
pub fn render(markdown: &str, site_host: Option<&str>) -> Vec<Block> {
    let mut builder = TreeBuilder {
        events: Parser::new_ext(markdown, parser_options()),
        site_host,
        list_depth: 0,
        html: HtmlSanitizer::default(),
    };
    builder.blocks()
}

fn is_block_tag(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Paragraph
            | Tag::Heading { .. }
            | Tag::BlockQuote { .. }
            | Tag::CodeBlock { .. }
            | Tag::HtmlBlock
            | Tag::List { .. }
            | Tag::Item
            | Tag::FootnoteDefinition { .. }
            | Tag::Table { .. }
            | Tag::TableHead
            | Tag::TableRow
            | Tag::TableCell
            | Tag::MetadataBlock { .. }
    )
}

/// Plain text of an inline run (image alt text, plain-text output).
pub(crate) fn inline_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(s) | Inline::Code(s) => out.push_str(s),
            Inline::Emphasis(c) | Inline::Strong(c) | Inline::Strikethrough(c) => {
                out.push_str(&inline_text(c))
            }
            Inline::Link(link) => out.push_str(&inline_text(&link.content)),
            Inline::Image { alt, .. } => out.push_str(alt),
            Inline::SoftBreak => out.push(' '),
            Inline::HardBreak => out.push('\n'),
            Inline::Html(h) => out.push_str(&sanitize::html_text(h)),
        }
    }
    out
}

fn push_text(out: &mut Vec<Inline>, s: &str) {
    if let Some(Inline::Text(prev)) = out.last_mut() {
        prev.push_str(s);
    } else {
        out.push(Inline::Text(s.to_string()));
    }
}

struct TreeBuilder<'a, 'h> {
    events: Parser<'a>,
    site_host: Option<&'h str>,
    list_depth: usize,
    html: HtmlSanitizer,
}

impl<'a> TreeBuilder<'a, '_> {
    /// Blocks up to the end of the enclosing container. Inline content that appears directly in
    /// a container (tight list items) is gathered into a paragraph.
    fn blocks(&mut self) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut loose: Vec<Inline> = Vec::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::End(_) => break,
                Event::Start(tag) if is_block_tag(&tag) => {
                    flush_loose(&mut loose, &mut blocks);
                    self.block(tag, &mut blocks);
                }
                Event::Rule => {
                    flush_loose(&mut loose, &mut blocks);
                    blocks.push(Block::Rule);
                }
                other => self.inline(other, &mut loose),
            }
        }
        flush_loose(&mut loose, &mut blocks);
        blocks
    }

    fn block(&mut self, tag: Tag<'a>, out: &mut Vec<Block>) {
        match tag {
            Tag::Paragraph => {
                let content = self.inlines();
                if !content.is_empty() {
                    out.push(Block::Paragraph(content));
                }
            }
            Tag::Heading { level, .. } => out.push(Block::Heading {
                level: level as u8,
                content: self.inlines(),
            }),
            Tag::BlockQuote { .. } => out.push(Block::BlockQuote(self.blocks())),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                out.push(Block::CodeBlock {
                    language,
                    code: self.raw_text(),
                });
            }
            Tag::HtmlBlock => {
                let clean = sanitize_html(&self.raw_text());
                if !clean.trim().is_empty() {
                    out.push(Block::Html(clean));
                }
            }
            Tag::List(start) => out.push(self.list(start)),
            Tag::Table(alignments) => out.push(self.table(alignments)),
            // Footnote bodies, stray items and the like: keep their content in place.
            _ => out.extend(self.blocks()),
        }
    }

    fn list(&mut self, start: Option<u64>) -> Block {
        let depth = self.list_depth;
        self.list_depth += 1;
        let mut items = Vec::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::Start(Tag::Item) => items.push(self.blocks()),
                Event::End(_) => break,
                _ => {}
            }
        }
        self.list_depth -= 1;
        Block::List {
            start,
            depth,
            items,
        }
    }

    fn table(&mut self, alignments: Vec<pulldown_cmark::Alignment>) -> Block {
        let mut header = Vec::new();
        let mut rows = Vec::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::Start(Tag::TableHead) => header = self.row(),
                Event::Start(Tag::TableRow) => rows.push(self.row()),
                Event::End(_) => break,
                _ => {}
            }
        }
        Block::Table {
            alignments: alignments.into_iter().map(Alignment::from).collect(),
            header,
            rows,
        }
    }

    fn row(&mut self) -> Vec<Vec<Inline>> {
        let mut cells = Vec::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::Start(Tag::TableCell) => cells.push(self.inlines()),
                Event::Start(Tag::TableRow) => cells.extend(self.row()),
                Event::End(_) => break,
                _ => {}
            }
        }
        cells
    }

    /// Concatenated text up to the end of the current element (code and HTML blocks).
    fn raw_text(&mut self) -> String {
        let mut text = String::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::Text(t) | Event::Html(t) | Event::InlineHtml(t) | Event::Code(t) => {
                    text.push_str(&t)
                }
                Event::End(_) => break,
                _ => {}
            }
        }
        text
    }

    fn inlines(&mut self) -> Vec<Inline> {
        let mut out = Vec::new();
        while let Some(event) = self.events.next() {
            if let Event::End(_) = event {
                break;
            }
            self.inline(event, &mut out);
        }
        out
    }

    fn inline(&mut self, event: Event<'a>, out: &mut Vec<Inline>) {
        if self.html.is_skipping() && !matches!(event, Event::InlineHtml(_) | Event::Html(_)) {
            // Inside <script> and friends: drop everything, but stay balanced.
            if let Event::Start(_) = event {
                self.inlines();
            }
            return;
        }
        match event {
            Event::Text(t) => push_text(out, &t),
            Event::Code(c) => out.push(Inline::Code(c.to_string())),
            Event::SoftBreak => out.push(Inline::SoftBreak),
            Event::HardBreak => out.push(Inline::HardBreak),
            Event::InlineHtml(h) | Event::Html(h) => {
                let clean = self.html.feed(&h);
                if !clean.is_empty() {
                    out.push(Inline::Html(clean));
                }
            }
            Event::TaskListMarker(done) => push_text(out, if done { "[x] " } else { "[ ] " }),
            Event::FootnoteReference(name) => push_text(out, &format!("[^{}]", name)),
            Event::Start(tag) => self.inline_tag(tag, out),
            _ => {}
        }
    }

    fn inline_tag(&mut self, tag: Tag<'a>, out: &mut Vec<Inline>) {
        match tag {
            Tag::Emphasis => out.push(Inline::Emphasis(self.inlines())),
            Tag::Strong => out.push(Inline::Strong(self.inlines())),
            Tag::Strikethrough => out.push(Inline::Strikethrough(self.inlines())),
            Tag::Link {
                dest_url, title, ..
            } => {
                let content = self.inlines();
                match links::classify(&dest_url, self.site_host) {
                    Some(kind) => out.push(Inline::Link(Link {
                        href: dest_url.to_string(),
                        title: title.to_string(),
                        kind,
                        content,
                    })),
                    None => {
                        log::debug!("unsafe link target dropped: {}", dest_url);
                        out.extend(content);
                    }
                }
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let alt = inline_text(&self.inlines());
                if links::classify(&dest_url, self.site_host).is_some() {
                    out.push(Inline::Image {
                        src: dest_url.to_string(),
                        alt,
                        title: title.to_string(),
                    });
                } else {
                    log::debug!("unsafe image source dropped: {}", dest_url);
                    push_text(out, &alt);
                }
            }
            _ => out.extend(self.inlines()),
        }
    }
}

fn flush_loose(loose: &mut Vec<Inline>, blocks: &mut Vec<Block>) {
    if !loose.is_empty() {
        blocks.push(Block::Paragraph(std::mem::take(loose)));
    }
}

#[cfg(test)]
mod tests;
