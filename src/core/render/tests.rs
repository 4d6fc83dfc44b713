use super::*;
use crate::core::markdown::normalize_response;

const SITE: Option<&str> = Some("clinic.example.com");

fn only_paragraph(md: &str) -> Vec<Inline> {
    match render(md, SITE).as_slice() {
        [Block::Paragraph(content)] => content.clone(),
        other => panic!("expected one paragraph, got {:?}", other),
    }
}

fn first_link(inlines: &[Inline]) -> Option<&Link> {
    inlines.iter().find_map(|i| match i {
        Inline::Link(link) => Some(link),
        _ => None,
    })
}

#[test]
fn headings_carry_level() {
    let blocks = render("## Dosage", SITE);
    assert_eq!(
        blocks,
        vec![Block::Heading {
            level: 2,
            content: vec![Inline::Text("Dosage".into())]
        }]
    );
}

#[test]
fn emphasis_and_strikethrough() {
    let content = only_paragraph("**strong** *em* ~~gone~~ `code`");
    assert!(matches!(&content[0], Inline::Strong(c) if c == &vec![Inline::Text("strong".into())]));
    assert!(content.iter().any(|i| matches!(i, Inline::Emphasis(_))));
    assert!(content.iter().any(|i| matches!(i, Inline::Strikethrough(_))));
    assert!(content.contains(&Inline::Code("code".into())));
}

#[test]
fn external_link_isolated() {
    let content = only_paragraph("See [WHO](https://who.int/flu).");
    let link = first_link(&content).unwrap();
    assert_eq!(link.kind, LinkKind::External);
    assert!(link.opens_new_context());
    assert_eq!(link.rel(), Some("noopener noreferrer"));
}

#[test]
fn internal_links_not_isolated() {
    for md in ["[doctors](/doctors)", "[home](https://clinic.example.com/)"] {
        let content = only_paragraph(md);
        let link = first_link(&content).unwrap();
        assert_eq!(link.kind, LinkKind::Internal, "{md}");
        assert!(!link.opens_new_context());
        assert_eq!(link.rel(), None);
    }
}

#[test]
fn unsafe_link_degrades_to_text() {
    let content = only_paragraph("[click me](javascript:alert(1))");
    assert!(first_link(&content).is_none());
    assert_eq!(inline_text(&content), "click me");
}

#[test]
fn unsafe_image_degrades_to_alt() {
    let content = only_paragraph("![chart](data:image/png;base64,AAAA)");
    assert_eq!(content, vec![Inline::Text("chart".into())]);
}

#[test]
fn safe_image_kept() {
    let content = only_paragraph("![x-ray](/img/xray.png \"Chest\")");
    assert_eq!(
        content,
        vec![Inline::Image {
            src: "/img/xray.png".into(),
            alt: "x-ray".into(),
            title: "Chest".into()
        }]
    );
}

#[test]
fn html_block_sanitized() {
    let blocks = render("<div onclick=\"x()\">hi<script>alert(1)</script></div>\n", SITE);
    assert_eq!(blocks, vec![Block::Html("<div>hi</div>\n".into())]);
}

#[test]
fn inline_script_content_dropped() {
    let content = only_paragraph("before <script>alert(1)</script> after");
    let text = inline_text(&content);
    assert!(!text.contains("alert"), "{text}");
    assert!(text.contains("before"));
    assert!(text.contains("after"));
}

#[test]
fn html_comment_removed() {
    let content = only_paragraph("visible <!-- secret --> text");
    assert!(!inline_text(&content).contains("secret"));
}

#[test]
fn code_block_language_and_body() {
    let blocks = render("```python title\nprint(1)\n```", SITE);
    assert_eq!(
        blocks,
        vec![Block::CodeBlock {
            language: Some("python".into()),
            code: "print(1)\n".into()
        }]
    );
}

#[test]
fn ordered_list_start_and_depth() {
    let blocks = render("2. one\n3. two\n   - nested", SITE);
    let [Block::List { start, depth, items }] = blocks.as_slice() else {
        panic!("expected list, got {:?}", blocks);
    };
    assert_eq!(*start, Some(2));
    assert_eq!(*depth, 0);
    assert_eq!(items.len(), 2);
    assert!(items[1]
        .iter()
        .any(|b| matches!(b, Block::List { depth: 1, start: None, .. })));
}

#[test]
fn reconciled_table_becomes_table_node() {
    let md = normalize_response("| A | B |\n| 1 | 2 |");
    let blocks = render(&md, SITE);
    let [Block::Table { header, rows, alignments }] = blocks.as_slice() else {
        panic!("expected table, got {:?}", blocks);
    };
    assert_eq!(header.len(), 2);
    assert_eq!(rows.len(), 1);
    assert_eq!(alignments, &vec![Alignment::None, Alignment::None]);
    assert_eq!(inline_text(&rows[0][1]), "2");
}

#[test]
fn blockquote_and_rule() {
    let blocks = render("> careful\n\n---", SITE);
    assert!(matches!(&blocks[0], Block::BlockQuote(inner) if inner.len() == 1));
    assert_eq!(blocks[1], Block::Rule);
}

#[test]
fn empty_input_renders_nothing() {
    assert!(render("", SITE).is_empty());
}
