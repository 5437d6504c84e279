//! Scan of `word/document.xml`
//!
//! Only body-level `w:p` elements are tracked. Everything is recorded as byte
//! ranges into the source text so the writer can copy untouched markup
//! verbatim.

use std::ops::Range;

use roxmltree::Node;

use crate::error::DocxError;

/// Transitional and strict WordprocessingML namespaces
const WORDML_NS: [&str; 2] = [
    "http://schemas.openxmlformats.org/wordprocessingml/2006/main",
    "http://purl.oclc.org/ooxml/wordprocessingml/main",
];

/// Markup compatibility namespace (`mc:AlternateContent`)
const MC_NS: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChildKind {
    Slot(usize),
    SectionProperties,
    Other,
}

#[derive(Debug, Clone)]
pub(crate) struct BodyChild {
    pub range: Range<usize>,
    pub kind: ChildKind,
}

/// A body-level paragraph
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub range: Range<usize>,
    pub tag: StartTag,
    pub properties: Option<Range<usize>>,
    pub run_properties: Option<Range<usize>>,
    pub text: String,
    pub style_id: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct StartTag {
    /// Qualified name as written, e.g. `w:p`
    pub name: String,
    pub end: usize,
    pub self_closing: bool,
}

impl StartTag {
    fn read(xml: &str, start: usize) -> Result<Self, DocxError> {
        let bytes = xml.as_bytes();
        let mut quote = None;
        let mut end = None;

        for (i, &b) in bytes.iter().enumerate().skip(start) {
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"') | (None, b'\'') => quote = Some(b),
                (None, b'>') => {
                    end = Some(i + 1);
                    break;
                }
                _ => {}
            }
        }

        let end = end.ok_or(DocxError::UnterminatedTag(start))?;
        let name = xml[start + 1..end]
            .split(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .next()
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            name,
            end,
            self_closing: bytes[end - 2] == b'/',
        })
    }

    /// Namespace prefix of the tag, `None` for the default namespace
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// The opening tag text, never self-closing
    pub fn open<'a>(&self, xml: &'a str, start: usize) -> std::borrow::Cow<'a, str> {
        let raw = &xml[start..self.end];
        if self.self_closing {
            let inner = raw[..raw.len() - 2].trim_end();
            format!("{}>", inner).into()
        } else {
            raw.into()
        }
    }
}

/// The body of a parsed `word/document.xml`
#[derive(Debug, Clone)]
pub(crate) struct Body {
    pub range: Range<usize>,
    pub tag: StartTag,
    pub children: Vec<BodyChild>,
    pub slots: Vec<Slot>,
}

impl Body {
    pub fn scan(xml: &str) -> Result<Self, DocxError> {
        let offset = if xml.starts_with(BOM) { BOM.len_utf8() } else { 0 };
        let text = &xml[offset..];
        let doc = roxmltree::Document::parse(text)?;

        let root = doc.root_element();
        if !is_wordml(root, "document") {
            return Err(DocxError::NoBody);
        }
        let body = root
            .children()
            .find(|n| is_wordml(*n, "body"))
            .ok_or(DocxError::NoBody)?;

        let shift = |r: Range<usize>| r.start + offset..r.end + offset;
        let mut children = Vec::new();
        let mut slots = Vec::new();

        for child in body.children().filter(Node::is_element) {
            let range = shift(child.range());
            let kind = if is_wordml(child, "p") {
                slots.push(Slot {
                    range: range.clone(),
                    tag: StartTag::read(xml, range.start)?,
                    properties: element_child(child, "pPr").map(|n| shift(n.range())),
                    run_properties: first_run(child)
                        .and_then(|r| element_child(r, "rPr"))
                        .map(|n| shift(n.range())),
                    text: paragraph_text(child),
                    style_id: style_id(child),
                });
                ChildKind::Slot(slots.len() - 1)
            } else if is_wordml(child, "sectPr") {
                ChildKind::SectionProperties
            } else {
                ChildKind::Other
            };
            children.push(BodyChild { range, kind });
        }

        let range = shift(body.range());
        Ok(Self {
            tag: StartTag::read(xml, range.start)?,
            range,
            children,
            slots,
        })
    }

    /// Byte offset of the body's closing tag
    pub fn close_start(&self, xml: &str) -> usize {
        xml[..self.range.end].rfind('<').unwrap_or(self.range.end)
    }
}

fn is_wordml(node: Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node
            .tag_name()
            .namespace()
            .map_or(false, |ns| WORDML_NS.contains(&ns))
}

fn is_compat(node: Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace() == Some(MC_NS)
}

fn element_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_wordml(*n, name))
}

fn first_run<'a, 'input>(paragraph: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    paragraph.descendants().find(|n| is_wordml(*n, "r"))
}

fn style_id(paragraph: Node) -> Option<String> {
    let style = element_child(element_child(paragraph, "pPr")?, "pStyle")?;
    style
        .attributes()
        .find(|a| a.name() == "val")
        .map(|a| a.value().to_string())
}

/// Visible text of a paragraph: `w:t`, with `w:tab` as `\t` and
/// `w:br`/`w:cr` as `\n`
pub(crate) fn paragraph_text(paragraph: Node) -> String {
    let mut out = String::new();
    collect_text(paragraph, &mut out);
    out
}

fn collect_text(node: Node, out: &mut String) {
    for child in node.children().filter(Node::is_element) {
        if is_compat(child, "AlternateContent") {
            // Choices render the same content as the fallback
            if let Some(choice) = child.children().find(|n| is_compat(*n, "Choice")) {
                collect_text(choice, out);
            }
            continue;
        }
        if !child
            .tag_name()
            .namespace()
            .map_or(false, |ns| WORDML_NS.contains(&ns))
        {
            collect_text(child, out);
            continue;
        }

        match child.tag_name().name() {
            "r" => {
                for part in child.children().filter(Node::is_element) {
                    match part.tag_name().name() {
                        "t" => out.push_str(part.text().unwrap_or_default()),
                        "tab" => out.push('\t'),
                        "br" | "cr" => out.push('\n'),
                        _ => {}
                    }
                }
            }
            "pPr" | "rPr" | "del" | "moveFrom" | "txbxContent" => {}
            _ => collect_text(child, out),
        }
    }
}
