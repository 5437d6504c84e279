//! Rewrites `word/document.xml` from a [`ContainerPatch`]
//!
//! Untouched paragraphs and every non-paragraph body element are copied as
//! raw bytes. A rewritten paragraph keeps its start tag, its `w:pPr` and the
//! `w:rPr` of its first run, and gets a single run with the new text.

use quill_editor::{ContainerPatch, PatchEntry, StyleRef};
use tracing::debug;

use crate::body::{Body, ChildKind, Slot};
use crate::error::DocxError;

/// Style token for a slot of a `document.xml` with checksum `crc`
pub(crate) fn slot_token(crc: u32, slot: usize) -> StyleRef {
    StyleRef::new(format!("{:08x}:{}", crc, slot))
}

fn parse_token(style: &StyleRef, crc: u32, slots: usize) -> Result<usize, DocxError> {
    let foreign = || DocxError::ForeignStyle(style.to_string());
    let (sum, slot) = style.token().split_once(':').ok_or_else(foreign)?;

    if u32::from_str_radix(sum, 16).ok() != Some(crc) {
        return Err(DocxError::Changed);
    }
    match slot.parse::<usize>() {
        Ok(slot) if slot < slots => Ok(slot),
        _ => Err(foreign()),
    }
}

#[derive(Debug, Default, Clone)]
struct SlotPlan<'p> {
    rewrite: Option<&'p str>,
    following: Vec<&'p str>,
}

/// Produce the new `document.xml` text
pub(crate) fn splice(
    xml: &str,
    body: &Body,
    patch: &ContainerPatch,
    crc: u32,
    insert_style: Option<&str>,
) -> Result<String, DocxError> {
    let slot_count = body.slots.len();
    let mut plans: Vec<Option<SlotPlan>> = vec![None; slot_count];
    let mut leading = Vec::new();
    let mut last: Option<usize> = None;

    for entry in &patch.entries {
        match entry {
            PatchEntry::Keep { style } | PatchEntry::Rewrite { style, .. } => {
                let slot = parse_token(style, crc, slot_count)?;
                if last.map_or(false, |l| slot <= l) {
                    return Err(DocxError::SlotOrder(slot));
                }
                let rewrite = match entry {
                    PatchEntry::Rewrite { text, .. } => Some(text.as_str()),
                    _ => None,
                };
                plans[slot] = Some(SlotPlan {
                    rewrite,
                    following: Vec::new(),
                });
                last = Some(slot);
            }
            PatchEntry::Insert { text } => match last {
                Some(l) => {
                    if let Some(plan) = plans[l].as_mut() {
                        plan.following.push(text.as_str());
                    }
                }
                None => leading.push(text.as_str()),
            },
        }
    }
    for style in &patch.removed {
        parse_token(style, crc, slot_count)?;
    }

    let prefix = body.tag.prefix();
    let new_paragraph = |text: &str| inserted_paragraph(prefix, insert_style, text);

    let mut out = String::with_capacity(xml.len() + 256);

    if body.tag.self_closing {
        out.push_str(&xml[..body.range.start]);
        out.push_str(&body.tag.open(xml, body.range.start));
        for text in leading {
            out.push_str(&new_paragraph(text));
        }
        out.push_str(&format!("</{}>", body.tag.name));
        out.push_str(&xml[body.range.end..]);
        return Ok(out);
    }

    let mut cursor = body.tag.end;
    let mut pending_leading = Some(leading);
    out.push_str(&xml[..cursor]);

    for child in &body.children {
        out.push_str(&xml[cursor..child.range.start]);
        cursor = child.range.end;

        match &child.kind {
            ChildKind::Slot(index) => {
                let Some(plan) = &plans[*index] else {
                    debug!(slot = index, "Dropping paragraph");
                    continue;
                };
                if let Some(leading) = pending_leading.take() {
                    for text in leading {
                        out.push_str(&new_paragraph(text));
                    }
                }

                let slot = &body.slots[*index];
                match plan.rewrite {
                    Some(text) => out.push_str(&rewritten_paragraph(xml, slot, text)),
                    None => out.push_str(&xml[child.range.clone()]),
                }
                for &text in &plan.following {
                    out.push_str(&new_paragraph(text));
                }
            }
            ChildKind::SectionProperties => {
                // No surviving paragraph: new paragraphs go before the section properties
                if let Some(leading) = pending_leading.take() {
                    for text in leading {
                        out.push_str(&new_paragraph(text));
                    }
                }
                out.push_str(&xml[child.range.clone()]);
            }
            ChildKind::Other => out.push_str(&xml[child.range.clone()]),
        }
    }

    let close = body.close_start(xml);
    out.push_str(&xml[cursor..close]);
    if let Some(leading) = pending_leading.take() {
        for text in leading {
            out.push_str(&new_paragraph(text));
        }
    }
    out.push_str(&xml[close..]);

    Ok(out)
}

fn qualified(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(p) => format!("{}:{}", p, name),
        None => name.to_string(),
    }
}

fn rewritten_paragraph(xml: &str, slot: &Slot, text: &str) -> String {
    let prefix = slot.tag.prefix();
    let mut out = String::new();

    out.push_str(&slot.tag.open(xml, slot.range.start));
    if let Some(range) = &slot.properties {
        out.push_str(&xml[range.clone()]);
    }
    let run_properties = slot.run_properties.clone().map(|r| &xml[r]);
    out.push_str(&run(prefix, run_properties, text));
    out.push_str(&format!("</{}>", slot.tag.name));
    out
}

fn inserted_paragraph(prefix: Option<&str>, style: Option<&str>, text: &str) -> String {
    let p = qualified(prefix, "p");
    let mut out = format!("<{}>", p);

    if let Some(style) = style {
        let ppr = qualified(prefix, "pPr");
        out.push_str(&format!(
            "<{ppr}><{} {}=\"{}\"/></{ppr}>",
            qualified(prefix, "pStyle"),
            qualified(prefix, "val"),
            escape(style, true),
            ppr = ppr
        ));
    }
    out.push_str(&run(prefix, None, text));
    out.push_str(&format!("</{}>", p));
    out
}

/// One run carrying `text`; tabs and line breaks become their elements
fn run(prefix: Option<&str>, properties: Option<&str>, text: &str) -> String {
    let r = qualified(prefix, "r");
    let t = qualified(prefix, "t");
    let mut out = format!("<{}>", r);
    if let Some(props) = properties {
        out.push_str(props);
    }

    let mut pending = String::new();
    let flush = |pending: &mut String, out: &mut String| {
        if !pending.is_empty() {
            out.push_str(&format!(
                "<{t} xml:space=\"preserve\">{}</{t}>",
                escape(pending, false),
                t = t
            ));
            pending.clear();
        }
    };

    for c in text.chars() {
        match c {
            '\t' => {
                flush(&mut pending, &mut out);
                out.push_str(&format!("<{}/>", qualified(prefix, "tab")));
            }
            '\n' => {
                flush(&mut pending, &mut out);
                out.push_str(&format!("<{}/>", qualified(prefix, "br")));
            }
            '\r' => {
                flush(&mut pending, &mut out);
                out.push_str(&format!("<{}/>", qualified(prefix, "cr")));
            }
            c if is_xml_char(c) => pending.push(c),
            c => debug!(code = c as u32, "Dropping character not allowed in XML"),
        }
    }
    flush(&mut pending, &mut out);

    out.push_str(&format!("</{}>", r));
    out
}

fn is_xml_char(c: char) -> bool {
    !matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}'
    )
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEAD: &str =
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;
    const TAIL: &str = "</w:body></w:document>";

    fn doc(body: &str) -> String {
        format!("{}{}{}", HEAD, body, TAIL)
    }

    fn keep(slot: usize) -> PatchEntry {
        PatchEntry::Keep { style: slot_token(7, slot) }
    }

    fn rewrite(slot: usize, text: &str) -> PatchEntry {
        PatchEntry::Rewrite {
            style: slot_token(7, slot),
            text: text.to_string(),
        }
    }

    fn insert(text: &str) -> PatchEntry {
        PatchEntry::Insert { text: text.to_string() }
    }

    fn run_splice(xml: &str, entries: Vec<PatchEntry>, removed: Vec<usize>) -> String {
        let body = Body::scan(xml).unwrap();
        let patch = ContainerPatch {
            entries,
            removed: removed.into_iter().map(|s| slot_token(7, s)).collect(),
        };
        splice(xml, &body, &patch, 7, None).unwrap()
    }

    const A: &str = r#"<w:p w:rsidR="00AB"><w:r><w:t>a</w:t></w:r></w:p>"#;
    const B: &str =
        r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:i/></w:rPr><w:t>b</w:t></w:r><w:r><w:t>!</w:t></w:r></w:p>"#;

    #[test]
    fn test_keep_all_is_identity() {
        let xml = doc(&format!("{}\n{}<w:sectPr/>", A, B));
        assert_eq!(run_splice(&xml, vec![keep(0), keep(1)], vec![]), xml);
    }

    #[test]
    fn test_rewrite_keeps_properties() {
        let xml = doc(&format!("{}{}", A, B));
        let out = run_splice(&xml, vec![keep(0), rewrite(1, "x & y")], vec![]);
        assert_eq!(
            out,
            doc(&format!(
                "{}{}",
                A,
                r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve">x &amp; y</w:t></w:r></w:p>"#
            ))
        );
    }

    #[test]
    fn test_delete_and_insert_after_anchor() {
        let xml = doc(&format!("{}{}", A, B));
        let out = run_splice(&xml, vec![keep(1), insert("c\td")], vec![0]);
        assert_eq!(
            out,
            doc(&format!(
                "{}{}",
                B,
                r#"<w:p><w:r><w:t xml:space="preserve">c</w:t><w:tab/><w:t xml:space="preserve">d</w:t></w:r></w:p>"#
            ))
        );
    }

    #[test]
    fn test_leading_insert_goes_before_first_survivor() {
        let table = "<w:tbl/>";
        let xml = doc(&format!("{}{}{}", table, A, B));
        let out = run_splice(&xml, vec![insert("first"), keep(0), keep(1)], vec![]);
        assert!(out.contains(&format!(
            "{}<w:p><w:r><w:t xml:space=\"preserve\">first</w:t></w:r></w:p>{}",
            table, A
        )));
    }

    #[test]
    fn test_inserts_without_survivors_precede_section_properties() {
        let xml = doc(&format!("{}<w:sectPr/>", A));
        let out = run_splice(&xml, vec![insert("new")], vec![0]);
        assert_eq!(
            out,
            doc(r#"<w:p><w:r><w:t xml:space="preserve">new</w:t></w:r></w:p><w:sectPr/>"#)
        );
    }

    #[test]
    fn test_self_closing_body() {
        let xml = format!("{}{}", HEAD.trim_end_matches("<w:body>"), "<w:body/></w:document>");
        let out = run_splice(&xml, vec![insert("hi")], vec![]);
        assert!(out.contains(
            r#"<w:body><w:p><w:r><w:t xml:space="preserve">hi</w:t></w:r></w:p></w:body>"#
        ));
    }

    #[test]
    fn test_inserted_paragraph_uses_style() {
        let xml = doc(A);
        let body = Body::scan(&xml).unwrap();
        let patch = ContainerPatch {
            entries: vec![keep(0), insert("line\nbreak")],
            removed: vec![],
        };
        let out = splice(&xml, &body, &patch, 7, Some("BodyText")).unwrap();
        assert!(out.contains(
            r#"<w:p><w:pPr><w:pStyle w:val="BodyText"/></w:pPr><w:r><w:t xml:space="preserve">line</w:t><w:br/><w:t xml:space="preserve">break</w:t></w:r></w:p>"#
        ));
    }

    #[test]
    fn test_stale_token_rejected() {
        let xml = doc(A);
        let body = Body::scan(&xml).unwrap();
        let patch = ContainerPatch {
            entries: vec![PatchEntry::Keep { style: slot_token(8, 0) }],
            removed: vec![],
        };
        assert!(matches!(splice(&xml, &body, &patch, 7, None), Err(DocxError::Changed)));
    }

    #[test]
    fn test_out_of_order_slots_rejected() {
        let xml = doc(&format!("{}{}", A, B));
        let body = Body::scan(&xml).unwrap();
        let patch = ContainerPatch {
            entries: vec![keep(1), keep(0)],
            removed: vec![],
        };
        assert!(matches!(
            splice(&xml, &body, &patch, 7, None),
            Err(DocxError::SlotOrder(0))
        ));
    }
}
