//! End-to-end tests against real `.docx` packages on disk

use std::fs::{self, File};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use quill_docx::{build_package, create_blank, read_part, DocxAdapter, DOCUMENT_PART};
use quill_editor::{ContainerError, EditSession, EditorError};
use tempfile::TempDir;
use zip::ZipArchive;

const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const HEADING: &str = r#"<w:p w:rsidR="001"><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Quarterly report</w:t></w:r></w:p>"#;
const INTRO: &str = r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Sales grew </w:t></w:r><w:r><w:t>strongly.</w:t></w:r></w:p>"#;
const TABLE: &str = r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#;
const OUTRO: &str = r#"<w:p><w:pPr><w:pStyle w:val="Closing"/></w:pPr><w:r><w:t>Regards</w:t></w:r></w:p>"#;
const SECTION: &str = r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr>"#;

fn document_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}"><w:body>{}{}{}{}{}</w:body></w:document>"#,
        W, HEADING, INTRO, TABLE, OUTRO, SECTION
    )
}

fn write_fixture(path: &Path, document: &str) {
    let file = File::create(path).unwrap();
    build_package(
        file,
        &[
            ("[Content_Types].xml", "<Types/>"),
            ("word/styles.xml", "<w:styles/>"),
            (DOCUMENT_PART, document),
            ("word/header1.xml", "<w:hdr><w:p><w:r><w:t>ACME</w:t></w:r></w:p></w:hdr>"),
        ],
    )
    .unwrap();
}

fn fixture() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.docx");
    write_fixture(&path, &document_xml());
    (dir, path)
}

fn document_of(path: &Path) -> String {
    read_part(&fs::read(path).unwrap(), DOCUMENT_PART).unwrap()
}

/// (name, crc32, compressed size) of every entry except the main document
fn other_entries(path: &Path) -> Vec<(String, u32, u64)> {
    let bytes = fs::read(path).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let entry = archive.by_index_raw(i).unwrap();
            (entry.name().to_string(), entry.crc32(), entry.compressed_size())
        })
        .filter(|(name, _, _)| name != DOCUMENT_PART)
        .collect()
}

fn open(path: &Path) -> EditSession<DocxAdapter> {
    let mut session = EditSession::new(DocxAdapter::new());
    session.open_document(path).unwrap();
    session
}

#[test]
fn test_load_body_paragraphs() {
    let (_dir, path) = fixture();
    let session = open(&path);

    assert_eq!(
        session.get_editable_text().unwrap(),
        "Quarterly report\nSales grew strongly.\nRegards\n"
    );

    let outline = session.outline().unwrap();
    assert_eq!(outline.len(), 1);
    assert_eq!(outline[0].level, 1);
    assert_eq!(outline[0].text, "Quarterly report");

    let structure = session.structure(8).unwrap();
    assert_eq!(structure[1].style, "Normal");
    assert_eq!(structure[1].preview, "Sales gr...");
    assert_eq!(structure[2].style, "Closing");
}

#[test]
fn test_unchanged_save_keeps_document_bytes() {
    let (_dir, path) = fixture();
    let before = document_of(&path);
    let entries = other_entries(&path);

    let mut session = open(&path);
    session.save_document(None).unwrap();

    assert_eq!(document_of(&path), before);
    assert_eq!(other_entries(&path), entries);
}

#[test]
fn test_edit_rewrites_only_touched_paragraph() {
    let (_dir, path) = fixture();
    let entries = other_entries(&path);

    let mut session = open(&path);
    let plan = session
        .apply_edits("Quarterly report\nSales fell slightly.\nRegards\n")
        .unwrap();
    assert_eq!(plan.len(), 1);
    session.save_document(None).unwrap();

    let xml = document_of(&path);
    assert!(xml.contains(HEADING));
    assert!(xml.contains(TABLE));
    assert!(xml.contains(OUTRO));
    assert!(xml.contains(SECTION));
    assert!(xml.contains(
        r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Sales fell slightly.</w:t></w:r></w:p>"#
    ));
    assert!(!xml.contains(INTRO));
    assert_eq!(other_entries(&path), entries);

    let reopened = open(&path);
    assert_eq!(
        reopened.get_editable_text().unwrap(),
        "Quarterly report\nSales fell slightly.\nRegards\n"
    );
}

#[test]
fn test_edits_around_table() {
    let (_dir, path) = fixture();
    let mut session = open(&path);
    session
        .apply_edits("Quarterly report\nNew paragraph\nRegards\nP.S.\twith tab\n")
        .unwrap();
    session.save_document(None).unwrap();

    let xml = document_of(&path);
    assert!(!xml.contains("strongly"));
    let table_at = xml.find(TABLE).unwrap();
    let new_at = xml.find("New paragraph").unwrap();
    let ps_at = xml.find("P.S.").unwrap();
    assert!(new_at < table_at);
    assert!(xml.find(OUTRO).unwrap() < ps_at);
    assert!(ps_at < xml.find(SECTION).unwrap());

    let reopened = open(&path);
    assert_eq!(
        reopened.get_editable_text().unwrap(),
        "Quarterly report\nNew paragraph\nRegards\nP.S.\twith tab\n"
    );
}

#[test]
fn test_inserted_paragraph_gets_configured_style() {
    let (_dir, path) = fixture();
    let adapter = DocxAdapter::new().with_insert_style(Some("BodyText".to_string()));
    let mut session = EditSession::new(adapter);
    session.open_document(&path).unwrap();

    session
        .apply_edits("Quarterly report\nSales grew strongly.\nAdded\nRegards\n")
        .unwrap();
    session.save_document(None).unwrap();

    assert!(document_of(&path).contains(
        r#"<w:p><w:pPr><w:pStyle w:val="BodyText"/></w:pPr><w:r><w:t xml:space="preserve">Added</w:t></w:r></w:p>"#
    ));
}

#[test]
fn test_changed_on_disk_is_refused() {
    let (_dir, path) = fixture();
    let mut session = open(&path);
    session.apply_edits("Changed\n").unwrap();

    let replaced = document_xml().replace("Regards", "Cheers");
    write_fixture(&path, &replaced);

    let err = session.save_document(None).unwrap_err();
    assert!(matches!(err, EditorError::Container(ContainerError::Format { .. })));
    assert_eq!(document_of(&path), replaced);
}

#[test]
fn test_failed_write_leaves_source_intact() {
    let (dir, path) = fixture();
    let before = fs::read(&path).unwrap();

    let mut session = open(&path);
    session.apply_edits("Only this\n").unwrap();

    let unreachable = dir.path().join("missing-dir").join("out.docx");
    let err = session.save_document(Some(&unreachable)).unwrap_err();
    assert!(matches!(err, EditorError::Container(ContainerError::Write { .. })));
    assert!(err.is_recoverable());

    assert_eq!(fs::read(&path).unwrap(), before);
    assert!(!unreachable.exists());
    assert!(session.document().unwrap().is_dirty());
}

#[test]
fn test_save_as_leaves_original() {
    let (dir, path) = fixture();
    let before = fs::read(&path).unwrap();
    let copy = dir.path().join("copy.docx");

    let mut session = open(&path);
    session.apply_edits("Quarterly report\nRegards\n").unwrap();
    session.save_document(Some(&copy)).unwrap();

    assert_eq!(fs::read(&path).unwrap(), before);
    assert_eq!(session.document().unwrap().path, copy);
    assert!(!session.document().unwrap().is_dirty());

    // Saving again goes to the new location
    session.apply_edits("Quarterly report\n").unwrap();
    session.save_document(None).unwrap();
    assert_eq!(open(&copy).get_editable_text().unwrap(), "Quarterly report\n");
}

#[test]
fn test_missing_and_invalid_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = EditSession::new(DocxAdapter::new());

    let err = session
        .open_document(dir.path().join("nope.docx"))
        .unwrap_err();
    assert!(matches!(err, EditorError::Container(ContainerError::NotFound { .. })));

    let junk = dir.path().join("junk.docx");
    fs::write(&junk, b"not a zip").unwrap();
    let err = session.open_document(&junk).unwrap_err();
    assert!(matches!(err, EditorError::Container(ContainerError::Format { .. })));
}

#[test]
fn test_blank_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("new.docx");
    create_blank(&path).unwrap();

    let mut session = open(&path);
    assert_eq!(session.get_editable_text().unwrap(), "\n");

    session.apply_edits("Hello\nWorld & <friends>\n").unwrap();
    session.save_document(None).unwrap();

    assert_eq!(
        open(&path).get_editable_text().unwrap(),
        "Hello\nWorld & <friends>\n"
    );
}

#[cfg(unix)]
#[test]
fn test_in_place_save_keeps_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.docx");
    create_blank(&path).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    let mut session = open(&path);
    session.apply_edits("Shared notes\n").unwrap();
    session.save_document(None).unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}
