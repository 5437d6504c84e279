//! Zip package access
//!
//! Entries other than the one being replaced are copied with
//! `raw_copy_file`, so their compressed bytes never change.

use std::io::{Cursor, Read, Seek, Write};

use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::DocxError;

pub const DOCUMENT_PART: &str = "word/document.xml";

/// Read one part of the package as text
pub fn read_part(package: &[u8], name: &str) -> Result<String, DocxError> {
    let mut archive = ZipArchive::new(Cursor::new(package))?;
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Err(DocxError::MissingPart(name.to_string())),
        Err(e) => return Err(e.into()),
    };

    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| DocxError::NotUtf8(name.to_string()))
}

/// Copy every entry of `package` to `out`, replacing the contents of the
/// entry named in `replace`
pub fn copy_package<W: Write + Seek>(
    package: &[u8],
    out: W,
    replace: Option<(&str, &str)>,
) -> Result<W, DocxError> {
    let mut archive = ZipArchive::new(Cursor::new(package))?;
    let mut writer = ZipWriter::new(out);

    for i in 0..archive.len() {
        let name = archive.by_index_raw(i)?.name().to_string();

        match replace {
            Some((part, contents)) if part == name => {
                let options = {
                    let entry = archive.by_index(i)?;
                    let method = match entry.compression() {
                        CompressionMethod::Stored => CompressionMethod::Stored,
                        _ => CompressionMethod::Deflated,
                    };
                    FileOptions::default()
                        .compression_method(method)
                        .last_modified_time(entry.last_modified())
                };
                writer.start_file(name, options)?;
                writer.write_all(contents.as_bytes())?;
            }
            _ => writer.raw_copy_file(archive.by_index_raw(i)?)?,
        }
    }

    Ok(writer.finish()?)
}

/// Build a package from `(name, contents)` pairs
pub fn build_package<W: Write + Seek>(out: W, parts: &[(&str, &str)]) -> Result<W, DocxError> {
    let mut writer = ZipWriter::new(out);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, contents) in parts {
        writer.start_file(*name, options)?;
        writer.write_all(contents.as_bytes())?;
    }

    Ok(writer.finish()?)
}
