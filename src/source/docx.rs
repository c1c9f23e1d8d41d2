use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use super::{ParagraphSource, SourceError};

const DOCUMENT_PART: &str = "word/document.xml";

/// Word document read straight from its `word/document.xml` part.
pub struct DocxSource {
    path: PathBuf,
}

impl DocxSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DocxSource { path: path.into() }
    }
}

impl ParagraphSource for DocxSource {
    fn iterate(&self) -> Result<Vec<String>, SourceError> {
        let file = File::open(&self.path)?;
        let paragraphs = read_paragraphs(BufReader::new(file))?;
        debug!(path = %self.path.display(), paragraphs = paragraphs.len(), "read docx");
        Ok(paragraphs)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Paragraph texts of a DOCX archive, in document order.
pub fn read_paragraphs<R: Read + Seek>(reader: R) -> Result<Vec<String>, SourceError> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| SourceError::MissingPart(DOCUMENT_PART))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    parse_document_xml(&xml)
}

/// Collect the text of every `<w:p>`. Runs are concatenated; `<w:br/>` and
/// `<w:cr/>` become newlines and `<w:tab/>` a tab, so soft line breaks split
/// into separate lines later on.
fn parse_document_xml(xml: &str) -> Result<Vec<String>, SourceError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => {
                    in_paragraph = true;
                    current.clear();
                }
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if in_paragraph => match e.name().as_ref() {
                b"w:br" | b"w:cr" => current.push('\n'),
                b"w:tab" => current.push('\t'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e.unescape().map_err(|err| SourceError::Xml {
                    position: reader.buffer_position() as u64,
                    message: err.to_string(),
                })?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    in_paragraph = false;
                    paragraphs.push(std::mem::take(&mut current));
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(SourceError::Xml {
                    position: reader.buffer_position() as u64,
                    message: err.to_string(),
                })
            }
            _ => {}
        }
    }
    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    fn document(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}"><w:body>{body}</w:body></w:document>"#
        )
    }

    fn archive(xml: &str) -> Cursor<Vec<u8>> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DOCUMENT_PART, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        let mut cursor = zip.finish().unwrap();
        cursor.set_position(0);
        cursor
    }

    #[test]
    fn runs_are_joined_per_paragraph() {
        let xml = document(
            r#"<w:p><w:r><w:t>العنوان الرئيسي: </w:t></w:r><w:r><w:t>أدوات</w:t></w:r></w:p>
<w:p><w:pPr><w:jc w:val="right"/></w:pPr><w:r><w:t xml:space="preserve">#Bot &amp; Co</w:t></w:r></w:p>"#,
        );
        let paragraphs = parse_document_xml(&xml).unwrap();
        assert_eq!(paragraphs, vec!["العنوان الرئيسي: أدوات", "#Bot & Co"]);
    }

    #[test]
    fn breaks_and_tabs_kept() {
        let xml = document(
            r#"<w:p><w:r><w:t>@نبذة</w:t><w:br/><w:t>text</w:t><w:tab/><w:t>more</w:t></w:r></w:p><w:p/>"#,
        );
        let paragraphs = parse_document_xml(&xml).unwrap();
        assert_eq!(paragraphs, vec!["@نبذة\ntext\tmore".to_string()]);
    }

    #[test]
    fn reads_zip_archive() {
        let xml = document(r#"<w:p><w:r><w:t>Main Title: P</w:t></w:r></w:p>"#);
        let paragraphs = read_paragraphs(archive(&xml)).unwrap();
        assert_eq!(paragraphs, vec!["Main Title: P"]);
    }

    #[test]
    fn missing_document_part() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/styles.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<w:styles/>").unwrap();
        let mut cursor = zip.finish().unwrap();
        cursor.set_position(0);
        let err = read_paragraphs(cursor).unwrap_err();
        assert!(matches!(err, SourceError::MissingPart(DOCUMENT_PART)));
    }

    #[test]
    fn not_a_zip() {
        let err = read_paragraphs(Cursor::new(b"plain text".to_vec())).unwrap_err();
        assert!(matches!(err, SourceError::Archive(_)));
    }
}
