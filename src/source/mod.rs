pub mod docx;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use docx::DocxSource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a valid DOCX archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("DOCX archive has no {0}")]
    MissingPart(&'static str),

    #[error("XML error at byte {position}: {message}")]
    Xml { position: u64, message: String },
}

/// Ordered raw paragraph text of an input document.
pub trait ParagraphSource {
    fn iterate(&self) -> Result<Vec<String>, SourceError>;
    fn path(&self) -> &Path;
}

/// UTF-8 text file, one paragraph per line.
pub struct TextSource {
    path: PathBuf,
}

impl TextSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TextSource { path: path.into() }
    }
}

impl ParagraphSource for TextSource {
    fn iterate(&self) -> Result<Vec<String>, SourceError> {
        let text = std::fs::read_to_string(&self.path)?;
        Ok(text.lines().map(str::to_string).collect())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Pick a reader by extension: `.docx` is unpacked, anything else is read as text.
pub fn open(path: &Path) -> Box<dyn ParagraphSource> {
    let is_docx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("docx"));
    if is_docx {
        Box::new(DocxSource::new(path))
    } else {
        Box::new(TextSource::new(path))
    }
}
