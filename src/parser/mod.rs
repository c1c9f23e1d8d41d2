pub mod classifier;
pub mod labels;
pub mod lines;

use thiserror::Error;

use crate::catalog::Catalog;
use classifier::{Classifier, ParseStats};
use labels::Labels;

#[derive(Debug, Error)]
pub enum ParseError {
    /// A sub-title or bot header appeared before any main title, so there is
    /// no package to file it under.
    #[error("line {line_no}: {marker} before any main title (العنوان الرئيسي): {text}")]
    MissingMainTitle {
        marker: &'static str,
        line_no: usize,
        text: String,
    },
}

#[derive(Debug)]
pub struct ParsedDocument {
    pub catalog: Catalog,
    pub stats: ParseStats,
}

/// Two-step pipeline: raw paragraphs → normalized lines → package hierarchy.
/// Errors carry the 1-based number of the source paragraph.
pub fn parse_paragraphs<S: AsRef<str>>(
    paragraphs: &[S],
    labels: &Labels,
) -> Result<ParsedDocument, ParseError> {
    let mut classifier = Classifier::new(labels);
    for (paragraph_no, line) in lines::split_paragraphs(paragraphs) {
        classifier.feed(paragraph_no, &line)?;
    }
    let (catalog, stats) = classifier.finish();
    Ok(ParsedDocument { catalog, stats })
}
